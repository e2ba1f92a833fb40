pub mod air;
pub mod config;
