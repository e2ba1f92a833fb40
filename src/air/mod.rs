//! Air quality module - PSI pipeline, OpenWeather fetch and command replies.

pub mod commands;
pub mod openweather;
pub mod pollutant;
pub mod psi;
pub mod report;
pub mod telegram;

pub use commands::{buttons_for, resolve, resolve_callback, Action, Dispatcher};
pub use openweather::{FetchError, Location, Reading, ReadingSource};
pub use pollutant::{Concentration, PollutantKind, StatusFlag, ThresholdTable, Thresholds};
pub use psi::{advice, classify, psi_from_pm25, Category, Psi};
pub use telegram::TelegramClient;
