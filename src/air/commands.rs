//! Command table and dispatcher.
//!
//! Every command is a row in `COMMANDS`; the help text and the Telegram
//! command menu are both generated from it. `/air` is the only command
//! that suspends, on the reading fetch.

use std::sync::LazyLock;

use chrono_tz::Tz;
use regex::Regex;
use tracing::{info, warn};

use crate::air::openweather::{Location, ReadingSource};
use crate::air::pollutant::ThresholdTable;
use crate::air::report;

/// What a command does when invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Fetch a reading and render the full report.
    CurrentReport,
    Help,
    Guidelines,
    Welcome,
    /// Explain the PSI and AQI scales.
    About,
    /// Unrecognized input.
    Fallback,
}

/// One row of the command table.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub action: Action,
}

pub const COMMANDS: [CommandSpec; 5] = [
    CommandSpec {
        name: "air",
        description: "Get current air quality",
        action: Action::CurrentReport,
    },
    CommandSpec {
        name: "healthy",
        description: "Show healthy air quality guidelines",
        action: Action::Guidelines,
    },
    CommandSpec {
        name: "about",
        description: "Explain the PSI and AQI scales",
        action: Action::About,
    },
    CommandSpec {
        name: "start",
        description: "Show welcome message",
        action: Action::Welcome,
    },
    CommandSpec {
        name: "help",
        description: "Show this help message",
        action: Action::Help,
    },
];

/// Callback data carried by inline keyboard buttons.
pub const CALLBACK_REFRESH: &str = "check_aqi";
pub const CALLBACK_ABOUT: &str = "about_aqi";

/// Inline buttons as `(label, callback data)`, one per row.
pub type Buttons = &'static [(&'static str, &'static str)];

/// Resolve inline button data to an action. Unknown data is ignored.
pub fn resolve_callback(data: &str) -> Option<Action> {
    match data {
        CALLBACK_REFRESH => Some(Action::CurrentReport),
        CALLBACK_ABOUT => Some(Action::About),
        _ => None,
    }
}

/// Buttons attached under the reply to `action`.
pub fn buttons_for(action: Action) -> Buttons {
    match action {
        Action::CurrentReport => &[("🔄 Refresh", CALLBACK_REFRESH), ("ℹ️ About PSI", CALLBACK_ABOUT)],
        Action::Welcome => &[("🌍 Check Air Quality", CALLBACK_REFRESH), ("ℹ️ About PSI", CALLBACK_ABOUT)],
        Action::About => &[("🌍 Check Air Quality", CALLBACK_REFRESH)],
        Action::Help | Action::Guidelines | Action::Fallback => &[],
    }
}

/// `/name`, `/name@bot`, optionally followed by arguments.
static COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/([A-Za-z0-9_]+)(?:@([A-Za-z0-9_]+))?(?:\s|$)").expect("valid command regex")
});

/// Resolve message text to an action.
///
/// Returns `None` for commands addressed to a different bot, which must be
/// ignored in group chats. Anything else unrecognized maps to `Fallback`.
pub fn resolve(text: &str, bot_username: Option<&str>) -> Option<Action> {
    let text = text.trim();
    let Some(caps) = COMMAND_RE.captures(text) else {
        return Some(Action::Fallback);
    };

    if let (Some(target), Some(me)) = (caps.get(2), bot_username)
        && !target.as_str().eq_ignore_ascii_case(me)
    {
        return None;
    }

    let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let action = COMMANDS
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
        .map(|c| c.action)
        .unwrap_or(Action::Fallback);
    Some(action)
}

/// Runs actions against a reading source and renders replies.
pub struct Dispatcher<S> {
    source: S,
    location: Location,
    thresholds: ThresholdTable,
    timezone: Tz,
}

impl<S: ReadingSource> Dispatcher<S> {
    pub fn new(source: S, location: Location, thresholds: ThresholdTable, timezone: Tz) -> Self {
        Self {
            source,
            location,
            thresholds,
            timezone,
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// `(name, description)` pairs for help text and the command menu.
    pub fn command_list() -> Vec<(&'static str, &'static str)> {
        COMMANDS.iter().map(|c| (c.name, c.description)).collect()
    }

    /// Produce the reply for an action. Fetch failures become the generic
    /// failure message; no partial report is ever returned.
    pub async fn execute(&self, action: Action) -> String {
        match action {
            Action::CurrentReport => self.current_report().await,
            Action::Help => report::help(&self.location, &Self::command_list()),
            Action::Guidelines => report::guidelines(&self.thresholds),
            Action::Welcome => report::welcome(&self.location),
            Action::About => report::about(),
            Action::Fallback => report::fallback(&self.location),
        }
    }

    async fn current_report(&self) -> String {
        match self.source.fetch_current().await {
            Ok(reading) => {
                info!("Rendering report for {}", self.location.name);
                report::current_report(&self.location, &reading, &self.thresholds, self.timezone)
            }
            Err(e) => {
                warn!("Air quality command error: {e}");
                report::FETCH_FAILED.to_string()
            }
        }
    }
}
