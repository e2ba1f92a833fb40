//! Reply templates. All output is Telegram HTML.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::air::openweather::{Location, OwmAqi, Reading};
use crate::air::pollutant::{PollutantKind, ThresholdTable};
use crate::air::psi::{self, BANDS, PSI_MAX};

/// Pollutants listed in the report, in display order.
const REPORTED: [PollutantKind; 4] = [
    PollutantKind::Pm25,
    PollutantKind::Pm10,
    PollutantKind::No2,
    PollutantKind::O3,
];

pub const FETCH_FAILED: &str =
    "❌ Sorry, I couldn't fetch the air quality data right now. Please try again later.";

/// Escape text for Telegram HTML.
pub fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

/// Local wall-clock time like `10/17/2026, 3:04:05 PM WIB`.
pub fn format_local_time(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format("%-m/%-d/%Y, %-I:%M:%S %p %Z").to_string()
}

/// The full `/air` report for one reading.
pub fn current_report(
    location: &Location,
    reading: &Reading,
    thresholds: &ThresholdTable,
    tz: Tz,
) -> String {
    let index = psi::psi_from_pm25(reading.pm25());
    let band = psi::classify(index);

    let levels: Vec<String> = REPORTED
        .iter()
        .filter_map(|&kind| {
            let value = reading.get(kind)?;
            let flag = thresholds
                .evaluate(value, kind)
                .map(|f| format!(" {}", f.glyph()))
                .unwrap_or_default();
            Some(format!("• {kind}: {value} μg/m³{flag}"))
        })
        .collect();

    format!(
        "🌫️ <b>{name} Air Quality Report</b>\n\
         📊 <b>Overall AQI</b>: {aqi}/5 - {aqi_desc}\n\
         PSI: {index} {glyph} {label}\n\
         \n\
         🔍 <b>Current Levels:</b>\n\
         {levels}\n\
         \n\
         📅 Updated: {updated}\n\
         \n\
         💡 <b>Health Advice:</b>\n\
         {advice}\n\
         \n\
         📊 <i>Data source: OpenWeather</i>",
        name = html_escape(&location.name),
        aqi = reading.aqi().0,
        aqi_desc = reading.aqi().description(),
        glyph = band.glyph,
        label = band.label,
        levels = levels.join("\n"),
        updated = format_local_time(reading.measured_at(), tz),
        advice = psi::advice(index),
    )
}

/// One line per band, e.g. `• 51-100: Moderate 🟡`.
pub fn psi_scale() -> String {
    BANDS
        .iter()
        .map(|b| {
            if b.upper == PSI_MAX {
                format!("• {}+: {} {}", b.lower, b.label, b.glyph)
            } else {
                format!("• {}-{}: {} {}", b.lower, b.upper, b.label, b.glyph)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The source's own 1-5 scale, e.g. `• 3 - Moderate 😷`.
pub fn aqi_scale() -> String {
    (1..=5)
        .map(|level| format!("• {level} - {}", OwmAqi(level).description()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Thresholds in effect, one line per registered pollutant.
fn threshold_lines(thresholds: &ThresholdTable) -> String {
    PollutantKind::ALL
        .iter()
        .filter_map(|&kind| {
            let t = thresholds.get(kind)?;
            Some(format!(
                "• {kind}: ✅ ≤ {} · ⚠️ ≤ {} · 🔴 ≤ {} · 🚨 above",
                t.good, t.moderate, t.unhealthy
            ))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn welcome(location: &Location) -> String {
    let name = html_escape(&location.name);
    format!(
        "🌬️ Welcome to {name} Air Quality Bot!\n\
         \n\
         I can provide you with real-time air quality information for {name}.\n\
         \n\
         Commands:\n\
         /air - Get current air quality\n\
         /help - Show this help message\n\
         \n\
         Just type /air to get started!"
    )
}

/// Help text. `commands` is the `(name, description)` list from the command table.
pub fn help(location: &Location, commands: &[(&str, &str)]) -> String {
    let name = html_escape(&location.name);
    let command_lines = commands
        .iter()
        .map(|(cmd, desc)| format!("/{cmd} - {desc}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "🆘 Help - {name} Air Quality Bot\n\
         \n\
         Commands:\n\
         {command_lines}\n\
         \n\
         The bot provides:\n\
         • PSI (Pollutant Standards Index) based on PM2.5\n\
         • PM2.5 and PM10 levels with health indicators\n\
         • WHO healthy guidelines for comparison\n\
         • Other pollutant measurements\n\
         \n\
         PSI Scale:\n\
         {scale}\n\
         \n\
         AQI Scale:\n\
         {aqi_scale}\n\
         \n\
         Health Indicators:\n\
         ✅ Good (within WHO guidelines)\n\
         ⚠️ Moderate (above guidelines)\n\
         🔴 Unhealthy (significantly above)\n\
         🚨 Very Unhealthy (dangerous levels)",
        scale = psi_scale(),
        aqi_scale = aqi_scale(),
    )
}

pub fn guidelines(thresholds: &ThresholdTable) -> String {
    format!(
        "🏥 <b>Healthy Air Quality Guidelines</b>\n\
         \n\
         📊 <b>WHO Healthy Guidelines:</b>\n\
         • PM2.5: ≤ 5 μg/m³ (annual) / ≤ 15 μg/m³ (24hr)\n\
         • PM10: ≤ 15 μg/m³ (annual) / ≤ 45 μg/m³ (24hr)\n\
         • NO₂: ≤ 10 μg/m³ (annual) / ≤ 25 μg/m³ (24hr)\n\
         • O₃: ≤ 60 μg/m³ (8hr average)\n\
         \n\
         🇸🇬 <b>Singapore PSI Scale:</b>\n\
         {scale}\n\
         \n\
         🚦 <b>Bot Indicator Thresholds (μg/m³):</b>\n\
         {limits}\n\
         \n\
         🔍 <b>What These Numbers Mean:</b>\n\
         • <b>PM2.5/PM10</b>: Tiny particles that get into your lungs\n\
         • <b>NO₂</b>: Nitrogen dioxide from cars and factories\n\
         • <b>O₃</b>: Ground-level ozone (smog)\n\
         • <b>SO₂</b>: Sulfur dioxide from burning fuel\n\
         \n\
         ⚠️ <b>Important Notes:</b>\n\
         • WHO guidelines are for long-term health\n\
         • Short-term exposure above limits may be okay\n\
         • Sensitive people (children, elderly, asthma) should be more careful\n\
         • Singapore's PSI is commonly used in Southeast Asia\n\
         \n\
         💡 <b>Quick Reference:</b>\n\
         If PM2.5 is under 15 μg/m³, air quality is generally acceptable for daily activities!",
        scale = psi_scale(),
        limits = threshold_lines(thresholds),
    )
}

/// Explainer for the two scales shown in the report.
pub fn about() -> String {
    format!(
        "📊 <b>About Air Quality Indices</b>\n\
         \n\
         🇸🇬 <b>PSI (Pollutant Standards Index):</b>\n\
         Computed here from PM2.5, on a 0-{max} scale.\n\
         {scale}\n\
         \n\
         🌍 <b>AQI (OpenWeather):</b>\n\
         Reported by the data source on a 1-5 scale.\n\
         {aqi_scale}\n\
         \n\
         <b>Main Pollutants:</b>\n\
         • PM2.5: Fine particles (most dangerous)\n\
         • PM10: Coarse particles\n\
         • O₃: Ground-level ozone\n\
         • NO₂: Traffic pollution\n\
         • SO₂: Industrial pollution\n\
         \n\
         Readings are updated hourly by OpenWeather.",
        max = PSI_MAX,
        scale = psi_scale(),
        aqi_scale = aqi_scale(),
    )
}

pub fn fallback(location: &Location) -> String {
    format!(
        "👋 Hi! Use /air to check {}'s air quality or /help for more commands.",
        html_escape(&location.name)
    )
}

pub fn loading(location: &Location) -> String {
    format!("🔄 Fetching {} air quality data...", html_escape(&location.name))
}
