//! PSI-style severity index derived from PM2.5.
//!
//! The Converter maps a concentration onto the 0-500 scale, and the
//! Classifier and Advisory Generator both read the same `BANDS` table.

use crate::air::pollutant::Concentration;

/// Upper end of the severity scale.
pub const PSI_MAX: u16 = 500;

/// Severity index in `[0, PSI_MAX]`.
pub type Psi = u16;

/// Piecewise-linear segments: (upper PM2.5 bound, base index, lower PM2.5 bound, slope).
const SEGMENTS: [(f64, f64, f64, f64); 4] = [
    (12.0, 0.0, 0.0, 4.1667),
    (35.4, 50.0, 12.0, 2.13),
    (55.4, 100.0, 35.4, 5.0),
    (150.4, 200.0, 55.4, 1.05),
];

/// Open-ended top segment: (base index, lower PM2.5 bound, slope).
const TOP_SEGMENT: (f64, f64, f64) = (300.0, 150.4, 1.33);

/// Convert a PM2.5 concentration to a severity index.
///
/// Rounds half away from zero (`f64::round`). Segment upper bounds are
/// inclusive, so `12.0` maps to exactly 50. Anything past the top of the
/// scale is clamped to [`PSI_MAX`].
pub fn psi_from_pm25(pm25: Concentration) -> Psi {
    let c = pm25.value();
    let raw = SEGMENTS
        .iter()
        .find(|(upper, ..)| c <= *upper)
        .map(|&(_, base, lower, slope)| base + (c - lower) * slope)
        .unwrap_or_else(|| {
            let (base, lower, slope) = TOP_SEGMENT;
            base + (c - lower) * slope
        });

    raw.round().min(f64::from(PSI_MAX)) as Psi
}

/// Severity category, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Good,
    Moderate,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

/// One band of the scale: everything up to and including `upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    /// Inclusive lower bound, for display.
    pub lower: Psi,
    /// Inclusive upper bound.
    pub upper: Psi,
    pub category: Category,
    pub glyph: &'static str,
    pub label: &'static str,
    pub advice: &'static str,
}

/// Bands in ascending order. The last band absorbs everything up to `PSI_MAX`.
pub static BANDS: [Band; 5] = [
    Band {
        lower: 0,
        upper: 50,
        category: Category::Good,
        glyph: "🟢",
        label: "Good",
        advice: "Perfect for outdoor activities! 🌟",
    },
    Band {
        lower: 51,
        upper: 100,
        category: Category::Moderate,
        glyph: "🟡",
        label: "Moderate",
        advice: "Good air quality. Enjoy outdoor activities! 👍",
    },
    Band {
        lower: 101,
        upper: 200,
        category: Category::Unhealthy,
        glyph: "🔴",
        label: "Unhealthy",
        advice: "Sensitive individuals should limit prolonged outdoor activities. 😷",
    },
    Band {
        lower: 201,
        upper: 300,
        category: Category::VeryUnhealthy,
        glyph: "🟣",
        label: "Very Unhealthy",
        advice: "Everyone should limit outdoor activities. Wear a mask if going out. 😰",
    },
    Band {
        lower: 301,
        upper: PSI_MAX,
        category: Category::Hazardous,
        glyph: "🔴",
        label: "Hazardous",
        advice: "Avoid outdoor activities. Stay indoors and use air purifiers if available. 🏠",
    },
];

/// Classify a severity index: the band containing `psi`, clamping values
/// above the scale.
pub fn classify(psi: Psi) -> &'static Band {
    let psi = psi.min(PSI_MAX);
    let last = &BANDS[BANDS.len() - 1];
    BANDS.iter().find(|b| psi <= b.upper).unwrap_or(last)
}

/// Recommended action for a severity index.
pub fn advice(psi: Psi) -> &'static str {
    classify(psi).advice
}
