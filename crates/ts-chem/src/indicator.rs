//! pH indicators and the pH → color mapping.
//!
//! Each indicator has a transition band `[min, max]`. Outside the band the
//! solution shows the indicator's acid-side or base-side color; inside it the
//! color is blended linearly so that the mapping is continuous in pH.

use crate::error::ChemError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Linear RGBA color, channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Channel-wise `self + t * (other - self)`.
    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let mix = |x: f32, y: f32| x + t * (y - x);
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// 8-bit channels, handy for CSS-style consumers.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |x: f32| (x.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

/// Transition band of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhRange {
    pub min: f64,
    pub max: f64,
}

/// Color behavior of one indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorProfile {
    pub name: &'static str,
    pub ph_range: PhRange,
    pub color_below: Rgba,
    pub color_above: Rgba,
}

/// Indicators offered by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndicatorKind {
    /// Colorless → pink, 8.2–10.0
    #[default]
    Phenolphthalein,
    /// Red → yellow, 3.1–4.4
    MethylOrange,
    /// Yellow → blue, 6.0–7.6
    BromothymolBlue,
}

const PHENOLPHTHALEIN: IndicatorProfile = IndicatorProfile {
    name: "Phenolphthalein",
    ph_range: PhRange { min: 8.2, max: 10.0 },
    color_below: Rgba::new(0.8, 0.8, 0.9, 0.3),
    color_above: Rgba::new(1.0, 0.1, 0.6, 0.8),
};

const METHYL_ORANGE: IndicatorProfile = IndicatorProfile {
    name: "Methyl Orange",
    ph_range: PhRange { min: 3.1, max: 4.4 },
    color_below: Rgba::new(0.9, 0.1, 0.1, 0.8),
    color_above: Rgba::new(1.0, 0.85, 0.1, 0.8),
};

const BROMOTHYMOL_BLUE: IndicatorProfile = IndicatorProfile {
    name: "Bromothymol Blue",
    ph_range: PhRange { min: 6.0, max: 7.6 },
    color_below: Rgba::new(0.95, 0.9, 0.1, 0.8),
    color_above: Rgba::new(0.1, 0.3, 0.9, 0.8),
};

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 3] = [
        IndicatorKind::Phenolphthalein,
        IndicatorKind::MethylOrange,
        IndicatorKind::BromothymolBlue,
    ];

    pub fn profile(self) -> &'static IndicatorProfile {
        match self {
            IndicatorKind::Phenolphthalein => &PHENOLPHTHALEIN,
            IndicatorKind::MethylOrange => &METHYL_ORANGE,
            IndicatorKind::BromothymolBlue => &BROMOTHYMOL_BLUE,
        }
    }

    /// Identifier used in config files and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            IndicatorKind::Phenolphthalein => "phenolphthalein",
            IndicatorKind::MethylOrange => "methylOrange",
            IndicatorKind::BromothymolBlue => "bromothymolBlue",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().name)
    }
}

impl FromStr for IndicatorKind {
    type Err = ChemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        IndicatorKind::ALL
            .into_iter()
            .find(|k| k.key().to_ascii_lowercase() == wanted)
            .ok_or_else(|| ChemError::UnknownIndicator {
                name: s.to_string(),
            })
    }
}

/// Color of a solution at `ph` stained with `profile`.
///
/// Endpoints are exact: `color_at(min) == color_below` and
/// `color_at(max) == color_above`. A NaN pH maps to `color_below`.
pub fn color_at(ph: f64, profile: &IndicatorProfile) -> Rgba {
    let PhRange { min, max } = profile.ph_range;
    if ph.is_nan() || ph <= min {
        return profile.color_below;
    }
    if ph >= max {
        return profile.color_above;
    }
    let t = ((ph - min) / (max - min)).clamp(0.0, 1.0) as f32;
    profile.color_below.lerp(profile.color_above, t)
}
