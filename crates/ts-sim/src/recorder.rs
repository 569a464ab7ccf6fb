//! Titration curve recording.
//!
//! Samples arrive once per dispensing tick, far denser than a chart needs.
//! The recorder keeps a sample only when the dispensed volume has moved more
//! than `epsilon` since the last kept sample, which bounds the curve density
//! independently of the tick rate.

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use ts_chem::{ReactantSpec, TitrantSpec};

/// Default dedup threshold: 0.1 mL.
pub const DEFAULT_DEDUP_EPSILON_L: f64 = 1e-4;

/// One sample of the titration curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TitrationPoint {
    /// Titrant dispensed so far (L)
    #[serde(rename = "volumeAdded")]
    pub volume_added: f64,
    #[serde(rename = "pH")]
    pub ph: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp: f64,
}

/// Aggregate view of a recorded curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSummary {
    pub count: usize,
    pub min_ph: f64,
    pub max_ph: f64,
    /// Midpoint volume (L) of the segment with the largest |ΔpH/ΔV|, if the
    /// curve has at least two distinct volumes.
    pub steepest_volume: Option<f64>,
}

/// Ordered, deduplicated curve samples.
#[derive(Debug, Clone)]
pub struct CurveRecorder {
    epsilon: f64,
    points: Vec<TitrationPoint>,
}

impl Default for CurveRecorder {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_DEDUP_EPSILON_L,
            points: Vec::new(),
        }
    }
}

impl CurveRecorder {
    /// Create a recorder with dedup threshold `epsilon` (L).
    ///
    /// # Errors
    ///
    /// Returns error if `epsilon` is negative or not finite.
    pub fn new(epsilon: f64) -> SimResult<Self> {
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(SimError::InvalidArg {
                what: "dedup epsilon must be non-negative and finite",
            });
        }
        Ok(Self {
            epsilon,
            points: Vec::new(),
        })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Append `point` unless it is within `epsilon` of the last kept volume.
    ///
    /// Points whose volume lies below the last kept volume are dropped too, so
    /// the stored sequence stays non-decreasing in volume.
    ///
    /// Returns `true` if the point was stored.
    pub fn record(&mut self, point: TitrationPoint) -> bool {
        if let Some(last) = self.points.last() {
            let delta = point.volume_added - last.volume_added;
            if delta.abs() <= self.epsilon {
                return false;
            }
            if delta < 0.0 {
                tracing::warn!(
                    volume = point.volume_added,
                    last = last.volume_added,
                    "dropping curve sample that moves backwards in volume"
                );
                return false;
            }
        }
        self.points.push(point);
        true
    }

    pub fn points(&self) -> &[TitrationPoint] {
        &self.points
    }

    pub fn last(&self) -> Option<&TitrationPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn reset(&mut self) {
        self.points.clear();
    }

    /// Analytic equivalence volume (L) for the given reactants.
    ///
    /// Independent of the recorded samples.
    pub fn equivalence_volume(analyte: &ReactantSpec, titrant: &TitrantSpec) -> f64 {
        ts_chem::equivalence_volume(analyte, titrant)
    }

    /// Midpoint volume of the steepest recorded segment.
    pub fn steepest_slope_volume(&self) -> Option<f64> {
        steepest_slope_volume(&self.points)
    }

    pub fn summary(&self) -> Option<CurveSummary> {
        CurveSummary::of(&self.points)
    }
}

impl CurveSummary {
    /// Summarize an ordered curve; `None` when it has no samples.
    pub fn of(points: &[TitrationPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let (min_ph, max_ph) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.ph), hi.max(p.ph))
            });
        Some(Self {
            count: points.len(),
            min_ph,
            max_ph,
            steepest_volume: steepest_slope_volume(points),
        })
    }
}

fn steepest_slope_volume(points: &[TitrationPoint]) -> Option<f64> {
    points
        .windows(2)
        .filter_map(|w| {
            let dv = w[1].volume_added - w[0].volume_added;
            (dv > 0.0).then(|| {
                let slope = ((w[1].ph - w[0].ph) / dv).abs();
                (slope, 0.5 * (w[0].volume_added + w[1].volume_added))
            })
        })
        .fold(None, |best: Option<(f64, f64)>, cand| match best {
            Some(b) if b.0 >= cand.0 => Some(b),
            _ => Some(cand),
        })
        .map(|(_, v)| v)
}
