//! Persisted experiment data types.

use serde::{Deserialize, Serialize};
use ts_chem::SolutionState;
use ts_sim::TitrationPoint;

pub type ExperimentId = String;

/// Fresh random experiment id.
pub fn new_experiment_id() -> ExperimentId {
    uuid::Uuid::new_v4().to_string()
}

/// Everything needed to reload a finished or in-progress experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentRecord {
    pub id: ExperimentId,
    pub name: String,
    /// Milliseconds since the Unix epoch at snapshot time
    pub timestamp: f64,
    pub titration_points: Vec<TitrationPoint>,
    pub final_state: SolutionState,
    pub settings: ExperimentSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentSettings {
    /// Analyte volume (L)
    pub initial_volume: f64,
    /// Titrant dispensed per nominal tick (L)
    pub droplet_volume: f64,
    /// Analyte species
    pub species: String,
    /// Analyte concentration (mol/L)
    pub concentration: f64,
}

/// Listing entry; avoids handing out whole curves when browsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentHeader {
    pub id: ExperimentId,
    pub name: String,
    pub timestamp: f64,
    pub point_count: usize,
}

impl From<&ExperimentRecord> for ExperimentHeader {
    fn from(record: &ExperimentRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            timestamp: record.timestamp,
            point_count: record.titration_points.len(),
        }
    }
}
