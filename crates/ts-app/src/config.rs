//! Experiment configuration.
//!
//! Config files use lab units (mL, mol/L, ms) and every section has
//! defaults, so an empty file describes the classic 25 mL of 0.1 M HCl
//! against 0.1 M NaOH with phenolphthalein.
//!
//! ```yaml
//! analyte:
//!   kind: acid
//!   concentration_molar: 0.1
//!   volume_ml: 25
//! titrant:
//!   kind: base
//!   concentration_molar: 0.1
//! dispensing:
//!   flow_rate_ml_per_s: 0.5
//!   max_volume_ml: 100
//!   tick_period_ms: 50
//!   dedup_epsilon_ml: 0.1
//! indicator: phenolphthalein
//! ```

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use ts_chem::{IndicatorKind, ReactantKind, ReactantSpec, TitrantSpec};
use ts_core::constants::ROOM_TEMPERATURE_K;
use ts_core::{ensure_non_negative, ensure_positive};
use ts_core::units::{in_liters, ml};
use ts_sim::DispenseConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub analyte: AnalyteConfig,
    pub titrant: TitrantConfig,
    pub dispensing: DispensingConfig,
    pub indicator: IndicatorKind,
    pub temperature_k: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            analyte: AnalyteConfig::default(),
            titrant: TitrantConfig::default(),
            dispensing: DispensingConfig::default(),
            indicator: IndicatorKind::default(),
            temperature_k: ROOM_TEMPERATURE_K,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyteConfig {
    pub kind: ReactantKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    pub concentration_molar: f64,
    pub volume_ml: f64,
}

impl Default for AnalyteConfig {
    fn default() -> Self {
        Self {
            kind: ReactantKind::Acid,
            species: None,
            concentration_molar: 0.1,
            volume_ml: 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitrantConfig {
    pub kind: ReactantKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    pub concentration_molar: f64,
}

impl Default for TitrantConfig {
    fn default() -> Self {
        Self {
            kind: ReactantKind::Base,
            species: None,
            concentration_molar: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispensingConfig {
    pub flow_rate_ml_per_s: f64,
    pub max_volume_ml: f64,
    pub tick_period_ms: f64,
    pub dedup_epsilon_ml: f64,
}

impl Default for DispensingConfig {
    fn default() -> Self {
        Self {
            flow_rate_ml_per_s: 0.5,
            max_volume_ml: 100.0,
            tick_period_ms: 50.0,
            dedup_epsilon_ml: 0.1,
        }
    }
}

/// Checked, SI-converted form of [`EngineConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    pub analyte: ReactantSpec,
    pub titrant: TitrantSpec,
    pub dispense: DispenseConfig,
    /// L
    pub dedup_epsilon_l: f64,
    pub indicator: IndicatorKind,
    pub temperature_k: f64,
}

impl EngineConfig {
    /// Convert to engine units and reject anything unphysical.
    ///
    /// # Errors
    ///
    /// [`AppError::Configuration`] for non-positive concentrations, a
    /// negative analyte volume, or non-positive dispensing parameters.
    pub fn validate(&self) -> AppResult<ValidatedConfig> {
        let mut analyte = ReactantSpec::new(
            self.analyte.kind,
            self.analyte.concentration_molar,
            in_liters(ml(self.analyte.volume_ml)),
        )?;
        if let Some(species) = &self.analyte.species {
            analyte = analyte.with_species(species.clone());
        }

        let mut titrant = TitrantSpec::new(self.titrant.kind, self.titrant.concentration_molar)?;
        if let Some(species) = &self.titrant.species {
            titrant = titrant.with_species(species.clone());
        }

        let dispense = DispenseConfig {
            flow_rate_l_per_s: in_liters(ml(self.dispensing.flow_rate_ml_per_s)),
            max_volume_l: in_liters(ml(self.dispensing.max_volume_ml)),
            tick_period_ms: self.dispensing.tick_period_ms,
        };
        dispense.validate()?;

        let dedup_epsilon_ml =
            ensure_non_negative(self.dispensing.dedup_epsilon_ml, "dedup epsilon")?;

        let temperature_k = ensure_positive(self.temperature_k, "temperature")?;

        Ok(ValidatedConfig {
            analyte,
            titrant,
            dispense,
            dedup_epsilon_l: in_liters(ml(dedup_epsilon_ml)),
            indicator: self.indicator,
            temperature_k,
        })
    }
}

/// Read a YAML (`.yaml`/`.yml`) or JSON (`.json`) config file.
///
/// Files with another extension are parsed as YAML. The result is not
/// validated; call [`EngineConfig::validate`] or hand it to the engine.
pub fn load_config(path: &Path) -> AppResult<EngineConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigFileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let parsed = if is_json {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| AppError::ConfigParse {
        path: path.to_path_buf(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_reference_experiment() {
        let v = EngineConfig::default().validate().unwrap();
        assert_eq!(v.analyte.kind(), ReactantKind::Acid);
        assert!((v.analyte.volume() - 0.025).abs() < 1e-15);
        assert!((v.dispense.flow_rate_l_per_s - 0.5e-3).abs() < 1e-15);
        assert!((v.dispense.max_volume_l - 0.1).abs() < 1e-15);
        assert!((v.dedup_epsilon_l - 1e-4).abs() < 1e-15);
        assert_eq!(v.indicator, IndicatorKind::Phenolphthalein);
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        let cfg: EngineConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn partial_yaml_overrides_fields() {
        let yaml = "
analyte:
  kind: base
  concentration_molar: 0.05
  species: KOH
titrant:
  kind: acid
indicator: methylOrange
";
        let cfg: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.analyte.kind, ReactantKind::Base);
        assert_eq!(cfg.analyte.volume_ml, 25.0);
        assert_eq!(cfg.indicator, IndicatorKind::MethylOrange);
        let v = cfg.validate().unwrap();
        assert_eq!(v.analyte.species(), "KOH");
        assert_eq!(v.titrant.species(), "HCl");
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = EngineConfig::default();
        cfg.titrant.concentration_molar = 0.0;
        assert!(matches!(cfg.validate(), Err(AppError::Configuration(_))));

        let mut cfg = EngineConfig::default();
        cfg.analyte.volume_ml = -5.0;
        assert!(matches!(cfg.validate(), Err(AppError::Configuration(_))));

        let mut cfg = EngineConfig::default();
        cfg.dispensing.tick_period_ms = 0.0;
        assert!(matches!(cfg.validate(), Err(AppError::Configuration(_))));

        let mut cfg = EngineConfig::default();
        cfg.dispensing.dedup_epsilon_ml = f64::NAN;
        assert!(matches!(cfg.validate(), Err(AppError::Configuration(_))));

        let mut cfg = EngineConfig::default();
        cfg.temperature_k = -1.0;
        assert!(matches!(cfg.validate(), Err(AppError::Configuration(_))));
    }

    #[test]
    fn load_config_reads_json_and_yaml() {
        let dir = std::env::temp_dir().join("ts_app_config_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let json = dir.join("exp.json");
        std::fs::write(&json, r#"{ "titrant": { "concentration_molar": 0.2 } }"#).unwrap();
        assert_eq!(load_config(&json).unwrap().titrant.concentration_molar, 0.2);

        let yaml = dir.join("exp.yaml");
        std::fs::write(&yaml, "dispensing:\n  flow_rate_ml_per_s: 2.0\n").unwrap();
        assert_eq!(load_config(&yaml).unwrap().dispensing.flow_rate_ml_per_s, 2.0);

        let broken = dir.join("broken.yaml");
        std::fs::write(&broken, "analyte: [not, a, map]\n").unwrap();
        assert!(matches!(
            load_config(&broken),
            Err(AppError::ConfigParse { .. })
        ));

        assert!(matches!(
            load_config(&dir.join("missing.yaml")),
            Err(AppError::ConfigFileRead { .. })
        ));
    }
}
