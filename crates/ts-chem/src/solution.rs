//! Composition of the flask contents.

use crate::ph::neutralize;
use crate::reactant::{ReactantSpec, TitrantSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_core::units::{in_celsius, k};

/// Species name used for water formed by neutralization.
pub const WATER: &str = "H2O";

/// Snapshot of what is in the flask.
///
/// Always derived from the analyte/titrant pair via [`SolutionState::derive`];
/// never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionState {
    /// Total liquid volume (L)
    #[serde(rename = "volumeL")]
    pub volume_l: f64,
    /// Kelvin. Carried for display; not used by the pH model.
    #[serde(rename = "temperature")]
    pub temperature_k: f64,
    /// Species name → amount (mol), all non-negative
    pub moles: BTreeMap<String, f64>,
}

impl SolutionState {
    /// Recompute the flask contents from scratch.
    pub fn derive(analyte: &ReactantSpec, titrant: &TitrantSpec, temperature_k: f64) -> Self {
        let mix = neutralize(analyte, titrant);
        let mut moles = BTreeMap::new();

        let (analyte_left, titrant_left) = if analyte.kind() == titrant.kind() {
            (analyte.moles(), titrant.moles_added())
        } else if mix.excess_kind == analyte.kind() {
            (mix.excess_moles, 0.0)
        } else {
            (0.0, mix.excess_moles)
        };

        add_moles(&mut moles, analyte.species(), analyte_left);
        add_moles(&mut moles, titrant.species(), titrant_left);
        add_moles(&mut moles, WATER, mix.neutralized_moles);

        Self {
            volume_l: analyte.volume() + titrant.volume_added(),
            temperature_k,
            moles,
        }
    }

    pub fn temperature_celsius(&self) -> f64 {
        in_celsius(k(self.temperature_k))
    }

    /// Amount of `species` in mol, 0 if absent.
    pub fn moles_of(&self, species: &str) -> f64 {
        self.moles.get(species).copied().unwrap_or(0.0)
    }
}

fn add_moles(moles: &mut BTreeMap<String, f64>, species: &str, amount: f64) {
    if amount > 0.0 {
        *moles.entry(species.to_string()).or_insert(0.0) += amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactant::ReactantKind;

    fn setup(added: f64) -> (ReactantSpec, TitrantSpec) {
        (
            ReactantSpec::new(ReactantKind::Acid, 0.1, 0.025).unwrap(),
            TitrantSpec::new(ReactantKind::Base, 0.1)
                .unwrap()
                .with_volume_added(added),
        )
    }

    #[test]
    fn before_titration_only_analyte() {
        let (a, t) = setup(0.0);
        let s = SolutionState::derive(&a, &t, 298.15);
        assert!((s.volume_l - 0.025).abs() < 1e-15);
        assert!((s.moles_of("HCl") - 0.0025).abs() < 1e-15);
        assert_eq!(s.moles.len(), 1);
    }

    #[test]
    fn halfway_forms_water() {
        let (a, t) = setup(0.0125);
        let s = SolutionState::derive(&a, &t, 298.15);
        assert!((s.moles_of("HCl") - 0.00125).abs() < 1e-12);
        assert!((s.moles_of(WATER) - 0.00125).abs() < 1e-12);
        assert_eq!(s.moles_of("NaOH"), 0.0);
    }

    #[test]
    fn past_equivalence_titrant_remains() {
        let (a, t) = setup(0.050);
        let s = SolutionState::derive(&a, &t, 298.15);
        assert_eq!(s.moles_of("HCl"), 0.0);
        assert!((s.moles_of("NaOH") - 0.0025).abs() < 1e-12);
        assert!((s.moles_of(WATER) - 0.0025).abs() < 1e-12);
        assert!((s.volume_l - 0.075).abs() < 1e-15);
    }

    #[test]
    fn all_amounts_non_negative() {
        for added in [0.0, 0.01, 0.025, 0.03, 0.1] {
            let (a, t) = setup(added);
            let s = SolutionState::derive(&a, &t, 298.15);
            assert!(s.moles.values().all(|&n| n >= 0.0));
        }
    }

    #[test]
    fn celsius_readout() {
        let (a, t) = setup(0.0);
        let s = SolutionState::derive(&a, &t, 298.15);
        assert!((s.temperature_celsius() - 25.0).abs() < 1e-9);
    }
}
