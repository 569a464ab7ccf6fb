//! Analyte and titrant descriptions.

use crate::error::{ChemError, ChemResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_core::{ensure_non_negative, ensure_positive};

/// Acid/base character of a reactant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactantKind {
    /// Strong acid (e.g. HCl)
    Acid,
    /// Strong base (e.g. NaOH)
    Base,
}

impl ReactantKind {
    pub fn opposite(self) -> Self {
        match self {
            ReactantKind::Acid => ReactantKind::Base,
            ReactantKind::Base => ReactantKind::Acid,
        }
    }

    /// Species used when the caller does not name one.
    pub fn default_species(self) -> &'static str {
        match self {
            ReactantKind::Acid => "HCl",
            ReactantKind::Base => "NaOH",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ReactantKind::Acid => "acid",
            ReactantKind::Base => "base",
        }
    }
}

impl fmt::Display for ReactantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReactantKind {
    type Err = ChemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "acid" => Ok(ReactantKind::Acid),
            "base" => Ok(ReactantKind::Base),
            other => Err(ChemError::UnknownKind {
                name: other.to_string(),
            }),
        }
    }
}

/// The solution initially in the flask.
///
/// Fields are private so that every instance has passed validation:
/// concentration is positive and finite, volume is non-negative and finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReactantSpec {
    kind: ReactantKind,
    species: String,
    /// mol/L
    concentration: f64,
    /// L
    volume: f64,
}

impl ReactantSpec {
    /// Create an analyte description using the default species for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ChemError::InvalidConcentration`] for a non-positive or
    /// non-finite concentration and [`ChemError::InvalidVolume`] for a
    /// negative or non-finite volume.
    pub fn new(kind: ReactantKind, concentration: f64, volume: f64) -> ChemResult<Self> {
        let concentration = ensure_positive(concentration, "analyte concentration")
            .map_err(ChemError::concentration("analyte"))?;
        let volume =
            ensure_non_negative(volume, "analyte volume").map_err(ChemError::volume("analyte"))?;
        Ok(Self {
            kind,
            species: kind.default_species().to_string(),
            concentration,
            volume,
        })
    }

    pub fn with_species(mut self, species: impl Into<String>) -> Self {
        self.species = species.into();
        self
    }

    pub fn kind(&self) -> ReactantKind {
        self.kind
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn concentration(&self) -> f64 {
        self.concentration
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Moles of reactant initially present.
    pub fn moles(&self) -> f64 {
        self.concentration * self.volume
    }
}

/// The solution dispensed from the burette.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitrantSpec {
    kind: ReactantKind,
    species: String,
    /// mol/L
    concentration: f64,
    /// L dispensed so far
    volume_added: f64,
}

impl TitrantSpec {
    /// Create a titrant description with nothing dispensed yet.
    ///
    /// # Errors
    ///
    /// Returns [`ChemError::InvalidConcentration`] for a non-positive or
    /// non-finite concentration.
    pub fn new(kind: ReactantKind, concentration: f64) -> ChemResult<Self> {
        let concentration = ensure_positive(concentration, "titrant concentration")
            .map_err(ChemError::concentration("titrant"))?;
        Ok(Self {
            kind,
            species: kind.default_species().to_string(),
            concentration,
            volume_added: 0.0,
        })
    }

    pub fn with_species(mut self, species: impl Into<String>) -> Self {
        self.species = species.into();
        self
    }

    pub fn with_volume_added(mut self, volume: f64) -> Self {
        self.set_volume_added(volume);
        self
    }

    pub fn kind(&self) -> ReactantKind {
        self.kind
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn concentration(&self) -> f64 {
        self.concentration
    }

    pub fn volume_added(&self) -> f64 {
        self.volume_added
    }

    /// Set the dispensed volume. Negative and NaN inputs become 0.
    pub fn set_volume_added(&mut self, volume: f64) {
        self.volume_added = if volume.is_nan() { 0.0 } else { volume.max(0.0) };
    }

    /// Moles of titrant dispensed so far.
    pub fn moles_added(&self) -> f64 {
        self.concentration * self.volume_added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Acid".parse::<ReactantKind>().unwrap(), ReactantKind::Acid);
        assert_eq!(" BASE ".parse::<ReactantKind>().unwrap(), ReactantKind::Base);
        assert!("salt".parse::<ReactantKind>().is_err());
    }

    #[test]
    fn opposite_flips() {
        assert_eq!(ReactantKind::Acid.opposite(), ReactantKind::Base);
        assert_eq!(ReactantKind::Base.opposite(), ReactantKind::Acid);
    }

    #[test]
    fn analyte_rejects_bad_concentration() {
        assert!(matches!(
            ReactantSpec::new(ReactantKind::Acid, 0.0, 0.025),
            Err(ChemError::InvalidConcentration { .. })
        ));
        assert!(ReactantSpec::new(ReactantKind::Acid, -0.1, 0.025).is_err());
        assert!(ReactantSpec::new(ReactantKind::Acid, f64::NAN, 0.025).is_err());
    }

    #[test]
    fn analyte_rejects_negative_volume() {
        let err = ReactantSpec::new(ReactantKind::Base, 0.1, -0.01).unwrap_err();
        assert_eq!(
            err,
            ChemError::InvalidVolume {
                what: "analyte",
                value: -0.01
            }
        );
    }

    #[test]
    fn analyte_allows_empty_flask() {
        let spec = ReactantSpec::new(ReactantKind::Acid, 0.1, 0.0).unwrap();
        assert_eq!(spec.moles(), 0.0);
    }

    #[test]
    fn default_species_follow_kind() {
        let a = ReactantSpec::new(ReactantKind::Acid, 0.1, 0.025).unwrap();
        let t = TitrantSpec::new(ReactantKind::Base, 0.1).unwrap();
        assert_eq!(a.species(), "HCl");
        assert_eq!(t.species(), "NaOH");
        let a = a.with_species("HNO3");
        assert_eq!(a.species(), "HNO3");
    }

    #[test]
    fn titrant_volume_never_negative() {
        let mut t = TitrantSpec::new(ReactantKind::Base, 0.1).unwrap();
        t.set_volume_added(-1.0);
        assert_eq!(t.volume_added(), 0.0);
        t.set_volume_added(f64::NAN);
        assert_eq!(t.volume_added(), 0.0);
        t.set_volume_added(0.02);
        assert!((t.moles_added() - 0.002).abs() < 1e-15);
    }
}
