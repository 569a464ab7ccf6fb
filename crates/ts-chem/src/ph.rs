//! pH of a strong acid / strong base mixture.

use crate::reactant::{ReactantKind, ReactantSpec, TitrantSpec};
use ts_core::clamp_or;
use ts_core::constants::{PH_MAX, PH_MIN, PH_NEUTRAL, WATER_SELF_IONIZATION_M};

/// pH reported for an empty vessel with an acid analyte.
pub const EMPTY_ACID_PH: f64 = 1.0;
/// pH reported for an empty vessel with a base analyte.
pub const EMPTY_BASE_PH: f64 = 13.0;

/// Outcome of mixing the dispensed titrant into the analyte.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neutralization {
    /// Character of whatever is left over.
    pub excess_kind: ReactantKind,
    /// Moles left over after neutralization (>= 0).
    pub excess_moles: f64,
    /// Moles of acid (equivalently base) consumed.
    pub neutralized_moles: f64,
}

/// Stoichiometry of the current mixture.
///
/// Opposite kinds neutralize 1:1 and whichever side is larger survives.
/// Matching kinds simply accumulate.
pub fn neutralize(analyte: &ReactantSpec, titrant: &TitrantSpec) -> Neutralization {
    let initial = analyte.moles();
    let added = titrant.moles_added();

    if analyte.kind() == titrant.kind() {
        return Neutralization {
            excess_kind: analyte.kind(),
            excess_moles: initial + added,
            neutralized_moles: 0.0,
        };
    }

    let excess = initial - added;
    if excess < 0.0 {
        Neutralization {
            excess_kind: titrant.kind(),
            excess_moles: excess.abs(),
            neutralized_moles: initial,
        }
    } else {
        Neutralization {
            excess_kind: analyte.kind(),
            excess_moles: excess,
            neutralized_moles: added,
        }
    }
}

/// Compute the pH of the analyte after `titrant.volume_added()` liters of
/// titrant have been mixed in.
///
/// Pure and idempotent. Always returns a finite value in `[0, 14]`:
/// - an empty vessel reports 1 (acid analyte) or 13 (base analyte)
/// - an excess below water's self-ionization (1e-7 M) reports exactly 7
pub fn compute_ph(analyte: &ReactantSpec, titrant: &TitrantSpec) -> f64 {
    let total_volume = analyte.volume() + titrant.volume_added();
    if total_volume <= 0.0 {
        return match analyte.kind() {
            ReactantKind::Acid => EMPTY_ACID_PH,
            ReactantKind::Base => EMPTY_BASE_PH,
        };
    }

    let mix = neutralize(analyte, titrant);
    let excess_concentration = mix.excess_moles / total_volume;

    // NaN compares false here and falls through to the clamp below.
    if excess_concentration < WATER_SELF_IONIZATION_M {
        return PH_NEUTRAL;
    }

    let ph = match mix.excess_kind {
        ReactantKind::Acid => (-excess_concentration.log10()).max(PH_MIN),
        ReactantKind::Base => (PH_MAX + excess_concentration.log10()).min(PH_MAX),
    };
    clamp_or(ph, PH_MIN, PH_MAX, PH_NEUTRAL)
}

/// Titrant volume (L) at which moles of acid and base are equal.
///
/// Closed form `Ca * Va / Ct`, independent of any recorded samples.
pub fn equivalence_volume(analyte: &ReactantSpec, titrant: &TitrantSpec) -> f64 {
    analyte.moles() / titrant.concentration()
}
