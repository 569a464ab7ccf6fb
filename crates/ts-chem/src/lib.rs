//! ts-chem: strong acid / strong base chemistry for titrasim.
//!
//! Provides:
//! - Reactant descriptions for the analyte and the titrant
//! - pH of a neutralization mixture (`compute_ph`)
//! - Indicator profiles and pH → color mapping (`color_at`)
//! - Derived solution composition (`SolutionState`)
//!
//! # Model
//!
//! Only complete neutralization of a strong acid by a strong base (or the
//! reverse) is modeled. Whatever reactant is left over after neutralization
//! sets the pH. Weak acids, buffers and temperature effects are not modeled.
//!
//! # Example
//!
//! ```
//! use ts_chem::{compute_ph, ReactantKind, ReactantSpec, TitrantSpec};
//!
//! let analyte = ReactantSpec::new(ReactantKind::Acid, 0.1, 0.025).unwrap();
//! let mut titrant = TitrantSpec::new(ReactantKind::Base, 0.1).unwrap();
//!
//! assert!((compute_ph(&analyte, &titrant) - 1.0).abs() < 1e-12);
//!
//! titrant.set_volume_added(0.025);
//! assert_eq!(compute_ph(&analyte, &titrant), 7.0);
//! ```

pub mod error;
pub mod indicator;
pub mod ph;
pub mod reactant;
pub mod solution;

// Re-exports for ergonomics
pub use error::{ChemError, ChemResult};
pub use indicator::{IndicatorKind, IndicatorProfile, PhRange, Rgba, color_at};
pub use ph::{compute_ph, equivalence_volume};
pub use reactant::{ReactantKind, ReactantSpec, TitrantSpec};
pub use solution::SolutionState;
