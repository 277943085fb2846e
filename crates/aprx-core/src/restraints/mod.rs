//! APR restraint construction.
//!
//! An attach-pull-release calculation is defined by a set of restraints,
//! each biasing one distance, angle, or torsion between masked atom groups.
//! Every restraint carries a schedule of `(force constant, target)` pairs
//! per phase; one entry of that schedule is a *window*, and each window
//! becomes an independent simulation.
//!
//! - [`restraint`] - [`ApRestraint`](restraint::ApRestraint) and its phase schedules
//! - [`windows`] - window labeling and cross-restraint consistency checks
//! - [`amber`] - flat-bottom parameterization and AMBER NMR (DISANG) output
//! - [`guest`] - classification of the six canonical guest restraints

pub mod amber;
pub mod guest;
pub mod restraint;
pub mod windows;

pub use amber::{
    AmberOutputError, BiasPotential, RestraintValues, amber_restraint_line, bias_potential_type,
    restraint_values, write_disang,
};
pub use guest::{GUEST_RESTRAINT_NAMES, extract_guest_restraints};
pub use restraint::{ApRestraint, Phase, PhaseSpec, RestraintError, RestraintKind};
pub use windows::{WindowError, create_window_list};
