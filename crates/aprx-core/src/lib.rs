//! # aprx Core Library
//!
//! A toolkit for preparing attach-pull-release (APR) binding free-energy
//! calculations with the AMBER molecular simulation ecosystem.
//!
//! ## Architectural Philosophy
//!
//! The library is organized in three layers with a strict separation of
//! concerns:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`), the
//!   AMBER atom-mask selection language, and PDB I/O.
//!
//! - **[`restraints`] and [`build`]: The Logic Core.** Restraint window
//!   schedules, AMBER NMR restraint parameterization, structure alignment,
//!   dummy-atom placement, and the `tleap` solvation driver.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer.
//!   It ties the lower layers together to stage a complete APR calculation
//!   (window directories plus per-window restraint files).

pub mod build;
pub mod core;
pub mod progress;
pub mod restraints;
pub mod workflows;
