//! # Core Module
//!
//! Fundamental building blocks shared by the rest of the toolkit: the
//! molecular structure model, the AMBER atom-mask selection language, and
//! file I/O.
//!
//! The submodules are intentionally free of APR-specific logic so that the
//! restraint and build layers can treat them as a stable foundation:
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues, and the `Structure` container
//! - **Selections** ([`selection`]) - The AMBER mask language (`:RES@ATOM`)
//! - **File I/O** ([`io`]) - Reading/writing PDB files with order preservation

pub mod io;
pub mod models;
pub mod selection;
