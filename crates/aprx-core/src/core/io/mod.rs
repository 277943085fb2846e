//! File I/O for molecular structures.
//!
//! The only format the toolkit reads and writes itself is PDB; everything
//! else (prmtop, rst7, mol2 libraries) is produced by tleap. The
//! [`traits::StructureFile`] trait keeps the door open for additional
//! formats without changing call sites.

pub mod pdb;
pub mod traits;
