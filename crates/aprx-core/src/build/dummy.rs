//! Dummy anchor atoms and their force-field support files.
//!
//! The APR pulling axis is anchored by non-interacting dummy atoms placed
//! below the host along -z. Each dummy is its own single-atom residue
//! (`DM1`, `DM2`, ..) holding one lead-mass atom named `DUM`, and AMBER
//! needs a `frcmod` with the mass/nonbonded entries plus one `mol2` per
//! dummy residue so `tleap` can load them.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;
use tracing::debug;

use crate::core::models::{Atom, AtomId, Structure};

/// Atom type assigned to dummy atoms in the frcmod and mol2 files.
pub const DUMMY_ATOM_TYPE: &str = "Du";

/// Appends a dummy atom to `structure` as a new single-atom residue.
///
/// The residue is numbered after the current last residue and the atom's
/// serial continues the structure's numbering, so writing the structure
/// back out keeps a monotonic PDB.
pub fn add_dummy(structure: &mut Structure, residue_name: &str, position: Point3<f64>) -> AtomId {
    let serial = structure.max_serial() + 1;
    let number = structure.max_residue_number() + 1;
    let residue_id = structure.add_residue(number, residue_name);

    let mut atom = Atom::new("DUM", serial, residue_id, position);
    atom.element = "PB".into();

    debug!(residue_name, serial, ?position, "added dummy atom");
    structure
        .add_atom_to_residue(residue_id, atom)
        .unwrap_or_else(|| unreachable!("residue was just inserted"))
}

/// Writes the `frcmod` file parameterizing the dummy atom type.
///
/// The dummy carries a heavy mass and no nonbonded interactions, so it
/// stays put under restraints without perturbing the physical system.
pub fn write_dummy_frcmod<P: AsRef<Path>>(path: P) -> io::Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write!(
        writer,
        "Parameters for dummy atom with type {atom_type}\n\
         MASS\n\
         {atom_type}     208.00\n\
         \n\
         BOND\n\
         \n\
         ANGLE\n\
         \n\
         DIHE\n\
         \n\
         IMPROPER\n\
         \n\
         NONBON\n\
         \x20 {atom_type}       0.000     0.0000000\n",
        atom_type = DUMMY_ATOM_TYPE
    )?;
    writer.flush()
}

/// Writes a single-atom `mol2` file for one dummy residue.
pub fn write_dummy_mol2<P: AsRef<Path>>(path: P, residue_name: &str) -> io::Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write!(
        writer,
        "@<TRIPOS>MOLECULE\n\
         {residue_name}\n\
         \x20   1     0     1     0     1\n\
         SMALL\n\
         USER_CHARGES\n\
         \n\
         @<TRIPOS>ATOM\n\
         \x20 1 DUM     0.000000    0.000000    0.000000 {atom_type}    1 {residue_name}     0.0000 ****\n\
         @<TRIPOS>BOND\n\
         @<TRIPOS>SUBSTRUCTURE\n\
         \x20     1 {residue_name}              1 ****               0 ****  ****\n",
        residue_name = residue_name,
        atom_type = DUMMY_ATOM_TYPE
    )?;
    writer.flush()
}
