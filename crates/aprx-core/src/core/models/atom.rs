use super::ids::ResidueId;
use nalgebra::Point3;

/// Represents an atom in a molecular structure.
///
/// This struct carries exactly the information APR setup needs: the atom's
/// identity, its parent residue, and its coordinates, plus the PDB
/// pass-through fields (occupancy, temperature factor, element symbol) that
/// must survive a read/modify/write round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom (e.g., "CA", "O2", "DUM").
    pub name: String,
    /// The atom serial number from the source file.
    pub serial: usize,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// Occupancy column from the source file (1.0 for generated atoms).
    pub occupancy: f64,
    /// Temperature factor column from the source file.
    pub b_factor: f64,
    /// The element symbol (e.g., "C", "Pb"), possibly empty for old files.
    pub element: String,
}

impl Atom {
    /// Creates a new `Atom` with default values for the PDB pass-through
    /// fields.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the atom.
    /// * `serial` - The atom serial number.
    /// * `residue_id` - The ID of the residue this atom belongs to.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(name: &str, serial: usize, residue_id: ResidueId, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            serial,
            residue_id,
            position,
            occupancy: 0.0,
            b_factor: 0.0,
            element: String::new(),
        }
    }
}
