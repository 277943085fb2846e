use super::atom::Atom;
use super::ids::{AtomId, ResidueId};
use super::residue::Residue;
use slotmap::SlotMap;

/// Represents a complete molecular structure with atoms and residues.
///
/// This struct is the central data structure of the toolkit. Storage is
/// slotmap-backed so IDs remain stable under modification, and separate
/// insertion-order lists guarantee that iteration follows source-file order.
/// That ordering is load-bearing: AMBER mask indices and tleap residue
/// ordinals are both defined by file position.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    /// Primary storage for atoms using a slot map for stable ID management.
    atoms: SlotMap<AtomId, Atom>,
    /// Primary storage for residues using a slot map for stable ID management.
    residues: SlotMap<ResidueId, Residue>,
    /// Atom IDs in insertion (file) order.
    atom_order: Vec<AtomId>,
    /// Residue IDs in insertion (file) order.
    residue_order: Vec<ResidueId>,
}

impl Structure {
    /// Creates a new, empty structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves an immutable reference to an atom by its ID.
    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    /// Retrieves a mutable reference to an atom by its ID.
    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    /// Retrieves an immutable reference to a residue by its ID.
    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    /// Returns an iterator over all atoms in file order.
    ///
    /// # Return
    ///
    /// An iterator yielding `(AtomId, &Atom)` pairs, ordered as the atoms
    /// appeared in the source file.
    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atom_order.iter().map(|&id| (id, &self.atoms[id]))
    }

    /// Returns an iterator over mutable references to all atoms.
    ///
    /// Iteration order is unspecified; use this for whole-structure
    /// transforms where order does not matter.
    pub fn atoms_iter_mut(&mut self) -> impl Iterator<Item = &mut Atom> {
        self.atoms.values_mut()
    }

    /// Returns an iterator over all residues in file order.
    pub fn residues_iter(&self) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.residue_order
            .iter()
            .map(|&id| (id, &self.residues[id]))
    }

    /// Returns the number of atoms in the structure.
    pub fn atom_count(&self) -> usize {
        self.atom_order.len()
    }

    /// Returns the number of residues in the structure.
    pub fn residue_count(&self) -> usize {
        self.residue_order.len()
    }

    /// Returns `true` if the structure holds no atoms.
    pub fn is_empty(&self) -> bool {
        self.atom_order.is_empty()
    }

    /// Returns the ID of the last residue in file order, if any.
    pub fn last_residue(&self) -> Option<ResidueId> {
        self.residue_order.last().copied()
    }

    /// Appends a new residue to the structure.
    ///
    /// Residue numbers are not required to be unique; PDB files reuse them
    /// across chains. The returned ID identifies this particular residue.
    pub fn add_residue(&mut self, number: isize, name: &str) -> ResidueId {
        let id = self.residues.insert(Residue::new(number, name));
        self.residue_order.push(id);
        id
    }

    /// Adds an atom to a specific residue.
    ///
    /// # Return
    ///
    /// Returns `Some(AtomId)` if successful, otherwise `None` (e.g., if the
    /// residue does not exist).
    pub fn add_atom_to_residue(&mut self, residue_id: ResidueId, atom: Atom) -> Option<AtomId> {
        if !self.residues.contains_key(residue_id) {
            return None;
        }

        let name = atom.name.clone();
        let atom_id = self.atoms.insert(atom);
        self.atom_order.push(atom_id);

        let residue = self.residues.get_mut(residue_id).unwrap();
        residue.add_atom(&name, atom_id);
        Some(atom_id)
    }

    /// Returns the largest atom serial number in the structure, or 0 when
    /// the structure is empty.
    pub fn max_serial(&self) -> usize {
        self.atoms.values().map(|a| a.serial).max().unwrap_or(0)
    }

    /// Returns the largest residue number in the structure, or 0 when the
    /// structure has no residues.
    pub fn max_residue_number(&self) -> isize {
        self.residues.values().map(|r| r.number).max().unwrap_or(0)
    }
}
