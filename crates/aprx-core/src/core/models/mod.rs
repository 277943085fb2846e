//! Data structures describing a molecular structure.
//!
//! The model is deliberately small: APR setup needs atom names, residue
//! membership, and coordinates, in the exact order they appeared in the
//! source file. Atom and residue handles are slotmap keys so that references
//! stay valid while the structure is edited (e.g., when dummy atoms are
//! appended).

pub mod atom;
pub mod ids;
pub mod residue;
pub mod structure;

pub use atom::Atom;
pub use ids::{AtomId, ResidueId};
pub use residue::Residue;
pub use structure::Structure;
