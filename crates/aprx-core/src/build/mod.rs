//! Structure preparation: alignment, dummy atoms, and `tleap` builds.
//!
//! The modules here take a host-guest PDB from "as crystallized" to "ready
//! to simulate": [`align`] puts the pulling axis on z, [`dummy`] anchors it
//! with non-interacting atoms, and [`tleap`] drives AMBER's `tleap` to
//! solvate and parameterize the result.

pub mod align;
pub mod dummy;
pub mod tleap;

pub use align::{AlignError, axis_angle_to_z, centroid, translate, zalign};
pub use dummy::{add_dummy, write_dummy_frcmod, write_dummy_mol2};
pub use tleap::{BufferTarget, IonAmount, PbcType, SystemTleap, TleapError, TleapRunner, TleapSystem};
