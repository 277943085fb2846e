pub mod align;
pub mod setup;
pub mod solvate;
