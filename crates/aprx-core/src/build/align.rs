//! Rigid-body alignment of a host-guest complex onto the z axis.
//!
//! APR pulls the guest along a straight line, so setup starts by rotating
//! the whole complex until the host-to-guest axis coincides with +z and
//! the first mask's centroid sits at the origin. All transforms are rigid;
//! internal geometry never changes.

use nalgebra::{Point3, Rotation3, Vector3};
use thiserror::Error;
use tracing::debug;

use crate::core::models::Structure;
use crate::core::selection::{AmberMask, SelectionError};

#[derive(Debug, Error)]
pub enum AlignError {
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("Masks '{mask1}' and '{mask2}' have coincident centroids, no axis to align")]
    DegenerateAxis { mask1: String, mask2: String },
}

/// Geometric center of the atoms selected by `mask`.
pub fn centroid(structure: &Structure, mask: &AmberMask) -> Result<Point3<f64>, SelectionError> {
    let indices = mask.indices(structure)?;
    let mut sum = Vector3::zeros();
    for (ordinal, (_, atom)) in structure.atoms_iter().enumerate() {
        if indices.binary_search(&ordinal).is_ok() {
            sum += atom.position.coords;
        }
    }
    Ok(Point3::from(sum / indices.len() as f64))
}

/// Translates every atom by `offset`.
pub fn translate(structure: &mut Structure, offset: Vector3<f64>) {
    for atom in structure.atoms_iter_mut() {
        atom.position += offset;
    }
}

/// Rotates every atom about the origin.
pub fn rotate(structure: &mut Structure, rotation: &Rotation3<f64>) {
    for atom in structure.atoms_iter_mut() {
        atom.position = rotation * atom.position;
    }
}

/// Angle in radians between the `mask1` -> `mask2` centroid axis and +z.
///
/// Useful as a post-alignment check; a freshly aligned structure reports 0.
pub fn axis_angle_to_z(
    structure: &Structure,
    mask1: &str,
    mask2: &str,
) -> Result<f64, AlignError> {
    let first: AmberMask = mask1.parse()?;
    let second: AmberMask = mask2.parse()?;

    let axis = centroid(structure, &second)? - centroid(structure, &first)?;
    if axis.norm() < 1e-10 {
        return Err(AlignError::DegenerateAxis {
            mask1: mask1.into(),
            mask2: mask2.into(),
        });
    }
    Ok(axis.angle(&Vector3::z()))
}

/// Aligns the vector from `mask1`'s centroid to `mask2`'s centroid with the
/// +z axis and moves `mask1`'s centroid to the origin.
///
/// # Errors
///
/// Fails when either mask is invalid or selects nothing, or when the two
/// centroids coincide and the axis is undefined.
pub fn zalign(structure: &mut Structure, mask1: &str, mask2: &str) -> Result<(), AlignError> {
    let first: AmberMask = mask1.parse()?;
    let second: AmberMask = mask2.parse()?;

    let origin = centroid(structure, &first)?;
    let tip = centroid(structure, &second)?;
    let axis = tip - origin;
    if axis.norm() < 1e-10 {
        return Err(AlignError::DegenerateAxis {
            mask1: mask1.into(),
            mask2: mask2.into(),
        });
    }

    translate(structure, -origin.coords);

    // `rotation_between` has no answer for anti-parallel vectors; any
    // half-turn through an axis perpendicular to z works there.
    let rotation = Rotation3::rotation_between(&axis, &Vector3::z())
        .unwrap_or_else(|| Rotation3::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI));
    rotate(structure, &rotation);

    debug!(
        mask1,
        mask2,
        angle = rotation.angle().to_degrees(),
        "aligned structure onto z axis"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Atom;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    fn two_particle_structure(p1: Point3<f64>, p2: Point3<f64>) -> Structure {
        let mut s = Structure::new();
        let host = s.add_residue(1, "CB6");
        s.add_atom_to_residue(host, Atom::new("O", 1, host, p1));
        let guest = s.add_residue(2, "BUT");
        s.add_atom_to_residue(guest, Atom::new("C3", 2, guest, p2));
        s
    }

    #[test]
    fn centroid_averages_selected_positions() {
        let mut s = Structure::new();
        let host = s.add_residue(1, "CB6");
        s.add_atom_to_residue(host, Atom::new("O", 1, host, Point3::new(0.0, 0.0, 0.0)));
        s.add_atom_to_residue(host, Atom::new("O2", 2, host, Point3::new(2.0, 4.0, 6.0)));
        let mask: AmberMask = ":CB6".parse().unwrap();
        let c = centroid(&s, &mask).unwrap();
        assert_close(c.x, 1.0);
        assert_close(c.y, 2.0);
        assert_close(c.z, 3.0);
    }

    #[test]
    fn zalign_puts_axis_on_z() {
        let mut s = two_particle_structure(Point3::new(1.0, 1.0, 1.0), Point3::new(4.0, 5.0, 1.0));
        zalign(&mut s, ":CB6@O", ":BUT@C3").unwrap();

        let positions: Vec<_> = s.atoms_iter().map(|(_, a)| a.position).collect();
        assert_close(positions[0].x, 0.0);
        assert_close(positions[0].y, 0.0);
        assert_close(positions[0].z, 0.0);
        assert_close(positions[1].x, 0.0);
        assert_close(positions[1].y, 0.0);
        assert_close(positions[1].z, 5.0);
    }

    #[test]
    fn zalign_preserves_distances() {
        let mut s = two_particle_structure(Point3::new(3.0, -2.0, 7.0), Point3::new(-1.0, 0.5, 2.0));
        let before: Vec<_> = s.atoms_iter().map(|(_, a)| a.position).collect();
        let d_before = (before[1] - before[0]).norm();
        zalign(&mut s, ":CB6@O", ":BUT@C3").unwrap();
        let after: Vec<_> = s.atoms_iter().map(|(_, a)| a.position).collect();
        assert_close((after[1] - after[0]).norm(), d_before);
    }

    #[test]
    fn zalign_handles_anti_parallel_axis() {
        // Axis already on z but pointing down; needs the half-turn branch.
        let mut s = two_particle_structure(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, -4.0));
        zalign(&mut s, ":CB6@O", ":BUT@C3").unwrap();
        let positions: Vec<_> = s.atoms_iter().map(|(_, a)| a.position).collect();
        assert_close(positions[1].z, 4.0);
    }

    #[test]
    fn axis_angle_is_zero_after_alignment() {
        let mut s = two_particle_structure(Point3::new(2.0, 3.0, 1.0), Point3::new(5.0, -1.0, 4.0));
        let before = axis_angle_to_z(&s, ":CB6@O", ":BUT@C3").unwrap();
        assert!(before > 0.1);
        zalign(&mut s, ":CB6@O", ":BUT@C3").unwrap();
        let after = axis_angle_to_z(&s, ":CB6@O", ":BUT@C3").unwrap();
        assert!(after < 1e-6, "residual angle {}", after);
    }

    #[test]
    fn zalign_rejects_coincident_centroids() {
        let mut s = two_particle_structure(Point3::new(1.0, 1.0, 1.0), Point3::new(1.0, 1.0, 1.0));
        let result = zalign(&mut s, ":CB6@O", ":BUT@C3");
        assert!(matches!(result, Err(AlignError::DegenerateAxis { .. })));
    }

    #[test]
    fn translate_moves_every_atom() {
        let mut s = two_particle_structure(Point3::origin(), Point3::new(0.0, 0.0, 1.0));
        translate(&mut s, Vector3::new(1.0, 2.0, 3.0));
        let positions: Vec<_> = s.atoms_iter().map(|(_, a)| a.position).collect();
        assert_close(positions[0].x, 1.0);
        assert_close(positions[1].z, 4.0);
    }
}
