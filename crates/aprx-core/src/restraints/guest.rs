//! Classification of the six canonical guest restraints.
//!
//! An APR guest is held by up to six restraints against the dummy-atom
//! frame: one distance (`r`), two angles (`theta`, `beta`), and three
//! torsions (`phi`, `alpha`, `gamma`). Which slot a restraint fills is
//! fully determined by how many masks it has and how many of those masks
//! select dummy residues.

use tracing::debug;

use super::restraint::ApRestraint;

/// Slot order of the canonical guest restraints.
pub const GUEST_RESTRAINT_NAMES: [&str; 6] = ["r", "theta", "phi", "alpha", "beta", "gamma"];

/// Picks the canonical guest restraints out of a mixed restraint list.
///
/// Returns the slots `[r, theta, phi, alpha, beta, gamma]`; a slot is
/// `None` when no matching restraint exists. Only restraints that touch
/// the guest residue are considered; conformational restraints within the
/// guest alone, or host restraints, never match because every slot needs
/// at least one dummy-residue mask.
pub fn extract_guest_restraints<'a>(
    restraints: &'a [ApRestraint],
    guest_resname: &str,
) -> [Option<&'a ApRestraint>; 6] {
    let mut slots: [Option<&ApRestraint>; 6] = [None; 6];

    for restraint in restraints {
        let masks: Vec<&str> = [
            restraint.mask1.as_deref(),
            restraint.mask2.as_deref(),
            restraint.mask3.as_deref(),
            restraint.mask4.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();

        if !masks.iter().any(|m| mask_residue(m, guest_resname)) {
            continue;
        }
        let dummies = masks.iter().filter(|m| is_dummy_mask(m)).count();

        let slot = match (masks.len(), dummies) {
            (2, 1) => Some(0), // r
            (3, 1) => Some(1), // theta
            (3, 2) => Some(4), // beta
            (4, 3) => Some(2), // phi
            (4, 2) => Some(3), // alpha
            (4, 1) => Some(5), // gamma
            _ => None,
        };
        if let Some(slot) = slot {
            debug!(
                name = GUEST_RESTRAINT_NAMES[slot],
                mask1 = restraint.mask1.as_deref().unwrap_or(""),
                "matched guest restraint"
            );
            slots[slot] = Some(restraint);
        }
    }
    slots
}

/// `true` when the mask selects a dummy residue (`:DM1`, `:DM2`, ..).
fn is_dummy_mask(mask: &str) -> bool {
    residue_part(mask).is_some_and(|name| name.starts_with("DM"))
}

/// `true` when the mask selects within the named residue.
fn mask_residue(mask: &str, resname: &str) -> bool {
    residue_part(mask) == Some(resname)
}

fn residue_part(mask: &str) -> Option<&str> {
    let rest = mask.strip_prefix(':')?;
    Some(rest.split('@').next().unwrap_or(rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restraint(masks: &[&str]) -> ApRestraint {
        let mut rest = ApRestraint::new();
        let mut slots = masks.iter();
        rest.mask1 = slots.next().map(|m| m.to_string());
        rest.mask2 = slots.next().map(|m| m.to_string());
        rest.mask3 = slots.next().map(|m| m.to_string());
        rest.mask4 = slots.next().map(|m| m.to_string());
        rest
    }

    #[test]
    fn slots_fill_as_restraints_accumulate() {
        let mut restraints = vec![
            restraint(&[":DM1", ":BUT@C3"]),                  // r
            restraint(&[":DM1", ":BUT@C3", ":BUT@C"]),        // theta
            restraint(&[":DM2", ":DM1", ":BUT@C3"]),          // beta
        ];
        let slots = extract_guest_restraints(&restraints, "BUT");
        assert!(slots[0].is_some());
        assert!(slots[1].is_some());
        assert!(slots[2].is_none());
        assert!(slots[3].is_none());
        assert!(slots[4].is_some());
        assert!(slots[5].is_none());

        restraints.push(restraint(&[":DM3", ":DM2", ":DM1", ":BUT@C3"])); // phi
        let slots = extract_guest_restraints(&restraints, "BUT");
        assert!(slots[2].is_some());
        assert!(slots[3].is_none());

        restraints.push(restraint(&[":DM2", ":DM1", ":BUT@C3", ":BUT@C"])); // alpha
        restraints.push(restraint(&[":DM1", ":BUT@C3", ":BUT@C", ":BUT@C2"])); // gamma
        let slots = extract_guest_restraints(&restraints, "BUT");
        assert!(slots.iter().all(Option::is_some));
    }

    #[test]
    fn host_and_conformational_restraints_are_ignored() {
        let restraints = vec![
            restraint(&[":CB6@O", ":CB6@O2"]),
            restraint(&[":BUT@C", ":BUT@C1", ":BUT@C2", ":BUT@C3"]),
        ];
        let slots = extract_guest_restraints(&restraints, "BUT");
        assert!(slots.iter().all(Option::is_none));
    }

    #[test]
    fn guest_resname_must_match() {
        let restraints = vec![restraint(&[":DM1", ":BUT@C3"])];
        let slots = extract_guest_restraints(&restraints, "AMT");
        assert!(slots.iter().all(Option::is_none));
    }
}
