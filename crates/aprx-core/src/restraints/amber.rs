//! Flat-bottom parameterization and AMBER NMR restraint output.
//!
//! AMBER's NMR restraint facility models each bias as a flat-bottom well
//! with four inflection distances `r1 <= r2 <= r3 <= r4` and two force
//! constants `rk2` (left parabola) and `rk3` (right parabola). A harmonic
//! restraint has `r2 == r3`; walls leave one side open.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use super::restraint::{ApRestraint, Phase, RestraintKind};

#[derive(Debug, Error)]
pub enum AmberOutputError {
    #[error("File I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Restraint has no {phase} windows")]
    MissingPhase { phase: Phase },

    #[error("Window index {window} out of range for {phase} ({len} windows)")]
    WindowOutOfRange {
        phase: Phase,
        window: usize,
        len: usize,
    },

    #[error("Unrecognized window label '{0}'")]
    BadWindowLabel(String),

    #[error("Restraint has not been initialized")]
    Uninitialized,
}

/// The six parameters of one AMBER flat-bottom restraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestraintValues {
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub r4: f64,
    pub rk2: f64,
    pub rk3: f64,
}

/// How a window's parameters bias the coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiasPotential {
    /// Symmetric harmonic well.
    Restraint,
    /// Penalizes values above the target only.
    UpperWalls,
    /// Penalizes values below the target only.
    LowerWalls,
}

impl BiasPotential {
    pub fn as_str(&self) -> &'static str {
        match self {
            BiasPotential::Restraint => "restraint",
            BiasPotential::UpperWalls => "upper_walls",
            BiasPotential::LowerWalls => "lower_walls",
        }
    }
}

/// Computes the flat-bottom parameters for one window of a restraint.
///
/// By default the well is harmonic: `r2 == r3 == target` and
/// `rk2 == rk3 == force constant`. The outer bounds depend on the
/// coordinate: distances run from 0 to 999 Å, angles from 0° to 180°, and
/// torsions span `target ± 180°`. Any field set in the restraint's
/// `custom_restraint_values` overrides the default, which is how wall
/// restraints are expressed.
pub fn restraint_values(
    restraint: &ApRestraint,
    phase: Phase,
    window: usize,
) -> Result<RestraintValues, AmberOutputError> {
    let windows = restraint
        .windows(phase)
        .ok_or(AmberOutputError::MissingPhase { phase })?;
    if window >= windows.len() {
        return Err(AmberOutputError::WindowOutOfRange {
            phase,
            window,
            len: windows.len(),
        });
    }
    let target = windows.targets[window];
    let fc = windows.force_constants[window];

    let (r1, r4) = match restraint.kind() {
        RestraintKind::Distance => (0.0, 999.0),
        RestraintKind::Angle => (0.0, 180.0),
        RestraintKind::Torsion => (target - 180.0, target + 180.0),
    };
    let mut values = RestraintValues {
        r1,
        r2: target,
        r3: target,
        r4,
        rk2: fc,
        rk3: fc,
    };

    let custom = &restraint.custom_restraint_values;
    if let Some(r1) = custom.r1 {
        values.r1 = r1;
    }
    if let Some(r2) = custom.r2 {
        values.r2 = r2;
    }
    if let Some(r3) = custom.r3 {
        values.r3 = r3;
    }
    if let Some(r4) = custom.r4 {
        values.r4 = r4;
    }
    if let Some(rk2) = custom.rk2 {
        values.rk2 = rk2;
    }
    if let Some(rk3) = custom.rk3 {
        values.rk3 = rk3;
    }
    Ok(values)
}

/// Classifies one window's parameters as a harmonic restraint or a wall.
///
/// A window with no custom overrides is always harmonic. Otherwise the
/// force constants decide: a softer left side (`rk2 < rk3`) only pushes
/// down from above, an upper wall, and vice versa. With equal force
/// constants the well offsets decide the same way.
pub fn bias_potential_type(
    restraint: &ApRestraint,
    phase: Phase,
    window: usize,
) -> Result<BiasPotential, AmberOutputError> {
    if restraint.custom_restraint_values.is_unset() {
        return Ok(BiasPotential::Restraint);
    }
    let values = restraint_values(restraint, phase, window)?;
    let bias = if values.rk2 < values.rk3 {
        BiasPotential::UpperWalls
    } else if values.rk3 < values.rk2 {
        BiasPotential::LowerWalls
    } else if values.r2 < values.r3 {
        BiasPotential::UpperWalls
    } else if values.r3 < values.r2 {
        BiasPotential::LowerWalls
    } else {
        BiasPotential::Restraint
    };
    Ok(bias)
}

/// Formats one restraint for one window as an AMBER `&rst` namelist line.
///
/// Atom indices are written 1-based. Masks that select more than one atom
/// become a group: the `iat` slot is `-1` and the member indices go in the
/// corresponding `igr` list.
pub fn amber_restraint_line(
    restraint: &ApRestraint,
    phase: Phase,
    window: usize,
) -> Result<String, AmberOutputError> {
    let groups: Vec<&[usize]> = [
        restraint.index1(),
        restraint.index2(),
        restraint.index3(),
        restraint.index4(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if groups.len() < 2 {
        return Err(AmberOutputError::Uninitialized);
    }

    // Stored indices are already 1-based when `amber_index` is set.
    let offset = if restraint.amber_index { 0 } else { 1 };

    let mut line = String::from("&rst iat=");
    for group in &groups {
        if group.len() == 1 {
            let _ = write!(line, " {},", group[0] + offset);
        } else {
            line.push_str(" -1,");
        }
    }
    for (slot, group) in groups.iter().enumerate() {
        if group.len() > 1 {
            let _ = write!(line, " igr{}=", slot + 1);
            for index in *group {
                let _ = write!(line, " {},", index + offset);
            }
        }
    }

    let values = restraint_values(restraint, phase, window)?;
    let _ = write!(
        line,
        " r1= {:.5}, r2= {:.5}, r3= {:.5}, r4= {:.5}, rk2= {:.5}, rk3= {:.5},",
        values.r1, values.r2, values.r3, values.r4, values.rk2, values.rk3
    );
    line.push_str(" &end");
    Ok(line)
}

/// Writes a DISANG file holding every restraint evaluated at one window.
///
/// Restraints that do not define the window's phase are carried at their
/// nearest defined endpoint, matching how a pull-only restraint stays at
/// full strength through attach and release.
pub fn write_disang<P: AsRef<Path>>(
    path: P,
    restraints: &[ApRestraint],
    window: &str,
) -> Result<(), AmberOutputError> {
    let (phase, index) = parse_window_label(window)?;
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "# Restraints for window {}", window)?;
    for restraint in restraints {
        let (phase, index) = clamp_to_defined(restraint, phase, index)?;
        let line = amber_restraint_line(restraint, phase, index)?;
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    debug!(window, count = restraints.len(), "wrote DISANG file");
    Ok(())
}

fn parse_window_label(window: &str) -> Result<(Phase, usize), AmberOutputError> {
    let phase = match window.chars().next() {
        Some('a') => Phase::Attach,
        Some('p') => Phase::Pull,
        Some('r') => Phase::Release,
        _ => return Err(AmberOutputError::BadWindowLabel(window.into())),
    };
    let index = window[1..]
        .parse::<usize>()
        .map_err(|_| AmberOutputError::BadWindowLabel(window.into()))?;
    Ok((phase, index))
}

/// Maps a window onto a restraint that may not define the window's phase.
fn clamp_to_defined(
    restraint: &ApRestraint,
    phase: Phase,
    index: usize,
) -> Result<(Phase, usize), AmberOutputError> {
    if restraint.window_count(phase) > index {
        return Ok((phase, index));
    }
    // Fall back to the last window of the nearest earlier phase, or the
    // first window of the nearest later one.
    let order = [Phase::Attach, Phase::Pull, Phase::Release];
    let position = order.iter().position(|&p| p == phase).unwrap_or(0);
    for &earlier in order[..position].iter().rev() {
        let count = restraint.window_count(earlier);
        if count > 0 {
            return Ok((earlier, count - 1));
        }
    }
    for &later in &order[position + 1..] {
        if restraint.window_count(later) > 0 {
            return Ok((later, 0));
        }
    }
    Err(AmberOutputError::MissingPhase { phase })
}
