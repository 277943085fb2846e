use super::restraint::{ApRestraint, Phase};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("No restraints were given")]
    NoRestraints,

    #[error("Restraints disagree on continuous_apr")]
    ContinuousAprMismatch,

    #[error("Restraints disagree on the number of {phase} windows ({counts:?})")]
    WindowCountMismatch { phase: Phase, counts: Vec<usize> },

    #[error("No restraint defines any phase")]
    NoWindows,
}

/// Builds the ordered list of window labels (`a000`, .., `p000`, .., `r000`,
/// ..) shared by a set of restraints.
///
/// Every restraint that defines a phase must agree on that phase's window
/// count, and all restraints must agree on `continuous_apr`. With
/// `continuous_apr` the attach phase's last window is the pull phase's
/// first window and the release phase picks up after the pull endpoint, so
/// the attach list drops its final label and the release list starts at
/// `r001`.
///
/// # Errors
///
/// Returns a [`WindowError`] when the restraint set is empty or internally
/// inconsistent.
pub fn create_window_list(restraints: &[ApRestraint]) -> Result<Vec<String>, WindowError> {
    if restraints.is_empty() {
        return Err(WindowError::NoRestraints);
    }

    let continuous = restraints[0].continuous_apr;
    if restraints.iter().any(|r| r.continuous_apr != continuous) {
        return Err(WindowError::ContinuousAprMismatch);
    }

    let mut counts = [0usize; 3];
    for (slot, phase) in Phase::ALL.into_iter().enumerate() {
        let mut seen: Vec<usize> = restraints
            .iter()
            .map(|r| r.window_count(phase))
            .filter(|&n| n > 0)
            .collect();
        seen.dedup();
        match seen.len() {
            0 => counts[slot] = 0,
            1 => counts[slot] = seen[0],
            _ => {
                return Err(WindowError::WindowCountMismatch {
                    phase,
                    counts: seen,
                });
            }
        }
    }

    let [attach, pull, release] = counts;
    if attach + pull + release == 0 {
        return Err(WindowError::NoWindows);
    }
    debug!(attach, pull, release, continuous, "window counts");

    let mut labels = Vec::new();
    let attach_end = if continuous && attach > 0 {
        attach - 1
    } else {
        attach
    };
    for i in 0..attach_end {
        labels.push(format!("{}{:03}", Phase::Attach.label_prefix(), i));
    }
    for i in 0..pull {
        labels.push(format!("{}{:03}", Phase::Pull.label_prefix(), i));
    }
    let release_start = if continuous && release > 0 { 1 } else { 0 };
    for i in release_start..release {
        labels.push(format!("{}{:03}", Phase::Release.label_prefix(), i));
    }
    Ok(labels)
}
