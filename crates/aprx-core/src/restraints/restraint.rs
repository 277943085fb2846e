use crate::core::selection::{AmberMask, SelectionError};
use crate::core::models::structure::Structure;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RestraintError {
    #[error("Mask error: {0}")]
    Selection(#[from] SelectionError),

    #[error("mask{0} must be set before the restraint is initialized")]
    MissingMask(u8),

    #[error("mask3 requires mask1 and mask2; mask4 requires mask1 through mask3")]
    MaskGap,

    #[error("Missing parameter '{field}' for the {phase} phase")]
    MissingParameter { phase: Phase, field: &'static str },

    #[error("The {phase} phase needs one schedule method: windows, increment, fractions, or an explicit list")]
    NoSchedule { phase: Phase },

    #[error("'{field}' for the {phase} phase must be a positive number")]
    InvalidIncrement { phase: Phase, field: &'static str },

    #[error("Restraint has no phase defined")]
    Empty,
}

/// One leg of the attach-pull-release cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Attach,
    Pull,
    Release,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Attach, Phase::Pull, Phase::Release];

    /// The single-letter window label prefix (`a000`, `p000`, `r000`).
    pub fn label_prefix(&self) -> char {
        match self {
            Phase::Attach => 'a',
            Phase::Pull => 'p',
            Phase::Release => 'r',
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Attach => "attach",
            Phase::Pull => "pull",
            Phase::Release => "release",
        };
        f.write_str(name)
    }
}

/// Geometric observable a restraint acts on, decided by how many masks are
/// set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestraintKind {
    Distance,
    Angle,
    Torsion,
}

/// User-facing description of one phase's schedule.
///
/// A schedule can be given five ways, checked in this order:
///
/// 1. an explicit value list (`fc_list` / `target_list`),
/// 2. an explicit fraction list (`fraction_list`, scaled by the final value),
/// 3. a fraction increment (`fraction_increment`),
/// 4. a value increment (`fc_increment` / `target_increment`),
/// 5. a window count with endpoints (`num_windows` + initial/final).
///
/// For attach and release the schedule varies the force constant while the
/// target stays at `target`; for pull it varies the target while the force
/// constant stays at `fc`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhaseSpec {
    pub target: Option<f64>,
    pub fc: Option<f64>,
    pub num_windows: Option<usize>,
    pub fc_initial: Option<f64>,
    pub fc_final: Option<f64>,
    pub fc_increment: Option<f64>,
    pub fc_list: Option<Vec<f64>>,
    pub target_initial: Option<f64>,
    pub target_final: Option<f64>,
    pub target_increment: Option<f64>,
    pub target_list: Option<Vec<f64>>,
    pub fraction_list: Option<Vec<f64>>,
    pub fraction_increment: Option<f64>,
}

impl PhaseSpec {
    /// `true` when no schedule parameter is set at all, meaning the phase
    /// is skipped for this restraint.
    fn is_unset(&self) -> bool {
        *self == PhaseSpec::default()
    }
}

/// The resolved per-window values for one phase.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseWindows {
    pub force_constants: Vec<f64>,
    pub targets: Vec<f64>,
}

impl PhaseWindows {
    pub fn len(&self) -> usize {
        self.force_constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.force_constants.is_empty()
    }
}

/// Manual overrides for the flat-bottom restraint parameterization.
///
/// Setting these turns a harmonic restraint into a wall: a one-sided bias
/// with distinct left/right force constants and targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CustomRestraintValues {
    pub r1: Option<f64>,
    pub r2: Option<f64>,
    pub r3: Option<f64>,
    pub r4: Option<f64>,
    pub rk2: Option<f64>,
    pub rk3: Option<f64>,
}

impl CustomRestraintValues {
    pub fn is_unset(&self) -> bool {
        *self == CustomRestraintValues::default()
    }
}

/// A single APR restraint: up to four atom masks plus a schedule per phase.
///
/// Usage mirrors how restraints are written down in an APR protocol: set
/// the masks and phase parameters field by field, then call
/// [`initialize`](ApRestraint::initialize) with the topology to resolve
/// masks into atom indices and schedules into per-window values.
#[derive(Debug, Clone, Default)]
pub struct ApRestraint {
    pub mask1: Option<String>,
    pub mask2: Option<String>,
    pub mask3: Option<String>,
    pub mask4: Option<String>,
    /// Resolve masks to 1-based (AMBER) indices instead of 0-based.
    pub amber_index: bool,
    /// Derive pull and release parameters from the attach phase.
    pub auto_apr: bool,
    /// Share boundary windows between adjacent phases.
    pub continuous_apr: bool,
    pub attach: PhaseSpec,
    pub pull: PhaseSpec,
    pub release: PhaseSpec,
    pub custom_restraint_values: CustomRestraintValues,

    index1: Option<Vec<usize>>,
    index2: Option<Vec<usize>>,
    index3: Option<Vec<usize>>,
    index4: Option<Vec<usize>>,
    attach_windows: Option<PhaseWindows>,
    pull_windows: Option<PhaseWindows>,
    release_windows: Option<PhaseWindows>,
}

impl ApRestraint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves masks against `structure` and expands the phase schedules.
    ///
    /// # Errors
    ///
    /// Fails when masks are missing, select nothing, or when a phase has
    /// schedule parameters that do not add up to a complete method.
    pub fn initialize(&mut self, structure: &Structure) -> Result<(), RestraintError> {
        self.resolve_masks(structure)?;

        self.attach_windows = resolve_attach(&self.attach)?;

        self.pull_windows = resolve_pull(&self.pull, self.auto_apr, &self.attach)?;

        let release_spec = if self.auto_apr {
            merge_release_from_attach(&self.release, &self.attach, &self.pull)
        } else {
            self.release.clone()
        };
        self.release_windows = resolve_release(&release_spec)?;

        if self.attach_windows.is_none()
            && self.pull_windows.is_none()
            && self.release_windows.is_none()
        {
            return Err(RestraintError::Empty);
        }

        debug!(
            mask1 = self.mask1.as_deref().unwrap_or(""),
            mask2 = self.mask2.as_deref().unwrap_or(""),
            attach = self.window_count(Phase::Attach),
            pull = self.window_count(Phase::Pull),
            release = self.window_count(Phase::Release),
            "initialized restraint"
        );
        Ok(())
    }

    fn resolve_masks(&mut self, structure: &Structure) -> Result<(), RestraintError> {
        let mask1 = self.mask1.clone().ok_or(RestraintError::MissingMask(1))?;
        let mask2 = self.mask2.clone().ok_or(RestraintError::MissingMask(2))?;
        if self.mask4.is_some() && self.mask3.is_none() {
            return Err(RestraintError::MaskGap);
        }
        let mask3 = self.mask3.clone();
        let mask4 = self.mask4.clone();

        let amber_index = self.amber_index;
        let resolve = |text: &str| -> Result<Vec<usize>, RestraintError> {
            let mask: AmberMask = text.parse()?;
            let indices = if amber_index {
                mask.amber_indices(structure)?
            } else {
                mask.indices(structure)?
            };
            Ok(indices)
        };

        self.index1 = Some(resolve(&mask1)?);
        self.index2 = Some(resolve(&mask2)?);
        self.index3 = match &mask3 {
            Some(m) => Some(resolve(m)?),
            None => None,
        };
        self.index4 = match &mask4 {
            Some(m) => Some(resolve(m)?),
            None => None,
        };
        Ok(())
    }

    /// The kind of bonded term this restraint biases.
    pub fn kind(&self) -> RestraintKind {
        if self.mask4.is_some() {
            RestraintKind::Torsion
        } else if self.mask3.is_some() {
            RestraintKind::Angle
        } else {
            RestraintKind::Distance
        }
    }

    pub fn index1(&self) -> Option<&[usize]> {
        self.index1.as_deref()
    }

    pub fn index2(&self) -> Option<&[usize]> {
        self.index2.as_deref()
    }

    pub fn index3(&self) -> Option<&[usize]> {
        self.index3.as_deref()
    }

    pub fn index4(&self) -> Option<&[usize]> {
        self.index4.as_deref()
    }

    /// The resolved windows for a phase, `None` when the phase is skipped.
    pub fn windows(&self, phase: Phase) -> Option<&PhaseWindows> {
        match phase {
            Phase::Attach => self.attach_windows.as_ref(),
            Phase::Pull => self.pull_windows.as_ref(),
            Phase::Release => self.release_windows.as_ref(),
        }
    }

    /// Number of windows in a phase (0 when the phase is skipped).
    pub fn window_count(&self, phase: Phase) -> usize {
        self.windows(phase).map_or(0, PhaseWindows::len)
    }
}

/// `n` evenly spaced values from `start` to `end`, inclusive.
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => (0..n)
            .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

/// Arithmetic progression from `start` to `end`, inclusive of both ends.
fn arange_inclusive(start: f64, end: f64, increment: f64) -> Vec<f64> {
    let step = if end >= start {
        increment.abs()
    } else {
        -increment.abs()
    };
    let eps = increment.abs() * 1e-6;
    let mut values = Vec::new();
    let mut i = 0usize;
    loop {
        let value = start + step * i as f64;
        if (step > 0.0 && value > end + eps) || (step < 0.0 && value < end - eps) {
            break;
        }
        values.push(value);
        i += 1;
    }
    values
}

/// Fraction ladder `0, inc, 2*inc, ..` finished with exactly 1.0.
///
/// Fractions are capped at 1.0: an increment that does not divide 1.0
/// evenly would otherwise overshoot the final value in the last window.
fn fraction_schedule(increment: f64) -> Vec<f64> {
    let eps = increment * 1e-6;
    let mut fractions = Vec::new();
    let mut k = 0usize;
    loop {
        let fraction = increment * k as f64;
        if fraction >= 1.0 - eps {
            break;
        }
        fractions.push(fraction);
        k += 1;
    }
    fractions.push(1.0);
    fractions
}

/// A zero or negative step never reaches the schedule's far end. NaN is
/// rejected here too.
fn check_increment(increment: f64, phase: Phase, field: &'static str) -> Result<(), RestraintError> {
    if increment > 0.0 {
        Ok(())
    } else {
        Err(RestraintError::InvalidIncrement { phase, field })
    }
}

/// Expands a force-constant schedule (attach/release semantics).
fn resolve_fc_schedule(
    spec: &PhaseSpec,
    phase: Phase,
) -> Result<Option<Vec<f64>>, RestraintError> {
    let missing = |field| RestraintError::MissingParameter { phase, field };

    if let Some(list) = &spec.fc_list {
        return Ok(Some(list.clone()));
    }
    if let Some(fractions) = &spec.fraction_list {
        let fc_final = spec.fc_final.ok_or_else(|| missing("fc_final"))?;
        return Ok(Some(fractions.iter().map(|f| f * fc_final).collect()));
    }
    if let Some(increment) = spec.fraction_increment {
        check_increment(increment, phase, "fraction_increment")?;
        let fc_final = spec.fc_final.ok_or_else(|| missing("fc_final"))?;
        return Ok(Some(
            fraction_schedule(increment)
                .into_iter()
                .map(|f| f * fc_final)
                .collect(),
        ));
    }
    if let Some(increment) = spec.fc_increment {
        check_increment(increment, phase, "fc_increment")?;
        let fc_final = spec.fc_final.ok_or_else(|| missing("fc_final"))?;
        let fc_initial = spec.fc_initial.unwrap_or(0.0);
        return Ok(Some(arange_inclusive(fc_initial, fc_final, increment)));
    }
    if let Some(n) = spec.num_windows {
        let fc_final = spec.fc_final.ok_or_else(|| missing("fc_final"))?;
        let fc_initial = spec.fc_initial.unwrap_or(0.0);
        return Ok(Some(linspace(fc_initial, fc_final, n)));
    }
    Ok(None)
}

fn resolve_attach(spec: &PhaseSpec) -> Result<Option<PhaseWindows>, RestraintError> {
    resolve_constant_target_phase(spec, Phase::Attach)
}

fn resolve_release(spec: &PhaseSpec) -> Result<Option<PhaseWindows>, RestraintError> {
    resolve_constant_target_phase(spec, Phase::Release)
}

fn resolve_constant_target_phase(
    spec: &PhaseSpec,
    phase: Phase,
) -> Result<Option<PhaseWindows>, RestraintError> {
    if spec.is_unset() {
        return Ok(None);
    }
    let force_constants = resolve_fc_schedule(spec, phase)?
        .ok_or(RestraintError::NoSchedule { phase })?;
    let target = spec
        .target
        .ok_or(RestraintError::MissingParameter { phase, field: "target" })?;
    let targets = vec![target; force_constants.len()];
    Ok(Some(PhaseWindows {
        force_constants,
        targets,
    }))
}

fn resolve_pull(
    spec: &PhaseSpec,
    auto_apr: bool,
    attach: &PhaseSpec,
) -> Result<Option<PhaseWindows>, RestraintError> {
    if spec.is_unset() {
        return Ok(None);
    }

    let phase = Phase::Pull;
    let missing = |field| RestraintError::MissingParameter { phase, field };

    // In auto mode the pull phase picks up where attach left off.
    let inherited_initial = if auto_apr { attach.target } else { None };

    let targets = if let Some(list) = &spec.target_list {
        list.clone()
    } else if let Some(fractions) = &spec.fraction_list {
        let target_final = spec.target_final.ok_or_else(|| missing("target_final"))?;
        fractions.iter().map(|f| f * target_final).collect()
    } else if let Some(increment) = spec.fraction_increment {
        check_increment(increment, phase, "fraction_increment")?;
        let target_final = spec.target_final.ok_or_else(|| missing("target_final"))?;
        fraction_schedule(increment)
            .into_iter()
            .map(|f| f * target_final)
            .collect()
    } else if let Some(increment) = spec.target_increment {
        check_increment(increment, phase, "target_increment")?;
        let target_final = spec.target_final.ok_or_else(|| missing("target_final"))?;
        let target_initial = spec.target_initial.or(inherited_initial).unwrap_or(0.0);
        arange_inclusive(target_initial, target_final, increment)
    } else if let Some(n) = spec.num_windows {
        let target_final = spec.target_final.ok_or_else(|| missing("target_final"))?;
        let target_initial = spec.target_initial.or(inherited_initial).unwrap_or(0.0);
        linspace(target_initial, target_final, n)
    } else {
        return Err(RestraintError::NoSchedule { phase });
    };

    let fc = spec
        .fc
        .or(if auto_apr { attach.fc_final } else { None })
        .ok_or_else(|| missing("fc"))?;
    Ok(Some(PhaseWindows {
        force_constants: vec![fc; targets.len()],
        targets,
    }))
}

/// In auto mode the release schedule mirrors the attach schedule at the
/// pulled-out target.
fn merge_release_from_attach(release: &PhaseSpec, attach: &PhaseSpec, pull: &PhaseSpec) -> PhaseSpec {
    let mut merged = release.clone();
    merged.target = merged.target.or(pull.target_final);
    merged.fc_initial = merged.fc_initial.or(attach.fc_initial);
    merged.fc_final = merged.fc_final.or(attach.fc_final);
    merged.fc_increment = merged.fc_increment.or(attach.fc_increment);
    merged.fraction_increment = merged.fraction_increment.or(attach.fraction_increment);
    merged.num_windows = merged.num_windows.or(attach.num_windows);
    if merged.fraction_list.is_none() {
        merged.fraction_list = attach.fraction_list.clone();
    }
    if merged.fc_list.is_none() {
        merged.fc_list = attach.fc_list.clone();
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use nalgebra::Point3;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}");
        }
    }

    /// Host-guest test structure: six host oxygens, four guest carbons.
    fn host_guest() -> Structure {
        let mut s = Structure::new();
        let host = s.add_residue(1, "CB6");
        for (i, name) in ["O", "O2", "O4", "O6", "O8", "O10"].iter().enumerate() {
            s.add_atom_to_residue(host, Atom::new(name, i + 1, host, Point3::origin()));
        }
        let guest = s.add_residue(2, "BUT");
        for (i, name) in ["C", "C1", "C2", "C3"].iter().enumerate() {
            s.add_atom_to_residue(guest, Atom::new(name, i + 7, guest, Point3::origin()));
        }
        s
    }

    fn base_restraint() -> ApRestraint {
        let mut rest = ApRestraint::new();
        rest.amber_index = true;
        rest.mask1 = Some(":CB6@O,O2,O4,O6,O8,O10".into());
        rest.mask2 = Some(":BUT@C3".into());
        rest
    }

    #[test]
    fn windows_from_window_count_and_endpoints() {
        let mut rest = base_restraint();
        rest.attach.target = Some(3.0);
        rest.attach.num_windows = Some(4);
        rest.attach.fc_initial = Some(0.0);
        rest.attach.fc_final = Some(3.0);
        rest.pull.fc = Some(3.0);
        rest.pull.num_windows = Some(4);
        rest.pull.target_initial = Some(3.0);
        rest.pull.target_final = Some(6.0);
        rest.release.target = Some(6.0);
        rest.release.num_windows = Some(4);
        rest.release.fc_initial = Some(0.0);
        rest.release.fc_final = Some(3.0);
        rest.initialize(&host_guest()).unwrap();

        assert_eq!(rest.index1(), Some(&[1, 2, 3, 4, 5, 6][..]));
        assert_eq!(rest.index2(), Some(&[10][..]));
        assert_eq!(rest.index3(), None);
        assert_eq!(rest.index4(), None);

        let attach = rest.windows(Phase::Attach).unwrap();
        assert_close(&attach.force_constants, &[0.0, 1.0, 2.0, 3.0]);
        assert_close(&attach.targets, &[3.0, 3.0, 3.0, 3.0]);
        let pull = rest.windows(Phase::Pull).unwrap();
        assert_close(&pull.force_constants, &[3.0, 3.0, 3.0, 3.0]);
        assert_close(&pull.targets, &[3.0, 4.0, 5.0, 6.0]);
        let release = rest.windows(Phase::Release).unwrap();
        assert_close(&release.force_constants, &[0.0, 1.0, 2.0, 3.0]);
        assert_close(&release.targets, &[6.0, 6.0, 6.0, 6.0]);
    }

    #[test]
    fn fc_initial_defaults_to_zero() {
        let mut rest = base_restraint();
        rest.attach.target = Some(180.0);
        rest.attach.num_windows = Some(4);
        rest.attach.fc_final = Some(75.0);
        rest.initialize(&host_guest()).unwrap();

        let attach = rest.windows(Phase::Attach).unwrap();
        assert_close(&attach.force_constants, &[0.0, 25.0, 50.0, 75.0]);
    }

    #[test]
    fn pull_target_initial_defaults_to_zero_without_auto_apr() {
        let mut rest = base_restraint();
        rest.pull.fc = Some(75.0);
        rest.pull.num_windows = Some(4);
        rest.pull.target_final = Some(180.0);
        rest.initialize(&host_guest()).unwrap();

        let pull = rest.windows(Phase::Pull).unwrap();
        assert_close(&pull.targets, &[0.0, 60.0, 120.0, 180.0]);
    }

    #[test]
    fn auto_apr_chains_phases_together() {
        let mut rest = base_restraint();
        rest.auto_apr = true;
        rest.attach.target = Some(90.0);
        rest.attach.fc_initial = Some(0.0);
        rest.attach.fc_increment = Some(25.0);
        rest.attach.fc_final = Some(75.0);
        rest.pull.target_increment = Some(1.0);
        rest.pull.target_final = Some(93.0);
        rest.release.fc_final = Some(75.0);
        rest.initialize(&host_guest()).unwrap();

        let attach = rest.windows(Phase::Attach).unwrap();
        assert_close(&attach.force_constants, &[0.0, 25.0, 50.0, 75.0]);
        assert_close(&attach.targets, &[90.0; 4]);
        // Pull starts at the attach target and uses its final force constant.
        let pull = rest.windows(Phase::Pull).unwrap();
        assert_close(&pull.force_constants, &[75.0; 4]);
        assert_close(&pull.targets, &[90.0, 91.0, 92.0, 93.0]);
        // Release mirrors the attach ladder at the pulled-out target.
        let release = rest.windows(Phase::Release).unwrap();
        assert_close(&release.force_constants, &[0.0, 25.0, 50.0, 75.0]);
        assert_close(&release.targets, &[93.0; 4]);
    }

    #[test]
    fn windows_from_increments() {
        let mut rest = base_restraint();
        rest.attach.target = Some(0.0);
        rest.attach.fc_increment = Some(25.0);
        rest.attach.fc_final = Some(75.0);
        rest.pull.fc = Some(75.0);
        rest.pull.target_increment = Some(1.0);
        rest.pull.target_final = Some(3.0);
        rest.initialize(&host_guest()).unwrap();

        let attach = rest.windows(Phase::Attach).unwrap();
        assert_close(&attach.force_constants, &[0.0, 25.0, 50.0, 75.0]);
        let pull = rest.windows(Phase::Pull).unwrap();
        assert_close(&pull.targets, &[0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn windows_from_fraction_lists() {
        let mut rest = base_restraint();
        rest.mask2 = Some(":BUT@C*".into());
        rest.attach.target = Some(0.0);
        rest.attach.fraction_list = Some(vec![0.0, 0.2, 0.5, 1.0]);
        rest.attach.fc_final = Some(5.0);
        rest.pull.fc = Some(5.0);
        rest.pull.fraction_list = Some(vec![0.0, 0.5, 1.0]);
        rest.pull.target_final = Some(1.0);
        rest.release.target = Some(1.0);
        rest.release.fraction_list = Some(vec![0.0, 0.3, 0.6, 1.0]);
        rest.release.fc_final = Some(5.0);
        rest.initialize(&host_guest()).unwrap();

        assert_eq!(rest.index2(), Some(&[7, 8, 9, 10][..]));
        assert_close(
            &rest.windows(Phase::Attach).unwrap().force_constants,
            &[0.0, 1.0, 2.5, 5.0],
        );
        assert_close(&rest.windows(Phase::Pull).unwrap().targets, &[0.0, 0.5, 1.0]);
        assert_close(
            &rest.windows(Phase::Release).unwrap().force_constants,
            &[0.0, 1.5, 3.0, 5.0],
        );
    }

    #[test]
    fn windows_from_fraction_increments() {
        let mut rest = base_restraint();
        rest.attach.target = Some(0.0);
        rest.attach.fraction_increment = Some(0.25);
        rest.attach.fc_final = Some(5.0);
        rest.pull.fc = Some(5.0);
        rest.pull.fraction_increment = Some(0.5);
        rest.pull.target_final = Some(1.0);
        rest.release.target = Some(1.0);
        rest.release.fraction_increment = Some(0.33);
        rest.release.fc_final = Some(5.0);
        rest.initialize(&host_guest()).unwrap();

        assert_close(
            &rest.windows(Phase::Attach).unwrap().force_constants,
            &[0.0, 1.25, 2.5, 3.75, 5.0],
        );
        assert_close(&rest.windows(Phase::Pull).unwrap().targets, &[0.0, 0.5, 1.0]);
        // 0.33 does not divide 1.0 evenly; the last fraction is capped so
        // the final window lands exactly on fc_final.
        assert_close(
            &rest.windows(Phase::Release).unwrap().force_constants,
            &[0.0, 1.65, 3.3, 4.95, 5.0],
        );
    }

    #[test]
    fn windows_from_explicit_lists() {
        let mut rest = base_restraint();
        rest.attach.target = Some(0.0);
        rest.attach.fc_list = Some(vec![0.0, 0.5, 1.0, 2.0]);
        rest.pull.fc = Some(2.0);
        rest.pull.target_list = Some(vec![0.0, 0.5, 1.0, 1.5]);
        rest.release.target = Some(1.5);
        rest.release.fc_list = Some(vec![0.0, 0.66, 1.2, 2.0]);
        rest.initialize(&host_guest()).unwrap();

        assert_close(
            &rest.windows(Phase::Attach).unwrap().force_constants,
            &[0.0, 0.5, 1.0, 2.0],
        );
        assert_close(
            &rest.windows(Phase::Pull).unwrap().targets,
            &[0.0, 0.5, 1.0, 1.5],
        );
        assert_close(
            &rest.windows(Phase::Release).unwrap().force_constants,
            &[0.0, 0.66, 1.2, 2.0],
        );
    }

    #[test]
    fn single_phase_restraints_leave_other_phases_unset() {
        let mut rest = base_restraint();
        rest.release.target = Some(0.0);
        rest.release.num_windows = Some(3);
        rest.release.fc_initial = Some(0.0);
        rest.release.fc_final = Some(2.0);
        rest.initialize(&host_guest()).unwrap();

        assert!(rest.windows(Phase::Attach).is_none());
        assert!(rest.windows(Phase::Pull).is_none());
        assert_close(
            &rest.windows(Phase::Release).unwrap().force_constants,
            &[0.0, 1.0, 2.0],
        );
        assert_close(&rest.windows(Phase::Release).unwrap().targets, &[0.0; 3]);
    }

    #[test]
    fn three_and_four_mask_restraints_resolve_all_indices() {
        let mut rest = base_restraint();
        rest.mask1 = Some(":CB6@O2".into());
        rest.mask2 = Some(":CB6@O".into());
        rest.mask3 = Some(":BUT@C3".into());
        rest.mask4 = Some(":BUT@C".into());
        rest.attach.target = Some(0.0);
        rest.attach.num_windows = Some(2);
        rest.attach.fc_final = Some(10.0);
        rest.initialize(&host_guest()).unwrap();

        assert_eq!(rest.index1(), Some(&[2][..]));
        assert_eq!(rest.index2(), Some(&[1][..]));
        assert_eq!(rest.index3(), Some(&[10][..]));
        assert_eq!(rest.index4(), Some(&[7][..]));
        assert_eq!(rest.kind(), RestraintKind::Torsion);
    }

    #[test]
    fn missing_masks_and_empty_restraints_error() {
        let mut rest = ApRestraint::new();
        assert!(matches!(
            rest.initialize(&host_guest()),
            Err(RestraintError::MissingMask(1))
        ));

        rest.mask1 = Some(":CB6@O".into());
        rest.mask2 = Some(":BUT@C3".into());
        assert!(matches!(
            rest.initialize(&host_guest()),
            Err(RestraintError::Empty)
        ));
    }

    #[test]
    fn incomplete_schedule_reports_missing_parameter() {
        let mut rest = base_restraint();
        rest.attach.num_windows = Some(4);
        match rest.initialize(&host_guest()) {
            Err(RestraintError::MissingParameter { phase, field }) => {
                assert_eq!(phase, Phase::Attach);
                assert_eq!(field, "fc_final");
            }
            other => panic!("expected missing parameter, got {other:?}"),
        }
    }

    #[test]
    fn zero_force_constant_increment_is_rejected() {
        let mut rest = base_restraint();
        rest.attach.target = Some(3.0);
        rest.attach.fc_increment = Some(0.0);
        rest.attach.fc_final = Some(3.0);
        match rest.initialize(&host_guest()) {
            Err(RestraintError::InvalidIncrement { phase, field }) => {
                assert_eq!(phase, Phase::Attach);
                assert_eq!(field, "fc_increment");
            }
            other => panic!("expected invalid increment, got {other:?}"),
        }
    }

    #[test]
    fn negative_fraction_increment_is_rejected() {
        let mut rest = base_restraint();
        rest.attach.target = Some(3.0);
        rest.attach.fraction_increment = Some(-0.25);
        rest.attach.fc_final = Some(5.0);
        match rest.initialize(&host_guest()) {
            Err(RestraintError::InvalidIncrement { phase, field }) => {
                assert_eq!(phase, Phase::Attach);
                assert_eq!(field, "fraction_increment");
            }
            other => panic!("expected invalid increment, got {other:?}"),
        }
    }

    #[test]
    fn zero_pull_target_increment_is_rejected() {
        let mut rest = base_restraint();
        rest.pull.fc = Some(5.0);
        rest.pull.target_increment = Some(0.0);
        rest.pull.target_final = Some(18.0);
        match rest.initialize(&host_guest()) {
            Err(RestraintError::InvalidIncrement { phase, field }) => {
                assert_eq!(phase, Phase::Pull);
                assert_eq!(field, "target_increment");
            }
            other => panic!("expected invalid increment, got {other:?}"),
        }
    }
}
