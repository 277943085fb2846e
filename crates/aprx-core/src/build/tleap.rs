//! `tleap` orchestration: template filtering, input generation, and the
//! iterative solvation loop.
//!
//! `tleap` cannot be asked for an exact number of waters directly; it only
//! takes a buffer distance. [`TleapSystem::build`] closes that gap by
//! repeatedly writing an input file, running `tleap`, counting the waters
//! it reports, and adjusting the buffer until the count converges on the
//! target, removing the last few waters by residue number when the search
//! gets within reach.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::progress::{Progress, ProgressReporter};

pub const N_A: f64 = 6.022_140_9e23;
pub const ANGSTROM_CUBED_TO_LITERS: f64 = 1e-27;

#[derive(Debug, Error)]
pub enum TleapError {
    #[error("File I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("template_file and template_lines cannot both be specified")]
    TemplateConflict,

    #[error("Either template_file or template_lines needs to be specified")]
    MissingTemplate,

    #[error(
        "Invalid buffer target '{0}': use a distance ending in 'A' (e.g. 12A) or a water count"
    )]
    InvalidBufferTarget(String),

    #[error("Invalid ion amount '{0}': use a count, a molarity ending in 'M', or a molality ending in 'm'")]
    InvalidIonAmount(String),

    #[error("Invalid pbc type '{0}': expected 'cubic', 'rectangular', or 'octahedral'")]
    InvalidPbcType(String),

    #[error("The 'add_ions' list requires residue/amount pairs")]
    UnpairedIons,

    #[error("Could not determine the simulation volume from tleap output")]
    MissingVolume,

    #[error("tleap exited with {status}: {stderr}")]
    TleapFailed { status: String, stderr: String },

    #[error(
        "Buffer search ended after {cycles} cycles with {waters} waters (target {target}); \
         try raising max_cycles"
    )]
    ConvergenceFailed {
        cycles: usize,
        waters: usize,
        target: usize,
    },

    #[error("Water removal failed to reach the target count")]
    RemovalFailed,
}

/// Periodic box shape passed to `solvatebox`/`solvateoct`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PbcType {
    Cubic,
    Rectangular,
    Octahedral,
}

impl FromStr for PbcType {
    type Err = TleapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cubic" => Ok(PbcType::Cubic),
            "rectangular" => Ok(PbcType::Rectangular),
            "octahedral" => Ok(PbcType::Octahedral),
            other => Err(TleapError::InvalidPbcType(other.into())),
        }
    }
}

/// How much solvent to add: an exact water count or a buffer distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BufferTarget {
    Waters(usize),
    Angstroms(f64),
}

impl FromStr for BufferTarget {
    type Err = TleapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(distance) = s.strip_suffix('A') {
            let value: f64 = distance
                .trim()
                .parse()
                .map_err(|_| TleapError::InvalidBufferTarget(s.into()))?;
            return Ok(BufferTarget::Angstroms(value));
        }
        let count: usize = s
            .parse()
            .map_err(|_| TleapError::InvalidBufferTarget(s.into()))?;
        Ok(BufferTarget::Waters(count))
    }
}

impl fmt::Display for BufferTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferTarget::Waters(n) => write!(f, "{} waters", n),
            BufferTarget::Angstroms(a) => write!(f, "{}A", a),
        }
    }
}

/// Amount of one extra ion species: a count, a molarity, or a molality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IonAmount {
    Number(usize),
    Molarity(f64),
    Molality(f64),
}

impl FromStr for IonAmount {
    type Err = TleapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(value) = s.strip_suffix('M') {
            let molarity: f64 = value
                .parse()
                .map_err(|_| TleapError::InvalidIonAmount(s.into()))?;
            return Ok(IonAmount::Molarity(molarity));
        }
        if let Some(value) = s.strip_suffix('m') {
            let molality: f64 = value
                .parse()
                .map_err(|_| TleapError::InvalidIonAmount(s.into()))?;
            return Ok(IonAmount::Molality(molality));
        }
        let count: usize = s
            .parse()
            .map_err(|_| TleapError::InvalidIonAmount(s.into()))?;
        Ok(IonAmount::Number(count))
    }
}

/// Executes a written `tleap` input file and returns its standard output.
///
/// The production implementation shells out to the real binary; tests
/// substitute a canned responder.
pub trait TleapRunner {
    fn run(&self, input_file: &str, working_dir: &Path) -> Result<String, TleapError>;
}

/// Runs the `tleap` binary from `$PATH`.
#[derive(Debug, Default)]
pub struct SystemTleap;

impl TleapRunner for SystemTleap {
    fn run(&self, input_file: &str, working_dir: &Path) -> Result<String, TleapError> {
        let output = Command::new("tleap")
            .arg("-s")
            .arg("-f")
            .arg(input_file)
            .current_dir(working_dir)
            .output()?;
        if !output.status.success() {
            return Err(TleapError::TleapFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// A `tleap` build: a template plus solvation and ion settings.
#[derive(Debug, Clone)]
pub struct TleapSystem {
    pub template_file: Option<PathBuf>,
    pub template_lines: Option<Vec<String>>,
    /// Overrides the PDB named in the template's `loadpdb` line.
    pub loadpdb_file: Option<String>,
    pub unit: String,
    /// `None` skips solvation entirely (vacuum build).
    pub pbc_type: Option<PbcType>,
    pub buffer_target: BufferTarget,
    pub water_box: String,
    pub neutralize: bool,
    pub counter_cation: String,
    pub counter_anion: String,
    /// Extra ions as `(residue, amount)` pairs.
    pub add_ions: Vec<(String, IonAmount)>,
    pub output_path: PathBuf,
    pub output_prefix: String,
    pub max_cycles: usize,

    // Search state.
    lines: Vec<String>,
    buffer_value: f64,
    target_waters: usize,
    exponent: i32,
    cycles_since_exponent_change: usize,
    waters_to_remove: Vec<String>,
    add_ion_residues: Vec<(String, usize)>,
    buffer_history: Vec<f64>,
    water_history: Vec<usize>,
}

impl Default for TleapSystem {
    fn default() -> Self {
        Self {
            template_file: None,
            template_lines: None,
            loadpdb_file: None,
            unit: "model".into(),
            pbc_type: Some(PbcType::Cubic),
            buffer_target: BufferTarget::Angstroms(12.0),
            water_box: "TIP3PBOX".into(),
            neutralize: true,
            counter_cation: "Na+".into(),
            counter_anion: "Cl-".into(),
            add_ions: Vec::new(),
            output_path: PathBuf::from("."),
            output_prefix: "build".into(),
            max_cycles: 50,
            lines: Vec::new(),
            buffer_value: 1.0,
            target_waters: 1000,
            exponent: 1,
            cycles_since_exponent_change: 0,
            waters_to_remove: Vec::new(),
            add_ion_residues: Vec::new(),
            buffer_history: vec![0.0],
            water_history: vec![0],
        }
    }
}

impl TleapSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the build: a single pass for vacuum systems, or the full
    /// buffer search when a periodic box is requested.
    pub fn build(
        &mut self,
        runner: &dyn TleapRunner,
        reporter: &ProgressReporter,
    ) -> Result<(), TleapError> {
        self.load_template()?;
        self.filter_template();

        if self.pbc_type.is_none() {
            self.write_input(true)?;
            self.run(runner)?;
            return Ok(());
        }
        self.solvate(runner, reporter)
    }

    fn load_template(&mut self) -> Result<(), TleapError> {
        match (&self.template_file, &self.template_lines) {
            (Some(_), Some(_)) => Err(TleapError::TemplateConflict),
            (Some(path), None) => {
                let text = fs::read_to_string(path)?;
                self.lines = text.lines().map(|l| l.trim_end().to_string()).collect();
                Ok(())
            }
            (None, Some(lines)) => {
                self.lines = lines.iter().map(|l| l.trim_end().to_string()).collect();
                Ok(())
            }
            (None, None) => Err(TleapError::MissingTemplate),
        }
    }

    /// Normalizes the `loadpdb` line and drops template commands that
    /// would collide with the generated solvation and save commands.
    fn filter_template(&mut self) {
        const CONFLICTING: [&str; 7] = [
            "addions",
            "addions2",
            "addionsrand",
            "desc",
            "quit",
            "solvate",
            "save",
        ];

        let mut filtered = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if line.contains("loadpdb") {
                let normalized = line.replace('=', " ");
                let words: Vec<&str> = normalized.split_whitespace().collect();
                if words.len() >= 3 {
                    if self.loadpdb_file.is_none() {
                        self.loadpdb_file = Some(words[2].to_string());
                    }
                    self.unit = words[0].to_string();
                }
                let pdb = self.loadpdb_file.as_deref().unwrap_or("");
                filtered.push(format!("{} = loadpdb {}", self.unit, pdb));
            } else if self.pbc_type.is_some() {
                let first_word = line
                    .split_whitespace()
                    .next()
                    .unwrap_or("")
                    .to_ascii_lowercase();
                if !CONFLICTING.iter().any(|cmd| first_word.starts_with(cmd)) {
                    filtered.push(line.clone());
                }
            } else {
                filtered.push(line.clone());
            }
        }
        self.lines = filtered;
    }

    /// Path of the generated input file.
    pub fn input_file_name(&self) -> String {
        format!("{}.tleap.in", self.output_prefix)
    }

    fn write_input(&self, include_saves: bool) -> Result<(), TleapError> {
        let path = self.output_path.join(self.input_file_name());
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);

        for line in &self.lines {
            writeln!(writer, "{}", line)?;
        }
        match self.pbc_type {
            Some(PbcType::Cubic) => writeln!(
                writer,
                "solvatebox {} {} {} iso",
                self.unit, self.water_box, self.buffer_value
            )?,
            Some(PbcType::Rectangular) => writeln!(
                writer,
                "solvatebox {} {} {{10.0 10.0 {}}}",
                self.unit, self.water_box, self.buffer_value
            )?,
            Some(PbcType::Octahedral) => writeln!(
                writer,
                "solvateoct {} {} {} iso",
                self.unit, self.water_box, self.buffer_value
            )?,
            None => writeln!(writer, "# Skipping solvation ...")?,
        }
        if self.neutralize {
            writeln!(writer, "addionsrand {} {} 0", self.unit, self.counter_cation)?;
            writeln!(writer, "addionsrand {} {} 0", self.unit, self.counter_anion)?;
        }
        for (residue, amount) in &self.add_ion_residues {
            writeln!(writer, "addionsrand {} {} {}", self.unit, residue, amount)?;
        }
        for water in &self.waters_to_remove {
            writeln!(writer, "remove {} {}.{}", self.unit, self.unit, water)?;
        }
        if include_saves {
            writeln!(writer, "savepdb {} {}.pdb", self.unit, self.output_prefix)?;
            writeln!(
                writer,
                "saveamberparm {} {}.prmtop {}.rst7",
                self.unit, self.output_prefix, self.output_prefix
            )?;
        }
        writeln!(writer, "desc {}", self.unit)?;
        writeln!(writer, "quit")?;
        writer.flush()?;
        Ok(())
    }

    fn run(&self, runner: &dyn TleapRunner) -> Result<String, TleapError> {
        backup_leap_log(&self.output_path)?;
        let output = runner.run(&self.input_file_name(), &self.output_path)?;
        self.scan_leap_log();
        Ok(output)
    }

    fn scan_leap_log(&self) {
        let Ok(text) = fs::read_to_string(self.output_path.join("leap.log")) else {
            return;
        };
        for line in text.lines() {
            if ["ERROR", "WARNING", "Warning", "duplicate", "FATAL", "Could"]
                .iter()
                .any(|kw| line.contains(kw))
            {
                warn!("It appears there was a problem with solvation: check `leap.log`...");
                return;
            }
        }
    }

    fn solvate(
        &mut self,
        runner: &dyn TleapRunner,
        reporter: &ProgressReporter,
    ) -> Result<(), TleapError> {
        self.set_target_waters(runner)?;
        if !self.add_ions.is_empty() {
            self.set_additional_ions(runner)?;
        }

        let mut waters = 0;
        let mut cycle = 0;
        while cycle < self.max_cycles {
            waters = self.count_waters(runner)?;
            self.water_history.push(waters);
            self.buffer_history.push(self.buffer_value);
            debug!(
                cycle,
                buffer = self.buffer_value,
                waters,
                target = self.target_waters,
                "buffer search"
            );
            reporter.report(Progress::SolvationCycle {
                cycle,
                buffer: self.buffer_value,
                waters,
                target: self.target_waters,
            });

            if waters == self.target_waters {
                self.write_input(true)?;
                self.run(runner)?;
                reporter.report(Progress::SolvationFinish { waters });
                return Ok(());
            }
            if waters > self.target_waters && waters - self.target_waters < 12 {
                self.remove_waters_manually(runner)?;
                self.write_input(true)?;
                self.run(runner)?;
                reporter.report(Progress::SolvationFinish {
                    waters: self.target_waters,
                });
                return Ok(());
            }
            self.adjust_buffer_value();
            // The box volume drifts during the search, so re-derive ion
            // counts every so often.
            if !self.add_ions.is_empty() && cycle % 10 == 0 {
                self.set_additional_ions(runner)?;
            }
            cycle += 1;
        }

        if waters > self.target_waters {
            self.remove_waters_manually(runner)?;
            self.write_input(true)?;
            self.run(runner)?;
            reporter.report(Progress::SolvationFinish {
                waters: self.target_waters,
            });
            return Ok(());
        }
        Err(TleapError::ConvergenceFailed {
            cycles: cycle,
            waters,
            target: self.target_waters,
        })
    }

    /// Turns the buffer target into an exact water count, probing `tleap`
    /// once when the target is given as a distance.
    fn set_target_waters(&mut self, runner: &dyn TleapRunner) -> Result<(), TleapError> {
        match self.buffer_target {
            BufferTarget::Waters(count) => {
                self.target_waters = count;
            }
            BufferTarget::Angstroms(distance) => {
                self.buffer_value = distance;
                let waters = self.count_waters(runner)?;
                debug!(
                    waters,
                    buffer = %self.buffer_target,
                    "initial water estimate for buffer distance"
                );
                self.target_waters = waters;
            }
        }
        Ok(())
    }

    fn count_waters(&mut self, runner: &dyn TleapRunner) -> Result<usize, TleapError> {
        Ok(self
            .count_residues(runner)?
            .iter()
            .find(|(name, _)| name == "WAT")
            .map_or(0, |&(_, count)| count))
    }

    /// Runs `tleap` without saves and tallies the residues its `desc`
    /// output reports, preserving first-seen order.
    pub fn count_residues(
        &mut self,
        runner: &dyn TleapRunner,
    ) -> Result<Vec<(String, usize)>, TleapError> {
        self.write_input(false)?;
        let output = self.run(runner)?;

        let mut residues: Vec<(String, usize)> = Vec::new();
        for line in output.lines() {
            let Some(name) = parse_desc_residue(line).map(|(name, _)| name) else {
                continue;
            };
            match residues.iter_mut().find(|(n, _)| *n == name) {
                Some((_, count)) => *count += 1,
                None => residues.push((name.to_string(), 1)),
            }
        }
        Ok(residues)
    }

    fn list_waters(&mut self, runner: &dyn TleapRunner) -> Result<Vec<String>, TleapError> {
        self.write_input(false)?;
        let output = self.run(runner)?;
        Ok(output
            .lines()
            .filter_map(|line| match parse_desc_residue(line) {
                Some(("WAT", number)) => Some(number.to_string()),
                _ => None,
            })
            .collect())
    }

    /// Total box volume reported by `tleap`, in cubic angstroms.
    pub fn volume(&mut self, runner: &dyn TleapRunner) -> Result<f64, TleapError> {
        self.write_input(false)?;
        let output = self.run(runner)?;
        for line in output.lines() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("Volume:") {
                let value = rest.trim().trim_end_matches("A^3").trim();
                return value
                    .parse::<f64>()
                    .map_err(|_| TleapError::MissingVolume);
            }
        }
        Err(TleapError::MissingVolume)
    }

    /// Converts the `add_ions` request into residue/count pairs, turning
    /// molarity into a count via the box volume and molality via the
    /// target water count.
    fn set_additional_ions(&mut self, runner: &dyn TleapRunner) -> Result<(), TleapError> {
        if self.add_ions.is_empty() {
            return Ok(());
        }
        let ions = self.add_ions.clone();
        let mut resolved = Vec::with_capacity(ions.len());
        for (residue, amount) in ions {
            let count = match amount {
                IonAmount::Number(n) => n,
                IonAmount::Molality(molality) => {
                    // moles of solute per kg water, at 0.018 kg/mol.
                    (molality * self.target_waters as f64 * 0.018).ceil() as usize
                }
                IonAmount::Molarity(molarity) => {
                    let volume = self.volume(runner)?;
                    let liters = volume * ANGSTROM_CUBED_TO_LITERS;
                    (molarity * N_A * liters).ceil() as usize
                }
            };
            resolved.push((residue, count));
        }
        self.add_ion_residues = resolved;
        Ok(())
    }

    /// Deletes the excess waters by residue number to hit the target
    /// exactly. Removal changes what `tleap` adds, so this loops until
    /// the count settles.
    fn remove_waters_manually(&mut self, runner: &dyn TleapRunner) -> Result<(), TleapError> {
        const MAX_REMOVAL_CYCLES: usize = 10;

        let mut waters = *self.water_history.last().unwrap_or(&0);
        let mut cycle = 0;
        while waters > self.target_waters {
            let surplus = waters - self.target_waters;
            let water_residues = self.list_waters(runner)?;
            let keep_from = water_residues.len().saturating_sub(surplus);
            self.waters_to_remove = water_residues[keep_from..].to_vec();
            debug!(removing = ?self.waters_to_remove, "manually removing waters");

            let residues = self.count_residues(runner)?;
            waters = residues
                .iter()
                .find(|(name, _)| name == "WAT")
                .map_or(0, |&(_, count)| count);
            if waters == self.target_waters {
                for (name, count) in &residues {
                    info!("{}\t{}", name, count);
                }
                return Ok(());
            }
            cycle += 1;
            if cycle > MAX_REMOVAL_CYCLES {
                return Err(TleapError::RemovalFailed);
            }
        }
        Ok(())
    }

    /// Picks the next buffer value from the last two water counts.
    ///
    /// Overshooting the target in either direction shrinks the step by an
    /// order of magnitude, but only after at least two steps at the
    /// current magnitude; otherwise the search walks steadily toward the
    /// target.
    fn adjust_buffer_value(&mut self) {
        let target = self.target_waters;
        let previous = self.water_history[self.water_history.len() - 2];
        let latest = self.water_history[self.water_history.len() - 1];
        let last_buffer = self.buffer_history[self.buffer_history.len() - 1];
        let settled = self.cycles_since_exponent_change > 1;

        if previous < target && latest > target && settled {
            self.exponent -= 1;
            self.cycles_since_exponent_change = 0;
            self.buffer_value = last_buffer - 5.0 * 10f64.powi(self.exponent);
        } else if previous > target && latest < target && settled {
            self.exponent -= 1;
            self.cycles_since_exponent_change = 0;
            self.buffer_value = last_buffer + 5.0 * 10f64.powi(self.exponent);
        } else if previous > target && latest > target {
            self.buffer_value = last_buffer - 10f64.powi(self.exponent);
            self.cycles_since_exponent_change += 1;
        } else if previous > target && latest < target {
            self.buffer_value = last_buffer + 10f64.powi(self.exponent);
            self.cycles_since_exponent_change += 1;
        } else if previous < target && latest > target {
            self.buffer_value = last_buffer - 10f64.powi(self.exponent);
            self.cycles_since_exponent_change += 1;
        } else {
            self.buffer_value = last_buffer + 10f64.powi(self.exponent);
            self.cycles_since_exponent_change += 1;
        }
    }
}

/// Parses one residue line of `desc` output, `R<NAME number>`.
fn parse_desc_residue(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("R<")?;
    let end = rest.find('>')?;
    let body = &rest[..end];
    let (name, number) = body.split_once(' ')?;
    Some((name, number))
}

/// Moves an existing `leap.log` aside so the next run starts fresh.
fn backup_leap_log(path: &Path) -> io::Result<()> {
    let log_path = path.join("leap.log");
    if !log_path.exists() {
        return Ok(());
    }
    for index in 1..1000 {
        let backup = path.join(format!("leap.log.{:03}", index));
        if !backup.exists() {
            fs::rename(&log_path, &backup)?;
            return Ok(());
        }
    }
    // Give up rotating and overwrite the oldest slot.
    fs::rename(&log_path, path.join("leap.log.001"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    /// Replays the generated input file: waters scale linearly with the
    /// buffer value and `remove` lines subtract.
    struct LinearWaterRunner {
        waters_per_angstrom: f64,
        volume_per_water: f64,
        runs: Cell<usize>,
    }

    impl LinearWaterRunner {
        fn new() -> Self {
            Self {
                waters_per_angstrom: 100.0,
                volume_per_water: 30.0,
                runs: Cell::new(0),
            }
        }
    }

    impl TleapRunner for LinearWaterRunner {
        fn run(&self, input_file: &str, working_dir: &Path) -> Result<String, TleapError> {
            self.runs.set(self.runs.get() + 1);
            let text = fs::read_to_string(working_dir.join(input_file))?;
            let mut waters = 0usize;
            let mut removed = 0usize;
            for line in text.lines() {
                if line.starts_with("solvatebox") || line.starts_with("solvateoct") {
                    let buffer: f64 = line
                        .split_whitespace()
                        .nth(3)
                        .and_then(|w| w.parse().ok())
                        .unwrap_or(0.0);
                    waters = (buffer * self.waters_per_angstrom).round() as usize;
                } else if line.starts_with("remove ") {
                    removed += 1;
                }
            }
            let waters = waters.saturating_sub(removed);
            let mut output = String::new();
            output.push_str("R<CB6 1>\nR<BUT 2>\n");
            for number in 0..waters {
                output.push_str(&format!("R<WAT {}>\n", number + 3));
            }
            output.push_str(&format!(
                "Volume: {:.3} A^3\n",
                waters as f64 * self.volume_per_water
            ));
            Ok(output)
        }
    }

    fn system(dir: &Path) -> TleapSystem {
        let mut system = TleapSystem::new();
        system.template_lines = Some(vec![
            "source leaprc.water.tip3p".to_string(),
            "model = loadpdb cb6-but.pdb".to_string(),
        ]);
        system.neutralize = false;
        system.output_path = dir.to_path_buf();
        system.output_prefix = "solvate".to_string();
        system
    }

    #[test]
    fn buffer_target_parses_distances_and_counts() {
        assert_eq!("12A".parse::<BufferTarget>().unwrap(), BufferTarget::Angstroms(12.0));
        assert_eq!("2000".parse::<BufferTarget>().unwrap(), BufferTarget::Waters(2000));
        assert!("12 waters".parse::<BufferTarget>().is_err());
    }

    #[test]
    fn ion_amount_parses_all_three_forms() {
        assert_eq!("5".parse::<IonAmount>().unwrap(), IonAmount::Number(5));
        assert_eq!("0.150M".parse::<IonAmount>().unwrap(), IonAmount::Molarity(0.150));
        assert_eq!("0.100m".parse::<IonAmount>().unwrap(), IonAmount::Molality(0.100));
        assert!("a lot".parse::<IonAmount>().is_err());
    }

    #[test]
    fn template_filter_rewrites_loadpdb_and_drops_conflicts() {
        let mut system = TleapSystem::new();
        system.template_lines = Some(vec![
            "source leaprc.gaff".to_string(),
            "mol = loadpdb original.pdb".to_string(),
            "solvatebox mol TIP3PBOX 14".to_string(),
            "addionsrand mol Na+ 0".to_string(),
            "savepdb mol out.pdb".to_string(),
            "quit".to_string(),
        ]);
        system.loadpdb_file = Some("aligned.pdb".to_string());
        system.load_template().unwrap();
        system.filter_template();

        assert_eq!(system.unit, "mol");
        assert_eq!(
            system.lines,
            vec!["source leaprc.gaff", "mol = loadpdb aligned.pdb"]
        );
    }

    #[test]
    fn vacuum_build_skips_the_search() {
        let dir = tempfile::tempdir().unwrap();
        let runner = LinearWaterRunner::new();
        let mut system = system(dir.path());
        system.pbc_type = None;
        system.build(&runner, &ProgressReporter::new()).unwrap();

        assert_eq!(runner.runs.get(), 1);
        let text = fs::read_to_string(dir.path().join("solvate.tleap.in")).unwrap();
        assert!(text.contains("# Skipping solvation ..."));
        assert!(text.contains("saveamberparm model solvate.prmtop solvate.rst7"));
    }

    #[test]
    fn solvation_converges_on_an_exact_water_count() {
        let dir = tempfile::tempdir().unwrap();
        let runner = LinearWaterRunner::new();
        let mut system = system(dir.path());
        system.buffer_target = BufferTarget::Waters(250);
        system.build(&runner, &ProgressReporter::new()).unwrap();

        // The final saved input must reproduce the target exactly.
        let text = fs::read_to_string(dir.path().join("solvate.tleap.in")).unwrap();
        assert!(text.contains("savepdb model solvate.pdb"));
        let output = runner.run("solvate.tleap.in", dir.path()).unwrap();
        let waters = output.lines().filter(|l| l.starts_with("R<WAT")).count();
        assert_eq!(waters, 250);
    }

    #[test]
    fn solvation_removes_trailing_waters_when_close() {
        let dir = tempfile::tempdir().unwrap();
        let runner = LinearWaterRunner::new();
        let mut system = system(dir.path());
        // 253 is unreachable by whole buffer steps of 100/cycle until the
        // exponent drops; the search lands just above and prunes manually.
        system.buffer_target = BufferTarget::Waters(253);
        system.build(&runner, &ProgressReporter::new()).unwrap();

        let output = runner.run("solvate.tleap.in", dir.path()).unwrap();
        let waters = output.lines().filter(|l| l.starts_with("R<WAT")).count();
        assert_eq!(waters, 253);
    }

    #[test]
    fn buffer_distance_target_probes_once_and_matches() {
        let dir = tempfile::tempdir().unwrap();
        let runner = LinearWaterRunner::new();
        let mut system = system(dir.path());
        system.buffer_target = BufferTarget::Angstroms(10.0);
        system.build(&runner, &ProgressReporter::new()).unwrap();

        let output = runner.run("solvate.tleap.in", dir.path()).unwrap();
        let waters = output.lines().filter(|l| l.starts_with("R<WAT")).count();
        assert_eq!(waters, 1000);
    }

    #[test]
    fn molality_and_molarity_resolve_to_counts() {
        let dir = tempfile::tempdir().unwrap();
        let runner = LinearWaterRunner::new();
        let mut system = system(dir.path());
        system.buffer_target = BufferTarget::Waters(1000);
        system.add_ions = vec![
            ("K".to_string(), IonAmount::Molality(0.100)),
            ("BR".to_string(), IonAmount::Number(3)),
        ];
        system.build(&runner, &ProgressReporter::new()).unwrap();

        // 0.100 m x 1000 waters x 0.018 kg/mol = 1.8, rounded up.
        assert_eq!(
            system.add_ion_residues,
            vec![("K".to_string(), 2), ("BR".to_string(), 3)]
        );
        let text = fs::read_to_string(dir.path().join("solvate.tleap.in")).unwrap();
        assert!(text.contains("addionsrand model K 2"));
        assert!(text.contains("addionsrand model BR 3"));
    }

    #[test]
    fn progress_reports_each_search_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let runner = LinearWaterRunner::new();
        let mut system = system(dir.path());
        system.buffer_target = BufferTarget::Waters(250);

        let cycles = std::sync::Mutex::new(0usize);
        let finished = std::sync::Mutex::new(false);
        let reporter = ProgressReporter::with_callback(Box::new(|event| match event {
            Progress::SolvationCycle { .. } => *cycles.lock().unwrap() += 1,
            Progress::SolvationFinish { waters } => {
                assert_eq!(waters, 250);
                *finished.lock().unwrap() = true;
            }
            _ => {}
        }));
        system.build(&runner, &reporter).unwrap();

        assert!(*cycles.lock().unwrap() > 1);
        assert!(*finished.lock().unwrap());
    }

    #[test]
    fn volume_parses_desc_output() {
        let dir = tempfile::tempdir().unwrap();
        let runner = LinearWaterRunner::new();
        let mut system = system(dir.path());
        system.load_template().unwrap();
        system.filter_template();
        system.buffer_value = 5.0;
        let volume = system.volume(&runner).unwrap();
        assert_close(volume, 500.0 * 30.0);
    }

    #[test]
    fn leap_log_is_rotated_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("leap.log"), "old run").unwrap();
        backup_leap_log(dir.path()).unwrap();
        fs::write(dir.path().join("leap.log"), "new run").unwrap();
        backup_leap_log(dir.path()).unwrap();

        assert!(dir.path().join("leap.log.001").exists());
        assert!(dir.path().join("leap.log.002").exists());
        assert!(!dir.path().join("leap.log").exists());
    }

    #[test]
    fn conflicting_templates_are_rejected() {
        let mut system = TleapSystem::new();
        system.template_file = Some(PathBuf::from("tleap.in"));
        system.template_lines = Some(vec!["quit".to_string()]);
        assert!(matches!(
            system.load_template(),
            Err(TleapError::TemplateConflict)
        ));

        let mut system = TleapSystem::new();
        assert!(matches!(
            system.load_template(),
            Err(TleapError::MissingTemplate)
        ));
    }
}
