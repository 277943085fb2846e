//! End-to-end APR setup: structure in, window tree with restraint files out.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::io::pdb::{PdbError, PdbFile};
use crate::core::io::traits::StructureFile;
use crate::progress::{Progress, ProgressReporter};
use crate::restraints::amber::{AmberOutputError, write_disang};
use crate::restraints::restraint::{ApRestraint, CustomRestraintValues, PhaseSpec, RestraintError};
use crate::restraints::windows::{WindowError, create_window_list};

use super::make_window_dirs;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("File I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read structure: {0}")]
    Pdb(#[from] PdbError),

    #[error("Restraint definition error: {0}")]
    Restraint(#[from] RestraintError),

    #[error("Window list error: {0}")]
    Window(#[from] WindowError),

    #[error("Failed to write restraint file: {0}")]
    Output(#[from] AmberOutputError),
}

/// One restraint as written in the setup config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestraintConfig {
    pub mask1: String,
    pub mask2: String,
    pub mask3: Option<String>,
    pub mask4: Option<String>,
    #[serde(default)]
    pub amber_index: bool,
    #[serde(default)]
    pub auto_apr: bool,
    #[serde(default)]
    pub continuous_apr: bool,
    #[serde(default)]
    pub attach: PhaseSpec,
    #[serde(default)]
    pub pull: PhaseSpec,
    #[serde(default)]
    pub release: PhaseSpec,
    #[serde(default)]
    pub custom_restraint_values: CustomRestraintValues,
}

impl RestraintConfig {
    fn to_restraint(&self) -> ApRestraint {
        let mut restraint = ApRestraint::new();
        restraint.mask1 = Some(self.mask1.clone());
        restraint.mask2 = Some(self.mask2.clone());
        restraint.mask3 = self.mask3.clone();
        restraint.mask4 = self.mask4.clone();
        restraint.amber_index = self.amber_index;
        restraint.auto_apr = self.auto_apr;
        restraint.continuous_apr = self.continuous_apr;
        restraint.attach = self.attach.clone();
        restraint.pull = self.pull.clone();
        restraint.release = self.release.clone();
        restraint.custom_restraint_values = self.custom_restraint_values;
        restraint
    }
}

fn default_restraint_file() -> String {
    "disang.rest".to_string()
}

/// A complete setup request, loadable from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetupConfig {
    /// Input structure (PDB) the restraint masks resolve against.
    pub structure: PathBuf,
    /// Directory under which the `windows/` tree is created.
    pub output_dir: PathBuf,
    /// Move an existing `windows/` tree aside before creating a new one.
    #[serde(default)]
    pub stash_existing: bool,
    /// File name of the per-window restraint file.
    #[serde(default = "default_restraint_file")]
    pub restraint_file: String,
    pub restraints: Vec<RestraintConfig>,
}

impl SetupConfig {
    pub fn builder() -> SetupConfigBuilder {
        SetupConfigBuilder::new()
    }
}

#[derive(Default)]
pub struct SetupConfigBuilder {
    structure: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    stash_existing: bool,
    restraint_file: Option<String>,
    restraints: Vec<RestraintConfig>,
}

impl SetupConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn structure(mut self, path: PathBuf) -> Self {
        self.structure = Some(path);
        self
    }
    pub fn output_dir(mut self, path: PathBuf) -> Self {
        self.output_dir = Some(path);
        self
    }
    pub fn stash_existing(mut self, stash: bool) -> Self {
        self.stash_existing = stash;
        self
    }
    pub fn restraint_file(mut self, name: String) -> Self {
        self.restraint_file = Some(name);
        self
    }
    pub fn restraint(mut self, restraint: RestraintConfig) -> Self {
        self.restraints.push(restraint);
        self
    }

    pub fn build(self) -> Result<SetupConfig, SetupError> {
        if self.restraints.is_empty() {
            return Err(SetupError::MissingParameter("restraints"));
        }
        Ok(SetupConfig {
            structure: self
                .structure
                .ok_or(SetupError::MissingParameter("structure"))?,
            output_dir: self
                .output_dir
                .ok_or(SetupError::MissingParameter("output_dir"))?,
            stash_existing: self.stash_existing,
            restraint_file: self.restraint_file.unwrap_or_else(default_restraint_file),
            restraints: self.restraints,
        })
    }
}

/// What a finished setup produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupSummary {
    pub attach_windows: usize,
    pub pull_windows: usize,
    pub release_windows: usize,
    pub restraint_count: usize,
    pub window_dir: PathBuf,
}

impl SetupSummary {
    pub fn total_windows(&self) -> usize {
        self.attach_windows + self.pull_windows + self.release_windows
    }
}

/// Stages a complete APR calculation.
///
/// Loads the structure, resolves every restraint against it, checks that
/// the restraint set agrees on a single window list, creates the window
/// directories, and writes one restraint file per window.
pub fn run(config: &SetupConfig, reporter: &ProgressReporter) -> Result<SetupSummary, SetupError> {
    info!(structure = %config.structure.display(), "starting APR setup");
    let structure = PdbFile::read_from_path(&config.structure)?;
    debug!(
        atoms = structure.atom_count(),
        residues = structure.residue_count(),
        "loaded structure"
    );

    let mut restraints = Vec::with_capacity(config.restraints.len());
    for restraint_config in &config.restraints {
        let mut restraint = restraint_config.to_restraint();
        restraint.initialize(&structure)?;
        restraints.push(restraint);
    }

    let windows = create_window_list(&restraints)?;
    let window_dir = make_window_dirs(&windows, &config.output_dir, config.stash_existing)?;

    for window in &windows {
        reporter.report(Progress::WindowStart {
            label: window.clone(),
        });
        let path = window_dir.join(window).join(&config.restraint_file);
        write_disang(&path, &restraints, window)?;
        reporter.report(Progress::WindowFinish);
    }

    let count = |prefix: char| windows.iter().filter(|w| w.starts_with(prefix)).count();
    let summary = SetupSummary {
        attach_windows: count('a'),
        pull_windows: count('p'),
        release_windows: count('r'),
        restraint_count: restraints.len(),
        window_dir,
    };
    info!(
        attach = summary.attach_windows,
        pull = summary.pull_windows,
        release = summary.release_windows,
        "setup complete"
    );
    Ok(summary)
}
