use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The aprx developers",
    version,
    about = "aprx - setup tooling for attach-pull-release (APR) binding free-energy calculations with AMBER.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solvate a structure with tleap, converging on an exact number of waters.
    Solvate(SolvateArgs),
    /// Align a host-guest structure so the pulling axis lies on +z.
    Align(AlignArgs),
    /// Stage a full APR calculation: window directories plus restraint files.
    Setup(SetupArgs),
}

/// Arguments for the `solvate` subcommand.
#[derive(Args, Debug)]
pub struct SolvateArgs {
    /// Path to the tleap template file (source commands, loadpdb, ...).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub template: PathBuf,

    /// Override the PDB file named in the template's loadpdb line.
    #[arg(short, long, value_name = "FILE")]
    pub pdb: Option<String>,

    /// Solvent target: a water count (e.g. 2000) or a buffer distance (e.g. 12A).
    #[arg(short, long, default_value = "12A", value_name = "TARGET")]
    pub buffer_target: String,

    /// Periodic box shape: cubic, rectangular, octahedral, or none (vacuum).
    #[arg(long, default_value = "cubic", value_name = "SHAPE")]
    pub pbc: String,

    /// Water box model passed to solvatebox/solvateoct.
    #[arg(long, default_value = "TIP3PBOX", value_name = "NAME")]
    pub water_box: String,

    /// Skip neutralizing counterions.
    #[arg(long)]
    pub no_neutralize: bool,

    /// Counter cation used for neutralization.
    #[arg(long, default_value = "Na+", value_name = "ION")]
    pub cation: String,

    /// Counter anion used for neutralization.
    #[arg(long, default_value = "Cl-", value_name = "ION")]
    pub anion: String,

    /// Additional ions as residue/amount pairs, e.g. --add-ions NA 0.150M CL 0.150M.
    #[arg(long, num_args = 2.., value_name = "ION AMOUNT")]
    pub add_ions: Vec<String>,

    /// Directory where tleap runs and output files land.
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub output_path: PathBuf,

    /// Prefix for the generated input, pdb, prmtop, and rst7 files.
    #[arg(long, default_value = "solvate", value_name = "NAME")]
    pub output_prefix: String,

    /// Maximum buffer-search cycles before giving up.
    #[arg(long, default_value_t = 50, value_name = "NUM")]
    pub max_cycles: usize,
}

/// Arguments for the `align` subcommand.
#[derive(Args, Debug)]
pub struct AlignArgs {
    /// Path to the input PDB file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the aligned output PDB file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Mask whose centroid becomes the origin (e.g. :CB6).
    #[arg(long, required = true, value_name = "MASK")]
    pub mask1: String,

    /// Mask whose centroid defines the +z direction (e.g. :BUT).
    #[arg(long, required = true, value_name = "MASK")]
    pub mask2: String,
}

/// Arguments for the `setup` subcommand.
#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Path to the setup configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Move an existing windows/ tree aside before creating a new one.
    #[arg(long)]
    pub stash_existing: bool,
}
