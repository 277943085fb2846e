use aprx::build::align::AlignError;
use aprx::build::tleap::TleapError;
use aprx::core::io::pdb::PdbError;
use aprx::workflows::setup::SetupError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Tleap(#[from] TleapError),

    #[error(transparent)]
    Align(#[from] AlignError),

    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("Failed to read structure '{path}': {source}", path = path.display())]
    Structure {
        path: PathBuf,
        #[source]
        source: PdbError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
