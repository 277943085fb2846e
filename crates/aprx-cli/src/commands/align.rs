use crate::cli::AlignArgs;
use crate::error::{CliError, Result};
use aprx::build::align::zalign;
use aprx::core::io::pdb::PdbFile;
use aprx::core::io::traits::StructureFile;
use tracing::info;

pub fn run(args: AlignArgs) -> Result<()> {
    info!(input = %args.input.display(), "loading structure");
    let mut structure = PdbFile::read_from_path(&args.input).map_err(|e| CliError::Structure {
        path: args.input.clone(),
        source: e,
    })?;

    zalign(&mut structure, &args.mask1, &args.mask2)?;

    PdbFile::write_to_path(&structure, &args.output).map_err(|e| CliError::Structure {
        path: args.output.clone(),
        source: e,
    })?;

    println!(
        "Aligned {} -> {} along {} to {}",
        args.input.display(),
        args.output.display(),
        args.mask1,
        args.mask2
    );
    Ok(())
}
