use crate::cli::SolvateArgs;
use crate::error::{CliError, Result};
use crate::progress::CliProgressHandler;
use aprx::build::tleap::{BufferTarget, IonAmount, PbcType, SystemTleap, TleapSystem};
use aprx::progress::ProgressReporter;
use tracing::info;

pub fn run(args: SolvateArgs) -> Result<()> {
    let mut system = TleapSystem::new();
    system.template_file = Some(args.template.clone());
    system.loadpdb_file = args.pdb.clone();
    system.buffer_target = args
        .buffer_target
        .parse::<BufferTarget>()
        .map_err(|e| CliError::Argument(e.to_string()))?;
    system.pbc_type = match args.pbc.as_str() {
        "none" => None,
        other => Some(
            other
                .parse::<PbcType>()
                .map_err(|e| CliError::Argument(e.to_string()))?,
        ),
    };
    system.water_box = args.water_box.clone();
    system.neutralize = !args.no_neutralize;
    system.counter_cation = args.cation.clone();
    system.counter_anion = args.anion.clone();
    system.add_ions = parse_ion_pairs(&args.add_ions)?;
    system.output_path = args.output_path.clone();
    system.output_prefix = args.output_prefix.clone();
    system.max_cycles = args.max_cycles;

    info!(
        template = %args.template.display(),
        target = %system.buffer_target,
        "starting tleap build"
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    system.build(&SystemTleap, &reporter)?;
    progress_handler.finish();

    println!(
        "Solvated system written to {}",
        args.output_path.join(format!("{}.prmtop", args.output_prefix)).display()
    );
    Ok(())
}

/// Turns the flat `--add-ions ION AMOUNT ...` list into typed pairs.
fn parse_ion_pairs(raw: &[String]) -> Result<Vec<(String, IonAmount)>> {
    if raw.len() % 2 != 0 {
        return Err(CliError::Argument(
            "--add-ions requires residue/amount pairs".to_string(),
        ));
    }
    raw.chunks_exact(2)
        .map(|pair| {
            let amount = pair[1]
                .parse::<IonAmount>()
                .map_err(|e| CliError::Argument(e.to_string()))?;
            Ok((pair[0].clone(), amount))
        })
        .collect()
}
