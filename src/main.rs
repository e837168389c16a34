//! Entry point for the aggregate-volumes application.
//! Handles CLI parsing, volume loading, the aggregation run and writing the result.

use clap::Parser;
use netcdf::open;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use voxel_aggregate::cli::Args;
use voxel_aggregate::netcdf_io::{output_variable_name, read_volume, volume_variable, VolumeWriter};
use voxel_aggregate::parallel::{get_parallel_info, ParallelConfig};
use voxel_aggregate::pipeline::aggregate_volumes;

fn setup_logging(verbose: u8) -> Result<(), Box<dyn std::error::Error>> {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args = Args::parse();
    setup_logging(args.verbose)?;

    ParallelConfig::new(args.threads).setup_global_pool()?;
    if args.verbose > 0 {
        get_parallel_info().log_info();
    }

    let options = args.aggregate_options();
    // Validate before reading any data
    options.aggregation_function()?;

    // The first input provides the output metadata
    let reference = open(&args.inputs[0])?;
    let var_name = volume_variable(&reference, args.variable.as_deref())?.name();

    info!("Reading {} volumes...", args.inputs.len());
    let mut volumes = Vec::with_capacity(args.inputs.len());
    volumes.push(read_volume(
        &reference,
        Some(var_name.as_str()),
        &args.inputs[0].display().to_string(),
    )?);
    for path in &args.inputs[1..] {
        let file = open(path)?;
        volumes.push(read_volume(
            &file,
            Some(var_name.as_str()),
            &path.display().to_string(),
        )?);
    }

    let input_count = volumes.len();
    let outcome = aggregate_volumes(volumes, &options)?;
    info!(
        foreground = outcome.foreground_voxels,
        background = outcome.background_voxels,
        "Aggregated {} voxels",
        outcome.output.number_of_voxels()
    );

    let new_var_name = output_variable_name(&var_name, &options);
    let writer = VolumeWriter::new(&reference, &args.output);
    writer.write_output(&outcome.output, &new_var_name, &var_name, &options, input_count)?;
    info!("✅ Saved {} to {}", new_var_name, args.output.display());

    Ok(())
}
