//! Defines command-line interface options using `clap` for the aggregation tool.

use crate::pipeline::AggregateOptions;
use crate::statistics::{AggregationMode, NormalizationMode, DEFAULT_BINS};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Aggregates co-registered input volumes into a single output volume
///
/// The aggregation function is evaluated independently at every voxel over
/// the values of all input volumes at that voxel. The inputs have to be
/// defined on the same grid.
#[derive(Parser, Debug)]
#[command(name = "aggregate-volumes", version, about, long_about = None)]
pub struct Args {
    /// Aggregation function: mean, median, stddev, gini, theil, entropy-index (ge) or entropy
    #[arg(value_parser = parse_mode)]
    pub mode: AggregationMode,

    /// NetCDF files of at least two input volumes
    #[arg(required = true, num_args = 2..)]
    pub inputs: Vec<PathBuf>,

    /// Path of the voxel-wise aggregate volume
    #[arg(short, long)]
    pub output: PathBuf,

    /// Name of the NetCDF variable holding the volume in every input file
    #[arg(long)]
    pub variable: Option<String>,

    /// Background value of voxels ignored during normalization (default: NaN)
    #[arg(long, allow_negative_numbers = true)]
    pub padding: Option<f64>,

    /// Input intensity normalization: none, mean, median, z-score or unit
    #[arg(
        long,
        visible_alias = "normalize",
        value_parser = parse_normalization,
        num_args = 0..=1,
        default_value = "none",
        default_missing_value = "z-score"
    )]
    pub normalization: NormalizationMode,

    /// Alpha of the generalized entropy index (0: mean log deviation, 1: Theil, 2: half squared CV)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub alpha: f64,

    /// Number of bins used for histogram based aggregation functions (at most 65536)
    #[arg(long, default_value_t = DEFAULT_BINS)]
    pub bins: usize,

    /// Use Parzen window based histogram estimation [yes|no|on|off]
    #[arg(
        long,
        action = ArgAction::Set,
        value_parser = parse_switch,
        num_args = 0..=1,
        default_value = "off",
        default_missing_value = "on"
    )]
    pub parzen: bool,

    /// Exclude every voxel at which any input equals the padding, instead of only
    /// voxels at which all inputs do [yes|no|on|off]
    #[arg(
        long,
        action = ArgAction::Set,
        value_parser = parse_switch,
        num_args = 0..=1,
        default_value = "off",
        default_missing_value = "on"
    )]
    pub intersection: bool,

    /// Number of threads to use for parallel processing. Defaults to number of CPU cores.
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Increase output verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Pipeline options selected on the command line
    #[must_use]
    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions::new(self.mode)
            .with_normalization(self.normalization)
            .with_padding(self.padding.unwrap_or(f64::NAN))
            .with_alpha(self.alpha)
            .with_bins(self.bins)
            .with_parzen(self.parzen)
            .with_intersection(self.intersection)
    }
}

fn parse_mode(s: &str) -> Result<AggregationMode, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn parse_normalization(s: &str) -> Result<NormalizationMode, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn parse_switch(s: &str) -> Result<bool, String> {
    match s.to_lowercase().as_str() {
        "yes" | "on" | "true" | "1" => Ok(true),
        "no" | "off" | "false" | "0" => Ok(false),
        _ => Err(format!("Invalid switch value '{s}': expected yes, no, on or off")),
    }
}
