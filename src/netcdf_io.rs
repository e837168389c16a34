//! NetCDF I/O for input and output volumes
//!
//! A volume is one NetCDF variable; its dimension names and lengths form the
//! geometric attributes compared across inputs. The aggregated volume is
//! written to a new file with the reference variable's dimensions and
//! attributes, plus a record of how it was produced.

use crate::errors::{AggregateError, Result};
use crate::pipeline::AggregateOptions;
use crate::statistics::AggregationMode;
use crate::volume::{OutputVolume, Volume, VolumeAttributes};
use chrono::Utc;
use netcdf::{create, File, Variable};
use std::{fs, path::Path};
use tracing::debug;

/// Name of the variable holding the volume samples
///
/// Uses `var_name` if given, otherwise the first variable with at least one
/// dimension that is not a coordinate variable.
///
/// # Errors
///
/// Returns [`AggregateError::VariableNotFound`] if no such variable exists.
pub fn volume_variable<'f>(file: &'f File, var_name: Option<&str>) -> Result<Variable<'f>> {
    if let Some(name) = var_name {
        return file
            .variable(name)
            .ok_or_else(|| AggregateError::VariableNotFound {
                var: name.to_string(),
            });
    }
    file.variables()
        .find(|var| {
            let dims = var.dimensions();
            !dims.is_empty() && !(dims.len() == 1 && dims[0].name() == var.name())
        })
        .ok_or_else(|| AggregateError::VariableNotFound {
            var: "<any data variable>".to_string(),
        })
}

/// Reads a NetCDF variable as a volume labelled `label`
///
/// # Errors
///
/// Returns an error if the variable is missing or cannot be read as `f64`.
pub fn read_volume(file: &File, var_name: Option<&str>, label: &str) -> Result<Volume> {
    let var = volume_variable(file, var_name)?;

    let dimensions: Vec<String> = var
        .dimensions()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let data = var.get_values::<f64, _>(..)?;

    debug!(volume = label, variable = %var.name(), ?shape, "Loaded volume");
    Volume::new(label, data, VolumeAttributes::new(dimensions, shape))
}

/// Opens `path` and reads its volume variable
///
/// # Errors
///
/// Returns an error if the file cannot be opened or the variable read.
pub fn read_volume_from_path(path: &Path, var_name: Option<&str>) -> Result<Volume> {
    let file = netcdf::open(path)?;
    read_volume(&file, var_name, &path.display().to_string())
}

/// Writer for aggregated volumes
pub struct VolumeWriter<'a> {
    reference_file: &'a File,
    output_path: &'a Path,
}

impl<'a> VolumeWriter<'a> {
    /// Create a writer copying metadata from `reference_file`
    pub fn new(reference_file: &'a File, output_path: &'a Path) -> Self {
        Self {
            reference_file,
            output_path,
        }
    }

    /// Write the aggregated volume as `var_name`
    ///
    /// Attributes of `original_var_name` in the reference file are copied,
    /// except `_FillValue`, since the output holds no fill values.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be created or the reference
    /// variable does not exist.
    pub fn write_output(
        &self,
        output: &OutputVolume,
        var_name: &str,
        original_var_name: &str,
        options: &AggregateOptions,
        input_count: usize,
    ) -> Result<()> {
        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }

        let orig_var = self
            .reference_file
            .variable(original_var_name)
            .ok_or_else(|| AggregateError::VariableNotFound {
                var: original_var_name.to_string(),
            })?;

        let mut file = create(self.output_path)?;

        let attributes = output.attributes();
        for (dim_name, &dim_len) in attributes.dimensions.iter().zip(&attributes.shape) {
            file.add_dimension(dim_name, dim_len)?;
        }

        let dim_refs: Vec<&str> = attributes.dimensions.iter().map(|s| s.as_str()).collect();
        let mut new_var = file.add_variable::<f32>(var_name, &dim_refs)?;

        let data = output.to_array()?;
        new_var.put(data.view(), ..)?;

        let mut copied = 0;
        for attr in orig_var.attributes().filter(|a| a.name() != "_FillValue") {
            new_var.put_attribute(attr.name(), attr.value()?)?;
            copied += 1;
        }
        debug!(copied, variable = var_name, "Copied reference attributes");

        new_var.put_attribute("aggregation_mode", options.mode.as_str())?;
        new_var.put_attribute("normalization", options.normalization.as_str())?;
        new_var.put_attribute("input_count", i32::try_from(input_count).unwrap_or(i32::MAX))?;
        if options.mode == AggregationMode::EntropyIndex {
            new_var.put_attribute("alpha", options.alpha)?;
        }

        file.add_attribute(
            "history",
            format!(
                "Created by aggregate-volumes ({}) on {}",
                options.mode,
                Utc::now().to_rfc3339()
            ),
        )?;

        Ok(())
    }
}

/// Output variable name for an aggregation of `var_name`
#[must_use]
pub fn output_variable_name(var_name: &str, options: &AggregateOptions) -> String {
    format!("{var_name}_{}", options.mode.as_str())
}
