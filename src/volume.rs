//! In-memory volumes exchanged between I/O and the aggregation pipeline
//!
//! A [`Volume`] is a flat, row-major buffer of `f64` samples together with
//! the grid it lives on ([`VolumeAttributes`]) and a background value. The
//! pipeline never looks inside the attributes beyond an equality check.

use crate::errors::{AggregateError, Result};
use ndarray::{ArrayD, IxDyn};

/// Geometric attributes shared by all volumes of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeAttributes {
    /// Ordered dimension names, outermost first
    pub dimensions: Vec<String>,
    /// Length of each dimension
    pub shape: Vec<usize>,
}

impl VolumeAttributes {
    /// Create attributes from dimension names and lengths
    #[must_use]
    pub fn new(dimensions: Vec<String>, shape: Vec<usize>) -> Self {
        Self { dimensions, shape }
    }

    /// Attributes with generated dimension names `dim0`, `dim1`, ...
    #[must_use]
    pub fn from_shape(shape: &[usize]) -> Self {
        let dimensions = (0..shape.len()).map(|i| format!("dim{i}")).collect();
        Self::new(dimensions, shape.to_vec())
    }

    /// Total number of voxels on this grid
    #[must_use]
    pub fn number_of_voxels(&self) -> usize {
        self.shape.iter().product()
    }
}

/// One input intensity volume
#[derive(Debug, Clone)]
pub struct Volume {
    name: String,
    data: Vec<f64>,
    attributes: VolumeAttributes,
    background: f64,
}

impl Volume {
    /// Wrap a flat sample buffer. The background value starts out as NaN.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer length does not match the attributes.
    pub fn new(name: impl Into<String>, data: Vec<f64>, attributes: VolumeAttributes) -> Result<Self> {
        // Validates the length against the shape
        let data = ArrayD::from_shape_vec(IxDyn(&attributes.shape), data)?.into_raw_vec();
        Ok(Self {
            name: name.into(),
            data,
            attributes,
            background: f64::NAN,
        })
    }

    /// Build a volume from an n-dimensional array with the given dimension names
    ///
    /// # Errors
    ///
    /// Returns an error if the number of names differs from the array rank.
    pub fn from_array(name: impl Into<String>, array: ArrayD<f64>, dimensions: Vec<String>) -> Result<Self> {
        if dimensions.len() != array.ndim() {
            return Err(AggregateError::invalid_argument(format!(
                "{} dimension names given for an array with {} dimensions",
                dimensions.len(),
                array.ndim()
            )));
        }
        let shape = array.shape().to_vec();
        let data = array.as_standard_layout().into_owned().into_raw_vec();
        Self::new(name, data, VolumeAttributes::new(dimensions, shape))
    }

    /// Label used in diagnostics, usually the source file name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn attributes(&self) -> &VolumeAttributes {
        &self.attributes
    }

    #[must_use]
    pub fn number_of_voxels(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn get(&self, voxel: usize) -> f64 {
        self.data[voxel]
    }

    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.data
    }

    pub fn samples_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    #[must_use]
    pub fn background_value(&self) -> f64 {
        self.background
    }

    pub fn set_background_value(&mut self, value: f64) {
        self.background = value;
    }

    /// Copy the samples into an n-dimensional array
    ///
    /// # Errors
    ///
    /// Returns an error if the stored shape is inconsistent with the samples.
    pub fn to_array(&self) -> Result<ArrayD<f64>> {
        Ok(ArrayD::from_shape_vec(
            IxDyn(&self.attributes.shape),
            self.data.clone(),
        )?)
    }
}

/// Result volume of an aggregation run
#[derive(Debug, Clone)]
pub struct OutputVolume {
    data: Vec<f32>,
    attributes: VolumeAttributes,
    background: f32,
}

impl OutputVolume {
    /// Output grid filled with a constant value
    #[must_use]
    pub fn filled(attributes: VolumeAttributes, value: f32, background: f32) -> Self {
        let data = vec![value; attributes.number_of_voxels()];
        Self {
            data,
            attributes,
            background,
        }
    }

    #[must_use]
    pub fn attributes(&self) -> &VolumeAttributes {
        &self.attributes
    }

    #[must_use]
    pub fn number_of_voxels(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn get(&self, voxel: usize) -> f32 {
        self.data[voxel]
    }

    pub fn put(&mut self, voxel: usize, value: f32) {
        self.data[voxel] = value;
    }

    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.data
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    #[must_use]
    pub fn background_value(&self) -> f32 {
        self.background
    }

    /// Whether an output voxel is still to be computed
    #[must_use]
    pub fn is_foreground(&self, voxel: usize) -> bool {
        is_output_foreground(self.data[voxel], self.background)
    }

    /// Convert to an n-dimensional array for writing
    ///
    /// # Errors
    ///
    /// Returns an error if the stored shape is inconsistent with the samples.
    pub fn into_array(self) -> Result<ArrayD<f32>> {
        Ok(ArrayD::from_shape_vec(IxDyn(&self.attributes.shape), self.data)?)
    }

    /// Borrow-friendly variant of [`OutputVolume::into_array`]
    ///
    /// # Errors
    ///
    /// Returns an error if the stored shape is inconsistent with the samples.
    pub fn to_array(&self) -> Result<ArrayD<f32>> {
        self.clone().into_array()
    }
}

/// Output foreground predicate shared with the parallel aggregator
#[inline]
pub(crate) fn is_output_foreground(value: f32, background: f32) -> bool {
    !value.is_nan() && value != background
}
