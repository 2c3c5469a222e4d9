use serde::{Deserialize, Serialize};

use crate::error::{AxisField, ValidationError};

/// Native description of one cube dimension as reported by the cube reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisDescriptor {
    pub name: String,
    pub unit: String,
    pub min: f32,
    pub max: f32,
    pub nsamples: i32,
}

impl AxisDescriptor {
    pub fn new(name: impl Into<String>, unit: impl Into<String>, min: f32, max: f32, nsamples: i32) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            min,
            max,
            nsamples,
        }
    }

    pub fn stepsize(&self) -> f32 {
        (self.max - self.min) / (self.nsamples - 1) as f32
    }
}

/// An axis of exactly one cube.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleAxis {
    dimension: usize,
    descriptor: AxisDescriptor,
}

impl SingleAxis {
    pub fn new(descriptor: AxisDescriptor, dimension: usize) -> Self {
        Self {
            dimension,
            descriptor,
        }
    }

    pub fn descriptor(&self) -> &AxisDescriptor {
        &self.descriptor
    }

    pub fn to_sample_position(&self, coordinate: f32) -> f32 {
        (coordinate - self.descriptor.min) / self.descriptor.stepsize()
    }
}

/// The intersection of two axes sharing name and stepsize.
///
/// Holds no sampling of its own: bounds are derived from the two sources on
/// every call.
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleAxis {
    a: SingleAxis,
    b: SingleAxis,
}

impl DoubleAxis {
    /// Validates name, then overlap, then stepsize.
    pub fn new(a: SingleAxis, b: SingleAxis) -> Result<Self, ValidationError> {
        let axis = Self { a, b };
        axis.assert_name()?;
        axis.assert_overlap()?;
        axis.assert_stepsize()?;
        Ok(axis)
    }

    pub fn a(&self) -> &SingleAxis {
        &self.a
    }

    pub fn b(&self) -> &SingleAxis {
        &self.b
    }

    fn min(&self) -> f32 {
        self.a.descriptor.min.max(self.b.descriptor.min)
    }

    fn max(&self) -> f32 {
        self.a.descriptor.max.min(self.b.descriptor.max)
    }

    fn stepsize(&self) -> f32 {
        self.a.descriptor.stepsize()
    }

    /// Rounded, so float noise in the bounds cannot drop the last sample.
    fn nsamples(&self) -> i32 {
        ((self.max() - self.min()) / self.stepsize()).round() as i32 + 1
    }

    /// Delegates to the source axis with the strictly larger `min`, `b` on ties.
    fn to_sample_position(&self, coordinate: f32) -> f32 {
        if self.a.descriptor.min > self.b.descriptor.min {
            self.a.to_sample_position(coordinate)
        } else {
            self.b.to_sample_position(coordinate)
        }
    }

    fn assert_name(&self) -> Result<(), ValidationError> {
        if self.a.descriptor.name != self.b.descriptor.name {
            return Err(ValidationError::AxisMismatch {
                axis: self.a.descriptor.name.clone(),
                field: AxisField::Name,
                lhs: self.a.descriptor.name.clone(),
                rhs: self.b.descriptor.name.clone(),
            });
        }
        Ok(())
    }

    fn assert_overlap(&self) -> Result<(), ValidationError> {
        if self.min() > self.max() {
            return Err(ValidationError::NoOverlap {
                axis: self.a.descriptor.name.clone(),
                min: self.min(),
                max: self.max(),
            });
        }
        Ok(())
    }

    fn assert_stepsize(&self) -> Result<(), ValidationError> {
        let (a, b) = (self.a.descriptor.stepsize(), self.b.descriptor.stepsize());
        if a != b {
            return Err(ValidationError::AxisMismatch {
                axis: self.a.descriptor.name.clone(),
                field: AxisField::Stepsize,
                lhs: format!("{a:.6}"),
                rhs: format!("{b:.6}"),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Axis {
    Single(SingleAxis),
    Double(DoubleAxis),
}

impl From<SingleAxis> for Axis {
    fn from(axis: SingleAxis) -> Self {
        Axis::Single(axis)
    }
}

impl From<DoubleAxis> for Axis {
    fn from(axis: DoubleAxis) -> Self {
        Axis::Double(axis)
    }
}

impl Axis {
    pub fn nsamples(&self) -> i32 {
        match self {
            Axis::Single(a) => a.descriptor.nsamples,
            Axis::Double(a) => a.nsamples(),
        }
    }

    pub fn min(&self) -> f32 {
        match self {
            Axis::Single(a) => a.descriptor.min,
            Axis::Double(a) => a.min(),
        }
    }

    pub fn max(&self) -> f32 {
        match self {
            Axis::Single(a) => a.descriptor.max,
            Axis::Double(a) => a.max(),
        }
    }

    pub fn stepsize(&self) -> f32 {
        match self {
            Axis::Single(a) => a.descriptor.stepsize(),
            Axis::Double(a) => a.stepsize(),
        }
    }

    pub fn unit(&self) -> &str {
        match self {
            Axis::Single(a) => &a.descriptor.unit,
            Axis::Double(a) => &a.a.descriptor.unit,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Axis::Single(a) => &a.descriptor.name,
            Axis::Double(a) => &a.a.descriptor.name,
        }
    }

    /// Storage dimension of the axis. For a double axis, that of the first cube.
    pub fn dimension(&self) -> usize {
        match self {
            Axis::Single(a) => a.dimension,
            Axis::Double(a) => a.a.dimension,
        }
    }

    /// Valid domain is `[min - step/2, max + step/2)`.
    pub fn inrange(&self, coordinate: f32) -> bool {
        let half = 0.5 * self.stepsize();
        (self.min() - half) <= coordinate && (self.max() + half) > coordinate
    }

    pub fn to_sample_position(&self, coordinate: f32) -> f32 {
        match self {
            Axis::Single(a) => a.to_sample_position(coordinate),
            Axis::Double(a) => a.to_sample_position(coordinate),
        }
    }

    /// Compares sample count, min, max, stepsize, unit and name, in that order,
    /// and reports the first difference. Storage dimension is not compared.
    pub fn assert_equal(&self, other: &Axis) -> Result<(), ValidationError> {
        let mismatch = |field, lhs: String, rhs: String| ValidationError::AxisMismatch {
            axis: self.name().to_string(),
            field,
            lhs,
            rhs,
        };

        if self.nsamples() != other.nsamples() {
            return Err(mismatch(
                AxisField::NumberOfSamples,
                self.nsamples().to_string(),
                other.nsamples().to_string(),
            ));
        }
        if self.min() != other.min() {
            return Err(mismatch(
                AxisField::Min,
                format!("{:.2}", self.min()),
                format!("{:.2}", other.min()),
            ));
        }
        if self.max() != other.max() {
            return Err(mismatch(
                AxisField::Max,
                format!("{:.2}", self.max()),
                format!("{:.2}", other.max()),
            ));
        }
        if self.stepsize() != other.stepsize() {
            return Err(mismatch(
                AxisField::Stepsize,
                format!("{:.6}", self.stepsize()),
                format!("{:.6}", other.stepsize()),
            ));
        }
        if self.unit() != other.unit() {
            return Err(mismatch(
                AxisField::Unit,
                self.unit().to_string(),
                other.unit().to_string(),
            ));
        }
        if self.name() != other.name() {
            return Err(mismatch(
                AxisField::Name,
                self.name().to_string(),
                other.name().to_string(),
            ));
        }
        Ok(())
    }
}
