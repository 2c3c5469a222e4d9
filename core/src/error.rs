use std::fmt;

use miette::Diagnostic;
use ndarray::ShapeError;
use thiserror::Error;

/// Errors reported by a cube-reader collaborator, type-erased.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Which axis property differed in [`crate::axis::Axis::assert_equal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisField {
    NumberOfSamples,
    Min,
    Max,
    Stepsize,
    Unit,
    Name,
}

impl fmt::Display for AxisField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AxisField::NumberOfSamples => "number of samples",
            AxisField::Min => "min value",
            AxisField::Max => "max value",
            AxisField::Stepsize => "stepsize",
            AxisField::Unit => "unit",
            AxisField::Name => "name",
        })
    }
}

/// Rejections raised before any I/O is issued.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Axis: {axis}: Mismatch in {field}: {lhs} != {rhs}")]
    #[diagnostic(code(seiscube::axis::mismatch))]
    AxisMismatch {
        axis: String,
        field: AxisField,
        lhs: String,
        rhs: String,
    },

    #[error("Axis: {axis}: No data overlap: min = {min:.6} and max = {max:.6}")]
    #[diagnostic(code(seiscube::axis::no_overlap))]
    NoOverlap { axis: String, min: f32, max: f32 },

    #[error("Step size mismatch in axis: {dimension}: {a:.6} != {b:.6}")]
    #[diagnostic(code(seiscube::layout::stepsize_mismatch))]
    StepsizeMismatch { dimension: String, a: f32, b: f32 },

    #[error("Offset mismatch in axis: {dimension}: offset {offset} is not on the voxel grid")]
    #[diagnostic(
        code(seiscube::layout::offset_mismatch),
        help("Both cubes must be sampled on the same grid along every axis")
    )]
    OffsetMismatch { dimension: String, offset: f32 },

    #[error("Dimension {field} mismatch for dimension: {dimension}: {a} != {b}")]
    #[diagnostic(code(seiscube::layout::descriptor_mismatch))]
    DescriptorMismatch {
        dimension: usize,
        field: &'static str,
        a: String,
        b: String,
    },

    #[error("Unsupported cube, expected 3 dimensions, got {got}")]
    #[diagnostic(code(seiscube::metadata::dimensionality))]
    Dimensionality { got: usize },

    #[error("Requested axis not found under names {} in cube", names.join(", "))]
    #[diagnostic(code(seiscube::metadata::missing_axis))]
    MissingAxis { names: Vec<&'static str> },

    #[error("{}", too_few_samples(axis, *got, *pair))]
    #[diagnostic(code(seiscube::metadata::too_few_samples))]
    TooFewSamples {
        axis: &'static str,
        got: i32,
        pair: bool,
    },

    #[error("Coordinate reference system (CRS) mismatch: {a} versus {b}")]
    #[diagnostic(code(seiscube::metadata::crs_mismatch))]
    CrsMismatch { a: String, b: String },

    #[error("Invalid lineno: {lineno}, valid range: {range}")]
    #[diagnostic(code(seiscube::subcube::invalid_lineno))]
    InvalidLineno { lineno: i32, range: String },

    #[error("{what} out of range: {index} not in [0, {len})")]
    #[diagnostic(code(seiscube::out_of_range))]
    OutOfRange {
        what: &'static str,
        index: f64,
        len: usize,
    },

    #[error("Buffer size mismatch: expected {expected} bytes, got {got}")]
    #[diagnostic(code(seiscube::buffer_size))]
    BufferSize { expected: usize, got: usize },
}

fn too_few_samples(axis: &str, got: i32, pair: bool) -> String {
    if pair {
        format!(
            "Unsupported cube pair, expect that the intersection contains at least two {axis}s, got {got}"
        )
    } else {
        format!("Unsupported cube, expect at least two {axis}s, got {got}")
    }
}

/// Identifies one side of a double read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cube {
    A,
    B,
}

impl fmt::Display for Cube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cube::A => f.write_str("A"),
            Cube::B => f.write_str("B"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Io,
    Programming,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Could not open cube {url}: {source}")]
    Open {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to read from cube{}: {source}", cube.map(|c| format!(" {c}")).unwrap_or_default())]
    Io {
        cube: Option<Cube>,
        #[source]
        source: BoxError,
    },

    #[error("Unhandled {0}")]
    Unhandled(&'static str),

    #[error("Buffer has unexpected shape: {0}")]
    Shape(#[from] ShapeError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Open { .. } | Error::Io { .. } => ErrorKind::Io,
            Error::Unhandled(_) | Error::Shape(_) => ErrorKind::Programming,
        }
    }

    pub(crate) fn io(cube: Option<Cube>, source: impl Into<BoxError>) -> Self {
        Error::Io {
            cube,
            source: source.into(),
        }
    }
}
