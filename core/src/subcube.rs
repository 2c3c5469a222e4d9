use serde::{Deserialize, Serialize};

use crate::{
    axis::Axis,
    direction::{CoordinateSystem, Direction},
    error::{Error, Result, ValidationError},
    geom::{Bounds3I, Vec3I},
    metadata::MetadataHandle,
};

/// Inclusive line range along one axis, in the coordinate system of its
/// direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bound {
    pub direction: Direction,
    pub lower: i32,
    pub upper: i32,
}

impl Bound {
    pub fn new(direction: Direction, lower: i32, upper: i32) -> Self {
        Self {
            direction,
            lower,
            upper,
        }
    }
}

/// A box of voxels in storage-dimension order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubCube {
    pub bounds: Bounds3I,
}

impl SubCube {
    /// Spans the full extent of all three axes.
    pub fn new(metadata: &MetadataHandle) -> Self {
        Self {
            bounds: Bounds3I::new(Vec3I::ZERO, metadata.extent()),
        }
    }

    pub fn constrain(&mut self, metadata: &MetadataHandle, bounds: &[Bound]) -> Result<()> {
        for bound in bounds {
            let system = bound.direction.coordinate_system();
            let axis = metadata.get_axis(bound.direction);

            let lower = to_voxel(axis, bound.lower, system)?;
            let upper = to_voxel(axis, bound.upper, system)?;

            self.bounds.min[axis.dimension()] = lower;
            self.bounds.max[axis.dimension()] = upper + 1;
        }
        Ok(())
    }

    /// Narrows `axis` to the single voxel at `lineno`.
    pub fn set_slice(&mut self, axis: &Axis, lineno: i32, system: CoordinateSystem) -> Result<()> {
        let voxel = to_voxel(axis, lineno, system)?;
        self.bounds.min[axis.dimension()] = voxel;
        self.bounds.max[axis.dimension()] = voxel + 1;
        Ok(())
    }
}

pub fn to_voxel(axis: &Axis, lineno: i32, system: CoordinateSystem) -> Result<i32> {
    match system {
        CoordinateSystem::Annotation => Ok(annotation_to_voxel(axis, lineno)?),
        CoordinateSystem::Index => Ok(index_to_voxel(axis, lineno)?),
        CoordinateSystem::Cdp => Err(Error::Unhandled("coordinate system")),
    }
}

fn annotation_to_voxel(axis: &Axis, lineno: i32) -> Result<i32, ValidationError> {
    let (min, max, step) = (axis.min(), axis.max(), axis.stepsize());
    let voxel = (lineno as f32 - min) / step;

    if (lineno as f32) < min || (lineno as f32) > max || voxel.floor() != voxel {
        return Err(ValidationError::InvalidLineno {
            lineno,
            range: format!("[{min:.2}:{max:.2}:{step:.2}]"),
        });
    }
    Ok(voxel as i32)
}

fn index_to_voxel(axis: &Axis, lineno: i32) -> Result<i32, ValidationError> {
    let max = axis.nsamples() - 1;
    if lineno < 0 || lineno > max {
        return Err(ValidationError::InvalidLineno {
            lineno,
            range: format!("[0:{max}:1]"),
        });
    }
    Ok(lineno)
}
