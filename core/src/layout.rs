use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    axis::AxisDescriptor,
    error::ValidationError,
    geom::{Point, Vec3, Vec3I},
};

/// Maximum distance, in samples, the origin of one cube may be off the voxel
/// grid of the other.
pub const OFFSET_TOLERANCE: f32 = 1e-5;

/// Maps annotation coordinates to world coordinates:
/// `world = origin + inline * inline_spacing + crossline * crossline_spacing`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurveyCoordinateSystem {
    pub origin: Point,
    pub inline_spacing: Point,
    pub crossline_spacing: Point,
}

impl Default for SurveyCoordinateSystem {
    fn default() -> Self {
        Self {
            origin: Point::new(0.0, 0.0),
            inline_spacing: Point::new(1.0, 0.0),
            crossline_spacing: Point::new(0.0, 1.0),
        }
    }
}

/// Descriptive strings stored alongside a cube.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeInfo {
    pub crs: String,
    pub input_filename: String,
    pub import_time_stamp: String,
}

/// Native layout of one cube, one descriptor per storage dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub axes: Vec<AxisDescriptor>,
    #[serde(default)]
    pub survey: SurveyCoordinateSystem,
    #[serde(default)]
    pub info: CubeInfo,
}

impl Layout {
    pub fn new(axes: Vec<AxisDescriptor>) -> Self {
        Self {
            axes,
            survey: SurveyCoordinateSystem::default(),
            info: CubeInfo::default(),
        }
    }

    pub fn with_survey(mut self, survey: SurveyCoordinateSystem) -> Self {
        self.survey = survey;
        self
    }

    pub fn with_info(mut self, info: CubeInfo) -> Self {
        self.info = info;
        self
    }

    pub fn dimensionality(&self) -> usize {
        self.axes.len()
    }

    pub fn axis(&self, dimension: usize) -> Option<&AxisDescriptor> {
        self.axes.get(dimension)
    }

    /// Number of samples per storage dimension. Only meaningful for 3D layouts.
    pub fn extent(&self) -> Vec3I {
        Vec3::new(0usize, 1, 2).map(|d| self.axis(d).map_or(1, |a| a.nsamples))
    }
}

/// The sampling grid shared by two cubes, with the voxel offset from each
/// cube's origin to the intersection origin.
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleLayout {
    axes: [AxisDescriptor; 3],
    offset_a: Vec3I,
    offset_b: Vec3I,
}

impl DoubleLayout {
    #[instrument(skip_all)]
    pub fn reconcile(a: &Layout, b: &Layout) -> Result<Self, ValidationError> {
        for layout in [a, b] {
            if layout.dimensionality() != 3 {
                return Err(ValidationError::Dimensionality {
                    got: layout.dimensionality(),
                });
            }
        }

        let mut offset_a = Vec3I::ZERO;
        let mut offset_b = Vec3I::ZERO;
        let mut axes = Vec::with_capacity(3);

        for (dimension, (da, db)) in a.axes.iter().zip(&b.axes).enumerate() {
            let step_a = da.stepsize();
            let step_b = db.stepsize();
            if step_a != step_b {
                return Err(ValidationError::StepsizeMismatch {
                    dimension: da.name.clone(),
                    a: step_a,
                    b: step_b,
                });
            }

            let offset = (db.min - da.min) / step_a;
            if (offset.round() - offset).abs() > OFFSET_TOLERANCE {
                return Err(ValidationError::OffsetMismatch {
                    dimension: da.name.clone(),
                    offset,
                });
            }

            let min = da.min.max(db.min);
            let max = da.max.min(db.max);
            if min > max {
                return Err(ValidationError::NoOverlap {
                    axis: da.name.clone(),
                    min,
                    max,
                });
            }

            let nsamples = 1 + ((max - min) / step_a).round() as i32;
            offset_a[dimension] = ((min - da.min) / step_a).round() as i32;
            offset_b[dimension] = ((min - db.min) / step_b).round() as i32;

            if da.name != db.name {
                return Err(ValidationError::DescriptorMismatch {
                    dimension,
                    field: "name",
                    a: da.name.clone(),
                    b: db.name.clone(),
                });
            }
            if da.unit != db.unit {
                return Err(ValidationError::DescriptorMismatch {
                    dimension,
                    field: "unit",
                    a: da.unit.clone(),
                    b: db.unit.clone(),
                });
            }

            debug!(
                dimension,
                name = %da.name,
                min,
                max,
                nsamples,
                offset_a = offset_a[dimension],
                offset_b = offset_b[dimension],
                "reconciled dimension"
            );

            axes.push(AxisDescriptor::new(
                da.name.clone(),
                da.unit.clone(),
                min,
                max,
                nsamples,
            ));
        }

        let axes: [AxisDescriptor; 3] = axes
            .try_into()
            .map_err(|v: Vec<_>| ValidationError::Dimensionality { got: v.len() })?;

        Ok(Self {
            axes,
            offset_a,
            offset_b,
        })
    }

    pub fn dimensionality(&self) -> usize {
        self.axes.len()
    }

    pub fn axis(&self, dimension: usize) -> Option<&AxisDescriptor> {
        self.axes.get(dimension)
    }

    pub fn extent(&self) -> Vec3I {
        Vec3::new(0usize, 1, 2).map(|d| self.axes[d].nsamples)
    }

    /// Voxels from cube A's origin to the intersection origin.
    pub fn offset_a(&self) -> Vec3I {
        self.offset_a
    }

    /// Voxels from cube B's origin to the intersection origin.
    pub fn offset_b(&self) -> Vec3I {
        self.offset_b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(il: (f32, f32, i32), xl: (f32, f32, i32), s: (f32, f32, i32)) -> Layout {
        Layout::new(vec![
            AxisDescriptor::new("Sample", "ms", s.0, s.1, s.2),
            AxisDescriptor::new("Crossline", "unitless", xl.0, xl.1, xl.2),
            AxisDescriptor::new("Inline", "unitless", il.0, il.1, il.2),
        ])
    }

    fn regular() -> Layout {
        layout((3.0, 24.0, 8), (2.0, 16.0, 8), (4.0, 128.0, 32))
    }

    fn shift_4() -> Layout {
        layout((15.0, 36.0, 8), (10.0, 24.0, 8), (20.0, 144.0, 32))
    }

    #[test]
    fn identity() {
        let a = regular();
        let double = DoubleLayout::reconcile(&a, &a).unwrap();
        for d in 0..3 {
            assert_eq!(double.axis(d), a.axis(d));
        }
        assert_eq!(double.offset_a(), Vec3I::ZERO);
        assert_eq!(double.offset_b(), Vec3I::ZERO);
    }

    #[test]
    fn shifted_cube() {
        let double = DoubleLayout::reconcile(&regular(), &shift_4()).unwrap();

        let sample = double.axis(0).unwrap();
        assert_eq!(sample.min, 20.0);
        assert_eq!(sample.max, 128.0);
        assert_eq!(sample.nsamples, 28);
        assert_eq!(sample.stepsize(), 4.0);

        let iline = double.axis(2).unwrap();
        assert_eq!((iline.min, iline.max, iline.nsamples), (15.0, 24.0, 4));

        assert_eq!(double.offset_a(), Vec3::new(4, 4, 4));
        assert_eq!(double.offset_b(), Vec3I::ZERO);
        assert_eq!(double.extent(), Vec3::new(28, 4, 4));
    }

    #[test]
    fn shifted_cube_reversed() {
        let double = DoubleLayout::reconcile(&shift_4(), &regular()).unwrap();
        assert_eq!(double.offset_a(), Vec3I::ZERO);
        assert_eq!(double.offset_b(), Vec3::new(4, 4, 4));
        assert_eq!(double.axis(0).unwrap().nsamples, 28);
    }

    #[test]
    fn inline_shift_only() {
        let k = 3;
        let b = layout((3.0 + 3.0 * k as f32, 24.0 + 3.0 * k as f32, 8), (2.0, 16.0, 8), (4.0, 128.0, 32));
        let double = DoubleLayout::reconcile(&regular(), &b).unwrap();
        assert_eq!(double.axis(2).unwrap().nsamples, 8 - k);
        assert_eq!(double.offset_a(), Vec3::new(0, 0, k));
        assert_eq!(double.offset_b(), Vec3I::ZERO);
    }

    #[test]
    fn stepsize_mismatch_names_dimension() {
        let b = layout((3.0, 24.0, 8), (2.0, 16.0, 15), (4.0, 128.0, 32));
        let err = DoubleLayout::reconcile(&regular(), &b).unwrap_err();
        assert_eq!(
            err,
            ValidationError::StepsizeMismatch {
                dimension: "Crossline".to_string(),
                a: 2.0,
                b: 1.0,
            }
        );
    }

    #[test]
    fn offset_off_grid() {
        let b = layout((4.0, 25.0, 8), (2.0, 16.0, 8), (4.0, 128.0, 32));
        let err = DoubleLayout::reconcile(&regular(), &b).unwrap_err();
        assert!(matches!(err, ValidationError::OffsetMismatch { ref dimension, .. } if dimension == "Inline"));
    }

    #[test]
    fn near_integer_offset_is_aligned() {
        // 2^-17 off the grid, inside the tolerance. Every bound is exact in f32.
        let e = 2f32.powi(-17);
        let a = layout((3.0, 24.0, 8), (2.0, 16.0, 8), (0.0, 9.0, 10));
        let b = layout((3.0, 24.0, 8), (2.0, 16.0, 8), (3.0 + e, 12.0 + e, 10));
        let double = DoubleLayout::reconcile(&a, &b).unwrap();
        assert_eq!(double.offset_a(), Vec3::new(3, 0, 0));
        assert_eq!(double.offset_b(), Vec3I::ZERO);
        assert_eq!(double.axis(0).unwrap().nsamples, 7);
    }

    #[test]
    fn float_noise_with_fractional_step() {
        let a = layout((3.0, 24.0, 8), (2.0, 16.0, 8), (0.0, 0.089999996, 10));
        let b = layout((3.0, 24.0, 8), (2.0, 16.0, 8), (0.03, 0.12, 10));
        let double = DoubleLayout::reconcile(&a, &b).unwrap();
        assert_eq!(double.offset_a(), Vec3::new(3, 0, 0));
        assert_eq!(double.offset_b(), Vec3I::ZERO);
        assert_eq!(double.extent(), Vec3::new(7, 8, 8));
    }

    #[test]
    fn offset_just_outside_tolerance() {
        let e = 2f32.powi(-16);
        assert!(e > OFFSET_TOLERANCE);
        let a = layout((3.0, 24.0, 8), (2.0, 16.0, 8), (0.0, 9.0, 10));
        let b = layout((3.0, 24.0, 8), (2.0, 16.0, 8), (3.0 + e, 12.0 + e, 10));
        let err = DoubleLayout::reconcile(&a, &b).unwrap_err();
        assert!(matches!(err, ValidationError::OffsetMismatch { ref dimension, .. } if dimension == "Sample"));
    }

    #[test]
    fn no_overlap_reports_bounds() {
        let b = layout((27.0, 48.0, 8), (2.0, 16.0, 8), (4.0, 128.0, 32));
        let err = DoubleLayout::reconcile(&regular(), &b).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NoOverlap {
                axis: "Inline".to_string(),
                min: 27.0,
                max: 24.0,
            }
        );
    }

    #[test]
    fn unit_mismatch() {
        let mut b = regular();
        b.axes[0].unit = "m".to_string();
        let err = DoubleLayout::reconcile(&regular(), &b).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::DescriptorMismatch {
                dimension: 0,
                field: "unit",
                ..
            }
        ));
    }

    #[test]
    fn rejects_two_dimensional() {
        let mut b = regular();
        b.axes.pop();
        let err = DoubleLayout::reconcile(&regular(), &b).unwrap_err();
        assert_eq!(err, ValidationError::Dimensionality { got: 2 });
    }
}
