use tracing::instrument;

use crate::{
    axis::{Axis, DoubleAxis, SingleAxis},
    direction::Direction,
    error::ValidationError,
    geom::{grid::Grid, Point, Vec3, Vec3F, Vec3I},
    layout::{CubeInfo, DoubleLayout, Layout, SurveyCoordinateSystem},
};

const INLINE_NAMES: &[&str] = &["Inline"];
const CROSSLINE_NAMES: &[&str] = &["Crossline"];
const SAMPLE_NAMES: &[&str] = &["Sample", "Depth", "Time"];

#[derive(Debug, Clone, PartialEq)]
pub struct SingleMetadata {
    layout: Layout,
    /// Storage dimension of the inline, crossline and sample axis.
    dimensions: [usize; 3],
    iline: Axis,
    xline: Axis,
    sample: Axis,
}

impl SingleMetadata {
    #[instrument(skip_all)]
    pub fn new(layout: Layout) -> Result<Self, ValidationError> {
        if layout.dimensionality() != 3 {
            return Err(ValidationError::Dimensionality {
                got: layout.dimensionality(),
            });
        }

        let find = |names: &'static [&'static str]| {
            layout
                .axes
                .iter()
                .position(|a| names.contains(&a.name.as_str()))
                .ok_or_else(|| ValidationError::MissingAxis {
                    names: names.to_vec(),
                })
        };
        let dimensions = [find(INLINE_NAMES)?, find(CROSSLINE_NAMES)?, find(SAMPLE_NAMES)?];

        let [iline, xline, sample] =
            dimensions.map(|d| Axis::from(SingleAxis::new(layout.axes[d].clone(), d)));

        at_least_two_samples([&iline, &xline, &sample], false)?;

        Ok(Self {
            layout,
            dimensions,
            iline,
            xline,
            sample,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    fn single_axes(&self) -> [SingleAxis; 3] {
        self.dimensions
            .map(|d| SingleAxis::new(self.layout.axes[d].clone(), d))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoubleMetadata {
    layout: DoubleLayout,
    survey: SurveyCoordinateSystem,
    info_a: CubeInfo,
    info_b: CubeInfo,
    iline: Axis,
    xline: Axis,
    sample: Axis,
}

impl DoubleMetadata {
    /// Builds the intersection of `a` and `b`. Operand order of later binary
    /// operations follows the argument order here.
    #[instrument(skip_all)]
    pub fn new(a: &SingleMetadata, b: &SingleMetadata) -> Result<Self, ValidationError> {
        let [il_a, xl_a, s_a] = a.single_axes();
        let [il_b, xl_b, s_b] = b.single_axes();

        let iline = Axis::from(DoubleAxis::new(il_a, il_b)?);
        let xline = Axis::from(DoubleAxis::new(xl_a, xl_b)?);
        let sample = Axis::from(DoubleAxis::new(s_a, s_b)?);

        let layout = DoubleLayout::reconcile(&a.layout, &b.layout)?;

        at_least_two_samples([&iline, &xline, &sample], true)?;

        if a.layout.info.crs != b.layout.info.crs {
            return Err(ValidationError::CrsMismatch {
                a: a.layout.info.crs.clone(),
                b: b.layout.info.crs.clone(),
            });
        }

        Ok(Self {
            layout,
            survey: a.layout.survey,
            info_a: a.layout.info.clone(),
            info_b: b.layout.info.clone(),
            iline,
            xline,
            sample,
        })
    }

    pub fn layout(&self) -> &DoubleLayout {
        &self.layout
    }
}

fn at_least_two_samples(axes: [&Axis; 3], pair: bool) -> Result<(), ValidationError> {
    for (axis, label) in axes.into_iter().zip(["inLine", "crossLine", "sample"]) {
        if axis.nsamples() < 2 {
            return Err(ValidationError::TooFewSamples {
                axis: label,
                got: axis.nsamples(),
                pair,
            });
        }
    }
    Ok(())
}

/// Metadata of either one cube or the intersection of two.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataHandle {
    Single(SingleMetadata),
    Double(DoubleMetadata),
}

impl From<SingleMetadata> for MetadataHandle {
    fn from(m: SingleMetadata) -> Self {
        MetadataHandle::Single(m)
    }
}

impl From<DoubleMetadata> for MetadataHandle {
    fn from(m: DoubleMetadata) -> Self {
        MetadataHandle::Double(m)
    }
}

impl MetadataHandle {
    pub fn iline(&self) -> &Axis {
        match self {
            MetadataHandle::Single(m) => &m.iline,
            MetadataHandle::Double(m) => &m.iline,
        }
    }

    pub fn xline(&self) -> &Axis {
        match self {
            MetadataHandle::Single(m) => &m.xline,
            MetadataHandle::Double(m) => &m.xline,
        }
    }

    pub fn sample(&self) -> &Axis {
        match self {
            MetadataHandle::Single(m) => &m.sample,
            MetadataHandle::Double(m) => &m.sample,
        }
    }

    pub fn get_axis(&self, direction: Direction) -> &Axis {
        if direction.is_iline() {
            self.iline()
        } else if direction.is_xline() {
            self.xline()
        } else {
            self.sample()
        }
    }

    /// Number of samples per storage dimension.
    pub fn extent(&self) -> Vec3I {
        let mut extent = Vec3I::ONE;
        for axis in [self.iline(), self.xline(), self.sample()] {
            extent[axis.dimension()] = axis.nsamples();
        }
        extent
    }

    /// Voxel offsets from the origins of cube A and cube B to the origin of
    /// this frame. Zero for a single cube.
    pub fn offsets(&self) -> (Vec3I, Vec3I) {
        match self {
            MetadataHandle::Single(_) => (Vec3I::ZERO, Vec3I::ZERO),
            MetadataHandle::Double(m) => (m.layout.offset_a(), m.layout.offset_b()),
        }
    }

    pub fn crs(&self) -> &str {
        match self {
            MetadataHandle::Single(m) => &m.layout.info.crs,
            // Equal on both sides, checked on construction.
            MetadataHandle::Double(m) => &m.info_a.crs,
        }
    }

    pub fn input_filename(&self) -> String {
        match self {
            MetadataHandle::Single(m) => m.layout.info.input_filename.clone(),
            MetadataHandle::Double(m) => {
                format!("{} + {}", m.info_a.input_filename, m.info_b.input_filename)
            }
        }
    }

    pub fn import_time_stamp(&self) -> String {
        match self {
            MetadataHandle::Single(m) => m.layout.info.import_time_stamp.clone(),
            MetadataHandle::Double(m) => {
                format!("{} + {}", m.info_a.import_time_stamp, m.info_b.import_time_stamp)
            }
        }
    }

    pub fn coordinate_transformer(&self) -> CoordinateTransformer {
        let survey = match self {
            MetadataHandle::Single(m) => m.layout.survey,
            MetadataHandle::Double(m) => m.survey,
        };
        CoordinateTransformer::new(self.iline(), self.xline(), self.sample(), survey)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(
            self.iline().nsamples(),
            self.xline().nsamples(),
            self.coordinate_transformer(),
        )
    }

    /// The survey grid, rows along inline and columns along crossline.
    pub fn grid(&self) -> Grid {
        let transformer = self.coordinate_transformer();
        let origin = transformer.index_to_world(0.0, 0.0);
        let iline = transformer.index_to_world(1.0, 0.0) - origin;
        let xline = transformer.index_to_world(0.0, 1.0) - origin;
        let rotation = iline.y.atan2(iline.x).to_degrees();
        Grid::from_rotation(origin.x, origin.y, iline.length(), xline.length(), rotation)
    }
}

/// Converts between index, annotation and world coordinates of a cube.
/// Index and annotation triples are ordered (inline, crossline, sample).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransformer {
    min: Vec3F,
    step: Vec3F,
    survey: SurveyCoordinateSystem,
}

impl CoordinateTransformer {
    pub fn new(iline: &Axis, xline: &Axis, sample: &Axis, survey: SurveyCoordinateSystem) -> Self {
        Self {
            min: Vec3::new(iline.min(), xline.min(), sample.min()),
            step: Vec3::new(iline.stepsize(), xline.stepsize(), sample.stepsize()),
            survey,
        }
    }

    pub fn index_to_annotation(&self, index: Vec3F) -> Vec3F {
        Vec3::new(
            self.min.x + index.x * self.step.x,
            self.min.y + index.y * self.step.y,
            self.min.z + index.z * self.step.z,
        )
    }

    pub fn annotation_to_index(&self, annotation: Vec3F) -> Vec3F {
        Vec3::new(
            (annotation.x - self.min.x) / self.step.x,
            (annotation.y - self.min.y) / self.step.y,
            (annotation.z - self.min.z) / self.step.z,
        )
    }

    pub fn annotation_to_world(&self, iline: f64, xline: f64) -> Point {
        let s = &self.survey;
        Point::new(
            s.origin.x + iline * s.inline_spacing.x + xline * s.crossline_spacing.x,
            s.origin.y + iline * s.inline_spacing.y + xline * s.crossline_spacing.y,
        )
    }

    /// Inverse of [`CoordinateTransformer::annotation_to_world`], returns
    /// (inline, crossline). Degenerate spacings yield non-finite values.
    pub fn world_to_annotation(&self, point: Point) -> (f64, f64) {
        let s = &self.survey;
        let (a, b) = (s.inline_spacing.x, s.crossline_spacing.x);
        let (c, d) = (s.inline_spacing.y, s.crossline_spacing.y);
        let det = a * d - b * c;
        let p = point - s.origin;
        ((d * p.x - b * p.y) / det, (a * p.y - c * p.x) / det)
    }

    pub fn index_to_world(&self, iline: f64, xline: f64) -> Point {
        self.annotation_to_world(
            self.min.x as f64 + iline * self.step.x as f64,
            self.min.y as f64 + xline * self.step.y as f64,
        )
    }

    /// Returns fractional (inline, crossline) indices.
    pub fn world_to_index(&self, point: Point) -> (f64, f64) {
        let (il, xl) = self.world_to_annotation(point);
        (
            (il - self.min.x as f64) / self.step.x as f64,
            (xl - self.min.y as f64) / self.step.y as f64,
        )
    }
}

/// Corners of the horizontal extent of a cube, counterclockwise in index
/// space from the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    nilines: i32,
    nxlines: i32,
    transformer: CoordinateTransformer,
}

impl BoundingBox {
    pub fn new(nilines: i32, nxlines: i32, transformer: CoordinateTransformer) -> Self {
        Self {
            nilines,
            nxlines,
            transformer,
        }
    }

    pub fn index(&self) -> [(i32, i32); 4] {
        let ils = self.nilines - 1;
        let xls = self.nxlines - 1;
        [(0, 0), (ils, 0), (ils, xls), (0, xls)]
    }

    pub fn world(&self) -> [Point; 4] {
        self.index()
            .map(|(i, j)| self.transformer.index_to_world(i as f64, j as f64))
    }

    pub fn annotation(&self) -> [(i32, i32); 4] {
        self.index().map(|(i, j)| {
            let a = self
                .transformer
                .index_to_annotation(Vec3::new(i as f32, j as f32, 0.0));
            (a.x.round() as i32, a.y.round() as i32)
        })
    }
}
