use crate::{
    axis::AxisDescriptor,
    geom::{Point, Vec3I},
    layout::{CubeInfo, Layout, SurveyCoordinateSystem},
    mem::MemoryCube,
};

/// `iline << 16 | xline << 8 | sample`, with annotated line numbers.
pub fn value(iline: i32, xline: i32, sample: i32) -> f32 {
    (iline << 16 | xline << 8 | sample) as f32
}

fn survey() -> SurveyCoordinateSystem {
    SurveyCoordinateSystem {
        origin: Point::new(-3.0, -12.0),
        inline_spacing: Point::new(3.0, 2.0),
        crossline_spacing: Point::new(-2.0, 3.0),
    }
}

fn layout(first_iline: f32, first_xline: f32, first_sample: f32, filename: &str) -> Layout {
    Layout::new(vec![
        AxisDescriptor::new("Sample", "ms", first_sample, first_sample + 124.0, 32),
        AxisDescriptor::new("Crossline", "unitless", first_xline, first_xline + 14.0, 8),
        AxisDescriptor::new("Inline", "unitless", first_iline, first_iline + 21.0, 8),
    ])
    .with_survey(survey())
    .with_info(CubeInfo {
        crs: "utmXX".to_string(),
        input_filename: filename.to_string(),
        import_time_stamp: "2023-01-18T10:42:51.767Z".to_string(),
    })
}

/// Inline 3..24 step 3, crossline 2..16 step 2, sample 4..128 step 4 ms.
pub fn regular_layout() -> Layout {
    layout(3.0, 2.0, 4.0, "regular_8x3_cube.segy")
}

/// [`regular_layout`] moved by four samples along every axis.
pub fn shift_4_layout() -> Layout {
    layout(15.0, 10.0, 20.0, "shift_4_8x3_cube.segy")
}

fn encoded(layout: Layout, scale: f32) -> MemoryCube {
    let first = |d: usize| layout.axes[d].min as i32;
    let step = |d: usize| layout.axes[d].stepsize() as i32;
    let (s0, x0, i0) = (first(0), first(1), first(2));
    let (ss, xs, is) = (step(0), step(1), step(2));
    MemoryCube::from_fn(layout, move |v: Vec3I| {
        scale * value(i0 + v.z * is, x0 + v.y * xs, s0 + v.x * ss)
    })
}

pub fn regular_cube() -> MemoryCube {
    encoded(regular_layout(), 1.0)
}

pub fn shift_4_cube() -> MemoryCube {
    encoded(shift_4_layout(), 1.0)
}

/// Same positions as [`shift_4_cube`], every value multiplied by `scale`.
pub fn scaled_shift_4_cube(scale: f32) -> MemoryCube {
    encoded(shift_4_layout(), scale)
}
