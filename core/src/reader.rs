use std::mem::size_of;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{geom::Bounds3I, layout::Layout};

/// A position in voxel space, one component per storage dimension. Integer
/// values are voxel centers.
pub type Voxel = [f32; 3];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interpolation {
    #[default]
    Nearest,
    Linear,
    Cubic,
    Angular,
    Triangular,
}

/// Where to find a cube, and how to authenticate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CubeLocation {
    pub url: String,
    #[serde(default)]
    pub credentials: String,
}

impl CubeLocation {
    pub fn new(url: impl Into<String>, credentials: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            credentials: credentials.into(),
        }
    }
}

/// Opens connections to stored cubes.
#[async_trait]
pub trait CubeStore: Send + Sync {
    type Reader: CubeReader;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn open(&self, location: &CubeLocation) -> Result<Self::Reader, Self::Error>;
}

/// One open connection to a stored cube.
///
/// Every read resolves once the buffer has been filled. Values are 32 bit
/// floats; requested sizes are in bytes.
#[async_trait]
pub trait CubeReader: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn layout(&self) -> &Layout;

    fn subcube_buffer_size(&self, bounds: &Bounds3I) -> usize {
        bounds.volume() * size_of::<f32>()
    }

    /// Whole traces along `trace_dimension`, so the native sample count of
    /// that dimension per trace.
    fn traces_buffer_size(&self, ntraces: usize, trace_dimension: usize) -> usize {
        let nsamples = self.layout().extent()[trace_dimension].max(0) as usize;
        ntraces * nsamples * size_of::<f32>()
    }

    fn samples_buffer_size(&self, nsamples: usize) -> usize {
        nsamples * size_of::<f32>()
    }

    /// Fills `buffer` with the voxels inside `bounds`, the first storage
    /// dimension varying fastest.
    async fn read_subcube(&self, buffer: &mut [f32], bounds: Bounds3I) -> Result<(), Self::Error>;

    /// Reads one whole trace along `trace_dimension` per coordinate. The
    /// component of each coordinate along that dimension is ignored.
    async fn read_traces(
        &self,
        buffer: &mut [f32],
        coordinates: &[Voxel],
        interpolation: Interpolation,
        trace_dimension: usize,
    ) -> Result<(), Self::Error>;

    async fn read_samples(
        &self,
        buffer: &mut [f32],
        coordinates: &[Voxel],
        interpolation: Interpolation,
    ) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_defaults_credentials() {
        let location: CubeLocation = serde_json::from_str(r#"{"url": "mem://regular"}"#).unwrap();
        assert_eq!(location, CubeLocation::new("mem://regular", ""));
    }

    #[test]
    fn interpolation_names() {
        let methods: Vec<Interpolation> =
            serde_json::from_str(r#"["Nearest", "Linear", "Cubic", "Angular", "Triangular"]"#)
                .unwrap();
        assert_eq!(methods.len(), 5);
        assert_eq!(Interpolation::default(), Interpolation::Nearest);
    }
}
