use std::mem::size_of;

use ndarray::{s, ArrayView2, ArrayViewMut2};
use tracing::{instrument, warn};

use crate::{
    error::{Cube, Error, Result, ValidationError},
    geom::{Bounds3I, Vec3I},
    metadata::{DoubleMetadata, MetadataHandle, SingleMetadata},
    ops::BinaryOperator,
    reader::{CubeLocation, CubeReader, CubeStore, Interpolation, Voxel},
    subcube::SubCube,
};

/// One open cube. Owns its reader connection exclusively.
#[derive(Debug)]
pub struct DataHandle<R> {
    reader: R,
    metadata: SingleMetadata,
}

impl<R: CubeReader> DataHandle<R> {
    pub fn new(reader: R) -> Result<Self> {
        let metadata = SingleMetadata::new(reader.layout().clone())?;
        Ok(Self { reader, metadata })
    }

    #[instrument(skip(store, location), fields(url = %location.url))]
    pub async fn open<S>(store: &S, location: &CubeLocation) -> Result<Self>
    where
        S: CubeStore<Reader = R>,
    {
        let reader = store.open(location).await.map_err(|e| Error::Open {
            url: location.url.clone(),
            source: e.into(),
        })?;
        Self::new(reader)
    }

    pub fn metadata(&self) -> &SingleMetadata {
        &self.metadata
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }
}

/// Two cubes read as their intersection, combined by `operator` as
/// `a OP b`.
#[derive(Debug)]
pub struct DoubleSource<R> {
    a: DataHandle<R>,
    b: DataHandle<R>,
    metadata: MetadataHandle,
    operator: BinaryOperator,
}

impl<R: CubeReader> DoubleSource<R> {
    pub fn new(a: DataHandle<R>, b: DataHandle<R>, operator: BinaryOperator) -> Result<Self> {
        let metadata = DoubleMetadata::new(&a.metadata, &b.metadata)?.into();
        Ok(Self {
            a,
            b,
            metadata,
            operator,
        })
    }

    pub fn a(&self) -> &DataHandle<R> {
        &self.a
    }

    pub fn b(&self) -> &DataHandle<R> {
        &self.b
    }

    pub fn operator(&self) -> BinaryOperator {
        self.operator
    }

    fn offset_a(&self) -> Vec3I {
        self.metadata.offsets().0
    }

    fn offset_b(&self) -> Vec3I {
        self.metadata.offsets().1
    }
}

#[derive(Debug)]
pub enum DataSource<R> {
    Single {
        handle: DataHandle<R>,
        metadata: MetadataHandle,
    },
    Double(DoubleSource<R>),
}

impl<R: CubeReader> From<DataHandle<R>> for DataSource<R> {
    fn from(handle: DataHandle<R>) -> Self {
        let metadata = handle.metadata.clone().into();
        DataSource::Single { handle, metadata }
    }
}

impl<R: CubeReader> From<DoubleSource<R>> for DataSource<R> {
    fn from(source: DoubleSource<R>) -> Self {
        DataSource::Double(source)
    }
}

impl<R: CubeReader> DataSource<R> {
    pub async fn open<S>(store: &S, location: &CubeLocation) -> Result<Self>
    where
        S: CubeStore<Reader = R>,
    {
        Ok(DataHandle::open(store, location).await?.into())
    }

    /// Opens both cubes concurrently. Results are `a OP b`.
    #[instrument(skip(store, a, b), fields(a = %a.url, b = %b.url))]
    pub async fn open_double<S>(
        store: &S,
        a: &CubeLocation,
        b: &CubeLocation,
        operator: BinaryOperator,
    ) -> Result<Self>
    where
        S: CubeStore<Reader = R>,
    {
        let (a, b) = futures::join!(DataHandle::open(store, a), DataHandle::open(store, b));
        Ok(DoubleSource::new(a?, b?, operator)?.into())
    }

    pub fn get_metadata(&self) -> &MetadataHandle {
        match self {
            DataSource::Single { metadata, .. } => metadata,
            DataSource::Double(source) => &source.metadata,
        }
    }

    pub fn subcube_buffer_size(&self, subcube: &SubCube) -> Result<usize> {
        check_bounds(&subcube.bounds, self.get_metadata().extent())?;
        Ok(match self {
            DataSource::Single { handle, .. } => handle.reader.subcube_buffer_size(&subcube.bounds),
            DataSource::Double(source) => source
                .a
                .reader
                .subcube_buffer_size(&subcube.bounds.translate(source.offset_a())),
        })
    }

    #[instrument(skip(self, buffer))]
    pub async fn read_subcube(&self, buffer: &mut [f32], subcube: &SubCube) -> Result<()> {
        check_buffer(buffer, self.subcube_buffer_size(subcube)?)?;

        match self {
            DataSource::Single { handle, .. } => handle
                .reader
                .read_subcube(buffer, subcube.bounds)
                .await
                .map_err(|e| Error::io(None, e)),
            DataSource::Double(source) => {
                let mut values_a = vec![0.0; buffer.len()];
                let mut values_b = vec![0.0; buffer.len()];
                let (a, b) = futures::join!(
                    source
                        .a
                        .reader
                        .read_subcube(&mut values_a, subcube.bounds.translate(source.offset_a())),
                    source
                        .b
                        .reader
                        .read_subcube(&mut values_b, subcube.bounds.translate(source.offset_b())),
                );
                settle(a, b)?;
                source.operator.combine_slices(&values_a, &values_b, buffer);
                Ok(())
            }
        }
    }

    /// Size of `ntraces` traces along the sample axis of the (intersection)
    /// cube.
    pub fn traces_buffer_size(&self, ntraces: usize) -> usize {
        match self {
            DataSource::Single { handle, metadata } => handle
                .reader
                .traces_buffer_size(ntraces, metadata.sample().dimension()),
            DataSource::Double(source) => {
                ntraces * source.metadata.sample().nsamples() as usize * size_of::<f32>()
            }
        }
    }

    /// Reads whole traces along the sample axis. The sample component of each
    /// coordinate is ignored.
    #[instrument(skip(self, buffer, coordinates), fields(ntraces = coordinates.len()))]
    pub async fn read_traces(
        &self,
        buffer: &mut [f32],
        coordinates: &[Voxel],
        interpolation: Interpolation,
    ) -> Result<()> {
        check_buffer(buffer, self.traces_buffer_size(coordinates.len()))?;
        let metadata = self.get_metadata();
        let trace_dimension = metadata.sample().dimension();
        check_coordinates(coordinates, metadata.extent(), Some(trace_dimension))?;

        match self {
            DataSource::Single { handle, .. } => handle
                .reader
                .read_traces(buffer, coordinates, interpolation, trace_dimension)
                .await
                .map_err(|e| Error::io(None, e)),
            DataSource::Double(source) => {
                let ntraces = coordinates.len();
                let coordinates_a = translate(coordinates, source.offset_a());
                let coordinates_b = translate(coordinates, source.offset_b());

                let native_a = source.a.metadata.layout().extent()[trace_dimension] as usize;
                let native_b = source.b.metadata.layout().extent()[trace_dimension] as usize;
                let mut values_a = vec![0.0; ntraces * native_a];
                let mut values_b = vec![0.0; ntraces * native_b];

                let (a, b) = futures::join!(
                    source.a.reader.read_traces(
                        &mut values_a,
                        &coordinates_a,
                        interpolation,
                        trace_dimension
                    ),
                    source.b.reader.read_traces(
                        &mut values_b,
                        &coordinates_b,
                        interpolation,
                        trace_dimension
                    ),
                );
                settle(a, b)?;

                let nsamples = metadata.sample().nsamples() as usize;
                let a = crop(&values_a, ntraces, native_a, source.offset_a()[trace_dimension], nsamples)?;
                let b = crop(&values_b, ntraces, native_b, source.offset_b()[trace_dimension], nsamples)?;
                let out = ArrayViewMut2::from_shape((ntraces, nsamples), buffer)?;
                source.operator.combine(a, b, out);
                Ok(())
            }
        }
    }

    pub fn samples_buffer_size(&self, nsamples: usize) -> usize {
        match self {
            DataSource::Single { handle, .. } => handle.reader.samples_buffer_size(nsamples),
            DataSource::Double(source) => source.a.reader.samples_buffer_size(nsamples),
        }
    }

    #[instrument(skip(self, buffer, coordinates), fields(nsamples = coordinates.len()))]
    pub async fn read_samples(
        &self,
        buffer: &mut [f32],
        coordinates: &[Voxel],
        interpolation: Interpolation,
    ) -> Result<()> {
        check_buffer(buffer, self.samples_buffer_size(coordinates.len()))?;
        check_coordinates(coordinates, self.get_metadata().extent(), None)?;

        match self {
            DataSource::Single { handle, .. } => handle
                .reader
                .read_samples(buffer, coordinates, interpolation)
                .await
                .map_err(|e| Error::io(None, e)),
            DataSource::Double(source) => {
                let coordinates_a = translate(coordinates, source.offset_a());
                let coordinates_b = translate(coordinates, source.offset_b());
                let mut values_a = vec![0.0; buffer.len()];
                let mut values_b = vec![0.0; buffer.len()];

                let (a, b) = futures::join!(
                    source
                        .a
                        .reader
                        .read_samples(&mut values_a, &coordinates_a, interpolation),
                    source
                        .b
                        .reader
                        .read_samples(&mut values_b, &coordinates_b, interpolation),
                );
                settle(a, b)?;
                source.operator.combine_slices(&values_a, &values_b, buffer);
                Ok(())
            }
        }
    }
}

/// Both reads have completed by now. Reports the failure of `a` first.
fn settle<E>(a: Result<(), E>, b: Result<(), E>) -> Result<()>
where
    E: std::error::Error + Send + Sync + 'static,
{
    match (a, b) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(a), Ok(())) => Err(Error::io(Some(Cube::A), a)),
        (Ok(()), Err(b)) => Err(Error::io(Some(Cube::B), b)),
        (Err(a), Err(b)) => {
            warn!(error_a = %a, error_b = %b, "reads from both cubes failed");
            Err(Error::io(Some(Cube::A), a))
        }
    }
}

/// The `nsamples` values of every native trace starting at `offset`.
fn crop(
    values: &[f32],
    ntraces: usize,
    native: usize,
    offset: i32,
    nsamples: usize,
) -> Result<ArrayView2<'_, f32>> {
    let offset = offset as usize;
    let traces = ArrayView2::from_shape((ntraces, native), values)?;
    Ok(traces.slice_move(s![.., offset..offset + nsamples]))
}

fn translate(coordinates: &[Voxel], offset: Vec3I) -> Vec<Voxel> {
    coordinates
        .iter()
        .map(|c| {
            [
                c[0] + offset.x as f32,
                c[1] + offset.y as f32,
                c[2] + offset.z as f32,
            ]
        })
        .collect()
}

fn check_buffer(buffer: &[f32], expected: usize) -> Result<(), ValidationError> {
    let got = buffer.len() * size_of::<f32>();
    if got != expected {
        return Err(ValidationError::BufferSize { expected, got });
    }
    Ok(())
}

fn check_bounds(bounds: &Bounds3I, extent: Vec3I) -> Result<(), ValidationError> {
    if bounds.is_within(extent) {
        return Ok(());
    }
    let dimension = (0..3)
        .find(|&d| !(0 <= bounds.min[d] && bounds.min[d] < bounds.max[d] && bounds.max[d] <= extent[d]))
        .unwrap_or(0);
    let index = if bounds.min[dimension] < 0 {
        bounds.min[dimension]
    } else {
        bounds.max[dimension]
    };
    Err(ValidationError::OutOfRange {
        what: "Subcube bound",
        index: index as f64,
        len: extent[dimension].max(0) as usize,
    })
}

/// Coordinates must round to a voxel of `extent`. `skip` names a dimension
/// that is not checked.
fn check_coordinates(
    coordinates: &[Voxel],
    extent: Vec3I,
    skip: Option<usize>,
) -> Result<(), ValidationError> {
    for coordinate in coordinates {
        for d in (0..3).filter(|&d| Some(d) != skip) {
            let c = coordinate[d];
            if !(-0.5 <= c && c < extent[d] as f32 - 0.5) {
                return Err(ValidationError::OutOfRange {
                    what: "Voxel coordinate",
                    index: c as f64,
                    len: extent[d].max(0) as usize,
                });
            }
        }
    }
    Ok(())
}
