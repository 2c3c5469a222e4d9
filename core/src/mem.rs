//! Cubes held in memory.
//!
//! [`MemoryStore`] hands out [`MemoryCube`] connections that share the
//! stored values. Reads can be made to fail, to wait on a [`Barrier`], or to
//! take a fixed time, which makes the behaviour of combined reads observable.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::Barrier;

use crate::{
    geom::{Bounds3I, Vec3, Vec3I},
    layout::Layout,
    reader::{CubeLocation, CubeReader, CubeStore, Interpolation, Voxel},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemoryError {
    #[error("No cube stored at {0}")]
    NotFound(String),
    #[error("Cube holds {got} values, layout needs {expected}")]
    DataSize { expected: usize, got: usize },
    #[error("Read failed")]
    ReadFailed,
    #[error("Interpolation method {0:?} is not supported")]
    UnsupportedInterpolation(Interpolation),
    #[error("Request outside of cube")]
    OutOfBounds,
    #[error("Buffer of {got} values, request needs {expected}")]
    BufferSize { expected: usize, got: usize },
}

#[derive(Debug, Clone)]
pub struct MemoryCube {
    layout: Layout,
    extent: Vec3I,
    /// First storage dimension varies fastest.
    data: Arc<Vec<f32>>,
    failing_reads: bool,
    latency: Option<Duration>,
    gate: Option<Arc<Barrier>>,
    completed: Arc<AtomicUsize>,
}

impl MemoryCube {
    pub fn new(layout: Layout, data: Vec<f32>) -> Result<Self, MemoryError> {
        let extent = layout.extent();
        let expected = extent.iter().map(|n| n.max(0) as usize).product();
        if data.len() != expected {
            return Err(MemoryError::DataSize {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            layout,
            extent,
            data: Arc::new(data),
            failing_reads: false,
            latency: None,
            gate: None,
            completed: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Fills the cube by evaluating `f` at every voxel.
    pub fn from_fn(layout: Layout, f: impl Fn(Vec3I) -> f32) -> Self {
        let extent = layout.extent();
        let mut data = Vec::with_capacity(extent.iter().map(|n| n.max(0) as usize).product());
        for z in 0..extent.z {
            for y in 0..extent.y {
                for x in 0..extent.x {
                    data.push(f(Vec3::new(x, y, z)));
                }
            }
        }
        Self {
            layout,
            extent,
            data: Arc::new(data),
            failing_reads: false,
            latency: None,
            gate: None,
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every read reports [`MemoryError::ReadFailed`] after its wait.
    pub fn failing_reads(mut self) -> Self {
        self.failing_reads = true;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Every read waits on `gate` before doing anything else.
    pub fn with_gate(mut self, gate: Arc<Barrier>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Number of reads that completed successfully, shared by all connections
    /// to this cube.
    pub fn completed_reads(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    fn flat(&self, v: Vec3I) -> usize {
        (v.x + self.extent.x * (v.y + self.extent.y * v.z)) as usize
    }

    fn at(&self, v: Vec3I) -> f32 {
        self.data[self.flat(v)]
    }

    fn contains(&self, coordinate: &Voxel) -> bool {
        (0..3).all(|d| {
            let c = coordinate[d];
            -0.5 <= c && c < self.extent[d] as f32 - 0.5
        })
    }

    fn clamp(&self, d: usize, i: i32) -> i32 {
        i.clamp(0, self.extent[d] - 1)
    }

    fn sample(&self, coordinate: &Voxel, interpolation: Interpolation) -> Result<f32, MemoryError> {
        match interpolation {
            Interpolation::Nearest => {
                let v = Vec3::from(*coordinate).map(|c| c.round() as i32);
                Ok(self.at(Vec3::new(
                    self.clamp(0, v.x),
                    self.clamp(1, v.y),
                    self.clamp(2, v.z),
                )))
            }
            Interpolation::Linear => {
                let mut lower = Vec3I::ZERO;
                let mut upper = Vec3I::ZERO;
                let mut t = [0.0f32; 3];
                for d in 0..3 {
                    let c = coordinate[d].clamp(0.0, (self.extent[d] - 1) as f32);
                    lower[d] = c.floor() as i32;
                    upper[d] = self.clamp(d, lower[d] + 1);
                    t[d] = c - lower[d] as f32;
                }

                let mut value = 0.0;
                for corner in 0..8 {
                    let mut v = lower;
                    let mut weight = 1.0;
                    for d in 0..3 {
                        if corner & (1 << d) != 0 {
                            v[d] = upper[d];
                            weight *= t[d];
                        } else {
                            weight *= 1.0 - t[d];
                        }
                    }
                    if weight != 0.0 {
                        value += weight * self.at(v);
                    }
                }
                Ok(value)
            }
            other => Err(MemoryError::UnsupportedInterpolation(other)),
        }
    }

    async fn begin(&self) -> Result<(), MemoryError> {
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing_reads {
            return Err(MemoryError::ReadFailed);
        }
        Ok(())
    }

    fn finish(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}

fn check_buffer(buffer: &[f32], expected: usize) -> Result<(), MemoryError> {
    if buffer.len() != expected {
        return Err(MemoryError::BufferSize {
            expected,
            got: buffer.len(),
        });
    }
    Ok(())
}

#[async_trait]
impl CubeReader for MemoryCube {
    type Error = MemoryError;

    fn layout(&self) -> &Layout {
        &self.layout
    }

    async fn read_subcube(&self, buffer: &mut [f32], bounds: Bounds3I) -> Result<(), Self::Error> {
        self.begin().await?;
        if !bounds.is_within(self.extent) {
            return Err(MemoryError::OutOfBounds);
        }
        check_buffer(buffer, bounds.volume())?;

        let mut out = buffer.iter_mut();
        for z in bounds.min.z..bounds.max.z {
            for y in bounds.min.y..bounds.max.y {
                for x in bounds.min.x..bounds.max.x {
                    if let Some(value) = out.next() {
                        *value = self.at(Vec3::new(x, y, z));
                    }
                }
            }
        }
        self.finish();
        Ok(())
    }

    async fn read_traces(
        &self,
        buffer: &mut [f32],
        coordinates: &[Voxel],
        interpolation: Interpolation,
        trace_dimension: usize,
    ) -> Result<(), Self::Error> {
        self.begin().await?;
        let nsamples = self.extent.get(trace_dimension).copied().ok_or(MemoryError::OutOfBounds)? as usize;
        check_buffer(buffer, coordinates.len() * nsamples)?;

        for (trace, coordinate) in buffer.chunks_mut(nsamples.max(1)).zip(coordinates) {
            let mut position = *coordinate;
            position[trace_dimension] = 0.0;
            if !self.contains(&position) {
                return Err(MemoryError::OutOfBounds);
            }
            for (i, value) in trace.iter_mut().enumerate() {
                position[trace_dimension] = i as f32;
                *value = self.sample(&position, interpolation)?;
            }
        }
        self.finish();
        Ok(())
    }

    async fn read_samples(
        &self,
        buffer: &mut [f32],
        coordinates: &[Voxel],
        interpolation: Interpolation,
    ) -> Result<(), Self::Error> {
        self.begin().await?;
        check_buffer(buffer, coordinates.len())?;

        for (value, coordinate) in buffer.iter_mut().zip(coordinates) {
            if !self.contains(coordinate) {
                return Err(MemoryError::OutOfBounds);
            }
            *value = self.sample(coordinate, interpolation)?;
        }
        self.finish();
        Ok(())
    }
}

/// Cubes keyed by URL. Credentials are not checked.
#[derive(Debug, Default)]
pub struct MemoryStore {
    cubes: Mutex<HashMap<String, MemoryCube>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, cube: MemoryCube) {
        self.cubes.lock().insert(url.into(), cube);
    }

    /// The stored cube, sharing its counters with every open connection.
    pub fn get(&self, url: &str) -> Option<MemoryCube> {
        self.cubes.lock().get(url).cloned()
    }
}

#[async_trait]
impl CubeStore for MemoryStore {
    type Reader = MemoryCube;
    type Error = MemoryError;

    async fn open(&self, location: &CubeLocation) -> Result<MemoryCube, MemoryError> {
        self.get(&location.url)
            .ok_or_else(|| MemoryError::NotFound(location.url.clone()))
    }
}
