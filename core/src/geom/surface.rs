use std::ops::{Deref, DerefMut};

use crate::error::ValidationError;

use super::grid::{BoundedGrid, Grid};

/// Values over the finite part of a 2D grid, usually horizon depths.
///
/// The data is stored row-major in a buffer owned by the caller; the surface
/// only borrows it. Points without a value hold `fillvalue`.
#[derive(Debug)]
pub struct RegularSurface<D> {
    data: D,
    grid: BoundedGrid,
    fillvalue: f32,
}

impl<D: Deref<Target = [f32]>> RegularSurface<D> {
    pub fn new(data: D, grid: BoundedGrid, fillvalue: f32) -> Result<Self, ValidationError> {
        if data.len() < grid.size() {
            return Err(ValidationError::BufferSize {
                expected: grid.size() * std::mem::size_of::<f32>(),
                got: data.len() * std::mem::size_of::<f32>(),
            });
        }
        Ok(Self {
            data,
            grid,
            fillvalue,
        })
    }

    pub fn from_grid(
        data: D,
        nrows: usize,
        ncols: usize,
        grid: Grid,
        fillvalue: f32,
    ) -> Result<Self, ValidationError> {
        Self::new(data, BoundedGrid::new(grid, nrows, ncols), fillvalue)
    }

    pub fn grid(&self) -> &BoundedGrid {
        &self.grid
    }

    pub fn fillvalue(&self) -> f32 {
        self.fillvalue
    }

    pub fn size(&self) -> usize {
        self.grid.size()
    }

    pub fn get(&self, i: usize) -> Result<&f32, ValidationError> {
        let i = self.flat(i)?;
        Ok(&self.data[i])
    }

    pub fn get_rc(&self, row: usize, col: usize) -> Result<&f32, ValidationError> {
        let i = self.flat_rc(row, col)?;
        Ok(&self.data[i])
    }

    pub fn is_fill(&self, i: usize) -> Result<bool, ValidationError> {
        Ok(*self.get(i)? == self.fillvalue)
    }

    fn flat(&self, i: usize) -> Result<usize, ValidationError> {
        if i >= self.grid.size() {
            return Err(ValidationError::OutOfRange {
                what: "Surface index",
                index: i as f64,
                len: self.grid.size(),
            });
        }
        Ok(i)
    }

    fn flat_rc(&self, row: usize, col: usize) -> Result<usize, ValidationError> {
        if row >= self.grid.nrows() {
            return Err(ValidationError::OutOfRange {
                what: "Surface row",
                index: row as f64,
                len: self.grid.nrows(),
            });
        }
        if col >= self.grid.ncols() {
            return Err(ValidationError::OutOfRange {
                what: "Surface col",
                index: col as f64,
                len: self.grid.ncols(),
            });
        }
        Ok(row * self.grid.ncols() + col)
    }
}

impl<D: DerefMut<Target = [f32]>> RegularSurface<D> {
    pub fn get_mut(&mut self, i: usize) -> Result<&mut f32, ValidationError> {
        let i = self.flat(i)?;
        Ok(&mut self.data[i])
    }

    pub fn get_rc_mut(&mut self, row: usize, col: usize) -> Result<&mut f32, ValidationError> {
        let i = self.flat_rc(row, col)?;
        Ok(&mut self.data[i])
    }
}
