use std::ops::Mul;

use crate::error::ValidationError;

use super::Point;

/// A 2x3 affine matrix acting on 2D points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransformation([[f64; 3]; 2]);

impl AffineTransformation {
    /// Scales by `(xinc, yinc)`, rotates counterclockwise by `rot` degrees and
    /// translates by `(xori, yori)`, in that order.
    pub fn from_rotation(xori: f64, yori: f64, xinc: f64, yinc: f64, rot: f64) -> Self {
        let (sin, cos) = rot.to_radians().sin_cos();
        Self([
            [xinc * cos, -yinc * sin, xori],
            [xinc * sin, yinc * cos, yori],
        ])
    }

    /// The closed-form inverse of [`AffineTransformation::from_rotation`].
    pub fn inverse_from_rotation(xori: f64, yori: f64, xinc: f64, yinc: f64, rot: f64) -> Self {
        let (sin, cos) = rot.to_radians().sin_cos();
        Self([
            [cos / xinc, sin / xinc, -(sin * yori + cos * xori) / xinc],
            [-sin / yinc, cos / yinc, (sin * xori - cos * yori) / yinc],
        ])
    }
}

impl Mul<Point> for AffineTransformation {
    type Output = Point;

    fn mul(self, p: Point) -> Point {
        let m = &self.0;
        Point::new(
            m[0][0] * p.x + m[0][1] * p.y + m[0][2],
            m[1][0] * p.x + m[1][1] * p.y + m[1][2],
        )
    }
}

/// A plane seen as a grid, placed in world space.
///
/// Axes perpendicularity is not checked, so it is up to the caller to make
/// sure the parameters describe the grid they want.
#[derive(Debug, Clone, Copy)]
pub struct Grid {
    transformation: AffineTransformation,
    inverse_transformation: AffineTransformation,
}

impl Grid {
    pub fn from_rotation(xori: f64, yori: f64, xinc: f64, yinc: f64, rot: f64) -> Self {
        Self {
            transformation: AffineTransformation::from_rotation(xori, yori, xinc, yinc, rot),
            inverse_transformation: AffineTransformation::inverse_from_rotation(
                xori, yori, xinc, yinc, rot,
            ),
        }
    }

    pub fn transformation(&self) -> &AffineTransformation {
        &self.transformation
    }

    pub fn inverse_transformation(&self) -> &AffineTransformation {
        &self.inverse_transformation
    }
}

/// Grids are equal when their forward transformations are. Grids that differ
/// only by a full turn of rotation will not compare equal due to rounding.
impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        self.transformation == other.transformation
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundedGrid {
    grid: Grid,
    nrows: usize,
    ncols: usize,
}

impl BoundedGrid {
    pub fn new(grid: Grid, nrows: usize, ncols: usize) -> Self {
        Self { grid, nrows, ncols }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn size(&self) -> usize {
        self.nrows * self.ncols
    }

    pub fn row(&self, i: usize) -> Result<usize, ValidationError> {
        self.check_index(i)?;
        Ok(i / self.ncols)
    }

    pub fn col(&self, i: usize) -> Result<usize, ValidationError> {
        self.check_index(i)?;
        Ok(i % self.ncols)
    }

    /// Grid position to world coordinates.
    pub fn to_cdp(&self, row: usize, col: usize) -> Result<Point, ValidationError> {
        if row >= self.nrows {
            return Err(out_of_range("Row", row, self.nrows));
        }
        if col >= self.ncols {
            return Err(out_of_range("Col", col, self.ncols));
        }
        Ok(self.grid.transformation * Point::new(row as f64, col as f64))
    }

    /// Row-major flat index to world coordinates.
    pub fn to_cdp_index(&self, i: usize) -> Result<Point, ValidationError> {
        self.to_cdp(self.row(i)?, self.col(i)?)
    }

    /// World coordinates to a (fractional) grid position. Not bounds checked.
    pub fn from_cdp(&self, point: Point) -> Point {
        self.grid.inverse_transformation * point
    }

    fn check_index(&self, i: usize) -> Result<(), ValidationError> {
        if i >= self.size() {
            return Err(out_of_range("Index", i, self.size()));
        }
        Ok(())
    }
}

fn out_of_range(what: &'static str, index: usize, len: usize) -> ValidationError {
    ValidationError::OutOfRange {
        what,
        index: index as f64,
        len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn unrotated_grid() {
        let grid = BoundedGrid::new(Grid::from_rotation(10.0, 20.0, 2.0, 3.0, 0.0), 4, 5);
        assert_close(grid.to_cdp(0, 0).unwrap(), Point::new(10.0, 20.0));
        assert_close(grid.to_cdp(3, 4).unwrap(), Point::new(16.0, 32.0));
    }

    #[test]
    fn quarter_turn() {
        let grid = BoundedGrid::new(Grid::from_rotation(0.0, 0.0, 1.0, 1.0, 90.0), 2, 2);
        assert_close(grid.to_cdp(1, 0).unwrap(), Point::new(0.0, 1.0));
        assert_close(grid.to_cdp(0, 1).unwrap(), Point::new(-1.0, 0.0));
    }

    #[test]
    fn round_trip() {
        let params = [
            (2.0, 0.0, 7.2111, 3.6056, 33.69),
            (-1000.5, 250.25, 12.5, 25.0, -17.0),
            (0.0, 0.0, 1.0, 0.5, 270.0),
        ];
        for (xori, yori, xinc, yinc, rot) in params {
            let grid = BoundedGrid::new(Grid::from_rotation(xori, yori, xinc, yinc, rot), 10, 12);
            for (row, col) in [(0, 0), (3, 7), (9, 11)] {
                let cdp = grid.to_cdp(row, col).unwrap();
                assert_close(grid.from_cdp(cdp), Point::new(row as f64, col as f64));
            }
        }
    }

    #[test]
    fn inverse_undoes_forward() {
        let grid = Grid::from_rotation(-1000.5, 250.25, 12.5, 25.0, -17.0);
        let p = Point::new(4.25, -3.5);
        assert_close(*grid.inverse_transformation() * (*grid.transformation() * p), p);
    }

    #[test]
    fn bounds_checked() {
        let grid = BoundedGrid::new(Grid::from_rotation(0.0, 0.0, 1.0, 1.0, 0.0), 3, 2);
        assert!(grid.to_cdp(3, 0).is_err());
        assert!(grid.to_cdp(0, 2).is_err());
        assert!(grid.to_cdp_index(6).is_err());
        assert_eq!(grid.row(5).unwrap(), 2);
        assert_eq!(grid.col(5).unwrap(), 1);
        assert_close(grid.to_cdp_index(5).unwrap(), Point::new(2.0, 1.0));
    }

    #[test]
    fn equality_uses_forward_transform() {
        let a = Grid::from_rotation(2.0, 0.0, 7.2111, 3.6056, 33.69);
        let b = Grid::from_rotation(2.0, 0.0, 7.2111, 3.6056, 33.69);
        let c = Grid::from_rotation(2.0, 0.0, 7.2111, 3.6056, 33.7);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(BoundedGrid::new(a, 3, 2), BoundedGrid::new(b, 2, 3));
    }
}
