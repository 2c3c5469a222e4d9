pub mod grid;
pub mod surface;

use std::ops::{Index, IndexMut};

use derive_more::{Add, Constructor, Mul, Sub};
use serde::{Deserialize, Serialize};

#[derive(
    Add, Sub, Mul, Constructor, Default, PartialEq, Eq, Debug, Copy, Clone, Serialize, Deserialize,
)]
pub struct Vec2<T> {
    pub x: T,
    pub y: T,
}

pub type Vec2F = Vec2<f64>;

/// A point in world (CDP) space, or a fractional grid position.
pub type Point = Vec2F;

impl<T> From<(T, T)> for Vec2<T> {
    fn from((x, y): (T, T)) -> Self {
        Vec2 { x, y }
    }
}

impl<T> From<Vec2<T>> for (T, T) {
    fn from(v: Vec2<T>) -> Self {
        (v.x, v.y)
    }
}

impl Vec2F {
    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// One value per storage dimension of a cube, indexed by dimension number.
#[derive(
    Add, Sub, Constructor, Default, PartialEq, Eq, Debug, Copy, Clone, Hash, Serialize, Deserialize,
)]
pub struct Vec3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

pub type Vec3I = Vec3<i32>;
pub type Vec3U = Vec3<u32>;
pub type Vec3F = Vec3<f32>;

impl Vec3I {
    pub const ZERO: Vec3I = Vec3I { x: 0, y: 0, z: 0 };
    pub const ONE: Vec3I = Vec3I { x: 1, y: 1, z: 1 };
}

impl<T> From<(T, T, T)> for Vec3<T> {
    fn from((x, y, z): (T, T, T)) -> Self {
        Vec3 { x, y, z }
    }
}

impl<T> From<[T; 3]> for Vec3<T> {
    fn from([x, y, z]: [T; 3]) -> Self {
        Vec3 { x, y, z }
    }
}

impl<T> From<Vec3<T>> for [T; 3] {
    fn from(v: Vec3<T>) -> Self {
        [v.x, v.y, v.z]
    }
}

impl<T> Vec3<T> {
    pub fn iter<'a>(&self) -> impl Iterator<Item = T> + 'a
    where
        T: Copy + 'a,
    {
        [self.x, self.y, self.z].into_iter()
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Vec3<U> {
        Vec3::new(f(self.x), f(self.y), f(self.z))
    }

    pub fn get(&self, dim: usize) -> Option<&T> {
        match dim {
            0 => Some(&self.x),
            1 => Some(&self.y),
            2 => Some(&self.z),
            _ => None,
        }
    }
}

impl<T> Index<usize> for Vec3<T> {
    type Output = T;

    fn index(&self, dim: usize) -> &T {
        match dim {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("dimension {dim} out of range for Vec3"),
        }
    }
}

impl<T> IndexMut<usize> for Vec3<T> {
    fn index_mut(&mut self, dim: usize) -> &mut T {
        match dim {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("dimension {dim} out of range for Vec3"),
        }
    }
}

/// Half-open box in voxel space: `min` inclusive, `max` exclusive.
#[derive(Constructor, Default, PartialEq, Eq, Debug, Copy, Clone, Hash)]
pub struct Bounds3<T> {
    pub min: Vec3<T>,
    pub max: Vec3<T>,
}

pub type Bounds3I = Bounds3<i32>;

impl Bounds3I {
    pub fn area(&self) -> Vec3U {
        Vec3::new(
            i32::abs_diff(self.min.x, self.max.x),
            i32::abs_diff(self.min.y, self.max.y),
            i32::abs_diff(self.min.z, self.max.z),
        )
    }

    pub fn volume(&self) -> usize {
        self.area().iter().map(|x| x as usize).product()
    }

    pub fn translate(&self, by: Vec3I) -> Self {
        Bounds3::new(self.min + by, self.max + by)
    }

    /// True if `self` lies within `[0, extent)` on every dimension and is not empty.
    pub fn is_within(&self, extent: Vec3I) -> bool {
        (0..3).all(|d| 0 <= self.min[d] && self.min[d] < self.max[d] && self.max[d] <= extent[d])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_volume() {
        let b = Bounds3I::new(Vec3::new(0, 2, 5), Vec3::new(8, 4, 6));
        assert_eq!(b.area(), Vec3U::new(8, 2, 1));
        assert_eq!(b.volume(), 16);
    }

    #[test]
    fn bounds_within() {
        let extent = Vec3::new(32, 8, 8);
        assert!(Bounds3I::new(Vec3I::ZERO, extent).is_within(extent));
        assert!(!Bounds3I::new(Vec3I::ZERO, extent + Vec3I::ONE).is_within(extent));
        assert!(!Bounds3I::new(Vec3::new(3, 0, 0), Vec3::new(3, 8, 8)).is_within(extent));
    }

    #[test]
    fn translate_shifts_both_ends() {
        let b = Bounds3I::new(Vec3I::ZERO, Vec3I::ONE).translate(Vec3::new(4, 0, 2));
        assert_eq!(b.min, Vec3::new(4, 0, 2));
        assert_eq!(b.max, Vec3::new(5, 1, 3));
    }
}
