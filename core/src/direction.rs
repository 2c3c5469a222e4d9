use serde::{Deserialize, Serialize};

/// How a line number or bound is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoordinateSystem {
    /// Zero-based voxel index.
    Index,
    /// Line numbers on the `[min:max:step]` grid of the axis.
    Annotation,
    /// World coordinates. Resolved through a [`crate::geom::grid::Grid`] before
    /// reaching the voxel translator.
    Cdp,
}

/// Names an axis together with the coordinate system used to address it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    I,
    J,
    K,
    Inline,
    Crossline,
    Depth,
    Time,
    Sample,
}

impl Direction {
    pub fn coordinate_system(&self) -> CoordinateSystem {
        match self {
            Direction::I | Direction::J | Direction::K => CoordinateSystem::Index,
            Direction::Inline
            | Direction::Crossline
            | Direction::Depth
            | Direction::Time
            | Direction::Sample => CoordinateSystem::Annotation,
        }
    }

    pub fn is_iline(&self) -> bool {
        matches!(self, Direction::I | Direction::Inline)
    }

    pub fn is_xline(&self) -> bool {
        matches!(self, Direction::J | Direction::Crossline)
    }

    pub fn is_sample(&self) -> bool {
        matches!(
            self,
            Direction::K | Direction::Depth | Direction::Time | Direction::Sample
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_direction_maps_to_one_axis() {
        let all = [
            Direction::I,
            Direction::J,
            Direction::K,
            Direction::Inline,
            Direction::Crossline,
            Direction::Depth,
            Direction::Time,
            Direction::Sample,
        ];
        for d in all {
            let hits = [d.is_iline(), d.is_xline(), d.is_sample()]
                .into_iter()
                .filter(|x| *x)
                .count();
            assert_eq!(hits, 1, "{d:?}");
        }
    }

    #[test]
    fn systems() {
        assert_eq!(Direction::K.coordinate_system(), CoordinateSystem::Index);
        assert_eq!(Direction::Time.coordinate_system(), CoordinateSystem::Annotation);
    }
}
