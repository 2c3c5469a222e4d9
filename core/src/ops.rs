use ndarray::{ArrayView, ArrayViewMut, Dimension, Zip};
use serde::{Deserialize, Serialize};

/// Elementwise operator combining the values of two cubes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

impl BinaryOperator {
    pub fn apply(&self, a: f32, b: f32) -> f32 {
        match self {
            BinaryOperator::Addition => a + b,
            BinaryOperator::Subtraction => a - b,
            BinaryOperator::Multiplication => a * b,
            BinaryOperator::Division => a / b,
        }
    }

    /// Writes `a OP b` to `out` elementwise. All three must have the same shape.
    pub fn combine<D: Dimension>(
        &self,
        a: ArrayView<f32, D>,
        b: ArrayView<f32, D>,
        out: ArrayViewMut<f32, D>,
    ) {
        Zip::from(out)
            .and(a)
            .and(b)
            .for_each(|out, &a, &b| *out = self.apply(a, b));
    }

    pub fn combine_slices(&self, a: &[f32], b: &[f32], out: &mut [f32]) {
        self.combine(ArrayView::from(a), ArrayView::from(b), ArrayViewMut::from(out));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operand_order() {
        let a = [8.0, 3.0];
        let b = [2.0, 5.0];
        let mut out = [0.0; 2];

        BinaryOperator::Subtraction.combine_slices(&a, &b, &mut out);
        assert_eq!(out, [6.0, -2.0]);

        BinaryOperator::Division.combine_slices(&a, &b, &mut out);
        assert_eq!(out, [4.0, 0.6]);

        BinaryOperator::Division.combine_slices(&b, &a, &mut out);
        assert_eq!(out, [0.25, 5.0 / 3.0]);
    }

    #[test]
    fn commutative_operators() {
        let a = [1.5, -2.0, 4.0];
        let b = [0.5, 3.0, -1.0];
        let mut ab = [0.0; 3];
        let mut ba = [0.0; 3];

        for op in [BinaryOperator::Addition, BinaryOperator::Multiplication] {
            op.combine_slices(&a, &b, &mut ab);
            op.combine_slices(&b, &a, &mut ba);
            assert_eq!(ab, ba, "{op:?}");
        }
        BinaryOperator::Addition.combine_slices(&a, &b, &mut ab);
        assert_eq!(ab, [2.0, 1.0, 3.0]);
    }

    #[test]
    fn combines_cropped_views() {
        use ndarray::{s, Array2};

        let a = Array2::from_shape_fn((2, 4), |(i, j)| (i * 4 + j) as f32);
        let b = Array2::from_elem((2, 2), 1.0);
        let mut out = Array2::zeros((2, 2));
        BinaryOperator::Subtraction.combine(a.slice(s![.., 1..3]), b.view(), out.view_mut());
        assert_eq!(out, ndarray::arr2(&[[0.0, 1.0], [4.0, 5.0]]));
    }

    #[test]
    fn division_by_zero_is_ieee() {
        assert!(BinaryOperator::Division.apply(1.0, 0.0).is_infinite());
        assert!(BinaryOperator::Division.apply(0.0, 0.0).is_nan());
    }
}
