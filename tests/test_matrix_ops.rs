//! Tests for dense matrix arithmetic
//!
//! Covers products, element-wise operators, transposition, classification
//! and the shape contract.

use approx::assert_relative_eq;
use mlp_trainer::Matrix;

// ============================================================================
// Product Tests
// ============================================================================

mod product_tests {
    use super::*;

    #[test]
    fn test_matmul_2x3_by_3x4() {
        let a = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = Matrix::from_vec(
            3,
            4,
            vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0],
        );
        let c = a.matmul(&b);

        assert_eq!(c.shape(), (2, 4));
        assert_eq!(
            c.as_slice(),
            &[74.0, 80.0, 86.0, 92.0, 173.0, 188.0, 203.0, 218.0]
        );
    }

    #[test]
    fn test_mul_operator_is_matmul() {
        let a = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        let b = Matrix::from_vec(2, 2, vec![0.5, -1.0, 2.0, 0.0]);
        assert_eq!(&a * &b, a.matmul(&b));
    }

    #[test]
    fn test_row_times_matrix() {
        let x = Matrix::row_vector(vec![1.0, -1.0]);
        let w = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(x.matmul(&w).as_slice(), &[-3.0, -3.0, -3.0]);
    }

    #[test]
    #[should_panic(expected = "matmul requires lhs cols == rhs rows")]
    fn test_matmul_inner_mismatch() {
        let a = Matrix::new(2, 3);
        let b = Matrix::new(2, 3);
        let _ = a.matmul(&b);
    }
}

// ============================================================================
// Element-wise Tests
// ============================================================================

mod elementwise_tests {
    use super::*;

    fn lhs() -> Matrix {
        Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0])
    }

    fn rhs() -> Matrix {
        Matrix::from_vec(2, 2, vec![0.5, 0.5, -1.0, 2.0])
    }

    #[test]
    fn test_add_sub() {
        assert_eq!((&lhs() + &rhs()).as_slice(), &[1.5, 2.5, 2.0, 6.0]);
        assert_eq!((&lhs() - &rhs()).as_slice(), &[0.5, 1.5, 4.0, 2.0]);

        let mut m = lhs();
        m += &rhs();
        m -= &rhs();
        assert_eq!(m, lhs());
    }

    #[test]
    fn test_hadamard() {
        assert_eq!(lhs().hadamard(&rhs()).as_slice(), &[0.5, 1.0, -3.0, 8.0]);

        let mut m = lhs();
        m.hadamard_in_place(&rhs());
        assert_eq!(m, lhs().hadamard(&rhs()));
    }

    #[test]
    fn test_scalar() {
        assert_eq!((&lhs() * 0.5).as_slice(), &[0.5, 1.0, 1.5, 2.0]);

        let mut m = lhs();
        m *= -2.0;
        assert_eq!(m.as_slice(), &[-2.0, -4.0, -6.0, -8.0]);
    }

    #[test]
    fn test_map_and_sum() {
        let squared = lhs().map(|x| x * x);
        assert_relative_eq!(squared.sum(), 30.0);
    }

    #[test]
    #[should_panic(expected = "shape mismatch")]
    fn test_add_shape_mismatch() {
        let _ = &Matrix::new(1, 3) + &Matrix::new(3, 1);
    }

    #[test]
    #[should_panic(expected = "shape mismatch")]
    fn test_hadamard_shape_mismatch() {
        let _ = Matrix::new(2, 2).hadamard(&Matrix::new(1, 4));
    }
}

// ============================================================================
// Shape and Classification Tests
// ============================================================================

mod shape_tests {
    use super::*;

    #[test]
    fn test_transpose() {
        let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let t = m.transpose();

        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(t.transpose(), m);
    }

    #[test]
    fn test_classify_picks_largest() {
        let row = Matrix::row_vector(vec![0.0, -1.0, 0.0, 1.0, 0.5]);
        assert_eq!(row.classify(), 3);
    }

    #[test]
    fn test_classify_ties_go_to_first() {
        let row = Matrix::row_vector(vec![0.2, 0.9, 0.9, 0.1]);
        assert_eq!(row.classify(), 1);
    }

    #[test]
    fn test_one_hot_classifies_to_its_index() {
        for i in 0..5 {
            assert_eq!(Matrix::one_hot(5, i).classify(), i);
        }
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_get_out_of_bounds() {
        let _ = Matrix::new(2, 2).get(2, 0);
    }
}
