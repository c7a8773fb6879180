use nalgebra::{DMatrix, DVector, RealField};

/// Poor man's approx assertion for matrices
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = $x - $y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

#[macro_export]
macro_rules! assert_panics {
    ($e:expr) => {{
        use std::panic::catch_unwind;
        use std::stringify;
        let expr_string = stringify!($e);
        let result = catch_unwind(|| $e);
        if result.is_ok() {
            panic!("assert_panics!({}) failed.", expr_string);
        }
    }};
}

/// Approximates the Jacobian of $f: \mathbb{R}^n \rightarrow \mathbb{R}^m$ at `x` with central
/// differences of step size `h`.
///
/// `f(x, out)` must write the `m` function values into `out`.
pub fn approximate_jacobian_fd<T>(m: usize, mut f: impl FnMut(&DVector<T>, &mut DVector<T>), x: &DVector<T>, h: T) -> DMatrix<T>
where
    T: RealField + Copy,
{
    let n = x.len();
    let mut jacobian = DMatrix::zeros(m, n);

    let mut x_perturbed = x.clone();
    let mut f_plus = DVector::zeros(m);
    let mut f_minus = DVector::zeros(m);
    let two_h = h + h;

    for j in 0..n {
        x_perturbed[j] = x[j] + h;
        f(&x_perturbed, &mut f_plus);
        x_perturbed[j] = x[j] - h;
        f(&x_perturbed, &mut f_minus);
        x_perturbed[j] = x[j];

        // J[.., j] := (f+ - f-) / 2h
        let mut column_j = jacobian.column_mut(j);
        column_j += &f_plus;
        column_j -= &f_minus;
        column_j /= two_h;
    }

    jacobian
}
