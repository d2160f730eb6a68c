use faer::{Col, ColRef, unzip, zip};

use crate::E;

pub(crate) fn cwise_multiply<'a>(x1: ColRef<'a, E>, x2: ColRef<'a, E>) -> Col<E> {
    let mut out = Col::<E>::zeros(x1.nrows());

    zip!(x1, x2, out.as_mut()).for_each(|unzip!(x1, x2, out)| *out = *x1 * *x2);

    out
}

pub(crate) fn dot<'a>(x1: ColRef<'a, E>, x2: ColRef<'a, E>) -> E {
    let mut acc = E::from(0.);

    zip!(x1, x2).for_each(|unzip!(x1, x2)| acc += *x1 * *x2);

    acc
}

/// `x + alpha * d`, without projection.
pub(crate) fn axpy<'a>(x: ColRef<'a, E>, alpha: E, d: ColRef<'a, E>) -> Col<E> {
    let mut out = Col::<E>::zeros(x.nrows());

    zip!(x, d, out.as_mut()).for_each(|unzip!(x, d, out)| *out = *x + alpha * *d);

    out
}

pub(crate) fn is_col_finite<'a>(x: ColRef<'a, E>) -> bool {
    let mut res = true;
    zip!(x).for_each(|unzip!(x)| {
        if !x.is_finite() {
            res = false
        }
    });
    res
}

pub(crate) fn col_max_abs<'a>(x: ColRef<'a, E>) -> E {
    let mut maximum = E::from(0.);

    zip!(x).for_each(|unzip!(x)| maximum = E::max(maximum, x.abs()));

    maximum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot() {
        let x1 = Col::from_fn(3, |i| [1.0, 2.0, 3.0][i]);
        let x2 = Col::from_fn(3, |i| [4.0, -5.0, 6.0][i]);
        assert_eq!(dot(x1.as_ref(), x2.as_ref()), 12.0);
    }

    #[test]
    fn test_axpy() {
        let x = Col::from_fn(2, |i| [1.0, 2.0][i]);
        let d = Col::from_fn(2, |i| [-1.0, 0.5][i]);
        let result = axpy(x.as_ref(), 2.0, d.as_ref());
        assert_eq!(result, Col::from_fn(2, |i| [-1.0, 3.0][i]));
    }

    #[test]
    fn test_is_col_finite() {
        let x1 = Col::from_fn(3, |i| [1.0, 2.0, 3.0][i]);
        let x2 = Col::from_fn(3, |i| [1.0, E::NAN, 3.0][i]);
        let x3 = Col::from_fn(3, |i| [1.0, E::INFINITY, 3.0][i]);
        assert!(is_col_finite(x1.as_ref()));
        assert!(!is_col_finite(x2.as_ref()));
        assert!(!is_col_finite(x3.as_ref()));
    }

    #[test]
    fn test_col_max_abs() {
        let x = Col::from_fn(3, |i| [1.0, -7.5, 3.0][i]);
        assert_eq!(col_max_abs(x.as_ref()), 7.5);
        assert_eq!(cwise_multiply(x.as_ref(), x.as_ref())[1], 56.25);
    }
}
