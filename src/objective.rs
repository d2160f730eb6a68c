use faer::Col;

use crate::{E, linalg::vector_ops::axpy};

/// A smooth objective `f(x) -> scalar` with first-order information.
///
/// Only `value` and `gradient` are required; `hess_vec` defaults to a forward
/// difference of the gradient.
pub trait Objective {
    fn value(&self, x: &Col<E>) -> E;

    fn gradient(&self, x: &Col<E>) -> Col<E>;

    /// Hessian-vector product `∇²f(x) v`.
    fn hess_vec(&self, x: &Col<E>, v: &Col<E>) -> Col<E> {
        finite_difference_hess_vec(self, x, v)
    }
}

/// Forward difference of the gradient along `v`.
pub fn finite_difference_hess_vec<O: Objective + ?Sized>(obj: &O, x: &Col<E>, v: &Col<E>) -> Col<E> {
    let vnorm = v.norm_l2();
    if vnorm == 0. {
        return Col::zeros(x.nrows());
    }
    let h = E::EPSILON.sqrt() * E::max(1., x.norm_l2()) / vnorm;

    let g = obj.gradient(x);
    let g_shift = obj.gradient(&axpy(x.as_ref(), h, v.as_ref()));
    let diff = &g_shift - &g;
    (1. / h) * &diff
}

/// An [`Objective`] assembled from closures.
pub struct FnObjective {
    /// Objective function `f(x) -> scalar`.
    f: Box<dyn Fn(&Col<E>) -> E>,
    /// Gradient of the objective `∇f(x)`.
    df: Box<dyn Fn(&Col<E>) -> Col<E>>,
    /// Hessian-vector product `∇²f(x) v` (optional).
    hv: Option<Box<dyn Fn(&Col<E>, &Col<E>) -> Col<E>>>,
}

impl FnObjective {
    pub fn new(f: fn(&Col<E>) -> E, df: fn(&Col<E>) -> Col<E>) -> Self {
        Self {
            f: Box::new(f),
            df: Box::new(df),
            hv: None,
        }
    }

    pub fn new_boxed(f: Box<dyn Fn(&Col<E>) -> E>, df: Box<dyn Fn(&Col<E>) -> Col<E>>) -> Self {
        Self { f, df, hv: None }
    }

    /// Supplies an exact Hessian-vector product in place of finite differences.
    pub fn with_hess_vec(mut self, hv: Box<dyn Fn(&Col<E>, &Col<E>) -> Col<E>>) -> Self {
        self.hv = Some(hv);
        self
    }
}

impl Objective for FnObjective {
    fn value(&self, x: &Col<E>) -> E {
        (self.f)(x)
    }

    fn gradient(&self, x: &Col<E>) -> Col<E> {
        (self.df)(x)
    }

    fn hess_vec(&self, x: &Col<E>, v: &Col<E>) -> Col<E> {
        match &self.hv {
            Some(hv) => (hv)(x, v),
            None => finite_difference_hess_vec(self, x, v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rosenbrock() -> FnObjective {
        FnObjective::new(
            |x| (1. - x[0]).powi(2) + 100. * (x[1] - x[0].powi(2)).powi(2),
            |x| {
                Col::from_fn(2, |i| match i {
                    0 => -2. * (1. - x[0]) - 400. * x[0] * (x[1] - x[0].powi(2)),
                    _ => 200. * (x[1] - x[0].powi(2)),
                })
            },
        )
    }

    #[test]
    fn test_fn_objective_evaluates_closures() {
        let obj = rosenbrock();
        let x = Col::from_fn(2, |i| [1., 1.][i]);
        assert_eq!(obj.value(&x), 0.);
        assert_eq!(obj.gradient(&x), Col::<E>::zeros(2));
    }

    #[test]
    fn test_finite_difference_hess_vec() {
        let obj = rosenbrock();
        let x = Col::from_fn(2, |i| [0.5, -0.25][i]);
        let v = Col::from_fn(2, |i| [1., 2.][i]);

        // Exact Hessian at (0.5, -0.25): [[2 - 400 (y - 3x^2), -400 x], [-400 x, 200]].
        let h11 = 2. - 400. * (-0.25 - 3. * 0.25);
        let expected = Col::from_fn(2, |i| [h11 * 1. - 200. * 2., -200. * 1. + 200. * 2.][i]);

        let hv = obj.hess_vec(&x, &v);
        assert!((&hv - &expected).norm_l2() < 1e-4 * expected.norm_l2());
    }

    #[test]
    fn test_exact_hess_vec_overrides_default() {
        let obj = FnObjective::new(|x| x[0] * x[0], |x| Col::from_fn(1, |_| 2. * x[0]))
            .with_hess_vec(Box::new(|_x, v| Col::from_fn(1, |_| 2. * v[0])));
        let x = Col::from_fn(1, |_| 3.);
        let v = Col::from_fn(1, |_| -1.5);
        assert_eq!(obj.hess_vec(&x, &v)[0], -3.);
        assert_eq!(obj.hess_vec(&x, &Col::zeros(1))[0], 0.);
    }
}
