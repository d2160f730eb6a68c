//! The barrier-augmented objective minimized by each subproblem.
//!
//! For a box `l <= x <= u` the barrier term of coordinate `i` is
//!
//! ```text
//!   both bounds finite:  -ln(x_i - l_i) - ln(u_i - x_i)
//!   only l_i finite:     -ln(x_i - l_i) + kappa_d (x_i - l_i)
//!   only u_i finite:     -ln(u_i - x_i) + kappa_d (u_i - x_i)
//!   no finite bound:     0
//!   fixed (l_i == u_i):  0 at x_i = l_i
//! ```
//!
//! where the linear `kappa_d` terms are only present with linear damping.
//! They keep the barrier bounded below along the unbounded direction. The
//! augmented objective is `f(x) + mu * sum_i phi_i(x_i)`.

use std::cell::Cell;

use faer::Col;

use crate::{
    E, I,
    bounds::BoundConstraint,
    linalg::vector_ops::cwise_multiply,
    objective::Objective,
};

/// Barrier value and its first two derivatives for one coordinate, or `None`
/// if `x` is not strictly inside a finite bound. A fixed coordinate carries no
/// barrier and is only admissible at its bound.
fn barrier_term(x: E, l: E, u: E, kappa_d: Option<E>) -> Option<(E, E, E)> {
    if l == u {
        return (x == l).then_some((0., 0., 0.));
    }
    match (l.is_finite(), u.is_finite()) {
        (true, true) => {
            let (dl, du) = (x - l, u - x);
            if !(dl > 0. && du > 0.) {
                return None;
            }
            Some((
                -dl.ln() - du.ln(),
                -1. / dl + 1. / du,
                1. / (dl * dl) + 1. / (du * du),
            ))
        }
        (true, false) => {
            let dl = x - l;
            if !(dl > 0.) {
                return None;
            }
            let k = kappa_d.unwrap_or(0.);
            Some((-dl.ln() + k * dl, -1. / dl + k, 1. / (dl * dl)))
        }
        (false, true) => {
            let du = u - x;
            if !(du > 0.) {
                return None;
            }
            let k = kappa_d.unwrap_or(0.);
            Some((-du.ln() + k * du, 1. / du - k, 1. / (du * du)))
        }
        (false, false) => Some((0., 0., 0.)),
    }
}

/// `f(x) + mu * barrier(x)` over a fixed box.
///
/// The controller owns the only mutable handle and changes `mu` between
/// subproblem solves with [`InteriorPointObjective::set_barrier_parameter`];
/// subproblem solvers only see it as a `&dyn Objective`.
pub struct InteriorPointObjective<'a> {
    obj: &'a dyn Objective,
    bnd: &'a dyn BoundConstraint,
    mu: E,
    kappa_d: E,
    use_linear_damping: bool,

    nfval: Cell<I>,
    ngrad: Cell<I>,
}

impl<'a> InteriorPointObjective<'a> {
    pub fn new(
        obj: &'a dyn Objective,
        bnd: &'a dyn BoundConstraint,
        mu: E,
        kappa_d: E,
        use_linear_damping: bool,
    ) -> Self {
        Self {
            obj,
            bnd,
            mu,
            kappa_d,
            use_linear_damping,
            nfval: Cell::new(0),
            ngrad: Cell::new(0),
        }
    }

    pub fn set_barrier_parameter(&mut self, mu: E) {
        self.mu = mu;
    }

    pub fn barrier_parameter(&self) -> E {
        self.mu
    }

    pub fn damping_coefficient(&self) -> E {
        self.kappa_d
    }

    pub fn uses_linear_damping(&self) -> bool {
        self.use_linear_damping
    }

    fn damping(&self) -> Option<E> {
        self.use_linear_damping.then_some(self.kappa_d)
    }

    /// Number of evaluations of the wrapped objective's value.
    pub fn nfval(&self) -> I {
        self.nfval.get()
    }

    /// Number of evaluations of the wrapped objective's gradient.
    pub fn ngrad(&self) -> I {
        self.ngrad.get()
    }

    /// Value of the un-augmented objective `f(x)`.
    pub fn objective_value(&self, x: &Col<E>) -> E {
        self.nfval.set(self.nfval.get() + 1);
        self.obj.value(x)
    }

    /// Gradient of the un-augmented objective `∇f(x)`.
    pub fn objective_gradient(&self, x: &Col<E>) -> Col<E> {
        self.ngrad.set(self.ngrad.get() + 1);
        self.obj.gradient(x)
    }

    /// `sum_i phi_i(x_i)`; `+inf` outside the interior of the box.
    pub fn barrier_value(&self, x: &Col<E>) -> E {
        let (l, u) = (self.bnd.lower(), self.bnd.upper());
        let mut total = 0.;
        for i in 0..x.nrows() {
            match barrier_term(x[i], l[i], u[i], self.damping()) {
                Some((phi, _, _)) => total += phi,
                None => return E::INFINITY,
            }
        }
        total
    }

    /// `∇ sum_i phi_i(x_i)`. Coordinates outside the interior get an infinite
    /// entry pointing back into the box.
    pub fn barrier_gradient(&self, x: &Col<E>) -> Col<E> {
        let (l, u) = (self.bnd.lower(), self.bnd.upper());
        let damping = self.damping();
        Col::from_fn(x.nrows(), |i| match barrier_term(x[i], l[i], u[i], damping) {
            Some((_, dphi, _)) => dphi,
            None if l[i].is_finite() && !(x[i] - l[i] > 0.) => E::NEG_INFINITY,
            None => E::INFINITY,
        })
    }

    /// Diagonal of the barrier Hessian.
    pub fn barrier_hessian_diagonal(&self, x: &Col<E>) -> Col<E> {
        let (l, u) = (self.bnd.lower(), self.bnd.upper());
        let damping = self.damping();
        Col::from_fn(x.nrows(), |i| match barrier_term(x[i], l[i], u[i], damping) {
            Some((_, _, d2phi)) => d2phi,
            None => E::INFINITY,
        })
    }

    /// Coordinates whose barrier carries a linear damping term at `x`:
    /// those with exactly one finite bound, when damping is enabled.
    pub fn damped_coordinates(&self, x: &Col<E>) -> Vec<usize> {
        if !self.use_linear_damping {
            return Vec::new();
        }
        let (l, u) = (self.bnd.lower(), self.bnd.upper());
        (0..x.nrows())
            .filter(|&i| l[i].is_finite() != u[i].is_finite())
            .collect()
    }

    pub fn is_linear_damping_active(&self, x: &Col<E>) -> bool {
        !self.damped_coordinates(x).is_empty()
    }
}

impl<'a> Objective for InteriorPointObjective<'a> {
    fn value(&self, x: &Col<E>) -> E {
        let barrier = self.barrier_value(x);
        if barrier == E::INFINITY {
            return E::INFINITY;
        }
        self.objective_value(x) + self.mu * barrier
    }

    fn gradient(&self, x: &Col<E>) -> Col<E> {
        let g = self.objective_gradient(x);
        let barrier = self.barrier_gradient(x);
        g + self.mu * &barrier
    }

    fn hess_vec(&self, x: &Col<E>, v: &Col<E>) -> Col<E> {
        let hv = self.obj.hess_vec(x, v);
        let diagonal = self.barrier_hessian_diagonal(x);
        hv + self.mu * &cwise_multiply(diagonal.as_ref(), v.as_ref())
    }
}
