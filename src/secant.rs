//! Quasi-Newton (secant) approximations of the inverse Hessian.
//!
//! A secant is owned by the outer [`InteriorPointAlgorithm`](crate::ipm::InteriorPointAlgorithm)
//! so its curvature pairs survive from one barrier subproblem to the next,
//! but only the subproblem solver updates or applies it.

use std::collections::VecDeque;

use faer::Col;

use crate::{E, I, linalg::vector_ops::dot};

pub trait Secant {
    /// Adds the curvature pair `s = x_{k+1} - x_k`, `y = g_{k+1} - g_k`.
    fn update(&mut self, s: &Col<E>, y: &Col<E>);

    /// Applies the inverse Hessian approximation, `H v`.
    fn apply_inverse(&self, v: &Col<E>) -> Col<E>;

    /// Drops all stored curvature information.
    fn reset(&mut self);

    /// Number of stored curvature pairs.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Limited-memory BFGS with the standard two-loop recursion.
///
/// Pairs with `s^T y <= 1e-10 ||s|| ||y||` are skipped so the approximation
/// stays positive definite.
#[derive(Clone, Debug)]
pub struct LimitedMemoryBfgs {
    memory: I,
    s_history: VecDeque<Col<E>>,
    y_history: VecDeque<Col<E>>,
    rho_history: VecDeque<E>,
}

impl LimitedMemoryBfgs {
    const CURVATURE_TOL: E = 1e-10;

    pub fn new(memory: I) -> Self {
        let memory = memory.max(1);
        Self {
            memory,
            s_history: VecDeque::with_capacity(memory),
            y_history: VecDeque::with_capacity(memory),
            rho_history: VecDeque::with_capacity(memory),
        }
    }

    pub fn memory(&self) -> I {
        self.memory
    }
}

impl Secant for LimitedMemoryBfgs {
    fn update(&mut self, s: &Col<E>, y: &Col<E>) {
        let sy = dot(s.as_ref(), y.as_ref());
        if !sy.is_finite() || sy <= Self::CURVATURE_TOL * s.norm_l2() * y.norm_l2() {
            return;
        }
        if self.s_history.len() == self.memory {
            self.s_history.pop_front();
            self.y_history.pop_front();
            self.rho_history.pop_front();
        }
        self.s_history.push_back(s.clone());
        self.y_history.push_back(y.clone());
        self.rho_history.push_back(1. / sy);
    }

    fn apply_inverse(&self, v: &Col<E>) -> Col<E> {
        let m = self.s_history.len();
        let mut q = v.clone();
        let mut alpha = vec![E::from(0.); m];

        for i in (0..m).rev() {
            alpha[i] = self.rho_history[i] * dot(self.s_history[i].as_ref(), q.as_ref());
            q -= alpha[i] * &self.y_history[i];
        }

        let gamma = match (self.s_history.back(), self.y_history.back()) {
            (Some(s), Some(y)) => dot(s.as_ref(), y.as_ref()) / dot(y.as_ref(), y.as_ref()),
            _ => 1.,
        };
        let mut r = gamma * &q;

        for i in 0..m {
            let beta = self.rho_history[i] * dot(self.y_history[i].as_ref(), r.as_ref());
            r += (alpha[i] - beta) * &self.s_history[i];
        }
        r
    }

    fn reset(&mut self) {
        self.s_history.clear();
        self.y_history.clear();
        self.rho_history.clear();
    }

    fn len(&self) -> usize {
        self.s_history.len()
    }
}

/// Lets a caller lend a secant to the solver and keep it afterwards.
impl<S: Secant + ?Sized> Secant for &mut S {
    fn update(&mut self, s: &Col<E>, y: &Col<E>) {
        (**self).update(s, y);
    }

    fn apply_inverse(&self, v: &Col<E>) -> Col<E> {
        (**self).apply_inverse(v)
    }

    fn reset(&mut self) {
        (**self).reset();
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}
