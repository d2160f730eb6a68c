use faer::Col;

use crate::{E, I, Status};

/// Outer-loop state of the interior point method.
///
/// Only [`InteriorPointAlgorithm`](crate::ipm::InteriorPointAlgorithm) writes
/// to it; callbacks and reports read it.
#[derive(Clone, Debug)]
pub struct AlgorithmState {
    /// Completed outer iterations.
    pub iter: I,
    /// Barrier parameter `mu`.
    pub mu: E,
    /// Gradient tolerance handed to the next subproblem solve.
    pub gtol: E,
    /// Step tolerance handed to the next subproblem solve.
    pub stol: E,
    /// Iterations of the most recent subproblem solve (not accumulated).
    pub subproblem_iter: I,
    pub subproblem_converged: bool,

    /// Current iterate; always inside the box.
    pub x: Col<E>,
    /// Gradient of the original (un-augmented) objective at `x`.
    pub gradient: Col<E>,
    /// Original objective value at `x`.
    pub value: E,
    /// Stationarity measure `||P(x - ∇f(x)) - x||`.
    pub gnorm: E,
    /// Norm of the last outer step.
    pub snorm: E,

    /// Evaluations of the original objective.
    pub nfval: I,
    pub ngrad: I,

    pub converged: bool,
    pub status: Status,

    /// Smallest `gnorm` seen so far.
    pub best_gnorm: E,
    /// Consecutive outer iterations at `mu_min` without improving `best_gnorm`.
    pub stall_count: I,
}

impl AlgorithmState {
    pub fn new() -> Self {
        Self {
            iter: 0,
            mu: 0.,
            gtol: 0.,
            stol: 0.,
            subproblem_iter: 0,
            subproblem_converged: false,
            x: Col::zeros(0),
            gradient: Col::zeros(0),
            value: E::NAN,
            gnorm: E::INFINITY,
            snorm: E::INFINITY,
            nfval: 0,
            ngrad: 0,
            converged: false,
            status: Status::NotStarted,
            best_gnorm: E::INFINITY,
            stall_count: 0,
        }
    }
}

impl Default for AlgorithmState {
    fn default() -> Self {
        Self::new()
    }
}
