//! # boxbarrier
//!
//! Barrier-continuation interior point method for bound-constrained problems
//! of the form:
//!
//! ```text
//!   min  f(x)
//!   s.t. l <= x <= u
//! ```
//!
//! The outer loop ([`ipm::InteriorPointAlgorithm`]) repeatedly minimizes the
//! barrier-augmented objective
//!
//! ```text
//!   f(x) + mu * sum_i phi_i(x_i)
//! ```
//!
//! with a generic bound-constrained [`subproblem::SubproblemSolver`], shrinking
//! the barrier parameter `mu` and the inner gradient tolerance after every
//! solve until the projected gradient of the original objective is small.

use derive_more::Display;

pub type E = f64;
pub type I = usize;

pub mod bounds;
pub mod callback;
pub mod ipm;
pub mod linalg;
pub mod objective;
pub mod options;
pub mod secant;
pub mod subproblem;


pub use bounds::{BoundConstraint, BoxConstraint};
pub use ipm::{InteriorPointAlgorithm, InteriorPointError, state::AlgorithmState};
pub use objective::{FnObjective, Objective};
pub use options::SolverOptions;

/// Terminal and intermediate states of the outer loop.
#[derive(Copy, Clone, Debug, Default, Display, PartialEq, Eq)]
pub enum Status {
    #[default]
    #[display("Not Started")]
    NotStarted,
    #[display("In Progress")]
    InProgress,
    #[display("Converged")]
    Converged,
    #[display("Iteration Limit Reached")]
    IterationLimit,
    #[display("Stalled")]
    Stalled,
    #[display("Faulted")]
    Faulted,
}

impl Status {
    /// Returns `true` once `run` has nothing left to do.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Status::Converged | Status::IterationLimit | Status::Stalled | Status::Faulted
        )
    }
}
