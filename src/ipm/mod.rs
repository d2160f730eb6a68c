//! # Interior Point Method for Bound-Constrained Optimization
//!
//! Barrier-continuation outer loop for problems of the form:
//!
//! ```text
//!   min  f(x)
//!   s.t. l <= x <= u
//! ```
//!
//! Every outer iteration approximately minimizes the barrier-augmented
//! objective ([`objective::InteriorPointObjective`]) over the box with a
//! [`SubproblemSolver`], warm-started from the previous iterate. Afterwards
//! three geometric schedules ([`schedule::GeometricSchedule`]) are advanced:
//!
//! ```text
//!   mu   <- max(mu_min,   rho              * mu)
//!   gtol <- max(min_gtol, gtol_shrink_rate * gtol)
//!   stol <- max(min_stol, stol_shrink_rate * stol)
//! ```
//!
//! The inner tolerance `gtol` only controls how accurately each barrier
//! subproblem is solved. The outer loop stops on the projected gradient of
//! the *original* objective, `||P(x - ∇f(x)) - x|| <= gradient_tolerance`,
//! on the outer iteration limit, or when it stalls at `mu_min`.

pub mod objective;
pub mod report;
pub mod schedule;
pub mod state;

use std::io::Write;

use derive_more::{Display, Error};
use faer::Col;
use problemo::{Problem, ProblemResult};

use crate::{
    E, I, SolverOptions, Status,
    bounds::BoundConstraint,
    callback::{Callback, NoOpCallback},
    ipm::{objective::InteriorPointObjective, schedule::GeometricSchedule, state::AlgorithmState},
    linalg::vector_ops::is_col_finite,
    objective::Objective,
    secant::{LimitedMemoryBfgs, Secant},
    subproblem::{SubproblemSolver, SubproblemSolverType, SubproblemTolerances},
};

#[derive(Debug, Display, Error, PartialEq)]
pub enum InteriorPointError {
    #[display("Invalid option '{option}': {reason}")]
    Configuration { option: String, reason: String },

    #[display("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: I, found: I },

    #[display("Empty feasible region: lower bound exceeds upper bound at index {index}")]
    InfeasibleRegion { index: I },

    #[display("Non-finite {quantity}")]
    NumericalFault { quantity: String },

    #[display("Failed to write iteration report")]
    ReportOutput,
}

pub struct InteriorPointAlgorithm<'a> {
    options: SolverOptions,

    subproblem: Box<dyn SubproblemSolver + 'a>,
    secant: Option<Box<dyn Secant + 'a>>,
    callback: Box<dyn Callback + 'a>,

    mu: GeometricSchedule,
    gtol: GeometricSchedule,
    stol: GeometricSchedule,

    state: AlgorithmState,
}

impl<'a> InteriorPointAlgorithm<'a> {
    /// Validates `options` and builds the configured subproblem solver.
    ///
    /// The quasi-Newton subproblem solver gets a [`LimitedMemoryBfgs`] secant
    /// with `secant_memory` pairs; the spectral projected gradient solver
    /// runs without one.
    pub fn new(options: SolverOptions) -> Result<Self, Problem> {
        options.validate()?;
        let solver_type = options.subproblem_type()?;

        let secant: Option<Box<dyn Secant + 'a>> = match solver_type {
            SubproblemSolverType::ProjectedQuasiNewton => {
                Some(Box::new(LimitedMemoryBfgs::new(options.secant_memory)))
            }
            SubproblemSolverType::SpectralProjectedGradient => None,
        };

        Ok(Self {
            subproblem: Box::new(solver_type.build(&options)),
            secant,
            callback: Box::new(NoOpCallback::new()),
            mu: GeometricSchedule::barrier(&options),
            gtol: GeometricSchedule::gradient_tolerance(&options),
            stol: GeometricSchedule::step_tolerance(&options),
            state: AlgorithmState::new(),
            options,
        })
    }

    pub fn with_secant(mut self, secant: Box<dyn Secant + 'a>) -> Self {
        self.secant = Some(secant);
        self
    }

    pub fn without_secant(mut self) -> Self {
        self.secant = None;
        self
    }

    pub fn with_subproblem_solver(mut self, solver: Box<dyn SubproblemSolver + 'a>) -> Self {
        self.subproblem = solver;
        self
    }

    pub fn with_callback(mut self, callback: Box<dyn Callback + 'a>) -> Self {
        self.callback = callback;
        self
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn state(&self) -> &AlgorithmState {
        &self.state
    }

    /// Marks the run as faulted before the error is handed to the caller.
    fn faulted<T>(&mut self, result: Result<T, Problem>) -> Result<T, Problem> {
        if result.is_err() {
            self.state.status = Status::Faulted;
            log::warn!("Interior point method faulted at iteration {}", self.state.iter);
        }
        result
    }

    /// Resets the schedules, moves `x` strictly inside the box and records
    /// the original value, gradient (also written to `g`) and stationarity
    /// of the starting point.
    pub fn initialize(
        &mut self,
        x: &mut Col<E>,
        g: &mut Col<E>,
        ipobj: &mut InteriorPointObjective<'_>,
        bnd: &dyn BoundConstraint,
        pwa: &mut Col<E>,
        out: &mut dyn Write,
    ) -> Result<(), Problem> {
        let result = self.try_initialize(x, g, ipobj, bnd, pwa, out);
        self.faulted(result)
    }

    fn try_initialize(
        &mut self,
        x: &mut Col<E>,
        g: &mut Col<E>,
        ipobj: &mut InteriorPointObjective<'_>,
        bnd: &dyn BoundConstraint,
        pwa: &mut Col<E>,
        out: &mut dyn Write,
    ) -> Result<(), Problem> {
        let n = bnd.dimension();
        if x.nrows() != n {
            return Err(InteriorPointError::DimensionMismatch {
                expected: n,
                found: x.nrows(),
            }
            .into());
        }
        if let Some(index) = bnd.first_empty_index() {
            return Err(InteriorPointError::InfeasibleRegion { index }.into());
        }

        // The barrier is only finite strictly inside the box; fixed coordinates sit on their bound.
        bnd.project_interior(x);

        self.mu.reset();
        self.gtol.reset();
        self.stol.reset();
        ipobj.set_barrier_parameter(self.mu.value());

        *g = original_gradient(ipobj, x)?;
        let value = original_value(ipobj, x)?;
        let gnorm = stationarity(bnd, x, g, pwa);

        self.state = AlgorithmState {
            iter: 0,
            mu: self.mu.value(),
            gtol: self.gtol.value(),
            stol: self.stol.value(),
            subproblem_iter: 0,
            subproblem_converged: false,
            x: x.clone(),
            gradient: g.clone(),
            value,
            gnorm,
            snorm: 0.,
            nfval: ipobj.nfval(),
            ngrad: ipobj.ngrad(),
            converged: false,
            status: Status::InProgress,
            best_gnorm: gnorm,
            stall_count: 0,
        };

        if self.options.verbosity >= 1 {
            report::write_name(out, self.subproblem.name()).via(InteriorPointError::ReportOutput)?;
            report::write_output(out, &self.state, true).via(InteriorPointError::ReportOutput)?;
        }
        log::debug!(
            "ipm: initialized n = {} ({} fixed), mu = {:e}, gtol = {:e}, gnorm = {:e}, linear damping = {}",
            n,
            bnd.fixed_indices().len(),
            self.state.mu,
            self.state.gtol,
            gnorm,
            ipobj.uses_linear_damping()
        );

        self.callback.init(&self.state);
        Ok(())
    }

    /// Records the outcome of one outer iteration at `x` and advances the
    /// schedules.
    ///
    /// The stationarity measure uses the gradient of the original objective.
    /// The new barrier parameter is pushed to `ipobj`, together with the
    /// unchanged damping coefficient held by `ipobj`.
    pub fn update_state(
        &mut self,
        x: &Col<E>,
        ipobj: &mut InteriorPointObjective<'_>,
        bnd: &dyn BoundConstraint,
        pwa: &mut Col<E>,
        out: &mut dyn Write,
    ) -> Result<(), Problem> {
        let result = self.try_update_state(x, ipobj, bnd, pwa, out);
        self.faulted(result)
    }

    fn try_update_state(
        &mut self,
        x: &Col<E>,
        ipobj: &mut InteriorPointObjective<'_>,
        bnd: &dyn BoundConstraint,
        pwa: &mut Col<E>,
        out: &mut dyn Write,
    ) -> Result<(), Problem> {
        let gradient = original_gradient(ipobj, x)?;
        let gnorm = stationarity(bnd, x, &gradient, pwa);

        // Stall bookkeeping refers to the barrier parameter the subproblem was solved with.
        let solved_at_floor = self.mu.at_floor();

        let mu = self.mu.advance();
        let gtol = self.gtol.advance();
        let stol = self.stol.advance();
        ipobj.set_barrier_parameter(mu);

        let value = original_value(ipobj, x)?;

        let state = &mut self.state;
        state.iter += 1;
        state.mu = mu;
        state.gtol = gtol;
        state.stol = stol;
        state.x = x.clone();
        state.gradient = gradient;
        state.value = value;
        state.gnorm = gnorm;
        state.nfval = ipobj.nfval();
        state.ngrad = ipobj.ngrad();

        if solved_at_floor && !(gnorm < state.best_gnorm) {
            state.stall_count += 1;
        } else {
            state.stall_count = 0;
        }
        state.best_gnorm = E::min(state.best_gnorm, gnorm);

        if self.options.verbosity >= 1 {
            let header = self.options.print_header || self.options.verbosity >= 2;
            report::write_output(out, &self.state, header).via(InteriorPointError::ReportOutput)?;
        }
        log::debug!(
            "ipm: iter = {}, mu = {:e}, gtol = {:e}, gnorm = {:e}, subiter = {}, damped = {}",
            self.state.iter,
            mu,
            gtol,
            gnorm,
            self.state.subproblem_iter,
            ipobj.damped_coordinates(x).len()
        );

        self.callback.call(&self.state);
        Ok(())
    }

    /// Minimizes `obj` over `bnd` starting from `x`.
    ///
    /// On return `x` holds the final iterate, `g` the gradient of `obj` there,
    /// and [`state`](Self::state) the terminal diagnostics. Faults of the
    /// objective or the subproblem solver are returned unchanged after the
    /// status has been set to [`Status::Faulted`].
    pub fn run(
        &mut self,
        x: &mut Col<E>,
        g: &mut Col<E>,
        obj: &dyn Objective,
        bnd: &dyn BoundConstraint,
        out: &mut dyn Write,
    ) -> Result<Status, Problem> {
        if let Some(secant) = self.secant.as_mut() {
            secant.reset();
        }

        let mut ipobj = InteriorPointObjective::new(
            obj,
            bnd,
            self.options.mu_max,
            self.options.kappa_d,
            self.options.use_linear_damping,
        );
        let mut pwa = Col::zeros(bnd.dimension());
        self.initialize(x, g, &mut ipobj, bnd, &mut pwa, out)?;

        let mut status = Status::IterationLimit;
        while self.state.iter < self.options.max_outer_iterations {
            let tolerances = SubproblemTolerances {
                gtol: self.state.gtol,
                stol: self.state.stol,
                max_iterations: self.options.max_inner_iterations,
            };

            let x_old = x.clone();
            let secant = match self.secant.as_mut() {
                Some(secant) => {
                    let secant: &mut dyn Secant = &mut **secant;
                    Some(secant)
                }
                None => None,
            };
            let result = self.subproblem.solve(&ipobj, bnd, x, &tolerances, secant);
            let report = self.faulted(result)?;
            bnd.project(x);

            self.state.subproblem_iter = report.iterations;
            self.state.subproblem_converged = report.converged;
            self.state.snorm = (&*x - &x_old).norm_l2();
            if !report.converged {
                log::warn!(
                    "{} stopped without converging after {} iterations (mu = {:e}, gtol = {:e})",
                    self.subproblem.name(),
                    report.iterations,
                    self.state.mu,
                    tolerances.gtol
                );
            }

            self.update_state(x, &mut ipobj, bnd, &mut pwa, out)?;
            *g = self.state.gradient.clone();

            if self.state.gnorm <= self.options.gradient_tolerance {
                status = Status::Converged;
                break;
            }
            if self.state.stall_count >= self.options.max_stall_iterations {
                log::warn!(
                    "No progress in stationarity for {} iterations at mu = {:e}",
                    self.state.stall_count,
                    self.state.mu
                );
                status = Status::Stalled;
                break;
            }
        }

        self.state.status = status;
        self.state.converged = status == Status::Converged;
        log::info!(
            "Interior point method finished with status '{}' after {} iterations (gnorm = {:e})",
            status,
            self.state.iter,
            self.state.gnorm
        );
        if self.options.verbosity >= 1 {
            writeln!(out, "Optimization terminated: {}", status).via(InteriorPointError::ReportOutput)?;
        }
        Ok(status)
    }
}

/// Stationarity measure `||P(x - g) - x||`, using `pwa` as scratch.
fn stationarity(bnd: &dyn BoundConstraint, x: &Col<E>, g: &Col<E>, pwa: &mut Col<E>) -> E {
    *pwa = x - g;
    bnd.project(pwa);
    (&*pwa - x).norm_l2()
}

fn original_gradient(ipobj: &InteriorPointObjective<'_>, x: &Col<E>) -> Result<Col<E>, InteriorPointError> {
    let g = ipobj.objective_gradient(x);
    if g.nrows() != x.nrows() {
        return Err(InteriorPointError::DimensionMismatch {
            expected: x.nrows(),
            found: g.nrows(),
        });
    }
    if !is_col_finite(g.as_ref()) {
        return Err(InteriorPointError::NumericalFault {
            quantity: "objective gradient".to_string(),
        });
    }
    Ok(g)
}

fn original_value(ipobj: &InteriorPointObjective<'_>, x: &Col<E>) -> Result<E, InteriorPointError> {
    let value = ipobj.objective_value(x);
    if !value.is_finite() {
        return Err(InteriorPointError::NumericalFault {
            quantity: "objective value".to_string(),
        });
    }
    Ok(value)
}
