//! Bound-constrained subproblem solvers.
//!
//! A [`SubproblemSolver`] approximately minimizes an arbitrary [`Objective`]
//! over a box, stopping once the projected gradient norm
//! `||P(x - ∇F(x)) - x||` falls below the gradient tolerance it was handed.
//! The outer interior point loop hands it the barrier-augmented objective.

pub mod line_search;
pub mod quasi_newton;
pub mod spg;

use std::str::FromStr;

use enum_dispatch::enum_dispatch;
use faer::Col;
use problemo::Problem;

use crate::{
    E, I, SolverOptions,
    bounds::BoundConstraint,
    ipm::InteriorPointError,
    linalg::vector_ops::is_col_finite,
    objective::Objective,
    secant::Secant,
    subproblem::{quasi_newton::ProjectedQuasiNewton, spg::SpectralProjectedGradient},
};

/// Stopping criteria handed to a subproblem solve.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SubproblemTolerances {
    /// Projected gradient norm at which the solve counts as converged.
    pub gtol: E,
    /// Step norm below which the solve stops.
    pub stol: E,
    pub max_iterations: I,
}

/// Diagnostics returned by a subproblem solve.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SubproblemReport {
    pub iterations: I,
    pub converged: bool,
}

#[enum_dispatch]
pub trait SubproblemSolver {
    fn name(&self) -> &'static str;

    /// Approximately minimizes `obj` over `bnd`, starting from (and
    /// overwriting) `x`. The returned iterate always satisfies the bounds.
    fn solve(
        &mut self,
        obj: &dyn Objective,
        bnd: &dyn BoundConstraint,
        x: &mut Col<E>,
        tolerances: &SubproblemTolerances,
        secant: Option<&mut dyn Secant>,
    ) -> Result<SubproblemReport, Problem>;
}

/// The subproblem solvers shipped with the crate.
#[enum_dispatch(SubproblemSolver)]
pub enum SubproblemSolvers {
    SpectralProjectedGradient,
    ProjectedQuasiNewton,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SubproblemSolverType {
    #[default]
    SpectralProjectedGradient,
    ProjectedQuasiNewton,
}

impl FromStr for SubproblemSolverType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spectral_projected_gradient" | "spg" => {
                Ok(SubproblemSolverType::SpectralProjectedGradient)
            }
            "projected_quasi_newton" | "quasi_newton" | "lbfgs" => {
                Ok(SubproblemSolverType::ProjectedQuasiNewton)
            }
            _ => Err(format!("Invalid subproblem solver type: {}", s)),
        }
    }
}

impl SubproblemSolverType {
    pub fn build(&self, options: &SolverOptions) -> SubproblemSolvers {
        match self {
            SubproblemSolverType::SpectralProjectedGradient => {
                SpectralProjectedGradient::new(options).into()
            }
            SubproblemSolverType::ProjectedQuasiNewton => ProjectedQuasiNewton::new(options).into(),
        }
    }
}

/// Projected gradient `P(x - g) - x`; its norm is the stationarity measure
/// shared by the inner and outer loops.
pub fn projected_gradient(bnd: &dyn BoundConstraint, x: &Col<E>, g: &Col<E>) -> Col<E> {
    let mut pwa = x - g;
    bnd.project(&mut pwa);
    pwa - x
}

/// Evaluates the gradient and fails on non-finite entries.
pub(crate) fn checked_gradient(
    obj: &dyn Objective,
    x: &Col<E>,
    quantity: &str,
) -> Result<Col<E>, InteriorPointError> {
    let g = obj.gradient(x);
    if !is_col_finite(g.as_ref()) {
        return Err(InteriorPointError::NumericalFault {
            quantity: quantity.to_string(),
        });
    }
    Ok(g)
}

/// Evaluates the objective and fails on a non-finite value.
pub(crate) fn checked_value(
    obj: &dyn Objective,
    x: &Col<E>,
    quantity: &str,
) -> Result<E, InteriorPointError> {
    let value = obj.value(x);
    if !value.is_finite() {
        return Err(InteriorPointError::NumericalFault {
            quantity: quantity.to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
pub(crate) mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{BoxConstraint, FnObjective, secant::LimitedMemoryBfgs};

    pub(crate) fn col(values: &[E]) -> Col<E> {
        Col::from_fn(values.len(), |i| values[i])
    }

    /// `sum_i w_i (x_i - c_i)^2` with `c = (1, -2, 3)`, `w = (1, 10, 0.5)`.
    pub(crate) fn weighted_quadratic() -> FnObjective {
        FnObjective::new(
            |x| (x[0] - 1.).powi(2) + 10. * (x[1] + 2.).powi(2) + 0.5 * (x[2] - 3.).powi(2),
            |x| col(&[2. * (x[0] - 1.), 20. * (x[1] + 2.), x[2] - 3.]),
        )
    }

    #[rstest]
    #[case("spg", SubproblemSolverType::SpectralProjectedGradient)]
    #[case("Spectral_Projected_Gradient", SubproblemSolverType::SpectralProjectedGradient)]
    #[case("lbfgs", SubproblemSolverType::ProjectedQuasiNewton)]
    #[case("projected_quasi_newton", SubproblemSolverType::ProjectedQuasiNewton)]
    fn test_solver_type_from_str(#[case] name: &str, #[case] expected: SubproblemSolverType) {
        assert_eq!(name.parse::<SubproblemSolverType>().unwrap(), expected);
    }

    #[test]
    fn test_projected_gradient() {
        let bnd = BoxConstraint::new(col(&[0., 0.]), col(&[1., 1.]));
        let x = col(&[0., 0.5]);
        let g = col(&[1., -2.]);
        // x - g = (-1, 2.5) projects to (0, 1).
        assert_eq!(projected_gradient(&bnd, &x, &g), col(&[0., 0.5]));
    }

    #[rstest]
    fn test_solvers_reach_box_minimizer(
        #[values(
            SubproblemSolverType::SpectralProjectedGradient,
            SubproblemSolverType::ProjectedQuasiNewton
        )]
        solver_type: SubproblemSolverType,
        #[values(true, false)] with_secant: bool,
    ) {
        let obj = weighted_quadratic();
        // The unconstrained minimizer violates the upper bound on x[2].
        let bnd = BoxConstraint::new(col(&[0., -5., -1.]), col(&[4., 5., 2.]));
        let mut x = col(&[4., 5., -1.]);
        let tolerances = SubproblemTolerances {
            gtol: 1e-10,
            stol: 1e-14,
            max_iterations: 500,
        };

        let mut solver = solver_type.build(&SolverOptions::new());
        let mut secant = LimitedMemoryBfgs::new(5);
        let secant_ref: Option<&mut dyn Secant> = if with_secant {
            Some(&mut secant)
        } else {
            None
        };

        let report = solver
            .solve(&obj, &bnd, &mut x, &tolerances, secant_ref)
            .unwrap();

        assert!(report.converged, "{}: {:?}", solver.name(), report);
        assert!(report.iterations <= tolerances.max_iterations);
        assert!(bnd.is_feasible(&x));
        assert!((&x - &col(&[1., -2., 2.])).norm_l2() < 1e-8);
    }

    #[rstest]
    fn test_solvers_respect_iteration_budget(
        #[values(
            SubproblemSolverType::SpectralProjectedGradient,
            SubproblemSolverType::ProjectedQuasiNewton
        )]
        solver_type: SubproblemSolverType,
    ) {
        let obj = weighted_quadratic();
        let bnd = BoxConstraint::unbounded(3);
        let mut x = col(&[10., 10., 10.]);
        let tolerances = SubproblemTolerances {
            gtol: 1e-14,
            stol: 0.,
            max_iterations: 2,
        };

        let mut solver = solver_type.build(&SolverOptions::new());
        let report = solver.solve(&obj, &bnd, &mut x, &tolerances, None).unwrap();
        assert!(report.iterations <= 2);
        assert!(!report.converged);
    }

    #[test]
    fn test_non_finite_gradient_is_a_fault() {
        let obj = FnObjective::new(|x| x[0], |_x| col(&[E::NAN]));
        let bnd = BoxConstraint::unbounded(1);
        let mut x = col(&[1.]);
        let tolerances = SubproblemTolerances {
            gtol: 1e-8,
            stol: 1e-12,
            max_iterations: 10,
        };

        let mut solver = SubproblemSolverType::SpectralProjectedGradient.build(&SolverOptions::new());
        assert!(solver.solve(&obj, &bnd, &mut x, &tolerances, None).is_err());
    }
}
