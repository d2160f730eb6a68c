use faer::Col;
use problemo::Problem;

use crate::{
    E, SolverOptions,
    bounds::BoundConstraint,
    linalg::vector_ops::{col_max_abs, dot},
    objective::Objective,
    secant::Secant,
    subproblem::{
        SubproblemReport, SubproblemSolver, SubproblemTolerances, checked_gradient, checked_value,
        line_search::{BacktrackingLineSearch, LineSearch},
        projected_gradient,
    },
};

/// Safeguards on the spectral step length.
const LAMBDA_MIN: E = 1e-10;
const LAMBDA_MAX: E = 1e10;

/// Spectral projected gradient method for bound-constrained problems.
///
/// Each iteration searches along `d = P(x - λ ∇F(x)) - x`, where `λ` is the
/// Barzilai-Borwein step length `s^T s / s^T y` from the previous accepted
/// step, clipped to `[LAMBDA_MIN, LAMBDA_MAX]`. Since `x + d` already lies in
/// the box, the projection arc of the line search reduces to the segment
/// `[x, x + d]`.
///
/// No second-order information is used; a secant handed to `solve` is
/// ignored.
pub struct SpectralProjectedGradient {
    line_search: BacktrackingLineSearch,
}

impl SpectralProjectedGradient {
    pub fn new(options: &SolverOptions) -> Self {
        Self {
            line_search: BacktrackingLineSearch::new(options),
        }
    }
}

/// Barzilai-Borwein step length, falling back to `LAMBDA_MAX` on
/// non-positive curvature.
pub(crate) fn spectral_step(s: &Col<E>, y: &Col<E>) -> E {
    let sty = dot(s.as_ref(), y.as_ref());
    if sty <= 0. || !sty.is_finite() {
        return LAMBDA_MAX;
    }
    let sts = dot(s.as_ref(), s.as_ref());
    E::min(LAMBDA_MAX, E::max(LAMBDA_MIN, sts / sty))
}

/// Initial spectral step `1 / ||P(x - g) - x||_inf`.
pub(crate) fn initial_spectral_step(pg: &Col<E>) -> E {
    let pg_max = col_max_abs(pg.as_ref());
    if pg_max > 0. {
        E::min(LAMBDA_MAX, E::max(LAMBDA_MIN, 1. / pg_max))
    } else {
        1.
    }
}

impl SubproblemSolver for SpectralProjectedGradient {
    fn name(&self) -> &'static str {
        "Spectral Projected Gradient"
    }

    fn solve(
        &mut self,
        obj: &dyn Objective,
        bnd: &dyn BoundConstraint,
        x: &mut Col<E>,
        tolerances: &SubproblemTolerances,
        _secant: Option<&mut dyn Secant>,
    ) -> Result<SubproblemReport, Problem> {
        let mut report = SubproblemReport::default();

        bnd.project(x);
        let mut fx = checked_value(obj, x, "subproblem objective value")?;
        let mut g = checked_gradient(obj, x, "subproblem gradient")?;

        let mut pg = projected_gradient(bnd, x, &g);
        let mut lambda = initial_spectral_step(&pg);

        for iter in 0..tolerances.max_iterations {
            if pg.norm_l2() <= tolerances.gtol {
                report.iterations = iter;
                report.converged = true;
                return Ok(report);
            }

            let mut target = x.clone() - lambda * &g;
            bnd.project(&mut target);
            let d = &target - &*x;

            let ls = self.line_search.search(obj, bnd, x, fx, &g, &d, 1.);
            if !ls.accepted {
                log::debug!("spg: line search failed at iteration {}", iter);
                report.iterations = iter;
                return Ok(report);
            }

            let g_new = checked_gradient(obj, &ls.x, "subproblem gradient")?;

            let s = &ls.x - &*x;
            let y = &g_new - &g;
            lambda = spectral_step(&s, &y);

            *x = ls.x;
            fx = ls.value;
            g = g_new;
            pg = projected_gradient(bnd, x, &g);

            if s.norm_l2() <= tolerances.stol {
                report.iterations = iter + 1;
                report.converged = pg.norm_l2() <= tolerances.gtol;
                return Ok(report);
            }
        }

        report.iterations = tolerances.max_iterations;
        report.converged = pg.norm_l2() <= tolerances.gtol;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subproblem::tests::col;

    #[test]
    fn test_spectral_step() {
        let s = col(&[1., 0.]);
        assert_eq!(spectral_step(&s, &col(&[4., 0.])), 0.25);
        assert_eq!(spectral_step(&s, &col(&[-1., 0.])), LAMBDA_MAX);
        assert_eq!(spectral_step(&s, &col(&[1e12, 0.])), LAMBDA_MIN);
    }

    #[test]
    fn test_initial_spectral_step() {
        assert_eq!(initial_spectral_step(&col(&[0.5, -4.])), 0.25);
        assert_eq!(initial_spectral_step(&col(&[0., 0.])), 1.);
    }
}
