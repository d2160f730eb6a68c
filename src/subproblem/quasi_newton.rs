use faer::{Col, unzip, zip};
use problemo::Problem;

use crate::{
    E, SolverOptions,
    bounds::BoundConstraint,
    linalg::vector_ops::dot,
    objective::Objective,
    secant::Secant,
    subproblem::{
        SubproblemReport, SubproblemSolver, SubproblemTolerances, checked_gradient, checked_value,
        line_search::{BacktrackingLineSearch, LineSearch},
        projected_gradient,
        spg::{initial_spectral_step, spectral_step},
    },
};

/// Projected quasi-Newton method.
///
/// Variables sitting on a bound with the gradient pointing outward are held
/// fixed; on the remaining (free) variables the search direction is
/// `-H ∇F(x)` with `H` the injected [`Secant`]. The step is taken along the
/// projection arc. Without a secant, or whenever the quasi-Newton direction
/// fails to descend, the method falls back to a spectrally scaled steepest
/// descent step.
pub struct ProjectedQuasiNewton {
    line_search: BacktrackingLineSearch,
}

impl ProjectedQuasiNewton {
    pub fn new(options: &SolverOptions) -> Self {
        Self {
            line_search: BacktrackingLineSearch::new(options),
        }
    }
}

/// Zeroes the entries of `v` belonging to variables that are held at a bound.
fn restrict_to_free(bnd: &dyn BoundConstraint, x: &Col<E>, g: &Col<E>, v: &mut Col<E>) {
    zip!(v.as_mut(), x.as_ref(), g.as_ref(), bnd.lower(), bnd.upper()).for_each(
        |unzip!(v, x, g, l, u)| {
            if (*x <= *l && *g > 0.) || (*x >= *u && *g < 0.) {
                *v = 0.;
            }
        },
    );
}

impl SubproblemSolver for ProjectedQuasiNewton {
    fn name(&self) -> &'static str {
        "Projected Quasi-Newton"
    }

    fn solve(
        &mut self,
        obj: &dyn Objective,
        bnd: &dyn BoundConstraint,
        x: &mut Col<E>,
        tolerances: &SubproblemTolerances,
        mut secant: Option<&mut dyn Secant>,
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

            let mut g_free = g.clone();
            restrict_to_free(bnd, x, &g, &mut g_free);

            let mut steepest = -lambda * &g_free;
            let direction = match secant.as_deref() {
                Some(h) if !h.is_empty() => {
                    let mut d = -h.apply_inverse(&g_free);
                    restrict_to_free(bnd, x, &g, &mut d);
                    if dot(g.as_ref(), d.as_ref()) < 0. {
                        Some(d)
                    } else {
                        None
                    }
                }
                _ => None,
            };

            let mut ls = match direction {
                Some(d) => self.line_search.search(obj, bnd, x, fx, &g, &d, 1.),
                None => self.line_search.search(obj, bnd, x, fx, &g, &steepest, 1.),
            };
            if !ls.accepted {
                // Retry along the scaled steepest descent direction before giving up.
                steepest = -lambda * &g;
                ls = self.line_search.search(obj, bnd, x, fx, &g, &steepest, 1.);
            }
            if !ls.accepted {
                log::debug!("quasi-newton: line search failed at iteration {}", iter);
                report.iterations = iter;
                return Ok(report);
            }

            let g_new = checked_gradient(obj, &ls.x, "subproblem gradient")?;

            let s = &ls.x - &*x;
            let y = &g_new - &g;
            lambda = spectral_step(&s, &y);
            if let Some(h) = secant.as_deref_mut() {
                h.update(&s, &y);
            }

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
