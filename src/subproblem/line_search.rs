use faer::Col;

use crate::{
    E, I, SolverOptions,
    bounds::BoundConstraint,
    linalg::vector_ops::{axpy, dot},
    objective::Objective,
};

/// Outcome of a line search. When `accepted` is `false`, `x` and `value` hold
/// the last rejected trial.
pub struct LineSearchResult {
    pub alpha: E,
    pub x: Col<E>,
    pub value: E,
    pub accepted: bool,
}

pub trait LineSearch {
    fn new(options: &SolverOptions) -> Self
    where
        Self: Sized;

    /// Searches along the projection arc `x(alpha) = P(x + alpha d)` for a
    /// step size `alpha <= alpha0` that gives sufficient decrease.
    ///
    /// # Arguments
    ///
    /// * `fx` - Objective value at `x`.
    /// * `g` - Gradient at `x`.
    /// * `d` - Search direction; need not keep `x + d` inside the box.
    /// * `alpha0` - Initial trial step.
    fn search(
        &self,
        obj: &dyn Objective,
        bnd: &dyn BoundConstraint,
        x: &Col<E>,
        fx: E,
        g: &Col<E>,
        d: &Col<E>,
        alpha0: E,
    ) -> LineSearchResult;
}

/// Projected Armijo backtracking.
///
/// Accepts the first trial with a finite value satisfying
/// `F(x(alpha)) <= F(x) + c1 ∇F(x)^T (x(alpha) - x)`, contracting `alpha` by
/// `backtracking_rate` after every rejection. Trials outside the barrier's
/// domain evaluate to `+inf` and are rejected like any other.
pub struct BacktrackingLineSearch {
    c1: E,
    rate: E,
    max_backtracks: I,
}

impl LineSearch for BacktrackingLineSearch {
    fn new(options: &SolverOptions) -> Self {
        Self {
            c1: options.armijo_c1,
            rate: options.backtracking_rate,
            max_backtracks: options.max_backtracks,
        }
    }

    fn search(
        &self,
        obj: &dyn Objective,
        bnd: &dyn BoundConstraint,
        x: &Col<E>,
        fx: E,
        g: &Col<E>,
        d: &Col<E>,
        alpha0: E,
    ) -> LineSearchResult {
        let mut alpha = alpha0;

        let mut trial = axpy(x.as_ref(), alpha, d.as_ref());
        bnd.project(&mut trial);
        let mut value = E::INFINITY;

        for _ in 0..=self.max_backtracks {
            let step = &trial - x;
            let decrease = dot(g.as_ref(), step.as_ref());

            // A projected step that no longer moves (or ascends) cannot be accepted.
            if step.norm_l2() > 0. && decrease < 0. {
                value = obj.value(&trial);
                if value.is_finite() && value <= fx + self.c1 * decrease {
                    return LineSearchResult {
                        alpha,
                        x: trial,
                        value,
                        accepted: true,
                    };
                }
            }

            alpha *= self.rate;
            trial = axpy(x.as_ref(), alpha, d.as_ref());
            bnd.project(&mut trial);
        }

        LineSearchResult {
            alpha,
            x: trial,
            value,
            accepted: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxConstraint, FnObjective, subproblem::tests::col};

    fn parabola() -> FnObjective {
        FnObjective::new(|x| (x[0] - 1.).powi(2), |x| col(&[2. * (x[0] - 1.)]))
    }

    #[test]
    fn test_accepts_full_step_with_decrease() {
        let obj = parabola();
        let bnd = BoxConstraint::unbounded(1);
        let x = col(&[0.]);
        let g = obj.gradient(&x);
        let d = col(&[1.]);

        let ls = BacktrackingLineSearch::new(&SolverOptions::new());
        let result = ls.search(&obj, &bnd, &x, obj.value(&x), &g, &d, 1.);
        assert!(result.accepted);
        assert_eq!(result.alpha, 1.);
        assert_eq!(result.x, col(&[1.]));
    }

    #[test]
    fn test_backtracks_from_overshoot() {
        let obj = parabola();
        let bnd = BoxConstraint::unbounded(1);
        let x = col(&[0.]);
        let g = obj.gradient(&x);
        // -g = 2 jumps to x = 2 with the same value; half of it is exact.
        let d = col(&[2.]);

        let ls = BacktrackingLineSearch::new(&SolverOptions::new());
        let result = ls.search(&obj, &bnd, &x, obj.value(&x), &g, &d, 1.);
        assert!(result.accepted);
        assert_eq!(result.alpha, 0.5);
        assert_eq!(result.value, 0.);
    }

    #[test]
    fn test_rejects_infinite_values_then_backtracks() {
        // -log(x) style domain: infinite at or beyond zero.
        let obj = FnObjective::new(
            |x| if x[0] > 0. { x[0] - x[0].ln() } else { E::INFINITY },
            |x| col(&[1. - 1. / x[0]]),
        );
        let bnd = BoxConstraint::lower_only(col(&[0.]));
        let x = col(&[2.]);
        let g = obj.gradient(&x);
        let d = col(&[-4.]);

        let ls = BacktrackingLineSearch::new(&SolverOptions::new());
        let result = ls.search(&obj, &bnd, &x, obj.value(&x), &g, &d, 1.);
        assert!(result.accepted);
        assert!(result.x[0] > 0.);
        assert!(result.value < obj.value(&x));
    }

    #[test]
    fn test_fails_on_ascent_direction() {
        let obj = parabola();
        let bnd = BoxConstraint::unbounded(1);
        let x = col(&[0.]);
        let g = obj.gradient(&x);
        let d = col(&[-1.]);

        let ls = BacktrackingLineSearch::new(&SolverOptions::new());
        let result = ls.search(&obj, &bnd, &x, obj.value(&x), &g, &d, 1.);
        assert!(!result.accepted);
        assert_eq!(result.value, E::INFINITY);
    }
}
