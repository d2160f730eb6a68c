//! Box constraints `l <= x <= u` and the projections the interior point
//! method needs.
//!
//! Infinite entries of `l` or `u` mean the coordinate is unbounded on that
//! side. [`BoundConstraint::project`] clamps onto the closed box, while
//! [`BoundConstraint::project_interior`] pushes a point strictly inside so
//! that a logarithmic barrier can be evaluated there.

use faer::{Col, ColRef, unzip, zip};

use crate::E;

/// Absolute part of the bound push, relative to `max(1, |bound|)`.
const BOUND_PUSH: E = 1e-2;
/// Relative part of the bound push, as a fraction of the box width.
const BOUND_FRAC: E = 1e-2;

pub trait BoundConstraint {
    /// Number of variables the constraint applies to.
    fn dimension(&self) -> usize;

    fn lower(&self) -> ColRef<'_, E>;

    fn upper(&self) -> ColRef<'_, E>;

    /// Clamps `x` onto `[l, u]` in place.
    fn project(&self, x: &mut Col<E>) {
        zip!(x.as_mut(), self.lower(), self.upper()).for_each(|unzip!(x, l, u)| {
            if *x < *l {
                *x = *l;
            }
            if *x > *u {
                *x = *u;
            }
        });
    }

    /// Moves `x` strictly inside the box.
    ///
    /// Every finite lower bound is enforced as
    /// `x >= l + min(BOUND_PUSH * max(1, |l|), BOUND_FRAC * (u - l))`, and
    /// symmetrically for the upper bound. Points already far enough from the
    /// bounds are left untouched. Fixed coordinates (`l == u`) are set to
    /// their bound.
    fn project_interior(&self, x: &mut Col<E>) {
        zip!(x.as_mut(), self.lower(), self.upper()).for_each(|unzip!(x, l, u)| {
            if *l == *u {
                *x = *l;
                return;
            }
            let width = *u - *l;
            if l.is_finite() {
                let mut push = BOUND_PUSH * E::max(1., l.abs());
                if u.is_finite() {
                    push = E::min(push, BOUND_FRAC * width);
                }
                if *x < *l + push {
                    *x = *l + push;
                }
            }
            if u.is_finite() {
                let mut push = BOUND_PUSH * E::max(1., u.abs());
                if l.is_finite() {
                    push = E::min(push, BOUND_FRAC * width);
                }
                if *x > *u - push {
                    *x = *u - push;
                }
            }
        });
    }

    /// Returns `true` if `l <= x <= u` holds componentwise.
    fn is_feasible(&self, x: &Col<E>) -> bool {
        let mut feasible = x.nrows() == self.dimension();
        if feasible {
            zip!(x.as_ref(), self.lower(), self.upper()).for_each(|unzip!(x, l, u)| {
                if !(*x >= *l && *x <= *u) {
                    feasible = false;
                }
            });
        }
        feasible
    }

    /// Index of the first coordinate with `l > u` (or a NaN bound), if any.
    fn first_empty_index(&self) -> Option<usize> {
        let (l, u) = (self.lower(), self.upper());
        (0..self.dimension()).find(|&i| !(l[i] <= u[i]))
    }

    /// Returns `true` if no point satisfies the bounds.
    fn is_empty(&self) -> bool {
        self.first_empty_index().is_some()
    }

    /// Indices of the coordinates with `l == u`.
    fn fixed_indices(&self) -> Vec<usize> {
        let (l, u) = (self.lower(), self.upper());
        (0..self.dimension()).filter(|&i| l[i] == u[i]).collect()
    }
}

/// Bounds stored as two dense vectors.
#[derive(Clone, Debug)]
pub struct BoxConstraint {
    l: Col<E>,
    u: Col<E>,
}

impl BoxConstraint {
    /// Creates the box `[l, u]`.
    ///
    /// # Panics
    ///
    /// Panics if `l` and `u` have different lengths.
    pub fn new(l: Col<E>, u: Col<E>) -> Self {
        assert_eq!(l.nrows(), u.nrows(), "bound vectors must have equal length");
        Self { l, u }
    }

    /// `x >= l`.
    pub fn lower_only(l: Col<E>) -> Self {
        let u = Col::from_fn(l.nrows(), |_| E::INFINITY);
        Self { l, u }
    }

    /// `x <= u`.
    pub fn upper_only(u: Col<E>) -> Self {
        let l = Col::from_fn(u.nrows(), |_| E::NEG_INFINITY);
        Self { l, u }
    }

    pub fn unbounded(n: usize) -> Self {
        Self {
            l: Col::from_fn(n, |_| E::NEG_INFINITY),
            u: Col::from_fn(n, |_| E::INFINITY),
        }
    }
}

impl BoundConstraint for BoxConstraint {
    fn dimension(&self) -> usize {
        self.l.nrows()
    }

    fn lower(&self) -> ColRef<'_, E> {
        self.l.as_ref()
    }

    fn upper(&self) -> ColRef<'_, E> {
        self.u.as_ref()
    }
}
