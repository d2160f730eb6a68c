use crate::{E, SolverOptions};

/// Monotone geometric schedule `value <- max(floor, rate * value)`.
///
/// Used for the barrier parameter and for both inner tolerances. Since
/// `initial >= floor` and `rate <= 1`, the value never increases and never
/// falls below `floor`; once the floor is hit it stays there exactly.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeometricSchedule {
    initial: E,
    rate: E,
    floor: E,
    value: E,
}

impl GeometricSchedule {
    pub fn new(initial: E, rate: E, floor: E) -> Self {
        Self {
            initial,
            rate,
            floor,
            value: initial,
        }
    }

    /// Barrier parameter: `mu_max` shrinking by `rho` down to `mu_min`.
    pub fn barrier(options: &SolverOptions) -> Self {
        Self::new(options.mu_max, options.rho, options.mu_min)
    }

    pub fn gradient_tolerance(options: &SolverOptions) -> Self {
        Self::new(options.initial_gtol, options.gtol_shrink_rate, options.min_gtol)
    }

    pub fn step_tolerance(options: &SolverOptions) -> Self {
        Self::new(options.initial_stol, options.stol_shrink_rate, options.min_stol)
    }

    pub fn reset(&mut self) {
        self.value = self.initial;
    }

    pub fn value(&self) -> E {
        self.value
    }

    /// Applies one step of the schedule and returns the new value.
    pub fn advance(&mut self) -> E {
        self.value = E::max(self.floor, self.rate * self.value);
        self.value
    }

    pub fn at_floor(&self) -> bool {
        self.value <= self.floor
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::I;

    /// Closed form after `k` steps, `max(floor, initial * rate^k)`.
    fn closed_form(initial: E, rate: E, floor: E, k: I) -> E {
        E::max(floor, initial * rate.powi(k as i32))
    }

    #[rstest]
    #[case(1., 0.1, 1e-4)]
    #[case(1e2, 0.5, 1e-3)]
    #[case(1e-2, 0.2, 1e-2)]
    #[case(3., 1., 1e-8)]
    fn test_advance_matches_closed_form(#[case] initial: E, #[case] rate: E, #[case] floor: E) {
        let mut schedule = GeometricSchedule::new(initial, rate, floor);
        let mut previous = schedule.value();
        for k in 1..40 {
            let value = schedule.advance();
            assert!(value <= previous);
            assert!(value >= floor);
            let expected = closed_form(initial, rate, floor, k);
            assert!((value - expected).abs() <= 1e-12 * expected);
            previous = value;
        }
    }

    #[test]
    fn test_floor_is_exact_and_sticky() {
        // 1 * 0.1^3 rounds to slightly above 1e-3, so the floor is hit at step 4.
        let mut schedule = GeometricSchedule::new(1., 0.1, 1e-3);
        let mut steps = 0;
        while !schedule.at_floor() && steps < 10 {
            schedule.advance();
            steps += 1;
        }
        assert!(schedule.at_floor());
        assert!(steps <= 4, "steps: {}", steps);
        assert_eq!(schedule.value(), 1e-3);
        assert_eq!(schedule.advance(), 1e-3);

        schedule.reset();
        assert_eq!(schedule.value(), 1.);
        assert!(!schedule.at_floor());
    }
}
