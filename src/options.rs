//! Solver options.
//!
//! | Option Name            | Type     | Default                         | Description |
//! |------------------------|----------|---------------------------------|-------------|
//! | `mu_min`               | [`E`]    | `1e-8`                          | Lower bound on the barrier parameter. |
//! | `mu_max`               | [`E`]    | `1`                             | Initial (and largest) barrier parameter. |
//! | `rho`                  | [`E`]    | `0.1`                           | Barrier reduction factor, in `(0, 1)`. |
//! | `use_linear_damping`   | `bool`   | `true`                          | Add `kappa_d`-scaled linear terms for one-sided bounds. |
//! | `kappa_d`              | [`E`]    | `1e-4`                          | Linear damping coefficient. |
//! | `initial_gtol`         | [`E`]    | `1e-2`                          | Initial inner gradient tolerance. |
//! | `gtol_shrink_rate`     | [`E`]    | `0.1`                           | Inner gradient tolerance reduction factor, in `(0, 1]`. |
//! | `min_gtol`             | [`E`]    | `1e-8`                          | Floor on the inner gradient tolerance. |
//! | `initial_stol`         | [`E`]    | `1e-8`                          | Initial inner step tolerance. |
//! | `stol_shrink_rate`     | [`E`]    | `1`                             | Inner step tolerance reduction factor, in `(0, 1]`. |
//! | `min_stol`             | [`E`]    | `1e-12`                         | Floor on the inner step tolerance. |
//! | `gradient_tolerance`   | [`E`]    | `1e-6`                          | Outer stationarity target. |
//! | `max_outer_iterations` | [`I`]    | `100`                           | Maximum number of barrier subproblems. |
//! | `max_inner_iterations` | [`I`]    | `1000`                          | Iteration budget of each subproblem. |
//! | `max_stall_iterations` | [`I`]    | `5`                             | Non-improving iterations at `mu_min` before stalling. |
//! | `verbosity`            | `u8`     | `0`                             | `1` prints a row per iteration, `2` repeats the header. |
//! | `print_header`         | `bool`   | `false`                         | Print the header before every row. |
//! | `subproblem_name`      | `String` | `"spectral_projected_gradient"` | Subproblem solver, see [`SubproblemSolverType`]. |
//! | `secant_memory`        | [`I`]    | `10`                            | Stored pairs of the limited-memory secant. |
//! | `armijo_c1`            | [`E`]    | `1e-4`                          | Sufficient decrease parameter. |
//! | `backtracking_rate`    | [`E`]    | `0.5`                           | Step contraction factor of the line search. |
//! | `max_backtracks`       | [`I`]    | `60`                            | Maximum contractions per line search. |

use std::str::FromStr;

use problemo::Problem;
use serde::{Deserialize, Serialize};

use crate::{E, I, ipm::InteriorPointError, subproblem::SubproblemSolverType};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    pub mu_min: E,
    pub mu_max: E,
    pub rho: E,
    pub use_linear_damping: bool,
    pub kappa_d: E,

    pub initial_gtol: E,
    pub gtol_shrink_rate: E,
    pub min_gtol: E,
    pub initial_stol: E,
    pub stol_shrink_rate: E,
    pub min_stol: E,

    pub gradient_tolerance: E,
    pub max_outer_iterations: I,
    pub max_inner_iterations: I,
    pub max_stall_iterations: I,

    pub verbosity: u8,
    pub print_header: bool,

    pub subproblem_name: String,
    pub secant_memory: I,
    pub armijo_c1: E,
    pub backtracking_rate: E,
    pub max_backtracks: I,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            mu_min: 1e-8,
            mu_max: 1.,
            rho: 0.1,
            use_linear_damping: true,
            kappa_d: 1e-4,

            initial_gtol: 1e-2,
            gtol_shrink_rate: 0.1,
            min_gtol: 1e-8,
            initial_stol: 1e-8,
            stol_shrink_rate: 1.,
            min_stol: 1e-12,

            gradient_tolerance: 1e-6,
            max_outer_iterations: 100,
            max_inner_iterations: 1000,
            max_stall_iterations: 5,

            verbosity: 0,
            print_header: false,

            subproblem_name: "spectral_projected_gradient".to_string(),
            secant_memory: 10,
            armijo_c1: 1e-4,
            backtracking_rate: 0.5,
            max_backtracks: 60,
        }
    }
}

fn parse<T: FromStr>(option: &str, value: &str) -> Result<T, InteriorPointError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| InteriorPointError::Configuration {
            option: option.to_string(),
            reason: format!("cannot parse '{}'", value),
        })
}

fn check(option: &str, ok: bool, reason: &str) -> Result<(), InteriorPointError> {
    if ok {
        Ok(())
    } else {
        Err(InteriorPointError::Configuration {
            option: option.to_string(),
            reason: reason.to_string(),
        })
    }
}

impl SolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a recognized option from its textual value.
    ///
    /// The new value is not validated against the other options until
    /// [`SolverOptions::validate`] runs.
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<(), Problem> {
        match name {
            "mu_min" => self.mu_min = parse(name, value)?,
            "mu_max" => self.mu_max = parse(name, value)?,
            "rho" => self.rho = parse(name, value)?,
            "use_linear_damping" => self.use_linear_damping = parse(name, value)?,
            "kappa_d" => self.kappa_d = parse(name, value)?,
            "initial_gtol" => self.initial_gtol = parse(name, value)?,
            "gtol_shrink_rate" => self.gtol_shrink_rate = parse(name, value)?,
            "min_gtol" => self.min_gtol = parse(name, value)?,
            "initial_stol" => self.initial_stol = parse(name, value)?,
            "stol_shrink_rate" => self.stol_shrink_rate = parse(name, value)?,
            "min_stol" => self.min_stol = parse(name, value)?,
            "gradient_tolerance" => self.gradient_tolerance = parse(name, value)?,
            "max_outer_iterations" => self.max_outer_iterations = parse(name, value)?,
            "max_inner_iterations" => self.max_inner_iterations = parse(name, value)?,
            "max_stall_iterations" => self.max_stall_iterations = parse(name, value)?,
            "verbosity" => self.verbosity = parse(name, value)?,
            "print_header" => self.print_header = parse(name, value)?,
            "subproblem_name" => {
                parse::<SubproblemSolverType>(name, value)?;
                self.subproblem_name = value.trim().to_string();
            }
            "secant_memory" => self.secant_memory = parse(name, value)?,
            "armijo_c1" => self.armijo_c1 = parse(name, value)?,
            "backtracking_rate" => self.backtracking_rate = parse(name, value)?,
            "max_backtracks" => self.max_backtracks = parse(name, value)?,
            _ => {
                return Err(InteriorPointError::Configuration {
                    option: name.to_string(),
                    reason: "unknown option".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Checks that the schedules are well-formed. Comparisons are written so
    /// that NaN fails every check.
    pub fn validate(&self) -> Result<(), Problem> {
        check("mu_min", self.mu_min > 0., "must be positive")?;
        check("mu_max", self.mu_max >= self.mu_min, "must not be below mu_min")?;
        check("mu_max", self.mu_max.is_finite(), "must be finite")?;
        check("rho", self.rho > 0. && self.rho < 1., "must lie in (0, 1)")?;
        check("kappa_d", self.kappa_d > 0. && self.kappa_d.is_finite(), "must be positive")?;

        check("min_gtol", self.min_gtol > 0., "must be positive")?;
        check(
            "initial_gtol",
            self.initial_gtol >= self.min_gtol && self.initial_gtol.is_finite(),
            "must be finite and not below min_gtol",
        )?;
        check(
            "gtol_shrink_rate",
            self.gtol_shrink_rate > 0. && self.gtol_shrink_rate <= 1.,
            "must lie in (0, 1]",
        )?;
        check("min_stol", self.min_stol > 0., "must be positive")?;
        check(
            "initial_stol",
            self.initial_stol >= self.min_stol && self.initial_stol.is_finite(),
            "must be finite and not below min_stol",
        )?;
        check(
            "stol_shrink_rate",
            self.stol_shrink_rate > 0. && self.stol_shrink_rate <= 1.,
            "must lie in (0, 1]",
        )?;

        check("gradient_tolerance", self.gradient_tolerance > 0., "must be positive")?;
        check("max_inner_iterations", self.max_inner_iterations >= 1, "must be at least 1")?;
        check("max_stall_iterations", self.max_stall_iterations >= 1, "must be at least 1")?;

        parse::<SubproblemSolverType>("subproblem_name", &self.subproblem_name)?;
        check("secant_memory", self.secant_memory >= 1, "must be at least 1")?;
        check("armijo_c1", self.armijo_c1 > 0. && self.armijo_c1 < 1., "must lie in (0, 1)")?;
        check(
            "backtracking_rate",
            self.backtracking_rate > 0. && self.backtracking_rate < 1.,
            "must lie in (0, 1)",
        )?;
        check("max_backtracks", self.max_backtracks >= 1, "must be at least 1")?;
        Ok(())
    }

    /// The subproblem solver selected by `subproblem_name`.
    pub fn subproblem_type(&self) -> Result<SubproblemSolverType, Problem> {
        Ok(parse::<SubproblemSolverType>("subproblem_name", &self.subproblem_name)?)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SolverOptions::new().validate().is_ok());
    }

    #[test]
    fn test_set_option() {
        let mut options = SolverOptions::new();
        options.set_option("rho", "0.5").unwrap();
        options.set_option("use_linear_damping", "false").unwrap();
        options.set_option("max_outer_iterations", " 7 ").unwrap();
        options.set_option("subproblem_name", "lbfgs").unwrap();

        assert_eq!(options.rho, 0.5);
        assert!(!options.use_linear_damping);
        assert_eq!(options.max_outer_iterations, 7);
        assert_eq!(options.subproblem_name, "lbfgs");
        assert!(options.validate().is_ok());
    }

    #[rstest]
    #[case("not_an_option", "1")]
    #[case("rho", "fast")]
    #[case("max_outer_iterations", "-3")]
    #[case("subproblem_name", "simplex")]
    fn test_set_option_rejects(#[case] name: &str, #[case] value: &str) {
        let mut options = SolverOptions::new();
        let before = options.clone();
        assert!(options.set_option(name, value).is_err());
        assert_eq!(options, before);
    }

    #[rstest]
    #[case("mu_min", "0")]
    #[case("mu_max", "1e-9")]
    #[case("rho", "1")]
    #[case("rho", "0")]
    #[case("rho", "NaN")]
    #[case("kappa_d", "-1e-4")]
    #[case("initial_gtol", "1e-9")]
    #[case("gtol_shrink_rate", "1.5")]
    #[case("min_gtol", "0")]
    #[case("initial_stol", "1e-13")]
    #[case("stol_shrink_rate", "0")]
    #[case("gradient_tolerance", "0")]
    #[case("max_stall_iterations", "0")]
    #[case("max_inner_iterations", "0")]
    #[case("secant_memory", "0")]
    #[case("armijo_c1", "1")]
    #[case("backtracking_rate", "1")]
    #[case("max_backtracks", "0")]
    fn test_validate_rejects(#[case] name: &str, #[case] value: &str) {
        let mut options = SolverOptions::new();
        options.set_option(name, value).unwrap();
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_degenerate_barrier_range_is_valid() {
        let mut options = SolverOptions::new();
        options.mu_max = options.mu_min;
        options.gtol_shrink_rate = 1.;
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let options: SolverOptions =
            serde_json::from_str(r#"{ "mu_max": 10.0, "rho": 0.2, "verbosity": 1 }"#).unwrap();
        assert_eq!(options.mu_max, 10.);
        assert_eq!(options.rho, 0.2);
        assert_eq!(options.verbosity, 1);
        assert_eq!(options.kappa_d, SolverOptions::default().kappa_d);
        assert!(options.validate().is_ok());
    }
}
