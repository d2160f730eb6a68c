//! Tabular iteration report of the interior point method.
//!
//! All functions only read the [`AlgorithmState`]; the controller decides when
//! to call them based on `verbosity` and `print_header`.

use std::io::{Result, Write};

use crate::ipm::state::AlgorithmState;

pub fn write_name(os: &mut dyn Write, subproblem: &str) -> Result<()> {
    writeln!(os)?;
    writeln!(os, "Interior Point Method for Bound-Constrained Optimization")?;
    writeln!(os, "  Subproblem solver: {}", subproblem)
}

pub fn write_header(os: &mut dyn Write) -> Result<()> {
    writeln!(
        os,
        "  {:>6}  {:>10}  {:>10}  {:>14}  {:>10}  {:>10}  {:>8}  {:>8}  {:>8}",
        "iter", "mu", "gtol", "value", "gnorm", "snorm", "#fval", "#grad", "subiter"
    )
}

/// Writes one row for the current state, preceded by the header if asked.
pub fn write_output(os: &mut dyn Write, state: &AlgorithmState, header: bool) -> Result<()> {
    if header {
        write_header(os)?;
    }
    if state.iter == 0 {
        writeln!(
            os,
            "  {:>6}  {:>10.3e}  {:>10.3e}  {:>14.6e}  {:>10.3e}  {:>10}  {:>8}  {:>8}  {:>8}",
            state.iter, state.mu, state.gtol, state.value, state.gnorm, "", state.nfval, state.ngrad, ""
        )
    } else {
        writeln!(
            os,
            "  {:>6}  {:>10.3e}  {:>10.3e}  {:>14.6e}  {:>10.3e}  {:>10.3e}  {:>8}  {:>8}  {:>8}",
            state.iter,
            state.mu,
            state.gtol,
            state.value,
            state.gnorm,
            state.snorm,
            state.nfval,
            state.ngrad,
            state.subproblem_iter
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(state: &AlgorithmState, header: bool) -> String {
        let mut buffer = Vec::new();
        write_output(&mut buffer, state, header).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_header_columns() {
        let mut buffer = Vec::new();
        write_header(&mut buffer).unwrap();
        let header = String::from_utf8(buffer).unwrap();
        let columns: Vec<&str> = header.split_whitespace().collect();
        assert_eq!(
            columns,
            ["iter", "mu", "gtol", "value", "gnorm", "snorm", "#fval", "#grad", "subiter"]
        );
    }

    #[test]
    fn test_initial_row_omits_step_columns() {
        let mut state = AlgorithmState::new();
        state.mu = 1.;
        state.gtol = 1e-2;
        state.value = 3.5;
        state.gnorm = 0.25;
        state.nfval = 1;
        state.ngrad = 1;

        let row = render(&state, false);
        assert_eq!(row.lines().count(), 1);
        assert_eq!(row.split_whitespace().count(), 7);

        state.iter = 3;
        state.snorm = 1e-3;
        state.subproblem_iter = 12;
        let rows = render(&state, true);
        assert_eq!(rows.lines().count(), 2);
        let last = rows.lines().last().unwrap();
        assert_eq!(last.split_whitespace().count(), 9);
        assert!(last.trim_end().ends_with("12"));
    }
}
