use crate::{E, I, ipm::state::AlgorithmState};

/// Read-only hook invoked by the outer loop.
pub trait Callback {
    /// Called once after `initialize`.
    fn init(&mut self, state: &AlgorithmState);

    /// Called after every outer iteration.
    fn call(&mut self, state: &AlgorithmState);
}

pub struct NoOpCallback {}

impl NoOpCallback {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for NoOpCallback {
    fn default() -> Self {
        Self::new()
    }
}

impl Callback for NoOpCallback {
    fn init(&mut self, _state: &AlgorithmState) {
        // Do nothing
    }

    fn call(&mut self, _state: &AlgorithmState) {
        // Do nothing
    }
}

pub struct ConvergenceOutput {}

impl ConvergenceOutput {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for ConvergenceOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl Callback for ConvergenceOutput {
    fn init(&mut self, state: &AlgorithmState) {
        log::info!("Initial stationarity: {:e}, mu: {:e}", state.gnorm, state.mu);
    }

    fn call(&mut self, state: &AlgorithmState) {
        log::info!(
            "Iteration {}: stationarity: {:e}, mu: {:e}, subproblem iterations: {}",
            state.iter,
            state.gnorm,
            state.mu,
            state.subproblem_iter
        );
    }
}

/// Schedule trace `(iteration, mu, gtol, stol, gnorm)` of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct History {
    pub records: Vec<(I, E, E, E, E)>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, state: &AlgorithmState) {
        self.records
            .push((state.iter, state.mu, state.gtol, state.stol, state.gnorm));
    }
}

impl Callback for History {
    fn init(&mut self, state: &AlgorithmState) {
        self.records.clear();
        self.record(state);
    }

    fn call(&mut self, state: &AlgorithmState) {
        self.record(state);
    }
}

/// Forwards to a borrowed callback so the caller keeps ownership, e.g. of a
/// [`History`] it wants to inspect after the run.
impl<C: Callback + ?Sized> Callback for &mut C {
    fn init(&mut self, state: &AlgorithmState) {
        (**self).init(state);
    }

    fn call(&mut self, state: &AlgorithmState) {
        (**self).call(state);
    }
}
