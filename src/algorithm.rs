// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::Error;

/// Lifecycle of a single-use algorithm: constructed as [RunState::NotRun],
/// [run](Algorithm::run) exactly once, then queried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    NotRun,
    Running,
    Succeeded,
    Failed(String),
}

impl RunState {
    /// Transitions into [RunState::Running], refusing to start twice.
    pub(crate) fn start(&mut self) -> Result<(), Error> {
        match self {
            RunState::NotRun => {
                *self = RunState::Running;
                Ok(())
            }
            _ => Err(Error::AlreadyRun),
        }
    }

    /// Records the outcome of a run started with [RunState::start].
    pub(crate) fn finish(&mut self, outcome: &Result<(), Error>) {
        debug_assert_eq!(*self, RunState::Running);
        *self = match outcome {
            Ok(()) => RunState::Succeeded,
            Err(e) => RunState::Failed(e.to_string()),
        };
    }

    /// Fails fast unless the run has succeeded.
    pub(crate) fn check_succeeded(&self) -> Result<(), Error> {
        match self {
            RunState::Succeeded => Ok(()),
            RunState::Failed(msg) => Err(Error::NotSucceeded(msg.clone())),
            RunState::NotRun | RunState::Running => Err(Error::NotRun),
        }
    }

    pub fn has_run(&self) -> bool {
        matches!(self, RunState::Succeeded | RunState::Failed(_))
    }

    pub fn has_succeeded(&self) -> bool {
        *self == RunState::Succeeded
    }
}

/// Common interface of all single-use algorithms in this crate.
pub trait Algorithm {
    /// Executes the algorithm. Returns [Error::AlreadyRun] when called more than once.
    fn run(&mut self) -> Result<(), Error>;

    /// Returns the current lifecycle state.
    fn state(&self) -> &RunState;

    fn has_run(&self) -> bool {
        self.state().has_run()
    }

    fn has_succeeded(&self) -> bool {
        self.state().has_succeeded()
    }
}
