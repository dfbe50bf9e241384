//! Startup and teardown of a capture session
//!
//! `Uninitialized → Configured → Validated → Active`. Events are only
//! accepted once a valid run id has been supplied; a missing or invalid
//! run id is fatal and the caller is expected to terminate the process.

use std::fmt;
use tracing::{error, info};

use crate::correlation::{CorrelationState, RunId};
use crate::error::ConfigError;
use crate::gateway::PersistenceGateway;
use crate::processor::EventProcessor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    /// Store connected and run option registered
    Configured,
    /// Run id checked, processor not yet handed out
    Validated,
    Active,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Configured => "configured",
            Self::Validated => "validated",
            Self::Active => "active",
        };
        f.write_str(name)
    }
}

/// Drives one capture session from store connection to teardown
pub struct LifecycleController<G> {
    state: LifecycleState,
    gateway: Option<G>,
    run_option: String,
    correlation_capacity: usize,
}

impl<G: PersistenceGateway> LifecycleController<G> {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Uninitialized,
            gateway: None,
            run_option: String::new(),
            correlation_capacity: CorrelationState::DEFAULT_CAPACITY,
        }
    }

    /// Limit on requests kept waiting for their response
    pub fn with_correlation_capacity(mut self, capacity: usize) -> Self {
        self.correlation_capacity = capacity;
        self
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Attach the connected store and register the raw `run` option
    ///
    /// An empty option means "unset"; it is rejected by [`Self::running`].
    pub fn load(&mut self, gateway: G, run_option: impl Into<String>) -> Result<(), ConfigError> {
        if self.state != LifecycleState::Uninitialized {
            return Err(ConfigError::OutOfOrder {
                step: "load",
                state: self.state,
            });
        }

        self.gateway = Some(gateway);
        self.run_option = run_option.into();
        self.state = LifecycleState::Configured;
        Ok(())
    }

    /// Validate the run id and hand out the event processor
    ///
    /// On error the diagnostic has already been logged; the host must exit
    /// with a non-zero status.
    pub fn running(&mut self) -> Result<EventProcessor<G>, ConfigError> {
        if self.state != LifecycleState::Configured {
            return Err(ConfigError::OutOfOrder {
                step: "running",
                state: self.state,
            });
        }

        let run_id = match self.run_option.parse::<RunId>() {
            Ok(run_id) => run_id,
            Err(e) => {
                error!("{}, shutting down", e);
                return Err(e);
            }
        };
        self.state = LifecycleState::Validated;

        let gateway = self.gateway.take().ok_or(ConfigError::OutOfOrder {
            step: "running",
            state: self.state,
        })?;
        let correlation = CorrelationState::with_capacity(run_id, self.correlation_capacity);
        self.state = LifecycleState::Active;
        info!("Capturing traffic for run {}", run_id);

        Ok(EventProcessor::new(gateway, correlation))
    }

    /// End of the session
    ///
    /// Run start/end bookkeeping belongs to whoever created the run, so
    /// nothing is written here.
    pub fn done(&self) {
        info!("Capture session finished ({})", self.state);
    }
}

impl<G: PersistenceGateway> Default for LifecycleController<G> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockPersistenceGateway;

    fn configured(run: &str) -> LifecycleController<MockPersistenceGateway> {
        let mut controller = LifecycleController::new();
        assert_eq!(controller.state(), LifecycleState::Uninitialized);
        controller
            .load(MockPersistenceGateway::new(), run)
            .unwrap();
        assert_eq!(controller.state(), LifecycleState::Configured);
        controller
    }

    #[test]
    fn test_valid_run_id_activates() {
        let mut controller = configured("42");

        let processor = controller.running().unwrap();

        assert_eq!(processor.run_id().get(), 42);
        assert_eq!(controller.state(), LifecycleState::Active);
    }

    #[test]
    fn test_missing_run_id_is_fatal() {
        let mut controller = configured("");

        assert_eq!(controller.running().err(), Some(ConfigError::MissingRunId));
        assert_eq!(controller.state(), LifecycleState::Configured);
    }

    #[test]
    fn test_non_positive_run_id_is_fatal() {
        for (raw, value) in [("0", 0), ("-3", -3)] {
            let mut controller = configured(raw);
            assert_eq!(
                controller.running().err(),
                Some(ConfigError::NonPositiveRunId(value))
            );
        }
    }

    #[test]
    fn test_non_numeric_run_id_is_fatal() {
        let mut controller = configured("run-7");
        assert!(matches!(
            controller.running(),
            Err(ConfigError::InvalidRunId(_))
        ));
    }

    #[test]
    fn test_steps_out_of_order_are_rejected() {
        let mut controller: LifecycleController<MockPersistenceGateway> =
            LifecycleController::new();
        assert!(matches!(
            controller.running(),
            Err(ConfigError::OutOfOrder { step: "running", .. })
        ));

        let mut controller = configured("1");
        assert!(controller
            .load(MockPersistenceGateway::new(), "2")
            .is_err());
        controller.running().unwrap();
        assert!(controller.running().is_err());
        controller.done();
        assert_eq!(controller.state(), LifecycleState::Active);
    }
}
