//! Activation transactions
//!
//! Runs all resolved drivers for one request as a single logical
//! transaction: initialize every driver, then activate (or deactivate, or
//! update) every driver in order, then commit. The first act-phase failure
//! rolls back the already-activated prefix in reverse order and fails the
//! whole transaction; rollback itself is best-effort and never escalates
//! over the original failure.

use crate::error::TransactionError;
use eca_driver::{ActivationDriver, DriverError};
use eca_model::{ServiceId, Subrequest};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle of a transaction.
///
/// `New → Initializing → (Activating | Deactivating | Updating) →
/// Committing → Committed`, or `→ RollingBack → Failed`. A transaction is
/// single-use; any terminal state refuses further runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    New,
    Initializing,
    Activating,
    Deactivating,
    Updating,
    Committing,
    Committed,
    RollingBack,
    Failed,
    Cancelled,
}

/// Cooperative cancellation checked once, before the first device call.
///
/// Once the transaction has started talking to devices it runs to
/// completion (success or rollback); cancelling after that point would
/// leave partial device state with no tracked owner.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; effective only if no device call started yet
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Outcome of one transaction run.
///
/// Either fully successful, or unsuccessful with the originating failure
/// message and, when a specific driver failed, its index in execution
/// order. Partial success is never reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResult {
    /// Whether every driver both acted and committed
    pub successful: bool,
    /// Failure reason; `None` on success
    pub message: Option<String>,
    /// Execution-order index of the failing driver, if one driver failed
    pub failing_driver_index: Option<usize>,
}

impl TransactionResult {
    /// Fully successful result
    #[inline]
    #[must_use]
    pub fn success() -> Self {
        Self {
            successful: true,
            message: None,
            failing_driver_index: None,
        }
    }

    /// Failed result carrying the originating error
    #[inline]
    #[must_use]
    pub fn fail(message: impl Into<String>, failing_driver_index: Option<usize>) -> Self {
        Self {
            successful: false,
            message: Some(message.into()),
            failing_driver_index,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.successful
    }
}

/// A driver bound to the subrequest it will configure
struct DriverEntry {
    driver: Box<dyn ActivationDriver>,
    subrequest: Subrequest,
}

/// Runs activation over multiple drivers with all-or-nothing semantics
pub struct ActivationTransaction {
    service_id: ServiceId,
    entries: Vec<DriverEntry>,
    call_timeout: Duration,
    cancellation: Option<CancellationFlag>,
    state: TransactionState,
}

/// The device-facing operation a run performs
#[derive(Debug, Clone, Copy)]
enum Operation {
    Activate,
    Deactivate,
    Update,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Update => "update",
        }
    }

    fn acting_state(self) -> TransactionState {
        match self {
            Self::Activate => TransactionState::Activating,
            Self::Deactivate => TransactionState::Deactivating,
            Self::Update => TransactionState::Updating,
        }
    }
}

impl ActivationTransaction {
    /// Transaction for `service_id` with the default per-call timeout
    #[must_use]
    pub fn new(service_id: ServiceId) -> Self {
        Self {
            service_id,
            entries: Vec::new(),
            call_timeout: Duration::from_secs(30),
            cancellation: None,
            state: TransactionState::New,
        }
    }

    /// With a timeout applied to every individual driver call
    #[inline]
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// With a cancellation flag checked before the first device call
    #[inline]
    #[must_use]
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// Append a driver bound to its subrequest; append order is execution
    /// order for drivers of equal priority
    pub fn add_driver(&mut self, driver: Box<dyn ActivationDriver>, subrequest: Subrequest) {
        tracing::debug!(service = %self.service_id, node = %subrequest.node,
            "driver added to activation transaction");
        self.entries.push(DriverEntry { driver, subrequest });
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current lifecycle state
    #[inline]
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Activate the contents of this transaction
    pub async fn activate(&mut self) -> Result<TransactionResult, TransactionError> {
        self.run(Operation::Activate).await
    }

    /// Deactivate the contents of this transaction
    pub async fn deactivate(&mut self) -> Result<TransactionResult, TransactionError> {
        self.run(Operation::Deactivate).await
    }

    /// Update the contents of this transaction
    pub async fn update(&mut self) -> Result<TransactionResult, TransactionError> {
        self.run(Operation::Update).await
    }

    async fn run(&mut self, op: Operation) -> Result<TransactionResult, TransactionError> {
        if self.state != TransactionState::New {
            return Err(TransactionError::AlreadyRun);
        }
        if self.entries.is_empty() {
            return Err(TransactionError::NoDrivers);
        }

        if let Some(flag) = &self.cancellation {
            if flag.is_cancelled() {
                tracing::info!(service = %self.service_id, "transaction cancelled before any device call");
                self.state = TransactionState::Cancelled;
                return Ok(TransactionResult::fail("request cancelled", None));
            }
        }

        // stable sort: equal priorities keep decomposition (path) order
        self.entries.sort_by_key(|e| e.driver.priority());

        self.state = TransactionState::Initializing;
        for index in 0..self.entries.len() {
            let timeout = self.call_timeout;
            let outcome = {
                let DriverEntry { driver, subrequest } = &mut self.entries[index];
                bounded(timeout, driver.initialize(&subrequest.endpoints, &self.service_id)).await
            };
            if let Err(message) = outcome {
                // nothing was pushed to any device yet, no rollback needed
                tracing::warn!(service = %self.service_id, index, %message,
                    "driver initialization failed, aborting transaction");
                self.state = TransactionState::Failed;
                return Ok(TransactionResult::fail(message, Some(index)));
            }
        }

        self.state = op.acting_state();
        for index in 0..self.entries.len() {
            let timeout = self.call_timeout;
            let outcome = {
                let DriverEntry { driver, .. } = &mut self.entries[index];
                let call = match op {
                    Operation::Activate => driver.activate(),
                    Operation::Deactivate => driver.deactivate(),
                    Operation::Update => driver.update(),
                };
                bounded(timeout, call).await
            };
            if let Err(message) = outcome {
                tracing::warn!(service = %self.service_id, index, %message, op = op.name(),
                    "driver failed, rolling back transaction");
                self.rollback_prefix(index).await;
                self.state = TransactionState::Failed;
                return Ok(TransactionResult::fail(message, Some(index)));
            }
        }

        self.state = TransactionState::Committing;
        let mut commit_failure: Option<(usize, String)> = None;
        for index in 0..self.entries.len() {
            let timeout = self.call_timeout;
            let outcome = {
                let DriverEntry { driver, .. } = &mut self.entries[index];
                bounded(timeout, driver.commit()).await
            };
            if let Err(message) = outcome {
                // device state is live but not durably marked committed;
                // committed peers are left untouched and nothing is retried
                tracing::error!(service = %self.service_id, index, %message,
                    "driver commit failed after successful {}", op.name());
                if commit_failure.is_none() {
                    commit_failure = Some((index, message));
                }
            }
        }
        if let Some((index, message)) = commit_failure {
            self.state = TransactionState::Failed;
            return Ok(TransactionResult::fail(message, Some(index)));
        }

        self.state = TransactionState::Committed;
        tracing::info!(service = %self.service_id, drivers = self.entries.len(),
            "{} transaction successful", op.name());
        Ok(TransactionResult::success())
    }

    /// Roll back drivers `0..failed`, most recently activated first.
    ///
    /// Best-effort: a rollback failure is logged and the remaining drivers
    /// are still rolled back; the transaction result keeps the original
    /// failure.
    async fn rollback_prefix(&mut self, failed: usize) {
        self.state = TransactionState::RollingBack;
        for index in (0..failed).rev() {
            let timeout = self.call_timeout;
            let outcome = {
                let DriverEntry { driver, .. } = &mut self.entries[index];
                bounded(timeout, driver.rollback()).await
            };
            if let Err(message) = outcome {
                tracing::warn!(service = %self.service_id, index, %message,
                    "rollback failed, continuing with remaining drivers");
            }
        }
    }
}

/// Await a driver call under the per-call timeout; a timeout is reported
/// exactly like a driver failure.
async fn bounded<F>(limit: Duration, call: F) -> Result<(), String>
where
    F: Future<Output = Result<(), DriverError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(err.to_string()),
        Err(_) => Err(format!("driver call timed out after {limit:?}")),
    }
}
