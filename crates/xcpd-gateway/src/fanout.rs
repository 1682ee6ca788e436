//! Gateway fan-out: one outbound request per selected target.
//!
//! Several targets are dispatched concurrently, one spawned task per target,
//! bounded by the shared [`WorkerPool`]. A single target (or a controller
//! configured without multi-threading) is called inline on the caller's
//! task and never touches the pool. Either way every request ends as either
//! a response or a recorded [`TargetFailure`] before `dispatch` returns;
//! one target failing, or panicking, never affects another.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;

use crate::error::TransportError;
use crate::target::GatewayTarget;
use crate::transport::{DynGatewayTransport, GatewayRequest, GatewayResponse, GatewayTransport};

/// Bounded pool of outbound request slots, shared by every discovery.
///
/// Cloning shares the same permits.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of requests that could start right now.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    async fn acquire(&self) -> Result<OwnedSemaphorePermit, TransportError> {
        Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| TransportError::Aborted("worker pool closed".into()))
    }
}

/// How a dispatch was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Sequentially on the caller's task.
    Inline,
    /// Concurrently on the worker pool.
    Pooled,
}

/// A target whose request produced no response.
#[derive(Debug, Clone)]
pub struct TargetFailure {
    pub target: GatewayTarget,
    pub error: TransportError,
}

/// Outcome of one fan-out.
#[derive(Debug)]
pub struct Dispatch {
    pub responses: Vec<GatewayResponse>,
    pub failures: Vec<TargetFailure>,
    pub mode: DispatchMode,
}

impl Dispatch {
    fn from_outcomes(
        outcomes: Vec<Result<GatewayResponse, TargetFailure>>,
        mode: DispatchMode,
    ) -> Self {
        let mut responses = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(response) => responses.push(response),
                Err(failure) => failures.push(failure),
            }
        }
        Self {
            responses,
            failures,
            mode,
        }
    }

    /// Number of requests issued.
    pub fn dispatched(&self) -> usize {
        self.responses.len() + self.failures.len()
    }
}

/// Issues discovery requests to responding gateways.
#[derive(Clone)]
pub struct FanOutController {
    transport: DynGatewayTransport,
    pool: WorkerPool,
    multi_thread: bool,
    request_timeout: Option<Duration>,
}

impl FanOutController {
    pub fn new(transport: DynGatewayTransport, pool: WorkerPool) -> Self {
        Self {
            transport,
            pool,
            multi_thread: true,
            request_timeout: None,
        }
    }

    pub fn with_multi_thread(mut self, multi_thread: bool) -> Self {
        self.multi_thread = multi_thread;
        self
    }

    /// Bounds every outbound call; an elapsed call fails with
    /// `TransportError::Timeout`.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Sends every request and waits for all of them to finish.
    pub async fn dispatch(&self, requests: Vec<GatewayRequest>) -> Dispatch {
        if requests.len() <= 1 || !self.multi_thread {
            let mut outcomes = Vec::with_capacity(requests.len());
            for request in requests {
                let target = request.target.clone();
                let call = execute(self.transport.as_ref(), request, self.request_timeout);
                let outcome = match AssertUnwindSafe(call).catch_unwind().await {
                    Ok(outcome) => outcome,
                    Err(panic) => Err(aborted(target, panic_message(panic.as_ref()))),
                };
                outcomes.push(outcome);
            }
            return Dispatch::from_outcomes(outcomes, DispatchMode::Inline);
        }

        tracing::debug!(
            requests = requests.len(),
            pool_size = self.pool.size(),
            "dispatching to worker pool"
        );

        let handles: Vec<(GatewayTarget, JoinHandle<Result<GatewayResponse, TargetFailure>>)> =
            requests
                .into_iter()
                .map(|request| {
                    let target = request.target.clone();
                    let transport = Arc::clone(&self.transport);
                    let pool = self.pool.clone();
                    let timeout = self.request_timeout;
                    let handle = tokio::spawn(async move {
                        let _permit = match pool.acquire().await {
                            Ok(permit) => permit,
                            Err(error) => {
                                return Err(TargetFailure {
                                    target: request.target,
                                    error,
                                });
                            }
                        };
                        execute(transport.as_ref(), request, timeout).await
                    });
                    (target, handle)
                })
                .collect();

        // Slot i holds the outcome of request i.
        let mut outcomes = Vec::with_capacity(handles.len());
        for (target, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_error) if join_error.is_panic() => Err(aborted(
                    target,
                    panic_message(join_error.into_panic().as_ref()),
                )),
                Err(join_error) => Err(aborted(target, join_error.to_string())),
            };
            outcomes.push(outcome);
        }
        Dispatch::from_outcomes(outcomes, DispatchMode::Pooled)
    }
}

fn aborted(target: GatewayTarget, reason: String) -> TargetFailure {
    tracing::error!(gateway = %target, reason = %reason, "discovery request did not complete");
    TargetFailure {
        target,
        error: TransportError::Aborted(reason),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let message = if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    format!("request panicked: {message}")
}

async fn execute(
    transport: &dyn GatewayTransport,
    request: GatewayRequest,
    timeout: Option<Duration>,
) -> Result<GatewayResponse, TargetFailure> {
    let GatewayRequest { target, criteria } = request;
    let call = transport.send_discovery_request(&target, &criteria);
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(limit)),
        },
        None => call.await,
    };

    match result {
        Ok(response) => {
            tracing::debug!(
                gateway = %target,
                candidates = response.len(),
                "responding gateway answered"
            );
            Ok(GatewayResponse { target, response })
        }
        Err(error) => {
            tracing::warn!(
                remote_home_community_id = %target.home_community_id,
                endpoint = %target.endpoint,
                error = %error,
                "responding gateway request failed"
            );
            Err(TargetFailure { target, error })
        }
    }
}
