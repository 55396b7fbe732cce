//! Background computation of a proposal list.
//!
//! A computation moves `Pending -> Running -> Completed | Failed` exactly once.
//! Listeners registered before or after completion are each called exactly once
//! with the terminal state. Waiting callers get a "Loading…" placeholder when the
//! work has not finished within their timeout.

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::ProposalError;
use super::Proposal;

/// A unit of work producing proposals; must check `cancel` cooperatively
#[async_trait]
pub trait ProposalJob: Send + Sync + 'static {
    async fn compute(&self, cancel: CancellationToken) -> Result<Vec<Proposal>, ProposalError>;
}

#[async_trait]
impl ProposalJob for Box<dyn ProposalJob> {
    async fn compute(&self, cancel: CancellationToken) -> Result<Vec<Proposal>, ProposalError> {
        self.as_ref().compute(cancel).await
    }
}

#[derive(Debug, Clone)]
pub enum ComputationState {
    Pending,
    Running,
    Completed(Arc<Vec<Proposal>>),
    Failed(ProposalError),
}

impl ComputationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ComputationState::Completed(_) | ComputationState::Failed(_)
        )
    }

    fn into_result(self) -> Option<Result<Vec<Proposal>, ProposalError>> {
        match self {
            ComputationState::Completed(proposals) => Some(Ok(proposals.as_ref().clone())),
            ComputationState::Failed(error) => Some(Err(error)),
            _ => None,
        }
    }
}

/// Called once with the terminal state
pub type CompletionListener = Box<dyn FnOnce(&ComputationState) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Shared {
    listeners: Vec<(ListenerId, CompletionListener)>,
    next_listener: u64,
}

struct Inner {
    shared: Mutex<Shared>,
    state: watch::Sender<ComputationState>,
    cancel: CancellationToken,
}

/// Handle to a submitted background computation
#[derive(Clone)]
pub struct AsyncProposalComputation {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for AsyncProposalComputation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncProposalComputation")
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

impl AsyncProposalComputation {
    fn pending(cancel: CancellationToken) -> Self {
        let (state, _) = watch::channel(ComputationState::Pending);
        Self {
            inner: Arc::new(Inner {
                shared: Mutex::new(Shared {
                    listeners: Vec::new(),
                    next_listener: 0,
                }),
                state,
                cancel,
            }),
        }
    }

    /// Schedule `job` on the current tokio runtime and return immediately
    pub fn submit(job: impl ProposalJob, cancel: CancellationToken) -> Self {
        Self::submit_on(&tokio::runtime::Handle::current(), job, cancel)
    }

    /// Schedule `job` on `runtime` and return immediately
    pub fn submit_on(
        runtime: &tokio::runtime::Handle,
        job: impl ProposalJob,
        cancel: CancellationToken,
    ) -> Self {
        let computation = Self::pending(cancel.clone());
        let worker = computation.clone();

        runtime.spawn(async move {
            worker.inner.state.send_if_modified(|state| {
                if matches!(state, ComputationState::Pending) {
                    *state = ComputationState::Running;
                    true
                } else {
                    false
                }
            });

            let run = AssertUnwindSafe(job.compute(cancel.clone())).catch_unwind();
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ProposalError::Cancelled),
                result = run => match result {
                    Ok(result) => result,
                    Err(panic) => Err(ProposalError::Panicked(panic_message(panic.as_ref()))),
                },
            };
            worker.complete(outcome);
        });

        computation
    }

    /// Computation that is already finished, for static choices
    pub fn ready(proposals: Vec<Proposal>) -> Self {
        let computation = Self::pending(CancellationToken::new());
        computation.complete(Ok(proposals));
        computation
    }

    pub fn state(&self) -> ComputationState {
        self.inner.state.borrow().clone()
    }

    pub fn is_done(&self) -> bool {
        self.inner.state.borrow().is_terminal()
    }

    /// Signal the job to stop; it finishes as `Failed(Cancelled)` unless already done
    pub fn cancel(&self) {
        self.inner.cancel.cancel();
    }

    fn complete(&self, outcome: Result<Vec<Proposal>, ProposalError>) {
        let terminal = match outcome {
            Ok(proposals) => ComputationState::Completed(Arc::new(proposals)),
            Err(error) => ComputationState::Failed(error),
        };

        let listeners = {
            let mut shared = self.inner.shared.lock();
            let mut first = false;
            self.inner.state.send_if_modified(|state| {
                if state.is_terminal() {
                    return false;
                }
                *state = terminal.clone();
                first = true;
                true
            });
            if !first {
                return;
            }
            std::mem::take(&mut shared.listeners)
        };

        match &terminal {
            ComputationState::Failed(error) => debug!("Proposal computation failed: {}", error),
            _ => debug!("Proposal computation completed"),
        }
        for (_, listener) in listeners {
            listener(&terminal);
        }
    }

    /// Call `listener` once when the computation finishes, or right away if it already has
    pub fn on_completion(
        &self,
        listener: impl FnOnce(&ComputationState) + Send + 'static,
    ) -> ListenerId {
        let mut shared = self.inner.shared.lock();
        let id = ListenerId(shared.next_listener);
        shared.next_listener += 1;

        let state = self.inner.state.borrow().clone();
        if state.is_terminal() {
            drop(shared);
            listener(&state);
        } else {
            shared.listeners.push((id, Box::new(listener)));
        }
        id
    }

    /// Drop a registered listener that has not fired yet
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut shared = self.inner.shared.lock();
        let before = shared.listeners.len();
        shared.listeners.retain(|(listener, _)| *listener != id);
        shared.listeners.len() != before
    }

    /// Results if finished within `timeout`, else a single "Loading…" placeholder.
    ///
    /// A failed computation returns its error.
    pub async fn await_with_timeout(&self, timeout: Duration) -> Result<Vec<Proposal>, ProposalError> {
        let mut receiver = self.inner.state.subscribe();
        let waited = tokio::time::timeout(timeout, async {
            receiver
                .wait_for(ComputationState::is_terminal)
                .await
                .map(|state| state.clone())
        })
        .await;

        match waited {
            Ok(Ok(state)) => state
                .into_result()
                .unwrap_or_else(|| Ok(vec![Proposal::loading()])),
            Ok(Err(_)) => {
                warn!("Proposal computation dropped before completing");
                Err(ProposalError::Cancelled)
            }
            Err(_) => Ok(vec![Proposal::loading()]),
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
