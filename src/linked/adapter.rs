//! Choice lists for linked groups.
//!
//! The adapter for a group is picked once when the session starts: a fixed list,
//! or a background computation that reports back through a refresh hook.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::proposal::{
    AsyncProposalComputation, ComputationState, ListenerId, Proposal, ProposalError, ProposalJob,
};

/// Called with a group id when that group's choices changed; may run on any thread
pub type RefreshHook = Arc<dyn Fn(String) + Send + Sync>;

/// Where a group's choices come from
pub enum ChoiceSource {
    Static(Vec<Proposal>),
    Background(Box<dyn ProposalJob>),
}

impl fmt::Debug for ChoiceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoiceSource::Static(choices) => f.debug_tuple("Static").field(choices).finish(),
            ChoiceSource::Background(_) => f.write_str("Background"),
        }
    }
}

#[async_trait]
pub trait ChoiceAdapter: Send + Sync + fmt::Debug {
    /// Choices available right now, without waiting
    fn choices(&self) -> Vec<Proposal>;

    /// Choices once ready, or a placeholder after `timeout`
    async fn wait(&self, _timeout: Duration) -> Result<Vec<Proposal>, ProposalError> {
        Ok(self.choices())
    }

    fn is_pending(&self) -> bool {
        false
    }

    /// Release listeners and stop background work
    fn teardown(&mut self) {}
}

#[derive(Debug)]
pub struct StaticChoices(Vec<Proposal>);

impl ChoiceAdapter for StaticChoices {
    fn choices(&self) -> Vec<Proposal> {
        self.0.clone()
    }
}

#[derive(Debug)]
pub struct AsyncChoices {
    computation: AsyncProposalComputation,
    listener: Option<ListenerId>,
}

impl AsyncChoices {
    /// Submit `job` and ask `refresh` to re-poll `group` once it finishes
    pub fn start(
        group: &str,
        job: Box<dyn ProposalJob>,
        cancel: CancellationToken,
        refresh: RefreshHook,
    ) -> Self {
        let computation = AsyncProposalComputation::submit(job, cancel);
        let group = group.to_string();
        let listener = computation.on_completion(move |state| {
            if let ComputationState::Failed(error) = state {
                // Nobody is waiting on this path
                warn!("Choices for {} unavailable: {}", group, error);
            }
            refresh(group);
        });
        Self {
            computation,
            listener: Some(listener),
        }
    }

    pub fn computation(&self) -> &AsyncProposalComputation {
        &self.computation
    }
}

#[async_trait]
impl ChoiceAdapter for AsyncChoices {
    fn choices(&self) -> Vec<Proposal> {
        match self.computation.state() {
            ComputationState::Completed(choices) => choices.as_ref().clone(),
            ComputationState::Failed(_) => Vec::new(),
            ComputationState::Pending | ComputationState::Running => vec![Proposal::loading()],
        }
    }

    async fn wait(&self, timeout: Duration) -> Result<Vec<Proposal>, ProposalError> {
        self.computation.await_with_timeout(timeout).await
    }

    fn is_pending(&self) -> bool {
        !self.computation.is_done()
    }

    fn teardown(&mut self) {
        if let Some(listener) = self.listener.take() {
            self.computation.remove_listener(listener);
        }
        if !self.computation.is_done() {
            debug!("Cancelling unfinished choice computation");
            self.computation.cancel();
        }
    }
}

impl Drop for AsyncChoices {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Pick the adapter for a group's choice source
pub fn select_adapter(
    group: &str,
    source: ChoiceSource,
    cancel: &CancellationToken,
    refresh: &RefreshHook,
) -> Box<dyn ChoiceAdapter> {
    match source {
        ChoiceSource::Static(choices) => Box::new(StaticChoices(choices)),
        ChoiceSource::Background(job) => Box::new(AsyncChoices::start(
            group,
            job,
            cancel.child_token(),
            refresh.clone(),
        )),
    }
}
