use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::service::{Client, Handler, Service};
use super::surface::EditorSurface;
use super::Workspace;
use crate::core::{Result, TrellisError};
use crate::linked::{ExitPolicy, LinkedEditSession, RefreshHook, TypeOutcome};
use crate::operation::{OperationOutcome, StructuralEdit};
use crate::proposal::Proposal;

/// Foreground service owning the workspace and the active linked session
pub struct EditorService {
    workspace: Workspace,
    surface: Box<dyn EditorSurface>,
    session: Option<LinkedEditSession>,
    exit_policy: ExitPolicy,
    cancel: CancellationToken,
    self_client: Option<Client<EditorService>>,
}

impl Service for EditorService {}

impl EditorService {
    pub fn new(workspace: Workspace, surface: Box<dyn EditorSurface>) -> Self {
        Self {
            workspace,
            surface,
            session: None,
            exit_policy: ExitPolicy::none(),
            cancel: CancellationToken::new(),
            self_client: None,
        }
    }

    pub fn with_exit_policy(mut self, exit_policy: ExitPolicy) -> Self {
        self.exit_policy = exit_policy;
        self
    }

    /// Spawn on the current runtime
    pub fn start(self) -> Client<EditorService> {
        self.spawn_with_self(|service, client| service.self_client = Some(client))
    }

    /// Posts `RefreshChoices` back to this service from whichever thread finishes a job
    fn refresh_hook(&self) -> RefreshHook {
        let client = self.self_client.clone();
        Arc::new(move |group: String| {
            if let Some(client) = &client {
                client.notify(RefreshChoices { group });
            }
        })
    }

    fn end_session(&mut self) -> Option<usize> {
        let session = self.session.take()?;
        let uri = session.uri().to_string();
        let exit_position = match self.workspace.document_mut(&uri) {
            Ok(document) => session.exit(document),
            Err(_) => None,
        };
        self.surface.exit_linked_mode(&uri, exit_position);
        exit_position
    }
}

/// Completion proposals at a cursor offset
pub struct RequestProposals {
    pub uri: String,
    pub offset: usize,
    pub prefix: Option<String>,
}

/// Insert a proposal and enter linked mode over the new member
pub struct ApplyProposal {
    pub uri: String,
    pub offset: usize,
    pub proposal: String,
    pub prefix: Option<String>,
    pub name: Option<String>,
}

/// Run a copy, move or delete; ends linked mode first
pub struct RunOperation {
    pub uri: String,
    pub operation: Box<dyn StructuralEdit>,
}

/// Keystrokes in the active linked group
pub struct TypeText {
    pub text: String,
}

pub struct SelectChoice {
    pub index: usize,
}

pub struct NextGroup;

/// Posted when a group's background choices finished
pub struct RefreshChoices {
    pub group: String,
}

/// Choices of the active group, waiting up to the configured proposal timeout
pub struct PollChoices;

pub struct ExitLinkedMode;

pub struct GetText {
    pub uri: String,
}

impl Handler<RequestProposals> for EditorService {
    type Response = Result<Vec<Proposal>>;

    async fn handle(&mut self, msg: RequestProposals) -> Self::Response {
        self.workspace
            .proposals_at(&msg.uri, msg.offset, msg.prefix.as_deref())
    }
}

impl Handler<ApplyProposal> for EditorService {
    type Response = Result<OperationOutcome>;

    async fn handle(&mut self, msg: ApplyProposal) -> Self::Response {
        info!("ApplyProposal: {} at {} in {}", msg.proposal, msg.offset, msg.uri);
        self.end_session();

        let outcome = self.workspace.apply_proposal(
            &msg.uri,
            msg.offset,
            &msg.proposal,
            msg.prefix,
            msg.name,
        )?;
        if outcome.slots.is_empty() {
            return Ok(outcome);
        }

        let sources = self.workspace.choice_sources(&msg.uri, &outcome)?;
        let refresh = self.refresh_hook();
        let exit_position = outcome.exit_position.unwrap_or(msg.offset);
        let document = self.workspace.document_mut(&msg.uri)?;
        let session = LinkedEditSession::enter(
            document,
            &outcome.slots,
            sources,
            exit_position,
            self.exit_policy.clone(),
            &self.cancel,
            refresh,
        )?;
        self.surface
            .enter_linked_mode(&msg.uri, &session.views(document), exit_position);
        self.session = Some(session);
        Ok(outcome)
    }
}

impl Handler<RunOperation> for EditorService {
    type Response = Result<OperationOutcome>;

    async fn handle(&mut self, msg: RunOperation) -> Self::Response {
        self.end_session();
        self.workspace.run(&msg.uri, msg.operation.as_ref())
    }
}

impl Handler<TypeText> for EditorService {
    type Response = Result<TypeOutcome>;

    async fn handle(&mut self, msg: TypeText) -> Self::Response {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| TrellisError::linked("not in linked mode"))?;
        let document = self.workspace.document_mut(session.uri())?;
        let outcome = session.type_text(document, &msg.text)?;
        if let TypeOutcome::Exited { exit_position } = outcome {
            debug!("Exit trigger typed, leaving linked mode at {}", exit_position);
            self.end_session();
        }
        Ok(outcome)
    }
}

impl Handler<SelectChoice> for EditorService {
    type Response = Result<()>;

    async fn handle(&mut self, msg: SelectChoice) -> Self::Response {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| TrellisError::linked("not in linked mode"))?;
        let document = self.workspace.document_mut(session.uri())?;
        session.select_choice(document, msg.index)
    }
}

impl Handler<NextGroup> for EditorService {
    type Response = Result<String>;

    async fn handle(&mut self, _: NextGroup) -> Self::Response {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| TrellisError::linked("not in linked mode"))?;
        Ok(session.next_group().id.clone())
    }
}

impl Handler<RefreshChoices> for EditorService {
    type Response = ();

    async fn handle(&mut self, msg: RefreshChoices) -> Self::Response {
        let choices = self
            .session
            .as_ref()
            .and_then(|session| session.refreshed_choices(&msg.group));
        match choices {
            Some(choices) => self.surface.refresh_choices(&msg.group, &choices),
            None => debug!("Group {} is no longer active, skipping refresh", msg.group),
        }
    }
}

impl Handler<PollChoices> for EditorService {
    type Response = Result<Vec<Proposal>>;

    async fn handle(&mut self, _: PollChoices) -> Self::Response {
        let timeout = self.workspace.config().proposal_timeout();
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| TrellisError::linked("not in linked mode"))?;
        session.await_choices(timeout).await
    }
}

impl Handler<ExitLinkedMode> for EditorService {
    type Response = Option<usize>;

    async fn handle(&mut self, _: ExitLinkedMode) -> Self::Response {
        self.end_session()
    }
}

impl Handler<GetText> for EditorService {
    type Response = Result<String>;

    async fn handle(&mut self, msg: GetText) -> Self::Response {
        self.workspace.text(&msg.uri)
    }
}
