use hashbrown::HashMap;
use std::ops::Range;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::adapter::{select_adapter, ChoiceAdapter, ChoiceSource, RefreshHook};
use crate::core::{Result, TrellisError};
use crate::document::SourceDocument;
use crate::editor::{PositionId, TextEdit, TrackedPosition};
use crate::proposal::Proposal;
use crate::recipe::{Slot, SlotText};

/// Ends linked mode when one of its trigger characters is typed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExitPolicy {
    triggers: Vec<char>,
}

impl ExitPolicy {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn on(trigger: char) -> Self {
        Self {
            triggers: vec![trigger],
        }
    }

    pub fn or(mut self, trigger: char) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Byte index of the first trigger in `text`
    pub fn trigger_in(&self, text: &str) -> Option<usize> {
        text.char_indices()
            .find(|(_, c)| self.triggers.contains(c))
            .map(|(i, _)| i)
    }
}

/// Positions edited together, plus where their choices come from
#[derive(Debug)]
pub struct PositionGroup {
    pub id: String,
    positions: Vec<(PositionId, SlotText)>,
    adapter: Box<dyn ChoiceAdapter>,
}

impl PositionGroup {
    pub fn positions(&self) -> impl Iterator<Item = PositionId> + '_ {
        self.positions.iter().map(|(id, _)| *id)
    }

    pub fn choices(&self) -> Vec<Proposal> {
        self.adapter.choices()
    }

    pub fn is_pending(&self) -> bool {
        self.adapter.is_pending()
    }
}

/// What the editor surface needs to draw a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupView {
    pub id: String,
    pub ranges: Vec<Range<usize>>,
    pub choices: Vec<Proposal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOutcome {
    /// Text mirrored into every position of the current group
    Mirrored,
    /// A trigger character ended linked mode
    Exited { exit_position: usize },
}

/// Lock-step editing of the slots an operation produced
#[derive(Debug)]
pub struct LinkedEditSession {
    uri: String,
    groups: Vec<PositionGroup>,
    current: usize,
    exit: PositionId,
    exit_policy: ExitPolicy,
    cancel: CancellationToken,
}

impl LinkedEditSession {
    /// Track `slots` in `document` and start linked mode.
    ///
    /// Groups are ordered by their first slot. Background choice jobs run under a
    /// child of `parent`, so dropping the session or cancelling `parent` stops them.
    pub fn enter(
        document: &mut SourceDocument,
        slots: &[Slot],
        mut sources: HashMap<String, ChoiceSource>,
        exit_position: usize,
        exit_policy: ExitPolicy,
        parent: &CancellationToken,
        refresh: RefreshHook,
    ) -> Result<Self> {
        let mut ordered: Vec<&Slot> = slots.iter().collect();
        ordered.sort_by_key(|slot| slot.range.start);

        let cancel = parent.child_token();
        let mut groups: Vec<PositionGroup> = Vec::new();
        for slot in ordered {
            let id = document.track(slot.range.start, slot.range.end - slot.range.start);
            match groups.iter_mut().find(|group| group.id == slot.group) {
                Some(group) => group.positions.push((id, slot.text)),
                None => {
                    let source = sources
                        .remove(&slot.group)
                        .unwrap_or(ChoiceSource::Static(Vec::new()));
                    groups.push(PositionGroup {
                        id: slot.group.clone(),
                        positions: vec![(id, slot.text)],
                        adapter: select_adapter(&slot.group, source, &cancel, &refresh),
                    });
                }
            }
        }

        if groups.is_empty() {
            return Err(TrellisError::linked("no linked positions"));
        }
        let exit = document.track(exit_position, 0);
        info!(
            "Linked mode in {} with {} group(s)",
            document.uri(),
            groups.len()
        );

        Ok(Self {
            uri: document.uri().to_string(),
            groups,
            current: 0,
            exit,
            exit_policy,
            cancel,
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn groups(&self) -> &[PositionGroup] {
        &self.groups
    }

    pub fn current_group(&self) -> &PositionGroup {
        &self.groups[self.current]
    }

    pub fn group(&self, id: &str) -> Option<&PositionGroup> {
        self.groups.iter().find(|group| group.id == id)
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Live positions of a group, in document order
    pub fn positions(&self, document: &SourceDocument, group: &PositionGroup) -> Vec<TrackedPosition> {
        self.live_positions(document, group)
            .into_iter()
            .map(|(position, _)| position)
            .collect()
    }

    fn live_positions(
        &self,
        document: &SourceDocument,
        group: &PositionGroup,
    ) -> Vec<(TrackedPosition, SlotText)> {
        group
            .positions
            .iter()
            .filter_map(|(id, text)| document.position(*id).map(|position| (position, *text)))
            .filter(|(position, _)| !position.deleted)
            .collect()
    }

    pub fn views(&self, document: &SourceDocument) -> Vec<GroupView> {
        self.groups
            .iter()
            .map(|group| GroupView {
                id: group.id.clone(),
                ranges: self
                    .positions(document, group)
                    .iter()
                    .map(TrackedPosition::range)
                    .collect(),
                choices: group.choices(),
            })
            .collect()
    }

    /// Current text of the active group
    pub fn current_text(&self, document: &SourceDocument) -> String {
        self.live_positions(document, self.current_group())
            .iter()
            .find(|(_, text)| *text == SlotText::Verbatim)
            .map(|(position, _)| document.buffer().slice(position.range()))
            .unwrap_or_default()
    }

    pub fn exit_position(&self, document: &SourceDocument) -> Option<usize> {
        document.position(self.exit).map(|position| position.offset)
    }

    /// Replace every position of the active group with `text`, as each position shows it
    pub fn set_group_text(&self, document: &mut SourceDocument, text: &str) -> Result<()> {
        let edits: Vec<TextEdit> = self
            .live_positions(document, self.current_group())
            .iter()
            .map(|(position, shown)| TextEdit::replace(position.range(), shown.project(text)))
            .collect();
        let version = document.version();
        document.apply(version, &edits)?;
        debug!("Group {} now reads {:?}", self.current_group().id, text);
        Ok(())
    }

    /// Append typed text to the active group in all its positions.
    ///
    /// Text up to an exit trigger is written; the trigger itself is consumed.
    pub fn type_text(&self, document: &mut SourceDocument, typed: &str) -> Result<TypeOutcome> {
        let (written, exits) = match self.exit_policy.trigger_in(typed) {
            Some(index) => (&typed[..index], true),
            None => (typed, false),
        };

        if !written.is_empty() {
            let text = format!("{}{}", self.current_text(document), written);
            self.set_group_text(document, &text)?;
        }

        if exits {
            let exit_position = self
                .exit_position(document)
                .ok_or_else(|| TrellisError::linked("exit position lost"))?;
            return Ok(TypeOutcome::Exited { exit_position });
        }
        Ok(TypeOutcome::Mirrored)
    }

    /// Write the active group's choice at `index`
    pub fn select_choice(&self, document: &mut SourceDocument, index: usize) -> Result<()> {
        let choices = self.current_group().choices();
        let choice = choices
            .get(index)
            .ok_or_else(|| TrellisError::linked(format!("no choice at {}", index)))?;
        if choice.is_loading() {
            return Err(TrellisError::linked("choices are still loading"));
        }
        self.set_group_text(document, &choice.replacement)
    }

    /// Move to the next group, wrapping around
    pub fn next_group(&mut self) -> &PositionGroup {
        self.current = (self.current + 1) % self.groups.len();
        &self.groups[self.current]
    }

    /// New choices for `group` if it is the active one
    pub fn refreshed_choices(&self, group: &str) -> Option<Vec<Proposal>> {
        let current = self.current_group();
        (current.id == group).then(|| current.choices())
    }

    /// Choices of the active group, waiting at most `timeout` for background work
    pub async fn await_choices(&self, timeout: Duration) -> Result<Vec<Proposal>> {
        Ok(self.current_group().adapter.wait(timeout).await?)
    }

    /// Leave linked mode: stop background work, drop listeners and positions.
    ///
    /// Returns where the cursor should go.
    pub fn exit(mut self, document: &mut SourceDocument) -> Option<usize> {
        let exit_position = self.exit_position(document);
        self.cancel.cancel();
        for group in &mut self.groups {
            group.adapter.teardown();
            for (id, _) in &group.positions {
                document.untrack(*id);
            }
        }
        document.untrack(self.exit);
        info!("Left linked mode in {}", self.uri);
        exit_position
    }
}

impl Drop for LinkedEditSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
