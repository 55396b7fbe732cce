use crate::linked::GroupView;
use crate::proposal::Proposal;

/// The editor UI driven by linked mode; called on the service task only
pub trait EditorSurface: Send {
    fn enter_linked_mode(&mut self, uri: &str, groups: &[GroupView], exit_position: usize);

    /// Redraw the choice list of an active group
    fn refresh_choices(&mut self, group: &str, choices: &[Proposal]);

    fn exit_linked_mode(&mut self, uri: &str, exit_position: Option<usize>);
}
