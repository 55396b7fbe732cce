use parking_lot::Mutex;
use std::sync::Arc;

use trellis::config::Config;
use trellis::linked::{ExitPolicy, GroupView, TypeOutcome};
use trellis::proposal::{Proposal, ProposalCatalog};
use trellis::recipe::{NAME_GROUP, SUPER_TYPE_GROUP};
use trellis::symbols::TypeIndex;
use trellis::workspace::editor_service::{
    ApplyProposal, ExitLinkedMode, GetText, NextGroup, PollChoices, RequestProposals,
    SelectChoice, TypeText,
};
use trellis::workspace::{EditorService, EditorSurface, Workspace};

const URI: &str = "mem://person.go";

const SOURCE: &str = "package person

import (
\t\"github.com/acme/ui/fields\"
\t\"github.com/acme/ui/forms\"
)

type PersonForm struct {
\tforms.Form
\t// trellis:order:10.0
\tMainBox struct {
\t\tfields.GroupBox
\t}
}
";

#[derive(Debug, Clone, PartialEq)]
enum SurfaceEvent {
    Entered(Vec<GroupView>),
    Refreshed(String),
    Exited(Option<usize>),
}

#[derive(Clone, Default)]
struct RecordingSurface {
    events: Arc<Mutex<Vec<SurfaceEvent>>>,
}

impl EditorSurface for RecordingSurface {
    fn enter_linked_mode(&mut self, _uri: &str, groups: &[GroupView], _exit_position: usize) {
        self.events.lock().push(SurfaceEvent::Entered(groups.to_vec()));
    }

    fn refresh_choices(&mut self, group: &str, _choices: &[Proposal]) {
        self.events.lock().push(SurfaceEvent::Refreshed(group.to_string()));
    }

    fn exit_linked_mode(&mut self, _uri: &str, exit_position: Option<usize>) {
        self.events.lock().push(SurfaceEvent::Exited(exit_position));
    }
}

fn service(surface: RecordingSurface) -> trellis::workspace::service::Client<EditorService> {
    let index = TypeIndex::from_entries(vec![
        ("github.com/acme/ui/fields.DateField", vec![]),
        (
            "github.com/acme/ui/fields.BirthdayField",
            vec!["github.com/acme/ui/fields.DateField"],
        ),
    ]);
    let config = Config {
        proposal_timeout_ms: 5_000,
        ..Config::default()
    };
    let mut workspace = Workspace::new(
        Arc::new(ProposalCatalog::with_defaults()),
        Arc::new(index),
        config,
    );
    workspace
        .open(URI, SOURCE, Some("github.com/acme/app/person".to_string()))
        .unwrap();

    EditorService::new(workspace, Box::new(surface))
        .with_exit_policy(ExitPolicy::on('='))
        .start()
}

fn inside_main_box() -> usize {
    SOURCE.find("\t}\n}\n").unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_proposals_through_service() {
    let client = service(RecordingSurface::default());
    let proposals = client
        .request(RequestProposals {
            uri: URI.to_string(),
            offset: inside_main_box(),
            prefix: Some("date".to_string()),
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(proposals.len(), 1);
    assert_eq!(proposals[0].id.as_deref(), Some("date-field"));
    assert_eq!(proposals[0].replacement, "DateField");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_linked_session_after_insert() {
    let surface = RecordingSurface::default();
    let client = service(surface.clone());

    let outcome = client
        .request(ApplyProposal {
            uri: URI.to_string(),
            offset: inside_main_box(),
            proposal: "date-field".to_string(),
            prefix: None,
            name: Some("Birth".to_string()),
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        outcome.super_type.as_deref(),
        Some("github.com/acme/ui/fields.DateField")
    );

    let entered = surface.events.lock().first().cloned();
    let Some(SurfaceEvent::Entered(groups)) = entered else {
        panic!("linked mode not entered: {:?}", entered);
    };
    assert_eq!(groups[0].id, NAME_GROUP);
    assert_eq!(groups[0].ranges.len(), 3);
    assert_eq!(groups[1].id, SUPER_TYPE_GROUP);
    // Embedded field, accessor return type and accessor selector
    assert_eq!(groups[1].ranges.len(), 3);

    // Typing in the name group mirrors into the accessor
    let typed = client
        .request(TypeText {
            text: "day".to_string(),
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(typed, TypeOutcome::Mirrored);
    let text = client
        .request(GetText {
            uri: URI.to_string(),
        })
        .await
        .unwrap()
        .unwrap();
    assert!(text.contains("\t\tBirthday struct {\n\t\t\tfields.DateField\n\t\t}\n"));
    assert!(text.contains("func (p *PersonForm) GetBirthday() *fields.DateField {\n\treturn &p.MainBox.Birthday.DateField\n}\n"));

    // Supertype choices come from the background computation
    let group = client.request(NextGroup).await.unwrap().unwrap();
    assert_eq!(group, SUPER_TYPE_GROUP);
    let choices = client.request(PollChoices).await.unwrap().unwrap();
    let labels: Vec<&str> = choices.iter().map(|choice| choice.label.as_str()).collect();
    assert_eq!(labels, vec!["DateField", "BirthdayField"]);

    client.request(SelectChoice { index: 1 }).await.unwrap().unwrap();
    let exit = client.request(ExitLinkedMode).await.unwrap();

    let text = client
        .request(GetText {
            uri: URI.to_string(),
        })
        .await
        .unwrap()
        .unwrap();
    assert!(text.contains("\t\tBirthday struct {\n\t\t\tfields.BirthdayField\n\t\t}\n\t}\n}\n"));
    // The accessor follows the chosen supertype
    assert!(text.contains("func (p *PersonForm) GetBirthday() *fields.BirthdayField {\n\treturn &p.MainBox.Birthday.BirthdayField\n}\n"));
    assert!(!text.contains("DateField"));
    assert_eq!(exit, text.find("\t}\n}\n"));
    assert_eq!(
        surface.events.lock().last(),
        Some(&SurfaceEvent::Exited(exit))
    );

    // No session any more
    assert!(client
        .request(TypeText {
            text: "x".to_string()
        })
        .await
        .unwrap()
        .is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_exit_trigger_leaves_linked_mode() {
    let surface = RecordingSurface::default();
    let client = service(surface.clone());

    client
        .request(ApplyProposal {
            uri: URI.to_string(),
            offset: inside_main_box(),
            proposal: "string-field".to_string(),
            prefix: None,
            name: Some("Title".to_string()),
        })
        .await
        .unwrap()
        .unwrap();

    let outcome = client
        .request(TypeText {
            text: "Field=x".to_string(),
        })
        .await
        .unwrap()
        .unwrap();
    let TypeOutcome::Exited { exit_position } = outcome else {
        panic!("expected exit, got {:?}", outcome);
    };

    let text = client
        .request(GetText {
            uri: URI.to_string(),
        })
        .await
        .unwrap()
        .unwrap();
    assert!(text.contains("\t\tTitleField struct {"));
    assert!(!text.contains('='));
    assert_eq!(Some(exit_position), text.find("\t}\n}\n"));
    assert!(surface
        .events
        .lock()
        .iter()
        .any(|event| matches!(event, SurfaceEvent::Exited(Some(_)))));
}
