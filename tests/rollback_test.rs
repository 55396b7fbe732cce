use std::sync::Arc;

use trellis::config::Config;
use trellis::editor::TextEdit;
use trellis::operation::{
    EditContext, OperationError, OperationOutcome, Result as OperationResult, StructuralEdit,
};
use trellis::proposal::ProposalCatalog;
use trellis::symbols::TypeIndex;
use trellis::workspace::Workspace;
use trellis::TrellisError;

const URI: &str = "mem://rollback.go";

const SOURCE: &str = "package person

import \"github.com/acme/ui/forms\"

type PersonForm struct {
\tforms.Form
}
";

fn workspace() -> Workspace {
    let mut workspace = Workspace::new(
        Arc::new(ProposalCatalog::with_defaults()),
        Arc::new(TypeIndex::default()),
        Config::default(),
    );
    workspace.open(URI, SOURCE, None).unwrap();
    workspace
}

/// Applies a step, then fails on a stale snapshot
#[derive(Debug)]
struct StaleSecondStep;

impl StructuralEdit for StaleSecondStep {
    fn label(&self) -> String {
        "stale second step".to_string()
    }

    fn validate(&self, _ctx: &EditContext<'_>) -> OperationResult<()> {
        Ok(())
    }

    fn run(&self, ctx: &mut EditContext<'_>) -> OperationResult<OperationOutcome> {
        let before = ctx.document().version();
        ctx.apply(
            "add comment",
            vec![TextEdit::insert(0, "// Code generated by hand.\n")],
        )?;
        ctx.apply_at("stale edit", before, vec![TextEdit::insert(0, "x")])?;
        Ok(OperationOutcome::default())
    }
}

/// Leaves the document unparsable
#[derive(Debug)]
struct BreaksSyntax;

impl StructuralEdit for BreaksSyntax {
    fn label(&self) -> String {
        "break syntax".to_string()
    }

    fn validate(&self, _ctx: &EditContext<'_>) -> OperationResult<()> {
        Ok(())
    }

    fn run(&self, ctx: &mut EditContext<'_>) -> OperationResult<OperationOutcome> {
        let end = ctx.text().len();
        ctx.apply("append garbage", vec![TextEdit::insert(end, "func {\n")])?;
        Ok(OperationOutcome::default())
    }
}

#[test]
fn test_failed_step_rolls_back_earlier_steps() {
    let mut workspace = workspace();
    let result = workspace.run(URI, &StaleSecondStep);

    assert!(matches!(
        result,
        Err(TrellisError::Operation(OperationError::Apply { .. }))
    ));
    assert_eq!(workspace.text(URI).unwrap(), SOURCE);
}

#[test]
fn test_invalid_result_is_rolled_back() {
    let mut workspace = workspace();
    let result = workspace.run(URI, &BreaksSyntax);

    assert!(matches!(
        result,
        Err(TrellisError::Operation(OperationError::InvalidResult(_)))
    ));
    let document = workspace.document(URI).unwrap();
    assert_eq!(document.text(), SOURCE);
    assert!(!document.has_syntax_errors());
}
