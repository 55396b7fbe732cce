use super::edit::{EditReceipt, TextEdit};

/// One applied step of a structural operation and the edits that undo it
#[derive(Debug, Clone)]
pub struct JournalStep {
    /// Document the step was applied to
    pub uri: String,
    /// Description of the step (e.g. "rewrite order keys")
    pub description: String,
    /// Version of the document right after the step
    pub version_after: u64,
    /// Undo edits, expressed against `version_after`
    pub inverse: Vec<TextEdit>,
}

/// Ordered record of applied steps that can be replayed backwards
#[derive(Debug, Default)]
pub struct Journal {
    /// Label of the operation this journal belongs to
    pub label: String,
    steps: Vec<JournalStep>,
}

impl Journal {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            steps: Vec::new(),
        }
    }

    /// Record a successfully applied step
    pub fn record(&mut self, uri: &str, description: impl Into<String>, receipt: EditReceipt) {
        if receipt.is_noop() {
            return;
        }
        self.steps.push(JournalStep {
            uri: uri.to_string(),
            description: description.into(),
            version_after: receipt.version_after,
            inverse: receipt.inverse,
        });
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[JournalStep] {
        &self.steps
    }

    /// Steps newest first, ready to be undone
    pub fn into_undo_order(self) -> impl Iterator<Item = JournalStep> {
        self.steps.into_iter().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::TextBuffer;

    #[test]
    fn test_replaying_journal_restores_text() {
        let mut buffer = TextBuffer::new("Hello");
        let mut journal = Journal::new("test");

        for i in 1..=3 {
            let receipt = buffer
                .apply(buffer.version(), &[TextEdit::insert(buffer.len(), format!(" {}", i))])
                .unwrap();
            journal.record("mem://a", format!("append {}", i), receipt);
        }
        assert_eq!(buffer.text(), "Hello 1 2 3");
        assert_eq!(journal.len(), 3);

        for step in journal.into_undo_order() {
            assert_eq!(step.version_after, buffer.version());
            buffer.apply(step.version_after, &step.inverse).unwrap();
        }
        assert_eq!(buffer.text(), "Hello");
    }

    #[test]
    fn test_noop_steps_are_skipped() {
        let mut buffer = TextBuffer::new("x");
        let mut journal = Journal::new("noop");
        let receipt = buffer.apply(0, &[]).unwrap();
        journal.record("mem://a", "nothing", receipt);
        assert!(journal.is_empty());
    }
}
