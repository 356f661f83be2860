use crate::editing::EditError;
use crate::editing::commands::Cmd;
use crate::editing::document::Document;
use crate::editing::patch::Patch;
use crate::editing::point::Selection;

/// Change notification invoked once per successful intent
pub type ChangeListener = Box<dyn FnMut(&Document, &Patch)>;

/// Owns the single (document, selection) state between intents.
///
/// Commands run against a scratch copy of the document and are committed
/// only on success, so a rejected intent leaves the state untouched and the
/// listener silent. Between intents the host reads the state through
/// [`Editor::document`]; it never mutates the tree directly.
pub struct Editor {
    doc: Document,
    listener: Option<ChangeListener>,
}

impl Editor {
    /// Editor over the default single-paragraph document
    pub fn new() -> Self {
        Self::with_document(Document::new())
    }

    pub fn with_document(doc: Document) -> Self {
        Self {
            doc,
            listener: None,
        }
    }

    /// Register the change listener, replacing any previous one
    pub fn on_change(&mut self, listener: impl FnMut(&Document, &Patch) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Read-only view of the current document, selection included
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Apply one intent and notify the listener with the committed state
    pub fn dispatch(&mut self, cmd: Cmd) -> Result<Patch, EditError> {
        let mut next = self.doc.clone();
        let patch = next.apply(&cmd)?;
        self.doc = next;
        if let Some(listener) = self.listener.as_mut() {
            listener(&self.doc, &patch);
        }
        Ok(patch)
    }

    /// Validated cursor placement from the host. Not an intent: the
    /// listener is not notified.
    pub fn select(&mut self, selection: Selection) -> Result<(), EditError> {
        self.doc.set_selection(selection)
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::document::DEFAULT_PLACEHOLDER;
    use crate::editing::point::Point;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_initial_state_contract() {
        let editor = Editor::new();
        let doc = editor.document();

        assert_eq!(doc.text(), DEFAULT_PLACEHOLDER);
        assert_eq!(doc.version(), 0);
        assert_eq!(
            doc.selection(),
            &Selection::collapsed(Point::new([0, 0], 0))
        );
    }

    #[test]
    fn test_listener_fires_once_per_successful_intent() {
        let versions: Rc<RefCell<Vec<u64>>> = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&versions);
        let mut editor = Editor::new();
        editor.on_change(move |doc, patch| {
            assert_eq!(doc.version(), patch.version);
            seen.borrow_mut().push(patch.version);
        });

        editor
            .dispatch(Cmd::InsertLiteral { text: "a".to_string() })
            .unwrap();
        editor.dispatch(Cmd::ToggleCodeBlock).unwrap();

        assert_eq!(*versions.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_failed_intent_changes_nothing_and_stays_silent() {
        let calls = Rc::new(RefCell::new(0u32));
        let seen = Rc::clone(&calls);
        let mut editor = Editor::new();
        editor.on_change(move |_, _| {
            *seen.borrow_mut() += 1;
        });
        let before = editor.document().clone();

        let result = editor.dispatch(Cmd::ToggleBold);

        assert!(matches!(result, Err(EditError::InvalidIntent(_))));
        assert_eq!(editor.document(), &before);
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_engine_survives_errors() {
        let mut editor = Editor::new();

        let _ = editor.dispatch(Cmd::ToggleBold);
        let patch = editor
            .dispatch(Cmd::InsertLiteral { text: "ok".to_string() })
            .unwrap();

        assert_eq!(patch.version, 1);
        assert!(editor.document().text().starts_with("ok"));
    }

    #[test]
    fn test_select_is_validated_and_silent() {
        let calls = Rc::new(RefCell::new(0u32));
        let seen = Rc::clone(&calls);
        let mut editor = Editor::new();
        editor.on_change(move |_, _| {
            *seen.borrow_mut() += 1;
        });

        editor
            .select(Selection::collapsed(Point::new([0, 0], 4)))
            .unwrap();
        let bad = editor.select(Selection::collapsed(Point::new([9, 0], 0)));

        assert!(matches!(bad, Err(EditError::InvalidSelection(_))));
        assert_eq!(editor.document().selection().focus.offset, 4);
        assert_eq!(*calls.borrow(), 0);
    }
}
