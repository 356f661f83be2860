use crate::editing::EditError;
use crate::editing::document::{Document, PartialCoverage};
use crate::editing::node::{ElementKind, Mark};
use crate::editing::patch::Patch;
use crate::editing::point::{Path, Selection};

/// Editing intents accepted by the engine.
///
/// Each intent is resolved atomically against the current document and
/// selection: a rejected intent changes nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Insert literal text at the selection, in place of whatever the host
    /// keystroke would have inserted
    InsertLiteral { text: String },
    /// Flip the blocks touched by the selection between code block and
    /// paragraph, depending on whether the selection already sits inside a
    /// code block
    ToggleCodeBlock,
    /// Set the bold mark on every run intersecting the selection, splitting
    /// partially covered runs so only the covered segments change
    ToggleBold,
}

/// Resolve a command against the document: validate, run the model
/// primitives, transform the stored selection, and bump the version.
pub(crate) fn apply_command(doc: &mut Document, cmd: &Cmd) -> Result<Patch, EditError> {
    let selection = doc.selection.clone();
    doc.validate_selection(&selection)?;

    let (new_selection, changed) = match cmd {
        Cmd::InsertLiteral { text } => {
            if text.is_empty() {
                return Err(EditError::InvalidIntent(
                    "insert payload is empty".to_string(),
                ));
            }
            let new_selection = doc.insert_text(&selection, text)?;
            (new_selection, touched_blocks(&selection))
        }
        Cmd::ToggleCodeBlock => {
            let inside_code = doc
                .find_matching_ancestor(&selection, |el| el.kind == ElementKind::CodeBlock)?
                .is_some();
            let new_kind = if inside_code {
                ElementKind::Paragraph
            } else {
                ElementKind::CodeBlock
            };
            let targets = doc.block_level_targets(&selection)?;
            let flipped =
                doc.set_element_kind(|_, path| targets.iter().any(|t| t == path), new_kind)?;
            (selection.clone(), block_roots(&flipped))
        }
        Cmd::ToggleBold => {
            // A collapsed selection covers no text; there is nothing to mark.
            if selection.is_collapsed() {
                return Err(EditError::InvalidIntent(
                    "mark toggle requires a non-collapsed selection".to_string(),
                ));
            }
            let new_selection =
                doc.set_text_mark(&selection, Mark::Bold, true, PartialCoverage::Split)?;
            (new_selection, touched_blocks(&selection))
        }
    };

    doc.selection = new_selection.clone();
    doc.version += 1;

    Ok(Patch {
        changed,
        new_selection,
        version: doc.version,
    })
}

/// Top-level block paths spanned by a selection
fn touched_blocks(selection: &Selection) -> Vec<Path> {
    match (
        selection.start().path.first(),
        selection.end().path.first(),
    ) {
        (Some(&from), Some(&to)) => (from..=to).map(|i| vec![i]).collect(),
        _ => Vec::new(),
    }
}

/// Collapse arbitrary node paths to their distinct top-level block paths
fn block_roots(paths: &[Path]) -> Vec<Path> {
    let mut roots: Vec<Path> = Vec::new();
    for path in paths {
        if let Some(&first) = path.first() {
            let root = vec![first];
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
    }
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::node::{Element, Node};
    use crate::editing::point::Point;
    use pretty_assertions::assert_eq;

    fn block_kind(doc: &Document, path: &[usize]) -> Option<ElementKind> {
        doc.node_at(path).and_then(Node::as_element).map(|el| el.kind)
    }

    // ============ InsertLiteral tests ============

    #[test]
    fn test_insert_literal_at_start_advances_cursor() {
        let mut doc = Document::from_blocks(vec![Node::Element(Element::paragraph("X"))]).unwrap();

        let patch = doc
            .apply(&Cmd::InsertLiteral { text: "and".to_string() })
            .unwrap();

        assert_eq!(doc.text(), "andX");
        assert_eq!(patch.new_selection, Selection::collapsed(Point::new([0, 0], 3)));
        assert_eq!(patch.version, 1);
        assert_eq!(patch.changed, vec![vec![0]]);
    }

    #[test]
    fn test_insert_literal_rejects_empty_payload() {
        let mut doc = Document::new();
        let before = doc.clone();

        let result = doc.apply(&Cmd::InsertLiteral { text: String::new() });

        assert_eq!(
            result,
            Err(EditError::InvalidIntent("insert payload is empty".to_string()))
        );
        assert_eq!(doc, before);
    }

    #[test]
    fn test_insert_literal_over_range_replaces_it() {
        let mut doc =
            Document::from_blocks(vec![Node::Element(Element::paragraph("hello world"))]).unwrap();
        doc.set_selection(Selection::range(
            Point::new([0, 0], 5),
            Point::new([0, 0], 11),
        ))
        .unwrap();

        doc.apply(&Cmd::InsertLiteral { text: "!".to_string() }).unwrap();

        assert_eq!(doc.text(), "hello!");
    }

    // ============ ToggleCodeBlock tests ============

    #[test]
    fn test_toggle_code_block_flips_paragraph() {
        let mut doc = Document::new();

        let patch = doc.apply(&Cmd::ToggleCodeBlock).unwrap();

        assert_eq!(block_kind(&doc, &[0]), Some(ElementKind::CodeBlock));
        assert_eq!(patch.changed, vec![vec![0]]);
    }

    #[test]
    fn test_toggle_code_block_twice_restores_kinds() {
        let mut doc = Document::new();
        let original_blocks = doc.blocks().to_vec();

        doc.apply(&Cmd::ToggleCodeBlock).unwrap();
        doc.apply(&Cmd::ToggleCodeBlock).unwrap();

        assert_eq!(doc.blocks(), original_blocks.as_slice());
        assert_eq!(doc.version(), 2);
    }

    #[test]
    fn test_toggle_code_block_only_touches_selected_blocks() {
        let mut doc = Document::from_blocks(vec![
            Node::Element(Element::paragraph("first")),
            Node::Element(Element::paragraph("second")),
        ])
        .unwrap();

        doc.apply(&Cmd::ToggleCodeBlock).unwrap();

        assert_eq!(block_kind(&doc, &[0]), Some(ElementKind::CodeBlock));
        assert_eq!(block_kind(&doc, &[1]), Some(ElementKind::Paragraph));
    }

    #[test]
    fn test_toggle_code_block_spanning_selection_flips_both() {
        let mut doc = Document::from_blocks(vec![
            Node::Element(Element::paragraph("first")),
            Node::Element(Element::paragraph("second")),
        ])
        .unwrap();
        doc.set_selection(Selection::range(
            Point::new([0, 0], 0),
            Point::new([1, 0], 3),
        ))
        .unwrap();

        let patch = doc.apply(&Cmd::ToggleCodeBlock).unwrap();

        assert_eq!(block_kind(&doc, &[0]), Some(ElementKind::CodeBlock));
        assert_eq!(block_kind(&doc, &[1]), Some(ElementKind::CodeBlock));
        assert_eq!(patch.changed, vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_toggle_code_block_inside_quote_flips_inner_paragraph() {
        let mut doc = Document::from_blocks(vec![Node::element(
            ElementKind::BlockQuote,
            vec![Node::Element(Element::paragraph("quoted"))],
        )])
        .unwrap();

        doc.apply(&Cmd::ToggleCodeBlock).unwrap();

        // The container keeps its kind; the leaf block inside it flips
        assert_eq!(block_kind(&doc, &[0]), Some(ElementKind::BlockQuote));
        assert_eq!(block_kind(&doc, &[0, 0]), Some(ElementKind::CodeBlock));

        doc.apply(&Cmd::ToggleCodeBlock).unwrap();
        assert_eq!(block_kind(&doc, &[0, 0]), Some(ElementKind::Paragraph));
    }

    // ============ ToggleBold tests ============

    #[test]
    fn test_toggle_bold_splits_partially_covered_run() {
        let mut doc = Document::from_blocks(vec![Node::Element(Element::paragraph("hello"))]).unwrap();
        doc.set_selection(Selection::range(
            Point::new([0, 0], 1),
            Point::new([0, 0], 3),
        ))
        .unwrap();

        let patch = doc.apply(&Cmd::ToggleBold).unwrap();

        let bold: Vec<bool> = (0..3)
            .map(|i| {
                doc.node_at(&[0, i])
                    .and_then(Node::as_text)
                    .is_some_and(|run| run.has_mark(Mark::Bold))
            })
            .collect();
        assert_eq!(bold, vec![false, true, false]);
        assert_eq!(doc.text(), "hello");
        assert_eq!(patch.new_selection.start(), &Point::new([0, 1], 0));
        assert_eq!(patch.new_selection.end(), &Point::new([0, 1], 2));
    }

    #[test]
    fn test_toggle_bold_rejects_collapsed_selection() {
        let mut doc = Document::new();
        let before = doc.clone();

        let result = doc.apply(&Cmd::ToggleBold);

        assert!(matches!(result, Err(EditError::InvalidIntent(_))));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_toggle_bold_always_sets_never_clears() {
        let mut doc = Document::from_blocks(vec![Node::element(
            ElementKind::Paragraph,
            vec![Node::Text(crate::editing::node::TextRun::with_marks(
                "already",
                [Mark::Bold],
            ))],
        )])
        .unwrap();
        doc.set_selection(Selection::range(
            Point::new([0, 0], 0),
            Point::new([0, 0], 7),
        ))
        .unwrap();

        doc.apply(&Cmd::ToggleBold).unwrap();

        // The observed behavior is kept: bold stays on, never flips off
        assert!(
            doc.node_at(&[0, 0])
                .and_then(Node::as_text)
                .is_some_and(|run| run.has_mark(Mark::Bold))
        );
    }

    // ============ Cross-cutting contract tests ============

    #[test]
    fn test_selection_resolves_after_every_intent() {
        let mut doc = Document::new();
        let intents = [
            Cmd::InsertLiteral { text: "and".to_string() },
            Cmd::ToggleCodeBlock,
            Cmd::ToggleCodeBlock,
            Cmd::InsertLiteral { text: " more".to_string() },
        ];

        for cmd in &intents {
            let patch = doc.apply(cmd).unwrap();
            doc.validate_selection(&patch.new_selection).unwrap();
            assert_eq!(doc.selection(), &patch.new_selection);
        }
    }

    #[test]
    fn test_version_increments_per_intent() {
        let mut doc = Document::new();

        doc.apply(&Cmd::ToggleCodeBlock).unwrap();
        doc.apply(&Cmd::InsertLiteral { text: "x".to_string() }).unwrap();

        assert_eq!(doc.version(), 2);
    }
}
