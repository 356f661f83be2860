use serde::{Deserialize, Serialize};

use crate::editing::EditError;
use crate::editing::node::{Element, ElementKind, Mark, Node, TextRun};
use crate::editing::point::{Path, Point, Selection};

/// Fixed placeholder content of the default document
pub const DEFAULT_PLACEHOLDER: &str = "A line of text in a paragraph.";

/// How [`Document::set_text_mark`] treats runs only partially covered by
/// the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartialCoverage {
    /// Split partially covered runs so the mark change applies to the
    /// covered segment only
    Split,
    /// Leave partially covered runs untouched
    Ignore,
}

/// The document tree plus its current selection and version counter.
///
/// Top-level nodes are always elements and leaves are always text runs.
/// Commands go through [`Document::apply`], which keeps the selection and
/// version in step with the tree; the structural queries and primitive
/// mutations below are what the commands compile down to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub(crate) blocks: Vec<Node>,
    pub(crate) selection: Selection,
    pub(crate) version: u64,
}

impl Document {
    /// Create the default document: one paragraph holding one placeholder
    /// run, with the cursor collapsed at its start
    pub fn new() -> Self {
        Self {
            blocks: vec![Node::element(
                ElementKind::Paragraph,
                vec![Node::text(DEFAULT_PLACEHOLDER)],
            )],
            selection: Selection::collapsed(Point::new([0, 0], 0)),
            version: 0,
        }
    }

    /// Create a document from existing top-level blocks, placing the cursor
    /// at the start of the first text run
    pub fn from_blocks(blocks: Vec<Node>) -> Result<Self, EditError> {
        let mut doc = Self {
            blocks,
            selection: Selection::collapsed(Point::new([0, 0], 0)),
            version: 0,
        };
        doc.check_structure()?;
        let first = doc.first_point().ok_or_else(|| {
            EditError::InvalidSelection("document has no text runs".to_string())
        })?;
        doc.selection = Selection::collapsed(first);
        Ok(doc)
    }

    /// Get the top-level blocks
    pub fn blocks(&self) -> &[Node] {
        &self.blocks
    }

    /// Get the current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Get the current version
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Plain text of the document: run contents in document order, sibling
    /// elements separated by newlines
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            push_node_text(block, &mut out);
        }
        out
    }

    /// Resolve a path to a node, if it exists
    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.blocks.get(*first)?;
        for idx in rest {
            node = node.as_element()?.children.get(*idx)?;
        }
        Some(node)
    }

    fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.blocks.get_mut(*first)?;
        for idx in rest {
            match node {
                Node::Element(el) => node = el.children.get_mut(*idx)?,
                Node::Text(_) => return None,
            }
        }
        Some(node)
    }

    fn run_at(&self, path: &[usize]) -> Result<&TextRun, EditError> {
        match self.node_at(path) {
            Some(Node::Text(run)) => Ok(run),
            _ => Err(EditError::InvalidSelection(format!(
                "no text run at path {path:?}"
            ))),
        }
    }

    fn run_at_mut(&mut self, path: &[usize]) -> Result<&mut TextRun, EditError> {
        match self.node_at_mut(path) {
            Some(Node::Text(run)) => Ok(run),
            _ => Err(EditError::InvalidSelection(format!(
                "no text run at path {path:?}"
            ))),
        }
    }

    /// Check that a point addresses an existing text run with an in-range
    /// character offset
    pub fn resolve_point(&self, point: &Point) -> Result<(), EditError> {
        let run = self.run_at(&point.path)?;
        if point.offset > run.char_len() {
            return Err(EditError::InvalidSelection(format!(
                "offset {} is past the end of a {}-character run",
                point.offset,
                run.char_len()
            )));
        }
        Ok(())
    }

    /// Check that both ends of a selection resolve
    pub fn validate_selection(&self, selection: &Selection) -> Result<(), EditError> {
        if self.blocks.is_empty() {
            return Err(EditError::InvalidSelection(
                "document has no blocks".to_string(),
            ));
        }
        self.resolve_point(&selection.anchor)?;
        self.resolve_point(&selection.focus)
    }

    /// Validated selection placement (the host's cursor or click path)
    pub fn set_selection(&mut self, selection: Selection) -> Result<(), EditError> {
        self.validate_selection(&selection)?;
        self.selection = selection;
        Ok(())
    }

    /// Walk upward from the text runs touched by the selection and return
    /// the path of the first ancestor element matching the predicate,
    /// closest ancestors first. `Ok(None)` when nothing matches.
    pub fn find_matching_ancestor(
        &self,
        selection: &Selection,
        predicate: impl Fn(&Element) -> bool,
    ) -> Result<Option<Path>, EditError> {
        self.validate_selection(selection)?;
        for run_path in self.touched_run_paths(selection) {
            for depth in (1..run_path.len()).rev() {
                let ancestor_path = run_path[..depth].to_vec();
                if let Some(Node::Element(el)) = self.node_at(&ancestor_path)
                    && predicate(el)
                {
                    return Ok(Some(ancestor_path));
                }
            }
        }
        Ok(None)
    }

    /// Set `kind` on every element matching the predicate, leaving children
    /// and attributes untouched. Returns the paths of the elements changed;
    /// matching zero elements is a valid no-op.
    pub fn set_element_kind(
        &mut self,
        predicate: impl Fn(&Element, &[usize]) -> bool,
        new_kind: ElementKind,
    ) -> Result<Vec<Path>, EditError> {
        if self.blocks.is_empty() {
            return Err(EditError::InvalidSelection(
                "document has no blocks".to_string(),
            ));
        }
        let mut matches = Vec::new();
        for (i, node) in self.blocks.iter().enumerate() {
            collect_matching_elements(node, &mut vec![i], &predicate, &mut matches);
        }
        for path in &matches {
            if let Some(Node::Element(el)) = self.node_at_mut(path) {
                el.kind = new_kind;
            }
        }
        Ok(matches)
    }

    /// Apply or clear a mark on every text run intersecting the selection.
    ///
    /// Fully covered runs are updated in place. A partially covered run is
    /// split into up to three consecutive runs (before / covered / after,
    /// empty segments omitted, marks inherited) when `partial` is
    /// [`PartialCoverage::Split`], with the mark change applied to the
    /// covered segment only; with [`PartialCoverage::Ignore`] it is left
    /// untouched. Returns the selection re-pointed at the covered segments,
    /// preserving anchor/focus orientation.
    ///
    /// ```
    /// use richdoc_engine::editing::{Document, Mark, PartialCoverage, Point, Selection};
    ///
    /// let mut doc = Document::new();
    /// let sel = Selection::range(Point::new([0, 0], 1), Point::new([0, 0], 3));
    /// doc.set_text_mark(&sel, Mark::Bold, true, PartialCoverage::Split).unwrap();
    /// assert_eq!(doc.text(), "A line of text in a paragraph.");
    /// ```
    pub fn set_text_mark(
        &mut self,
        selection: &Selection,
        mark: Mark,
        value: bool,
        partial: PartialCoverage,
    ) -> Result<Selection, EditError> {
        self.validate_selection(selection)?;

        let mut start = selection.start().clone();
        let mut end = selection.end().clone();
        let reversed = selection.is_reversed();

        // Reverse document order: splits grow a parent's child list, and
        // processing back-to-front keeps the still-unprocessed (earlier)
        // paths valid.
        for run_path in self.touched_run_paths(selection).into_iter().rev() {
            let run_len = self.run_at(&run_path)?.char_len();
            let cover_from = if run_path == start.path { start.offset } else { 0 };
            let cover_to = if run_path == end.path { end.offset } else { run_len };
            if cover_from >= cover_to {
                // zero-width intersection at a selection edge
                continue;
            }

            if cover_from == 0 && cover_to == run_len {
                let run = self.run_at_mut(&run_path)?;
                set_mark(run, mark, value);
                continue;
            }

            if partial == PartialCoverage::Ignore {
                continue;
            }

            let (mid_index, added) = self.split_run(&run_path, cover_from, cover_to, mark, value)?;

            if run_path == end.path {
                let mut path = run_path.clone();
                if let Some(last) = path.last_mut() {
                    *last = mid_index;
                }
                end = Point::new(path, cover_to - cover_from);
            } else {
                shift_after_split(&mut end.path, &run_path, added);
            }
            if run_path == start.path {
                let mut path = run_path.clone();
                if let Some(last) = path.last_mut() {
                    *last = mid_index;
                }
                start = Point::new(path, 0);
            }
        }

        let new_selection = if reversed {
            Selection::range(end, start)
        } else {
            Selection::range(start, end)
        };
        Ok(new_selection)
    }

    /// Insert text at the selection. A collapsed selection inserts at the
    /// cursor and advances it by the text's character count; a range
    /// selection first removes the covered content, then inserts at the
    /// collapse point. Returns the new collapsed selection.
    pub fn insert_text(
        &mut self,
        selection: &Selection,
        text: &str,
    ) -> Result<Selection, EditError> {
        self.validate_selection(selection)?;

        let at = if selection.is_collapsed() {
            selection.anchor.clone()
        } else {
            self.delete_covered(selection)?
        };

        let inserted = text.chars().count();
        let run = self.run_at_mut(&at.path)?;
        let byte_at = byte_of_char(&run.content, at.offset);
        run.content.insert_str(byte_at, text);

        Ok(Selection::collapsed(Point::new(at.path, at.offset + inserted)))
    }

    /// First insertion point of the document, in document order
    pub fn first_point(&self) -> Option<Point> {
        let path = self.run_paths().into_iter().next()?;
        Some(Point::new(path, 0))
    }

    /// Last insertion point of the document, in document order
    pub fn last_point(&self) -> Option<Point> {
        let path = self.run_paths().pop()?;
        let offset = self.run_at(&path).ok()?.char_len();
        Some(Point::new(path, offset))
    }

    /// One character step forward in document order, crossing run and block
    /// boundaries. `None` at the end of the document.
    pub fn point_forward(&self, point: &Point) -> Option<Point> {
        let run = self.node_at(&point.path)?.as_text()?;
        if point.offset < run.char_len() {
            return Some(Point::new(point.path.clone(), point.offset + 1));
        }
        let paths = self.run_paths();
        let idx = paths.iter().position(|p| *p == point.path)?;
        let next = paths.get(idx + 1)?;
        Some(Point::new(next.clone(), 0))
    }

    /// One character step backward in document order. `None` at the start
    /// of the document.
    pub fn point_backward(&self, point: &Point) -> Option<Point> {
        if point.offset > 0 {
            return Some(Point::new(point.path.clone(), point.offset - 1));
        }
        let paths = self.run_paths();
        let idx = paths.iter().position(|p| *p == point.path)?;
        let prev = paths.get(idx.checked_sub(1)?)?;
        let offset = self.run_at(prev).ok()?.char_len();
        Some(Point::new(prev.clone(), offset))
    }

    /// Paths of all text runs, in document order
    pub(crate) fn run_paths(&self) -> Vec<Path> {
        let mut paths = Vec::new();
        for (i, node) in self.blocks.iter().enumerate() {
            collect_run_paths(node, &mut vec![i], &mut paths);
        }
        paths
    }

    /// Paths of the text runs spanned by the selection, in document order.
    /// Runs at the selection edges are included even when the overlap is
    /// zero-width; coverage checks are up to the caller.
    pub(crate) fn touched_run_paths(&self, selection: &Selection) -> Vec<Path> {
        let start = selection.start();
        let end = selection.end();
        self.run_paths()
            .into_iter()
            .filter(|path| *path >= start.path && *path <= end.path)
            .collect()
    }

    /// Paths of the block-level elements containing the runs touched by the
    /// selection — the targets of a block kind change
    pub(crate) fn block_level_targets(
        &self,
        selection: &Selection,
    ) -> Result<Vec<Path>, EditError> {
        self.validate_selection(selection)?;
        let mut targets: Vec<Path> = Vec::new();
        for run_path in self.touched_run_paths(selection) {
            for depth in (1..run_path.len()).rev() {
                let ancestor = run_path[..depth].to_vec();
                if let Some(node) = self.node_at(&ancestor)
                    && node.is_block_level()
                {
                    if !targets.contains(&ancestor) {
                        targets.push(ancestor);
                    }
                    break;
                }
            }
        }
        Ok(targets)
    }

    /// Split the run at `path` so its `[from, to)` character range becomes a
    /// run of its own with the mark change applied. Returns the child index
    /// of the covered segment and how many extra siblings the split
    /// introduced.
    fn split_run(
        &mut self,
        path: &[usize],
        from: usize,
        to: usize,
        mark: Mark,
        value: bool,
    ) -> Result<(usize, usize), EditError> {
        let run = self.run_at(path)?.clone();
        let Some((&run_index, parent_path)) = path.split_last() else {
            return Err(EditError::InvalidSelection("empty path".to_string()));
        };
        if parent_path.is_empty() {
            return Err(EditError::InvalidSelection(
                "text runs cannot sit at the top level".to_string(),
            ));
        }
        let Some(Node::Element(parent)) = self.node_at_mut(parent_path) else {
            return Err(EditError::InvalidSelection(format!(
                "no parent element at path {parent_path:?}"
            )));
        };

        let pre = slice_chars(&run.content, 0, from);
        let mid = slice_chars(&run.content, from, to);
        let post = slice_chars(&run.content, to, run.char_len());

        let mut replacement = Vec::with_capacity(3);
        if !pre.is_empty() {
            replacement.push(Node::Text(TextRun {
                content: pre,
                marks: run.marks.clone(),
            }));
        }
        let mut mid_run = TextRun {
            content: mid,
            marks: run.marks.clone(),
        };
        set_mark(&mut mid_run, mark, value);
        replacement.push(Node::Text(mid_run));
        if !post.is_empty() {
            replacement.push(Node::Text(TextRun {
                content: post,
                marks: run.marks,
            }));
        }

        let mid_index = run_index + usize::from(from > 0);
        let added = replacement.len() - 1;
        parent.children.splice(run_index..run_index + 1, replacement);
        Ok((mid_index, added))
    }

    /// Remove the content covered by a range selection. Covered spans are
    /// drained from each intersecting run; zero-length runs stay in place so
    /// existing paths remain valid. Returns the collapse point at the range
    /// start.
    fn delete_covered(&mut self, selection: &Selection) -> Result<Point, EditError> {
        let start = selection.start().clone();
        let end = selection.end();

        for run_path in self.touched_run_paths(selection) {
            let run_len = self.run_at(&run_path)?.char_len();
            let from = if run_path == start.path { start.offset } else { 0 };
            let to = if run_path == end.path { end.offset } else { run_len };
            if from >= to {
                continue;
            }
            let run = self.run_at_mut(&run_path)?;
            let from_byte = byte_of_char(&run.content, from);
            let to_byte = byte_of_char(&run.content, to);
            run.content.replace_range(from_byte..to_byte, "");
        }

        Ok(start)
    }

    fn check_structure(&self) -> Result<(), EditError> {
        if self.blocks.is_empty() {
            return Err(EditError::InvalidSelection(
                "document has no blocks".to_string(),
            ));
        }
        for node in &self.blocks {
            match node {
                Node::Element(el) => check_element(el)?,
                Node::Text(_) => {
                    return Err(EditError::InvalidSelection(
                        "top-level nodes must be elements".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    // Forward declaration for the command layer; see editing::commands
    pub fn apply(
        &mut self,
        cmd: &crate::editing::Cmd,
    ) -> Result<crate::editing::Patch, EditError> {
        crate::editing::commands::apply_command(self, cmd)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn check_element(el: &Element) -> Result<(), EditError> {
    if el.children.is_empty() {
        return Err(EditError::InvalidSelection(format!(
            "{} element has no children",
            el.kind.as_str()
        )));
    }
    for child in &el.children {
        if let Node::Element(inner) = child {
            check_element(inner)?;
        }
    }
    Ok(())
}

fn collect_run_paths(node: &Node, prefix: &mut Vec<usize>, out: &mut Vec<Path>) {
    match node {
        Node::Text(_) => out.push(prefix.clone()),
        Node::Element(el) => {
            for (i, child) in el.children.iter().enumerate() {
                prefix.push(i);
                collect_run_paths(child, prefix, out);
                prefix.pop();
            }
        }
    }
}

fn collect_matching_elements(
    node: &Node,
    prefix: &mut Vec<usize>,
    predicate: &impl Fn(&Element, &[usize]) -> bool,
    out: &mut Vec<Path>,
) {
    if let Node::Element(el) = node {
        if predicate(el, prefix) {
            out.push(prefix.clone());
        }
        for (i, child) in el.children.iter().enumerate() {
            prefix.push(i);
            collect_matching_elements(child, prefix, predicate, out);
            prefix.pop();
        }
    }
}

fn push_node_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(run) => out.push_str(&run.content),
        Node::Element(el) => {
            for (i, child) in el.children.iter().enumerate() {
                if i > 0 && matches!(child, Node::Element(_)) {
                    out.push('\n');
                }
                push_node_text(child, out);
            }
        }
    }
}

fn set_mark(run: &mut TextRun, mark: Mark, value: bool) {
    if value {
        run.marks.insert(mark);
    } else {
        run.marks.remove(&mark);
    }
}

/// Shift a point's path when a sibling before it (under the same parent)
/// was split into several runs
fn shift_after_split(point_path: &mut Path, split_path: &[usize], added: usize) {
    let depth = split_path.len();
    if point_path.len() >= depth
        && point_path[..depth - 1] == split_path[..depth - 1]
        && point_path[depth - 1] > split_path[depth - 1]
    {
        point_path[depth - 1] += added;
    }
}

/// Substring by character indices
fn slice_chars(s: &str, from: usize, to: usize) -> String {
    s.chars().skip(from).take(to.saturating_sub(from)).collect()
}

/// Byte index of the character at `char_idx`, or the string's byte length
/// when past the end
fn byte_of_char(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}
