use std::sync::Arc;

use sha2::{Digest as _, Sha256};

use crate::tree::{NodeId, Position, SourceTree};

/// How far (in lines) past the base endpoint the greatest end location may
/// sit and still be trusted. Prevents one large ancestor at the tail of a
/// window from pulling in trailing source it does not really share.
const END_LINE_TOLERANCE: u32 = 2;

/// One reported occurrence of a match: a file and the source range the
/// instance spans, plus its source lines once populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchInstance {
    pub path: Arc<str>,
    pub start: Position,
    pub end: Position,
    pub lines: Option<String>,
}

/// The result of one accepted group: a stable identity hash and one
/// source-range entry per instance. The hash is derived from every
/// instance's node names and kinds in order, so it survives re-runs on
/// unchanged input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub hash: String,
    pub instances: Vec<MatchInstance>,
}

impl Match {
    pub(crate) fn build(groups: &[(&SourceTree, &[NodeId])]) -> Self {
        let mut hasher = Sha256::new();
        let mut first = true;
        for (tree, nodes) in groups {
            for &node in *nodes {
                if !first {
                    hasher.update(b":");
                }
                first = false;
                match tree.identifier(node) {
                    Some(name) => hasher.update(name.as_bytes()),
                    None => hasher.update(tree.kind(node).as_bytes()),
                }
            }
        }
        let hash = hex::encode(hasher.finalize());

        let instances = groups
            .iter()
            .map(|(tree, nodes)| instance_range(tree, nodes))
            .collect();

        Match { hash, instances }
    }

    /// Fills each instance's `lines` from the given per-file source lines.
    /// Split out from construction so callers that only need locations
    /// skip the cost.
    pub fn populate_lines<'a, F>(&mut self, lines_for: F)
    where
        F: Fn(&str) -> Option<&'a [String]>,
    {
        for instance in &mut self.instances {
            let Some(lines) = lines_for(&instance.path) else {
                continue;
            };
            instance.lines = Some(slice_lines(lines, instance.start, instance.end));
        }
    }
}

/// Start is the smallest start location among the nodes. The end is
/// approximated: the end of the node with the greatest start location is
/// the base; a childless final node ending on a later line overrides it;
/// the overall greatest end location is preferred only when it stays
/// within [`END_LINE_TOLERANCE`] lines of the base.
fn instance_range(tree: &SourceTree, nodes: &[NodeId]) -> MatchInstance {
    let start = nodes
        .iter()
        .map(|&n| tree.span(n).start)
        .min()
        .unwrap_or_default();

    let mut base = nodes
        .iter()
        .copied()
        .max_by_key(|&n| tree.span(n).start)
        .map(|n| tree.span(n).end)
        .unwrap_or_default();

    if let Some(&last) = nodes.last() {
        let last_end = tree.span(last).end;
        if tree.is_leaf(last) && last_end.line > base.line {
            base = last_end;
        }
    }

    let max_end = nodes
        .iter()
        .map(|&n| tree.span(n).end)
        .max()
        .unwrap_or(base);
    let end = if max_end.line <= base.line.saturating_add(END_LINE_TOLERANCE) {
        max_end
    } else {
        base
    };

    MatchInstance {
        path: tree.path().clone(),
        start,
        end,
        lines: None,
    }
}

fn slice_lines(lines: &[String], start: Position, end: Position) -> String {
    let from = (start.line.max(1) - 1) as usize;
    let to = (end.line as usize).min(lines.len());
    if from >= to {
        return String::new();
    }
    let slice = &lines[from..to];

    // Indentation is counted in chars, not bytes: multi-byte whitespace
    // (e.g. U+00A0) is legal in JavaScript and must not split mid-char.
    let indent = slice
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    slice
        .iter()
        .map(|line| {
            line.char_indices()
                .nth(indent)
                .map_or("", |(byte, _)| &line[byte..])
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Span;

    fn pos(line: u32, column: u32) -> Position {
        Position::new(line, column)
    }

    fn node_at(tree: &mut SourceTree, parent: Option<NodeId>, kind: &str, span: Span) -> NodeId {
        tree.push(parent, kind, span)
    }

    #[test]
    fn hash_concatenates_names_and_kinds_in_order() {
        let mut tree = SourceTree::new("a.js");
        let block = node_at(
            &mut tree,
            None,
            "statement_block",
            Span::new(pos(1, 0), pos(2, 3)),
        );
        let lit = tree.push_literal(
            Some(block),
            "number",
            Span::new(pos(3, 0), pos(3, 3)),
            crate::types::LiteralKind::Number,
            "1",
        );

        let one = Match::build(&[(&tree, &[block, lit][..])]);
        let two = Match::build(&[(&tree, &[block, lit][..])]);
        let reversed = Match::build(&[(&tree, &[lit, block][..])]);
        assert_eq!(one.hash, two.hash);
        assert_ne!(one.hash, reversed.hash);
        assert_eq!(one.hash.len(), 64);
    }

    #[test]
    fn hash_prefers_identifier_names_over_kinds() {
        let mut named_x = SourceTree::new("x.js");
        let x = named_x.push_identifier(None, "identifier", Span::new(pos(1, 0), pos(1, 1)), "x");
        let mut named_y = SourceTree::new("y.js");
        let y = named_y.push_identifier(None, "identifier", Span::new(pos(1, 0), pos(1, 1)), "y");

        let with_x = Match::build(&[(&named_x, &[x][..])]);
        let with_y = Match::build(&[(&named_y, &[y][..])]);
        assert_ne!(with_x.hash, with_y.hash);
    }

    #[test]
    fn uses_the_minimum_start_among_nodes() {
        let mut tree = SourceTree::new("a.js");
        let ids: Vec<NodeId> = [
            Span::new(pos(2, 0), pos(2, 0)),
            Span::new(pos(1, 2), pos(1, 2)),
            Span::new(pos(1, 0), pos(1, 0)),
            Span::new(pos(3, 0), pos(3, 0)),
        ]
        .into_iter()
        .map(|span| tree.push(None, "a", span))
        .collect();

        let m = Match::build(&[(&tree, &ids[..])]);
        assert_eq!(m.instances[0].start, pos(1, 0));
    }

    #[test]
    fn end_uses_max_end_when_close_to_base() {
        // Base node (greatest start) ends on line 5; the maximum end is on
        // line 6, within tolerance, so line 6 wins.
        let mut tree = SourceTree::new("a.js");
        let wide = tree.push(None, "a", Span::new(pos(1, 0), pos(6, 1)));
        let base = tree.push(Some(wide), "b", Span::new(pos(4, 0), pos(5, 1)));

        let m = Match::build(&[(&tree, &[wide, base][..])]);
        assert_eq!(m.instances[0].end, pos(6, 1));
    }

    #[test]
    fn end_falls_back_to_base_when_max_end_is_far() {
        // A large ancestor at the tail would drag the end to line 40;
        // outside tolerance the base endpoint is kept.
        let mut tree = SourceTree::new("a.js");
        let huge = tree.push(None, "a", Span::new(pos(1, 0), pos(40, 1)));
        let base = tree.push(Some(huge), "b", Span::new(pos(4, 0), pos(5, 1)));

        let m = Match::build(&[(&tree, &[huge, base][..])]);
        assert_eq!(m.instances[0].end, pos(5, 1));
    }

    #[test]
    fn childless_tail_on_a_later_line_moves_the_base() {
        // The tail leaf starts before the base node but ends well past it;
        // without the leaf override the far end would be discarded.
        let mut tree = SourceTree::new("a.js");
        let a = tree.push(None, "a", Span::new(pos(1, 0), pos(2, 1)));
        let b = tree.push(Some(a), "b", Span::new(pos(3, 0), pos(3, 1)));
        let tail = tree.push(Some(a), "c", Span::new(pos(2, 5), pos(7, 1)));

        let m = Match::build(&[(&tree, &[a, b, tail][..])]);
        assert_eq!(m.instances[0].end, pos(7, 1));
    }

    #[test]
    fn populate_lines_slices_and_dedents() {
        let mut tree = SourceTree::new("a.js");
        let node = tree.push(None, "a", Span::new(pos(2, 0), pos(3, 5)));
        let mut m = Match::build(&[(&tree, &[node][..])]);

        let lines: Vec<String> = ["skip me", "  if (x) {", "  }"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        m.populate_lines(|path| (path == "a.js").then_some(&lines[..]));
        assert_eq!(m.instances[0].lines.as_deref(), Some("if (x) {\n}"));
    }

    #[test]
    fn populate_lines_dedents_multibyte_whitespace_safely() {
        // One line indented with U+00A0 pairs, another with a single
        // space: the common indent is one char, never a partial byte.
        let mut tree = SourceTree::new("a.js");
        let node = tree.push(None, "a", Span::new(pos(1, 0), pos(2, 5)));
        let mut m = Match::build(&[(&tree, &[node][..])]);

        let lines: Vec<String> = [" f();", "\u{a0}\u{a0}g();"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        m.populate_lines(|path| (path == "a.js").then_some(&lines[..]));
        assert_eq!(
            m.instances[0].lines.as_deref(),
            Some("f();\n\u{a0}g();")
        );
    }

    #[test]
    fn populate_lines_leaves_unknown_files_untouched() {
        let mut tree = SourceTree::new("a.js");
        let node = tree.push(None, "a", Span::new(pos(1, 0), pos(1, 1)));
        let mut m = Match::build(&[(&tree, &[node][..])]);
        m.populate_lines(|_| None);
        assert_eq!(m.instances[0].lines, None);
    }
}
