use tracing::debug;
use tree_sitter::{Language, Node, Parser};

use crate::tree::{Position, SourceTree, Span};
use crate::types::LiteralKind;

#[derive(Debug)]
pub struct ParsedFile {
    pub tree: SourceTree,
    pub lines: Vec<String>,
}

/// A recoverable, per-file parse failure. Callers record it as a
/// diagnostic and continue with the remaining files.
#[derive(Debug)]
pub struct ParseFailure {
    pub message: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

/// Verifies the grammar can be loaded into a parser at all. Called once
/// up front so a broken grammar surfaces as a fatal error instead of one
/// diagnostic per file.
pub(crate) fn check_grammar() -> Result<(), tree_sitter::LanguageError> {
    let language: Language = tree_sitter_javascript::LANGUAGE.into();
    Parser::new().set_language(&language)
}

/// Parses JavaScript source into an owned [`SourceTree`] of named nodes.
/// tree-sitter reports syntax errors in-band as error nodes; a tree
/// containing any is rejected here, locating the first offender.
pub fn parse_source(path: &str, source: &str) -> Result<ParsedFile, ParseFailure> {
    debug!(path, "parsing");

    let language: Language = tree_sitter_javascript::LANGUAGE.into();
    let mut parser = Parser::new();
    parser.set_language(&language).map_err(|err| ParseFailure {
        message: err.to_string(),
        line: None,
        column: None,
    })?;

    let parsed = parser.parse(source, None).ok_or_else(|| ParseFailure {
        message: "parser produced no tree".to_string(),
        line: None,
        column: None,
    })?;

    let root = parsed.root_node();
    if root.has_error() {
        return Err(syntax_failure(root));
    }

    let mut tree = SourceTree::new(path);
    convert(&mut tree, root, source);

    let lines = source.lines().map(str::to_string).collect();
    Ok(ParsedFile { tree, lines })
}

fn syntax_failure(root: Node<'_>) -> ParseFailure {
    let (line, column) = first_error_position(root)
        .map(|p| (Some(p.line), Some(p.column)))
        .unwrap_or((None, None));
    ParseFailure {
        message: "syntax error".to_string(),
        line,
        column,
    }
}

fn first_error_position(root: Node<'_>) -> Option<Position> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let start = node.start_position();
            return Some(Position::new(start.row as u32 + 1, start.column as u32));
        }
        if !node.has_error() {
            continue;
        }
        for i in (0..node.child_count() as u32).rev() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }
    None
}

fn convert(tree: &mut SourceTree, root: Node<'_>, source: &str) {
    let root_id = append_node(tree, None, root, source);
    let mut stack = vec![(root, root_id)];
    while let Some((node, parent_id)) = stack.pop() {
        let count = node.named_child_count();
        let mut appended = Vec::with_capacity(count);
        for i in 0..count as u32 {
            let Some(child) = node.named_child(i) else {
                continue;
            };
            let child_id = append_node(tree, Some(parent_id), child, source);
            appended.push((child, child_id));
        }
        stack.extend(appended.into_iter().rev());
    }
}

fn append_node(
    tree: &mut SourceTree,
    parent: Option<crate::tree::NodeId>,
    node: Node<'_>,
    source: &str,
) -> crate::tree::NodeId {
    let kind = node.kind();
    let span = node_span(node);
    if kind.ends_with("identifier") {
        let name = node.utf8_text(source.as_bytes()).unwrap_or_default();
        return tree.push_identifier(parent, kind, span, name);
    }
    if let Some(literal) = literal_kind(kind) {
        let value = node.utf8_text(source.as_bytes()).unwrap_or_default();
        return tree.push_literal(parent, kind, span, literal, value);
    }
    tree.push(parent, kind, span)
}

fn literal_kind(kind: &str) -> Option<LiteralKind> {
    match kind {
        "string" | "template_string" => Some(LiteralKind::String),
        "number" => Some(LiteralKind::Number),
        "true" | "false" => Some(LiteralKind::Boolean),
        _ => None,
    }
}

fn node_span(node: Node<'_>) -> Span {
    let start = node.start_position();
    let end = node.end_position();
    Span::new(
        Position::new(start.row as u32 + 1, start.column as u32),
        Position::new(end.row as u32 + 1, end.column as u32),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_function_into_named_nodes() {
        let source = "function add(a, b) {\n  return a + b;\n}\n";
        let parsed = parse_source("add.js", source).expect("valid source");
        let tree = &parsed.tree;

        let root = tree.root().expect("non-empty tree");
        assert_eq!(tree.kind(root), "program");
        assert_eq!(parsed.lines.len(), 3);

        let order = tree.pre_order(root, None);
        assert!(order.iter().any(|&n| tree.kind(n) == "function_declaration"));
        assert!(
            order
                .iter()
                .any(|&n| tree.identifier(n) == Some("add") && tree.kind(n) == "identifier")
        );
    }

    #[test]
    fn records_literal_kinds_and_values() {
        let source = "var x = 1;\nvar y = 'hey';\nvar z = true;\n";
        let parsed = parse_source("lits.js", source).expect("valid source");
        let tree = &parsed.tree;
        let root = tree.root().expect("non-empty tree");

        let literals: Vec<_> = tree
            .pre_order(root, None)
            .into_iter()
            .filter_map(|n| tree.literal(n).map(|k| (k, tree.literal_value(n).unwrap().to_string())))
            .collect();
        assert_eq!(
            literals,
            vec![
                (LiteralKind::Number, "1".to_string()),
                (LiteralKind::String, "'hey'".to_string()),
                (LiteralKind::Boolean, "true".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_broken_source_with_a_position() {
        let failure = parse_source("broken.js", "function (((\n").expect_err("syntax error");
        assert_eq!(failure.message, "syntax error");
        assert!(failure.line.is_some());
    }

    #[test]
    fn preserves_sibling_order_across_many_statements() {
        let source = "var a = 1;\nvar b = 2;\nvar c = 3;\nvar d = 4;\n";
        let parsed = parse_source("order.js", source).expect("valid source");
        let tree = &parsed.tree;
        let root = tree.root().expect("non-empty tree");
        let lines: Vec<u32> = tree
            .children(root)
            .iter()
            .map(|&n| tree.span(n).start.line)
            .collect();
        assert_eq!(lines, vec![1, 2, 3, 4]);
    }

    #[test]
    fn spans_are_one_based_lines() {
        let source = "var a = 1;\nvar b = 2;\n";
        let parsed = parse_source("spans.js", source).expect("valid source");
        let tree = &parsed.tree;
        let root = tree.root().expect("non-empty tree");
        assert_eq!(tree.span(root).start.line, 1);
        let last = *tree.children(root).last().expect("two statements");
        assert_eq!(tree.span(last).start.line, 2);
    }
}
