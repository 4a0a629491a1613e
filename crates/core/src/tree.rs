use std::collections::VecDeque;
use std::sync::Arc;

use crate::types::LiteralKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

pub type NodeId = u32;

#[derive(Debug)]
struct NodeData {
    kind: Box<str>,
    span: Span,
    children: Vec<NodeId>,
    identifier: Option<Box<str>>,
    literal: Option<(LiteralKind, Box<str>)>,
}

/// One parsed file's syntax tree, stored as an index-addressed arena.
/// Node 0, when present, is the root. The accessor methods are total:
/// any node has a (possibly empty) child list and a span.
#[derive(Debug)]
pub struct SourceTree {
    path: Arc<str>,
    nodes: Vec<NodeData>,
}

impl SourceTree {
    pub fn new(path: impl Into<Arc<str>>) -> Self {
        Self {
            path: path.into(),
            nodes: Vec::new(),
        }
    }

    pub fn path(&self) -> &Arc<str> {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() { None } else { Some(0) }
    }

    pub fn push(&mut self, parent: Option<NodeId>, kind: &str, span: Span) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(NodeData {
            kind: kind.into(),
            span,
            children: Vec::new(),
            identifier: None,
            literal: None,
        });
        if let Some(parent) = parent {
            self.nodes[parent as usize].children.push(id);
        }
        id
    }

    pub fn push_identifier(
        &mut self,
        parent: Option<NodeId>,
        kind: &str,
        span: Span,
        name: &str,
    ) -> NodeId {
        let id = self.push(parent, kind, span);
        self.nodes[id as usize].identifier = Some(name.into());
        id
    }

    pub fn push_literal(
        &mut self,
        parent: Option<NodeId>,
        kind: &str,
        span: Span,
        literal: LiteralKind,
        value: &str,
    ) -> NodeId {
        let id = self.push(parent, kind, span);
        self.nodes[id as usize].literal = Some((literal, value.into()));
        id
    }

    pub fn kind(&self, node: NodeId) -> &str {
        &self.nodes[node as usize].kind
    }

    pub fn span(&self, node: NodeId) -> Span {
        self.nodes[node as usize].span
    }

    pub fn identifier(&self, node: NodeId) -> Option<&str> {
        self.nodes[node as usize].identifier.as_deref()
    }

    pub fn literal(&self, node: NodeId) -> Option<LiteralKind> {
        self.nodes[node as usize].literal.as_ref().map(|(k, _)| *k)
    }

    pub fn literal_value(&self, node: NodeId) -> Option<&str> {
        self.nodes[node as usize]
            .literal
            .as_ref()
            .map(|(_, v)| v.as_ref())
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node as usize].children
    }

    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.children(node).is_empty()
    }

    /// Depth-first pre-order traversal of the subtree rooted at `node`,
    /// truncated at `limit` nodes when given. The first element is always
    /// `node` itself, and repeated calls yield the identical ordering.
    pub fn pre_order(&self, node: NodeId, limit: Option<usize>) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if limit.is_some_and(|n| out.len() >= n) {
                break;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Breadth-first traversal of the subtree rooted at `node`, truncated
    /// at `limit` nodes when given.
    pub fn breadth_first(&self, node: NodeId, limit: Option<usize>) -> Vec<NodeId> {
        let mut out = vec![node];
        let mut queue = VecDeque::from([node]);
        while let Some(current) = queue.pop_front() {
            if limit.is_some_and(|n| out.len() >= n) {
                break;
            }
            for &child in self.children(current) {
                queue.push_back(child);
                out.push(child);
            }
        }
        out.truncate(limit.unwrap_or(out.len()));
        out
    }

    /// Visits every node except the root in pre-order, passing the chain of
    /// ancestors below the root (nearest ancestor last).
    pub fn walk_subtrees<F: FnMut(NodeId, &[NodeId])>(&self, mut f: F) {
        let Some(root) = self.root() else {
            return;
        };
        let mut stack: Vec<(NodeId, usize)> = self
            .children(root)
            .iter()
            .rev()
            .map(|&child| (child, 0))
            .collect();
        let mut ancestors: Vec<NodeId> = Vec::new();
        while let Some((node, depth)) = stack.pop() {
            ancestors.truncate(depth);
            f(node, &ancestors);
            ancestors.push(node);
            for &child in self.children(node).iter().rev() {
                stack.push((child, depth + 1));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(line: u32) -> Span {
        Span::new(Position::new(line, 0), Position::new(line, 1))
    }

    //      root
    //     /    \
    //    a      b
    //   / \      \
    //  c   d      e
    fn sample_tree() -> (SourceTree, Vec<NodeId>) {
        let mut tree = SourceTree::new("sample.js");
        let root = tree.push(None, "program", span(1));
        let a = tree.push(Some(root), "a", span(1));
        let c = tree.push(Some(a), "c", span(1));
        let d = tree.push(Some(a), "d", span(2));
        let b = tree.push(Some(root), "b", span(3));
        let e = tree.push(Some(b), "e", span(3));
        (tree, vec![root, a, c, d, b, e])
    }

    #[test]
    fn pre_order_visits_node_before_descendants() {
        let (tree, ids) = sample_tree();
        let [root, a, c, d, b, e] = ids[..] else {
            unreachable!()
        };
        assert_eq!(tree.pre_order(root, None), vec![root, a, c, d, b, e]);
        assert_eq!(tree.pre_order(a, None), vec![a, c, d]);
    }

    #[test]
    fn pre_order_truncates_at_limit() {
        let (tree, ids) = sample_tree();
        let root = ids[0];
        assert_eq!(tree.pre_order(root, Some(3)).len(), 3);
        assert_eq!(tree.pre_order(root, Some(100)).len(), 6);
    }

    #[test]
    fn pre_order_is_restartable_and_stable() {
        let (tree, ids) = sample_tree();
        let root = ids[0];
        assert_eq!(tree.pre_order(root, None), tree.pre_order(root, None));
    }

    #[test]
    fn breadth_first_visits_levels_in_order() {
        let (tree, ids) = sample_tree();
        let [root, a, c, d, b, e] = ids[..] else {
            unreachable!()
        };
        assert_eq!(tree.breadth_first(root, None), vec![root, a, b, c, d, e]);
        assert_eq!(tree.breadth_first(root, Some(4)), vec![root, a, b, c]);
    }

    #[test]
    fn walk_subtrees_skips_root_and_reports_ancestors() {
        let (tree, ids) = sample_tree();
        let [root, a, c, d, b, e] = ids[..] else {
            unreachable!()
        };
        let mut visited = Vec::new();
        tree.walk_subtrees(|node, ancestors| {
            visited.push((node, ancestors.to_vec()));
        });
        assert_eq!(
            visited,
            vec![
                (a, vec![]),
                (c, vec![a]),
                (d, vec![a]),
                (b, vec![]),
                (e, vec![b]),
            ]
        );
        assert!(!visited.iter().any(|(node, _)| *node == root));
    }

    #[test]
    fn empty_tree_has_no_root() {
        let tree = SourceTree::new("empty.js");
        assert_eq!(tree.root(), None);
        tree.walk_subtrees(|_, _| panic!("nothing to visit"));
    }
}
