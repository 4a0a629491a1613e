use crate::tree::{NodeId, SourceTree};

/// How many trailing ancestors (plus the node itself) the walker hands to
/// the classifier. Empirically tuned in the tools this lineage comes from;
/// tunable, not load-bearing.
pub(crate) const ANCESTOR_WINDOW: usize = 4;

/// Returns whether the window of nodes (some ancestors followed by the
/// visited node) sits inside a recognized module-loading or class
/// scaffolding idiom. Best effort: a false negative only admits an extra
/// low-value candidate.
pub(crate) fn is_boilerplate(tree: &SourceTree, window: &[NodeId]) -> bool {
    is_module_import(tree, window)
        || is_class_scaffolding(tree, window)
        || is_commonjs_require(tree, window)
        || is_amd_call(tree, window)
}

/// ES module import/export declarations heading the window.
fn is_module_import(tree: &SourceTree, window: &[NodeId]) -> bool {
    window
        .first()
        .is_some_and(|&n| matches!(tree.kind(n), "import_statement" | "export_statement"))
}

/// Class declaration scaffolding: the visited node itself is the
/// declaration or its body.
fn is_class_scaffolding(tree: &SourceTree, window: &[NodeId]) -> bool {
    window
        .last()
        .is_some_and(|&n| matches!(tree.kind(n), "class_declaration" | "class_body"))
}

/// CommonJS: the window starts at `require(...)` as a statement, or at a
/// variable declaration whose initializer is a `require(...)` call.
fn is_commonjs_require(tree: &SourceTree, window: &[NodeId]) -> bool {
    let Some(&head) = window.first() else {
        return false;
    };
    match tree.kind(head) {
        "expression_statement" => tree
            .children(head)
            .first()
            .is_some_and(|&expr| is_named_call(tree, expr, |name| name == "require")),
        "variable_declaration" | "lexical_declaration" => {
            tree.children(head).iter().any(|&declarator| {
                tree.kind(declarator) == "variable_declarator"
                    && tree
                        .children(declarator)
                        .iter()
                        .any(|&init| is_named_call(tree, init, |name| name == "require"))
            })
        }
        _ => false,
    }
}

/// AMD: some trailing statement in the window is a `define(...)` or
/// `require(...)` call, possibly behind a namespaced property access.
fn is_amd_call(tree: &SourceTree, window: &[NodeId]) -> bool {
    window.iter().rev().any(|&node| {
        tree.kind(node) == "expression_statement"
            && tree
                .children(node)
                .first()
                .is_some_and(|&expr| is_named_call(tree, expr, is_amd_name))
    })
}

fn is_amd_name(name: &str) -> bool {
    name == "define" || name == "require"
}

/// Whether `node` is a call expression whose callee name (directly, or the
/// property of a member expression) satisfies the predicate.
fn is_named_call(tree: &SourceTree, node: NodeId, accepts: impl Fn(&str) -> bool) -> bool {
    if tree.kind(node) != "call_expression" {
        return false;
    }
    let Some(&callee) = tree.children(node).first() else {
        return false;
    };
    if let Some(name) = tree.identifier(callee) {
        return accepts(name);
    }
    if tree.kind(callee) == "member_expression" {
        return tree
            .children(callee)
            .last()
            .and_then(|&property| tree.identifier(property))
            .is_some_and(accepts);
    }
    false
}
