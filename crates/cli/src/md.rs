use treedup_core::Match;

use crate::text::instance_lines;

pub(crate) fn format_md(matches: &[Match], truncate: Option<usize>) -> String {
    let mut out = String::new();
    out.push_str("# Duplicate code\n");
    for m in matches {
        out.push_str(&format!("\n## Match - {} instances\n", m.instances.len()));
        for instance in &m.instances {
            out.push_str(&format!(
                "\n`{}:{},{}`\n",
                instance.path, instance.start.line, instance.end.line
            ));
            if let Some(lines) = instance_lines(instance, truncate) {
                out.push_str("\n```js\n");
                out.push_str(&lines);
                out.push_str("\n```\n");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use treedup_core::{MatchInstance, Position};

    #[test]
    fn renders_fenced_code_blocks_per_instance() {
        let matches = vec![Match {
            hash: "feed".to_string(),
            instances: vec![MatchInstance {
                path: "a.js".into(),
                start: Position::new(1, 0),
                end: Position::new(3, 1),
                lines: Some("function f() {\n  g();\n}".to_string()),
            }],
        }];
        let out = format_md(&matches, None);
        assert!(out.starts_with("# Duplicate code\n"));
        assert!(out.contains("## Match - 1 instances"));
        assert!(out.contains("`a.js:1,3`"));
        assert!(out.contains("```js\nfunction f() {\n  g();\n}\n```"));
    }

    #[test]
    fn truncate_applies_inside_the_fence() {
        let matches = vec![Match {
            hash: "feed".to_string(),
            instances: vec![MatchInstance {
                path: "a.js".into(),
                start: Position::new(1, 0),
                end: Position::new(3, 1),
                lines: Some("function f() {\n  g();\n}".to_string()),
            }],
        }];
        let out = format_md(&matches, Some(1));
        assert!(out.contains("```js\nfunction f() {\n```"));
    }
}
