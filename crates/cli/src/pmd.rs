use treedup_core::Match;

/// PMD-CPD compatible XML, consumable by tools that already ingest CPD
/// reports. One `<duplication>` per match, one `<file>` per instance, and
/// the first instance's source as the code fragment.
pub(crate) fn format_pmd(matches: &[Match]) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str("<pmd-cpd>\n");
    for m in matches {
        let lines = m
            .instances
            .first()
            .map(|i| i.end.line.saturating_sub(i.start.line) + 1)
            .unwrap_or(0);
        out.push_str(&format!("  <duplication lines=\"{lines}\">\n"));
        for instance in &m.instances {
            out.push_str(&format!(
                "    <file path=\"{}\" line=\"{}\" endline=\"{}\"/>\n",
                escape_attr(&instance.path),
                instance.start.line,
                instance.end.line
            ));
        }
        if let Some(fragment) = m.instances.first().and_then(|i| i.lines.as_deref()) {
            out.push_str("    <codefragment><![CDATA[\n");
            out.push_str(&escape_cdata(fragment));
            out.push_str("\n]]></codefragment>\n");
        }
        out.push_str("  </duplication>\n");
    }
    out.push_str("</pmd-cpd>\n");
    out
}

fn escape_attr(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}

// A literal "]]>" inside a CDATA section would end it early.
fn escape_cdata(raw: &str) -> String {
    raw.replace("]]>", "]]]]><![CDATA[>")
}
