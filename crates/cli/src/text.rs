use treedup_core::{Diagnostic, InspectStats, Match, MatchInstance};

pub(crate) fn format_matches(matches: &[Match], truncate: Option<usize>) -> String {
    let mut out = String::new();
    for m in matches {
        out.push_str(&format!("\nMatch - {} instances\n", m.instances.len()));
        for instance in &m.instances {
            out.push_str(&format!(
                "\n{}:{},{}\n",
                instance.path, instance.start.line, instance.end.line
            ));
            if let Some(lines) = instance_lines(instance, truncate) {
                out.push_str(&lines);
                out.push('\n');
            }
        }
    }
    out
}

pub(crate) fn format_summary(matches: usize, files: u64) -> String {
    format!("\n{matches} matches found across {files} files\n")
}

pub(crate) fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();
    for d in diagnostics {
        match d.line {
            Some(line) => out.push_str(&format!("warning: {}:{line}: {}\n", d.path, d.message)),
            None => out.push_str(&format!("warning: {}: {}\n", d.path, d.message)),
        }
    }
    out
}

pub(crate) fn format_stats(stats: &InspectStats) -> String {
    let mut out = String::new();
    out.push_str("== run stats ==\n");
    out.push_str(&format!(
        "candidates={} parsed={} indexed={} matches={}\n",
        stats.candidate_files, stats.parsed_files, stats.indexed_instances, stats.matches_found
    ));

    let mut skips: Vec<(&str, u64)> = vec![
        ("parse_failures", stats.parse_failures),
        ("too_large", stats.skipped_too_large),
        ("binary", stats.skipped_binary),
        ("walk_errors", stats.skipped_walk_errors),
    ];
    skips.retain(|(_, v)| *v > 0);
    if !skips.is_empty() {
        out.push_str("skipped:\n");
        for (k, v) in skips {
            out.push_str(&format!("- {k}={v}\n"));
        }
    }
    out.push('\n');
    out
}

pub(crate) fn instance_lines(instance: &MatchInstance, truncate: Option<usize>) -> Option<String> {
    let lines = instance.lines.as_deref()?;
    let Some(limit) = truncate else {
        return Some(lines.to_string());
    };
    Some(
        lines
            .lines()
            .take(limit)
            .collect::<Vec<_>>()
            .join("\n"),
    )
}
