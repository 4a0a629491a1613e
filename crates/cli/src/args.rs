use std::collections::HashSet;
use std::path::PathBuf;

use treedup_core::{InspectOptions, LiteralKind};

const HELP_TEXT: &str = concat!(
    "treedup (structural duplicate code detection for JavaScript)\n",
    "\n",
    "Usage:\n",
    "  treedup [options] [path ...]\n",
    "\n",
    "Options:\n",
    "  --threshold <n>         Minimum subtree size considered (default: 30)\n",
    "  --min-instances <n>     Minimum instances per reported match (default: 2)\n",
    "  --match-identifiers     Require identifier names to agree\n",
    "  --match-literals        Require literal values to agree\n",
    "  --literal-kinds <csv>   Kinds checked by --match-literals:\n",
    "                          string,number,boolean (default: all)\n",
    "  --reporter <name>       Output format: text, json, pmd, md (default: text)\n",
    "  --truncate <n>          Limit printed lines per instance (text/md)\n",
    "  --ignore-dir <name>     Add an ignored directory name (repeatable)\n",
    "  --no-gitignore          Do not respect .gitignore rules\n",
    "  --max-file-size <n>     Skip files larger than n bytes (default: 10485760)\n",
    "  --follow-symlinks       Follow symlinks (default: off)\n",
    "  --stats                 Include run stats (JSON) or print to stderr\n",
    "  --strict                Exit non-zero if any file failed to parse\n",
    "  --fail-on-match         Exit non-zero when matches were found\n",
    "  -V, --version           Show version\n",
    "  -h, --help              Show help\n",
    "\n",
    "Examples:\n",
    "  treedup src/\n",
    "  treedup --threshold 15 --reporter json lib/ shared.js\n",
    "  treedup --match-identifiers --ignore-dir vendor .\n",
    "\n"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reporter {
    Text,
    Json,
    Pmd,
    Md,
}

#[derive(Debug, Clone)]
pub(crate) struct ParsedArgs {
    pub(crate) reporter: Reporter,
    pub(crate) stats: bool,
    pub(crate) strict: bool,
    pub(crate) fail_on_match: bool,
    pub(crate) truncate: Option<usize>,
    pub(crate) roots: Vec<PathBuf>,
    pub(crate) options: InspectOptions,
}

#[derive(Debug)]
pub(crate) enum Command {
    Run(Box<ParsedArgs>),
    Help,
    Version,
}

pub(crate) fn print_help() {
    print!("{HELP_TEXT}");
}

fn parse_usize_at_least(name: &str, raw: &str, min: usize) -> Result<usize, String> {
    let value = raw
        .parse::<usize>()
        .map_err(|_| format!("{name} must be an integer"))?;
    if value < min {
        return Err(format!("{name} must be >= {min}"));
    }
    Ok(value)
}

fn parse_u64(name: &str, raw: &str) -> Result<u64, String> {
    raw.parse::<u64>()
        .map_err(|_| format!("{name} must be an integer"))
}

fn parse_literal_kinds(raw: &str) -> Result<HashSet<LiteralKind>, String> {
    let mut kinds = HashSet::new();
    for part in raw.split(',') {
        let part = part.trim();
        let kind = match part {
            "string" => LiteralKind::String,
            "number" => LiteralKind::Number,
            "boolean" => LiteralKind::Boolean,
            other => {
                return Err(format!(
                    "--literal-kinds: unknown kind {other:?} (expected string, number, boolean)"
                ));
            }
        };
        kinds.insert(kind);
    }
    if kinds.is_empty() {
        return Err("--literal-kinds requires at least one kind".to_string());
    }
    Ok(kinds)
}

fn parse_reporter(raw: &str) -> Result<Reporter, String> {
    match raw {
        "text" => Ok(Reporter::Text),
        "json" => Ok(Reporter::Json),
        "pmd" => Ok(Reporter::Pmd),
        "md" => Ok(Reporter::Md),
        other => Err(format!(
            "--reporter: unknown format {other:?} (expected text, json, pmd, md)"
        )),
    }
}

pub(crate) fn parse_args(argv: &[String]) -> Result<Command, String> {
    let mut roots: Vec<PathBuf> = Vec::new();
    let mut ignore_dirs: Vec<String> = Vec::new();
    let mut reporter = Reporter::Text;
    let mut stats = false;
    let mut strict = false;
    let mut fail_on_match = false;
    let mut truncate: Option<usize> = None;
    let mut respect_gitignore = true;
    let mut follow_symlinks = false;
    let mut match_identifiers = false;
    let mut match_literals = false;
    let mut literal_kinds: Option<HashSet<LiteralKind>> = None;
    let mut threshold: Option<usize> = None;
    let mut min_instances: Option<usize> = None;
    let mut max_file_size: Option<u64> = None;

    let mut i = 0;
    while i < argv.len() {
        let arg = &argv[i];
        if arg == "--" {
            roots.extend(argv[(i + 1)..].iter().map(PathBuf::from));
            break;
        }
        if arg == "--match-identifiers" {
            match_identifiers = true;
            i += 1;
            continue;
        }
        if arg == "--match-literals" {
            match_literals = true;
            i += 1;
            continue;
        }
        if arg == "--stats" {
            stats = true;
            i += 1;
            continue;
        }
        if arg == "--strict" {
            strict = true;
            i += 1;
            continue;
        }
        if arg == "--fail-on-match" {
            fail_on_match = true;
            i += 1;
            continue;
        }
        if arg == "--no-gitignore" {
            respect_gitignore = false;
            i += 1;
            continue;
        }
        if arg == "--gitignore" {
            respect_gitignore = true;
            i += 1;
            continue;
        }
        if arg == "--follow-symlinks" {
            follow_symlinks = true;
            i += 1;
            continue;
        }
        if arg == "--threshold" {
            let raw = argv.get(i + 1).ok_or("--threshold requires a value")?;
            threshold = Some(parse_usize_at_least("--threshold", raw, 2)?);
            i += 2;
            continue;
        }
        if arg == "--min-instances" {
            let raw = argv.get(i + 1).ok_or("--min-instances requires a value")?;
            min_instances = Some(parse_usize_at_least("--min-instances", raw, 2)?);
            i += 2;
            continue;
        }
        if arg == "--truncate" {
            let raw = argv.get(i + 1).ok_or("--truncate requires a value")?;
            truncate = Some(parse_usize_at_least("--truncate", raw, 1)?);
            i += 2;
            continue;
        }
        if arg == "--max-file-size" {
            let raw = argv.get(i + 1).ok_or("--max-file-size requires a value")?;
            max_file_size = Some(parse_u64("--max-file-size", raw)?);
            i += 2;
            continue;
        }
        if arg == "--literal-kinds" {
            let raw = argv.get(i + 1).ok_or("--literal-kinds requires a value")?;
            literal_kinds = Some(parse_literal_kinds(raw)?);
            i += 2;
            continue;
        }
        if arg == "--reporter" {
            let raw = argv.get(i + 1).ok_or("--reporter requires a value")?;
            reporter = parse_reporter(raw)?;
            i += 2;
            continue;
        }
        if arg == "--ignore-dir" {
            let value = argv.get(i + 1).ok_or("--ignore-dir requires a value")?;
            ignore_dirs.push(value.to_string());
            i += 2;
            continue;
        }
        if arg == "-h" || arg == "--help" {
            return Ok(Command::Help);
        }
        if arg == "-V" || arg == "--version" {
            return Ok(Command::Version);
        }
        if arg.starts_with('-') {
            return Err(format!("Unknown option: {arg}"));
        }
        roots.push(PathBuf::from(arg));
        i += 1;
    }

    let mut options = InspectOptions {
        respect_gitignore,
        follow_symlinks,
        match_identifiers,
        match_literals,
        ..InspectOptions::default()
    };
    if let Some(threshold) = threshold {
        options.threshold = threshold;
    }
    if let Some(min_instances) = min_instances {
        options.min_instances = min_instances;
    }
    if let Some(max_file_size) = max_file_size {
        options.max_file_size = Some(max_file_size);
    }
    if let Some(literal_kinds) = literal_kinds {
        options.literal_kinds = literal_kinds;
    }
    options.ignore_dirs.extend(ignore_dirs);

    let roots = if roots.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        roots
    };

    Ok(Command::Run(Box::new(ParsedArgs {
        reporter,
        stats,
        strict,
        fail_on_match,
        truncate,
        roots,
        options,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn parse_run(parts: &[&str]) -> ParsedArgs {
        match parse_args(&args(parts)).expect("parses") {
            Command::Run(parsed) => *parsed,
            other => panic!("expected a run command, got {other:?}"),
        }
    }

    #[test]
    fn defaults_cover_the_current_directory() {
        let parsed = parse_run(&[]);
        assert_eq!(parsed.roots, vec![PathBuf::from(".")]);
        assert_eq!(parsed.reporter, Reporter::Text);
        assert_eq!(parsed.options.threshold, 30);
        assert_eq!(parsed.options.min_instances, 2);
        assert!(parsed.options.respect_gitignore);
        assert!(!parsed.fail_on_match);
    }

    #[test]
    fn numeric_flags_override_the_defaults() {
        let parsed = parse_run(&[
            "--threshold",
            "15",
            "--min-instances",
            "3",
            "--max-file-size",
            "1024",
            "src",
        ]);
        assert_eq!(parsed.options.threshold, 15);
        assert_eq!(parsed.options.min_instances, 3);
        assert_eq!(parsed.options.max_file_size, Some(1024));
        assert_eq!(parsed.roots, vec![PathBuf::from("src")]);
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        assert!(parse_args(&args(&["--threshold", "1"])).is_err());
        assert!(parse_args(&args(&["--min-instances", "0"])).is_err());
        assert!(parse_args(&args(&["--threshold", "many"])).is_err());
    }

    #[test]
    fn literal_kinds_accept_a_csv_subset() {
        let parsed = parse_run(&["--match-literals", "--literal-kinds", "string,number"]);
        assert!(parsed.options.match_literals);
        assert_eq!(parsed.options.literal_kinds.len(), 2);
        assert!(parsed.options.literal_kinds.contains(&LiteralKind::String));
        assert!(!parsed.options.literal_kinds.contains(&LiteralKind::Boolean));

        assert!(parse_args(&args(&["--literal-kinds", "regex"])).is_err());
        assert!(parse_args(&args(&["--literal-kinds", ""])).is_err());
    }

    #[test]
    fn ignore_dir_is_repeatable() {
        let parsed = parse_run(&["--ignore-dir", "vendor", "--ignore-dir", ".venv"]);
        assert!(parsed.options.ignore_dirs.contains("vendor"));
        assert!(parsed.options.ignore_dirs.contains(".venv"));
        assert!(parsed.options.ignore_dirs.contains("node_modules"));
    }

    #[test]
    fn reporter_names_are_validated() {
        assert_eq!(parse_run(&["--reporter", "pmd"]).reporter, Reporter::Pmd);
        assert_eq!(parse_run(&["--reporter", "md"]).reporter, Reporter::Md);
        assert!(parse_args(&args(&["--reporter", "yaml"])).is_err());
    }

    #[test]
    fn double_dash_ends_option_parsing() {
        let parsed = parse_run(&["--", "--threshold"]);
        assert_eq!(parsed.roots, vec![PathBuf::from("--threshold")]);
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert!(matches!(parse_args(&args(&["-h"])), Ok(Command::Help)));
        assert!(matches!(
            parse_args(&args(&["--version"])),
            Ok(Command::Version)
        ));
    }

    #[test]
    fn unknown_options_are_rejected() {
        assert!(parse_args(&args(&["--fuzz"])).is_err());
    }
}
