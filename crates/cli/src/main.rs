mod args;
mod json;
mod md;
mod path;
mod pmd;
mod text;

use std::env;
use std::io;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use treedup_core::{Error, find_duplicate_subtrees_with_stats};

use crate::args::{Command, ParsedArgs, Reporter};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let argv: Vec<String> = env::args().skip(1).collect();
    let parsed = match args::parse_args(&argv) {
        Ok(Command::Help) => {
            args::print_help();
            return;
        }
        Ok(Command::Version) => {
            println!("treedup {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        Ok(Command::Run(parsed)) => *parsed,
        Err(message) => {
            eprintln!("Error: {message}\n");
            args::print_help();
            std::process::exit(2);
        }
    };

    let roots: Vec<PathBuf> = match parsed
        .roots
        .iter()
        .map(|p| path::resolve_path(p))
        .collect::<io::Result<Vec<_>>>()
    {
        Ok(v) => v,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };

    match run(&parsed, &roots) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}

fn run(parsed: &ParsedArgs, roots: &[PathBuf]) -> Result<i32, Error> {
    let outcome = find_duplicate_subtrees_with_stats(roots, &parsed.options)?;
    let match_count = outcome.matches.len();
    let stats = outcome.stats;

    match parsed.reporter {
        Reporter::Json => {
            let matches = json::map_matches(outcome.matches);
            if parsed.stats {
                json::write_json(&serde_json::json!({
                    "matches": matches,
                    "diagnostics": json::map_diagnostics(outcome.diagnostics),
                    "stats": json::JsonStats::from(stats.clone()),
                }))?;
            } else {
                json::write_json(&matches)?;
            }
        }
        Reporter::Text => {
            print!(
                "{}",
                text::format_matches(&outcome.matches, parsed.truncate)
            );
            eprint!("{}", text::format_diagnostics(&outcome.diagnostics));
            eprint!("{}", text::format_summary(match_count, stats.parsed_files));
        }
        Reporter::Pmd => {
            print!("{}", pmd::format_pmd(&outcome.matches));
            eprint!("{}", text::format_diagnostics(&outcome.diagnostics));
        }
        Reporter::Md => {
            print!("{}", md::format_md(&outcome.matches, parsed.truncate));
            eprint!("{}", text::format_diagnostics(&outcome.diagnostics));
        }
    }

    if parsed.stats && parsed.reporter != Reporter::Json {
        eprint!("{}", text::format_stats(&stats));
    }

    if parsed.strict && stats.parse_failures > 0 {
        return Ok(1);
    }
    if parsed.fail_on_match && match_count > 0 {
        return Ok(1);
    }
    Ok(0)
}
