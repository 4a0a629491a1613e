mod boilerplate;
mod engine;
mod error;
mod index;
mod matches;
mod parse;
mod scan;
mod tree;
mod types;

pub use engine::{Event, Inspector, find_duplicate_subtrees, find_duplicate_subtrees_with_stats};

pub use error::Error;

pub use matches::{Match, MatchInstance};

pub use parse::{ParseFailure, ParsedFile, parse_source};

pub use tree::{NodeId, Position, SourceTree, Span};

pub use types::{
    DEFAULT_MAX_FILE_SIZE_BYTES, DEFAULT_MIN_INSTANCES, DEFAULT_THRESHOLD, Diagnostic,
    InspectOptions, InspectOutcome, InspectStats, LiteralKind, all_literal_kinds,
    default_ignore_dirs,
};
