use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LiteralKind {
    String,
    Number,
    Boolean,
}

impl LiteralKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LiteralKind::String => "string",
            LiteralKind::Number => "number",
            LiteralKind::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone)]
pub struct InspectOptions {
    pub threshold: usize,
    pub min_instances: usize,
    pub match_identifiers: bool,
    pub match_literals: bool,
    pub literal_kinds: HashSet<LiteralKind>,
    pub ignore_dirs: HashSet<String>,
    pub max_file_size: Option<u64>,
    pub respect_gitignore: bool,
    pub follow_symlinks: bool,
}

pub const DEFAULT_THRESHOLD: usize = 30;
pub const DEFAULT_MIN_INSTANCES: usize = 2;
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_instances: DEFAULT_MIN_INSTANCES,
            match_identifiers: false,
            match_literals: false,
            literal_kinds: all_literal_kinds(),
            ignore_dirs: default_ignore_dirs(),
            max_file_size: Some(DEFAULT_MAX_FILE_SIZE_BYTES),
            respect_gitignore: true,
            follow_symlinks: false,
        }
    }
}

impl InspectOptions {
    pub(crate) fn validate(&self) -> Result<(), crate::error::Error> {
        if self.threshold < 2 {
            return Err(crate::error::Error::InvalidOption(format!(
                "threshold must be >= 2, got {}",
                self.threshold
            )));
        }
        if self.min_instances < 2 {
            return Err(crate::error::Error::InvalidOption(format!(
                "min_instances must be >= 2, got {}",
                self.min_instances
            )));
        }
        Ok(())
    }
}

pub fn all_literal_kinds() -> HashSet<LiteralKind> {
    [
        LiteralKind::String,
        LiteralKind::Number,
        LiteralKind::Boolean,
    ]
    .into_iter()
    .collect()
}

pub fn default_ignore_dirs() -> HashSet<String> {
    [
        ".git",
        ".hg",
        ".svn",
        "node_modules",
        "bower_components",
        "dist",
        "build",
        "out",
        ".next",
        ".cache",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InspectStats {
    pub candidate_files: u64,
    pub parsed_files: u64,
    pub parse_failures: u64,
    pub skipped_too_large: u64,
    pub skipped_binary: u64,
    pub skipped_walk_errors: u64,
    pub indexed_instances: u64,
    pub matches_found: u64,
}

/// A recovered per-file failure. The run continues without the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: String,
    pub message: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct InspectOutcome {
    pub matches: Vec<crate::matches::Match>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: InspectStats,
}
