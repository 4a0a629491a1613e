use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ignore::WalkBuilder;
use tracing::debug;

use crate::types::{InspectOptions, InspectStats};

const SOURCE_EXTENSIONS: [&str; 4] = ["js", "jsx", "mjs", "cjs"];

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

pub(crate) fn validate_roots(roots: &[PathBuf]) -> io::Result<()> {
    if roots.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "no paths given",
        ));
    }
    for root in roots {
        fs::metadata(root)
            .map_err(|err| io::Error::new(err.kind(), format!("{}: {err}", root.display())))?;
    }
    Ok(())
}

/// Collects candidate source files under the given roots. A root that is
/// itself a file is taken as-is when it carries a recognized extension;
/// directory roots are walked. The returned list is sorted per root, so a
/// re-run over unchanged input sees files in the same order.
pub(crate) fn collect_source_files(
    roots: &[PathBuf],
    options: &InspectOptions,
    stats: &mut InspectStats,
) -> io::Result<Vec<PathBuf>> {
    validate_roots(roots)?;

    let mut files = Vec::new();
    for root in roots {
        let meta = fs::metadata(root)?;
        if meta.is_file() {
            if has_source_extension(root) {
                stats.candidate_files = stats.candidate_files.saturating_add(1);
                files.push(root.clone());
            }
            continue;
        }
        let mut found = walk_root(root, options, stats);
        found.sort();
        stats.candidate_files = stats.candidate_files.saturating_add(found.len() as u64);
        files.append(&mut found);
    }
    debug!(candidates = files.len(), "scan complete");
    Ok(files)
}

fn walk_root(root: &Path, options: &InspectOptions, stats: &mut InspectStats) -> Vec<PathBuf> {
    let ignore_dirs = options.ignore_dirs.clone();
    let follow_symlinks = options.follow_symlinks;
    let respect_gitignore = options.respect_gitignore;
    let is_git_repo = root.join(".git").exists();

    // Shared with the filter closure, which ignore::Walk wants 'static-ish.
    let skipped_walk_errors = Arc::new(AtomicU64::new(0));
    let skipped_walk_errors_cloned = Arc::clone(&skipped_walk_errors);

    let canonical_root = if follow_symlinks {
        root.canonicalize().ok()
    } else {
        None
    };

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .follow_links(follow_symlinks)
        .ignore(false)
        .git_ignore(respect_gitignore)
        .git_global(respect_gitignore && is_git_repo)
        .git_exclude(respect_gitignore && is_git_repo)
        .parents(false)
        .require_git(false);

    let walker = builder
        .filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            if !follow_symlinks && entry.path_is_symlink() {
                return false;
            }

            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            if !is_dir {
                return true;
            }

            if let Some(name) = entry.file_name().to_str()
                && ignore_dirs.contains(name)
            {
                return false;
            }

            // A symlinked directory may escape the root; only descend when
            // it resolves back inside.
            if follow_symlinks && entry.path_is_symlink() {
                let Some(canonical_root) = canonical_root.as_ref() else {
                    return false;
                };
                match entry.path().canonicalize() {
                    Ok(resolved) => {
                        if !resolved.starts_with(canonical_root) {
                            return false;
                        }
                    }
                    Err(_) => {
                        skipped_walk_errors_cloned.fetch_add(1, Ordering::Relaxed);
                        return false;
                    }
                }
            }

            true
        })
        .build();

    let mut files = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(_) => {
                stats.skipped_walk_errors = stats.skipped_walk_errors.saturating_add(1);
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        if has_source_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }

    stats.skipped_walk_errors = stats
        .skipped_walk_errors
        .saturating_add(skipped_walk_errors.load(Ordering::Relaxed));
    files
}
