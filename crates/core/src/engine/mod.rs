use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::boilerplate::{ANCESTOR_WINDOW, is_boilerplate};
use crate::error::Error;
use crate::index::{Instance, InstanceId, NodeKey, OccurrenceIndex, canonical_key};
use crate::matches::Match;
use crate::parse::{check_grammar, parse_source};
use crate::scan::collect_source_files;
use crate::tree::{NodeId, SourceTree};
use crate::types::{Diagnostic, InspectOptions, InspectOutcome, InspectStats};


/// Ordered notifications for one run: `Start`, zero or more `Match`es in
/// emission order, then `End` exactly once.
#[derive(Debug)]
pub enum Event<'a> {
    Start,
    Match(&'a Match),
    End,
}

/// The analysis driver. One `Inspector` is one logical run: feed it trees
/// (or files, which it parses), then consume it with [`Inspector::run`].
/// Nothing survives the run; construct a fresh one for the next.
#[derive(Debug)]
pub struct Inspector {
    options: InspectOptions,
    trees: Vec<SourceTree>,
    lines: Vec<Vec<String>>,
    traversals: Vec<Vec<NodeId>>,
    positions: Vec<HashMap<NodeId, usize>>,
    instances: Vec<Instance>,
    index: OccurrenceIndex,
    diagnostics: Vec<Diagnostic>,
    stats: InspectStats,
}

impl Inspector {
    pub fn new(options: InspectOptions) -> Result<Self, Error> {
        options.validate()?;
        check_grammar()?;
        Ok(Self {
            options,
            trees: Vec::new(),
            lines: Vec::new(),
            traversals: Vec::new(),
            positions: Vec::new(),
            instances: Vec::new(),
            index: OccurrenceIndex::default(),
            diagnostics: Vec::new(),
            stats: InspectStats::default(),
        })
    }

    pub(crate) fn stats_mut(&mut self) -> &mut InspectStats {
        &mut self.stats
    }

    /// Reads and parses one file. Unreadable or unparsable files become
    /// diagnostics; only unexpected I/O failures abort the run.
    pub fn add_file(&mut self, path: &Path) -> Result<(), Error> {
        let display = path.display().to_string();
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
                ) =>
            {
                self.diagnostics.push(Diagnostic {
                    path: display,
                    message: err.to_string(),
                    line: None,
                    column: None,
                });
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        if let Some(max) = self.options.max_file_size
            && bytes.len() as u64 > max
        {
            self.stats.skipped_too_large = self.stats.skipped_too_large.saturating_add(1);
            return Ok(());
        }
        if bytes.contains(&0) {
            self.stats.skipped_binary = self.stats.skipped_binary.saturating_add(1);
            return Ok(());
        }

        let source = String::from_utf8_lossy(&bytes);
        self.add_source(&display, &source);
        Ok(())
    }

    /// Parses one source string. A parse failure is recorded as a
    /// diagnostic and the file is excluded; the run continues.
    pub fn add_source(&mut self, path: &str, source: &str) {
        match parse_source(path, source) {
            Ok(parsed) => {
                self.stats.parsed_files = self.stats.parsed_files.saturating_add(1);
                self.add_tree(parsed.tree, parsed.lines);
            }
            Err(failure) => {
                self.stats.parse_failures = self.stats.parse_failures.saturating_add(1);
                self.diagnostics.push(Diagnostic {
                    path: path.to_string(),
                    message: failure.message,
                    line: failure.line,
                    column: failure.column,
                });
            }
        }
    }

    /// Indexes an already-parsed tree: every non-root node whose bounded
    /// pre-order traversal reaches exactly `threshold` nodes and is not
    /// boilerplate becomes a candidate instance.
    pub fn add_tree(&mut self, tree: SourceTree, lines: Vec<String>) {
        let file = self.trees.len() as u32;
        let threshold = self.options.threshold;

        let traversal = match tree.root() {
            Some(root) => tree.pre_order(root, None),
            None => Vec::new(),
        };
        let positions: HashMap<NodeId, usize> = traversal
            .iter()
            .enumerate()
            .map(|(pos, &node)| (node, pos))
            .collect();

        let mut inserted = 0u64;
        tree.walk_subtrees(|node, ancestors| {
            let state = tree.pre_order(node, Some(threshold));
            if state.len() < threshold {
                return;
            }
            let from = ancestors.len().saturating_sub(ANCESTOR_WINDOW);
            let mut window = ancestors[from..].to_vec();
            window.push(node);
            if is_boilerplate(&tree, &window) {
                return;
            }

            let key = canonical_key(&tree, &state);
            self.instances.push(Instance { file, nodes: state });
            let id = self.instances.len() - 1;
            if self.index.insert(key, id, &self.instances) {
                inserted += 1;
            } else {
                self.instances.pop();
            }
        });

        debug!(path = tree.path().as_ref(), instances = inserted, "indexed");
        self.stats.indexed_instances = self.stats.indexed_instances.saturating_add(inserted);
        self.trees.push(tree);
        self.lines.push(lines);
        self.traversals.push(traversal);
        self.positions.push(positions);
    }

    /// Consumes the index: ranks candidate buckets, eliminates overlaps,
    /// optionally sub-groups by identifier/literal compatibility, expands
    /// each surviving group to its maximal common boundary, emits a
    /// `Match`, and prunes the consumed nodes. Emission order is
    /// deterministic for identical input.
    pub fn run<F>(mut self, mut listener: F) -> InspectOutcome
    where
        F: for<'a> FnMut(Event<'a>),
    {
        listener(Event::Start);
        let matches = self.analyze(&mut listener);
        listener(Event::End);

        InspectOutcome {
            matches,
            diagnostics: self.diagnostics,
            stats: self.stats,
        }
    }

    fn analyze<F>(&mut self, listener: &mut F) -> Vec<Match>
    where
        F: for<'a> FnMut(Event<'a>),
    {
        let min_instances = self.options.min_instances;
        let keys = self.index.candidate_keys(min_instances);
        debug!(candidates = keys.len(), "ranked candidate buckets");

        let mut matches = Vec::new();
        for key in keys {
            let Some(bucket) = self.index.bucket(&key) else {
                continue;
            };
            // An earlier key's pruning may have shrunk this one.
            if bucket.len() < min_instances {
                continue;
            }

            let kept = self.eliminate_overlaps(bucket.to_vec());
            for group in self.partition(kept) {
                if group.len() < min_instances {
                    continue;
                }
                let original_len = group.len();
                self.expand(&group);

                let mut m = self.build_match(&group);
                m.populate_lines(|path| self.lines_for(path));
                debug!(instances = original_len, hash = m.hash.as_str(), "match");
                self.stats.matches_found = self.stats.matches_found.saturating_add(1);
                listener(Event::Match(&m));
                matches.push(m);

                self.prune(&group, original_len);
            }
        }
        matches
    }

    /// Keeps the bucket's instances in original order, dropping any that
    /// shares a node with one already kept.
    fn eliminate_overlaps(&self, ids: Vec<InstanceId>) -> Vec<InstanceId> {
        let mut seen: HashSet<NodeKey> = HashSet::new();
        let mut kept = Vec::with_capacity(ids.len());
        for id in ids {
            let instance = &self.instances[id];
            if instance.node_keys().any(|key| seen.contains(&key)) {
                continue;
            }
            seen.extend(instance.node_keys());
            kept.push(id);
        }
        kept
    }

    /// Splits a deduplicated bucket into compatibility sub-groups, first
    /// by identifier composition, then by literal composition. Partitions
    /// preserve first-seen order, so emission stays deterministic.
    fn partition(&self, ids: Vec<InstanceId>) -> Vec<Vec<InstanceId>> {
        let mut groups = vec![ids];
        if self.options.match_identifiers {
            groups = groups
                .into_iter()
                .flat_map(|g| split_by(g, |id| self.identifier_string(id)))
                .collect();
        }
        if self.options.match_literals {
            groups = groups
                .into_iter()
                .flat_map(|g| split_by(g, |id| self.literal_string(id)))
                .collect();
        }
        groups
    }

    fn identifier_string(&self, id: InstanceId) -> String {
        let instance = &self.instances[id];
        let tree = &self.trees[instance.file as usize];
        let mut parts = Vec::new();
        for &node in &instance.nodes {
            for descendant in tree.pre_order(node, None) {
                if let Some(name) = tree.identifier(descendant) {
                    parts.push(name);
                }
            }
        }
        parts.join(":")
    }

    fn literal_string(&self, id: InstanceId) -> String {
        let instance = &self.instances[id];
        let tree = &self.trees[instance.file as usize];
        let mut parts = Vec::new();
        for &node in &instance.nodes {
            if let Some(kind) = tree.literal(node)
                && self.options.literal_kinds.contains(&kind)
            {
                parts.push(kind.as_str());
            }
        }
        parts.join(":")
    }

    /// Grows every instance in the group in lockstep, one node per step,
    /// on both ends. A direction stops permanently once a step fails;
    /// there is never partial per-instance growth.
    fn expand(&mut self, group: &[InstanceId]) {
        let mut claimed: HashSet<NodeKey> = group
            .iter()
            .flat_map(|&id| self.instances[id].node_keys())
            .collect();

        let mut forward = true;
        let mut backward = true;
        while forward || backward {
            if forward {
                forward = self.grow(group, &mut claimed, true);
            }
            if backward {
                backward = self.grow(group, &mut claimed, false);
            }
        }
    }

    fn grow(&mut self, group: &[InstanceId], claimed: &mut HashSet<NodeKey>, forward: bool) -> bool {
        let mut candidates: Vec<NodeKey> = Vec::with_capacity(group.len());
        for &id in group {
            let instance = &self.instances[id];
            let edge = if forward {
                instance.nodes.last().copied()
            } else {
                instance.nodes.first().copied()
            };
            let Some(edge) = edge else {
                return false;
            };
            let Some(&pos) = self.positions[instance.file as usize].get(&edge) else {
                return false;
            };
            let next = if forward {
                pos + 1
            } else if pos == 0 {
                return false;
            } else {
                pos - 1
            };
            let Some(&candidate) = self.traversals[instance.file as usize].get(next) else {
                return false;
            };
            candidates.push((instance.file, candidate));
        }

        if !self.candidates_compatible(&candidates) {
            return false;
        }

        // No double-claiming: a node already owned by any instance of the
        // group, or proposed twice in this step, blocks the direction.
        let mut step: HashSet<NodeKey> = HashSet::new();
        for &candidate in &candidates {
            if claimed.contains(&candidate) || !step.insert(candidate) {
                return false;
            }
        }

        for (&id, &(file, node)) in group.iter().zip(&candidates) {
            let instance = &mut self.instances[id];
            if forward {
                instance.nodes.push(node);
            } else {
                instance.nodes.insert(0, node);
            }
            claimed.insert((file, node));
        }
        true
    }

    fn candidates_compatible(&self, candidates: &[NodeKey]) -> bool {
        let (first_file, first_node) = candidates[0];
        let first_tree = &self.trees[first_file as usize];
        for &(file, node) in &candidates[1..] {
            let tree = &self.trees[file as usize];
            if tree.kind(node) != first_tree.kind(first_node) {
                return false;
            }
            if self.options.match_identifiers
                && tree.identifier(node) != first_tree.identifier(first_node)
            {
                return false;
            }
            if self.options.match_literals
                && let Some(kind) = first_tree.literal(first_node)
                && self.options.literal_kinds.contains(&kind)
                && tree.literal_value(node) != first_tree.literal_value(first_node)
            {
                return false;
            }
        }
        true
    }

    fn build_match(&self, group: &[InstanceId]) -> Match {
        let parts: Vec<(&SourceTree, &[NodeId])> = group
            .iter()
            .map(|&id| {
                let instance = &self.instances[id];
                (
                    &self.trees[instance.file as usize],
                    instance.nodes.as_slice(),
                )
            })
            .collect();
        Match::build(&parts)
    }

    fn lines_for(&self, path: &str) -> Option<&[String]> {
        self.trees
            .iter()
            .position(|tree| tree.path().as_ref() == path)
            .map(|i| self.lines[i].as_slice())
    }

    /// Retracts every node of every instance so none can seed or join a
    /// later, weaker match. The guard length is the group's instance
    /// count: buckets already resized by a different prune are left for
    /// their own, still-valid matches.
    fn prune(&mut self, group: &[InstanceId], original_len: usize) {
        for &id in group {
            let keys: Vec<NodeKey> = self.instances[id].node_keys().collect();
            for key in keys {
                self.index.retract(key, original_len);
            }
        }
    }
}

fn split_by<F: Fn(InstanceId) -> String>(ids: Vec<InstanceId>, f: F) -> Vec<Vec<InstanceId>> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<InstanceId>> = HashMap::new();
    for id in ids {
        let key = f(id);
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(id);
    }
    order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .collect()
}

pub fn find_duplicate_subtrees(
    roots: &[PathBuf],
    options: &InspectOptions,
) -> Result<Vec<Match>, Error> {
    Ok(find_duplicate_subtrees_with_stats(roots, options)?.matches)
}

pub fn find_duplicate_subtrees_with_stats(
    roots: &[PathBuf],
    options: &InspectOptions,
) -> Result<InspectOutcome, Error> {
    let mut inspector = Inspector::new(options.clone())?;
    let files = collect_source_files(roots, options, inspector.stats_mut())?;
    for file in &files {
        inspector.add_file(file)?;
    }
    Ok(inspector.run(|_| {}))
}
