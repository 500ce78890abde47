//! Chain resolution.
//!
//! Resolution turns the stack's two entry collections into one deterministic
//! ordered sequence. Entries are normalized into an index-based graph with a
//! fresh alias lookup (rebuilt on every resolution, never kept live), relative
//! entries are attached to their anchors, absolute entries are stable-sorted
//! by descending phase and priority weight, and the graph is expanded
//! depth-first into the final chain.

use crate::entry::{name_with_aliases, AbsoluteEntry, Phase, Priority, Relation, RelativeEntry};
use crate::middleware::SharedMiddleware;
use hermes_core::{StackError, StackResult};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

/// How strict resolution should be about inconsistent configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolveMode {
    /// Fail on dangling anchors and cycles; the result may be cached.
    Execute,
    /// Never fail: skip dangling entries, truncate cycles, never cache.
    Inspect,
}

/// Where a resolved entry was positioned, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Placement {
    /// Bound to a concrete phase and priority.
    Absolute {
        phase: Phase,
        priority: Priority,
    },
    /// Anchored to another named entry.
    Relative {
        relation: Relation,
        to_middleware: String,
    },
}

/// One link of the resolved chain.
pub(crate) struct ResolvedEntry<In, Out> {
    pub(crate) middleware: SharedMiddleware<In, Out>,
    pub(crate) name: Option<String>,
    pub(crate) aliases: Vec<String>,
    pub(crate) placement: Placement,
}

impl<In, Out> std::fmt::Debug for ResolvedEntry<In, Out> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedEntry")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("placement", &self.placement)
            .finish_non_exhaustive()
    }
}

impl<In, Out> ResolvedEntry<In, Out> {
    /// Renders this link for `identify` output:
    /// `<name-with-aliases> - <phase or relation anchor>`.
    pub(crate) fn description(&self) -> String {
        let placement = match &self.placement {
            Placement::Absolute { phase, .. } => phase.name().to_string(),
            Placement::Relative {
                relation,
                to_middleware,
            } => format!("{} {}", relation.name(), to_middleware),
        };
        format!(
            "{} - {}",
            name_with_aliases(self.name.as_deref(), &self.aliases),
            placement
        )
    }
}

impl<In, Out> Clone for ResolvedEntry<In, Out> {
    fn clone(&self) -> Self {
        Self {
            middleware: self.middleware.clone(),
            name: self.name.clone(),
            aliases: self.aliases.clone(),
            placement: self.placement.clone(),
        }
    }
}

/// A normalized entry: the source entry plus the relative entries anchored
/// to it, in registration order.
struct Node<'a, In, Out> {
    source: Source<'a, In, Out>,
    before: Vec<usize>,
    after: Vec<usize>,
}

enum Source<'a, In, Out> {
    Absolute(&'a AbsoluteEntry<In, Out>),
    Relative(&'a RelativeEntry<In, Out>),
}

impl<In, Out> Source<'_, In, Out> {
    fn display_name(&self) -> String {
        match self {
            Self::Absolute(entry) => name_with_aliases(entry.name.as_deref(), &entry.aliases),
            Self::Relative(entry) => name_with_aliases(entry.name.as_deref(), &entry.aliases),
        }
    }

    fn resolved(&self) -> ResolvedEntry<In, Out> {
        match self {
            Self::Absolute(entry) => ResolvedEntry {
                middleware: entry.middleware.clone(),
                name: entry.name.clone(),
                aliases: entry.aliases.clone(),
                placement: Placement::Absolute {
                    phase: entry.phase,
                    priority: entry.priority,
                },
            },
            Self::Relative(entry) => ResolvedEntry {
                middleware: entry.middleware.clone(),
                name: entry.name.clone(),
                aliases: entry.aliases.clone(),
                placement: Placement::Relative {
                    relation: entry.relation,
                    to_middleware: entry.to_middleware.clone(),
                },
            },
        }
    }
}

/// Resolves the two entry collections into the ordered chain.
pub(crate) fn resolve_chain<In, Out>(
    absolute: &[AbsoluteEntry<In, Out>],
    relative: &[RelativeEntry<In, Out>],
    mode: ResolveMode,
) -> StackResult<Vec<ResolvedEntry<In, Out>>> {
    let mut nodes: Vec<Node<'_, In, Out>> = absolute
        .iter()
        .map(Source::Absolute)
        .chain(relative.iter().map(Source::Relative))
        .map(|source| Node {
            source,
            before: Vec::new(),
            after: Vec::new(),
        })
        .collect();

    // Fresh alias lookup, keyed by every alias of every entry. Names are
    // unique across the stack, enforced at registration.
    let mut lookup: HashMap<&str, usize> = HashMap::new();
    for (idx, entry) in absolute.iter().enumerate() {
        for name in entry.alias_names() {
            lookup.insert(name, idx);
        }
    }
    for (offset, entry) in relative.iter().enumerate() {
        for name in entry.alias_names() {
            lookup.insert(name, absolute.len() + offset);
        }
    }

    // Attach relative entries to their anchors, preserving registration
    // order within each before/after list.
    for (offset, entry) in relative.iter().enumerate() {
        let idx = absolute.len() + offset;
        let Some(&anchor) = lookup.get(entry.to_middleware.as_str()) else {
            match mode {
                ResolveMode::Execute => {
                    return Err(StackError::AnchorNotFound {
                        anchor: entry.to_middleware.clone(),
                        orphan: name_with_aliases(entry.name.as_deref(), &entry.aliases),
                    });
                }
                ResolveMode::Inspect => {
                    tracing::debug!(
                        anchor = %entry.to_middleware,
                        entry = %name_with_aliases(entry.name.as_deref(), &entry.aliases),
                        "skipping dangling relative entry during inspection"
                    );
                    continue;
                }
            }
        };
        match entry.relation {
            Relation::Before => nodes[anchor].before.push(idx),
            Relation::After => nodes[anchor].after.push(idx),
        }
    }

    // Stable sort keeps registration order for equal (phase, priority) keys.
    let mut order: Vec<usize> = (0..absolute.len()).collect();
    order.sort_by_key(|&i| Reverse((absolute[i].phase.weight(), absolute[i].priority.weight())));

    let mut expanded: Vec<usize> = Vec::with_capacity(nodes.len());
    let mut visited: HashSet<usize> = HashSet::with_capacity(nodes.len());
    for idx in order {
        expand(&nodes, idx, mode, &mut visited, &mut expanded)?;
    }

    // Each attached entry has exactly one parent, so a cycle shows up as an
    // island no root can reach rather than as a revisit. In execution mode
    // every entry must have been emitted exactly once; anything left over is
    // anchored, directly or transitively, to itself.
    if mode == ResolveMode::Execute {
        if let Some(culprit) = (0..nodes.len()).find(|idx| !visited.contains(idx)) {
            return Err(StackError::CyclicPosition {
                name: nodes[culprit].source.display_name(),
            });
        }
    }

    let chain: Vec<ResolvedEntry<In, Out>> = expanded
        .iter()
        .map(|&idx| nodes[idx].source.resolved())
        .collect();
    tracing::trace!(entries = chain.len(), "resolved middleware chain");
    Ok(chain)
}

/// Depth-first expansion: the `before` list in registration order, the entry
/// itself, then the `after` list in reverse registration order. Reversing
/// `after` means that once the composer folds right-to-left, the
/// last-registered "after" middleware ends up furthest from its anchor in
/// call order.
fn expand<In, Out>(
    nodes: &[Node<'_, In, Out>],
    idx: usize,
    mode: ResolveMode,
    visited: &mut HashSet<usize>,
    out: &mut Vec<usize>,
) -> StackResult<()> {
    if !visited.insert(idx) {
        // Every node has at most one anchor, so a revisit always means the
        // anchoring is cyclic.
        return match mode {
            ResolveMode::Execute => Err(StackError::CyclicPosition {
                name: nodes[idx].source.display_name(),
            }),
            ResolveMode::Inspect => Ok(()),
        };
    }
    for &child in &nodes[idx].before {
        expand(nodes, child, mode, visited, out)?;
    }
    out.push(idx);
    for &child in nodes[idx].after.iter().rev() {
        expand(nodes, child, mode, visited, out)?;
    }
    Ok(())
}
