//! The middleware stack: registry and composer.
//!
//! A [`MiddlewareStack`] owns the live entry collections and the name/alias
//! uniqueness set, resolves them lazily into an ordered chain, and folds that
//! chain into one composed handler. Mutations take `&mut self`; the engine is
//! synchronous and single-threaded by contract, so hosts sharing a stack
//! across threads must serialize access externally.

use crate::diagnostics::{DiagnosticsSink, TracingSink};
use crate::entry::{AbsoluteEntry, AbsoluteOptions, RelativeEntry, RelativeOptions};
use crate::middleware::SharedMiddleware;
use crate::plugin::Plugin;
use crate::resolve::{resolve_chain, ResolveMode, ResolvedEntry};
use hermes_core::{HandlerContext, SharedHandler, StackError, StackResult};
use std::collections::HashSet;
use std::sync::Arc;

/// An ordered collection of middleware that composes into a single handler.
///
/// Entries are registered against a fixed pipeline phase ([`add`]) or
/// relative to another named entry ([`add_relative_to`]), and resolved into
/// one decorator chain by [`resolve`]. The resolved chain is cached and the
/// cache is invalidated by every mutation, so repeated resolution is cheap
/// and always consistent with current contents.
///
/// [`add`]: MiddlewareStack::add
/// [`add_relative_to`]: MiddlewareStack::add_relative_to
/// [`resolve`]: MiddlewareStack::resolve
///
/// # Example
///
/// ```rust,ignore
/// let mut stack: MiddlewareStack<Request, Response> = MiddlewareStack::new();
/// stack.add(logging, AbsoluteOptions::new().name("logging"))?;
/// stack.add(serializer, AbsoluteOptions::new().name("serializer").phase(Phase::Serialize))?;
/// stack.add_relative_to(compression, RelativeOptions::after("serializer").name("compression"))?;
///
/// let handler = stack.resolve(transport_handler, &ctx)?;
/// ```
pub struct MiddlewareStack<In, Out> {
    /// Phase-bound entries, in registration order.
    pub(crate) absolute: Vec<AbsoluteEntry<In, Out>>,

    /// Anchor-positioned entries, in registration order.
    pub(crate) relative: Vec<RelativeEntry<In, Out>>,

    /// Every name and alias across both collections, exactly once each.
    pub(crate) claimed_names: HashSet<String>,

    /// The resolved chain, present only when consistent with the entries.
    pub(crate) cache: Option<Vec<ResolvedEntry<In, Out>>>,

    /// When set, `resolve` also emits the chain listing to the sink.
    pub(crate) identify_on_resolve: bool,

    /// Receiver for chain listings.
    pub(crate) sink: Arc<dyn DiagnosticsSink>,
}

impl<In, Out> MiddlewareStack<In, Out> {
    /// Creates an empty stack with the default tracing-backed sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            absolute: Vec::new(),
            relative: Vec::new(),
            claimed_names: HashSet::new(),
            cache: None,
            identify_on_resolve: false,
            sink: Arc::new(TracingSink),
        }
    }

    /// Registers a phase-bound middleware entry.
    ///
    /// Fails with [`StackError::DuplicateName`] if any name or alias is
    /// already claimed and `overwrite` was not requested. With `overwrite`,
    /// every colliding entry must occupy the identical phase and priority,
    /// else the call fails with [`StackError::OverrideMismatch`] and the
    /// stack is left untouched; matching entries are removed and the new one
    /// inserted in their logical position.
    pub fn add(
        &mut self,
        middleware: SharedMiddleware<In, Out>,
        options: AbsoluteOptions,
    ) -> StackResult<()> {
        let overwrite = options.overwrite;
        let label = options.name.clone();
        let phase = options.phase;
        self.insert_absolute(AbsoluteEntry::new(middleware, options), overwrite)?;
        tracing::debug!(
            name = label.as_deref().unwrap_or("<anonymous>"),
            phase = phase.name(),
            "registered middleware"
        );
        self.invalidate_cache();
        Ok(())
    }

    /// Registers a middleware entry positioned relative to a named entry.
    ///
    /// Collision and override rules match [`add`](Self::add), except override
    /// compatibility compares the anchor name and relation instead of phase
    /// and priority. The anchor is not validated to exist here, only at
    /// execution-mode resolution.
    pub fn add_relative_to(
        &mut self,
        middleware: SharedMiddleware<In, Out>,
        options: RelativeOptions,
    ) -> StackResult<()> {
        let overwrite = options.overwrite;
        let label = options.name.clone();
        let anchor = options.to_middleware.clone();
        let relation = options.relation;
        self.insert_relative(RelativeEntry::new(middleware, options), overwrite)?;
        tracing::debug!(
            name = label.as_deref().unwrap_or("<anonymous>"),
            anchor = %anchor,
            relation = relation.name(),
            "registered relative middleware"
        );
        self.invalidate_cache();
        Ok(())
    }

    /// Removes the entry whose name or aliases include `name`.
    ///
    /// Returns whether a removal occurred. All of the entry's aliases are
    /// freed atomically with the removal.
    pub fn remove(&mut self, name: &str) -> bool {
        if let Some(idx) = self
            .absolute
            .iter()
            .position(|entry| entry.alias_names().any(|n| n == name))
        {
            let removed = self.absolute.remove(idx);
            self.unclaim(removed.alias_names());
            self.invalidate_cache();
            tracing::debug!(name, "removed middleware");
            return true;
        }
        if let Some(idx) = self
            .relative
            .iter()
            .position(|entry| entry.alias_names().any(|n| n == name))
        {
            let removed = self.relative.remove(idx);
            self.unclaim(removed.alias_names());
            self.invalidate_cache();
            tracing::debug!(name, "removed middleware");
            return true;
        }
        false
    }

    /// Removes every entry holding the given middleware, compared by
    /// reference identity.
    ///
    /// Returns whether any removal occurred.
    pub fn remove_by_reference(&mut self, middleware: &SharedMiddleware<In, Out>) -> bool {
        let before = self.len();
        let mut freed: Vec<String> = Vec::new();
        self.absolute.retain(|entry| {
            if Arc::ptr_eq(&entry.middleware, middleware) {
                freed.extend(entry.alias_names().map(str::to_string));
                false
            } else {
                true
            }
        });
        self.relative.retain(|entry| {
            if Arc::ptr_eq(&entry.middleware, middleware) {
                freed.extend(entry.alias_names().map(str::to_string));
                false
            } else {
                true
            }
        });
        for name in &freed {
            self.claimed_names.remove(name);
        }
        let removed = self.len() != before;
        if removed {
            self.invalidate_cache();
            tracing::debug!(count = before - self.len(), "removed middleware by reference");
        }
        removed
    }

    /// Removes every entry whose tag set contains `tag`.
    ///
    /// Returns whether any removal occurred.
    pub fn remove_by_tag(&mut self, tag: &str) -> bool {
        let before = self.len();
        let mut freed: Vec<String> = Vec::new();
        self.absolute.retain(|entry| {
            if entry.tags.iter().any(|t| t == tag) {
                freed.extend(entry.alias_names().map(str::to_string));
                false
            } else {
                true
            }
        });
        self.relative.retain(|entry| {
            if entry.tags.iter().any(|t| t == tag) {
                freed.extend(entry.alias_names().map(str::to_string));
                false
            } else {
                true
            }
        });
        for name in &freed {
            self.claimed_names.remove(name);
        }
        let removed = self.len() != before;
        if removed {
            self.invalidate_cache();
            tracing::debug!(tag, count = before - self.len(), "removed middleware by tag");
        }
        removed
    }

    /// Applies a plugin, letting it register its middleware bundle on this
    /// stack.
    pub fn apply(&mut self, plugin: &dyn Plugin<In, Out>) -> StackResult<()> {
        plugin.apply_to(self)
    }

    /// Lists the chain in final order as human-readable strings.
    ///
    /// This is an inspection: it never fails, never caches, and reflects
    /// transient state faithfully - dangling relative entries are simply
    /// absent from the listing.
    #[must_use]
    pub fn identify(&self) -> Vec<String> {
        resolve_chain(&self.absolute, &self.relative, ResolveMode::Inspect)
            .map(|chain| chain.iter().map(ResolvedEntry::description).collect())
            .unwrap_or_default()
    }

    /// Returns whether `resolve` emits the chain listing to the sink.
    #[must_use]
    pub fn identify_on_resolve(&self) -> bool {
        self.identify_on_resolve
    }

    /// Toggles emission of the chain listing during `resolve`.
    ///
    /// Has no effect on ordering.
    pub fn set_identify_on_resolve(&mut self, enabled: bool) {
        self.identify_on_resolve = enabled;
    }

    /// Replaces the diagnostics sink.
    pub fn set_diagnostics_sink(&mut self, sink: Arc<dyn DiagnosticsSink>) {
        self.sink = sink;
    }

    /// Resolves the chain and folds it around `terminal` into one composed
    /// handler.
    ///
    /// The first chain entry becomes the outermost wrapper (first to observe
    /// a call, last to observe its result); the last entry sits closest to
    /// the terminal handler. The returned handler is an immutable snapshot:
    /// later stack mutations never affect it.
    pub fn resolve(
        &mut self,
        terminal: SharedHandler<In, Out>,
        ctx: &HandlerContext,
    ) -> StackResult<SharedHandler<In, Out>> {
        if self.cache.is_none() {
            self.cache = Some(resolve_chain(
                &self.absolute,
                &self.relative,
                ResolveMode::Execute,
            )?);
        }
        let chain = self.cache.as_deref().unwrap_or_default();

        if self.identify_on_resolve {
            let lines: Vec<String> = chain.iter().map(ResolvedEntry::description).collect();
            self.sink.emit(&lines);
        }

        let mut handler = terminal;
        for entry in chain.iter().rev() {
            handler = entry.middleware.wrap(handler, ctx);
        }
        tracing::debug!(
            operation = ctx.operation().unwrap_or("<unknown>"),
            links = chain.len(),
            "composed handler chain"
        );
        Ok(handler)
    }

    /// Returns the total number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.absolute.len() + self.relative.len()
    }

    /// Returns whether the stack has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.absolute.is_empty() && self.relative.is_empty()
    }

    /// Inserts an absolute entry, enforcing uniqueness and override rules.
    /// Does not touch the cache; callers invalidate it themselves.
    pub(crate) fn insert_absolute(
        &mut self,
        entry: AbsoluteEntry<In, Out>,
        overwrite: bool,
    ) -> StackResult<()> {
        let names: Vec<String> = entry.alias_names().map(str::to_string).collect();
        if let Some(collision) = names
            .iter()
            .find(|name| self.claimed_names.contains(name.as_str()))
        {
            if !overwrite {
                return Err(StackError::DuplicateName {
                    name: collision.clone(),
                });
            }
            let (abs_hits, rel_hits) = self.colliding_entries(&names);
            for &idx in &abs_hits {
                let existing = &self.absolute[idx];
                if existing.phase != entry.phase || existing.priority != entry.priority {
                    return Err(StackError::OverrideMismatch {
                        name: collision.clone(),
                        reason: format!(
                            "existing entry occupies phase '{}' at '{}' priority, \
                             replacement targets phase '{}' at '{}' priority",
                            existing.phase.name(),
                            existing.priority.name(),
                            entry.phase.name(),
                            entry.priority.name()
                        ),
                    });
                }
            }
            if !rel_hits.is_empty() {
                return Err(StackError::OverrideMismatch {
                    name: collision.clone(),
                    reason: "existing entry is relatively positioned, replacement is phase-bound"
                        .to_string(),
                });
            }
            for &idx in abs_hits.iter().rev() {
                let removed = self.absolute.remove(idx);
                self.unclaim(removed.alias_names());
            }
        }
        self.claimed_names.extend(names);
        self.absolute.push(entry);
        Ok(())
    }

    /// Inserts a relative entry, enforcing uniqueness and override rules.
    /// Does not touch the cache; callers invalidate it themselves.
    pub(crate) fn insert_relative(
        &mut self,
        entry: RelativeEntry<In, Out>,
        overwrite: bool,
    ) -> StackResult<()> {
        let names: Vec<String> = entry.alias_names().map(str::to_string).collect();
        if let Some(collision) = names
            .iter()
            .find(|name| self.claimed_names.contains(name.as_str()))
        {
            if !overwrite {
                return Err(StackError::DuplicateName {
                    name: collision.clone(),
                });
            }
            let (abs_hits, rel_hits) = self.colliding_entries(&names);
            if !abs_hits.is_empty() {
                return Err(StackError::OverrideMismatch {
                    name: collision.clone(),
                    reason: "existing entry is phase-bound, replacement is relatively positioned"
                        .to_string(),
                });
            }
            for &idx in &rel_hits {
                let existing = &self.relative[idx];
                if existing.to_middleware != entry.to_middleware
                    || existing.relation != entry.relation
                {
                    return Err(StackError::OverrideMismatch {
                        name: collision.clone(),
                        reason: format!(
                            "existing entry sits {} '{}', replacement sits {} '{}'",
                            existing.relation.name(),
                            existing.to_middleware,
                            entry.relation.name(),
                            entry.to_middleware
                        ),
                    });
                }
            }
            for &idx in rel_hits.iter().rev() {
                let removed = self.relative.remove(idx);
                self.unclaim(removed.alias_names());
            }
        }
        self.claimed_names.extend(names);
        self.relative.push(entry);
        Ok(())
    }

    /// Finds the indices of entries whose alias sets intersect `names`.
    fn colliding_entries(&self, names: &[String]) -> (Vec<usize>, Vec<usize>) {
        let abs_hits = self
            .absolute
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                entry
                    .alias_names()
                    .any(|existing| names.iter().any(|name| name == existing))
            })
            .map(|(idx, _)| idx)
            .collect();
        let rel_hits = self
            .relative
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                entry
                    .alias_names()
                    .any(|existing| names.iter().any(|name| name == existing))
            })
            .map(|(idx, _)| idx)
            .collect();
        (abs_hits, rel_hits)
    }

    fn unclaim<'a>(&mut self, names: impl Iterator<Item = &'a str>) {
        for name in names {
            self.claimed_names.remove(name);
        }
    }

    /// Drops the cached chain, if any.
    pub(crate) fn invalidate_cache(&mut self) {
        if self.cache.take().is_some() {
            tracing::trace!("invalidated resolved chain cache");
        }
    }
}

impl<In, Out> Default for MiddlewareStack<In, Out> {
    fn default() -> Self {
        Self::new()
    }
}

impl<In, Out> std::fmt::Debug for MiddlewareStack<In, Out> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareStack")
            .field("absolute", &self.absolute.len())
            .field("relative", &self.relative.len())
            .field("cached", &self.cache.is_some())
            .field("identify_on_resolve", &self.identify_on_resolve)
            .finish()
    }
}
