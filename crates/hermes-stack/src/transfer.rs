//! Bulk entry transfer between stacks.
//!
//! Cloning and concatenation copy whole entry collections at once. For each
//! entry whose names are all unclaimed on the target, the copy is appended
//! directly and its names reserved, skipping the duplicate/override
//! validation a single add would perform - no collision is possible. A
//! colliding entry falls back to the full insert path so the error behavior
//! matches looping the single-entry calls. The cache is invalidated once per
//! batch.

use crate::entry::{AbsoluteEntry, RelativeEntry};
use crate::plugin::Plugin;
use crate::stack::MiddlewareStack;
use hermes_core::StackResult;

impl<In, Out> MiddlewareStack<In, Out> {
    /// Copies every source entry into this stack.
    ///
    /// Observable behavior (entry set, order, errors on collision) is
    /// identical to adding each entry individually without override; the
    /// bulk form only skips redundant validation and re-resolves once.
    pub(crate) fn transfer_all(
        &mut self,
        absolute: &[AbsoluteEntry<In, Out>],
        relative: &[RelativeEntry<In, Out>],
    ) -> StackResult<()> {
        let outcome = self.transfer_entries(absolute, relative);
        self.invalidate_cache();
        outcome
    }

    fn transfer_entries(
        &mut self,
        absolute: &[AbsoluteEntry<In, Out>],
        relative: &[RelativeEntry<In, Out>],
    ) -> StackResult<()> {
        for entry in absolute {
            if entry
                .alias_names()
                .all(|name| !self.claimed_names.contains(name))
            {
                self.claimed_names
                    .extend(entry.alias_names().map(str::to_string));
                self.absolute.push(entry.clone());
            } else {
                self.insert_absolute(entry.clone(), false)?;
            }
        }
        for entry in relative {
            if entry
                .alias_names()
                .all(|name| !self.claimed_names.contains(name))
            {
                self.claimed_names
                    .extend(entry.alias_names().map(str::to_string));
                self.relative.push(entry.clone());
            } else {
                self.insert_relative(entry.clone(), false)?;
            }
        }
        Ok(())
    }

    /// Builds a new stack holding this stack's entries followed by `other`'s.
    ///
    /// Fails with the same errors a sequence of single adds would produce
    /// when `other` collides with this stack's names.
    pub fn concat(&self, other: &Self) -> StackResult<Self> {
        let mut merged = self.clone();
        merged.transfer_all(&other.absolute, &other.relative)?;
        Ok(merged)
    }
}

impl<In, Out> Plugin<In, Out> for MiddlewareStack<In, Out> {
    /// Applying one stack to another transfers the source's whole
    /// configuration, so a preconfigured stack can serve as a reusable
    /// bundle.
    fn apply_to(&self, stack: &mut MiddlewareStack<In, Out>) -> StackResult<()> {
        stack.transfer_all(&self.absolute, &self.relative)
    }
}

impl<In, Out> Clone for MiddlewareStack<In, Out> {
    /// Produces an independent stack with copied entries.
    ///
    /// Middleware values are shared, entry metadata is copied; mutating the
    /// clone never affects the original. The resolved-chain cache is not
    /// carried over.
    fn clone(&self) -> Self {
        let mut target = Self::new();
        target.identify_on_resolve = self.identify_on_resolve;
        target.sink = self.sink.clone();
        if let Err(err) = target.transfer_all(&self.absolute, &self.relative) {
            unreachable!("transfer into an empty stack cannot collide: {err}");
        }
        target
    }
}
