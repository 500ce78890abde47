//! Diagnostics sink for resolution listings.
//!
//! When `identify_on_resolve` is enabled, the stack emits a human-readable
//! listing of the final chain order through an injected sink rather than a
//! global print statement, so hosts control where the output goes.

/// A collaborator accepting an ordered batch of human-readable lines.
pub trait DiagnosticsSink: Send + Sync {
    /// Receives the listing, one line per chain entry, in chain order.
    fn emit(&self, lines: &[String]);
}

/// The default sink, logging each line at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn emit(&self, lines: &[String]) {
        for line in lines {
            tracing::debug!(target: "hermes::stack", "{line}");
        }
    }
}
