//! # Hermes Stack
//!
//! Middleware ordering and composition engine for the Hermes RPC client
//! runtime.
//!
//! Callers register middleware against a fixed set of pipeline phases, or
//! relative to other named entries, and ask the stack to resolve the
//! registration into one composed handler wrapped around the transport's
//! terminal handler.
//!
//! ## Pipeline Phases
//!
//! ```text
//! Input → initialize → serialize → build → finalizeRequest → deserialize → Transport
//! ```
//!
//! Absolute entries sort by phase, then priority, then registration order.
//! Relative entries attach before or after a named anchor and travel with it.
//!
//! ## Example
//!
//! ```rust,ignore
//! use hermes_stack::{AbsoluteOptions, MiddlewareStack, Phase, RelativeOptions};
//!
//! let mut stack: MiddlewareStack<Request, Response> = MiddlewareStack::new();
//! stack.add(serializer, AbsoluteOptions::new().name("serializer").phase(Phase::Serialize))?;
//! stack.add_relative_to(signer, RelativeOptions::after("serializer").name("signer"))?;
//!
//! let handler = stack.resolve(transport, &ctx)?;
//! let response = handler.call(input).await?;
//! ```
//!
//! ## Key Properties
//!
//! - **Deterministic**: for fixed contents, resolution always yields the same
//!   chain; the first chain entry becomes the outermost wrapper.
//! - **Snapshot composition**: a composed handler is immutable; later stack
//!   mutations never affect it.
//! - **Safe introspection**: [`MiddlewareStack::identify`] never fails, even
//!   on configurations that execution-mode resolution rejects.

#![doc(html_root_url = "https://docs.rs/hermes-stack/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod diagnostics;
pub mod entry;
pub mod middleware;
pub mod plugin;
mod resolve;
pub mod stack;
mod transfer;

// Re-export main types at crate root
pub use diagnostics::{DiagnosticsSink, TracingSink};
pub use entry::{
    AbsoluteEntry, AbsoluteOptions, Phase, Priority, Relation, RelativeEntry, RelativeOptions,
};
pub use middleware::{FnMiddleware, Middleware, SharedMiddleware};
pub use plugin::{FnPlugin, Plugin};
pub use stack::MiddlewareStack;
