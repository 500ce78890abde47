//! # Hermes Core
//!
//! Core types and traits for the Hermes RPC client runtime.
//!
//! This crate provides the foundational types used throughout Hermes:
//!
//! - [`Handler`] - The opaque async callable that middleware decorates
//! - [`HandlerContext`] - Execution context handed to middleware at
//!   composition time
//! - [`StackError`] - Error taxonomy for stack configuration and resolution
//! - [`BoxFuture`] / [`BoxError`] - Type-erased future and error aliases

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod handler;

pub use context::HandlerContext;
pub use error::{StackError, StackResult};
pub use handler::{BoxError, BoxFuture, FnHandler, Handler, SharedHandler};
