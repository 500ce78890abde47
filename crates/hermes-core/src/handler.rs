//! Handler trait for request processing.
//!
//! The [`Handler`] trait is the single capability middleware knows about: a
//! callable that takes an input and asynchronously produces an output. The
//! terminal handler supplied by the transport layer and every decorated
//! handler built around it share this shape.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed future that resolves to `T`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased error for handler results.
///
/// The stack engine has no opinion on the shape of transport or middleware
/// failures, so handlers report them through a boxed error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An async callable from `In` to `Out`.
///
/// Middleware treats handlers as fully opaque: it may wrap one, call it, or
/// short-circuit around it, but never inspects it.
///
/// # Example
///
/// ```rust,ignore
/// struct EchoHandler;
///
/// impl Handler<String, String> for EchoHandler {
///     fn call(&self, input: String) -> BoxFuture<'_, Result<String, BoxError>> {
///         Box::pin(async move { Ok(input) })
///     }
/// }
/// ```
pub trait Handler<In, Out>: Send + Sync {
    /// Processes one input and produces one output.
    fn call(&self, input: In) -> BoxFuture<'_, Result<Out, BoxError>>;
}

impl<In, Out> std::fmt::Debug for dyn Handler<In, Out> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

/// A shared, type-erased handler.
///
/// Composition produces nested handlers that wrap each other; sharing through
/// `Arc` keeps a composed handler an immutable snapshot that stays valid even
/// after the stack that produced it is mutated.
pub type SharedHandler<In, Out> = Arc<dyn Handler<In, Out>>;

/// A handler backed by an async function.
///
/// This allows using closures directly as handlers without implementing the
/// trait by hand.
///
/// # Example
///
/// ```rust,ignore
/// let handler = FnHandler::new(|input: String| async move {
///     Ok(input.to_uppercase())
/// });
/// ```
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F> {
    /// Creates a new function-based handler.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<In, Out, F, Fut> Handler<In, Out> for FnHandler<F>
where
    F: Fn(In) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Out, BoxError>> + Send + 'static,
{
    fn call(&self, input: In) -> BoxFuture<'_, Result<Out, BoxError>> {
        Box::pin((self.func)(input))
    }
}
