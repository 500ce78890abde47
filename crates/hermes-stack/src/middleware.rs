//! Core middleware trait.
//!
//! A middleware is a decorator: given the next handler in the chain and the
//! execution context, it produces a new handler that may perform work before
//! and/or after delegating to the wrapped one. The engine never interprets
//! what a middleware does.

use hermes_core::{HandlerContext, SharedHandler};
use std::sync::Arc;

/// The single capability the stack engine requires of a middleware:
/// transform a handler plus context into a handler.
///
/// # Invariants
///
/// - `wrap` must be side-effect free: it builds a decorated handler, it does
///   not run one. Any real work belongs inside the returned handler.
/// - The returned handler owns everything it needs; it must stay valid after
///   the stack that composed it is mutated or dropped.
///
/// # Example
///
/// ```rust,ignore
/// struct HeaderMiddleware;
///
/// impl Middleware<Request, Response> for HeaderMiddleware {
///     fn wrap(
///         &self,
///         next: SharedHandler<Request, Response>,
///         _ctx: &HandlerContext,
///     ) -> SharedHandler<Request, Response> {
///         Arc::new(FnHandler::new(move |mut request: Request| {
///             request.headers.insert("x-hermes", "1");
///             let next = next.clone();
///             async move { next.call(request).await }
///         }))
///     }
/// }
/// ```
pub trait Middleware<In, Out>: Send + Sync {
    /// Decorates `next`, producing the handler that will stand in its place.
    fn wrap(&self, next: SharedHandler<In, Out>, ctx: &HandlerContext) -> SharedHandler<In, Out>;
}

/// A shared, type-erased middleware.
///
/// Entry removal by reference compares these with [`Arc::ptr_eq`], so the
/// same `SharedMiddleware` value must be used for registration and removal.
pub type SharedMiddleware<In, Out> = Arc<dyn Middleware<In, Out>>;

/// A middleware backed by a plain function.
///
/// This allows defining simple decorators without implementing the trait
/// directly.
pub struct FnMiddleware<F> {
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a new function-based middleware.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<In, Out, F> Middleware<In, Out> for FnMiddleware<F>
where
    F: Fn(SharedHandler<In, Out>, &HandlerContext) -> SharedHandler<In, Out> + Send + Sync,
{
    fn wrap(&self, next: SharedHandler<In, Out>, ctx: &HandlerContext) -> SharedHandler<In, Out> {
        (self.func)(next, ctx)
    }
}
