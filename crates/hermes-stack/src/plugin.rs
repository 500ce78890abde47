//! Reusable middleware bundles.
//!
//! A plugin knows how to register its middleware on a stack. Client runtimes
//! collect plugins from configuration and apply them in order when building
//! an operation's stack.

use crate::stack::MiddlewareStack;
use hermes_core::StackResult;

/// A reusable bundle of middleware configuration.
///
/// # Example
///
/// ```rust,ignore
/// struct RetryPlugin {
///     max_attempts: u32,
/// }
///
/// impl<In, Out> Plugin<In, Out> for RetryPlugin {
///     fn apply_to(&self, stack: &mut MiddlewareStack<In, Out>) -> StackResult<()> {
///         stack.add(
///             retry_middleware(self.max_attempts),
///             AbsoluteOptions::new()
///                 .name("retry")
///                 .phase(Phase::FinalizeRequest)
///                 .priority(Priority::High)
///                 .tag("RETRY"),
///         )
///     }
/// }
/// ```
pub trait Plugin<In, Out> {
    /// Applies this plugin's configuration to the given stack.
    fn apply_to(&self, stack: &mut MiddlewareStack<In, Out>) -> StackResult<()>;
}

/// A plugin backed by a plain function.
pub struct FnPlugin<F> {
    func: F,
}

impl<F> FnPlugin<F> {
    /// Creates a new function-based plugin.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<In, Out, F> Plugin<In, Out> for FnPlugin<F>
where
    F: Fn(&mut MiddlewareStack<In, Out>) -> StackResult<()>,
{
    fn apply_to(&self, stack: &mut MiddlewareStack<In, Out>) -> StackResult<()> {
        (self.func)(stack)
    }
}
