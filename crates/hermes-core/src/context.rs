//! Handler execution context.
//!
//! The [`HandlerContext`] describes the call a stack is being composed for.
//! It is handed to every middleware at composition time so decorators can
//! specialize themselves to the operation without inspecting requests.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Context describing the call a middleware stack is composed for.
///
/// The context is read-only from the middleware's point of view: it is built
/// once by the caller, passed by reference into composition, and never
/// mutated by the engine.
///
/// # Example
///
/// ```
/// use hermes_core::HandlerContext;
///
/// let ctx = HandlerContext::new()
///     .with_service("telemetry")
///     .with_operation("PutMetrics");
///
/// assert_eq!(ctx.service(), Some("telemetry"));
/// assert_eq!(ctx.operation(), Some("PutMetrics"));
/// ```
pub struct HandlerContext {
    /// The operation being invoked, if known.
    operation: Option<String>,

    /// The logical service name, if known.
    service: Option<String>,

    /// Type-erased extension data.
    ///
    /// Callers can attach arbitrary data here using type-safe keys.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl HandlerContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            operation: None,
            service: None,
            extensions: HashMap::new(),
        }
    }

    /// Sets the operation name.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Sets the service name.
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Returns the operation name, if set.
    #[must_use]
    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    /// Returns the service name, if set.
    #[must_use]
    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    /// Stores a typed extension value.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_core::HandlerContext;
    ///
    /// struct Region(&'static str);
    ///
    /// let mut ctx = HandlerContext::new();
    /// ctx.set_extension(Region("eu-west-1"));
    ///
    /// assert_eq!(ctx.get_extension::<Region>().unwrap().0, "eu-west-1");
    /// ```
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    ///
    /// Returns `None` if no extension of the given type was stored.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl Default for HandlerContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for HandlerContext {
    fn clone(&self) -> Self {
        // Extensions are not cloned - they don't implement Clone
        Self {
            operation: self.operation.clone(),
            service: self.service.clone(),
            extensions: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("operation", &self.operation)
            .field("service", &self.service)
            .field("extensions", &self.extensions.len())
            .finish()
    }
}
