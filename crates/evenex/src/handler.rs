//! Handlers and the invocation passed to them.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::bus::EventBus;
use crate::error::{HandlerResult, ValidationError};
use crate::key::EventKey;
use crate::validate::{validate_handler, validate_handler_value};

/// Context value bound to a registration and handed back on every call.
pub type Context = Arc<dyn Any + Send + Sync>;

type HandlerFn = dyn Fn(&Invocation<'_>) -> HandlerResult + Send + Sync;

/// An invocable registered against an event key.
///
/// Cloning a handler clones the reference, not the closure. Equality is
/// reference identity: two handlers built from identical closures are
/// different handlers, while clones of one handler are the same handler.
#[derive(Clone)]
pub struct Handler {
    inner: Arc<HandlerFn>,
}

impl Handler {
    /// Wrap a fallible closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Wrap a closure that cannot fail.
    pub fn infallible<F>(f: F) -> Self
    where
        F: Fn(&Invocation<'_>) + Send + Sync + 'static,
    {
        Self::new(move |invocation| {
            f(invocation);
            Ok(())
        })
    }

    /// Returns `true` if both values refer to the same handler.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn call(&self, invocation: &Invocation<'_>) -> HandlerResult {
        (self.inner)(invocation)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler")
            .field(&Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

/// One call of a handler during dispatch.
pub struct Invocation<'a> {
    bus: &'a EventBus,
    key: &'a EventKey,
    args: &'a [Value],
    context: Option<&'a Context>,
}

impl<'a> Invocation<'a> {
    pub(crate) fn new(
        bus: &'a EventBus,
        key: &'a EventKey,
        args: &'a [Value],
        context: Option<&'a Context>,
    ) -> Self {
        Self {
            bus,
            key,
            args,
            context,
        }
    }

    /// The bus performing the dispatch.
    ///
    /// Handlers may register, unregister, or emit through it. Changes apply
    /// to later dispatches, not to the one in progress.
    #[must_use]
    pub fn bus(&self) -> &'a EventBus {
        self.bus
    }

    /// The key being emitted.
    #[must_use]
    pub fn key(&self) -> &'a EventKey {
        self.key
    }

    /// Arguments passed to `emit`.
    #[must_use]
    pub fn args(&self) -> &'a [Value] {
        self.args
    }

    /// Argument at `index`, if present.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&'a Value> {
        self.args.get(index)
    }

    /// The bound context downcast to `T`.
    ///
    /// Returns `None` if no context was bound or it has a different type.
    #[must_use]
    pub fn context<T: Any>(&self) -> Option<&'a T> {
        self.context.and_then(|ctx| ctx.downcast_ref::<T>())
    }

    /// The bound context, untyped.
    #[must_use]
    pub fn raw_context(&self) -> Option<&'a Context> {
        self.context
    }
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("key", self.key)
            .field("args", &self.args)
            .field("has_context", &self.context.is_some())
            .finish_non_exhaustive()
    }
}

/// Conversion of caller-supplied values into a [`Handler`].
pub trait IntoHandler {
    /// Convert into a handler.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidHandler`] if the value is not
    /// invocable.
    fn into_handler(self) -> Result<Handler, ValidationError>;
}

impl IntoHandler for Handler {
    fn into_handler(self) -> Result<Handler, ValidationError> {
        Ok(self)
    }
}

impl IntoHandler for &Handler {
    fn into_handler(self) -> Result<Handler, ValidationError> {
        Ok(self.clone())
    }
}

impl IntoHandler for Option<Handler> {
    fn into_handler(self) -> Result<Handler, ValidationError> {
        validate_handler(self.as_ref()).cloned()
    }
}

impl IntoHandler for &Value {
    fn into_handler(self) -> Result<Handler, ValidationError> {
        validate_handler_value(self)
    }
}

impl IntoHandler for Value {
    fn into_handler(self) -> Result<Handler, ValidationError> {
        validate_handler_value(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_handler_identity() {
        let a = Handler::new(|_| Ok(()));
        let b = Handler::new(|_| Ok(()));

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert!(a.same(&a.clone()));
    }

    #[test]
    fn test_into_handler() {
        let handler = Handler::infallible(|_| {});

        assert_eq!((&handler).into_handler().unwrap(), handler);
        assert_eq!(Some(handler.clone()).into_handler().unwrap(), handler);
        assert!(None::<Handler>.into_handler().is_err());
        assert!(json!("not a function").into_handler().is_err());
    }

    #[test]
    fn test_invocation_accessors() {
        let bus = EventBus::new();
        let key = EventKey::from("test");
        let args = [json!("a"), json!(2)];
        let ctx: Context = Arc::new(String::from("receiver"));
        let invocation = Invocation::new(&bus, &key, &args, Some(&ctx));

        assert_eq!(invocation.key(), &key);
        assert_eq!(invocation.args().len(), 2);
        assert_eq!(invocation.arg(1), Some(&json!(2)));
        assert!(invocation.arg(2).is_none());
        assert_eq!(invocation.context::<String>().unwrap(), "receiver");
        assert!(invocation.context::<u32>().is_none());
    }
}
