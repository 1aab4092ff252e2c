// Scoped context carrier
//
// Immutable, chainable key/value association used to hand values from a
// `before` hook stage to the matching `after` stage.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Name of a slot in a [`Context`]
///
/// Keys compare by name, so modules keep their keys private to avoid
/// collisions with other writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextKey(&'static str);

impl ContextKey {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

struct Binding {
    key: ContextKey,
    value: Box<dyn Any + Send + Sync>,
    parent: Option<Arc<Binding>>,
}

/// Execution context threaded through a before/after hook pair
///
/// Deriving a child with [`Context::with_value`] never mutates the parent, and
/// clones share the same chain. Lookups walk from the newest binding to the
/// oldest, so a later binding shadows an earlier one under the same key.
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Binding>>,
}

impl Context {
    /// Empty root context
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a new context with `value` bound under `key`
    pub fn with_value<T>(&self, key: ContextKey, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            head: Some(Arc::new(Binding {
                key,
                value: Box::new(value),
                parent: self.head.clone(),
            })),
        }
    }

    /// Look up the value bound under `key`
    ///
    /// Returns `None` when the key was never bound or when the nearest binding
    /// holds a value of another type. A type mismatch is not an error.
    pub fn value<T: Any>(&self, key: &ContextKey) -> Option<&T> {
        let mut node = self.head.as_deref();
        while let Some(binding) = node {
            if binding.key == *key {
                return binding.value.downcast_ref::<T>();
            }
            node = binding.parent.as_deref();
        }
        None
    }

    /// Whether any binding exists under `key`, regardless of its type
    pub fn contains(&self, key: &ContextKey) -> bool {
        let mut node = self.head.as_deref();
        while let Some(binding) = node {
            if binding.key == *key {
                return true;
            }
            node = binding.parent.as_deref();
        }
        false
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = Vec::new();
        let mut node = self.head.as_deref();
        while let Some(binding) = node {
            keys.push(binding.key.name());
            node = binding.parent.as_deref();
        }
        f.debug_struct("Context").field("keys", &keys).finish()
    }
}
