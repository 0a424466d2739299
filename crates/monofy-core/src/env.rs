//! Environment-variable lookup used for argument substitution.

use std::collections::HashMap;

/// Read-only `name -> value` lookup.
pub trait EnvLookup {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Looks names up in the live process environment on every call.
///
/// Values that are not valid Unicode are treated as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl<S: std::hash::BuildHasher> EnvLookup for HashMap<String, String, S> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<T: EnvLookup + ?Sized> EnvLookup for &T {
    fn lookup(&self, name: &str) -> Option<String> {
        (**self).lookup(name)
    }
}
