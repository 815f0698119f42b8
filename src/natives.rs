//! Native-builtin registration (spec.md §4.5, out-of-scope collaborator
//! per §1: only the registration mechanism and calling convention are
//! specified here — the actual standard-library bodies are host-language
//! code supplied by an embedder, not part of the language core).

use crate::error::SofError;
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// Calling convention for a native builtin: receives the already-popped
/// argument vector (index 0 is the first-supplied argument, matching the
/// binding order user functions get) and returns an optional pushed value.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Option<Value>, SofError>>;

struct NativeEntry {
    arity: u32,
    func: NativeFn,
}

/// name → (argcount, host-function pointer), populated once at startup and
/// read-only thereafter (spec.md §5).
#[derive(Default)]
pub struct NativeRegistry {
    entries: HashMap<String, NativeEntry>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        arity: u32,
        func: impl Fn(&[Value]) -> Result<Option<Value>, SofError> + 'static,
    ) {
        self.entries.insert(name.into(), NativeEntry { arity, func: Rc::new(func) });
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn arity(&self, name: &str) -> Option<u32> {
        self.entries.get(name).map(|e| e.arity)
    }

    /// Step 5 of the call protocol (spec.md §4.5): no interpreter frame is
    /// pushed for a native invocation.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Option<Result<Option<Value>, SofError>> {
        self.entries.get(name).map(|entry| (entry.func)(args))
    }
}
