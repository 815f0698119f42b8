//! Nametable and scope chain (spec.md §4.4): a single scope frame mapping
//! identifiers to values, and the ordered stack of frames the interpreter
//! walks for lookup.

use crate::error::{ErrorLocation, SofError};
use crate::value::{Identifier, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A single scope frame. Insertion order is irrelevant; equal identifiers
/// collapse, last write wins (spec.md §4.4).
#[derive(Debug, Default)]
pub struct Nametable {
    bindings: HashMap<Identifier, Value>,
    return_slot: Option<Value>,
}

impl Nametable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, id: &Identifier) -> bool {
        self.bindings.contains_key(id)
    }

    pub fn get(&self, id: &Identifier) -> Option<Value> {
        self.bindings.get(id).cloned()
    }

    pub fn put(&mut self, id: Identifier, value: Value) {
        self.bindings.insert(id, value);
    }

    pub fn put_all(&mut self, other: &Nametable) {
        for (id, value) in &other.bindings {
            self.bindings.insert(id.clone(), value.clone());
        }
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &Identifier> {
        self.bindings.keys()
    }

    pub fn set_return(&mut self, value: Value) {
        self.return_slot = Some(value);
    }

    pub fn return_value(&self) -> Option<&Value> {
        self.return_slot.as_ref()
    }

    pub fn take_return(&mut self) -> Option<Value> {
        self.return_slot.take()
    }

    pub fn clear_return(&mut self) {
        self.return_slot = None;
    }
}

/// Ordered stack of nametables, global at index 0. Lookup walks top→bottom.
pub struct ScopeChain {
    frames: Vec<Rc<RefCell<Nametable>>>,
}

impl ScopeChain {
    /// A fresh chain holding only the global frame — the operand stack and
    /// scope chain are never empty after interpreter initialization
    /// (spec.md §3).
    pub fn new() -> Self {
        Self {
            frames: vec![Rc::new(RefCell::new(Nametable::new()))],
        }
    }

    pub fn global(&self) -> Rc<RefCell<Nametable>> {
        Rc::clone(&self.frames[0])
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push_frame(&mut self, frame: Rc<RefCell<Nametable>>) {
        self.frames.push(frame);
    }

    /// Pops the top frame. Unwinding past the global frame is a caller
    /// error — the interpreter must check `depth()` before popping
    /// (spec.md §4.5: unwinding past global is a `stack` error).
    pub fn pop_frame(&mut self) -> Option<Rc<RefCell<Nametable>>> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    pub fn top(&self) -> Rc<RefCell<Nametable>> {
        Rc::clone(self.frames.last().expect("scope chain is never empty"))
    }

    /// Walks top→bottom; the first hit wins (spec.md §4.4).
    pub fn lookup(&self, id: &Identifier, location: ErrorLocation) -> Result<Value, SofError> {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.borrow().get(id) {
                return Ok(value);
            }
        }
        Err(SofError::name(location, id.as_str()))
    }

    /// `def` — writes to the top frame.
    pub fn define_local(&self, id: Identifier, value: Value) {
        self.top().borrow_mut().put(id, value);
    }

    /// `globaldef` — writes to the bottom (global) frame.
    pub fn define_global(&self, id: Identifier, value: Value) {
        self.global().borrow_mut().put(id, value);
    }
}

impl Default for ScopeChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    #[test]
    fn lookup_walks_top_to_bottom() {
        let mut chain = ScopeChain::new();
        chain.define_global(id("x"), Value::Integer(1));
        chain.push_frame(Rc::new(RefCell::new(Nametable::new())));
        chain.define_local(id("x"), Value::Integer(2));
        let found = chain.lookup(&id("x"), ErrorLocation::Incomplete).unwrap();
        assert!(matches!(found, Value::Integer(2)));
    }

    #[test]
    fn globaldef_writes_bottom_frame_even_when_nested() {
        let mut chain = ScopeChain::new();
        chain.push_frame(Rc::new(RefCell::new(Nametable::new())));
        chain.define_global(id("g"), Value::Integer(9));
        assert!(chain.global().borrow().has(&id("g")));
    }

    #[test]
    fn unresolved_lookup_is_name_error() {
        let chain = ScopeChain::new();
        let err = chain.lookup(&id("missing"), ErrorLocation::Incomplete);
        assert!(matches!(err, Err(SofError::Name { .. })));
    }

    #[test]
    fn cannot_pop_past_global() {
        let mut chain = ScopeChain::new();
        assert!(chain.pop_frame().is_none());
        assert_eq!(chain.depth(), 1);
    }

    #[test]
    fn last_write_wins() {
        let mut table = Nametable::new();
        table.put(id("a"), Value::Integer(1));
        table.put(id("a"), Value::Integer(2));
        assert!(matches!(table.get(&id("a")), Some(Value::Integer(2))));
    }
}
