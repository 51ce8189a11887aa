use crate::runtime::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope. Closures and child scopes keep their parents
/// alive through it.
pub type Env = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Value>,
    outer: Option<Env>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh empty scope whose lookups fall back to `outer`.
    pub fn new_enclosed(outer: Env) -> Self {
        Self {
            store: HashMap::new(),
            outer: Some(outer),
        }
    }

    pub fn into_shared(self) -> Env {
        Rc::new(RefCell::new(self))
    }

    /// Walks outward from this scope until `name` is bound.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.store.get(name) {
            return Some(value.clone());
        }
        let mut scope = self.outer.clone();
        while let Some(current) = scope {
            let current = current.borrow();
            if let Some(value) = current.store.get(name) {
                return Some(value.clone());
            }
            scope = current.outer.clone();
        }
        None
    }

    /// Binds in this scope only; an outer binding of the same name is shadowed,
    /// never overwritten.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.store.insert(name.into(), value);
    }
}
