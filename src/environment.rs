//! The lexical environment used by the tree-walking evaluator: a chain of name-to-value
//! bindings, mirroring [crate::symbol_table::SymbolTable] but holding values instead of slots.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::object::ObjectRef;

#[derive(Debug, Default)]
struct Inner {
    store: HashMap<String, ObjectRef>,
    outer: Option<Environment>,
}

/// Cheaply cloneable handle to an environment frame. Closures capture an `Environment` by
/// cloning the handle, which shares the same underlying store.
#[derive(Debug, Clone, Default)]
pub struct Environment(Rc<RefCell<Inner>>);

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    /// An environment enclosed by `outer`, for a function call's local bindings.
    pub fn enclosed(outer: Environment) -> Self {
        Environment(Rc::new(RefCell::new(Inner {
            store: HashMap::new(),
            outer: Some(outer),
        })))
    }

    /// Looks up `name`, searching outward through enclosing environments.
    pub fn get(&self, name: &str) -> Option<ObjectRef> {
        let inner = self.0.borrow();
        match inner.store.get(name) {
            Some(value) => Some(Rc::clone(value)),
            None => inner.outer.as_ref().and_then(|outer| outer.get(name)),
        }
    }

    /// Binds `name` to `value` in this environment frame.
    pub fn set(&self, name: &str, value: ObjectRef) {
        self.0.borrow_mut().store.insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::object::Object;

    #[test]
    fn get_falls_through_to_outer() {
        let outer = Environment::new();
        outer.set("a", Rc::new(Object::Integer(1)));
        let inner = Environment::enclosed(outer);

        match inner.get("a").unwrap().as_ref() {
            Object::Integer(value) => assert_eq!(1, *value),
            other => panic!("{:?}", other),
        }
        assert!(inner.get("missing").is_none());
    }

    #[test]
    fn set_in_inner_does_not_leak_to_outer() {
        let outer = Environment::new();
        let inner = Environment::enclosed(outer.clone());
        inner.set("a", Rc::new(Object::Integer(1)));

        assert!(outer.get("a").is_none());
        assert!(inner.get("a").is_some());
    }
}
