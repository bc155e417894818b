//! A chain of lexical scopes, classifying identifiers as global, local, built-in, or free
//! (captured from an enclosing function).

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolScope {
    Global,
    Local,
    Builtin,
    Free,
    /// The current function's own name, bound inside its own body for recursive self-reference.
    /// Does not occupy a local slot.
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub scope: SymbolScope,
    pub index: usize,
}

/// One scope in the chain. `outer` links to the enclosing scope; resolving a name that isn't
/// defined here recurses outward.
#[derive(Debug, Default)]
pub struct SymbolTable {
    outer: Option<Box<SymbolTable>>,
    store: HashMap<String, Symbol>,
    num_definitions: usize,
    /// Symbols captured from an enclosing scope, in the order they were first referenced.
    /// `free_symbols[i]` is the *original* (outer) symbol for the local `Free` symbol at index i.
    free_symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Wraps `outer` in a fresh, nested scope.
    pub fn new_enclosed(outer: SymbolTable) -> Self {
        SymbolTable {
            outer: Some(Box::new(outer)),
            ..SymbolTable::default()
        }
    }

    /// Discards this scope and returns the one it was enclosing.
    ///
    /// # Panics
    ///
    /// Panics if this is the outermost scope.
    pub fn pop(self) -> SymbolTable {
        *self.outer.expect("popped the outermost symbol table")
    }

    pub fn num_definitions(&self) -> usize {
        self.num_definitions
    }

    pub fn free_symbols(&self) -> &[Symbol] {
        &self.free_symbols
    }

    /// Defines `name` as a new binding in this scope: `Global` at the outermost scope, `Local`
    /// otherwise.
    pub fn define(&mut self, name: &str) -> Symbol {
        let scope = if self.outer.is_none() {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        let symbol = Symbol {
            name: name.to_string(),
            scope,
            index: self.num_definitions,
        };
        self.num_definitions += 1;
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Registers a built-in function at a fixed index, available from any scope.
    pub fn define_builtin(&mut self, index: usize, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Builtin,
            index,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Binds a function's own name inside its body, for recursive calls via `OpCurrentClosure`.
    /// Does not consume a local slot.
    pub fn define_function_name(&mut self, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Function,
            index: 0,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Records that `original` (defined in an enclosing scope) is captured here as a free
    /// variable, and returns the new local `Free` symbol for it.
    fn define_free(&mut self, original: Symbol) -> Symbol {
        self.free_symbols.push(original.clone());
        let symbol = Symbol {
            name: original.name.clone(),
            scope: SymbolScope::Free,
            index: self.free_symbols.len() - 1,
        };
        self.store.insert(original.name, symbol.clone());
        symbol
    }

    /// Resolves `name`, searching outward through enclosing scopes. A name found in an outer
    /// scope as `Global` or `Builtin` is returned unchanged (those are reachable from anywhere
    /// without capture); a name found as anything else in an outer scope is captured as a new
    /// `Free` symbol in every scope between here and there.
    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.store.get(name) {
            return Some(symbol.clone());
        }

        let outer = self.outer.as_mut()?;
        let resolved = outer.resolve(name)?;

        match resolved.scope {
            SymbolScope::Global | SymbolScope::Builtin => Some(resolved),
            _ => Some(self.define_free(resolved)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn resolve_global() {
        let mut table = SymbolTable::new();
        table.define("a");
        table.define("b");

        assert_eq!(
            Some(Symbol {
                name: "a".into(),
                scope: SymbolScope::Global,
                index: 0
            }),
            table.resolve("a")
        );
        assert_eq!(
            Some(Symbol {
                name: "b".into(),
                scope: SymbolScope::Global,
                index: 1
            }),
            table.resolve("b")
        );
    }

    #[test]
    fn resolve_local() {
        let mut global = SymbolTable::new();
        global.define("a");
        let mut local = SymbolTable::new_enclosed(global);
        local.define("b");

        assert_eq!(SymbolScope::Global, local.resolve("a").unwrap().scope);
        assert_eq!(SymbolScope::Local, local.resolve("b").unwrap().scope);
    }

    #[test]
    fn resolve_nested_local() {
        let mut global = SymbolTable::new();
        global.define("a");
        let mut first = SymbolTable::new_enclosed(global);
        first.define("b");
        let mut second = SymbolTable::new_enclosed(first);
        second.define("c");

        assert_eq!(SymbolScope::Global, second.resolve("a").unwrap().scope);
        assert_eq!(0, second.resolve("a").unwrap().index);
        assert_eq!(1, second.resolve("c").unwrap().index);
    }

    #[test]
    fn resolve_free_variables_captures_across_one_level() {
        let mut global = SymbolTable::new();
        global.define("a");
        let mut first = SymbolTable::new_enclosed(global);
        first.define("b");
        let mut second = SymbolTable::new_enclosed(first);
        second.define("c");
        second.define("d");

        let c = second.resolve("c").unwrap();
        let d = second.resolve("d").unwrap();
        assert_eq!(SymbolScope::Local, c.scope);
        assert_eq!(SymbolScope::Local, d.scope);

        // "a" and "b" come from outside `second`'s immediate scope, so from `second`'s
        // perspective they must resolve as captured frees.
        let a = second.resolve("a").unwrap();
        let b = second.resolve("b").unwrap();
        assert_eq!(SymbolScope::Global, a.scope);
        assert_eq!(SymbolScope::Free, b.scope);
        assert_eq!(0, b.index);
        assert_eq!(vec!["b".to_string()], second.free_symbols().iter().map(|s| s.name.clone()).collect::<Vec<_>>());
    }

    #[test]
    fn define_and_resolve_builtins() {
        let mut global = SymbolTable::new();
        global.define_builtin(0, "len");
        let mut local = SymbolTable::new_enclosed(global);

        let resolved = local.resolve("len").unwrap();
        assert_eq!(SymbolScope::Builtin, resolved.scope);
        assert_eq!(0, resolved.index);
    }

    #[test]
    fn function_name_resolves_without_consuming_a_local_slot() {
        let mut table = SymbolTable::new();
        table.define_function_name("countDown");
        let resolved = table.resolve("countDown").unwrap();
        assert_eq!(SymbolScope::Function, resolved.scope);
        assert_eq!(0, table.num_definitions());
    }

    #[test]
    fn pop_returns_the_enclosing_scope() {
        let global = SymbolTable::new();
        let local = SymbolTable::new_enclosed(global);
        let global_again = local.pop();
        assert_eq!(0, global_again.num_definitions());
    }
}
