//! Runtime values shared by the VM and the tree-walking evaluator.
//!
//! Values are never mutated in place once built: arrays and hashes are immutable, so sharing an
//! [ObjectRef] between the stack, a closure's free variables, and a container is always safe.
//! Reference counting is sufficient because the language has no way to construct a cycle.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::Block;
use crate::code::Instructions;
use crate::environment::Environment;

/// Values are always passed around behind a reference count; cloning an [ObjectRef] is cheap
/// and does not duplicate the underlying value.
pub type ObjectRef = Rc<Object>;

/// A function as compiled to bytecode: a flat instruction stream plus its local/parameter counts.
#[derive(Debug, PartialEq)]
pub struct CompiledFunction {
    pub instructions: Instructions,
    pub num_locals: usize,
    pub num_parameters: usize,
}

/// A compiled function paired with the values it captured from enclosing scopes.
#[derive(Debug)]
pub struct Closure {
    pub function: Rc<CompiledFunction>,
    pub free: Vec<ObjectRef>,
}

/// A built-in function. Built-ins validate their own arity and argument types, returning an
/// [Object::Error] value rather than panicking on misuse.
pub type BuiltinFn = fn(&[ObjectRef]) -> ObjectRef;

/// A function as produced by the tree-walking evaluator: its own AST plus the environment it
/// closed over. The compiled path never constructs this; it builds [CompiledFunction]/[Closure]
/// instead.
#[derive(Debug)]
pub struct FunctionObject {
    pub parameters: Vec<String>,
    pub body: Block,
    pub env: Environment,
}

#[derive(Debug)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    String(String),
    Null,
    Array(Vec<ObjectRef>),
    Hash(HashMap<HashKey, HashPair>),
    CompiledFunction(Rc<CompiledFunction>),
    Closure(Rc<Closure>),
    Function(Rc<FunctionObject>),
    Builtin(BuiltinFn),
    Error(String),
    /// Wraps a value being unwound out of nested blocks. Used only by the tree-walking
    /// evaluator; the compiled VM returns via opcodes and never produces this variant.
    ReturnValue(ObjectRef),
}

/// A hash table entry keeps the original key object around (for [inspect]) alongside the value.
#[derive(Debug, Clone)]
pub struct HashPair {
    pub key: ObjectRef,
    pub value: ObjectRef,
}

/// The hashable projection of a value: `(type tag, 64-bit payload)`.
///
/// Only [Object::Integer], [Object::Boolean], and [Object::String] are hashable; anything else
/// passed to [hash_key] yields an error naming the offending type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    kind: HashKeyKind,
    value: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum HashKeyKind {
    Integer,
    Boolean,
    String,
}

/// Computes the [HashKey] for a value, or an error message naming the type if it can't be
/// used as a hash key.
pub fn hash_key(object: &Object) -> Result<HashKey, String> {
    match object {
        Object::Integer(value) => Ok(HashKey {
            kind: HashKeyKind::Integer,
            value: *value as u64,
        }),
        Object::Boolean(value) => Ok(HashKey {
            kind: HashKeyKind::Boolean,
            value: *value as u64,
        }),
        Object::String(value) => Ok(HashKey {
            kind: HashKeyKind::String,
            value: fnv1a(value.as_bytes()),
        }),
        other => Err(format!("unusable as hash key: {}", type_name(other))),
    }
}

/// FNV-1a, 64-bit. A small, well-known non-cryptographic hash; not worth pulling in a crate
/// for three lines of bit-twiddling.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// The type name used in error messages (`unusable as hash key: ARRAY`, etc).
pub fn type_name(object: &Object) -> &'static str {
    match object {
        Object::Integer(_) => "INTEGER",
        Object::Boolean(_) => "BOOLEAN",
        Object::String(_) => "STRING",
        Object::Null => "NULL",
        Object::Array(_) => "ARRAY",
        Object::Hash(_) => "HASH",
        Object::CompiledFunction(_) => "COMPILED_FUNCTION_OBJ",
        Object::Closure(_) => "CLOSURE",
        Object::Function(_) => "FUNCTION",
        Object::Builtin(_) => "BUILTIN",
        Object::Error(_) => "ERROR",
        Object::ReturnValue(_) => "RETURN_VALUE",
    }
}

/// `null` and `false` are falsy; every other value, including integer `0`, is truthy.
pub fn is_truthy(object: &Object) -> bool {
    !matches!(object, Object::Null | Object::Boolean(false))
}

/// Equality as used by `==`/`!=`: numeric for integers, by-value for booleans and null,
/// pointer-identity otherwise — including strings, which compare equal only if they're the
/// same `Rc`, not merely equal content. Pointer-identity is correct for booleans too since they
/// are interned by the VM, but comparing by value is simpler and strictly equivalent.
pub fn values_equal(left: &ObjectRef, right: &ObjectRef) -> bool {
    match (left.as_ref(), right.as_ref()) {
        (Object::Integer(a), Object::Integer(b)) => a == b,
        (Object::Boolean(a), Object::Boolean(b)) => a == b,
        (Object::Null, Object::Null) => true,
        _ => Rc::ptr_eq(left, right),
    }
}

/// A human-readable rendering of a value, used by `puts` and the REPL.
pub fn inspect(object: &Object) -> String {
    match object {
        Object::Integer(value) => value.to_string(),
        Object::Boolean(value) => value.to_string(),
        Object::String(value) => value.clone(),
        Object::Null => "null".to_string(),
        Object::Array(elements) => {
            let items: Vec<String> = elements.iter().map(|e| inspect(e)).collect();
            format!("[{}]", items.join(", "))
        }
        Object::Hash(pairs) => {
            let items: Vec<String> = pairs
                .values()
                .map(|pair| format!("{}: {}", inspect(&pair.key), inspect(&pair.value)))
                .collect();
            format!("{{{}}}", items.join(", "))
        }
        Object::CompiledFunction(_) => "CompiledFunction[..]".to_string(),
        Object::Closure(closure) => format!("Closure[{:p}]", Rc::as_ptr(&closure.function)),
        Object::Function(function) => {
            let params = function.parameters.join(", ");
            format!("fn({params}) {{\n..\n}}")
        }
        Object::Builtin(_) => "builtin function".to_string(),
        Object::Error(message) => format!("ERROR: {message}"),
        Object::ReturnValue(inner) => inspect(inner),
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", inspect(self))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn string_hash_keys_with_equal_content_are_equal() {
        let a = hash_key(&Object::String("name".to_string())).unwrap();
        let b = hash_key(&Object::String("name".to_string())).unwrap();
        let c = hash_key(&Object::String("other".to_string())).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn integer_and_boolean_and_string_keys_dont_collide_by_kind() {
        let int_key = hash_key(&Object::Integer(1)).unwrap();
        let bool_key = hash_key(&Object::Boolean(true)).unwrap();
        assert_ne!(int_key, bool_key);
    }

    #[test]
    fn arrays_are_not_hashable() {
        let err = hash_key(&Object::Array(vec![])).unwrap_err();
        assert_eq!("unusable as hash key: ARRAY", err);
    }

    #[test]
    fn falsy_values() {
        assert!(!is_truthy(&Object::Null));
        assert!(!is_truthy(&Object::Boolean(false)));
        assert!(is_truthy(&Object::Boolean(true)));
        assert!(is_truthy(&Object::Integer(0)));
    }
}
