//! The fixed set of built-in functions, shared by the VM (resolved via `OpGetBuiltin`) and the
//! tree-walking evaluator (resolved when environment lookup misses).
//!
//! Order matters: a symbol's `Builtin` index is its position in [BUILTINS], and `OpGetBuiltin`
//! addresses built-ins by that index.

use std::rc::Rc;

use crate::object::{type_name, BuiltinFn, Object, ObjectRef};

pub const BUILTINS: &[(&str, BuiltinFn)] = &[
    ("len", builtin_len),
    ("puts", builtin_puts),
    ("first", builtin_first),
    ("last", builtin_last),
    ("rest", builtin_rest),
    ("push", builtin_push),
];

/// Looks up a built-in's index by name, for use by the tree-walking evaluator.
pub fn lookup(name: &str) -> Option<usize> {
    BUILTINS.iter().position(|(builtin_name, _)| *builtin_name == name)
}

fn error(message: String) -> ObjectRef {
    Rc::new(Object::Error(message))
}

fn wrong_arity(got: usize, want: usize) -> ObjectRef {
    error(format!("wrong number of arguments. got={got}, want={want}"))
}

fn builtin_len(args: &[ObjectRef]) -> ObjectRef {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match args[0].as_ref() {
        Object::String(value) => Rc::new(Object::Integer(value.len() as i64)),
        Object::Array(elements) => Rc::new(Object::Integer(elements.len() as i64)),
        other => error(format!(
            "argument to \"len\" not supported, got {}",
            type_name(other)
        )),
    }
}

fn builtin_puts(args: &[ObjectRef]) -> ObjectRef {
    for arg in args {
        println!("{}", crate::object::inspect(arg));
    }
    Rc::new(Object::Null)
}

fn builtin_first(args: &[ObjectRef]) -> ObjectRef {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match args[0].as_ref() {
        Object::Array(elements) => elements.first().cloned().unwrap_or_else(|| Rc::new(Object::Null)),
        other => error(format!(
            "argument to \"first\" must be ARRAY, got {}",
            type_name(other)
        )),
    }
}

fn builtin_last(args: &[ObjectRef]) -> ObjectRef {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match args[0].as_ref() {
        Object::Array(elements) => elements.last().cloned().unwrap_or_else(|| Rc::new(Object::Null)),
        other => error(format!(
            "argument to \"last\" must be ARRAY, got {}",
            type_name(other)
        )),
    }
}

fn builtin_rest(args: &[ObjectRef]) -> ObjectRef {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match args[0].as_ref() {
        Object::Array(elements) => {
            if elements.is_empty() {
                Rc::new(Object::Null)
            } else {
                Rc::new(Object::Array(elements[1..].to_vec()))
            }
        }
        other => error(format!(
            "argument to \"rest\" must be ARRAY, got {}",
            type_name(other)
        )),
    }
}

fn builtin_push(args: &[ObjectRef]) -> ObjectRef {
    if args.len() != 2 {
        return wrong_arity(args.len(), 2);
    }
    match args[0].as_ref() {
        Object::Array(elements) => {
            let mut new_elements = elements.clone();
            new_elements.push(Rc::clone(&args[1]));
            Rc::new(Object::Array(new_elements))
        }
        other => error(format!(
            "argument to \"push\" must be ARRAY, got {}",
            type_name(other)
        )),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn len_of_string_and_array() {
        assert_eq!(
            3,
            match builtin_len(&[Rc::new(Object::String("abc".into()))]).as_ref() {
                Object::Integer(n) => *n,
                other => panic!("{:?}", other),
            }
        );
        assert_eq!(
            2,
            match builtin_len(&[Rc::new(Object::Array(vec![
                Rc::new(Object::Integer(1)),
                Rc::new(Object::Integer(2))
            ]))])
            .as_ref()
            {
                Object::Integer(n) => *n,
                other => panic!("{:?}", other),
            }
        );
    }

    #[test]
    fn len_rejects_unsupported_types() {
        match builtin_len(&[Rc::new(Object::Integer(1))]).as_ref() {
            Object::Error(message) => {
                assert_eq!("argument to \"len\" not supported, got INTEGER", message)
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn push_does_not_mutate_the_original_array() {
        let original = Rc::new(Object::Array(vec![Rc::new(Object::Integer(1))]));
        let pushed = builtin_push(&[Rc::clone(&original), Rc::new(Object::Integer(2))]);

        match original.as_ref() {
            Object::Array(elements) => assert_eq!(1, elements.len()),
            other => panic!("{:?}", other),
        }
        match pushed.as_ref() {
            Object::Array(elements) => assert_eq!(2, elements.len()),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn rest_of_empty_array_is_null() {
        let result = builtin_rest(&[Rc::new(Object::Array(vec![]))]);
        assert!(matches!(result.as_ref(), Object::Null));
    }

    #[test]
    fn builtin_order_matches_get_builtin_operand_indices() {
        assert_eq!(Some(0), lookup("len"));
        assert_eq!(Some(5), lookup("push"));
        assert_eq!(None, lookup("nonexistent"));
    }
}
