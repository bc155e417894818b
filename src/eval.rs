//! A tree-walking evaluator: the same language the VM runs, evaluated directly off the AST
//! without a compile step. Used by the `eval` engine of the `bench` binary and by anything that
//! wants to run a program without going through [crate::compiler]/[crate::vm].
//!
//! Unlike the VM, every error here is a language-level [Object::Error] value returned from
//! `eval`, not a host [crate::error::InterpretationError]: there is no separate "this should
//! never happen" channel in a tree walker, so type errors, unknown identifiers, and bad
//! arguments all come back the same way a Monkey program could inspect them.

use std::rc::Rc;

use crate::ast::{Block, Expression, Program, Statement};
use crate::environment::Environment;
use crate::object::{hash_key, is_truthy, type_name, values_equal, FunctionObject, HashPair, Object, ObjectRef};

pub fn eval_program(program: &Program, env: &Environment) -> ObjectRef {
    let mut result = Rc::new(Object::Null);

    for statement in &program.statements {
        result = eval_statement(statement, env);
        match result.as_ref() {
            Object::ReturnValue(value) => return Rc::clone(value),
            Object::Error(_) => return result,
            _ => {}
        }
    }

    result
}

fn eval_block(block: &Block, env: &Environment) -> ObjectRef {
    let mut result = Rc::new(Object::Null);

    for statement in &block.0 {
        result = eval_statement(statement, env);
        // Unlike eval_program, a ReturnValue here is left wrapped so it keeps propagating up
        // through any enclosing blocks until eval_program finally unwraps it.
        if matches!(result.as_ref(), Object::ReturnValue(_) | Object::Error(_)) {
            return result;
        }
    }

    result
}

fn eval_statement(statement: &Statement, env: &Environment) -> ObjectRef {
    match statement {
        Statement::Let { name, value } => {
            let value = eval_expression(value, env);
            if is_error(&value) {
                return value;
            }
            env.set(name, Rc::clone(&value));
            value
        }
        Statement::Return(expression) => {
            let value = eval_expression(expression, env);
            if is_error(&value) {
                return value;
            }
            Rc::new(Object::ReturnValue(value))
        }
        Statement::Expression(expression) => eval_expression(expression, env),
        Statement::Block(block) => eval_block(block, env),
    }
}

fn eval_expression(expression: &Expression, env: &Environment) -> ObjectRef {
    match expression {
        Expression::IntLit(value) => Rc::new(Object::Integer(*value)),
        Expression::StringLit(value) => Rc::new(Object::String(value.clone())),
        Expression::BoolLit(value) => Rc::new(Object::Boolean(*value)),
        Expression::Ident(name) => eval_identifier(name, env),
        Expression::Prefix { operator, right } => {
            let right = eval_expression(right, env);
            if is_error(&right) {
                return right;
            }
            eval_prefix_expression(operator, &right)
        }
        Expression::Infix { operator, left, right } => {
            let left = eval_expression(left, env);
            if is_error(&left) {
                return left;
            }
            let right = eval_expression(right, env);
            if is_error(&right) {
                return right;
            }
            eval_infix_expression(operator, &left, &right)
        }
        Expression::If {
            condition,
            consequence,
            alternative,
        } => eval_if_expression(condition, consequence, alternative.as_ref(), env),
        Expression::FnLit {
            parameters,
            body,
            name: _,
        } => Rc::new(Object::Function(Rc::new(FunctionObject {
            parameters: parameters.clone(),
            body: body.clone(),
            env: env.clone(),
        }))),
        Expression::Call { function, arguments } => {
            let function = eval_expression(function, env);
            if is_error(&function) {
                return function;
            }
            let arguments = match eval_expressions(arguments, env) {
                Ok(values) => values,
                Err(error) => return error,
            };
            apply_function(&function, &arguments)
        }
        Expression::ArrayLit(elements) => match eval_expressions(elements, env) {
            Ok(values) => Rc::new(Object::Array(values)),
            Err(error) => error,
        },
        Expression::HashLit(pairs) => eval_hash_literal(pairs, env),
        Expression::Index { left, index } => {
            let left = eval_expression(left, env);
            if is_error(&left) {
                return left;
            }
            let index = eval_expression(index, env);
            if is_error(&index) {
                return index;
            }
            eval_index_expression(&left, &index)
        }
    }
}

fn eval_expressions(expressions: &[Expression], env: &Environment) -> Result<Vec<ObjectRef>, ObjectRef> {
    let mut values = Vec::with_capacity(expressions.len());
    for expression in expressions {
        let value = eval_expression(expression, env);
        if is_error(&value) {
            return Err(value);
        }
        values.push(value);
    }
    Ok(values)
}

fn eval_identifier(name: &str, env: &Environment) -> ObjectRef {
    if let Some(value) = env.get(name) {
        return value;
    }
    if let Some(index) = crate::builtins::lookup(name) {
        return Rc::new(Object::Builtin(crate::builtins::BUILTINS[index].1));
    }
    error(format!("identifier not found: {name}"))
}

fn eval_prefix_expression(operator: &str, right: &Object) -> ObjectRef {
    match operator {
        "!" => Rc::new(Object::Boolean(!is_truthy(right))),
        "-" => match right {
            Object::Integer(value) => Rc::new(Object::Integer(-value)),
            other => error(format!("unknown operator: -{}", type_name(other))),
        },
        other => error(format!("unknown operator: {other}{}", type_name(right))),
    }
}

fn eval_infix_expression(operator: &str, left: &ObjectRef, right: &ObjectRef) -> ObjectRef {
    match (left.as_ref(), right.as_ref()) {
        (Object::Integer(a), Object::Integer(b)) => eval_integer_infix_expression(operator, *a, *b),
        (Object::String(a), Object::String(b)) if operator == "+" => {
            Rc::new(Object::String(format!("{a}{b}")))
        }
        _ if operator == "==" => Rc::new(Object::Boolean(values_equal(left, right))),
        _ if operator == "!=" => Rc::new(Object::Boolean(!values_equal(left, right))),
        (Object::String(_), Object::String(_)) => error(format!(
            "unknown operator: STRING {operator} STRING"
        )),
        (a, b) if type_name(a) != type_name(b) => error(format!(
            "type mismatch: {} {operator} {}",
            type_name(a),
            type_name(b)
        )),
        (a, b) => error(format!(
            "unknown operator: {} {operator} {}",
            type_name(a),
            type_name(b)
        )),
    }
}

fn eval_integer_infix_expression(operator: &str, a: i64, b: i64) -> ObjectRef {
    match operator {
        "+" => Rc::new(Object::Integer(a.wrapping_add(b))),
        "-" => Rc::new(Object::Integer(a.wrapping_sub(b))),
        "*" => Rc::new(Object::Integer(a.wrapping_mul(b))),
        "/" => {
            if b == 0 {
                error("division by zero".to_string())
            } else {
                Rc::new(Object::Integer(a / b))
            }
        }
        "<" => Rc::new(Object::Boolean(a < b)),
        ">" => Rc::new(Object::Boolean(a > b)),
        "==" => Rc::new(Object::Boolean(a == b)),
        "!=" => Rc::new(Object::Boolean(a != b)),
        other => error(format!("unknown operator: INTEGER {other} INTEGER")),
    }
}

fn eval_if_expression(
    condition: &Expression,
    consequence: &Block,
    alternative: Option<&Block>,
    env: &Environment,
) -> ObjectRef {
    let condition = eval_expression(condition, env);
    if is_error(&condition) {
        return condition;
    }

    if is_truthy(&condition) {
        eval_block(consequence, env)
    } else if let Some(alternative) = alternative {
        eval_block(alternative, env)
    } else {
        Rc::new(Object::Null)
    }
}

fn eval_hash_literal(pairs: &[(Expression, Expression)], env: &Environment) -> ObjectRef {
    let mut table = std::collections::HashMap::with_capacity(pairs.len());

    for (key_expr, value_expr) in pairs {
        let key = eval_expression(key_expr, env);
        if is_error(&key) {
            return key;
        }
        let value = eval_expression(value_expr, env);
        if is_error(&value) {
            return value;
        }

        let hashed = match hash_key(&key) {
            Ok(hashed) => hashed,
            Err(message) => return error(message),
        };
        table.insert(hashed, HashPair { key, value });
    }

    Rc::new(Object::Hash(table))
}

fn eval_index_expression(left: &ObjectRef, index: &ObjectRef) -> ObjectRef {
    match (left.as_ref(), index.as_ref()) {
        (Object::Array(elements), Object::Integer(i)) => {
            if *i < 0 || *i as usize >= elements.len() {
                Rc::new(Object::Null)
            } else {
                Rc::clone(&elements[*i as usize])
            }
        }
        (Object::Hash(pairs), key) => match hash_key(key) {
            Ok(hashed) => pairs
                .get(&hashed)
                .map(|pair| Rc::clone(&pair.value))
                .unwrap_or_else(|| Rc::new(Object::Null)),
            Err(message) => error(message),
        },
        (other, _) => error(format!("index operator not supported: {}", type_name(other))),
    }
}

fn apply_function(function: &ObjectRef, arguments: &[ObjectRef]) -> ObjectRef {
    match function.as_ref() {
        Object::Function(function) => {
            if arguments.len() != function.parameters.len() {
                return error(format!(
                    "wrong number of arguments: want={}, got={}",
                    function.parameters.len(),
                    arguments.len()
                ));
            }
            let call_env = Environment::enclosed(function.env.clone());
            for (parameter, argument) in function.parameters.iter().zip(arguments) {
                call_env.set(parameter, Rc::clone(argument));
            }
            let result = eval_block(&function.body, &call_env);
            match result.as_ref() {
                Object::ReturnValue(value) => Rc::clone(value),
                _ => result,
            }
        }
        Object::Builtin(builtin_fn) => builtin_fn(arguments),
        other => error(format!("not a function: {}", type_name(other))),
    }
}

fn is_error(object: &ObjectRef) -> bool {
    matches!(object.as_ref(), Object::Error(_))
}

fn error(message: String) -> ObjectRef {
    Rc::new(Object::Error(message))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Parser;

    fn eval(input: &str) -> ObjectRef {
        let mut parser = Parser::new(input);
        let program = parser.parse_program();
        assert!(parser.errors().is_empty(), "{:?}", parser.errors());
        let env = Environment::new();
        eval_program(&program, &env)
    }

    fn expect_int(object: &ObjectRef, expected: i64) {
        match object.as_ref() {
            Object::Integer(value) => assert_eq!(expected, *value),
            other => panic!("expected Integer({expected}), got {:?}", other),
        }
    }

    #[test]
    fn integer_arithmetic() {
        expect_int(&eval("5 + 5 * 2 - 10 / 2"), 10);
    }

    #[test]
    fn recursive_functions_via_let_bound_name() {
        expect_int(
            &eval(
                "let fact = fn(n) { if (n == 0) { 1 } else { n * fact(n - 1) } }; fact(5);",
            ),
            120,
        );
    }

    #[test]
    fn closures_capture_their_defining_environment() {
        expect_int(
            &eval(
                "let newAdder = fn(x) { fn(y) { x + y }; }; \
                 let addTwo = newAdder(2); addTwo(3);",
            ),
            5,
        );
    }

    #[test]
    fn early_return_stops_executing_remaining_statements() {
        expect_int(
            &eval("if (10 > 1) { if (10 > 1) { return 10; } return 1; }"),
            10,
        );
    }

    #[test]
    fn error_values_short_circuit_evaluation() {
        match eval("5 + true; 5;").as_ref() {
            Object::Error(message) => assert_eq!("type mismatch: INTEGER + BOOLEAN", message),
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_identifier_is_an_error() {
        match eval("foobar;").as_ref() {
            Object::Error(message) => assert_eq!("identifier not found: foobar", message),
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[test]
    fn builtins_are_reachable_from_the_evaluator() {
        expect_int(&eval(r#"len("four")"#), 4);
    }

    #[test]
    fn array_and_hash_indexing() {
        expect_int(&eval("[1, 2, 3][1]"), 2);
        expect_int(&eval("{\"a\": 5}[\"a\"]"), 5);
        assert!(matches!(eval("[1, 2, 3][10]").as_ref(), Object::Null));
    }
}
