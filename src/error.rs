//! Provides [InterpretationError], the error that most things return.
use thiserror::Error;

/// Any error that can occur during interpretation.
#[derive(Debug, Error)]
pub enum InterpretationError {
    /// A compile-time error: a name that never resolves, a malformed hash literal, and so on.
    /// Parse errors are accumulated separately on [crate::parser::Parser] and are not represented
    /// by this variant.
    #[error("{0}")]
    Compile(String),
    /// A host-level runtime error: a type error, a stack overflow, division by zero, calling a
    /// non-callable value. Distinct from an [crate::object::Object::Error] value, which is a
    /// language-level error a running program can produce, inspect, and recover from.
    #[error("{0}")]
    Runtime(String),
}
