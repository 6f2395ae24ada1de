//! Lumen JavaScript Runtime
//!
//! QuickJS-based script host for Lumen documents.
//!
//! Features:
//! - QuickJS runtime via rquickjs
//! - Console API (log, info, warn, error, debug)
//! - `alert`/`log` output capture
//! - [`ScriptHost`](lumen_dom::ScriptHost) implementation with global and
//!   isolated script scopes

mod console;
mod runtime;

pub use console::OutputLog;
pub use runtime::JsRuntime;

/// Execute JavaScript code in a fresh runtime
pub fn eval(code: &str) -> Result<JsValue, JsError> {
    let runtime = JsRuntime::new()?;
    runtime.eval(code)
}

/// JavaScript value
#[derive(Debug, Clone, PartialEq)]
pub enum JsValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object,
    Array,
    Function,
}

/// JavaScript error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JsError {
    #[error("JavaScript error: {0}")]
    Runtime(String),

    #[error("SyntaxError: {0}")]
    Syntax(String),

    #[error("ReferenceError: {0}")]
    Reference(String),

    #[error("TypeError: {0}")]
    Type(String),
}
