//! JavaScript Runtime
//!
//! One QuickJS runtime and context per [`JsRuntime`]. Global scripts share
//! the context's global object, so their declarations stay visible to
//! later scripts; isolated scripts run inside a function scope.

use std::sync::Arc;

use lumen_dom::{Document, PendingScript, ScriptError, ScriptHost, ScriptScope};
use rquickjs::context::EvalOptions;
use rquickjs::function::This;
use rquickjs::{CatchResultExt, CaughtError, Context, Ctx, Runtime, Value};

use crate::console::{self, OutputLog};
use crate::{JsError, JsValue};

/// Heap limit for a runtime
const MEMORY_LIMIT: usize = 32 * 1024 * 1024;

/// Sloppy function whose direct `eval` keeps declarations in its own scope
const ISOLATED_RUNNER: &str = "(function () { eval(arguments[0]); })";

/// QuickJS runtime wrapper. The context keeps its runtime alive.
pub struct JsRuntime {
    context: Context,
    output: OutputLog,
}

impl JsRuntime {
    /// Create a new JavaScript runtime with `console`, `alert` and `log` installed
    pub fn new() -> Result<Self, JsError> {
        tracing::debug!("Creating JavaScript runtime");
        let runtime = Runtime::new().map_err(|e| JsError::Runtime(e.to_string()))?;
        runtime.set_memory_limit(MEMORY_LIMIT);

        let context = Context::full(&runtime).map_err(|e| JsError::Runtime(e.to_string()))?;
        let output = OutputLog::default();

        context.with(|ctx| {
            console::install_console(&ctx).map_err(|e| JsError::Runtime(e.to_string()))?;
            console::install_output(&ctx, Arc::clone(&output)).map_err(|e| JsError::Runtime(e.to_string()))?;
            Ok::<_, JsError>(())
        })?;

        Ok(Self {
            context,
            output,
        })
    }

    /// Shared handle to everything written through `alert`/`log`
    pub fn output(&self) -> OutputLog {
        Arc::clone(&self.output)
    }

    /// Drain the output written so far
    pub fn take_output(&self) -> Vec<String> {
        self.output
            .lock()
            .map(|mut lines| std::mem::take(&mut *lines))
            .unwrap_or_default()
    }

    /// Evaluate JavaScript code in the global scope
    pub fn eval(&self, code: &str) -> Result<JsValue, JsError> {
        self.context.with(|ctx| {
            let result = eval_script(&ctx, code)?;
            convert_value(&result)
        })
    }

    /// Execute JavaScript in the global scope (ignore result)
    pub fn exec(&self, code: &str) -> Result<(), JsError> {
        self.context.with(|ctx| eval_script(&ctx, code).map(|_| ()))
    }

    /// Execute JavaScript inside its own function scope: `var` and function
    /// declarations do not become globals. The source goes through a
    /// direct `eval`, so it is parsed as a complete Script on its own.
    pub fn exec_isolated(&self, code: &str) -> Result<(), JsError> {
        self.context.with(|ctx| {
            let runner = eval_script(&ctx, ISOLATED_RUNNER)?
                .into_function()
                .ok_or_else(|| JsError::Runtime("isolated runner is not a function".to_string()))?;
            runner
                .call::<_, Value>((This(ctx.globals()), code))
                .catch(&ctx)
                .map(|_| ())
                .map_err(convert_error)
        })
    }
}

/// Sloppy-mode global script evaluation, as a classic `<script>` runs
fn eval_script<'js>(ctx: &Ctx<'js>, code: &str) -> Result<Value<'js>, JsError> {
    let mut options = EvalOptions::default();
    options.global = true;
    options.strict = false;
    ctx.eval_with_options(code, options)
        .catch(ctx)
        .map_err(convert_error)
}

/// Map a caught QuickJS error onto [`JsError`] by exception name
fn convert_error(error: CaughtError<'_>) -> JsError {
    match error {
        CaughtError::Exception(exception) => {
            let message = exception.message().unwrap_or_default();
            let name: Option<String> = exception.get("name").ok();
            match name.as_deref() {
                Some("SyntaxError") => JsError::Syntax(message),
                Some("ReferenceError") => JsError::Reference(message),
                Some("TypeError") => JsError::Type(message),
                _ => JsError::Runtime(message),
            }
        }
        CaughtError::Value(value) => {
            let mut message = String::new();
            console::format_value(&mut message, &value);
            JsError::Runtime(format!("uncaught {message}"))
        }
        CaughtError::Error(error) => JsError::Runtime(error.to_string()),
    }
}

/// Convert a QuickJS value into a [`JsValue`]
pub(crate) fn convert_value(value: &Value) -> Result<JsValue, JsError> {
    let converted = if value.is_undefined() {
        JsValue::Undefined
    } else if value.is_null() {
        JsValue::Null
    } else if let Some(b) = value.as_bool() {
        JsValue::Bool(b)
    } else if let Some(n) = value.as_int() {
        JsValue::Number(f64::from(n))
    } else if let Some(n) = value.as_float() {
        JsValue::Number(n)
    } else if let Some(s) = value.as_string() {
        JsValue::String(s.to_string().map_err(|e| JsError::Runtime(e.to_string()))?)
    } else if value.is_array() {
        JsValue::Array
    } else if value.is_function() {
        JsValue::Function
    } else if value.is_object() {
        JsValue::Object
    } else {
        JsValue::Undefined
    };
    Ok(converted)
}

impl ScriptHost for JsRuntime {
    fn execute(&mut self, _document: &mut Document, script: &PendingScript) -> Result<(), ScriptError> {
        let result = match script.scope {
            ScriptScope::Global => self.exec(&script.source),
            ScriptScope::Isolated => self.exec_isolated(&script.source),
        };
        result.map_err(|e| ScriptError::Runtime(e.to_string()))
    }
}
