//! Console API
//!
//! Implements console.log, console.warn, console.error, etc., plus the
//! `alert`/`log` output globals scripts use to report results.

use std::fmt::Write;
use std::sync::{Arc, Mutex};

use rquickjs::function::Rest;
use rquickjs::{Ctx, Function, Object, Value};

/// Lines written through `alert`/`log`
pub type OutputLog = Arc<Mutex<Vec<String>>>;

/// Install console API into the global object
pub fn install_console(ctx: &Ctx) -> Result<(), rquickjs::Error> {
    let globals = ctx.globals();

    let console = Object::new(ctx.clone())?;

    for level in ["log", "info", "warn", "error", "debug"] {
        console.set(
            level,
            Function::new(ctx.clone(), move |args: Rest<Value>| {
                log_with_level(level, &args.0);
                Ok::<(), rquickjs::Error>(())
            })?,
        )?;
    }

    globals.set("console", console)?;

    Ok(())
}

/// Install `alert(...)` and `log(...)`, both appending one line to `output`
pub fn install_output(ctx: &Ctx, output: OutputLog) -> Result<(), rquickjs::Error> {
    let globals = ctx.globals();

    for name in ["alert", "log"] {
        let sink = Arc::clone(&output);
        globals.set(
            name,
            Function::new(ctx.clone(), move |args: Rest<Value>| {
                let line = format_values(&args.0);
                tracing::debug!("[JS {}] {}", name, line);
                if let Ok(mut lines) = sink.lock() {
                    lines.push(line);
                }
                Ok::<(), rquickjs::Error>(())
            })?,
        )?;
    }

    Ok(())
}

/// Log values with a specific level
fn log_with_level(level: &str, values: &[Value]) {
    let output = format_values(values);

    match level {
        "error" => tracing::error!("[JS] {}", output),
        "warn" => tracing::warn!("[JS] {}", output),
        "debug" => tracing::debug!("[JS] {}", output),
        _ => tracing::info!("[JS] {}", output),
    }
}

/// Space-separated rendering of several values
pub(crate) fn format_values(values: &[Value]) -> String {
    let mut output = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            output.push(' ');
        }
        format_value(&mut output, value);
    }
    output
}

/// Format a JavaScript value for logging
pub(crate) fn format_value(out: &mut String, value: &Value) {
    if value.is_undefined() {
        out.push_str("undefined");
    } else if value.is_null() {
        out.push_str("null");
    } else if let Some(b) = value.as_bool() {
        write!(out, "{}", b).ok();
    } else if let Some(n) = value.as_int() {
        write!(out, "{}", n).ok();
    } else if let Some(n) = value.as_float() {
        write!(out, "{}", n).ok();
    } else if let Some(s) = value.as_string() {
        if let Ok(s) = s.to_string() {
            out.push_str(&s);
        }
    } else if value.is_array() {
        out.push_str("[Array]");
    } else if value.is_function() {
        out.push_str("[Function]");
    } else if value.is_object() {
        out.push_str("[Object]");
    } else {
        out.push_str("[unknown]");
    }
}
