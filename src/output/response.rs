//! The JSON envelope printed on stdout by every subcommand.
//!
//! Success: `{"success": true, "data": ...}`. Failure:
//! `{"success": false, "error": {"code", "message", "details", "hints"?}}`.
//! The process exit code is chosen from the error code's family.

use std::io::{ErrorKind, Write};

use asset_rename::error::Hint;
use asset_rename::{Error, Result};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody<'a>>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: &'a str,
    details: &'a Value,
    #[serde(skip_serializing_if = "no_hints")]
    hints: &'a [Hint],
}

fn no_hints(hints: &&[Hint]) -> bool {
    hints.is_empty()
}

impl<'a> Envelope<'a> {
    fn of(result: &'a Result<Value>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(err) => Self {
                success: false,
                data: None,
                error: Some(ErrorBody {
                    code: err.code.as_str(),
                    message: &err.message,
                    details: &err.details,
                    hints: &err.hints,
                }),
            },
        }
    }
}

/// Turn a handler's typed output into JSON, keeping the handler's exit
/// code. Errors take the exit code of their family.
pub fn map_cmd_result_to_json<T: Serialize>(result: Result<(T, i32)>) -> (Result<Value>, i32) {
    match result {
        Ok((data, exit_code)) => serde_json::to_value(data)
            .map(|value| (Ok(value), exit_code))
            .unwrap_or_else(|e| {
                let err = Error::internal_json(e.to_string(), Some("serialize output".to_string()));
                (Err(err), 1)
            }),
        Err(err) => {
            let exit_code = exit_code_for(&err);
            (Err(err), exit_code)
        }
    }
}

/// bad input 2, name space exhausted 3, missing path or mapping 4, anything
/// internal 1.
fn exit_code_for(err: &Error) -> i32 {
    let family = err.code.as_str().split('.').next().unwrap_or_default();
    match family {
        "validation" | "config" => 2,
        "naming" => 3,
        "path" | "mapping" => 4,
        _ => 1,
    }
}

pub fn print_json_result(result: Result<Value>) -> Result<()> {
    let payload = serde_json::to_string_pretty(&Envelope::of(&result))
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize output".to_string())))?;

    let mut stdout = std::io::stdout().lock();
    match writeln!(stdout, "{}", payload) {
        // A closed pipe (`| head`) is not an error worth reporting.
        Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(Error::internal_io(
            e.to_string(),
            Some("write stdout".to_string()),
        )),
        _ => Ok(()),
    }
}
