//! Script statement grammar.
//!
//! A script is line-oriented: every non-blank line that does not start with
//! `#` holds exactly one statement. The first word selects one of seven
//! statement kinds, each with a fixed argument grammar:
//!
//! ```text
//! set <name> = <value-token>
//! template <name> = <string>
//! prompt <name> = <string>
//! message <role> = <string>
//! call <tool> into <var> [with <json-object | var>]
//! print <expr>
//! generate <name>
//! ```

use serde_json::{Map, Value as JsonValue};

use crate::error::ScriptError;
use crate::value::strip_quotes;

/// Arguments attached to a `call` statement.
#[derive(Debug, Clone, PartialEq)]
pub enum CallArgs {
    /// `with {"task_id": "t-1"}`
    Inline(Map<String, JsonValue>),
    /// `with args` -- resolved against the variable store at execution time.
    Variable(String),
}

/// One parsed script statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Raw value token; parsed against the variables when executed.
    Set { name: String, value: String },
    /// Unrendered template text, quotes already stripped.
    Template { name: String, text: String },
    /// Literal prompt text, quotes already stripped, never rendered.
    Prompt { name: String, text: String },
    /// Message content, quotes already stripped, rendered when executed.
    Message { role: String, content: String },
    Call {
        tool: String,
        target: String,
        args: Option<CallArgs>,
    },
    /// Variable name, template name, or literal text.
    Print { expr: String },
    /// Raw target text; see [`generate_target`].
    Generate { target: String },
}

impl Statement {
    /// Parse a single trimmed, non-comment script line.
    pub fn parse(line: &str) -> Result<Self, ScriptError> {
        let line = line.trim();
        let Some((keyword, rest)) = line.split_once(char::is_whitespace) else {
            return Err(ScriptError::validation("unsupported statement"));
        };
        let rest = rest.trim_start();

        match keyword {
            "set" => {
                let (name, value) = assignment(rest).ok_or_else(|| syntax("set"))?;
                Ok(Self::Set {
                    name: name.to_string(),
                    value: value.to_string(),
                })
            }
            "template" => {
                let (name, text) = assignment(rest).ok_or_else(|| syntax("template"))?;
                Ok(Self::Template {
                    name: name.to_string(),
                    text: strip_quotes(text).to_string(),
                })
            }
            "prompt" => {
                let (name, text) = assignment(rest).ok_or_else(|| syntax("prompt"))?;
                Ok(Self::Prompt {
                    name: name.to_string(),
                    text: strip_quotes(text).to_string(),
                })
            }
            "message" => {
                let (role, content) = assignment(rest).ok_or_else(|| syntax("message"))?;
                Ok(Self::Message {
                    role: role.to_string(),
                    content: strip_quotes(content).to_string(),
                })
            }
            "call" => parse_call(rest),
            "print" => {
                if rest.is_empty() {
                    return Err(syntax("print"));
                }
                Ok(Self::Print {
                    expr: rest.to_string(),
                })
            }
            "generate" => Ok(Self::Generate {
                target: rest.to_string(),
            }),
            _ => Err(ScriptError::validation("unsupported statement")),
        }
    }

    /// Leading keyword, for logging.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::Template { .. } => "template",
            Self::Prompt { .. } => "prompt",
            Self::Message { .. } => "message",
            Self::Call { .. } => "call",
            Self::Print { .. } => "print",
            Self::Generate { .. } => "generate",
        }
    }
}

/// Check that a `generate` target is a single identifier.
///
/// Kept out of [`Statement::parse`] so a disabled `generate` reports the
/// disabled feature before any syntax problem.
pub fn generate_target(raw: &str) -> Result<&str, ScriptError> {
    match identifier(raw) {
        Some((target, "")) => Ok(target),
        _ => Err(syntax("generate")),
    }
}

fn syntax(keyword: &str) -> ScriptError {
    ScriptError::validation(format!("invalid {keyword} syntax"))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Split a leading identifier off `input`; the remainder is left-trimmed.
fn identifier(input: &str) -> Option<(&str, &str)> {
    let end = input.find(|c: char| !is_word_char(c)).unwrap_or(input.len());
    if end == 0 {
        return None;
    }
    Some((&input[..end], input[end..].trim_start()))
}

/// `<ident> = <non-empty rest>`
fn assignment(input: &str) -> Option<(&str, &str)> {
    let (name, rest) = identifier(input)?;
    let value = rest.strip_prefix('=')?.trim();
    if value.is_empty() {
        return None;
    }
    Some((name, value))
}

/// Match a keyword followed by whitespace (or end of input).
fn keyword<'a>(input: &'a str, word: &str) -> Option<&'a str> {
    let rest = input.strip_prefix(word)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.starts_with(char::is_whitespace)
        .then(|| rest.trim_start())
}

fn parse_call(rest: &str) -> Result<Statement, ScriptError> {
    let (tool, rest) = identifier(rest).ok_or_else(|| syntax("call"))?;
    let rest = keyword(rest, "into").ok_or_else(|| syntax("call"))?;
    let (target, rest) = identifier(rest).ok_or_else(|| syntax("call"))?;

    let args = if rest.is_empty() {
        None
    } else {
        let blob = keyword(rest, "with")
            .filter(|blob| !blob.is_empty())
            .ok_or_else(|| syntax("call"))?;
        Some(parse_call_args(blob)?)
    };

    Ok(Statement::Call {
        tool: tool.to_string(),
        target: target.to_string(),
        args,
    })
}

fn parse_call_args(blob: &str) -> Result<CallArgs, ScriptError> {
    if blob.starts_with('{') {
        let map: Map<String, JsonValue> = serde_json::from_str(blob)
            .map_err(|e| ScriptError::validation(format!("invalid call arguments: {e}")))?;
        return Ok(CallArgs::Inline(map));
    }
    match identifier(blob) {
        Some((name, "")) => Ok(CallArgs::Variable(name.to_string())),
        _ => Err(syntax("call")),
    }
}
