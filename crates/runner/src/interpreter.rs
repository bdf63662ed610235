//! Line-by-line script execution.
//!
//! Every statement runs to completion before the next line is read. A failing
//! statement is recorded as `"<line>: <message>"` and execution carries on
//! with the following line; nothing short of the end of the script stops a
//! run.

use std::collections::HashMap;

use genail_core::error::ScriptError;
use genail_core::output::OutputBuffer;
use genail_core::result::ExecutionResult;
use genail_core::statement::{generate_target, CallArgs, Statement};
use genail_core::template::render;
use genail_core::value::{parse_value, strip_quotes, Value, Variables};
use genail_tools::generation::{ChatMessage, TextGenerator};
use genail_tools::registry::ToolRegistry;
use genail_tools::transport::Transport;
use serde_json::{Map, Value as JsonValue};

/// Owns all mutable state of one script execution.
pub struct Interpreter<T> {
    tools: ToolRegistry<T>,
    /// `None` when generation is disabled for this run.
    generator: Option<TextGenerator<T>>,
    variables: Variables,
    templates: HashMap<String, String>,
    messages: Vec<ChatMessage>,
    output: OutputBuffer,
    errors: Vec<String>,
}

impl<T: Transport> Interpreter<T> {
    pub fn new(
        tools: ToolRegistry<T>,
        generator: Option<TextGenerator<T>>,
        max_output_bytes: usize,
    ) -> Self {
        Self {
            tools,
            generator,
            variables: Variables::new(),
            templates: HashMap::new(),
            messages: Vec::new(),
            output: OutputBuffer::new(max_output_bytes),
            errors: Vec::new(),
        }
    }

    /// Seed the variable store before the first statement runs.
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables.extend(variables);
        self
    }

    /// Execute every statement of `script` and collect the final state.
    pub async fn run(mut self, script: &str) -> ExecutionResult {
        for (index, raw) in script.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let outcome = match Statement::parse(line) {
                Ok(statement) => {
                    let keyword = statement.keyword();
                    self.execute(statement).await.map_err(|err| (keyword, err))
                }
                Err(err) => Err(("unparsed", err)),
            };
            if let Err((keyword, err)) = outcome {
                tracing::warn!(line = index + 1, keyword, error = %err, "Statement failed");
                self.errors.push(format!("{line}: {err}"));
            }
        }

        ExecutionResult::collect(
            self.output.into_string(),
            self.variables,
            self.errors,
            self.tools.tool_calls(),
        )
    }

    async fn execute(&mut self, statement: Statement) -> Result<(), ScriptError> {
        match statement {
            Statement::Set { name, value } => {
                let value = parse_value(&value, &self.variables)?;
                self.variables.insert(name, value);
            }
            Statement::Template { name, text } => {
                self.templates.insert(name, text);
            }
            Statement::Prompt { name, text } => {
                self.variables.insert(name, Value::String(text));
            }
            Statement::Message { role, content } => {
                let content = render(&content, &self.variables);
                self.messages.push(ChatMessage { role, content });
            }
            Statement::Call { tool, target, args } => {
                let args = self.resolve_call_args(args)?;
                let result = self.tools.invoke(&tool, args).await?;
                self.variables.insert(target, Value::from(result));
            }
            Statement::Print { expr } => self.print(&expr)?,
            Statement::Generate { target } => self.generate(target).await?,
        }
        Ok(())
    }

    /// Variable first, then template, then literal text.
    fn print(&mut self, expr: &str) -> Result<(), ScriptError> {
        let text = if let Some(value) = self.variables.get(expr) {
            value.to_pretty_json()
        } else if let Some(template) = self.templates.get(expr) {
            render(template, &self.variables)
        } else {
            render(strip_quotes(expr), &self.variables)
        };
        self.output.append(&text)
    }

    fn resolve_call_args(
        &self,
        args: Option<CallArgs>,
    ) -> Result<Map<String, JsonValue>, ScriptError> {
        match args {
            None => Ok(Map::new()),
            Some(CallArgs::Inline(map)) => Ok(map),
            Some(CallArgs::Variable(name)) => match self.variables.get(&name) {
                None => Ok(Map::new()),
                Some(value) => value.as_object().cloned().ok_or_else(|| {
                    ScriptError::validation(format!(
                        "call arguments `{name}` must be an object, got {}",
                        value.kind()
                    ))
                }),
            },
        }
    }

    async fn generate(&mut self, target: String) -> Result<(), ScriptError> {
        let generator = self
            .generator
            .as_ref()
            .ok_or(ScriptError::FeatureDisabled)?;
        let target = generate_target(&target)?.to_string();
        let text = generator.generate(&self.messages).await?;
        self.variables.insert(target, Value::String(text.clone()));
        self.output.append(&text)
    }
}
