//! Byte-bounded output buffer.

use crate::error::ScriptError;

/// Accumulated script output with a hard byte ceiling.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    text: String,
    max_bytes: usize,
}

impl OutputBuffer {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            text: String::new(),
            max_bytes,
        }
    }

    /// Append `chunk`, adding a trailing newline if it lacks one.
    ///
    /// The size check happens before any mutation: an append that would push
    /// the buffer past its ceiling fails and leaves the contents untouched.
    pub fn append(&mut self, chunk: &str) -> Result<(), ScriptError> {
        let needs_newline = !chunk.ends_with('\n');
        let prospective = self.text.len() + chunk.len() + usize::from(needs_newline);
        if prospective > self.max_bytes {
            return Err(ScriptError::OutputBudgetExceeded {
                limit: self.max_bytes,
            });
        }
        self.text.push_str(chunk);
        if needs_newline {
            self.text.push('\n');
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}
