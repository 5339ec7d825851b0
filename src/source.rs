//! Script source context for execution failures.
//!
//! When a chunk fails, the engine reports a message that may or may not
//! carry a position. [`ScriptError`] keeps the original text next to the
//! message and resolves a best-effort line, so diagnostics can point at the
//! offending script line instead of the host stack.

use std::fmt;

use luabinder_core::Diagnostics;

/// Start of the traceback the engine appends to runtime errors.
const TRACEBACK: &str = "\nstack traceback:";

/// Script text plus the chunk name the engine reports it under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    name: String,
    text: String,
}

impl Source {
    /// Create a source.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Chunk name, e.g. `<string>` or a file path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full script text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text of a 1-based line.
    pub fn line(&self, line: usize) -> Option<&str> {
        line.checked_sub(1)
            .and_then(|index| self.text.lines().nth(index))
    }

    /// Find the first `name:LINE:` position in an engine message.
    pub fn locate(&self, message: &str) -> Option<usize> {
        let marker = format!("{}:", self.name);
        message
            .match_indices(&marker)
            .find_map(|(at, _)| leading_line(&message[at + marker.len()..]))
    }

    /// Render a line with its neighbours, marking the line itself.
    pub fn excerpt(&self, line: usize) -> Option<String> {
        self.line(line)?;
        let first = line.saturating_sub(1).max(1);
        let last = line + 1;
        let width = last.to_string().len();

        let mut out = String::new();
        for (number, text) in self
            .text
            .lines()
            .enumerate()
            .map(|(i, text)| (i + 1, text))
            .filter(|(number, _)| (first..=last).contains(number))
        {
            let marker = if number == line { '>' } else { ' ' };
            out.push_str(&format!("{marker} {number:>width$} | {text}\n"));
        }
        Some(out)
    }
}

/// A chunk failed to compile or run.
#[derive(Debug, Clone)]
pub struct ScriptError {
    message: String,
    line: Option<usize>,
    source: Source,
}

impl ScriptError {
    /// Create an error from an engine failure while running `source`.
    ///
    /// The line comes from the engine's message when it names this chunk,
    /// otherwise from the line recorded by the failing handler, otherwise
    /// from any position the message carries.
    pub(crate) fn from_engine(err: &mlua::Error, source: Source, diagnostics: &Diagnostics) -> Self {
        let text = err.to_string();
        let line = source
            .locate(&text)
            .or_else(|| diagnostics.fault_line())
            .or_else(|| first_line(&text));
        let message = strip_position(describe(err), source.name(), line);
        Self {
            message,
            line,
            source,
        }
    }

    /// Create an error with an explicit message and line.
    pub fn new(message: impl Into<String>, line: Option<usize>, source: Source) -> Self {
        Self {
            message: message.into(),
            line,
            source,
        }
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 1-based line of the failure, if known.
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    /// The script that failed.
    pub fn script(&self) -> &Source {
        &self.source
    }

    /// Text of the offending line, if known.
    pub fn line_text(&self) -> Option<&str> {
        self.line.and_then(|line| self.source.line(line))
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => {
                write!(f, "{}:{}: {}", self.source.name(), line, self.message)?;
                if let Some(excerpt) = self.source.excerpt(line) {
                    write!(f, "\n{}", excerpt.trim_end())?;
                }
                Ok(())
            }
            None => write!(f, "{}: {}", self.source.name(), self.message),
        }
    }
}

impl std::error::Error for ScriptError {}

/// First `:LINE:` position in an engine message, whatever the chunk.
pub(crate) fn first_line(message: &str) -> Option<usize> {
    message
        .match_indices(':')
        .find_map(|(at, _)| leading_line(&message[at + 1..]))
}

/// Parse `LINE:` at the start of `rest`.
fn leading_line(rest: &str) -> Option<usize> {
    let end = rest.find(|c: char| !c.is_ascii_digit())?;
    if end == 0 || !rest[end..].starts_with(':') {
        return None;
    }
    rest[..end].parse().ok()
}

/// The innermost message of an engine error, without traceback noise.
pub(crate) fn describe(err: &mlua::Error) -> String {
    let mut message = match err {
        mlua::Error::CallbackError { cause, .. } => return describe(cause),
        mlua::Error::RuntimeError(message) => message.clone(),
        mlua::Error::SyntaxError { message, .. } => message.clone(),
        other => other.to_string(),
    };
    if let Some(at) = message.find(TRACEBACK) {
        message.truncate(at);
    }
    message
}

/// Drop a leading `name:LINE: ` that repeats the resolved position.
fn strip_position(message: String, name: &str, line: Option<usize>) -> String {
    let Some(line) = line else {
        return message;
    };
    if let Some(rest) = message.strip_prefix(&format!("{name}:{line}: ")) {
        return rest.to_owned();
    }
    message
}
