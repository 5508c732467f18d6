//! Command text plus named parameters, as handed to an executor.

use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A `(name, value)` pair bound to a `@name` placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedParameter {
    pub name: String,
    pub value: Value,
}

impl NamedParameter {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A SQL statement with its parameters.
///
/// # Example
///
/// ```
/// use pgplan::command::Command;
///
/// let cmd = Command::new("SELECT * FROM \"Acme.Hr.Employee\" WHERE \"Id\" = @id").bind("id", 7);
/// assert_eq!(cmd.parameters.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub text: String,
    #[serde(default)]
    pub parameters: Vec<NamedParameter>,
}

impl Command {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameters(text: impl Into<String>, parameters: Vec<NamedParameter>) -> Self {
        Self {
            text: text.into(),
            parameters,
        }
    }

    /// Bind a value to `@name`.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.push(NamedParameter::new(name, value));
        self
    }

    /// Look a parameter up the way the backend matches placeholders:
    /// ignoring ASCII case.
    pub fn parameter(&self, name: &str) -> Option<&NamedParameter> {
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}
