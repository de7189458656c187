//! CommandLine value object
//! The literal argument vector; token 0 is the executable

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLine {
    tokens: Vec<String>,
}

impl CommandLine {
    pub(crate) fn from_tokens(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn executable(&self) -> &str {
        self.tokens.first().map(String::as_str).unwrap_or_default()
    }

    pub fn args(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or_default()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// New command line with `wrapper` ahead of the current tokens
    pub fn wrapped_with(&self, wrapper: &[&str]) -> CommandLine {
        let mut tokens: Vec<String> = wrapper.iter().map(|s| s.to_string()).collect();
        tokens.extend(self.tokens.iter().cloned());
        CommandLine { tokens }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens.join(" "))
    }
}

/// Accumulates tokens in emission order
#[derive(Debug, Default)]
pub(crate) struct CommandLineBuilder {
    tokens: Vec<String>,
}

impl CommandLineBuilder {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            tokens: vec![executable.into()],
        }
    }

    pub fn flag(&mut self, flag: &str) -> &mut Self {
        self.tokens.push(flag.to_string());
        self
    }

    pub fn flag_if(&mut self, condition: bool, flag: &str) -> &mut Self {
        if condition {
            self.flag(flag);
        }
        self
    }

    pub fn option(&mut self, flag: &str, value: impl ToString) -> &mut Self {
        self.tokens.push(flag.to_string());
        self.tokens.push(value.to_string());
        self
    }

    pub fn option_if_some<T: ToString>(&mut self, flag: &str, value: Option<T>) -> &mut Self {
        if let Some(v) = value {
            self.option(flag, v);
        }
        self
    }

    pub fn token(&mut self, token: impl Into<String>) -> &mut Self {
        self.tokens.push(token.into());
        self
    }

    /// Name token, then the value token only if the value is non-empty
    pub fn extra_args(&mut self, args: &[(String, String)]) -> &mut Self {
        for (name, value) in args {
            self.tokens.push(name.clone());
            if !value.is_empty() {
                self.tokens.push(value.clone());
            }
        }
        self
    }

    pub fn build(self) -> CommandLine {
        CommandLine::from_tokens(self.tokens)
    }
}
