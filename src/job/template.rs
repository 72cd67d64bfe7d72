use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Command template as written by the user
///
/// In a config file a string gives a [`CommandTemplate::Line`] and an array
/// gives a [`CommandTemplate::Argv`]. Both resolve to an [`ArgTemplate`]
/// before anything runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandTemplate {
    /// Whole command line, split shell-style once at validation
    Line(String),
    /// Pre-split arguments
    Argv(Vec<String>),
}

/// Validated, pre-split template; records are substituted per argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgTemplate {
    args: Vec<String>,
}

impl CommandTemplate {
    /// Template built from trailing command-line arguments
    pub fn from_args(mut args: Vec<String>) -> Option<Self> {
        match args.len() {
            0 => None,
            1 => args.pop().map(CommandTemplate::Line),
            _ => Some(CommandTemplate::Argv(args)),
        }
    }

    /// Split the template into arguments and check it names a program
    pub fn resolve(self) -> Result<ArgTemplate, ConfigError> {
        let args = match self {
            CommandTemplate::Line(line) => {
                shell_words::split(&line).map_err(|_| ConfigError::UnbalancedQuotes(line))?
            }
            CommandTemplate::Argv(args) => args,
        };

        match args.first() {
            Some(program) if !program.is_empty() => Ok(ArgTemplate { args }),
            _ => Err(ConfigError::MissingCommand),
        }
    }
}

impl ArgTemplate {
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Expand the template for one record
    ///
    /// Every occurrence of `placeholder` in every argument is replaced with
    /// the record's literal text. When no argument contains the placeholder
    /// the record is appended verbatim as the final argument instead.
    pub fn expand(&self, placeholder: &str, record: &str) -> Vec<String> {
        if !self.args.iter().any(|arg| arg.contains(placeholder)) {
            let mut argv = self.args.clone();
            argv.push(record.to_string());
            return argv;
        }

        self.args
            .iter()
            .map(|arg| arg.replace(placeholder, record))
            .collect()
    }
}
