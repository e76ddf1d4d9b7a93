use crate::{GrammarError, Location};
use std::fmt::{Display, Formatter};

impl GrammarError {
    pub fn new(message: String, location: Option<Location>) -> Self {
        Self { message, location }
    }

    /// An error without a known source location.
    pub fn plain(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }
}

impl Display for GrammarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} => {}", location, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for GrammarError {}
