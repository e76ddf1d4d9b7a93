use super::{ReFlags, RegexRecognizer};
use crate::util::esc_control_characters;
use crate::GrammarError;
use regex::RegexBuilder;
use std::fmt::{Display, Formatter};

impl Default for ReFlags {
    fn default() -> Self {
        Self {
            multi_line: true,
            dot_matches_new_line: false,
            ignore_whitespace: false,
        }
    }
}

impl RegexRecognizer {
    /// Compile `pattern` eagerly. A rejected pattern is a grammar error
    /// reporting the escaped pattern together with the engine message.
    pub fn new(pattern: &str, flags: ReFlags, ignore_case: bool) -> Result<Self, GrammarError> {
        let regex = RegexBuilder::new(pattern)
            .multi_line(flags.multi_line)
            .dot_matches_new_line(flags.dot_matches_new_line)
            .ignore_whitespace(flags.ignore_whitespace)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|err| {
                GrammarError::plain(format!(
                    "Regex compile error in /{}/ (report: \"{}\")",
                    esc_control_characters(pattern),
                    err
                ))
            })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            ignore_case,
            flags,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Match anchored at `pos`. The whole input is kept as context so that
    /// boundary assertions such as `\b` see the preceding character.
    pub fn recognize<'i>(&self, input: &'i str, pos: usize) -> Option<&'i str> {
        let found = self.regex.find_at(input, pos)?;
        if found.start() == pos {
            Some(found.as_str())
        } else {
            None
        }
    }

    /// Whether the pattern matches `value` in its entirety.
    pub fn recognizes_fully(&self, value: &str) -> bool {
        self.recognize(value, 0) == Some(value)
    }
}

impl Display for RegexRecognizer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}/", self.pattern)
    }
}
