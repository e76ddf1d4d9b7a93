//! Low-level token matchers bound to terminal symbols.
//!
//! A recognizer is asked to match at an exact input position and reports the
//! recognized slice. Besides literal and regex matchers the module provides
//! the three sentinel recognizers (EMPTY, EOF, STOP) and named external
//! callables registered through a [RecognizerCollector].

mod collector;
mod pattern;
mod string;

#[cfg(test)]
mod __tests__;

use regex::Regex;
use std::collections::HashMap;
use std::rc::Rc;

/// An external recognizer callable: `(input, position)` to the matched slice
/// rooted at `position`, or `None`.
pub type RecognizerFn = Rc<dyn for<'i> Fn(&'i str, usize) -> Option<&'i str>>;

/// A literal string matcher, optionally case folding.
#[derive(Debug, Clone)]
pub struct StrRecognizer {
    pub value: String,
    pub ignore_case: bool,
    value_cmp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Flags applied when compiling regex recognizers. Multi-line matching is on
/// by default; terminal-level case insensitivity is layered on top.
pub struct ReFlags {
    pub multi_line: bool,
    pub dot_matches_new_line: bool,
    pub ignore_whitespace: bool,
}

/// A compiled regular expression matcher, anchored at the match position.
#[derive(Debug, Clone)]
pub struct RegexRecognizer {
    pattern: String,
    pub regex: Regex,
    pub ignore_case: bool,
    pub flags: ReFlags,
}

/// A named user-supplied matcher taken from a [RecognizerCollector].
#[derive(Clone)]
pub struct ExternalRecognizer {
    pub name: String,
    func: RecognizerFn,
}

/// A token matcher bound to a terminal symbol.
#[derive(Clone)]
pub enum Recognizer {
    Str(StrRecognizer),
    Regex(RegexRecognizer),
    /// Always succeeds without consuming input.
    Empty,
    /// Succeeds only at the end of input.
    Eof,
    /// The internal input terminator. Never matches user input.
    Stop,
    External(ExternalRecognizer),
}

/// An explicit registry mapping terminal names to external recognizer
/// callables.
///
/// Hosts build one, register callables under terminal names and hand it to
/// the grammar through [GrammarOptions](crate::GrammarOptions), either as the
/// override map or from a side-file loader. Registration has no global side
/// effects.
#[derive(Default, Clone)]
pub struct RecognizerCollector {
    all: HashMap<String, RecognizerFn>,
}
