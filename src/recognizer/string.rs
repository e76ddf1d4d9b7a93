use super::{ExternalRecognizer, Recognizer, RecognizerFn, StrRecognizer};
use std::fmt::{Debug, Display, Formatter};

impl StrRecognizer {
    pub fn new(value: impl Into<String>, ignore_case: bool) -> Self {
        let value = value.into();
        let value_cmp = if ignore_case {
            value.to_lowercase()
        } else {
            value.clone()
        };
        Self {
            value,
            ignore_case,
            value_cmp,
        }
    }

    pub fn recognize<'i>(&self, input: &'i str, pos: usize) -> Option<&'i str> {
        let end = pos + self.value.len();
        if end > input.len() || !input.is_char_boundary(pos) || !input.is_char_boundary(end) {
            return None;
        }
        let candidate = &input[pos..end];
        let matched = if self.ignore_case {
            candidate.to_lowercase() == self.value_cmp
        } else {
            candidate == self.value_cmp
        };
        if matched {
            Some(candidate)
        } else {
            None
        }
    }
}

impl Display for StrRecognizer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.value)
    }
}

impl ExternalRecognizer {
    pub fn new(name: impl Into<String>, func: RecognizerFn) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }

    pub fn recognize<'i>(&self, input: &'i str, pos: usize) -> Option<&'i str> {
        (self.func)(input, pos)
    }
}

impl Debug for ExternalRecognizer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalRecognizer")
            .field("name", &self.name)
            .finish()
    }
}

impl Recognizer {
    /// Match at `pos` and return the recognized slice. EMPTY recognizes the
    /// empty slice everywhere, EOF only at the end of input, STOP never.
    pub fn recognize<'i>(&self, input: &'i str, pos: usize) -> Option<&'i str> {
        match self {
            Recognizer::Str(s) => s.recognize(input, pos),
            Recognizer::Regex(r) => r.recognize(input, pos),
            Recognizer::Empty => Some(&input[pos..pos]),
            Recognizer::Eof => {
                if pos == input.len() {
                    Some(&input[pos..pos])
                } else {
                    None
                }
            }
            Recognizer::Stop => None,
            Recognizer::External(e) => e.recognize(input, pos),
        }
    }

    pub fn as_str(&self) -> Option<&StrRecognizer> {
        match self {
            Recognizer::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_regex(&self) -> Option<&super::RegexRecognizer> {
        match self {
            Recognizer::Regex(r) => Some(r),
            _ => None,
        }
    }
}

impl Debug for Recognizer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Recognizer::Str(s) => write!(f, "Str({:?})", s.value),
            Recognizer::Regex(r) => write!(f, "Regex({:?})", r.pattern()),
            Recognizer::Empty => write!(f, "Empty"),
            Recognizer::Eof => write!(f, "Eof"),
            Recognizer::Stop => write!(f, "Stop"),
            Recognizer::External(e) => write!(f, "External({:?})", e.name),
        }
    }
}

impl Display for Recognizer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Recognizer::Str(s) => write!(f, "{}", s),
            Recognizer::Regex(r) => write!(f, "{}", r),
            Recognizer::Empty => write!(f, "EMPTY"),
            Recognizer::Eof => write!(f, "EOF"),
            Recognizer::Stop => write!(f, "STOP"),
            Recognizer::External(e) => write!(f, "<{}>", e.name),
        }
    }
}
