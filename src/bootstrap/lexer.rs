//! Tokenizer of the grammar language, built on the bootstrap terminal
//! patterns. Whitespace, line comments and nestable block comments are
//! layout.

use crate::util::{Location, SourceText};
use crate::GrammarError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::rc::Rc;

pub(crate) const NAME_PATTERN: &str = r"[a-zA-Z0-9_\.]+";
pub(crate) const STR_TERM_PATTERN: &str =
    r#"(?s)('[^'\\]*(?:\\.[^'\\]*)*')|("[^"\\]*(?:\\.[^"\\]*)*")"#;
pub(crate) const REGEX_TERM_PATTERN: &str = r"/((\\/)|[^/])*/";
pub(crate) const PRIOR_PATTERN: &str = r"\d+";
pub(crate) const ACTION_PATTERN: &str = r"@[a-zA-Z0-9_]+";
pub(crate) const WS_PATTERN: &str = r"\s+";
pub(crate) const COMMENT_LINE_PATTERN: &str = r"//.*";
pub(crate) const NOT_COMMENT_PATTERN: &str = r"((\*[^/])|[^\s*/]|/[^*])+";

static NAME_RE: Lazy<Regex> = Lazy::new(|| anchored(NAME_PATTERN));
static STR_TERM_RE: Lazy<Regex> = Lazy::new(|| anchored(STR_TERM_PATTERN));
static REGEX_TERM_RE: Lazy<Regex> = Lazy::new(|| anchored(REGEX_TERM_PATTERN));
static ACTION_RE: Lazy<Regex> = Lazy::new(|| anchored(ACTION_PATTERN));

fn anchored(pattern: &str) -> Regex {
    Regex::new(&format!(r"\A(?:{})", pattern)).expect("bootstrap token pattern compiles")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Name,
    Str,
    Regex,
    Int,
    Action,
    Colon,
    Semi,
    Pipe,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Eq,
    QEq,
    Star,
    Plus,
    Quest,
    Eof,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }
}

pub(crate) fn tokenize(source: &Rc<SourceText>) -> Result<Vec<Token>, GrammarError> {
    let text = source.text.as_str();
    let mut tokens = Vec::new();
    let mut pos = 0usize;
    loop {
        pos = skip_layout(source, pos)?;
        if pos >= text.len() {
            tokens.push(Token::new(TokenKind::Eof, pos, pos));
            return Ok(tokens);
        }
        let rest = &text[pos..];
        let (kind, len) = if rest.starts_with("?=") {
            (TokenKind::QEq, 2)
        } else if let Some(kind) = punctuation(rest.as_bytes()[0]) {
            (kind, 1)
        } else if rest.starts_with('@') {
            match ACTION_RE.find(rest) {
                Some(found) => (TokenKind::Action, found.end()),
                None => {
                    return Err(unexpected_character(source, pos));
                }
            }
        } else if rest.starts_with('"') || rest.starts_with('\'') {
            match STR_TERM_RE.find(rest) {
                Some(found) => (TokenKind::Str, found.end()),
                None => {
                    return Err(GrammarError::new(
                        "Unterminated string literal.".to_string(),
                        Some(Location::new(source.clone(), pos, text.len())),
                    ));
                }
            }
        } else if rest.starts_with('/') {
            match REGEX_TERM_RE.find(rest) {
                Some(found) => (TokenKind::Regex, found.end()),
                None => {
                    return Err(GrammarError::new(
                        "Unterminated regex literal.".to_string(),
                        Some(Location::new(source.clone(), pos, text.len())),
                    ));
                }
            }
        } else {
            match NAME_RE.find(rest) {
                Some(found) => {
                    let kind = if rest[..found.end()].bytes().all(|b| b.is_ascii_digit()) {
                        TokenKind::Int
                    } else {
                        TokenKind::Name
                    };
                    (kind, found.end())
                }
                None => {
                    return Err(unexpected_character(source, pos));
                }
            }
        };
        tokens.push(Token::new(kind, pos, pos + len));
        pos += len;
    }
}

fn punctuation(byte: u8) -> Option<TokenKind> {
    match byte {
        b':' => Some(TokenKind::Colon),
        b';' => Some(TokenKind::Semi),
        b'|' => Some(TokenKind::Pipe),
        b'{' => Some(TokenKind::LBrace),
        b'}' => Some(TokenKind::RBrace),
        b'[' => Some(TokenKind::LBracket),
        b']' => Some(TokenKind::RBracket),
        b',' => Some(TokenKind::Comma),
        b'=' => Some(TokenKind::Eq),
        b'*' => Some(TokenKind::Star),
        b'+' => Some(TokenKind::Plus),
        b'?' => Some(TokenKind::Quest),
        _ => None,
    }
}

/// Skip whitespace and comments. Block comments nest.
fn skip_layout(source: &Rc<SourceText>, mut pos: usize) -> Result<usize, GrammarError> {
    let text = source.text.as_str();
    loop {
        let rest = &text[pos..];
        if let Some(ch) = rest.chars().next() {
            if ch.is_whitespace() {
                pos += ch.len_utf8();
                continue;
            }
        }
        if rest.starts_with("//") {
            match rest.find('\n') {
                Some(offset) => {
                    pos += offset + 1;
                    continue;
                }
                None => return Ok(text.len()),
            }
        }
        if rest.starts_with("/*") {
            let open = pos;
            let mut depth = 1usize;
            pos += 2;
            while depth > 0 {
                let rest = &text[pos..];
                if rest.is_empty() {
                    return Err(GrammarError::new(
                        "Unterminated comment.".to_string(),
                        Some(Location::new(source.clone(), open, text.len())),
                    ));
                }
                if rest.starts_with("/*") {
                    depth += 1;
                    pos += 2;
                } else if rest.starts_with("*/") {
                    depth -= 1;
                    pos += 2;
                } else {
                    pos += rest.chars().next().map(char::len_utf8).unwrap_or(1);
                }
            }
            continue;
        }
        return Ok(pos);
    }
}

fn unexpected_character(source: &Rc<SourceText>, pos: usize) -> GrammarError {
    let ch = source.text[pos..].chars().next().unwrap_or('\0');
    GrammarError::new(
        format!("Unexpected character {:?} in grammar.", ch),
        Some(Location::new(
            source.clone(),
            pos,
            pos + ch.len_utf8().max(1),
        )),
    )
}
