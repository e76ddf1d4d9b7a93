mod location;
mod logger;
mod position;
mod source;
use once_cell::unsync::OnceCell;
pub(crate) use source::esc_control_characters;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
/// The line and column information at an input position.
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// A grammar source (file content or inline string) with a lazily built
/// line-break table for position lookups.
#[derive(Debug)]
pub struct SourceText {
    pub text: String,
    pub file_name: Option<String>,
    line_breaks: OnceCell<Vec<usize>>,
}

#[derive(Debug, Clone)]
/// A byte span inside a [SourceText].
///
/// Line and column are evaluated on first demand, typically during error
/// reporting, and cached afterwards.
pub struct Location {
    pub source: Rc<SourceText>,
    pub start: usize,
    pub end: usize,
    position: OnceCell<Position>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// A enum structure to assign multiple level debugging to the compilation
/// pipeline.
pub enum Log<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}
