use super::{Location, Position, SourceText};
use once_cell::unsync::OnceCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

impl Location {
    pub fn new(source: Rc<SourceText>, start: usize, end: usize) -> Self {
        Self {
            source,
            start,
            end,
            position: OnceCell::new(),
        }
    }

    /// Line/column of the start of the span, evaluated once on demand.
    pub fn position(&self) -> Position {
        *self
            .position
            .get_or_init(|| self.source.obtain_position(self.start))
    }

    pub fn line(&self) -> usize {
        self.position().line
    }

    pub fn column(&self) -> usize {
        self.position().column
    }

    pub fn file_name(&self) -> Option<&str> {
        self.source.file_name.as_deref()
    }

    /// The spanned slice of the source text.
    pub fn text(&self) -> &str {
        &self.source.text[self.start..self.end]
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let position = self.position();
        match self.file_name() {
            Some(name) => write!(
                f,
                "{}:{}:\"{}\"",
                name,
                position,
                self.source.position_context(self.start)
            ),
            None => write!(
                f,
                "{}:\"{}\"",
                position,
                self.source.position_context(self.start)
            ),
        }
    }
}
