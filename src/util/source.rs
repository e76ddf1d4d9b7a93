use super::{Position, SourceText};
use once_cell::unsync::OnceCell;

impl SourceText {
    pub fn new(text: impl Into<String>, file_name: Option<String>) -> Self {
        Self {
            text: text.into(),
            file_name,
            line_breaks: OnceCell::new(),
        }
    }

    pub fn obtain_line_breaks(&self) -> &Vec<usize> {
        self.line_breaks.get_or_init(|| {
            self.text
                .bytes()
                .enumerate()
                .filter_map(|(index, b)| if b == b'\n' { Some(index) } else { None })
                .collect()
        })
    }

    /// Line/column of a byte position, both 1-based.
    pub fn obtain_position(&self, pointer: usize) -> Position {
        let line_breaks = self.obtain_line_breaks();
        let index = match line_breaks.binary_search(&pointer) {
            Ok(index) | Err(index) => index,
        };

        if index == 0 {
            Position::new(1, self.text[..pointer].chars().count() + 1)
        } else {
            let break_point = line_breaks[index - 1] + 1;
            Position::new(index + 1, self.text[break_point..pointer].chars().count() + 1)
        }
    }

    /// A short excerpt around `pointer` with the position marked, used in
    /// error messages. Newlines are escaped so the excerpt stays on one line.
    pub fn position_context(&self, pointer: usize) -> String {
        let mut start = pointer.saturating_sub(10);
        while !self.text.is_char_boundary(start) {
            start -= 1;
        }
        let mut end = usize::min(pointer + 10, self.text.len());
        while !self.text.is_char_boundary(end) {
            end += 1;
        }
        format!(
            "{} **> {}",
            escape_newlines(&self.text[start..pointer]),
            escape_newlines(&self.text[pointer..end])
        )
    }
}

fn escape_newlines(input: &str) -> String {
    input.replace('\n', "\\n")
}

/// Escapes control characters so names and regex patterns stay printable in
/// error reports.
pub fn esc_control_characters(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0b' => out.push_str("\\v"),
            c => out.push(c),
        }
    }
    out
}
