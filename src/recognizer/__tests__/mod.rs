use crate::recognizer::{ReFlags, Recognizer, RecognizerCollector, RegexRecognizer, StrRecognizer};

#[test]
fn literal_matches_at_position() {
    let recognizer = StrRecognizer::new("if", false);
    assert_eq!(recognizer.recognize("x if y", 2), Some("if"));
    assert_eq!(recognizer.recognize("x if y", 0), None);
    assert_eq!(recognizer.recognize("i", 0), None);
}

#[test]
fn literal_case_folding() {
    let sensitive = StrRecognizer::new("begin", false);
    assert_eq!(sensitive.recognize("BEGIN", 0), None);

    let folded = StrRecognizer::new("begin", true);
    assert_eq!(folded.recognize("BEGIN end", 0), Some("BEGIN"));
    assert_eq!(folded.recognize("BeGiN", 0), Some("BeGiN"));
}

#[test]
fn regex_is_anchored_at_position() {
    let recognizer = RegexRecognizer::new(r"\d+", ReFlags::default(), false).unwrap();
    assert_eq!(recognizer.recognize("abc 123", 4), Some("123"));
    // No searching past the requested position.
    assert_eq!(recognizer.recognize("abc 123", 0), None);
}

#[test]
fn regex_sees_left_context_for_word_boundaries() {
    let recognizer = RegexRecognizer::new(r"\bif\b", ReFlags::default(), false).unwrap();
    assert_eq!(recognizer.recognize("an if here", 3), Some("if"));
    // "iffy" continues with a word character, the boundary fails.
    assert_eq!(recognizer.recognize("iffy", 0), None);
    // Mid-word start position is not a boundary.
    assert_eq!(recognizer.recognize("elif x", 2), None);
}

#[test]
fn regex_case_insensitive_flag() {
    let recognizer = RegexRecognizer::new(r"select", ReFlags::default(), true).unwrap();
    assert_eq!(recognizer.recognize("SELECT *", 0), Some("SELECT"));
}

#[test]
fn regex_compile_error_reports_escaped_pattern() {
    let error = RegexRecognizer::new("a(\n", ReFlags::default(), false).unwrap_err();
    assert!(error.message().contains("Regex compile error"));
    assert!(error.message().contains("a(\\n"));
}

#[test]
fn sentinel_recognizers() {
    assert_eq!(Recognizer::Empty.recognize("abc", 1), Some(""));
    assert_eq!(Recognizer::Eof.recognize("abc", 3), Some(""));
    assert_eq!(Recognizer::Eof.recognize("abc", 2), None);
    assert_eq!(Recognizer::Stop.recognize("abc", 0), None);
    assert_eq!(Recognizer::Stop.recognize("", 0), None);
}

#[test]
fn collector_registration() {
    let mut collector = RecognizerCollector::new();
    collector.register("Number", |input: &str, pos: usize| {
        let end = input[pos..]
            .find(|c: char| !c.is_ascii_digit())
            .map(|offset| pos + offset)
            .unwrap_or(input.len());
        if end > pos {
            Some(&input[pos..end])
        } else {
            None
        }
    });

    assert!(collector.contains("Number"));
    assert!(!collector.contains("Name"));
    let func = collector.get("Number").unwrap();
    assert_eq!(func("a 42b", 2), Some("42"));
    assert_eq!(func("a 42b", 0), None);
    assert_eq!(collector.all().count(), 1);
}
