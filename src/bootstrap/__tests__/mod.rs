use crate::bootstrap::lexer::{tokenize, TokenKind};
use crate::bootstrap::{bootstrap_grammar, grammar_parser, ParseContext};
use crate::symbol::Multiplicity;
use crate::util::SourceText;
use crate::GrammarOptions;
use std::rc::Rc;

fn kinds(text: &str) -> Vec<TokenKind> {
    let source = Rc::new(SourceText::new(text, None));
    tokenize(&source)
        .unwrap()
        .into_iter()
        .map(|token| token.kind)
        .collect()
}

fn parse(text: &str) -> crate::bootstrap::FileDecl {
    let options = GrammarOptions::new();
    let context = ParseContext::new(None, &options);
    grammar_parser().parse(text, &context).unwrap()
}

#[test]
fn tokenizes_rule_with_operators() {
    let tokens = kinds("A: b=c* d?=E+[comma] \"lit\" /re/ {left, 5};");
    assert_eq!(
        tokens,
        vec![
            TokenKind::Name,
            TokenKind::Colon,
            TokenKind::Name,
            TokenKind::Eq,
            TokenKind::Name,
            TokenKind::Star,
            TokenKind::Name,
            TokenKind::QEq,
            TokenKind::Name,
            TokenKind::Plus,
            TokenKind::LBracket,
            TokenKind::Name,
            TokenKind::RBracket,
            TokenKind::Str,
            TokenKind::Regex,
            TokenKind::LBrace,
            TokenKind::Name,
            TokenKind::Comma,
            TokenKind::Int,
            TokenKind::RBrace,
            TokenKind::Semi,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn layout_is_skipped_including_nested_comments() {
    let tokens = kinds(
        "// line comment\n A /* outer /* inner */ still outer */ : b; /* trailing */",
    );
    assert_eq!(
        tokens,
        vec![
            TokenKind::Name,
            TokenKind::Colon,
            TokenKind::Name,
            TokenKind::Semi,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn unterminated_comment_is_an_error() {
    let source = Rc::new(SourceText::new("A: b; /* no end", None));
    let error = tokenize(&source).unwrap_err();
    assert!(error.message().contains("Unterminated comment"));
    assert!(error.location().is_some());
}

#[test]
fn dotted_names_lex_as_one_token() {
    let source = Rc::new(SourceText::new("m.Thing", None));
    let tokens = tokenize(&source).unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Name);
    assert_eq!(tokens[0].end - tokens[0].start, "m.Thing".len());
}

#[test]
fn parses_rules_terminals_and_operators() {
    let decl = parse(
        r#"
        // A small expression grammar.
        @pass_single
        E: E plus T {left, 5}
         | T;
        T: Num | items=T*[comma];
        terminals
        Num: /\d+/ {prefer, 15};
        plus: "+";
        comma: ",";
        "#,
    );

    assert_eq!(decl.rules.len(), 4);
    assert_eq!(decl.rules[0].lhs, "E");
    assert_eq!(decl.rules[0].action_name.as_deref(), Some("pass_single"));
    assert_eq!(decl.rules[0].prior, 5);
    assert!(decl.rules[1].action_name.is_some());

    // Named match with multiplicity.
    let named = &decl.rules[3].assignments[0];
    assert_eq!(named.name.as_deref(), Some("items"));
    assert_eq!(named.multiplicity, Multiplicity::ZeroOrMore);
    assert_eq!(named.symbol_name, "T");
    assert_eq!(named.index, Some(0));

    let num = decl.terminals.iter().find(|t| t.name == "Num").unwrap();
    assert!(num.prefer);
    assert_eq!(num.prior, 15);
    assert!(decl.terminals.iter().any(|t| t.name == "plus"));

    // The record descriptor for the rule with named matches.
    let rule_type = decl.rule_types.iter().find(|t| t.rule_name == "T").unwrap();
    let attribute = rule_type.attribute("items").unwrap();
    assert_eq!(attribute.multiplicity, Multiplicity::ZeroOrMore);
    assert_eq!(attribute.type_name, "T");
}

#[test]
fn inline_literals_are_hoisted_once() {
    let decl = parse(r#"A: "x" B; B: "x" "y";"#);
    let names: Vec<&str> = decl.terminals.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["x", "y"]);
}

#[test]
fn string_escapes_are_unescaped() {
    let decl = parse(r#"A: "a\"b\n";"#);
    let literal = &decl.terminals[0];
    assert_eq!(literal.name, "a\"b\n");
}

#[test]
fn reserved_rule_name_is_rejected() {
    let options = GrammarOptions::new();
    let context = ParseContext::new(None, &options);
    let error = grammar_parser().parse("EOF: \"x\";", &context).unwrap_err();
    assert!(error.message().contains("reserved"));
    assert!(error.location().is_some());
}

#[test]
fn import_requires_a_file_context() {
    let options = GrammarOptions::new();
    let context = ParseContext::new(None, &options);
    let error = grammar_parser()
        .parse("import \"other.lg\"; A: \"a\";", &context)
        .unwrap_err();
    assert_eq!(
        error.message(),
        "Import can be used only for grammars defined in files."
    );
}

#[test]
fn duplicate_assignment_name_in_one_production_is_rejected() {
    let options = GrammarOptions::new();
    let context = ParseContext::new(None, &options);
    let error = grammar_parser()
        .parse("A: x=B x=C; B: \"b\"; C: \"c\";", &context)
        .unwrap_err();
    assert!(error.message().contains("Multiple assignments"));
}

#[test]
fn rule_named_terminals_is_allowed() {
    let decl = parse("terminals: \"t\"; A: terminals;");
    assert_eq!(decl.rules[0].lhs, "terminals");
    assert_eq!(decl.rules.len(), 2);
}

#[test]
fn syntax_error_carries_location() {
    let options = GrammarOptions::new();
    let context = ParseContext::new(None, &options);
    let error = grammar_parser().parse("A: ;", &context).unwrap_err();
    assert!(error.message().contains("Expected"));
    let location = error.location().unwrap();
    assert_eq!(location.line(), 1);
}

#[test]
fn bootstrap_grammar_compiles_and_starts_at_pgfile() {
    let grammar = bootstrap_grammar().unwrap();
    let start = grammar.start_symbol();
    assert_eq!(grammar.symbol(start).name, "PGFile");
    assert!(grammar.get_terminal("Name").is_some());
    assert!(grammar.get_terminal("StrTerm").is_some());
    assert!(grammar.get_nonterminal("GrammarSymbolReference").is_some());
    // Inline literals of the bootstrap table became literal terminals.
    assert!(grammar.get_terminal("terminals").is_some());
    assert!(grammar.get_terminal("?=").is_some());
}

#[test]
fn grammar_parser_is_a_singleton() {
    let first = grammar_parser();
    let second = grammar_parser();
    assert!(Rc::ptr_eq(&first, &second));
    let grammar = &first.grammar;
    assert_eq!(grammar.symbol(grammar.start_symbol()).name, "PGFile");
}
