//! The bootstrapped grammar language frontend.
//!
//! The textual grammar language is itself described by a grammar-of-grammars
//! hard-coded in [bootstrap_grammar], built through
//! [Grammar::from_struct](crate::Grammar::from_struct). Grammar text is parsed
//! by a hand-written host parser whose lexer uses the bootstrap terminal
//! patterns and whose parse functions mirror the bootstrap productions
//! one-to-one, acting as the semantic actions that produce the declarations
//! consumed by the compilation pipeline.

pub(crate) mod lexer;
mod parse;

#[cfg(test)]
mod __tests__;

use crate::grammar::{GrammarOptions, StructElem, StructRule};
use crate::recognizer::ReFlags;
use crate::symbol::{Assignment, RuleType};
use crate::util::{Location, Log};
use crate::{Associativity, Grammar, GrammarError, Recognizer, DEFAULT_PRIORITY};
use once_cell::unsync::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Context of one bootstrap parse run.
pub(crate) struct ParseContext {
    pub file_name: Option<PathBuf>,
    pub ignore_case: bool,
    pub re_flags: ReFlags,
    pub debug: bool,
}

impl ParseContext {
    pub fn new(file_name: Option<PathBuf>, options: &GrammarOptions) -> Self {
        Self {
            file_name,
            ignore_case: options.ignore_case,
            re_flags: options.re_flags,
            debug: options.debug,
        }
    }
}

/// An `import` declaration parsed from grammar text.
#[derive(Debug)]
pub(crate) struct ImportDecl {
    pub module_name: String,
    pub file_path: PathBuf,
    pub location: Location,
}

/// One production alternative parsed from grammar text or built by
/// [Grammar::from_struct](crate::Grammar::from_struct).
#[derive(Debug)]
pub(crate) struct RuleDecl {
    pub lhs: String,
    pub location: Option<Location>,
    pub action_name: Option<String>,
    pub assignments: Vec<Assignment>,
    pub assoc: Associativity,
    pub prior: u32,
    pub dynamic: bool,
    pub nops: bool,
    pub nopse: bool,
}

/// A terminal rule declaration, explicit or hoisted from an inline literal.
#[derive(Debug)]
pub(crate) struct TermDecl {
    pub name: String,
    pub recognizer: Option<Recognizer>,
    pub location: Option<Location>,
    pub action_name: Option<String>,
    pub prior: u32,
    pub finish: Option<bool>,
    pub prefer: bool,
    pub dynamic: bool,
}

impl TermDecl {
    pub fn new(name: String, recognizer: Option<Recognizer>, location: Option<Location>) -> Self {
        Self {
            name,
            recognizer,
            location,
            action_name: None,
            prior: DEFAULT_PRIORITY,
            finish: None,
            prefer: false,
            dynamic: false,
        }
    }
}

/// Everything one grammar file declares.
#[derive(Debug)]
pub(crate) struct FileDecl {
    pub imports: Vec<ImportDecl>,
    pub rules: Vec<RuleDecl>,
    pub terminals: Vec<TermDecl>,
    pub rule_types: Vec<RuleType>,
}

/// The process-wide grammar language parser. Holds the compiled bootstrap
/// grammar; parsing itself is the recursive descent in [parse].
pub(crate) struct GrammarParser {
    pub grammar: Grammar,
}

impl GrammarParser {
    fn new() -> Result<Self, GrammarError> {
        Ok(Self {
            grammar: bootstrap_grammar()?,
        })
    }

    pub fn parse(&self, text: &str, context: &ParseContext) -> Result<FileDecl, GrammarError> {
        self.log_parse(context, "<string>");
        parse::parse_text(text, context)
    }

    pub fn parse_file(&self, path: &Path, context: &ParseContext) -> Result<FileDecl, GrammarError> {
        let text = fs::read_to_string(path).map_err(|err| {
            GrammarError::plain(format!(
                "Cannot read grammar file \"{}\": {}",
                path.display(),
                err
            ))
        })?;
        self.log_parse(context, &path.display().to_string());
        parse::parse_text(&text, context)
    }

    fn log_parse(&self, context: &ParseContext, what: &str) {
        let log: Log<&'static str> = if context.debug {
            Log::Default("bootstrap")
        } else {
            Log::None
        };
        log.log_event(Log::Default(()), "parse", || {
            format!(
                "parsing {} with the {}-production grammar language description",
                what,
                self.grammar.production_list().len()
            )
        });
    }
}

thread_local! {
    static GRAMMAR_PARSER: OnceCell<Rc<GrammarParser>> = OnceCell::new();
}

/// The lazily initialized grammar language parser shared by all compilations
/// of this thread.
pub(crate) fn grammar_parser() -> Rc<GrammarParser> {
    GRAMMAR_PARSER.with(|cell| {
        cell.get_or_init(|| {
            Rc::new(GrammarParser::new().expect("the bootstrap grammar is well formed"))
        })
        .clone()
    })
}

fn sym(name: &str) -> StructElem {
    StructElem::sym(name)
}

fn lit(value: &str) -> StructElem {
    StructElem::lit(value)
}

fn rule(lhs: &str, rhs: Vec<StructElem>) -> StructRule {
    StructRule::new(lhs, rhs)
}

fn rule_with(lhs: &str, rhs: Vec<StructElem>, assoc: Associativity, prior: u32) -> StructRule {
    StructRule::with(lhs, rhs, assoc, prior)
}

/// The grammar of the grammar language.
pub(crate) fn bootstrap_grammar() -> Result<Grammar, GrammarError> {
    let left = Associativity::Left;
    let rules = vec![
        rule("PGFile", vec![sym("ProductionRules"), sym("EOF")]),
        rule("PGFile", vec![sym("Imports"), sym("ProductionRules"), sym("EOF")]),
        rule(
            "PGFile",
            vec![
                sym("ProductionRules"),
                lit("terminals"),
                sym("TerminalRules"),
                sym("EOF"),
            ],
        ),
        rule(
            "PGFile",
            vec![
                sym("Imports"),
                sym("ProductionRules"),
                lit("terminals"),
                sym("TerminalRules"),
                sym("EOF"),
            ],
        ),
        rule(
            "PGFile",
            vec![lit("terminals"), sym("TerminalRules"), sym("EOF")],
        ),
        rule("Imports", vec![sym("Imports"), sym("Import")]),
        rule("Imports", vec![sym("Import")]),
        rule("Import", vec![lit("import"), sym("StrTerm"), lit(";")]),
        rule(
            "Import",
            vec![
                lit("import"),
                sym("StrTerm"),
                lit("as"),
                sym("Name"),
                lit(";"),
            ],
        ),
        rule(
            "ProductionRules",
            vec![sym("ProductionRules"), sym("ProductionRuleWithAction")],
        ),
        rule("ProductionRules", vec![sym("ProductionRuleWithAction")]),
        rule(
            "ProductionRuleWithAction",
            vec![sym("Action"), sym("ProductionRule")],
        ),
        rule("ProductionRuleWithAction", vec![sym("ProductionRule")]),
        rule(
            "ProductionRule",
            vec![sym("Name"), lit(":"), sym("ProductionRuleRHS"), lit(";")],
        ),
        rule(
            "ProductionRule",
            vec![
                sym("Name"),
                lit("{"),
                sym("ProductionDisambiguationRules"),
                lit("}"),
                lit(":"),
                sym("ProductionRuleRHS"),
                lit(";"),
            ],
        ),
        rule_with(
            "ProductionRuleRHS",
            vec![sym("ProductionRuleRHS"), lit("|"), sym("Production")],
            left,
            5,
        ),
        rule_with("ProductionRuleRHS", vec![sym("Production")], left, 5),
        rule("Production", vec![sym("Assignments")]),
        rule(
            "Production",
            vec![
                sym("Assignments"),
                lit("{"),
                sym("ProductionDisambiguationRules"),
                lit("}"),
            ],
        ),
        rule(
            "TerminalRules",
            vec![sym("TerminalRules"), sym("TerminalRuleWithAction")],
        ),
        rule("TerminalRules", vec![sym("TerminalRuleWithAction")]),
        rule(
            "TerminalRuleWithAction",
            vec![sym("Action"), sym("TerminalRule")],
        ),
        rule("TerminalRuleWithAction", vec![sym("TerminalRule")]),
        rule_with(
            "TerminalRule",
            vec![sym("Name"), lit(":"), sym("Recognizer"), lit(";")],
            left,
            15,
        ),
        rule_with(
            "TerminalRule",
            vec![sym("Name"), lit(":"), lit(";")],
            left,
            15,
        ),
        rule_with(
            "TerminalRule",
            vec![
                sym("Name"),
                lit(":"),
                sym("Recognizer"),
                lit("{"),
                sym("TerminalDisambiguationRules"),
                lit("}"),
                lit(";"),
            ],
            left,
            15,
        ),
        rule_with(
            "TerminalRule",
            vec![
                sym("Name"),
                lit(":"),
                lit("{"),
                sym("TerminalDisambiguationRules"),
                lit("}"),
                lit(";"),
            ],
            left,
            15,
        ),
        rule("ProductionDisambiguationRule", vec![lit("left")]),
        rule("ProductionDisambiguationRule", vec![lit("reduce")]),
        rule("ProductionDisambiguationRule", vec![lit("right")]),
        rule("ProductionDisambiguationRule", vec![lit("shift")]),
        rule("ProductionDisambiguationRule", vec![lit("dynamic")]),
        rule("ProductionDisambiguationRule", vec![lit("nops")]),
        rule("ProductionDisambiguationRule", vec![lit("nopse")]),
        rule("ProductionDisambiguationRule", vec![sym("Prior")]),
        rule_with(
            "ProductionDisambiguationRules",
            vec![
                sym("ProductionDisambiguationRules"),
                lit(","),
                sym("ProductionDisambiguationRule"),
            ],
            left,
            DEFAULT_PRIORITY,
        ),
        rule(
            "ProductionDisambiguationRules",
            vec![sym("ProductionDisambiguationRule")],
        ),
        rule("TerminalDisambiguationRule", vec![lit("prefer")]),
        rule("TerminalDisambiguationRule", vec![lit("finish")]),
        rule("TerminalDisambiguationRule", vec![lit("nofinish")]),
        rule("TerminalDisambiguationRule", vec![lit("dynamic")]),
        rule("TerminalDisambiguationRule", vec![sym("Prior")]),
        rule(
            "TerminalDisambiguationRules",
            vec![
                sym("TerminalDisambiguationRules"),
                lit(","),
                sym("TerminalDisambiguationRule"),
            ],
        ),
        rule(
            "TerminalDisambiguationRules",
            vec![sym("TerminalDisambiguationRule")],
        ),
        rule("Assignment", vec![sym("PlainAssignment")]),
        rule("Assignment", vec![sym("BoolAssignment")]),
        rule("Assignment", vec![sym("GrammarSymbolReference")]),
        rule("Assignments", vec![sym("Assignments"), sym("Assignment")]),
        rule("Assignments", vec![sym("Assignment")]),
        rule(
            "PlainAssignment",
            vec![sym("Name"), lit("="), sym("GrammarSymbolReference")],
        ),
        rule(
            "BoolAssignment",
            vec![sym("Name"), lit("?="), sym("GrammarSymbolReference")],
        ),
        rule(
            "GrammarSymbolReference",
            vec![sym("GrammarSymbol"), sym("OptRepeatOperator")],
        ),
        rule("OptRepeatOperator", vec![sym("RepeatOperatorZero")]),
        rule("OptRepeatOperator", vec![sym("RepeatOperatorOne")]),
        rule("OptRepeatOperator", vec![sym("RepeatOperatorOptional")]),
        rule("OptRepeatOperator", vec![sym("EMPTY")]),
        rule(
            "RepeatOperatorZero",
            vec![lit("*"), sym("OptionalRepeatModifiersExpression")],
        ),
        rule(
            "RepeatOperatorOne",
            vec![lit("+"), sym("OptionalRepeatModifiersExpression")],
        ),
        rule(
            "RepeatOperatorOptional",
            vec![lit("?"), sym("OptionalRepeatModifiersExpression")],
        ),
        rule(
            "OptionalRepeatModifiersExpression",
            vec![lit("["), sym("OptionalRepeatModifiers"), lit("]")],
        ),
        rule("OptionalRepeatModifiersExpression", vec![sym("EMPTY")]),
        rule(
            "OptionalRepeatModifiers",
            vec![
                sym("OptionalRepeatModifiers"),
                lit(","),
                sym("OptionalRepeatModifier"),
            ],
        ),
        rule("OptionalRepeatModifiers", vec![sym("OptionalRepeatModifier")]),
        rule("OptionalRepeatModifier", vec![sym("Name")]),
        rule("GrammarSymbol", vec![sym("Name")]),
        rule("GrammarSymbol", vec![sym("StrTerm")]),
        rule("Recognizer", vec![sym("StrTerm")]),
        rule("Recognizer", vec![sym("RegExTerm")]),
        rule("LAYOUT", vec![sym("LAYOUT_ITEM")]),
        rule("LAYOUT", vec![sym("LAYOUT"), sym("LAYOUT_ITEM")]),
        rule("LAYOUT_ITEM", vec![sym("WS")]),
        rule("LAYOUT_ITEM", vec![sym("Comment")]),
        rule("LAYOUT_ITEM", vec![sym("EMPTY")]),
        rule("Comment", vec![lit("/*"), sym("CORNCS"), lit("*/")]),
        rule("Comment", vec![sym("CommentLine")]),
        rule("CORNCS", vec![sym("CORNC")]),
        rule("CORNCS", vec![sym("CORNCS"), sym("CORNC")]),
        rule("CORNCS", vec![sym("EMPTY")]),
        rule("CORNC", vec![sym("Comment")]),
        rule("CORNC", vec![sym("NotComment")]),
        rule("CORNC", vec![sym("WS")]),
    ];

    let terminals = vec![
        ("Name".to_string(), lexer::NAME_PATTERN.to_string()),
        ("StrTerm".to_string(), lexer::STR_TERM_PATTERN.to_string()),
        ("RegExTerm".to_string(), lexer::REGEX_TERM_PATTERN.to_string()),
        ("Prior".to_string(), lexer::PRIOR_PATTERN.to_string()),
        ("Action".to_string(), lexer::ACTION_PATTERN.to_string()),
        ("WS".to_string(), lexer::WS_PATTERN.to_string()),
        (
            "CommentLine".to_string(),
            lexer::COMMENT_LINE_PATTERN.to_string(),
        ),
        (
            "NotComment".to_string(),
            lexer::NOT_COMMENT_PATTERN.to_string(),
        ),
    ];

    Grammar::from_struct(rules, terminals, Some("PGFile"))
}
