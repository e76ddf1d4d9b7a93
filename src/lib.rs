//! A grammar compilation frontend for LR/GLR parser generators.
//!
//! # Overview
//! Parser generators are usually split into a *frontend* which understands a
//! textual grammar language and a *backend* which builds parse tables and runs
//! the generated automaton. This library implements the frontend: it ingests a
//! grammar description, desugars EBNF-style repetition operators into plain
//! productions, resolves cross-file imports, binds token recognizers and hands
//! a validated [Grammar] to the table builder.
//!
//! The grammar language itself is described by a bootstrapped
//! grammar-of-grammars hard-coded in this crate, and grammar text is parsed by
//! a host parser whose semantic actions directly produce the production,
//! terminal and import declarations consumed by the compilation pipeline.
//!
//! # Example
//!
//! ```
//! use lang_gram::Grammar;
//!
//! let grammar = Grammar::from_string(
//!     r#"
//!     Statements: Statement*[semicolon];
//!     Statement: "let" Name;
//!     terminals
//!     Name: /[a-z]+/;
//!     semicolon: ";";
//!     "#,
//! )
//! .unwrap();
//!
//! // The augmented production is always first.
//! assert_eq!(grammar.get_production_id("S'"), Some(0));
//! // `Statement*[semicolon]` produced list symbols behind the scenes.
//! assert!(grammar.get_nonterminal("Statement_1_semicolon").is_some());
//! assert!(grammar.get_nonterminal("Statement_0_semicolon").is_some());
//! ```
//!
//! # Design
//!
//! Symbols, productions, grammar files and imports live in arenas owned by the
//! [Grammar] under construction and are addressed through copyable index
//! handles ([SymbolPtr], [ProdPtr], [ImportPtr], [FilePtr]). Identity
//! comparisons therefore map to handle equality, and the possibly cyclic
//! import graph needs no owning back-pointers.

mod actions;
mod bootstrap;
mod error;
mod grammar;
mod production;
mod recognizer;
mod symbol;
mod util;

pub use actions::BuiltinAction;
pub use grammar::{
    Grammar, GrammarFile, GrammarImport, GrammarOptions, SideRecognizerLoader, StructElem,
    StructRule,
};
pub use production::{Associativity, Production, ProductionRhs, RhsSlot};
pub use recognizer::{
    ExternalRecognizer, ReFlags, Recognizer, RecognizerCollector, RecognizerFn, RegexRecognizer,
    StrRecognizer,
};
pub use symbol::{
    multiplicity_name, AssignOp, Assignment, Multiplicity, MultiplicityOrigin, NonTerminalInfo,
    Reference, RuleAttribute, RuleType, Symbol, SymbolKind, TerminalInfo,
};
pub use util::{Location, Log, Position, SourceText};

/// Default lexical/production priority assigned when the grammar gives none.
pub const DEFAULT_PRIORITY: u32 = 10;

/// Names which may not be used for user rules.
pub const RESERVED_SYMBOL_NAMES: [&str; 3] = ["EOF", "STOP", "EMPTY"];

/// Names with defined special semantics (keyword boundary rewriting, scanner
/// layout).
pub const SPECIAL_SYMBOL_NAMES: [&str; 2] = ["KEYWORD", "LAYOUT"];

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// A handle of a grammar symbol inside the [Grammar] symbol arena.
pub struct SymbolPtr(pub(crate) usize);

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// A handle of a production inside the [Grammar] production arena.
pub struct ProdPtr(pub(crate) usize);

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// A handle of an import record inside the [Grammar] import arena.
pub struct ImportPtr(pub(crate) usize);

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// A handle of a parsed grammar file inside the [Grammar] file arena.
pub struct FilePtr(pub(crate) usize);

/// The EMPTY sentinel terminal. Matches nothing and always succeeds.
pub const EMPTY: SymbolPtr = SymbolPtr(0);
/// The EOF sentinel terminal. Succeeds only at the end of input.
pub const EOF: SymbolPtr = SymbolPtr(1);
/// The STOP sentinel terminal, appended after the start symbol by the
/// augmented production. Never matches user input.
pub const STOP: SymbolPtr = SymbolPtr(2);

#[derive(Debug, Clone)]
/// The single error kind of the grammar compiler.
///
/// Every failure of the compilation pipeline carries a human readable message
/// and, where one is known, the [Location] of the offending construct.
pub struct GrammarError {
    message: String,
    location: Option<Location>,
}
