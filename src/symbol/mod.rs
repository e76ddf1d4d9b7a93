//! Typed grammar entities: symbols, references and named matches.

mod reference;

use crate::recognizer::Recognizer;
use crate::util::Location;
use crate::{BuiltinAction, ImportPtr, ProdPtr, RhsSlot, SymbolPtr, DEFAULT_PRIORITY};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Multiplicity of a symbol reference inside a production RHS. The ordering
/// is by width and is used when merging attribute declarations.
pub enum Multiplicity {
    One,
    Optional,
    OneOrMore,
    ZeroOrMore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Named match operator: `=` binds the matched value, `?=` binds whether the
/// symbol matched at all.
pub enum AssignOp {
    Plain,
    Bool,
}

/// Terminal attributes and the bound recognizer.
///
/// `recognizer` is `None` for terminals declared with an empty body; those
/// must receive an external recognizer before finalization unless recognizer
/// checks are disabled.
#[derive(Debug, Clone)]
pub struct TerminalInfo {
    pub recognizer: Option<Recognizer>,
    pub prior: u32,
    pub finish: Option<bool>,
    pub prefer: bool,
    pub dynamic: bool,
    pub keyword: bool,
}

/// Where a materialized multiplicity symbol came from.
#[derive(Debug, Clone, Copy)]
pub struct MultiplicityOrigin {
    pub base: SymbolPtr,
    pub multiplicity: Multiplicity,
    pub separator: Option<SymbolPtr>,
}

/// Alternative productions of a nonterminal, plus the desugaring origin for
/// symbols synthesized from multiplicity references.
#[derive(Debug, Clone, Default)]
pub struct NonTerminalInfo {
    pub productions: Vec<ProdPtr>,
    pub origin: Option<MultiplicityOrigin>,
}

#[derive(Debug, Clone)]
pub enum SymbolKind {
    Terminal(TerminalInfo),
    NonTerminal(NonTerminalInfo),
}

/// A grammar symbol.
///
/// Symbols are owned by the [Grammar](crate::Grammar) arena; identity is the
/// [SymbolPtr] handle. The fully qualified name is derived from the
/// `imported_with` chain and computed by
/// [Grammar::fqn](crate::Grammar::fqn).
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub location: Option<Location>,
    pub action_name: Option<String>,
    pub action: Option<BuiltinAction>,
    pub grammar_action: Option<BuiltinAction>,
    pub imported_with: Option<ImportPtr>,
    pub kind: SymbolKind,
}

#[derive(Debug, Clone)]
/// An unresolved citation of a symbol inside a production RHS. References are
/// consumed during resolution: the containing slot is rewritten to the
/// resolved symbol.
pub struct Reference {
    /// The referred name, possibly dotted for imported symbols, without
    /// multiplicity decoration.
    pub name: String,
    pub location: Option<Location>,
    pub multiplicity: Multiplicity,
    /// Separator reference or already resolved separator symbol.
    pub separator: Option<Box<RhsSlot>>,
}

#[derive(Debug, Clone)]
/// A named match (`x = A`, `x ?= A`) or a bare reference inside a production.
pub struct Assignment {
    pub name: Option<String>,
    pub op: Option<AssignOp>,
    pub symbol: RhsSlot,
    /// Name of the referenced symbol without multiplicity decoration.
    pub symbol_name: String,
    pub multiplicity: Multiplicity,
    /// Index of this assignment inside the production RHS.
    pub index: Option<usize>,
}

#[derive(Debug, Clone)]
/// An attribute a rule exposes through a named match.
pub struct RuleAttribute {
    pub name: String,
    pub multiplicity: Multiplicity,
    /// The name of the referred grammar rule, doubling as the value type.
    pub type_name: String,
}

#[derive(Debug, Clone)]
/// The record descriptor of a rule with named matches: the runtime parser
/// builds a name-indexed record with these fields instead of a positional
/// tuple.
pub struct RuleType {
    pub rule_name: String,
    pub attributes: Vec<RuleAttribute>,
}

impl Symbol {
    pub fn terminal(
        name: impl Into<String>,
        recognizer: Option<Recognizer>,
        location: Option<Location>,
        imported_with: Option<ImportPtr>,
    ) -> Self {
        Self {
            name: escape_name(name.into()),
            location,
            action_name: None,
            action: None,
            grammar_action: None,
            imported_with,
            kind: SymbolKind::Terminal(TerminalInfo {
                recognizer,
                prior: DEFAULT_PRIORITY,
                finish: None,
                prefer: false,
                dynamic: false,
                keyword: false,
            }),
        }
    }

    pub fn nonterminal(
        name: impl Into<String>,
        location: Option<Location>,
        imported_with: Option<ImportPtr>,
    ) -> Self {
        Self {
            name: escape_name(name.into()),
            location,
            action_name: None,
            action: None,
            grammar_action: None,
            imported_with,
            kind: SymbolKind::NonTerminal(NonTerminalInfo::default()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, SymbolKind::Terminal(_))
    }

    pub fn is_nonterminal(&self) -> bool {
        matches!(self.kind, SymbolKind::NonTerminal(_))
    }

    pub fn terminal_info(&self) -> Option<&TerminalInfo> {
        match &self.kind {
            SymbolKind::Terminal(info) => Some(info),
            SymbolKind::NonTerminal(_) => None,
        }
    }

    pub fn terminal_info_mut(&mut self) -> Option<&mut TerminalInfo> {
        match &mut self.kind {
            SymbolKind::Terminal(info) => Some(info),
            SymbolKind::NonTerminal(_) => None,
        }
    }

    pub fn nonterminal_info(&self) -> Option<&NonTerminalInfo> {
        match &self.kind {
            SymbolKind::NonTerminal(info) => Some(info),
            SymbolKind::Terminal(_) => None,
        }
    }

    pub fn nonterminal_info_mut(&mut self) -> Option<&mut NonTerminalInfo> {
        match &mut self.kind {
            SymbolKind::NonTerminal(info) => Some(info),
            SymbolKind::Terminal(_) => None,
        }
    }
}

impl Multiplicity {
    /// Suffix used when naming symbols materialized for this multiplicity.
    pub fn name_suffix(&self) -> Option<&'static str> {
        match self {
            Multiplicity::One => None,
            Multiplicity::Optional => Some("opt"),
            Multiplicity::OneOrMore => Some("1"),
            Multiplicity::ZeroOrMore => Some("0"),
        }
    }
}

impl Display for Multiplicity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Multiplicity::One => "1",
            Multiplicity::Optional => "0..1",
            Multiplicity::OneOrMore => "1..*",
            Multiplicity::ZeroOrMore => "0..*",
        };
        write!(f, "{}", text)
    }
}

/// The name of the symbol standing in for a reference with multiplicity,
/// e.g. `spam*[comma]` becomes `spam_0_comma`.
pub fn multiplicity_name(
    symbol_name: &str,
    multiplicity: Multiplicity,
    separator_name: Option<&str>,
) -> String {
    match multiplicity.name_suffix() {
        None => symbol_name.to_string(),
        Some(suffix) => match separator_name {
            Some(sep) => format!("{}_{}_{}", symbol_name, suffix, sep),
            None => format!("{}_{}", symbol_name, suffix),
        },
    }
}

/// Symbol names keep control characters printable.
fn escape_name(name: String) -> String {
    if name.contains('\n') || name.contains('\t') {
        name.replace('\n', "\\n").replace('\t', "\\t")
    } else {
        name
    }
}
