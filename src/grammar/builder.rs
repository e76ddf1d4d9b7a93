//! Struct-based grammar construction, used to bootstrap the grammar language
//! parser and available to hosts that prefer building grammars in code.

use super::{Grammar, GrammarOptions};
use crate::bootstrap::{FileDecl, RuleDecl, TermDecl};
use crate::recognizer::{ReFlags, Recognizer, RegexRecognizer, StrRecognizer};
use crate::symbol::{Assignment, Reference};
use crate::{Associativity, GrammarError, DEFAULT_PRIORITY};
use std::collections::HashSet;

#[derive(Debug, Clone)]
/// An element of a struct-built production RHS: a symbol reference by name or
/// an inline string literal hoisted into a terminal.
pub enum StructElem {
    Sym(String),
    Lit(String),
}

impl StructElem {
    pub fn sym(name: impl Into<String>) -> Self {
        StructElem::Sym(name.into())
    }

    pub fn lit(value: impl Into<String>) -> Self {
        StructElem::Lit(value.into())
    }
}

#[derive(Debug, Clone)]
/// A production given in struct form: LHS name, RHS elements and optional
/// disambiguation.
pub struct StructRule {
    pub lhs: String,
    pub rhs: Vec<StructElem>,
    pub assoc: Associativity,
    pub prior: u32,
}

impl StructRule {
    pub fn new(lhs: impl Into<String>, rhs: Vec<StructElem>) -> Self {
        Self::with(lhs, rhs, Associativity::None, DEFAULT_PRIORITY)
    }

    pub fn with(
        lhs: impl Into<String>,
        rhs: Vec<StructElem>,
        assoc: Associativity,
        prior: u32,
    ) -> Self {
        Self {
            lhs: lhs.into(),
            rhs,
            assoc,
            prior,
        }
    }
}

impl Grammar {
    /// Build a grammar from production structs and `(name, regex)` terminal
    /// definitions. Inline string literals become terminals named by their
    /// value, recognized literally.
    pub fn from_struct(
        rules: Vec<StructRule>,
        terminals: Vec<(String, String)>,
        start_symbol: Option<&str>,
    ) -> Result<Grammar, GrammarError> {
        let mut terminal_decls = Vec::with_capacity(terminals.len());
        for (name, pattern) in terminals {
            let regex = RegexRecognizer::new(&pattern, ReFlags::default(), false)?;
            terminal_decls.push(TermDecl::new(name, Some(Recognizer::Regex(regex)), None));
        }

        let mut inline_names: HashSet<String> = HashSet::new();
        let mut inline_terminals = Vec::new();
        let mut rule_decls = Vec::with_capacity(rules.len());
        for rule in rules {
            let assignments = rule
                .rhs
                .into_iter()
                .map(|element| {
                    let name = match element {
                        StructElem::Sym(name) => name,
                        StructElem::Lit(value) => {
                            if inline_names.insert(value.clone()) {
                                inline_terminals.push(TermDecl::new(
                                    value.clone(),
                                    Some(Recognizer::Str(StrRecognizer::new(
                                        value.clone(),
                                        false,
                                    ))),
                                    None,
                                ));
                            }
                            value
                        }
                    };
                    Assignment::reference(Reference::new(name, None))
                })
                .collect();
            rule_decls.push(RuleDecl {
                lhs: rule.lhs,
                location: None,
                action_name: None,
                assignments,
                assoc: rule.assoc,
                prior: rule.prior,
                dynamic: false,
                nops: false,
                nopse: false,
            });
        }
        terminal_decls.append(&mut inline_terminals);

        let decl = FileDecl {
            imports: Vec::new(),
            rules: rule_decls,
            terminals: terminal_decls,
            rule_types: Vec::new(),
        };
        let mut options = GrammarOptions::new();
        if let Some(name) = start_symbol {
            options.start_symbol = Some(name.to_string());
        }
        Grammar::build(decl, None, options)
    }
}
