//! Debug printing and grammar-language serialization.

use super::Grammar;
use crate::production::RhsSlot;
use crate::recognizer::Recognizer;
use crate::symbol::Multiplicity;
use crate::{Associativity, ProdPtr, SymbolPtr, DEFAULT_PRIORITY, EMPTY, EOF, STOP};
use ptree::{print_tree, Style, TreeItem};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io;

#[derive(Clone)]
struct DebugNode {
    text: String,
    children: Vec<DebugNode>,
}

impl DebugNode {
    fn leaf(text: String) -> Self {
        Self {
            text,
            children: Vec::new(),
        }
    }

    fn branch(text: &str, children: Vec<DebugNode>) -> Self {
        Self {
            text: text.to_string(),
            children,
        }
    }
}

impl TreeItem for DebugNode {
    type Child = DebugNode;

    fn write_self<W: io::Write>(&self, f: &mut W, _: &Style) -> io::Result<()> {
        write!(f, "{}", self.text)
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}

impl Grammar {
    /// Human readable form of one production, including its id once
    /// enumerated.
    pub fn production_text(&self, ptr: ProdPtr) -> String {
        let production = self.production(ptr);
        let rhs = production
            .rhs
            .raw()
            .iter()
            .map(|slot| match slot {
                RhsSlot::Symbol(symbol) => self.symbol(*symbol).name.clone(),
                RhsSlot::Ref(reference) => reference.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        match production.prod_id {
            Some(id) => format!("{}: {} = {}", id, self.symbol(production.lhs).name, rhs),
            None => format!("{} = {}", self.symbol(production.lhs).name, rhs),
        }
    }

    /// Print the grammar structure: terminals, nonterminals and the
    /// enumerated production list.
    pub fn print_debug(&self) -> io::Result<()> {
        let terminals = self
            .root()
            .terminals
            .iter()
            .map(|ptr| {
                let symbol = self.symbol(*ptr);
                let recognizer = symbol
                    .terminal_info()
                    .and_then(|info| info.recognizer.as_ref())
                    .map(|recognizer| format!(" {}", recognizer))
                    .unwrap_or_default();
                DebugNode::leaf(format!("{}{}", self.fqn(*ptr), recognizer))
            })
            .collect();
        let nonterminals = self
            .root()
            .nonterminals
            .iter()
            .map(|ptr| DebugNode::leaf(self.fqn(*ptr)))
            .collect();
        let productions = self
            .production_list
            .iter()
            .map(|ptr| DebugNode::leaf(self.production_text(*ptr)))
            .collect();
        let tree = DebugNode::branch(
            "Grammar",
            vec![
                DebugNode::branch("Terminals", terminals),
                DebugNode::branch("NonTerminals", nonterminals),
                DebugNode::branch("Productions", productions),
            ],
        );
        print_tree(&tree)
    }

    /// Emit grammar-language text for the supported fragment: single-file
    /// grammars whose multiplicity symbols are reconstructed back into
    /// `*`/`+`/`?` operators. Reparsing the result yields an equal grammar
    /// under symbol-name and production-sequence comparison.
    pub fn serialize(&self) -> String {
        let mut order: Vec<SymbolPtr> = Vec::new();
        let mut groups: HashMap<SymbolPtr, Vec<ProdPtr>> = HashMap::new();
        for &ptr in &self.production_list {
            let lhs = self.production(ptr).lhs;
            if Some(lhs) == self.augmented_symbol {
                continue;
            }
            let synthesized = self
                .symbol(lhs)
                .nonterminal_info()
                .map(|info| info.origin.is_some())
                .unwrap_or(false);
            if synthesized {
                continue;
            }
            groups.entry(lhs).or_insert_with(|| {
                order.push(lhs);
                Vec::new()
            });
            groups.get_mut(&lhs).unwrap().push(ptr);
        }

        let mut out = String::new();
        for lhs in order {
            let symbol = self.symbol(lhs);
            if let Some(action) = &symbol.action_name {
                if action != "obj" {
                    let _ = writeln!(out, "@{}", action);
                }
            }
            let alternatives = groups[&lhs]
                .iter()
                .map(|ptr| self.serialize_production(*ptr))
                .collect::<Vec<_>>()
                .join(" | ");
            let _ = writeln!(out, "{}: {};", symbol.name, alternatives);
        }

        let terminals: Vec<SymbolPtr> = self
            .root()
            .terminals
            .iter()
            .copied()
            .filter(|ptr| *ptr != EMPTY && *ptr != EOF && *ptr != STOP)
            .filter(|ptr| !self.is_inline_literal(*ptr))
            .collect();
        if !terminals.is_empty() {
            let _ = writeln!(out, "terminals");
            for ptr in terminals {
                let symbol = self.symbol(ptr);
                if let Some(action) = &symbol.action_name {
                    let _ = writeln!(out, "@{}", action);
                }
                let info = symbol.terminal_info().unwrap();
                let body = match &info.recognizer {
                    Some(Recognizer::Str(literal)) => {
                        format!(" \"{}\"", escape_literal(&literal.value))
                    }
                    Some(Recognizer::Regex(regex)) => format!(" /{}/", regex.pattern()),
                    _ => String::new(),
                };
                let mut atoms = Vec::new();
                if info.prior != DEFAULT_PRIORITY {
                    atoms.push(info.prior.to_string());
                }
                match info.finish {
                    Some(true) => atoms.push("finish".to_string()),
                    Some(false) => atoms.push("nofinish".to_string()),
                    None => {}
                }
                if info.prefer {
                    atoms.push("prefer".to_string());
                }
                if info.dynamic {
                    atoms.push("dynamic".to_string());
                }
                if atoms.is_empty() {
                    let _ = writeln!(out, "{}:{};", symbol.name, body);
                } else {
                    let _ = writeln!(out, "{}:{} {{{}}};", symbol.name, body, atoms.join(", "));
                }
            }
        }
        out
    }

    fn serialize_production(&self, ptr: ProdPtr) -> String {
        let production = self.production(ptr);
        let mut parts = Vec::new();
        for (index, slot) in production.rhs.raw().iter().enumerate() {
            let symbol = slot
                .symbol()
                .expect("serialized grammars are finalized and fully resolved");
            let mut text = self.serialize_symbol_ref(symbol);
            if let Some((name, assignment)) = production
                .assignments
                .iter()
                .find(|(_, assignment)| assignment.index == Some(index))
            {
                text = format!(
                    "{}{}{}",
                    name,
                    assignment.op.map(|op| op.as_str()).unwrap_or("="),
                    text
                );
            }
            parts.push(text);
        }

        let mut atoms = Vec::new();
        match production.assoc {
            Associativity::Left => atoms.push("left".to_string()),
            Associativity::Right => atoms.push("right".to_string()),
            Associativity::None => {}
        }
        if production.prior != DEFAULT_PRIORITY {
            atoms.push(production.prior.to_string());
        }
        if production.dynamic {
            atoms.push("dynamic".to_string());
        }
        if production.nops {
            atoms.push("nops".to_string());
        }
        if production.nopse {
            atoms.push("nopse".to_string());
        }
        if !atoms.is_empty() {
            parts.push(format!("{{{}}}", atoms.join(", ")));
        }
        parts.join(" ")
    }

    /// A RHS citation: multiplicity symbols render as their operator form,
    /// literal-named terminals as quoted literals.
    fn serialize_symbol_ref(&self, ptr: SymbolPtr) -> String {
        let symbol = self.symbol(ptr);
        if let Some(origin) = symbol.nonterminal_info().and_then(|info| info.origin) {
            let operator = match origin.multiplicity {
                Multiplicity::Optional => "?",
                Multiplicity::OneOrMore => "+",
                Multiplicity::ZeroOrMore => "*",
                Multiplicity::One => unreachable!("materialized symbols carry multiplicity"),
            };
            let base = &self.symbol(origin.base).name;
            return match origin.separator {
                Some(separator) => format!(
                    "{}{}[{}]",
                    base,
                    operator,
                    self.symbol(separator).name
                ),
                None => format!("{}{}", base, operator),
            };
        }
        if self.is_inline_literal(ptr) {
            let literal = symbol
                .terminal_info()
                .and_then(|info| info.recognizer.as_ref())
                .and_then(Recognizer::as_str)
                .unwrap();
            return format!("\"{}\"", escape_literal(&literal.value));
        }
        symbol.name.clone()
    }

    /// Terminals whose name equals their literal value serialize inline.
    fn is_inline_literal(&self, ptr: SymbolPtr) -> bool {
        let symbol = self.symbol(ptr);
        symbol
            .terminal_info()
            .and_then(|info| info.recognizer.as_ref())
            .and_then(Recognizer::as_str)
            .map(|literal| literal.value == symbol.name)
            .unwrap_or(false)
    }
}

fn escape_literal(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}
