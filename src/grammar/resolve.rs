//! Reference resolution and multiplicity desugaring.
//!
//! Dotted names delegate through the import graph; bare names resolve in the
//! current file. References with multiplicity materialize fresh list/option
//! symbols on first use and reuse them afterwards. Materialized symbols are
//! registered with the root grammar so desugared names are globally unique.

use super::{Grammar, ROOT};
use crate::production::{Production, ProductionRhs, RhsSlot};
use crate::symbol::{multiplicity_name, Multiplicity, MultiplicityOrigin, Reference, Symbol};
use crate::util::Log;
use crate::{BuiltinAction, FilePtr, GrammarError, SymbolPtr, EMPTY};

impl Grammar {
    /// Rewrite every reference slot of this file's productions to the
    /// resolved symbol. Named assignments are rewritten identically.
    pub(crate) fn resolve_file(&mut self, file: FilePtr) -> Result<(), GrammarError> {
        let productions = self.file(file).local_productions.clone();
        for production in productions {
            let slots = self.production(production).rhs.raw().len();
            for index in 0..slots {
                let slot = self.production(production).rhs.raw()[index].clone();
                if let RhsSlot::Ref(mut reference) = slot {
                    let resolved = self.resolve(file, &mut reference)?;
                    self.production_mut(production).rhs.raw_mut()[index] =
                        RhsSlot::Symbol(resolved);
                }
            }
            let names: Vec<String> = self
                .production(production)
                .assignments
                .keys()
                .cloned()
                .collect();
            for name in names {
                let slot = self.production(production).assignments[&name].symbol.clone();
                if let RhsSlot::Ref(mut reference) = slot {
                    let resolved = self.resolve(file, &mut reference)?;
                    self.production_mut(production)
                        .assignments
                        .get_mut(&name)
                        .unwrap()
                        .symbol = RhsSlot::Symbol(resolved);
                }
            }
        }
        Ok(())
    }

    /// Resolve a reference in the context of `file`.
    ///
    /// For a local name this file is searched; for a dotted name the first
    /// segment selects an import and the rest is delegated to the imported
    /// file, parsing it on first use.
    pub(crate) fn resolve(
        &mut self,
        file: FilePtr,
        reference: &mut Reference,
    ) -> Result<SymbolPtr, GrammarError> {
        if let Some(slot) = reference.separator.take() {
            let resolved = match *slot {
                RhsSlot::Ref(mut separator) => self.resolve(file, &mut separator)?,
                RhsSlot::Symbol(ptr) => ptr,
            };
            reference.separator = Some(Box::new(RhsSlot::Symbol(resolved)));
        }

        if let Some((module, local)) = reference.name.split_once('.') {
            let full_name = reference.name.clone();
            let import = match self.file(file).imports_by_name.get(module) {
                Some(import) => *import,
                None => {
                    return Err(GrammarError::new(
                        format!(
                            "Unexisting module \"{}\" in reference \"{}\"",
                            module, full_name
                        ),
                        reference.location.clone(),
                    ))
                }
            };
            reference.name = local.to_string();
            let imported_file = self.materialize_import(import)?;
            return self.resolve(imported_file, reference);
        }

        let base = match self.file(file).symbols_by_name.get(&reference.name) {
            Some(symbol) => *symbol,
            None => {
                return Err(GrammarError::new(
                    format!("Unknown symbol \"{}\"", reference.name),
                    reference.location.clone(),
                ))
            }
        };

        if reference.multiplicity == Multiplicity::One {
            return Ok(base);
        }

        let separator = reference.separator.as_deref().and_then(RhsSlot::symbol);
        let separator_name = separator.map(|ptr| self.symbol(ptr).name.clone());
        let name = multiplicity_name(
            &reference.name,
            reference.multiplicity,
            separator_name.as_deref(),
        );
        if let Some(existing) = self.file(file).symbols_by_name.get(&name) {
            return Ok(*existing);
        }
        self.materialize_multiplicity(file, reference, base, separator)
    }

    /// Create the nonterminal(s) standing in for a reference with
    /// multiplicity, together with their productions and synthesized actions.
    fn materialize_multiplicity(
        &mut self,
        file: FilePtr,
        reference: &Reference,
        base: SymbolPtr,
        separator: Option<SymbolPtr>,
    ) -> Result<SymbolPtr, GrammarError> {
        let location = self.symbol(base).location.clone();
        let imported_with = self.file(file).imported_with;
        let separator_name = separator.map(|ptr| self.symbol(ptr).name.clone());

        match reference.multiplicity {
            Multiplicity::OneOrMore | Multiplicity::ZeroOrMore => {
                let one_name = multiplicity_name(
                    &reference.name,
                    Multiplicity::OneOrMore,
                    separator_name.as_deref(),
                );
                let one = match self.file(file).symbols_by_name.get(&one_name).copied() {
                    Some(existing) => existing,
                    None => {
                        let mut symbol =
                            Symbol::nonterminal(one_name, location.clone(), imported_with);
                        symbol.action_name = Some(
                            if separator.is_some() {
                                "collect_sep"
                            } else {
                                "collect"
                            }
                            .to_string(),
                        );
                        symbol.nonterminal_info_mut().unwrap().origin =
                            Some(MultiplicityOrigin {
                                base,
                                multiplicity: Multiplicity::OneOrMore,
                                separator,
                            });
                        let one = self.add_symbol(symbol);

                        let mut recursive = vec![one];
                        if let Some(separator) = separator {
                            recursive.push(separator);
                        }
                        recursive.push(base);
                        self.add_production(Production::new(
                            one,
                            ProductionRhs::of_symbols(recursive),
                        ));
                        self.add_production(Production::new(
                            one,
                            ProductionRhs::of_symbols(vec![base]),
                        ));
                        self.register_symbol(file, one);
                        self.log_materialized(one);
                        one
                    }
                };

                if reference.multiplicity == Multiplicity::ZeroOrMore {
                    let zero_name = multiplicity_name(
                        &reference.name,
                        Multiplicity::ZeroOrMore,
                        separator_name.as_deref(),
                    );
                    let mut symbol = Symbol::nonterminal(zero_name, location, imported_with);
                    // The wrapper's result is the collected list of the head
                    // child, or an empty list for the EMPTY alternative.
                    symbol.grammar_action = Some(BuiltinAction::HeadOrEmpty);
                    symbol.nonterminal_info_mut().unwrap().origin = Some(MultiplicityOrigin {
                        base,
                        multiplicity: Multiplicity::ZeroOrMore,
                        separator,
                    });
                    let zero = self.add_symbol(symbol);

                    let mut head = Production::new(zero, ProductionRhs::of_symbols(vec![one]));
                    head.nops = true;
                    self.add_production(head);
                    self.add_production(Production::new(
                        zero,
                        ProductionRhs::of_symbols(vec![EMPTY]),
                    ));
                    self.register_symbol(file, zero);
                    self.log_materialized(zero);
                    Ok(zero)
                } else {
                    Ok(one)
                }
            }
            Multiplicity::Optional => {
                if separator.is_some() {
                    return Err(GrammarError::new(
                        format!(
                            "Repetition modifier not allowed for optional (?) for symbol \"{}\".",
                            reference.name
                        ),
                        reference.location.clone(),
                    ));
                }
                let optional_name =
                    multiplicity_name(&reference.name, Multiplicity::Optional, None);
                let mut symbol = Symbol::nonterminal(optional_name, location, imported_with);
                symbol.action_name = Some("optional".to_string());
                symbol.nonterminal_info_mut().unwrap().origin = Some(MultiplicityOrigin {
                    base,
                    multiplicity: Multiplicity::Optional,
                    separator: None,
                });
                let optional = self.add_symbol(symbol);
                self.add_production(Production::new(
                    optional,
                    ProductionRhs::of_symbols(vec![base]),
                ));
                self.add_production(Production::new(
                    optional,
                    ProductionRhs::of_symbols(vec![EMPTY]),
                ));
                self.register_symbol(file, optional);
                self.log_materialized(optional);
                Ok(optional)
            }
            Multiplicity::One => unreachable!("plain references resolve without materialization"),
        }
    }

    /// Register a symbol materialized while resolving `file`. The symbol is
    /// indexed locally and, under its FQN, at the root grammar which also
    /// adopts its productions.
    pub(crate) fn register_symbol(&mut self, file: FilePtr, ptr: SymbolPtr) {
        if file != ROOT {
            let name = self.symbol(ptr).name.clone();
            self.file_mut(file).symbols_by_name.insert(name, ptr);
        }
        let fqn = self.fqn(ptr);
        if !self.file(ROOT).symbols_by_name.contains_key(&fqn) {
            self.file_mut(ROOT).symbols_by_name.insert(fqn, ptr);
            if self.symbol(ptr).is_terminal() {
                self.file_mut(ROOT).terminals.push(ptr);
            } else {
                self.file_mut(ROOT).nonterminals.push(ptr);
            }
            let productions = self
                .symbol(ptr)
                .nonterminal_info()
                .map(|info| info.productions.clone())
                .unwrap_or_default();
            self.production_list.extend(productions);
        }
    }

    fn log_materialized(&self, ptr: SymbolPtr) {
        self.log.log_event(Log::Verbose(()), "desugar", || {
            format!("materialized symbol \"{}\"", self.symbol(ptr).name)
        });
    }
}
