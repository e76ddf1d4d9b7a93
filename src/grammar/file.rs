//! Per-file symbol table construction: collect-and-unify, then (after
//! reference resolution) recognizer binding.

use super::{Grammar, GrammarImport, ROOT};
use crate::bootstrap::FileDecl;
use crate::production::{Production, ProductionRhs};
use crate::recognizer::{ExternalRecognizer, Recognizer};
use crate::symbol::Symbol;
use crate::util::Log;
use crate::{FilePtr, GrammarError, ImportPtr, SymbolPtr, EMPTY, EOF, STOP};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

impl Grammar {
    /// Collect non-terminals and terminals defined in this file and make
    /// sure there is only one symbol instance for each of them.
    pub(crate) fn collect_file(
        &mut self,
        file: FilePtr,
        decl: FileDecl,
    ) -> Result<(), GrammarError> {
        let imported_with = self.file(file).imported_with;

        for rule_type in decl.rule_types {
            match self
                .rule_types
                .iter_mut()
                .find(|t| t.rule_name == rule_type.rule_name)
            {
                Some(existing) => {
                    for attribute in rule_type.attributes {
                        existing.merge(attribute);
                    }
                }
                None => self.rule_types.push(rule_type),
            }
        }

        for import in decl.imports {
            let ptr = ImportPtr(self.imports.len());
            self.imports.push(GrammarImport {
                module_name: import.module_name.clone(),
                file_path: import.file_path,
                imported_with,
                location: Some(import.location),
                file: None,
            });
            self.file_mut(file)
                .imports_by_name
                .insert(import.module_name, ptr);
        }

        // Terminal uniqueness in both name and recognized string.
        let mut terminals_by_value: HashMap<String, SymbolPtr> = HashMap::new();
        for term in decl.terminals {
            if self.file(file).symbols_by_name.contains_key(&term.name) {
                return Err(GrammarError::new(
                    format!("Multiple definitions of terminal rule \"{}\"", term.name),
                    term.location,
                ));
            }
            if let Some(Recognizer::Str(recognizer)) = &term.recognizer {
                if let Some(&previous) = terminals_by_value.get(&recognizer.value) {
                    return Err(GrammarError::new(
                        format!(
                            "Terminals \"{}\" and \"{}\" match the same string.",
                            term.name,
                            self.symbol(previous).name
                        ),
                        term.location,
                    ));
                }
            }
            let value = term
                .recognizer
                .as_ref()
                .and_then(Recognizer::as_str)
                .map(|recognizer| recognizer.value.clone());
            let mut symbol =
                Symbol::terminal(term.name, term.recognizer, term.location, imported_with);
            symbol.action_name = term.action_name;
            {
                let info = symbol.terminal_info_mut().unwrap();
                info.prior = term.prior;
                info.finish = term.finish;
                info.prefer = term.prefer;
                info.dynamic = term.dynamic;
            }
            let name = symbol.name.clone();
            let ptr = self.add_symbol(symbol);
            if let Some(value) = value {
                terminals_by_value.insert(value, ptr);
            }
            let entry = self.file_mut(file);
            entry.terminals.push(ptr);
            entry.symbols_by_name.insert(name, ptr);
        }

        for rule in decl.rules {
            let lhs = match self.file(file).symbols_by_name.get(&rule.lhs).copied() {
                Some(existing) => {
                    if self.symbol(existing).is_terminal() {
                        return Err(GrammarError::new(
                            format!("Rule \"{}\" already defined as terminal", rule.lhs),
                            rule.location,
                        ));
                    }
                    // Unify with the earlier definition; rule-level actions
                    // of all definitions must agree.
                    let old_action = self.symbol(existing).action_name.clone();
                    match (old_action, rule.action_name.clone()) {
                        (Some(old), Some(new)) if old != new => {
                            return Err(GrammarError::new(
                                format!(
                                    "Multiple different grammar actions for rule \"{}\".",
                                    rule.lhs
                                ),
                                self.symbol(existing).location.clone(),
                            ));
                        }
                        (None, Some(new)) => {
                            self.symbol_mut(existing).action_name = Some(new);
                        }
                        _ => {}
                    }
                    existing
                }
                None => {
                    let mut symbol = Symbol::nonterminal(rule.lhs, rule.location, imported_with);
                    symbol.action_name = rule.action_name;
                    let name = symbol.name.clone();
                    let ptr = self.add_symbol(symbol);
                    let entry = self.file_mut(file);
                    entry.nonterminals.push(ptr);
                    entry.symbols_by_name.insert(name, ptr);
                    ptr
                }
            };

            let slots = rule
                .assignments
                .iter()
                .map(|assignment| assignment.symbol.clone())
                .collect();
            let mut production = Production::new(lhs, ProductionRhs::new(slots));
            for assignment in rule.assignments {
                if let Some(name) = assignment.name.clone() {
                    production.assignments.insert(name, assignment);
                }
            }
            production.assoc = rule.assoc;
            production.prior = rule.prior;
            production.dynamic = rule.dynamic;
            production.nops = rule.nops;
            production.nopse = rule.nopse;

            let ptr = self.add_production(production);
            self.file_mut(file).local_productions.push(ptr);
            if file == ROOT {
                self.production_list.push(ptr);
            }
        }

        // The sentinels are reachable under their reserved names in every
        // file.
        let entry = self.file_mut(file);
        entry.terminals.extend([EMPTY, EOF, STOP]);
        entry.symbols_by_name.insert("EMPTY".to_string(), EMPTY);
        entry.symbols_by_name.insert("EOF".to_string(), EOF);
        entry.symbols_by_name.insert("STOP".to_string(), STOP);

        self.log.log_event(Log::Verbose(()), "collect", || {
            format!(
                "collected {} terminals and {} rules",
                self.file(file).terminals.len() - 3,
                self.file(file).local_productions.len()
            )
        });
        Ok(())
    }

    /// Bind override and side-file recognizers onto the terminals of this
    /// file. Built-in recognizers from the grammar text stay when no entry
    /// names them.
    pub(crate) fn bind_recognizers(&mut self, file: FilePtr) -> Result<(), GrammarError> {
        let side = match (&self.file(file).file_path, &self.options.side_recognizers) {
            (Some(path), Some(loader)) => {
                let side_path = side_file_path(path);
                loader(&side_path).map(|collector| (side_path, collector))
            }
            _ => None,
        };

        let mut entries: Vec<(String, SymbolPtr)> = self
            .file(file)
            .symbols_by_name
            .iter()
            .map(|(name, ptr)| (name.clone(), *ptr))
            .collect();
        entries.sort();
        for (name, ptr) in entries {
            if ptr == EMPTY || ptr == EOF || ptr == STOP {
                continue;
            }
            let fqn = self.fqn(ptr);
            if let Some(func) = self
                .options
                .recognizers
                .as_ref()
                .and_then(|collector| collector.get(&fqn))
                .cloned()
            {
                if !self.symbol(ptr).is_terminal() {
                    return Err(GrammarError::new(
                        format!(
                            "Recognizer given for non-terminal \"{}\" in recognizers parameters.",
                            fqn
                        ),
                        self.symbol(ptr).location.clone(),
                    ));
                }
                let recognizer = Recognizer::External(ExternalRecognizer::new(fqn, func));
                self.symbol_mut(ptr).terminal_info_mut().unwrap().recognizer = Some(recognizer);
                continue;
            }
            if let Some((side_path, collector)) = &side {
                if let Some(func) = collector.get(&name).cloned() {
                    if !self.symbol(ptr).is_terminal() {
                        return Err(GrammarError::new(
                            format!(
                                "Recognizer given for non-terminal \"{}\" in file \"{}\"",
                                name,
                                side_path.display()
                            ),
                            self.symbol(ptr).location.clone(),
                        ));
                    }
                    let recognizer = Recognizer::External(ExternalRecognizer::new(name, func));
                    self.symbol_mut(ptr).terminal_info_mut().unwrap().recognizer =
                        Some(recognizer);
                }
            }
        }
        Ok(())
    }
}

/// `<dir>/<basename>_recognizers.<ext>`: the sibling file recognizers are
/// loaded from.
pub(crate) fn side_file_path(grammar_path: &Path) -> PathBuf {
    let stem = grammar_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{}_recognizers", stem);
    if let Some(ext) = grammar_path.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    grammar_path
        .parent()
        .map(|dir| dir.join(&name))
        .unwrap_or_else(|| PathBuf::from(name))
}
