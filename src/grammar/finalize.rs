//! Grammar finalization: augmentation, recognizer checks, production
//! enumeration, keyword boundary rewriting and action resolution.

use super::{Grammar, ROOT};
use crate::production::{Production, ProductionRhs};
use crate::recognizer::{ReFlags, Recognizer, RegexRecognizer};
use crate::symbol::Symbol;
use crate::util::Log;
use crate::{BuiltinAction, GrammarError, SymbolPtr, STOP};
use std::collections::HashMap;

impl Grammar {
    pub(crate) fn finalize(&mut self) -> Result<(), GrammarError> {
        let start = match self.options.start_symbol.clone() {
            Some(name) => self
                .production_list
                .iter()
                .map(|ptr| self.production(*ptr).lhs)
                .find(|lhs| self.symbol(*lhs).name == name)
                .ok_or_else(|| {
                    GrammarError::plain(format!("Unknown start symbol \"{}\".", name))
                })?,
            None => {
                let first = self.production_list.first().ok_or_else(|| {
                    GrammarError::plain(
                        "Grammar has no production rules to take the start symbol from.",
                    )
                })?;
                self.production(*first).lhs
            }
        };
        self.start_symbol = start;

        // Production 0 is reserved for the augmented production used by the
        // automaton builder as its entry point.
        let augmented = self.add_symbol(Symbol::nonterminal("S'", None, None));
        let production = self.add_production(Production::new(
            augmented,
            ProductionRhs::of_symbols(vec![start, STOP]),
        ));
        self.production_list.insert(0, production);
        self.file_mut(ROOT).nonterminals.push(augmented);
        self.file_mut(ROOT)
            .symbols_by_name
            .insert("S'".to_string(), augmented);
        self.augmented_symbol = Some(augmented);

        if !self.options.no_check_recognizers {
            self.check_recognizers()?;
        }
        self.enumerate_productions();
        self.fix_keyword_terminals()?;
        self.resolve_actions();

        self.log.log_event(Log::Default(()), "finalize", || {
            format!(
                "grammar with {} productions, start symbol \"{}\"",
                self.production_list.len(),
                self.symbol(start).name
            )
        });
        Ok(())
    }

    fn check_recognizers(&self) -> Result<(), GrammarError> {
        for &terminal in &self.file(ROOT).terminals {
            let symbol = self.symbol(terminal);
            let info = symbol.terminal_info().expect("terminal set holds terminals");
            if info.recognizer.is_none() {
                let message = if self.options.recognizers.is_none() {
                    format!(
                        "Terminal \"{}\" has no recognizer defined and no recognizers \
                         are given during grammar construction.",
                        symbol.name
                    )
                } else {
                    format!("Terminal \"{}\" has no recognizer defined.", symbol.name)
                };
                return Err(GrammarError::new(message, symbol.location.clone()));
            }
        }
        Ok(())
    }

    /// Assign `prod_id` (dense, source order, augmented production first) and
    /// the per-LHS `prod_symbol_id` ordinal.
    fn enumerate_productions(&mut self) {
        let mut ordinal_per_symbol: HashMap<SymbolPtr, usize> = HashMap::new();
        for (index, ptr) in self.production_list.clone().into_iter().enumerate() {
            let lhs = self.production(ptr).lhs;
            let ordinal = ordinal_per_symbol.entry(lhs).or_insert(0);
            let prod_symbol_id = *ordinal;
            *ordinal += 1;
            let production = self.production_mut(ptr);
            production.prod_id = Some(index);
            production.prod_symbol_id = Some(prod_symbol_id);
        }
    }

    /// If a KEYWORD terminal with a regex recognizer is given, rewrite every
    /// literal terminal the KEYWORD regex fully matches to a word-boundary
    /// regex and mark it as a keyword.
    fn fix_keyword_terminals(&mut self) -> Result<(), GrammarError> {
        let keyword = match self.get_terminal("KEYWORD") {
            Some(keyword) => keyword,
            None => return Ok(()),
        };
        let keyword_regex = match self
            .symbol(keyword)
            .terminal_info()
            .and_then(|info| info.recognizer.as_ref())
            .and_then(Recognizer::as_regex)
        {
            Some(regex) => regex.clone(),
            None => {
                return Err(GrammarError::new(
                    "KEYWORD rule must have a regex recognizer defined.".to_string(),
                    self.symbol(keyword).location.clone(),
                ))
            }
        };

        for terminal in self.file(ROOT).terminals.clone() {
            let literal = match self
                .symbol(terminal)
                .terminal_info()
                .and_then(|info| info.recognizer.as_ref())
                .and_then(Recognizer::as_str)
            {
                Some(recognizer) => recognizer.clone(),
                None => continue,
            };
            if keyword_regex.recognizes_fully(&literal.value) {
                let pattern = format!(r"\b{}\b", regex::escape(&literal.value));
                let regex =
                    RegexRecognizer::new(&pattern, ReFlags::default(), literal.ignore_case)?;
                let info = self.symbol_mut(terminal).terminal_info_mut().unwrap();
                info.recognizer = Some(Recognizer::Regex(regex));
                info.keyword = true;
            }
        }
        Ok(())
    }

    /// Bind common actions given in the grammar by name. Unresolved names are
    /// left for the user to supply at parser construction time.
    fn resolve_actions(&mut self) {
        let symbols: Vec<SymbolPtr> = self.symbols().collect();
        for ptr in symbols {
            let symbol = self.symbol(ptr);
            if symbol.action.is_some() {
                continue;
            }
            if let Some(builtin) = symbol
                .action_name
                .as_deref()
                .and_then(BuiltinAction::from_name)
            {
                let symbol = self.symbol_mut(ptr);
                symbol.action = Some(builtin);
                symbol.grammar_action = Some(builtin);
            }
        }
    }
}
