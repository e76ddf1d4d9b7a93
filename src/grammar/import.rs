//! Lazy loading of imported grammar files through the shared registry.

use super::{Grammar, ROOT};
use crate::bootstrap::{self, ParseContext};
use crate::util::Log;
use crate::{FilePtr, GrammarError, ImportPtr};

impl Grammar {
    /// The parsed file behind an import, loading it on first use.
    ///
    /// The registry is consulted first so every canonical path is parsed at
    /// most once; a new file is registered before its references resolve,
    /// which bounds cyclic imports.
    pub(crate) fn materialize_import(
        &mut self,
        import: ImportPtr,
    ) -> Result<FilePtr, GrammarError> {
        if let Some(file) = self.import(import).file {
            return Ok(file);
        }
        let path = self.import(import).file_path.clone();
        if let Some(file) = self.registry().get(&path).copied() {
            self.import_mut(import).file = Some(file);
            return Ok(file);
        }

        self.log.log_event(Log::Verbose(()), "import", || {
            format!("parsing imported grammar \"{}\"", path.display())
        });
        let context = ParseContext::new(Some(path.clone()), &self.options);
        let decl = bootstrap::grammar_parser()
            .parse_file(&path, &context)
            .map_err(|err| match err.location() {
                Some(_) => err,
                None => GrammarError::new(
                    err.message().to_string(),
                    self.import(import).location.clone(),
                ),
            })?;

        let file = self.add_file(Some(path.clone()), Some(import));
        self.import_mut(import).file = Some(file);
        self.registry_mut().insert(path, file);
        self.collect_file(file, decl)?;
        self.resolve_file(file)?;
        self.bind_recognizers(file)?;
        self.adopt_imported_file(file);
        Ok(file)
    }

    /// Register a freshly parsed imported file with the root grammar: its
    /// symbols become reachable under their FQNs and its productions join
    /// the global production list in source order.
    fn adopt_imported_file(&mut self, file: FilePtr) {
        let symbols: Vec<_> = self
            .file(file)
            .nonterminals
            .iter()
            .chain(self.file(file).terminals.iter())
            .copied()
            .filter(|ptr| ptr.0 >= 3)
            .collect();
        for ptr in symbols {
            let fqn = self.fqn(ptr);
            if !self.file(ROOT).symbols_by_name.contains_key(&fqn) {
                self.file_mut(ROOT).symbols_by_name.insert(fqn, ptr);
                if self.symbol(ptr).is_terminal() {
                    self.file_mut(ROOT).terminals.push(ptr);
                } else {
                    self.file_mut(ROOT).nonterminals.push(ptr);
                }
            }
        }
        let productions = self.file(file).local_productions.clone();
        self.production_list.extend(productions);
    }
}
