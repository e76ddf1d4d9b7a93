//! The grammar container and its compilation pipeline.
//!
//! A compilation walks: bootstrap parse of the root text, per-file symbol
//! collection and unification, reference resolution (which lazily pulls in
//! imported files and materializes multiplicity symbols), recognizer binding
//! and final grammar checks. The [Grammar] owns every arena involved.

mod builder;
mod file;
mod finalize;
mod import;
mod resolve;
mod serialize;

#[cfg(test)]
mod __tests__;

pub use builder::{StructElem, StructRule};

use crate::bootstrap::{self, ParseContext};
use crate::production::Production;
use crate::recognizer::{ReFlags, Recognizer, RecognizerCollector};
use crate::symbol::{RuleType, Symbol};
use crate::util::{Location, Log};
use crate::{FilePtr, GrammarError, ImportPtr, ProdPtr, SymbolPtr, EMPTY, EOF, STOP};
use crate::{BuiltinAction, RESERVED_SYMBOL_NAMES};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub(crate) const ROOT: FilePtr = FilePtr(0);

/// A side-file loader: given the computed recognizer side-file path, return
/// the collector registered for it, if any.
pub type SideRecognizerLoader = Rc<dyn Fn(&Path) -> Option<RecognizerCollector>>;

/// Options of a grammar compilation.
#[derive(Default, Clone)]
pub struct GrammarOptions {
    /// Override recognizers keyed by terminal FQN. Wins over side-file
    /// entries.
    pub recognizers: Option<RecognizerCollector>,
    /// Loader consulted with `<dir>/<basename>_recognizers.<ext>` for every
    /// file-backed grammar file.
    pub side_recognizers: Option<SideRecognizerLoader>,
    /// Case-insensitive literal and regex recognizers.
    pub ignore_case: bool,
    /// Flags applied when compiling regex recognizers.
    pub re_flags: ReFlags,
    /// Start symbol name; the LHS of the first production when absent.
    pub start_symbol: Option<String>,
    /// Print the grammar and trace the compilation.
    pub debug: bool,
    /// Skip the recognizer completeness check. Used by bootstrap tooling for
    /// grammars whose recognizers arrive in host code.
    pub no_check_recognizers: bool,
}

impl std::fmt::Debug for GrammarOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrammarOptions")
            .field("recognizers", &self.recognizers)
            .field(
                "side_recognizers",
                &self.side_recognizers.as_ref().map(|_| "<fn>"),
            )
            .field("ignore_case", &self.ignore_case)
            .field("re_flags", &self.re_flags)
            .field("start_symbol", &self.start_symbol)
            .field("debug", &self.debug)
            .field("no_check_recognizers", &self.no_check_recognizers)
            .finish()
    }
}

/// A parsed grammar unit: one file of the import graph, or the anonymous
/// root of a string-sourced grammar.
#[derive(Debug)]
pub struct GrammarFile {
    /// Canonical path for file-backed units.
    pub file_path: Option<PathBuf>,
    /// The import this file was first reached through; the FQN prefix of its
    /// symbols.
    pub imported_with: Option<ImportPtr>,
    /// Local name index. At the root this additionally indexes adopted
    /// imported and materialized symbols under their FQNs.
    pub symbols_by_name: HashMap<String, SymbolPtr>,
    pub terminals: Vec<SymbolPtr>,
    pub nonterminals: Vec<SymbolPtr>,
    /// Productions defined in this file, in source order.
    pub local_productions: Vec<ProdPtr>,
    /// Imports declared in this file, keyed by local module name.
    pub imports_by_name: HashMap<String, ImportPtr>,
}

/// An import declaration of a grammar file.
#[derive(Debug)]
pub struct GrammarImport {
    /// Local module name; defaults to the imported file's stem.
    pub module_name: String,
    /// Canonical path of the imported file.
    pub file_path: PathBuf,
    /// The import chain this import was first reached through.
    pub imported_with: Option<ImportPtr>,
    pub location: Option<Location>,
    /// The parsed file, populated on first use.
    pub file: Option<FilePtr>,
}

/// A compiled grammar: the root of the import graph plus every arena of the
/// compilation.
///
/// After construction the grammar is immutable and ready for a table
/// builder: the augmented production sits at id 0, production ids are dense
/// and every RHS slot points at a resolved symbol.
#[derive(Debug)]
pub struct Grammar {
    symbols: Vec<Symbol>,
    productions: Vec<Production>,
    files: Vec<GrammarFile>,
    imports: Vec<GrammarImport>,
    /// Global ordered production list; index equals `prod_id` after
    /// finalization.
    production_list: Vec<ProdPtr>,
    /// Shared registry of parsed files keyed by canonical path.
    registry: HashMap<PathBuf, FilePtr>,
    /// Record descriptors of rules with named matches, in first-appearance
    /// order.
    pub rule_types: Vec<RuleType>,
    start_symbol: SymbolPtr,
    augmented_symbol: Option<SymbolPtr>,
    pub(crate) options: GrammarOptions,
    pub(crate) log: Log<&'static str>,
}

impl GrammarOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recognizers(mut self, collector: RecognizerCollector) -> Self {
        self.recognizers = Some(collector);
        self
    }

    pub fn side_recognizers(mut self, loader: SideRecognizerLoader) -> Self {
        self.side_recognizers = Some(loader);
        self
    }

    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn re_flags(mut self, re_flags: ReFlags) -> Self {
        self.re_flags = re_flags;
        self
    }

    pub fn start_symbol(mut self, name: impl Into<String>) -> Self {
        self.start_symbol = Some(name.into());
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn no_check_recognizers(mut self, no_check: bool) -> Self {
        self.no_check_recognizers = no_check;
        self
    }
}

impl GrammarFile {
    fn new(file_path: Option<PathBuf>, imported_with: Option<ImportPtr>) -> Self {
        Self {
            file_path,
            imported_with,
            symbols_by_name: HashMap::new(),
            terminals: Vec::new(),
            nonterminals: Vec::new(),
            local_productions: Vec::new(),
            imports_by_name: HashMap::new(),
        }
    }
}

impl Grammar {
    /// Compile a grammar from text with default options. Imports are not
    /// available without a file context.
    pub fn from_string(text: &str) -> Result<Grammar, GrammarError> {
        Self::from_string_with(text, GrammarOptions::new())
    }

    pub fn from_string_with(text: &str, options: GrammarOptions) -> Result<Grammar, GrammarError> {
        let context = ParseContext::new(None, &options);
        let decl = bootstrap::grammar_parser().parse(text, &context)?;
        Self::build(decl, None, options)
    }

    /// Compile a grammar from a file. The path is canonicalized and becomes
    /// the base for relative imports and recognizer side-files.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Grammar, GrammarError> {
        Self::from_file_with(path, GrammarOptions::new())
    }

    pub fn from_file_with(
        path: impl AsRef<Path>,
        options: GrammarOptions,
    ) -> Result<Grammar, GrammarError> {
        let path = path.as_ref();
        let canonical = path.canonicalize().map_err(|err| {
            GrammarError::plain(format!(
                "Cannot open grammar file \"{}\": {}",
                path.display(),
                err
            ))
        })?;
        let context = ParseContext::new(Some(canonical.clone()), &options);
        let decl = bootstrap::grammar_parser().parse_file(&canonical, &context)?;
        Self::build(decl, Some(canonical), options)
    }

    pub(crate) fn build(
        decl: bootstrap::FileDecl,
        file_path: Option<PathBuf>,
        options: GrammarOptions,
    ) -> Result<Grammar, GrammarError> {
        let mut grammar = Grammar::empty(options);
        let root = grammar.add_file(file_path.clone(), None);
        debug_assert_eq!(root, ROOT);
        if let Some(path) = file_path {
            grammar.registry.insert(path, root);
        }
        grammar.collect_file(root, decl)?;
        grammar.resolve_file(root)?;
        grammar.bind_recognizers(root)?;
        grammar.finalize()?;
        if grammar.options.debug {
            let _ = grammar.print_debug();
        }
        Ok(grammar)
    }

    fn empty(options: GrammarOptions) -> Self {
        let log = if options.debug {
            Log::Verbose("grammar")
        } else {
            Log::None
        };
        let mut grammar = Self {
            symbols: Vec::new(),
            productions: Vec::new(),
            files: Vec::new(),
            imports: Vec::new(),
            production_list: Vec::new(),
            registry: HashMap::new(),
            rule_types: Vec::new(),
            start_symbol: EMPTY,
            augmented_symbol: None,
            options,
            log,
        };
        // Sentinel arena slots are fixed so EMPTY/EOF/STOP handles are
        // constants.
        for (name, recognizer) in [
            ("EMPTY", Recognizer::Empty),
            ("EOF", Recognizer::Eof),
            ("STOP", Recognizer::Stop),
        ] {
            let ptr = grammar.add_symbol(Symbol::terminal(name, Some(recognizer), None, None));
            let symbol = &mut grammar.symbols[ptr.0];
            if ptr == EMPTY || ptr == EOF {
                symbol.action = Some(BuiltinAction::PassNone);
                symbol.grammar_action = Some(BuiltinAction::PassNone);
            }
        }
        grammar
    }

    pub(crate) fn add_file(
        &mut self,
        file_path: Option<PathBuf>,
        imported_with: Option<ImportPtr>,
    ) -> FilePtr {
        self.files
            .push(GrammarFile::new(file_path, imported_with));
        FilePtr(self.files.len() - 1)
    }

    pub(crate) fn add_symbol(&mut self, symbol: Symbol) -> SymbolPtr {
        self.symbols.push(symbol);
        SymbolPtr(self.symbols.len() - 1)
    }

    /// Add a production to the arena and to its LHS alternative list.
    pub(crate) fn add_production(&mut self, production: Production) -> ProdPtr {
        let lhs = production.lhs;
        self.productions.push(production);
        let ptr = ProdPtr(self.productions.len() - 1);
        if let Some(info) = self.symbols[lhs.0].nonterminal_info_mut() {
            info.productions.push(ptr);
        }
        ptr
    }

    pub fn symbol(&self, ptr: SymbolPtr) -> &Symbol {
        &self.symbols[ptr.0]
    }

    pub(crate) fn symbol_mut(&mut self, ptr: SymbolPtr) -> &mut Symbol {
        &mut self.symbols[ptr.0]
    }

    pub fn production(&self, ptr: ProdPtr) -> &Production {
        &self.productions[ptr.0]
    }

    pub(crate) fn production_mut(&mut self, ptr: ProdPtr) -> &mut Production {
        &mut self.productions[ptr.0]
    }

    pub fn file(&self, ptr: FilePtr) -> &GrammarFile {
        &self.files[ptr.0]
    }

    pub(crate) fn file_mut(&mut self, ptr: FilePtr) -> &mut GrammarFile {
        &mut self.files[ptr.0]
    }

    pub fn import(&self, ptr: ImportPtr) -> &GrammarImport {
        &self.imports[ptr.0]
    }

    pub(crate) fn import_mut(&mut self, ptr: ImportPtr) -> &mut GrammarImport {
        &mut self.imports[ptr.0]
    }

    /// The root grammar file.
    pub fn root(&self) -> &GrammarFile {
        &self.files[ROOT.0]
    }

    /// The global production list in `prod_id` order.
    pub fn production_list(&self) -> &[ProdPtr] {
        &self.production_list
    }

    /// Productions in `prod_id` order.
    pub fn productions(&self) -> impl Iterator<Item = &Production> {
        self.production_list
            .iter()
            .map(move |ptr| &self.productions[ptr.0])
    }

    pub fn start_symbol(&self) -> SymbolPtr {
        self.start_symbol
    }

    /// The synthetic `S'` head of the augmented production.
    pub fn augmented_symbol(&self) -> Option<SymbolPtr> {
        self.augmented_symbol
    }

    /// The fully qualified name: import chain joined with dots, ending in
    /// the local name.
    pub fn fqn(&self, ptr: SymbolPtr) -> String {
        let symbol = self.symbol(ptr);
        match symbol.imported_with {
            Some(import) => format!("{}.{}", self.import_fqn(import), symbol.name),
            None => symbol.name.clone(),
        }
    }

    /// The fully qualified name of an import following the first import path.
    pub fn import_fqn(&self, ptr: ImportPtr) -> String {
        let import = self.import(ptr);
        match import.imported_with {
            Some(parent) => format!("{}.{}", self.import_fqn(parent), import.module_name),
            None => import.module_name.clone(),
        }
    }

    /// Returns the terminal with the given name.
    pub fn get_terminal(&self, name: &str) -> Option<SymbolPtr> {
        self.root()
            .terminals
            .iter()
            .copied()
            .find(|ptr| self.symbol(*ptr).name == name)
    }

    /// Returns the non-terminal with the given name.
    pub fn get_nonterminal(&self, name: &str) -> Option<SymbolPtr> {
        self.root()
            .nonterminals
            .iter()
            .copied()
            .find(|ptr| self.symbol(*ptr).name == name)
    }

    /// Returns the grammar symbol with the given name or FQN.
    pub fn get_symbol(&self, name: &str) -> Option<SymbolPtr> {
        self.root()
            .symbols_by_name
            .get(name)
            .copied()
            .or_else(|| self.get_terminal(name))
            .or_else(|| self.get_nonterminal(name))
    }

    /// Returns the first production id for the given symbol name.
    pub fn get_production_id(&self, name: &str) -> Option<usize> {
        self.production_list
            .iter()
            .find(|ptr| self.symbol(self.production(**ptr).lhs).name == name)
            .and_then(|ptr| self.production(*ptr).prod_id)
    }

    /// Every user-visible symbol: nonterminals and terminals of the grammar,
    /// excluding the augmented start symbol and the STOP sentinel.
    pub fn symbols(&self) -> impl Iterator<Item = SymbolPtr> + '_ {
        let augmented = self.augmented_symbol;
        self.root()
            .nonterminals
            .iter()
            .chain(self.root().terminals.iter())
            .copied()
            .filter(move |ptr| *ptr != STOP && Some(*ptr) != augmented)
    }

    /// The record descriptor collected for a rule with named matches.
    pub fn rule_type(&self, rule_name: &str) -> Option<&RuleType> {
        self.rule_types.iter().find(|t| t.rule_name == rule_name)
    }

    pub(crate) fn registry(&self) -> &HashMap<PathBuf, FilePtr> {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut HashMap<PathBuf, FilePtr> {
        &mut self.registry
    }

    pub(crate) fn is_reserved(name: &str) -> bool {
        RESERVED_SYMBOL_NAMES.contains(&name)
    }
}
