//! Recursive descent over the grammar language. Each parse function mirrors a
//! bootstrap production and doubles as its semantic action, producing the
//! import/production/terminal declarations consumed by the compilation
//! pipeline.

use super::lexer::{self, Token, TokenKind};
use super::{FileDecl, ImportDecl, ParseContext, RuleDecl, TermDecl};
use crate::production::RhsSlot;
use crate::recognizer::{Recognizer, RegexRecognizer, StrRecognizer};
use crate::symbol::{
    AssignOp, Assignment, Multiplicity, Reference, RuleAttribute, RuleType,
};
use crate::util::{Location, SourceText};
use crate::{Associativity, Grammar, GrammarError, DEFAULT_PRIORITY};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

pub(crate) fn parse_text(text: &str, context: &ParseContext) -> Result<FileDecl, GrammarError> {
    let source = Rc::new(SourceText::new(
        text,
        context
            .file_name
            .as_ref()
            .map(|path| path.display().to_string()),
    ));
    let tokens = lexer::tokenize(&source)?;
    Parser {
        source,
        tokens,
        pos: 0,
        context,
        inline_names: HashSet::new(),
        inline_terminals: Vec::new(),
        rule_types: Vec::new(),
    }
    .parse_pgfile()
}

/// Production/terminal disambiguation atoms collected from a `{...}` block.
#[derive(Debug, Clone, Copy, Default)]
struct DisRules {
    assoc: Option<Associativity>,
    prior: Option<u32>,
    dynamic: bool,
    nops: bool,
    nopse: bool,
}

impl DisRules {
    /// Alternative-level atoms layered over rule-level defaults.
    fn over(self, base: DisRules) -> DisRules {
        DisRules {
            assoc: self.assoc.or(base.assoc),
            prior: self.prior.or(base.prior),
            dynamic: self.dynamic || base.dynamic,
            nops: self.nops || base.nops,
            nopse: self.nopse || base.nopse,
        }
    }
}

struct Parser<'p> {
    source: Rc<SourceText>,
    tokens: Vec<Token>,
    pos: usize,
    context: &'p ParseContext,
    inline_names: HashSet<String>,
    inline_terminals: Vec<TermDecl>,
    rule_types: Vec<RuleType>,
}

impl<'p> Parser<'p> {
    fn peek(&self) -> Token {
        self.tokens[self.pos]
    }

    fn peek_next(&self) -> Token {
        self.tokens[usize::min(self.pos + 1, self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos];
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn text(&self, token: Token) -> &str {
        &self.source.text[token.start..token.end]
    }

    fn location(&self, token: Token) -> Location {
        Location::new(self.source.clone(), token.start, token.end)
    }

    fn span(&self, start: Token, end: Token) -> Location {
        Location::new(self.source.clone(), start.start, end.end)
    }

    fn syntax_error(&self, token: Token, expected: &str) -> GrammarError {
        let found = match token.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("\"{}\"", self.text(token)),
        };
        GrammarError::new(
            format!("Expected {} but found {}.", expected, found),
            Some(self.location(token)),
        )
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, GrammarError> {
        let token = self.peek();
        if token.kind == kind {
            Ok(self.advance())
        } else {
            Err(self.syntax_error(token, expected))
        }
    }

    fn at_name(&self, name: &str) -> bool {
        self.peek().kind == TokenKind::Name && self.text(self.peek()) == name
    }

    /// The `terminals` section keyword is contextual: a rule may still be
    /// called `terminals` when a `:` or `{` follows.
    fn at_terminals_section(&self) -> bool {
        self.at_name("terminals")
            && !matches!(
                self.peek_next().kind,
                TokenKind::Colon | TokenKind::LBrace
            )
    }

    fn check_name(&self, token: Token) -> Result<String, GrammarError> {
        let name = self.text(token).to_string();
        if Grammar::is_reserved(&name) {
            return Err(GrammarError::new(
                format!("Rule name \"{}\" is reserved.", name),
                Some(self.location(token)),
            ));
        }
        Ok(name)
    }

    fn parse_pgfile(mut self) -> Result<FileDecl, GrammarError> {
        let mut imports = Vec::new();
        while self.at_name("import") {
            imports.push(self.parse_import()?);
        }

        let mut rules = Vec::new();
        if !self.at_terminals_section() {
            loop {
                rules.extend(self.parse_production_rule_with_action()?);
                if self.at_terminals_section() || self.peek().kind == TokenKind::Eof {
                    break;
                }
            }
        }

        let mut terminals = Vec::new();
        if self.at_terminals_section() {
            self.advance();
            loop {
                terminals.push(self.parse_terminal_rule_with_action()?);
                if self.peek().kind == TokenKind::Eof {
                    break;
                }
            }
        }

        self.expect(TokenKind::Eof, "end of grammar")?;
        terminals.append(&mut self.inline_terminals);

        Ok(FileDecl {
            imports,
            rules,
            terminals,
            rule_types: self.rule_types,
        })
    }

    fn parse_import(&mut self) -> Result<ImportDecl, GrammarError> {
        let keyword = self.advance();
        let importing_file = match &self.context.file_name {
            Some(path) => path.clone(),
            None => {
                return Err(GrammarError::new(
                    "Import can be used only for grammars defined in files.".to_string(),
                    Some(self.location(keyword)),
                ))
            }
        };
        let path_token = self.expect(TokenKind::Str, "imported file path")?;
        let import_path = unescape_string(strip_delimiters(self.text(path_token)));
        let module_name = if self.at_name("as") {
            self.advance();
            let name_token = self.expect(TokenKind::Name, "import module name")?;
            self.text(name_token).to_string()
        } else {
            Path::new(&import_path)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| import_path.clone())
        };
        let end = self.expect(TokenKind::Semi, "\";\"")?;

        let raw = PathBuf::from(&import_path);
        let joined = if raw.is_absolute() {
            raw
        } else {
            importing_file
                .parent()
                .map(|dir| dir.join(&raw))
                .unwrap_or(raw)
        };
        let normalized = normalize_path(&joined);
        let file_path = normalized.canonicalize().unwrap_or(normalized);

        Ok(ImportDecl {
            module_name,
            file_path,
            location: self.span(keyword, end),
        })
    }

    fn parse_production_rule_with_action(&mut self) -> Result<Vec<RuleDecl>, GrammarError> {
        let action_name = if self.peek().kind == TokenKind::Action {
            let token = self.advance();
            Some(self.text(token)[1..].to_string())
        } else {
            None
        };

        let name_token = self.expect(TokenKind::Name, "rule name")?;
        let name = self.check_name(name_token)?;
        let location = self.location(name_token);

        let rule_level = if self.peek().kind == TokenKind::LBrace {
            self.parse_prod_disrules()?
        } else {
            DisRules::default()
        };
        self.expect(TokenKind::Colon, "\":\"")?;

        let mut alternatives = Vec::new();
        loop {
            alternatives.push(self.parse_production(&name, rule_level)?);
            if self.peek().kind == TokenKind::Pipe {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::Semi, "\";\"")?;

        // Named matches make the rule build a record; collect its attribute
        // descriptor and default the action accordingly.
        let mut attributes = Vec::new();
        for (assignments, _) in &alternatives {
            for assignment in assignments {
                if let Some(attr_name) = &assignment.name {
                    attributes.push(RuleAttribute::new(
                        attr_name.clone(),
                        assignment.multiplicity,
                        assignment.symbol_name.clone(),
                    ));
                }
            }
        }
        let action_name = if attributes.is_empty() {
            action_name
        } else {
            self.merge_rule_type(&name, attributes);
            action_name.or_else(|| Some("obj".to_string()))
        };

        Ok(alternatives
            .into_iter()
            .map(|(assignments, disrules)| RuleDecl {
                lhs: name.clone(),
                location: Some(location.clone()),
                action_name: action_name.clone(),
                assignments,
                assoc: disrules.assoc.unwrap_or(Associativity::None),
                prior: disrules.prior.unwrap_or(DEFAULT_PRIORITY),
                dynamic: disrules.dynamic,
                nops: disrules.nops,
                nopse: disrules.nopse,
            })
            .collect())
    }

    fn merge_rule_type(&mut self, rule_name: &str, attributes: Vec<RuleAttribute>) {
        let rule_type = match self
            .rule_types
            .iter_mut()
            .find(|t| t.rule_name == rule_name)
        {
            Some(existing) => existing,
            None => {
                self.rule_types.push(RuleType::new(rule_name.to_string()));
                self.rule_types.last_mut().unwrap()
            }
        };
        for attribute in attributes {
            rule_type.merge(attribute);
        }
    }

    /// One production alternative: assignments plus optional disambiguation.
    fn parse_production(
        &mut self,
        rule_name: &str,
        rule_level: DisRules,
    ) -> Result<(Vec<Assignment>, DisRules), GrammarError> {
        let mut assignments = Vec::new();
        let mut seen_names: HashSet<String> = HashSet::new();
        loop {
            let token = self.peek();
            let assignment = match token.kind {
                TokenKind::Name
                    if matches!(self.peek_next().kind, TokenKind::Eq | TokenKind::QEq) =>
                {
                    let name_token = self.advance();
                    let attr_name = self.text(name_token).to_string();
                    let op = match self.advance().kind {
                        TokenKind::Eq => AssignOp::Plain,
                        _ => AssignOp::Bool,
                    };
                    if !seen_names.insert(attr_name.clone()) {
                        return Err(GrammarError::new(
                            format!(
                                "Multiple assignments to attribute \"{}\" in a production of rule \"{}\".",
                                attr_name, rule_name
                            ),
                            Some(self.location(name_token)),
                        ));
                    }
                    let reference = self.parse_gsymbol_reference()?;
                    Assignment::new(Some(attr_name), Some(op), reference)
                }
                TokenKind::Name | TokenKind::Str => {
                    Assignment::reference(self.parse_gsymbol_reference()?)
                }
                _ => {
                    if assignments.is_empty() {
                        return Err(self.syntax_error(token, "grammar symbol"));
                    }
                    break;
                }
            };
            assignments.push(assignment);
        }
        for (index, assignment) in assignments.iter_mut().enumerate() {
            if assignment.is_named() {
                assignment.index = Some(index);
            }
        }

        let disrules = if self.peek().kind == TokenKind::LBrace {
            self.parse_prod_disrules()?.over(rule_level)
        } else {
            rule_level
        };
        Ok((assignments, disrules))
    }

    /// A symbol citation with an optional repetition operator. Inline string
    /// literals are hoisted into per-file terminals named by their value.
    fn parse_gsymbol_reference(&mut self) -> Result<Reference, GrammarError> {
        let start = self.peek();
        let name = match start.kind {
            TokenKind::Name => {
                self.advance();
                self.text(start).to_string()
            }
            TokenKind::Str => {
                self.advance();
                let value = unescape_string(strip_delimiters(self.text(start)));
                if self.inline_names.insert(value.clone()) {
                    self.inline_terminals.push(TermDecl::new(
                        value.clone(),
                        Some(Recognizer::Str(StrRecognizer::new(
                            value.clone(),
                            self.context.ignore_case,
                        ))),
                        Some(self.location(start)),
                    ));
                }
                value
            }
            _ => return Err(self.syntax_error(start, "grammar symbol")),
        };

        let mut multiplicity = Multiplicity::One;
        let mut separator = None;
        let mut end = start;
        if matches!(
            self.peek().kind,
            TokenKind::Star | TokenKind::Plus | TokenKind::Quest
        ) {
            let operator = self.advance();
            multiplicity = match operator.kind {
                TokenKind::Star => Multiplicity::ZeroOrMore,
                TokenKind::Plus => Multiplicity::OneOrMore,
                _ => Multiplicity::Optional,
            };
            end = operator;
            if self.peek().kind == TokenKind::LBracket {
                self.advance();
                let first = self.expect(TokenKind::Name, "repetition modifier")?;
                separator = Some(Box::new(RhsSlot::Ref(Reference::new(
                    self.text(first).to_string(),
                    Some(self.location(first)),
                ))));
                while self.peek().kind == TokenKind::Comma {
                    self.advance();
                    self.expect(TokenKind::Name, "repetition modifier")?;
                }
                end = self.expect(TokenKind::RBracket, "\"]\"")?;
            }
        }

        let mut reference = Reference::new(name, Some(self.span(start, end)));
        reference.multiplicity = multiplicity;
        reference.separator = separator;
        Ok(reference)
    }

    fn parse_prod_disrules(&mut self) -> Result<DisRules, GrammarError> {
        let mut disrules = DisRules::default();
        self.expect(TokenKind::LBrace, "\"{\"")?;
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Int => {
                    self.advance();
                    disrules.prior = Some(self.parse_priority(token)?);
                }
                TokenKind::Name => {
                    self.advance();
                    match self.text(token) {
                        "left" | "reduce" => disrules.assoc = Some(Associativity::Left),
                        "right" | "shift" => disrules.assoc = Some(Associativity::Right),
                        "dynamic" => disrules.dynamic = true,
                        "nops" => disrules.nops = true,
                        "nopse" => disrules.nopse = true,
                        unknown => {
                            return Err(GrammarError::new(
                                format!(
                                    "Unknown production disambiguation rule \"{}\".",
                                    unknown
                                ),
                                Some(self.location(token)),
                            ))
                        }
                    }
                }
                _ => return Err(self.syntax_error(token, "disambiguation rule")),
            }
            if self.peek().kind == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "\"}\"")?;
        Ok(disrules)
    }

    fn parse_terminal_rule_with_action(&mut self) -> Result<TermDecl, GrammarError> {
        let action_name = if self.peek().kind == TokenKind::Action {
            let token = self.advance();
            Some(self.text(token)[1..].to_string())
        } else {
            None
        };

        let name_token = self.expect(TokenKind::Name, "terminal name")?;
        let name = self.check_name(name_token)?;
        self.expect(TokenKind::Colon, "\":\"")?;

        let recognizer = match self.peek().kind {
            TokenKind::Str => {
                let token = self.advance();
                let value = unescape_string(strip_delimiters(self.text(token)));
                Some(Recognizer::Str(StrRecognizer::new(
                    value,
                    self.context.ignore_case,
                )))
            }
            TokenKind::Regex => {
                let token = self.advance();
                let pattern = strip_delimiters(self.text(token)).to_string();
                let regex =
                    RegexRecognizer::new(&pattern, self.context.re_flags, self.context.ignore_case)
                        .map_err(|err| {
                            GrammarError::new(
                                err.message().to_string(),
                                Some(self.location(token)),
                            )
                        })?;
                Some(Recognizer::Regex(regex))
            }
            _ => None,
        };

        let mut decl = TermDecl::new(name, recognizer, Some(self.location(name_token)));
        decl.action_name = action_name;
        if self.peek().kind == TokenKind::LBrace {
            self.parse_term_disrules(&mut decl)?;
        }
        self.expect(TokenKind::Semi, "\";\"")?;
        Ok(decl)
    }

    fn parse_term_disrules(&mut self, decl: &mut TermDecl) -> Result<(), GrammarError> {
        self.expect(TokenKind::LBrace, "\"{\"")?;
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Int => {
                    self.advance();
                    decl.prior = self.parse_priority(token)?;
                }
                TokenKind::Name => {
                    self.advance();
                    match self.text(token) {
                        "prefer" => decl.prefer = true,
                        "finish" => decl.finish = Some(true),
                        "nofinish" => decl.finish = Some(false),
                        "dynamic" => decl.dynamic = true,
                        unknown => {
                            return Err(GrammarError::new(
                                format!("Unknown terminal disambiguation rule \"{}\".", unknown),
                                Some(self.location(token)),
                            ))
                        }
                    }
                }
                _ => return Err(self.syntax_error(token, "disambiguation rule")),
            }
            if self.peek().kind == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "\"}\"")?;
        Ok(())
    }

    fn parse_priority(&self, token: Token) -> Result<u32, GrammarError> {
        self.text(token).parse::<u32>().map_err(|_| {
            GrammarError::new(
                format!("Invalid priority \"{}\".", self.text(token)),
                Some(self.location(token)),
            )
        })
    }
}

/// Strip the quote or slash delimiters of a string/regex token.
fn strip_delimiters(text: &str) -> &str {
    &text[1..text.len() - 1]
}

/// Single pass unescape of string literal bodies. Unknown escapes are kept
/// verbatim.
fn unescape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Lexical `.`/`..` folding for import paths whose targets may not exist yet.
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(Component::ParentDir);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}
