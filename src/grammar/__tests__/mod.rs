use crate::grammar::ROOT;
use crate::recognizer::{Recognizer, RecognizerCollector};
use crate::symbol::Multiplicity;
use crate::{
    Associativity, BuiltinAction, Grammar, GrammarOptions, ProdPtr, StructElem, StructRule, EMPTY,
    EOF, STOP,
};
use std::path::{Path, PathBuf};
use std::rc::Rc;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("src/grammar/__tests__/fixtures")
        .join(name)
}

fn rhs_names(grammar: &Grammar, production: ProdPtr) -> Vec<String> {
    grammar
        .production(production)
        .rhs
        .raw()
        .iter()
        .map(|slot| {
            grammar
                .symbol(slot.symbol().expect("finalized grammars are resolved"))
                .name
                .clone()
        })
        .collect()
}

fn production_shapes(grammar: &Grammar) -> Vec<(String, Vec<String>)> {
    grammar
        .production_list()
        .iter()
        .map(|&ptr| {
            (
                grammar.symbol(grammar.production(ptr).lhs).name.clone(),
                rhs_names(grammar, ptr),
            )
        })
        .collect()
}

#[test]
fn minimal_grammar() {
    let grammar = Grammar::from_string("S: \"a\";").unwrap();

    // The augmented production is first: S' -> S STOP.
    let augmented = grammar.production_list()[0];
    assert_eq!(grammar.production(augmented).prod_id, Some(0));
    assert_eq!(
        grammar.symbol(grammar.production(augmented).lhs).name,
        "S'"
    );
    assert_eq!(rhs_names(&grammar, augmented), vec!["S", "STOP"]);
    assert_eq!(grammar.get_production_id("S'"), Some(0));
    assert_eq!(grammar.get_production_id("S"), Some(1));

    let user = grammar.production_list()[1];
    assert_eq!(rhs_names(&grammar, user), vec!["a"]);

    let literal = grammar.get_terminal("a").unwrap();
    let info = grammar.symbol(literal).terminal_info().unwrap();
    assert!(matches!(info.recognizer, Some(Recognizer::Str(_))));

    for sentinel in ["EMPTY", "EOF", "STOP"] {
        assert!(grammar.get_terminal(sentinel).is_some());
    }
    assert_eq!(grammar.get_terminal("EMPTY"), Some(EMPTY));
    assert_eq!(grammar.get_terminal("EOF"), Some(EOF));
    assert_eq!(grammar.get_terminal("STOP"), Some(STOP));
}

#[test]
fn production_ids_are_dense_and_per_symbol_ordinals_count_up() {
    let grammar = Grammar::from_string(
        r#"
        A: "x" | "y" | B;
        B: "z";
        "#,
    )
    .unwrap();

    let ids: Vec<usize> = grammar
        .productions()
        .map(|production| production.prod_id.unwrap())
        .collect();
    assert_eq!(ids, (0..grammar.production_list().len()).collect::<Vec<_>>());

    let a = grammar.get_nonterminal("A").unwrap();
    let ordinals: Vec<usize> = grammar
        .symbol(a)
        .nonterminal_info()
        .unwrap()
        .productions
        .iter()
        .map(|ptr| grammar.production(*ptr).prod_symbol_id.unwrap())
        .collect();
    assert_eq!(ordinals, vec![0, 1, 2]);
}

#[test]
fn every_slot_is_resolved_after_compilation() {
    let grammar = Grammar::from_string(
        r#"
        S: Items End;
        Items: Item+[comma];
        Item: name=Id;
        End: "end" | EMPTY;
        terminals
        Id: /[a-z]+/;
        comma: ",";
        "#,
    )
    .unwrap();
    for production in grammar.productions() {
        for slot in production.rhs.raw() {
            assert!(slot.is_resolved());
        }
        for assignment in production.assignments.values() {
            assert!(assignment.symbol.is_resolved());
        }
    }
}

#[test]
fn zero_or_more_with_separator_desugars() {
    let grammar = Grammar::from_string(
        r#"
        L: E*[comma];
        E: "x";
        terminals
        comma: ",";
        "#,
    )
    .unwrap();

    let one = grammar.get_nonterminal("E_1_comma").unwrap();
    let one_info = grammar.symbol(one).nonterminal_info().unwrap();
    assert_eq!(one_info.productions.len(), 2);
    assert_eq!(
        rhs_names(&grammar, one_info.productions[0]),
        vec!["E_1_comma", "comma", "E"]
    );
    assert_eq!(rhs_names(&grammar, one_info.productions[1]), vec!["E"]);
    assert_eq!(
        grammar.symbol(one).action_name.as_deref(),
        Some("collect_sep")
    );
    assert_eq!(grammar.symbol(one).action, Some(BuiltinAction::CollectSep));

    let zero = grammar.get_nonterminal("E_0_comma").unwrap();
    let zero_info = grammar.symbol(zero).nonterminal_info().unwrap();
    assert_eq!(zero_info.productions.len(), 2);
    assert_eq!(
        rhs_names(&grammar, zero_info.productions[0]),
        vec!["E_1_comma"]
    );
    assert!(grammar.production(zero_info.productions[0]).nops);
    assert_eq!(rhs_names(&grammar, zero_info.productions[1]), vec!["EMPTY"]);
    assert_eq!(
        grammar.symbol(zero).grammar_action,
        Some(BuiltinAction::HeadOrEmpty)
    );

    // L's single production references the zero-or-more wrapper.
    let l = grammar.get_nonterminal("L").unwrap();
    let l_production = grammar.symbol(l).nonterminal_info().unwrap().productions[0];
    assert_eq!(rhs_names(&grammar, l_production), vec!["E_0_comma"]);

    // The EMPTY alternative is elided from the logical view.
    let empty_alternative = grammar.production(zero_info.productions[1]);
    assert_eq!(empty_alternative.rhs.raw().len(), 1);
    assert_eq!(empty_alternative.rhs.len(), 0);
    assert!(empty_alternative.rhs.get(0).is_none());
}

#[test]
fn one_or_more_without_separator_desugars() {
    let grammar = Grammar::from_string("L: E+; E: \"e\";").unwrap();
    let one = grammar.get_nonterminal("E_1").unwrap();
    let info = grammar.symbol(one).nonterminal_info().unwrap();
    assert_eq!(rhs_names(&grammar, info.productions[0]), vec!["E_1", "E"]);
    assert_eq!(rhs_names(&grammar, info.productions[1]), vec!["E"]);
    assert_eq!(grammar.symbol(one).action, Some(BuiltinAction::Collect));
    assert!(grammar.get_nonterminal("E_0").is_none());
}

#[test]
fn optional_desugars() {
    let grammar = Grammar::from_string("S: A?; A: \"a\";").unwrap();
    let optional = grammar.get_nonterminal("A_opt").unwrap();
    let info = grammar.symbol(optional).nonterminal_info().unwrap();
    assert_eq!(rhs_names(&grammar, info.productions[0]), vec!["A"]);
    assert_eq!(rhs_names(&grammar, info.productions[1]), vec!["EMPTY"]);
    assert_eq!(grammar.symbol(optional).action, Some(BuiltinAction::Optional));
}

#[test]
fn desugaring_is_idempotent() {
    let grammar = Grammar::from_string(
        r#"
        L: E*[comma];
        M: E*[comma];
        E: "x";
        terminals
        comma: ",";
        "#,
    )
    .unwrap();

    let l = grammar.get_nonterminal("L").unwrap();
    let m = grammar.get_nonterminal("M").unwrap();
    let l_slot = grammar
        .production(grammar.symbol(l).nonterminal_info().unwrap().productions[0])
        .rhs
        .get(0)
        .unwrap()
        .symbol()
        .unwrap();
    let m_slot = grammar
        .production(grammar.symbol(m).nonterminal_info().unwrap().productions[0])
        .rhs
        .get(0)
        .unwrap()
        .symbol()
        .unwrap();
    assert_eq!(l_slot, m_slot);

    // Augmented + L + M + E + two list productions + two wrapper productions.
    assert_eq!(grammar.production_list().len(), 8);
}

#[test]
fn optional_with_separator_is_rejected() {
    let error = Grammar::from_string(
        r#"
        R: A?[comma];
        A: "a";
        terminals
        comma: ",";
        "#,
    )
    .unwrap_err();
    assert!(error
        .message()
        .contains("Repetition modifier not allowed for optional"));
    let location = error.location().expect("the ?[...] location is cited");
    assert_eq!(location.line(), 2);
}

#[test]
fn keyword_terminals_are_rewritten_to_word_boundaries() {
    let grammar = Grammar::from_string(
        r#"
        S: "if" Id "+";
        terminals
        KEYWORD: /\w+/;
        Id: /[a-z]+/;
        "#,
    )
    .unwrap();

    let keyword_literal = grammar.get_terminal("if").unwrap();
    let info = grammar.symbol(keyword_literal).terminal_info().unwrap();
    assert!(info.keyword);
    let regex = info
        .recognizer
        .as_ref()
        .and_then(Recognizer::as_regex)
        .expect("literal was rewritten to a regex");
    assert_eq!(regex.pattern(), r"\bif\b");
    assert_eq!(regex.recognize("if x", 0), Some("if"));
    assert_eq!(regex.recognize("iffy", 0), None);

    // "+" does not match the KEYWORD regex and keeps its literal recognizer.
    let plus = grammar.get_terminal("+").unwrap();
    let plus_info = grammar.symbol(plus).terminal_info().unwrap();
    assert!(!plus_info.keyword);
    assert!(matches!(plus_info.recognizer, Some(Recognizer::Str(_))));
}

#[test]
fn keyword_without_regex_recognizer_is_rejected() {
    let error = Grammar::from_string(
        r#"
        S: "a";
        terminals
        KEYWORD: "kw";
        "#,
    )
    .unwrap_err();
    assert_eq!(
        error.message(),
        "KEYWORD rule must have a regex recognizer defined."
    );
}

#[test]
fn duplicate_literal_values_are_rejected() {
    let error = Grammar::from_string(
        r#"
        S: A;
        terminals
        A: "x";
        B: "x";
        "#,
    )
    .unwrap_err();
    assert_eq!(
        error.message(),
        "Terminals \"B\" and \"A\" match the same string."
    );
}

#[test]
fn duplicate_terminal_names_are_rejected() {
    let error = Grammar::from_string(
        r#"
        S: A;
        terminals
        A: "x";
        A: "y";
        "#,
    )
    .unwrap_err();
    assert_eq!(
        error.message(),
        "Multiple definitions of terminal rule \"A\""
    );
}

#[test]
fn rule_colliding_with_terminal_is_rejected() {
    let error = Grammar::from_string(
        r#"
        A: B;
        B: "b";
        terminals
        A: "a";
        "#,
    )
    .unwrap_err();
    assert_eq!(error.message(), "Rule \"A\" already defined as terminal");
}

#[test]
fn unknown_symbol_is_rejected() {
    let error = Grammar::from_string("S: missing;").unwrap_err();
    assert_eq!(error.message(), "Unknown symbol \"missing\"");
    assert!(error.location().is_some());
}

#[test]
fn unknown_import_module_is_rejected() {
    let error = Grammar::from_string("S: m.Thing;").unwrap_err();
    assert_eq!(
        error.message(),
        "Unexisting module \"m\" in reference \"m.Thing\""
    );
}

#[test]
fn conflicting_rule_actions_are_rejected() {
    let error = Grammar::from_string(
        r#"
        @collect A: "x";
        @pass_single A: "y";
        "#,
    )
    .unwrap_err();
    assert_eq!(
        error.message(),
        "Multiple different grammar actions for rule \"A\"."
    );
}

#[test]
fn single_action_annotation_wins_across_alternative_definitions() {
    let grammar = Grammar::from_string(
        r#"
        A: "x";
        @pass_single A: "y";
        "#,
    )
    .unwrap();
    let a = grammar.get_nonterminal("A").unwrap();
    assert_eq!(grammar.symbol(a).action_name.as_deref(), Some("pass_single"));
    assert_eq!(grammar.symbol(a).action, Some(BuiltinAction::PassSingle));
}

#[test]
fn unknown_action_names_stay_unbound() {
    let grammar = Grammar::from_string("@my_action A: \"x\";").unwrap();
    let a = grammar.get_nonterminal("A").unwrap();
    assert_eq!(grammar.symbol(a).action_name.as_deref(), Some("my_action"));
    assert!(grammar.symbol(a).action.is_none());
    assert!(grammar.symbol(a).grammar_action.is_none());
}

#[test]
fn missing_recognizer_is_rejected_unless_disabled() {
    let text = r#"
        S: T;
        terminals
        T: ;
    "#;
    let error = Grammar::from_string(text).unwrap_err();
    assert_eq!(
        error.message(),
        "Terminal \"T\" has no recognizer defined and no recognizers are given \
         during grammar construction."
    );

    let grammar =
        Grammar::from_string_with(text, GrammarOptions::new().no_check_recognizers(true))
            .unwrap();
    let t = grammar.get_terminal("T").unwrap();
    assert!(grammar
        .symbol(t)
        .terminal_info()
        .unwrap()
        .recognizer
        .is_none());
}

#[test]
fn override_recognizers_bind_and_partial_maps_still_fail() {
    let text = r#"
        S: T U;
        terminals
        T: ;
        U: ;
    "#;
    let mut collector = RecognizerCollector::new();
    collector.register("T", |input: &str, pos: usize| {
        input[pos..].starts_with('t').then(|| &input[pos..pos + 1])
    });
    let error =
        Grammar::from_string_with(text, GrammarOptions::new().recognizers(collector.clone()))
            .unwrap_err();
    assert_eq!(error.message(), "Terminal \"U\" has no recognizer defined.");

    collector.register("U", |input: &str, pos: usize| {
        input[pos..].starts_with('u').then(|| &input[pos..pos + 1])
    });
    let grammar =
        Grammar::from_string_with(text, GrammarOptions::new().recognizers(collector)).unwrap();
    let t = grammar.get_terminal("T").unwrap();
    let recognizer = grammar
        .symbol(t)
        .terminal_info()
        .unwrap()
        .recognizer
        .as_ref()
        .unwrap();
    assert_eq!(recognizer.recognize("t", 0), Some("t"));
}

#[test]
fn recognizer_bound_to_a_nonterminal_is_rejected() {
    let mut collector = RecognizerCollector::new();
    collector.register("S", |_: &str, _: usize| None);
    let error = Grammar::from_string_with(
        "S: \"a\";",
        GrammarOptions::new().recognizers(collector),
    )
    .unwrap_err();
    assert_eq!(
        error.message(),
        "Recognizer given for non-terminal \"S\" in recognizers parameters."
    );
}

#[test]
fn side_file_recognizers_bind_through_the_loader() {
    let mut side = RecognizerCollector::new();
    side.register("T", |input: &str, pos: usize| {
        input[pos..].starts_with("side").then(|| &input[pos..pos + 4])
    });
    let loader_calls: Rc<std::cell::RefCell<Vec<PathBuf>>> = Rc::default();
    let calls = loader_calls.clone();
    let options = GrammarOptions::new().side_recognizers(Rc::new(move |path: &Path| {
        calls.borrow_mut().push(path.to_path_buf());
        Some(side.clone())
    }));

    let grammar = Grammar::from_file_with(fixture("side.lg"), options).unwrap();
    let t = grammar.get_terminal("T").unwrap();
    let bound = grammar
        .symbol(t)
        .terminal_info()
        .unwrap()
        .recognizer
        .as_ref()
        .unwrap();
    assert_eq!(bound.recognize("side", 0), Some("side"));

    // The computed side-file path is <basename>_recognizers.<ext>.
    let called = loader_calls.borrow();
    assert_eq!(
        called[0].file_name().unwrap().to_str().unwrap(),
        "side_recognizers.lg"
    );
}

#[test]
fn import_resolves_with_fqn_and_shared_registry() {
    let grammar = Grammar::from_file(fixture("a.lg")).unwrap();

    let thing = grammar.get_symbol("m.Thing").unwrap();
    assert_eq!(grammar.fqn(thing), "m.Thing");

    // The root production references the imported symbol directly.
    let s = grammar.get_nonterminal("S").unwrap();
    let s_production = grammar.symbol(s).nonterminal_info().unwrap().productions[0];
    assert_eq!(
        grammar.production(s_production).rhs.get(0).unwrap().symbol(),
        Some(thing)
    );

    // One import entry under its local name, both canonical paths in the
    // shared registry.
    assert_eq!(grammar.root().imports_by_name.len(), 1);
    assert!(grammar.root().imports_by_name.contains_key("m"));
    assert_eq!(grammar.registry().len(), 2);
    assert!(grammar
        .registry()
        .keys()
        .all(|path| path.ends_with("a.lg") || path.ends_with("b.lg")));

    // Desugared symbols of the imported file registered under their FQN.
    assert!(grammar.get_symbol("m.Num_opt").is_some());
}

#[test]
fn nested_imports_compose_fqns() {
    let grammar = Grammar::from_file(fixture("c1.lg")).unwrap();
    let leaf = grammar.get_symbol("x.y.Leaf").unwrap();
    assert_eq!(grammar.fqn(leaf), "x.y.Leaf");
    assert_eq!(grammar.registry().len(), 3);
}

#[test]
fn cyclic_imports_terminate_through_the_registry() {
    let grammar = Grammar::from_file(fixture("cyc_a.lg")).unwrap();
    let b = grammar.get_symbol("b.B").unwrap();
    assert_eq!(grammar.fqn(b), "b.B");
    // The cycle back to the root reuses the registry entry.
    assert_eq!(grammar.registry().len(), 2);
}

#[test]
fn start_symbol_option_selects_the_augmented_target() {
    let text = "A: \"a\"; B: \"b\";";
    let grammar =
        Grammar::from_string_with(text, GrammarOptions::new().start_symbol("B")).unwrap();
    let augmented = grammar.production_list()[0];
    assert_eq!(rhs_names(&grammar, augmented), vec!["B", "STOP"]);
    assert_eq!(
        grammar.symbol(grammar.start_symbol()).name,
        "B"
    );

    let error =
        Grammar::from_string_with(text, GrammarOptions::new().start_symbol("C")).unwrap_err();
    assert_eq!(error.message(), "Unknown start symbol \"C\".");
}

#[test]
fn iteration_skips_augmented_start_and_stop() {
    let grammar = Grammar::from_string("S: \"a\";").unwrap();
    let names: Vec<String> = grammar
        .symbols()
        .map(|ptr| grammar.symbol(ptr).name.clone())
        .collect();
    assert!(names.contains(&"S".to_string()));
    assert!(names.contains(&"a".to_string()));
    assert!(names.contains(&"EMPTY".to_string()));
    assert!(names.contains(&"EOF".to_string()));
    assert!(!names.contains(&"S'".to_string()));
    assert!(!names.contains(&"STOP".to_string()));
}

#[test]
fn sentinels_carry_pass_none() {
    let grammar = Grammar::from_string("S: \"a\";").unwrap();
    assert_eq!(
        grammar.symbol(EMPTY).grammar_action,
        Some(BuiltinAction::PassNone)
    );
    assert_eq!(grammar.symbol(EOF).action, Some(BuiltinAction::PassNone));
    assert!(grammar.symbol(STOP).grammar_action.is_none());
}

#[test]
fn named_matches_collect_rule_types() {
    let grammar = Grammar::from_string(
        r#"
        Item: name=Id value=Num? | name=Id flag?=Bang;
        terminals
        Id: /[a-z]+/;
        Num: /\d+/;
        Bang: "!";
        "#,
    )
    .unwrap();

    let item = grammar.get_nonterminal("Item").unwrap();
    assert_eq!(grammar.symbol(item).action_name.as_deref(), Some("obj"));

    let rule_type = grammar.rule_type("Item").unwrap();
    let field_names: Vec<&str> = rule_type
        .attributes
        .iter()
        .map(|attribute| attribute.name.as_str())
        .collect();
    assert_eq!(field_names, vec!["name", "value", "flag"]);
    assert_eq!(
        rule_type.attribute("value").unwrap().multiplicity,
        Multiplicity::Optional
    );
    assert_eq!(rule_type.attribute("value").unwrap().type_name, "Num");

    // Assignment indices are positions inside the production RHS.
    let productions = &grammar.symbol(item).nonterminal_info().unwrap().productions;
    let second = grammar.production(productions[1]);
    assert_eq!(second.assignments["flag"].index, Some(1));
}

#[test]
fn production_disambiguation_atoms_apply() {
    let grammar = Grammar::from_string(
        r#"
        E: E plus E {left, 5, dynamic}
         | E times E {right, nops, nopse};
        terminals
        plus: "+";
        times: "*";
        "#,
    )
    .unwrap();
    let e = grammar.get_nonterminal("E").unwrap();
    let productions = &grammar.symbol(e).nonterminal_info().unwrap().productions;
    let first = grammar.production(productions[0]);
    assert_eq!(first.assoc, Associativity::Left);
    assert_eq!(first.prior, 5);
    assert!(first.dynamic);
    let second = grammar.production(productions[1]);
    assert_eq!(second.assoc, Associativity::Right);
    assert!(second.nops);
    assert!(second.nopse);
}

#[test]
fn terminal_disambiguation_atoms_apply() {
    let grammar = Grammar::from_string(
        r#"
        S: Id Kw;
        terminals
        Id: /[a-z]+/ {15, prefer, dynamic};
        Kw: "kw" {nofinish};
        "#,
    )
    .unwrap();
    let id = grammar.get_terminal("Id").unwrap();
    let info = grammar.symbol(id).terminal_info().unwrap();
    assert_eq!(info.prior, 15);
    assert!(info.prefer);
    assert!(info.dynamic);
    let kw = grammar.get_terminal("Kw").unwrap();
    assert_eq!(grammar.symbol(kw).terminal_info().unwrap().finish, Some(false));
}

#[test]
fn from_struct_builds_a_grammar() {
    let rules = vec![
        StructRule::new(
            "S",
            vec![
                StructElem::sym("Item"),
                StructElem::lit(";"),
                StructElem::sym("EOF"),
            ],
        ),
        StructRule::new("Item", vec![StructElem::sym("Word")]),
        StructRule::new("Item", vec![StructElem::sym("EMPTY")]),
    ];
    let terminals = vec![("Word".to_string(), r"[a-z]+".to_string())];
    let grammar = Grammar::from_struct(rules, terminals, Some("S")).unwrap();

    assert_eq!(grammar.get_production_id("S'"), Some(0));
    assert_eq!(grammar.symbol(grammar.start_symbol()).name, "S");
    assert!(grammar.get_terminal(";").is_some());
    let item = grammar.get_nonterminal("Item").unwrap();
    let productions = &grammar.symbol(item).nonterminal_info().unwrap().productions;
    assert_eq!(productions.len(), 2);
    // EMPTY-only alternatives have logical length zero.
    assert_eq!(grammar.production(productions[1]).rhs.len(), 0);
}

#[test]
fn serialize_round_trips() {
    let original = Grammar::from_string(
        r#"
        S: Item*[comma] "end";
        Item: name=Id value=Num? {left, 5};
        terminals
        Id: /[a-z]+/;
        Num: /\d+/;
        comma: ",";
        "#,
    )
    .unwrap();

    let serialized = original.serialize();
    let reparsed = Grammar::from_string(&serialized).unwrap();

    assert_eq!(production_shapes(&original), production_shapes(&reparsed));

    let mut original_symbols: Vec<String> = original
        .symbols()
        .map(|ptr| original.fqn(ptr))
        .collect();
    let mut reparsed_symbols: Vec<String> = reparsed
        .symbols()
        .map(|ptr| reparsed.fqn(ptr))
        .collect();
    original_symbols.sort();
    reparsed_symbols.sort();
    assert_eq!(original_symbols, reparsed_symbols);

    // Disambiguation survives the round trip.
    let item = reparsed.get_nonterminal("Item").unwrap();
    let production =
        reparsed.production(reparsed.symbol(item).nonterminal_info().unwrap().productions[0]);
    assert_eq!(production.assoc, Associativity::Left);
    assert_eq!(production.prior, 5);
}

#[test]
fn error_locations_render_with_context() {
    let error = Grammar::from_string("S: missing;").unwrap_err();
    let rendered = format!("{}", error);
    assert!(rendered.contains("Unknown symbol"));
    assert!(rendered.contains("**>"));
    assert_eq!(error.location().unwrap().line(), 1);
    assert_eq!(error.location().unwrap().text(), "missing");
}

#[test]
fn root_file_is_file_zero() {
    let grammar = Grammar::from_string("S: \"a\";").unwrap();
    assert!(grammar.file(ROOT).file_path.is_none());
    assert!(grammar.file(ROOT).imported_with.is_none());
}
