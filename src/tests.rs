use crate::{
    Array, Assignment, AssignmentList, Bindings, Context, Dimension, Function, MATCH_KEY, Obj, ObjError, ParseError,
    Rule, SearchGrid, Value, parse_obj, parse_script,
};

#[test]
fn serialized_objects_parse_back_unchanged() {
    // (description, text)
    let cases: Vec<(&str, &str)> = vec![
        ("literal", r#""a \"quoted\" value""#),
        ("variable", "[x]"),
        ("reference", "${model}"),
        ("array", r#"("1", "two", [v], ${r})"#),
        ("empty function", "Empty()"),
        ("positional function", r#"F("a", G("b"), ("x", "y"))"#),
        ("named function", r#"Model(rate="0.1", inner=Tree(depth="3"))"#),
        ("composition", "A(x=\"1\") o B() o C()"),
        ("internal body", "Pipeline(name=p) {\nString a=\"1\";\n(final, shared) Model m=M(x=${a});\n}"),
        ("assignment list", "{a=\"1\", b=F()}"),
        ("rule", "(A(x=[v], y=${k})) -> (B(z=${v}))"),
        ("combinator rule", "(And(a=A(x=[v]), b=Not(c=B(x=${v})))) -> (C(x=${v}))"),
        ("name needing quotes", r#""odd name"(x="1")"#),
    ];

    for (description, text) in cases {
        let parsed = parse_obj(text).unwrap_or_else(|e| panic!("{description}: {e}"));
        let rendered = parsed.to_string();
        let reparsed = parse_obj(&rendered).unwrap_or_else(|e| panic!("{description}: {e} in {rendered}"));
        assert_eq!(reparsed, parsed, "{description}: {rendered}");
    }
}

#[test]
fn constructed_trees_round_trip() {
    let inner = Function::new("Inner", AssignmentList::positional([Obj::literal("x"), Obj::variable("v")]));
    let mut internal = AssignmentList::new();
    internal.push(Assignment::typed(vec!["final".into()], "Feature", "f", Obj::Function(inner.clone()))).unwrap();
    internal.push(Assignment::typed(Vec::new(), "String", "s", Obj::literal("plain"))).unwrap();

    let outer = Function::new(
        "Outer",
        AssignmentList::named([
            ("values", Obj::Array(Array::new(vec![Value::literal("1"), Value::reference("r")]))),
            ("rule", Obj::Rule(Rule::new(inner.clone(), Function::new("T", AssignmentList::new())))),
            ("chain", Obj::Function(Function::compose(Obj::Function(inner.clone()), Obj::Function(inner)))),
        ])
        .unwrap(),
    )
    .with_internal(internal);

    let obj = Obj::Function(outer);
    assert_eq!(parse_obj(&obj.to_string()).unwrap(), obj);

    let rule = Rule::new(Function::new("A", AssignmentList::new()), Function::new("B", AssignmentList::new()));
    let right_operands = vec![
        Obj::Array(Array::new(vec![Value::literal("b")])),
        Obj::Rule(rule),
        Obj::AssignmentList(AssignmentList::named([("k", Obj::literal("v"))]).unwrap()),
    ];
    for right in right_operands {
        let chain = Obj::Function(Function::compose(Obj::literal("a"), right));
        let rendered = chain.to_string();
        assert_eq!(parse_obj(&rendered).unwrap(), chain, "{rendered}");
    }
}

#[test]
fn scripts_round_trip() {
    let text = "String base=\"x\";\n\
                (shared) Model m=M(input=${base}) o Scale(factor=\"2\");\n\
                Rule r=(A(x=[v])) -> (B(x=${v}));";
    let script = parse_script(text).unwrap();
    assert_eq!(script.names().collect::<Vec<_>>(), vec!["base", "m", "r"]);
    assert_eq!(parse_script(&script.to_string()).unwrap(), script);
}

#[test]
fn match_success_convention() {
    let bound = Obj::literal("abc").match_pattern(&Obj::variable("varName"));
    assert_eq!(bound.get("varName"), Some(&Obj::literal("abc")));
    assert!(bound.contains_key(MATCH_KEY));

    assert!(Obj::literal("abc").match_pattern(&Obj::literal("xyz")).is_empty());
}

#[test]
fn mixed_naming_is_rejected() {
    let mut positional = AssignmentList::positional([Obj::literal("a")]);
    assert_eq!(
        positional.push(Assignment::named("b", Obj::literal("b"))),
        Err(ObjError::MixedNaming { inserted: "named", existing: "unnamed" })
    );

    let mut named = AssignmentList::named([("a", Obj::literal("a"))]).unwrap();
    assert!(matches!(named.push(Assignment::positional(Obj::literal("b"))), Err(ObjError::MixedNaming { .. })));

    assert!(matches!(
        parse_obj(r#"F("a", b="b")"#),
        Err(ParseError::Assignment { source: ObjError::MixedNaming { .. }, .. })
    ));
}

#[test]
fn combinator_rule_yields_single_output() {
    let facts = vec![
        parse_obj(r#"TYPE1(r1=O(id="o1"), r2=O(id="o2"))"#).unwrap(),
        parse_obj(r#"TYPE2(r1=O(id="o2"), r2=O(id="o3"))"#).unwrap(),
    ];
    let rule = parse_obj(
        "(And(c1=TYPE1(r1=O(id=[id1]), r2=O(id=[id2])), \
              c2=TYPE2(r1=O(id=${id2}), r2=O(id=[id3])), \
              c3=Not(c1=Equals(${id1},${id3})))) \
         -> (TYPE3(r1=O(id=${id1}), r2=O(id=${id3})))",
    )
    .unwrap();

    let outputs = rule.as_rule().unwrap().apply("join", &facts, &Bindings::new()).unwrap();
    let rendered: Vec<String> = outputs.iter().map(Obj::to_string).collect();
    assert_eq!(rendered, vec![r#"TYPE3(r1=O(id="o1"), r2=O(id="o3"))"#]);
}

#[test]
fn numeric_bound_drops_binding_sets() {
    // (expected outputs, fact value)
    let cases: Vec<(usize, &str)> =
        vec![(1, "0"), (1, "2"), (0, "3"), (0, "12"), (1, "abc"), (1, "0002"), (0, "99999999999999999999999")];
    let rule = parse_obj("(Level(n=[n<3])) -> (Level(n=${n<3++}))").unwrap();
    for (expected, value) in cases {
        let fact = parse_obj(&format!("Level(n=\"{value}\")")).unwrap();
        let outputs = rule.as_rule().unwrap().apply("up", &[fact], &Bindings::new()).unwrap();
        assert_eq!(outputs.len(), expected, "n={value}");
    }
}

#[test]
fn rule_sets_resolve_through_the_context() {
    let script = parse_script(
        "Rule up=(Level(n=[n<3])) -> (Level(n=${n<3++}));\n\
         RuleSet grow=RuleSet(up=${up}, start=(Level(n=\"0\")) -> (Start()));",
    )
    .unwrap();
    let context = Context::from_script(&script);
    let set = context.rule_set("grow").unwrap();
    assert_eq!(set.names().collect::<Vec<_>>(), vec!["up", "start"]);

    let saturation = set.saturate(&[parse_obj(r#"Level(n="0")"#).unwrap()], &Bindings::new(), &Default::default());
    let derived: Vec<String> = saturation.unwrap().derived.iter().map(Obj::to_string).collect();
    assert_eq!(derived, vec![r#"Level(n="1")"#, "Start()", r#"Level(n="2")"#, r#"Level(n="3")"#]);
}

#[test]
fn grid_from_script_dimensions() {
    let script = parse_script(
        "Dimension model=Dimension(name=model, values=(\"a\", \"b\", \"c\")) {\n\
         p0=Dimension(name=p0, stage=\"1\", parent=\"0\", values=(\"x\", \"y\"));\n\
         p1=Dimension(name=p1, stage=\"1\", parent=\"1\", values=(\"x\", \"y\"));\n\
         p2=Dimension(name=p2, stage=\"1\", parent=\"2\", values=(\"x\", \"y\"));\n\
         }\n\
         Dimension seed=Dimension(name=seed, values=(\"1\", \"2\"));",
    )
    .unwrap();
    let dimensions: Vec<Dimension> = script.values().map(|obj| Dimension::from_obj(obj).unwrap()).collect();

    assert_eq!(SearchGrid::construct(&dimensions[..1], None).unwrap().len(), 6);
    assert_eq!(SearchGrid::construct(&dimensions, None).unwrap().len(), 12);
}
