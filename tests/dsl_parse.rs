use dtree::memory::{Cond, MemoryEnv};
use dtree::{parse, CondData, DTree, InstrKind, JoinMode, LeafCond, LineSpan, RejectImports};

const TRIAGE: &str = r#"# BGM triage
import Compens

if gnomAD_AF >= 0.01:
    return False

if (Callers in {"GATK", "BGM"}
        and 20 <= Proband_GQ):
    return True

return False
"#;

#[test]
fn dsl_parse_fragments() {
    let tree = parse(TRIAGE);
    assert!(tree.error().is_none());

    let rows: Vec<(InstrKind, usize, LineSpan)> = tree
        .fragments()
        .iter()
        .map(|f| (f.kind(), f.level(), f.lines()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (InstrKind::Import, 0, LineSpan { start: 2, end: 3 }),
            (InstrKind::If, 0, LineSpan { start: 4, end: 5 }),
            (InstrKind::Return, 1, LineSpan { start: 5, end: 6 }),
            (InstrKind::If, 0, LineSpan { start: 7, end: 9 }),
            (InstrKind::Return, 1, LineSpan { start: 9, end: 10 }),
            (InstrKind::Return, 0, LineSpan { start: 11, end: 12 }),
        ]
    );
    assert_eq!(tree.fragments()[2].decision(), Some(false));
    assert_eq!(tree.fragments()[4].decision(), Some(true));
}

#[test]
fn dsl_condition_data() {
    let tree = parse(TRIAGE);
    match tree.fragments()[3].cond_data() {
        Some(CondData::And(items)) => {
            assert_eq!(items.len(), 2);
            match &items[0] {
                CondData::Leaf(LeafCond::Enum {
                    unit,
                    mode,
                    variants,
                }) => {
                    assert_eq!(unit, "Callers");
                    assert_eq!(*mode, JoinMode::Or);
                    assert_eq!(variants, &["GATK", "BGM"]);
                }
                other => panic!("expected enum leaf, got {other:?}"),
            }
            match &items[1] {
                CondData::Leaf(LeafCond::Numeric { unit, bounds }) => {
                    assert_eq!(unit, "Proband_GQ");
                    assert_eq!(bounds.min, Some(20.0));
                    assert!(bounds.min_eq);
                    assert_eq!(bounds.max, None);
                }
                other => panic!("expected numeric leaf, got {other:?}"),
            }
        }
        other => panic!("expected And, got {other:?}"),
    }
    assert_eq!(
        tree.fragments()[1].cond_data().map(ToString::to_string).as_deref(),
        Some("0.01 <= gnomAD_AF")
    );
}

#[test]
fn dsl_markers_follow_leaves() {
    let tree = parse(TRIAGE);
    let markers = tree.fragments()[3].markers();
    assert_eq!(markers.len(), 2);
    assert_eq!(markers[0].loc.line, 7);
    assert_eq!(markers[0].loc.start_col, 5);
    assert_eq!(markers[1].loc.line, 8);
    assert_eq!(markers[1].cond.unit(), "Proband_GQ");
    assert!(tree.fragments()[5].markers().is_empty());
}

#[test]
fn hash_is_stable_over_identical_source() {
    assert_eq!(parse(TRIAGE).hash(), parse(TRIAGE).hash());
}

#[test]
fn hash_ignores_trailing_whitespace() {
    let padded = TRIAGE.replace("return False\n", "return False   \n");
    assert_ne!(padded, TRIAGE);
    assert_eq!(parse(&padded).hash(), parse(TRIAGE).hash());
    let crlf = TRIAGE.replace('\n', "\r\n");
    assert_eq!(parse(&crlf).hash(), parse(TRIAGE).hash());
}

#[test]
fn hash_changes_with_a_literal() {
    let changed = TRIAGE.replace("0.01", "0.02");
    assert_ne!(parse(&changed).hash(), parse(TRIAGE).hash());
}

#[test]
fn syntax_error_at_line_4_column_10() {
    let src = "if FT in {PASS}:\n    return False\n# quality gate\nif GQ >= abc:\n    return True\nreturn False";
    let tree = parse(src);
    let err = tree.error().expect("syntax error expected");
    assert_eq!((err.line, err.offset), (4, 10));

    let kinds: Vec<InstrKind> = tree.fragments().iter().map(|f| f.kind()).collect();
    assert_eq!(kinds, vec![InstrKind::If, InstrKind::Return, InstrKind::Error]);
    assert_eq!(tree.fragments()[2].lines(), LineSpan { start: 4, end: 7 });
}

#[test]
fn syntax_error_location_ignores_preceding_fragments() {
    let prefix = "if A in {x}:\n    return True\n";
    let short = parse("import A\nif A in {x}:\n    return False\n# gate\nif GQ >= abc:");
    let long = parse(&format!("{prefix}{prefix}{prefix}if GQ >= abc:"));
    assert_eq!(short.error().map(|e| (e.line, e.offset)), Some((5, 10)));
    assert_eq!(long.error().map(|e| (e.line, e.offset)), Some((7, 10)));
}

#[test]
fn syntax_error_display() {
    let tree = parse("return Maybe");
    let err = tree.error().unwrap();
    let text = err.to_string();
    assert!(text.starts_with("syntax error at line 1, column 8:"), "{text}");
}

#[test]
fn structural_syntax_errors() {
    let cases = [
        ("return True\nreturn False", "instructions after final return", 2, 1),
        ("if A in {x}:\nreturn True", "expected an indented return after if", 2, 1),
        ("    return True", "unexpected indent", 1, 1),
        ("if A in {x}:\n    import B", "only a return instruction may form an if body", 2, 5),
        ("if A in {x}:\n\treturn True", "tab in indentation", 2, 1),
        ("if A in {x}: return True", "if body must be on its own indented line", 1, 14),
    ];
    for (src, message, line, offset) in cases {
        let tree = parse(src);
        let err = tree.error().unwrap_or_else(|| panic!("no error for {src:?}"));
        assert_eq!(err.message, message, "for {src:?}");
        assert_eq!((err.line, err.offset), (line, offset), "for {src:?}");
    }
}

#[test]
fn single_quotes_and_exponents() {
    let tree = parse("if FT in {'PASS'} and AF < 1e-3:\n    return True\nreturn False");
    assert!(tree.error().is_none(), "{:?}", tree.error());
    assert_eq!(
        tree.fragments()[0].cond_data().map(ToString::to_string),
        parse("if FT in {\"PASS\"} and AF < 0.001:\n    return True\nreturn False").fragments()[0]
            .cond_data()
            .map(ToString::to_string)
    );

    let tree = parse("if (FT in {'(',\n        'x'}):\n    return True\nreturn False");
    assert!(tree.error().is_none(), "{:?}", tree.error());
    assert_eq!(tree.fragments()[0].lines(), LineSpan { start: 1, end: 3 });
}

#[test]
fn erroneous_tree_stays_inspectable() {
    let mut tree: DTree<Cond> =
        DTree::new("if A in {x}:\n    return True\nreturn Maybe", Some("broken"));
    assert!(!tree.no_errors());
    assert_eq!(tree.fragments().len(), 3);
    tree.activate(&MemoryEnv::new(), &mut RejectImports).unwrap();

    let report = tree.report_info().unwrap();
    assert!(report.error);
    assert_eq!(report.points.len(), 3);
    assert_eq!(report.points[2].kind, InstrKind::Error);
    assert_eq!(report.points[2].code_frag, "return Maybe");
}

#[test]
fn report_serializes_with_tree_name() {
    let mut accept = |_: usize, _: &str, _: &Cond, _: &str| true;
    let tree = DTree::build(TRIAGE, Some("BGM Red Button"), &MemoryEnv::new(), &mut accept).unwrap();
    let report = tree.report_info().unwrap();
    assert_eq!(report.markers.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(
        report.points[3].code_frag,
        "if (Callers in {\"GATK\", \"BGM\"}\n        and 20 <= Proband_GQ):"
    );

    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["dtree-name"], "BGM Red Button");
    assert_eq!(json["hash"], tree.hash());
    assert_eq!(json["error"], false);
    assert_eq!(json["points"].as_array().map(Vec::len), Some(6));

    let unnamed: DTree<Cond> =
        DTree::build("return True", None, &MemoryEnv::new(), &mut RejectImports).unwrap();
    let json = serde_json::to_value(unnamed.report_info().unwrap()).unwrap();
    assert!(json.get("dtree-name").is_none());
}

#[test]
fn parse_sources_joins_pieces() {
    let joined = dtree::parse::parse_sources(&["if A in {x}:\n    return True", "return False"]);
    assert!(joined.error().is_none());
    assert_eq!(joined.fragments().len(), 3);
    assert_eq!(joined.hash(), parse("if A in {x}:\n    return True\nreturn False").hash());
}
