use dtree::memory::{Cond, MemoryEnv, Record, RecordSet};
use dtree::{DTree, EngineConfig, EvalError, InstrKind, RejectImports, StoryId};

fn build(src: &str) -> DTree<Cond> {
    DTree::build(src, None, &MemoryEnv::new(), &mut RejectImports).unwrap()
}

#[test]
fn empty_source() {
    let tree = build("");
    assert!(tree.no_errors());
    assert!(tree.is_empty());
    assert_eq!(tree.undetermined_story().unwrap(), Some(StoryId::ROOT));

    let data: RecordSet = vec![Record::new()].into_iter().collect();
    let collected = tree.collect_rec_seq(&data, &EngineConfig::default()).unwrap();
    assert!(collected.rec_nos.is_empty());
    assert!(collected.trace.is_empty());
}

#[test]
fn comments_only() {
    let tree = build("# nothing to decide\n\n   # indented comment\n");
    assert!(tree.no_errors());
    assert_eq!(tree.len(), 0);
}

#[test]
fn single_return_selects_everything() {
    let tree = build("return True");
    let data: RecordSet = (0..4_i64).map(|i| Record::new().set("N", i)).collect();
    let collected = tree.collect_rec_seq(&data, &EngineConfig::default()).unwrap();
    assert_eq!(collected.rec_nos, vec![0, 1, 2, 3]);
    assert_eq!(collected.trace[0].count, Some(4));
}

#[test]
fn records_missing_attributes() {
    let tree = build(
        "if GQ < 20:\n    return False\nif FT not in {PASS}:\n    return False\nreturn True",
    );
    let data: RecordSet = vec![
        Record::new(),
        Record::new().set("GQ", 10_i64),
        Record::new().set("FT", "PASS"),
    ]
    .into_iter()
    .collect();
    let collected = tree.collect_rec_seq(&data, &EngineConfig::default()).unwrap();
    assert_eq!(collected.rec_nos, vec![2]);
}

#[test]
fn long_sibling_chain() {
    let mut src = String::new();
    for i in 0..500 {
        let decision = if i % 2 == 0 { "True" } else { "False" };
        src.push_str(&format!("if N == {i}:\n    return {decision}\n"));
    }
    src.push_str("return False\n");
    let tree = build(&src);
    assert_eq!(tree.len(), 1001);

    let data: RecordSet = (0..10_i64).map(|i| Record::new().set("N", i * 60)).collect();
    let collected = tree.collect_rec_seq(&data, &EngineConfig::default()).unwrap();
    assert_eq!(collected.rec_nos, (0..9).collect::<Vec<usize>>());
    assert_eq!(collected.trace[1000].count, Some(1));
}

#[test]
fn not_equal_and_float_bounds() {
    let tree = build("if AF != 0:\n    return True\nreturn False");
    let data: RecordSet = vec![
        Record::new().set("AF", 0.0),
        Record::new().set("AF", 0.5),
        Record::new().set("AF", 0_i64),
    ]
    .into_iter()
    .collect();
    let collected = tree.collect_rec_seq(&data, &EngineConfig::default()).unwrap();
    assert_eq!(collected.rec_nos, vec![1]);
}

#[test]
fn trailing_if_without_body() {
    let mut tree: DTree<Cond> = DTree::new("if A in {x}:\n    return True\nif B in {y}:", None);
    let err = tree.error().unwrap();
    assert_eq!((err.line, err.offset), (3, 13));
    tree.activate(&MemoryEnv::new(), &mut RejectImports).unwrap();
    assert_eq!(tree.checkpoint(3).map(|p| p.kind()), Some(InstrKind::Error));
    assert_eq!(tree.actual_condition(0).unwrap_err(), EvalError::HasErrors);
}

#[test]
fn function_leaf_needs_evaluator() {
    let err = DTree::<Cond>::build(
        "if Inheritance_Mode({\"HG002\"}) in {\"De-Novo\"}:\n    return True\nreturn False",
        None,
        &MemoryEnv::new(),
        &mut RejectImports,
    )
    .unwrap_err();
    assert!(err.to_string().contains("Inheritance_Mode"), "{err}");
}

#[test]
fn unit_kind_mismatch() {
    let env = MemoryEnv::new().with_numeric_unit("GQ");
    let err =
        DTree::<Cond>::build("if GQ in {high}:\n    return True", None, &env, &mut RejectImports)
            .unwrap_err();
    assert_eq!(
        err.to_string(),
        "point 0: bad condition: unit 'GQ' is not a numeric unit"
    );
}
