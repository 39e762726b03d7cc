use dtree::memory::{Cond, MemoryEnv};
use dtree::{DTree, RejectImports};
use tracing_subscriber::EnvFilter;

const SRC: &str = r#"
if FT not in {PASS}:
    return False
if Inheritance_Mode({"HG002"}) in {"Homozygous Recessive"}:
    return True
if 0.05 < gnomAD_AF <= 0.5:
    return False
return True
"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let env = MemoryEnv::new()
        .with_enum_unit("FT")
        .with_numeric_unit("gnomAD_AF")
        .with_func_unit("Inheritance_Mode", |_, _| vec![]);
    let tree: DTree<Cond> =
        DTree::build(SRC, Some("inheritance"), &env, &mut RejectImports).expect("failed to build tree");

    let report = tree.report_info().expect("tree is active");
    println!("{report}");
    println!();
    for (no, point) in report.points.iter().enumerate() {
        let cond = point
            .cond_data
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        println!("{no:>2} {:?} level {} {cond}", point.kind, point.level);
    }
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&report).expect("report serializes")
    );

    // A broken tree is still inspectable.
    let broken: DTree<Cond> = DTree::new("if FT in {PASS}:\n    return Maybe", None);
    if let Some(err) = broken.error() {
        println!();
        println!("{err}");
    }
}
