use dtree::memory::{Cond, MemoryEnv, Record, RecordSet, UnitRegistry};
use dtree::{DTree, EngineConfig};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut registry = UnitRegistry::new(["Compens"]);
    let mut tree: DTree<Cond> =
        DTree::from_file("demos/triage.dtree", Some("triage")).expect("failed to read tree");
    tree.activate(&MemoryEnv::new(), &mut registry)
        .expect("failed to activate tree");

    println!("{tree}");

    let data: RecordSet = vec![
        Record::new()
            .set("gnomAD_AF", 0.0002)
            .set("Proband_GQ", 60_i64)
            .set("Callers", &["GATK"][..])
            .set("FT", "PASS"),
        Record::new()
            .set("gnomAD_AF", 0.2)
            .set("Proband_GQ", 60_i64)
            .set("Callers", &["GATK", "BGM"][..])
            .set("FT", "PASS"),
        Record::new()
            .set("gnomAD_AF", 0.0002)
            .set("Proband_GQ", 12_i64)
            .set("Callers", &["BGM"][..])
            .set("FT", "PASS"),
        Record::new()
            .set("gnomAD_AF", 0.0001)
            .set("Proband_GQ", 35_i64)
            .set("Callers", &["RUFUS"][..])
            .set("FT", "LowQual"),
    ]
    .into_iter()
    .collect();

    // Honors DTREE_MAX__WS__SIZE.
    let config = EngineConfig::load(None).expect("failed to load config");

    match tree.collect_rec_seq(&data, &config) {
        Ok(collected) => {
            println!("{collected}");
            for row in &collected.trace {
                let count = row.count.map_or("-".to_owned(), |n| n.to_string());
                println!("{count:>4}  {}", row.code_frag.lines().next().unwrap_or(""));
            }
        }
        Err(err) => println!("Collection failed: {err}"),
    }
}
