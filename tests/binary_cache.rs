#![cfg(feature = "binary-cache")]

use dtree::memory::{Cond, MemoryEnv, Record, RecordSet};
use dtree::{parse, DTree, DeserializeError, EngineConfig, ParsedTree, RejectImports};

const SRC: &str = "\
if GQ < 20:
    return False
if (FT in {PASS} or Callers in all {GATK, BGM}):
    return True
return False";

fn dataset() -> RecordSet {
    vec![
        Record::new().set("GQ", 10_i64).set("FT", "PASS"),
        Record::new().set("GQ", 40_i64).set("FT", "PASS"),
        Record::new()
            .set("GQ", 40_i64)
            .set("FT", "LowQual")
            .set("Callers", &["GATK", "BGM"][..]),
        Record::new().set("GQ", 40_i64).set("FT", "LowQual"),
    ]
    .into_iter()
    .collect()
}

#[test]
fn round_trip_preserves_tree() {
    let parsed = parse(SRC);
    let bytes = parsed.to_bytes().unwrap();
    assert_eq!(&bytes[0..4], b"DTRE");
    let restored = ParsedTree::from_bytes(&bytes).unwrap();
    assert_eq!(restored, parsed);
}

#[test]
fn restored_tree_evaluates_identically() {
    let original: DTree<Cond> =
        DTree::build(SRC, Some("cached"), &MemoryEnv::new(), &mut RejectImports).unwrap();
    let bytes = original.to_bytes().unwrap();

    let mut restored: DTree<Cond> = DTree::from_bytes(&bytes, Some("cached")).unwrap();
    assert!(!restored.is_active());
    restored.activate(&MemoryEnv::new(), &mut RejectImports).unwrap();

    let data = dataset();
    let config = EngineConfig::default();
    let expected = original.collect_rec_seq(&data, &config).unwrap();
    assert_eq!(restored.collect_rec_seq(&data, &config).unwrap(), expected);
    assert_eq!(expected.rec_nos, vec![1, 2]);
    assert_eq!(restored.hash(), original.hash());
}

#[test]
fn file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.bin");
    let parsed = parse(SRC);
    parsed.to_binary_file(&path).unwrap();
    assert_eq!(ParsedTree::from_binary_file(&path).unwrap(), parsed);
}

#[test]
fn corrupted_payload_rejected() {
    let mut bytes = parse(SRC).to_bytes().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    assert!(matches!(
        ParsedTree::from_bytes(&bytes),
        Err(DeserializeError::ChecksumMismatch)
    ));
}

#[test]
fn wrong_version_rejected() {
    let mut bytes = parse(SRC).to_bytes().unwrap();
    bytes[4..6].copy_from_slice(&99u16.to_le_bytes());
    assert!(matches!(
        ParsedTree::from_bytes(&bytes),
        Err(DeserializeError::IncompatibleVersion {
            blob: 99,
            supported: 1
        })
    ));
}

#[test]
fn truncated_blob_rejected() {
    let bytes = parse(SRC).to_bytes().unwrap();
    assert!(matches!(
        ParsedTree::from_bytes(&bytes[..bytes.len() - 3]),
        Err(DeserializeError::LengthMismatch { .. })
    ));
    assert!(matches!(
        ParsedTree::from_bytes(b"DTRE"),
        Err(DeserializeError::LengthMismatch { .. })
    ));
}

#[test]
fn wrong_magic_rejected() {
    let mut bytes = parse(SRC).to_bytes().unwrap();
    bytes[0..4].copy_from_slice(b"OORO");
    assert!(matches!(
        ParsedTree::from_bytes(&bytes),
        Err(DeserializeError::BadMagic)
    ));
}

#[test]
fn syntax_error_survives_cache() {
    let parsed = parse("if GQ >= abc:\n    return True");
    let restored = ParsedTree::from_bytes(&parsed.to_bytes().unwrap()).unwrap();
    let err = restored.error().unwrap();
    assert_eq!((err.line, err.offset), (1, 10));
}
