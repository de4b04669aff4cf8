use quickfit_core::{QuickFitAllocator, QuickFitConfig, SystemProvider};
use serde_json::{Value, json};

#[test]
fn snapshot_serializes_per_class_free_sizes() {
    let mut alloc = QuickFitAllocator::with_defaults();
    let a = alloc.allocate(50).unwrap();
    let b = alloc.allocate(30).unwrap();
    let c = alloc.allocate(120).unwrap();
    alloc.release(a).unwrap();
    alloc.release(b).unwrap();
    alloc.release(c).unwrap();

    let value = serde_json::to_value(alloc.snapshot()).unwrap();
    assert_eq!(
        value,
        json!({
            "classes": [
                { "index": 0, "threshold": 50, "blocks": [1, 0], "free_sizes": [30, 50] },
                { "index": 1, "threshold": 100, "blocks": [], "free_sizes": [] },
                { "index": 2, "threshold": 200, "blocks": [2], "free_sizes": [120] },
            ]
        })
    );
}

#[test]
fn lifecycle_records_emit_as_jsonl() {
    let config = QuickFitConfig::default().lifecycle_logging(true);
    let mut alloc = QuickFitAllocator::new(config, SystemProvider::new()).unwrap();
    let h = alloc.allocate(64).unwrap();
    alloc.release(h).unwrap();
    let _ = alloc.allocate(500);

    let lines: Vec<String> = alloc
        .drain_lifecycle_logs()
        .iter()
        .map(|record| serde_json::to_string(record).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);

    let parsed: Vec<Value> = lines
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(parsed[0]["symbol"], "allocate");
    assert_eq!(parsed[0]["level"], "trace");
    assert_eq!(parsed[0]["block"], 0);
    assert_eq!(parsed[1]["event"], "free");
    assert_eq!(parsed[1]["free_blocks"], 1);
    assert_eq!(parsed[2]["level"], "warn");
    assert_eq!(parsed[2]["event"], "size_not_supported");
    assert_eq!(parsed[2]["block"], Value::Null);
    for (i, record) in parsed.iter().enumerate() {
        assert_eq!(record["decision_id"], (i + 1) as u64);
        assert!(record["trace_id"].as_str().unwrap().starts_with("quickfit::"));
    }
}

#[test]
fn stats_serialize_with_counters() {
    let config = QuickFitConfig::default().lifecycle_logging(false);
    let mut alloc = QuickFitAllocator::new(config, SystemProvider::new()).unwrap();
    let h = alloc.allocate(10).unwrap();
    alloc.release(h).unwrap();
    let _reused = alloc.allocate(10).unwrap();

    let value = serde_json::to_value(alloc.stats()).unwrap();
    assert_eq!(value["fresh_blocks"], 1);
    assert_eq!(value["reused_blocks"], 1);
    assert_eq!(value["releases"], 1);
    assert_eq!(value["live_blocks"], 1);
    assert_eq!(value["free_blocks"], 0);
    assert!(alloc.lifecycle_logs().is_empty());
}
