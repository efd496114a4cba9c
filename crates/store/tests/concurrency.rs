use anyhow::Result;
use context_store::SharedContextStore;
use serde_json::json;
use std::collections::HashMap;
use std::thread;

const WRITERS: usize = 4;
const ITEMS_PER_WRITER: usize = 25;
const READERS: usize = 4;

#[test]
fn concurrent_writers_and_readers_keep_invariants() -> Result<()> {
    let shared = SharedContextStore::new();

    let mut handles = Vec::new();
    for writer in 0..WRITERS {
        let shared = shared.clone();
        handles.push(thread::spawn(move || {
            for i in 0..ITEMS_PER_WRITER {
                let embedding: Vec<f32> = vec![writer as f32 + 1.0, i as f32 + 1.0];
                shared
                    .add_item_full(
                        json!({"writer": writer, "seq": i}),
                        "generic",
                        HashMap::new(),
                        Some(embedding),
                    )
                    .expect("add_item under contention");
            }
        }));
    }

    for _ in 0..READERS {
        let shared = shared.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..50 {
                // One shared lock per check, so the pair is a consistent view:
                // every embedded item must have exactly one index row.
                shared.read(|store| {
                    let stats = store.statistics();
                    assert_eq!(stats.item_count, store.len());
                    if let Some(index_stats) = stats.vector_index {
                        assert!(index_stats.rows <= store.len());
                    }
                });
                let _ = shared.similar_items(&[1.0, 1.0], 5, 0.0);
            }
        }));
    }

    for handle in handles {
        handle.join().expect("worker thread");
    }

    assert_eq!(shared.len(), WRITERS * ITEMS_PER_WRITER);
    let stats = shared.statistics();
    assert_eq!(stats.item_count, WRITERS * ITEMS_PER_WRITER);
    assert_eq!(
        stats.vector_index.map(|v| v.rows),
        Some(WRITERS * ITEMS_PER_WRITER)
    );
    Ok(())
}

#[test]
fn writers_serialize_relationship_insertion() -> Result<()> {
    let shared = SharedContextStore::new();
    let hub = shared.add_item(json!("hub"))?;

    let spokes: Vec<String> = (0..8)
        .map(|i| shared.add_item(json!({"spoke": i})).map(|item| item.id))
        .collect::<Result<_, _>>()?;

    let mut handles = Vec::new();
    for spoke in spokes {
        let shared = shared.clone();
        let hub_id = hub.id.clone();
        handles.push(thread::spawn(move || {
            shared
                .add_relationship(&hub_id, &spoke, "spoke", 1.0, false, HashMap::new())
                .expect("relationship under contention");
        }));
    }
    for handle in handles {
        handle.join().expect("writer thread");
    }

    assert_eq!(shared.statistics().relationship_count, 8);
    assert_eq!(shared.neighbors(&hub.id, None, 1).len(), 8);
    Ok(())
}
