use criterion::{Criterion, criterion_group, criterion_main};
use event_store::{
    AggregateId, EventEnvelope, EventStore, EventStoreExt, InMemoryEventStore, Version,
};

fn make_event(stream_id: AggregateId, version: i64) -> EventEnvelope {
    EventEnvelope::builder()
        .stream_id(stream_id)
        .aggregate_type("Content")
        .event_type("ContentUpdated")
        .version(Version::new(version))
        .payload_raw(serde_json::json!({
            "type": "ContentUpdated",
            "data": { "data": { "title": { "iv": "Hello" } } }
        }))
        .actor("subject:bench")
        .build()
        .unwrap()
}

fn bench_append_single_event(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_single_event", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let id = AggregateId::new();
                store
                    .append(id, Version::initial(), vec![make_event(id, 1)])
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_append_batch_10(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_batch_10", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let id = AggregateId::new();
                let events: Vec<EventEnvelope> = (1..=10).map(|v| make_event(id, v)).collect();
                store.append(id, Version::initial(), events).await.unwrap();
            });
        });
    });
}

fn bench_read_stream_100(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let id = AggregateId::new();

    rt.block_on(async {
        let events: Vec<EventEnvelope> = (1..=100).map(|v| make_event(id, v)).collect();
        store.append(id, Version::initial(), events).await.unwrap();
    });

    c.bench_function("event_store/read_stream_100", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.read_all(id).await.unwrap();
            });
        });
    });
}

fn bench_stream_all_events(c: &mut Criterion) {
    use futures_util::StreamExt;

    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();

    rt.block_on(async {
        for _ in 0..10 {
            let id = AggregateId::new();
            let events: Vec<EventEnvelope> = (1..=100).map(|v| make_event(id, v)).collect();
            store.append(id, Version::initial(), events).await.unwrap();
        }
    });

    c.bench_function("event_store/stream_1000_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut stream = store.stream_all().await.unwrap();
                let mut count = 0;
                while let Some(result) = stream.next().await {
                    result.unwrap();
                    count += 1;
                }
                assert_eq!(count, 1000);
            });
        });
    });
}

criterion_group!(
    benches,
    bench_append_single_event,
    bench_append_batch_10,
    bench_read_stream_100,
    bench_stream_all_events,
);
criterion_main!(benches);
