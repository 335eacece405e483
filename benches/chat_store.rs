//! Chat store benchmarks
//!
//! - add_chat on the in-memory and WAL-backed stores
//! - get_chats / get_thread page reads at several partition sizes
//! - get_chat point lookups
//!
//! ## Running
//!
//! ```bash
//! cargo bench --bench chat_store
//! cargo bench --bench chat_store -- "chat/add"
//! THREADCHAT_DURABILITY=always cargo bench --bench chat_store -- "durable"
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::TempDir;
use threadchat::{ChatConfig, ChatOptions, ThreadedChat};

/// Thread/dashboard sizes for read benchmarks.
const PARTITION_SIZES: &[usize] = &[100, 1_000, 10_000];

/// Durability string from the environment ("standard" unless overridden).
fn durability() -> String {
    std::env::var("THREADCHAT_DURABILITY")
        .ok()
        .filter(|s| s == "always" || s == "standard")
        .unwrap_or_else(|| "standard".to_string())
}

fn options(key: String) -> ChatOptions {
    ChatOptions::new(["bob"]).media("").sender_key(key)
}

fn durable_chat() -> (ThreadedChat, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = ChatConfig::at(dir.path()).with_durability(durability());
    (ThreadedChat::open_with_config("alice", config).unwrap(), dir)
}

fn seeded_thread(size: usize) -> ThreadedChat {
    let chat = ThreadedChat::ephemeral("alice").unwrap();
    let root = format!("{:012}!alice", 0);
    chat.add_chat("alice", "root", options(root.clone())).unwrap();
    for i in 1..size {
        chat.add_chat(
            "alice",
            "reply",
            options(format!("{:012}!alice", i)).reply(root.clone()),
        )
        .unwrap();
    }
    chat
}

fn seeded_dashboard(size: usize) -> ThreadedChat {
    let chat = ThreadedChat::ephemeral("alice").unwrap();
    for i in 0..size {
        chat.add_chat("alice", "hi", options(format!("{:012}!alice", i)))
            .unwrap();
    }
    chat
}

fn add_chat_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("chat/add");
    group.throughput(Throughput::Elements(1));

    group.bench_function("ephemeral", |b| {
        let chat = ThreadedChat::ephemeral("alice").unwrap();
        let counter = AtomicU64::new(0);
        b.iter(|| {
            let i = counter.fetch_add(1, Ordering::Relaxed);
            black_box(
                chat.add_chat("alice", "hi", options(format!("{:012}!alice", i)))
                    .unwrap(),
            )
        });
    });

    group.bench_function(format!("durable_{}", durability()), |b| {
        let (chat, _dir) = durable_chat();
        let counter = AtomicU64::new(0);
        b.iter(|| {
            let i = counter.fetch_add(1, Ordering::Relaxed);
            black_box(
                chat.add_chat("alice", "hi", options(format!("{:012}!alice", i)))
                    .unwrap(),
            )
        });
    });

    group.finish();
}

fn read_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("chat/read");

    for &size in PARTITION_SIZES {
        let dashboard = seeded_dashboard(size);
        group.bench_with_input(BenchmarkId::new("get_chats_newest", size), &size, |b, _| {
            b.iter(|| black_box(dashboard.get_chats(None, true).unwrap()))
        });

        let mid = format!("{:012}!alice", size / 2);
        group.bench_with_input(BenchmarkId::new("get_chat", size), &size, |b, _| {
            b.iter(|| black_box(dashboard.get_chat(&mid).unwrap()))
        });

        let thread = seeded_thread(size);
        let root = format!("{:012}!alice", 0);
        group.bench_with_input(BenchmarkId::new("get_thread_since", size), &size, |b, _| {
            b.iter(|| black_box(thread.get_thread(&root, Some(&mid), false).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, add_chat_benchmarks, read_benchmarks);
criterion_main!(benches);
