//! End-to-end chat store scenarios
//!
//! Relationship gating, thread/dashboard linkage, paging, durability across
//! reopen, and partial writes when the store fails mid-operation.

mod common;

use common::{init_tracing, to_bob, FailingStore, TestChat};
use threadchat::{ChatError, ChatOptions, StoreError, ThreadedChat};

// ============================================================================
// Relationships
// ============================================================================

#[test]
fn block_then_follow_is_forbidden() {
    let t = TestChat::new("alice");
    t.chat.block_user("eve").unwrap();
    assert!(matches!(t.chat.follow("eve"), Err(ChatError::Forbidden(_))));
}

#[test]
fn follow_unfollow_then_not_found() {
    let t = TestChat::new("alice");
    t.chat.follow("bob").unwrap();
    t.chat.unfollow("bob").unwrap();
    assert!(matches!(
        t.chat.is_following("bob"),
        Err(ChatError::NotFound(_))
    ));
}

#[test]
fn blocked_sender_cannot_post() {
    let t = TestChat::new("alice");
    t.chat.block_user("eve").unwrap();

    let err = t.chat.add_chat("eve", "spam", to_bob()).unwrap_err();
    assert!(matches!(err, ChatError::Forbidden(_)));
    assert!(t.chat.get_chats(None, true).unwrap().is_empty());
}

#[test]
fn empty_recipients_is_invalid() {
    let t = TestChat::new("alice");
    let err = t
        .chat
        .add_chat("alice", "hi", ChatOptions::new(Vec::<String>::new()).media(""))
        .unwrap_err();
    assert!(matches!(err, ChatError::InvalidArgument(_)));
}

// ============================================================================
// Chats and threads
// ============================================================================

#[test]
fn single_chat_round_trip() {
    let t = TestChat::new("alice");
    let chat = t.chat.add_chat("alice", "hi", to_bob()).unwrap();

    assert!(chat.sender_key.ends_with("!alice"));
    let fetched = t.chat.get_chat(&chat.sender_key).unwrap();
    assert_eq!(fetched.message, "hi");
    assert_eq!(fetched.media, "");
    assert_eq!(fetched.recipients, vec!["bob"]);

    let page = t.chat.get_chats(None, true).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].key, chat.sender_key);
    assert_eq!(page[0].chat, chat);
}

#[test]
fn reply_updates_dashboard_and_extends_thread() {
    let t = TestChat::new("alice");
    let root = t
        .chat
        .add_chat("alice", "hi", to_bob().sender_key("100!alice").created(100))
        .unwrap();
    let reply = t
        .chat
        .add_chat(
            "bob",
            "hello back",
            ChatOptions::new(["alice"])
                .media("img.png")
                .sender_key("200!bob")
                .created(200)
                .reply(&root.sender_key),
        )
        .unwrap();

    let page = t.chat.get_chats(None, false).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].key, root.sender_key);
    assert_eq!(page[0].chat, reply);

    let thread = t.chat.get_thread(&root.sender_key, None, false).unwrap();
    let chats: Vec<_> = thread.into_iter().map(|e| e.chat).collect();
    assert_eq!(chats, vec![root.clone(), reply.clone()]);

    let after_root = t
        .chat
        .get_thread(&root.sender_key, Some(&root.sender_key), false)
        .unwrap();
    assert_eq!(after_root.len(), 1);
    assert_eq!(after_root[0].chat, reply);
}

#[test]
fn dashboard_paging_walks_every_thread() {
    let t = TestChat::with_page_limit("alice", 3);
    let mut expected = Vec::new();
    for i in 0..8 {
        let key = format!("{:04}!alice", i);
        t.chat
            .add_chat("alice", "hi", to_bob().sender_key(key.clone()))
            .unwrap();
        expected.push(key);
    }

    // newest first; each page resumes at the last key seen
    let mut seen: Vec<String> = Vec::new();
    let mut start: Option<String> = None;
    loop {
        let page = t.chat.get_chats(start.as_deref(), true).unwrap();
        let fresh: Vec<String> = page
            .into_iter()
            .map(|e| e.key)
            .filter(|k| Some(k) != start.as_ref())
            .collect();
        if fresh.is_empty() {
            break;
        }
        start = fresh.last().cloned();
        seen.extend(fresh);
    }

    expected.reverse();
    assert_eq!(seen, expected);
}

#[test]
fn users_sharing_a_store_keep_separate_dashboards() {
    let t = TestChat::new("alice");
    let bob = t.open_as("bob");

    t.chat.add_chat("alice", "for alice", to_bob()).unwrap();
    assert!(bob.get_chats(None, false).unwrap().is_empty());

    bob.add_chat("bob", "for bob", ChatOptions::new(["alice"]).media(""))
        .unwrap();
    assert_eq!(t.chat.get_chats(None, false).unwrap().len(), 1);
    assert_eq!(bob.get_chats(None, false).unwrap().len(), 1);
}

// ============================================================================
// Durability
// ============================================================================

#[test]
fn reopen_restores_all_partitions() {
    let t = TestChat::new("alice");
    t.chat.follow("bob").unwrap();
    t.chat.block_user("eve").unwrap();
    let root = t.chat.add_chat("alice", "hi", to_bob()).unwrap();
    t.chat
        .add_chat(
            "bob",
            "re",
            to_bob().sender_key("9999999999999!bob").reply(&root.sender_key),
        )
        .unwrap();

    let t = t.reopen();

    assert!(t.chat.is_following("bob").unwrap());
    assert_eq!(t.chat.get_blocked_users().unwrap(), vec!["eve"]);
    assert_eq!(t.chat.get_chat(&root.sender_key).unwrap(), root);
    assert_eq!(t.chat.get_chats(None, true).unwrap().len(), 1);
    assert_eq!(
        t.chat
            .get_thread(&root.sender_key, None, false)
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn standard_durability_survives_clean_close() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let key = {
        let chat = ThreadedChat::open("alice", dir.path()).unwrap();
        chat.add_chat("alice", "hi", to_bob()).unwrap().sender_key
    };

    let chat = ThreadedChat::open("alice", dir.path()).unwrap();
    assert_eq!(chat.get_chat(&key).unwrap().message, "hi");
}

// ============================================================================
// Store failures
// ============================================================================

#[test]
fn failure_on_first_write_stores_nothing() {
    init_tracing();
    let store = FailingStore::new();
    let chat = ThreadedChat::with_store("alice", store.clone(), 10).unwrap();

    store.fail_after(0);
    let err = chat
        .add_chat("alice", "hi", to_bob().sender_key("1!alice"))
        .unwrap_err();
    assert!(matches!(err, ChatError::Internal(StoreError::Storage(_))));

    store.heal();
    assert!(chat.get_chats(None, false).unwrap().is_empty());
    assert!(matches!(
        chat.get_chat("1!alice"),
        Err(ChatError::NotFound(_))
    ));
}

#[test]
fn failure_mid_write_keeps_earlier_steps() {
    init_tracing();
    let store = FailingStore::new();
    let chat = ThreadedChat::with_store("alice", store.clone(), 10).unwrap();

    // dashboard and messages succeed, thread write fails
    store.fail_after(2);
    let err = chat
        .add_chat("alice", "hi", to_bob().sender_key("1!alice"))
        .unwrap_err();
    assert!(matches!(err, ChatError::Internal(_)));

    store.heal();
    assert_eq!(chat.get_chats(None, false).unwrap().len(), 1);
    assert_eq!(chat.get_chat("1!alice").unwrap().message, "hi");
    assert!(chat.get_thread("1!alice", None, false).unwrap().is_empty());
}

#[test]
fn block_failure_after_unfollow() {
    let store = FailingStore::new();
    let chat = ThreadedChat::with_store("alice", store.clone(), 10).unwrap();
    chat.follow("eve").unwrap();

    // unfollow (delete) succeeds, block put fails
    store.fail_after(1);
    assert!(matches!(
        chat.block_user("eve"),
        Err(ChatError::Internal(_))
    ));

    store.heal();
    assert!(chat.get_following().unwrap().is_empty());
    assert!(!chat.is_blocked("eve").unwrap());
}

#[test]
fn read_failures_surface_as_internal() {
    init_tracing();
    let store = FailingStore::new();
    let chat = ThreadedChat::with_store("alice", store.clone(), 10).unwrap();
    let root = chat
        .add_chat("alice", "hi", to_bob().sender_key("1!alice"))
        .unwrap();

    store.fail_reads();
    assert!(matches!(
        chat.get_chats(None, true),
        Err(ChatError::Internal(StoreError::Storage(_)))
    ));
    assert!(matches!(
        chat.get_thread(&root.sender_key, None, false),
        Err(ChatError::Internal(StoreError::Storage(_)))
    ));
    assert!(matches!(
        chat.get_chat(&root.sender_key),
        Err(ChatError::Internal(StoreError::Storage(_)))
    ));
    assert!(matches!(
        chat.get_following(),
        Err(ChatError::Internal(_))
    ));

    // blocklist lookup fails before anything is written
    assert!(matches!(
        chat.add_chat("bob", "re", to_bob().reply(&root.sender_key)),
        Err(ChatError::Internal(_))
    ));

    store.heal();
    assert_eq!(chat.get_thread(&root.sender_key, None, false).unwrap().len(), 1);
    assert_eq!(chat.get_chat("1!alice").unwrap(), root);
}
