//! End-to-end properties of the note repository.

use netpaste_core::{
    mask_origin, ClientClass, ClientInfo, CommitRequest, CoreError, NoteRepository,
    RepositoryConfig,
};
use netpaste_kv::{KvBackend, TtlState};
use netpaste_testkit::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn concurrent_commits_with_same_token_have_one_winner() {
    let fixture = TestRepository::memory();
    let repo = Arc::clone(&fixture.repo);

    let result = race_commits(repo, "concurrency-test", 10);

    assert_eq!(result.winners.len(), 1);
    assert_eq!(result.mismatches, 9);
    assert_eq!(result.other_failures, 0);
    assert_eq!(result.stored_content, result.winners[0]);
}

#[test]
fn concurrent_commits_on_file_backend_have_one_winner() {
    let fixture = TestRepository::file();
    let repo = Arc::clone(&fixture.repo);

    let result = race_commits(repo, "on-disk", 8);

    assert_eq!(result.winners.len(), 1);
    assert_eq!(result.mismatches, 7);
    assert_eq!(result.stored_content, result.winners[0]);
}

#[test]
fn distinct_notes_never_interfere() {
    let fixture = TestRepository::memory();
    let repo = Arc::clone(&fixture.repo);

    let result = stress_distinct_notes(Arc::clone(&repo), 10);

    assert_eq!(result.successful_ops, 10);
    assert_eq!(result.failed_ops, 0);
    for t in 0..10 {
        let record = stored_record(&repo, &format!("note-user-{t}")).unwrap();
        assert_eq!(record.content(), format!("independent content for {t}"));
    }
}

#[test]
fn racing_first_fetches_are_an_accepted_last_writer_wins() {
    let fixture = TestRepository::memory();
    let repo = Arc::clone(&fixture.repo);

    let result = race_first_fetch(Arc::clone(&repo), "brand-new", 8);

    // Several readers may each have created the note, but exactly one record
    // survives and it is one of the ones handed out.
    assert_eq!(result.failures, 0);
    assert!(!result.observed_ids.is_empty());
    let stored = result.stored_id.expect("note should exist");
    assert!(result.observed_ids.contains(&stored));

    let record = stored_record(&repo, "brand-new").unwrap();
    assert!(record.read_count() >= 1);
    assert!(record.access_log().len() <= 20);
    assert_eq!(record.content(), "");
}

#[test]
fn retrying_writers_lose_no_appends() {
    let fixture = TestRepository::memory();
    let repo = Arc::clone(&fixture.repo);

    stress_retrying_appends(Arc::clone(&repo), "shared", 4, 10);

    let content = stored_record(&repo, "shared").unwrap().content().to_string();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 40);
    for w in 0..4 {
        for a in 0..10 {
            let line = format!("w{w}-{a}");
            assert!(lines.contains(&line.as_str()), "missing {line}");
        }
    }
}

#[test]
fn fetch_creates_then_counts() {
    let fixture = TestRepository::memory();

    let first = fixture.fetch("x");
    assert_eq!(first.read_count, 1);
    assert_eq!(first.access_log.len(), 1);

    let second = fixture
        .repo
        .fetch_or_create("x", "", &mobile_client())
        .unwrap();
    assert_eq!(second.read_count, 2);
    assert_eq!(second.access_log.len(), 2);
    assert_eq!(
        second.access_log.newest().unwrap().client_class,
        ClientClass::Mobile
    );
    assert_eq!(
        second.access_log.entries()[1].client_class,
        ClientClass::Desktop
    );
}

#[test]
fn password_gate() {
    let fixture = TestRepository::memory();
    let open = fixture.fetch("open");
    assert!(!open.has_password);
    assert!(fixture
        .repo
        .fetch_or_create("open", "anything", &default_client())
        .is_ok());

    let t0 = fixture.fetch("locked").version_token;
    fixture
        .repo
        .commit(CommitRequest::new("locked", t0, "top secret").password("p"))
        .unwrap();
    let before = fixture.stored("locked").unwrap();

    let denied = fixture
        .repo
        .fetch_or_create("locked", "wrong", &default_client());
    assert!(matches!(denied, Err(CoreError::AccessDenied { .. })));
    let after_denial = fixture.stored("locked").unwrap();
    assert_eq!(after_denial.read_count(), before.read_count());
    assert_eq!(after_denial.access_log(), before.access_log());

    let granted = fixture
        .repo
        .fetch_or_create("locked", "p", &default_client())
        .unwrap();
    assert_eq!(granted.content, "top secret");
    assert_eq!(granted.read_count, before.read_count() + 1);
    assert!(granted.has_password);
}

#[test]
fn password_stays_inside_the_repository() {
    let fixture = TestRepository::memory();
    let t0 = fixture.fetch("vault").version_token;
    let committed = fixture
        .repo
        .commit(CommitRequest::new("vault", t0, "private words").password("pw-7731"))
        .unwrap();
    assert!(!format!("{committed:?}").contains("pw-7731"));

    let denied = fixture
        .repo
        .fetch_or_create("vault", "guess", &default_client())
        .unwrap_err();
    assert!(!format!("{denied} {denied:?}").contains("pw-7731"));
    assert!(!format!("{denied} {denied:?}").contains("private words"));

    let view = fixture
        .repo
        .fetch_or_create("vault", "pw-7731", &default_client())
        .unwrap();
    let json = serde_json::to_string(&view).unwrap();
    assert!(json.contains("\"has_password\":true"));
    assert!(!json.contains("note_pwd"));
    assert!(!json.contains("pw-7731"));

    // Only the raw backend value carries it
    assert!(fixture.stored("vault").unwrap().password_matches("pw-7731"));
}

#[test]
fn log_keeps_twenty_most_recent() {
    let fixture = TestRepository::memory();

    for n in 0..25u8 {
        let client = ClientInfo::new(format!("10.0.0.{n}"), "Mozilla/5.0");
        fixture.repo.fetch_or_create("busy", "", &client).unwrap();
    }

    let record = fixture.stored("busy").unwrap();
    assert_eq!(record.read_count(), 25);
    let origins: Vec<_> = record
        .access_log()
        .entries()
        .iter()
        .map(|e| e.origin.clone())
        .collect();
    let expected: Vec<_> = (5..25u8).rev().map(|n| format!("10.0.**.{n}")).collect();
    assert_eq!(origins, expected);
}

#[test]
fn origin_masking() {
    assert_eq!(mask_origin("1.2.3.4"), "1.2.**.4");
    assert_eq!(mask_origin("::1"), "::1");
}

#[test]
fn commit_ttl_semantics() {
    let fixture = TestRepository::memory();
    let t0 = fixture.fetch("x").version_token;
    let before = fixture.backend.ttl("note:x").unwrap();

    let t1 = fixture
        .repo
        .commit(CommitRequest::new("x", t0, "a").ttl_seconds(0))
        .unwrap()
        .version_token;
    assert_eq!(fixture.backend.ttl("note:x").unwrap(), before);

    fixture.clock.advance(Duration::from_secs(30));
    fixture
        .repo
        .commit(CommitRequest::new("x", t1, "b").ttl_seconds(3600))
        .unwrap();
    assert_eq!(
        fixture.backend.ttl("note:x").unwrap(),
        TtlState::Expires(Duration::from_secs(3600))
    );

    fixture.clock.advance(Duration::from_secs(3600));
    assert_eq!(fixture.backend.ttl("note:x").unwrap(), TtlState::Missing);
}

#[test]
fn end_to_end_scenario() {
    let fixture = TestRepository::memory();

    let created = fixture.fetch("x");
    assert_eq!(created.content, "");
    let t0 = created.version_token;

    let committed = fixture
        .repo
        .commit(CommitRequest::new("x", t0.clone(), "hello").ttl_seconds(3600))
        .unwrap();
    assert_ne!(committed.version_token, t0);
    assert_eq!(committed.note_id, created.id);
    assert_eq!(fixture.stored("x").unwrap().content(), "hello");

    let stale = fixture.repo.commit(CommitRequest::new("x", t0, "world"));
    assert!(matches!(stale, Err(CoreError::TokenMismatch { .. })));
    assert_eq!(fixture.stored("x").unwrap().content(), "hello");
}

#[test]
fn commit_after_expiry_is_not_found() {
    let fixture = TestRepository::memory_with_config(RepositoryConfig::new().default_ttl_seconds(60));
    let t0 = fixture.fetch("short").version_token;
    fixture.clock.advance(Duration::from_secs(61));

    let result = fixture.repo.commit(CommitRequest::new("short", t0, "late"));
    assert!(matches!(result, Err(CoreError::NotFound { .. })));
}

#[test]
fn file_backed_notes_survive_reopen() {
    let fixture = TestRepository::file();
    let path = fixture.path().unwrap().to_path_buf();
    let t0 = fixture.fetch("kept").version_token;
    fixture
        .repo
        .commit(CommitRequest::new("kept", t0, "persisted"))
        .unwrap();
    let clock = Arc::clone(&fixture.clock);

    let backend = Arc::new(netpaste_kv::FileBackend::open_with_clock(&path, clock).unwrap());
    let reopened = NoteRepository::with_defaults(backend);
    let note = reopened
        .fetch_or_create("kept", "", &default_client())
        .unwrap();
    assert_eq!(note.content, "persisted");
    assert_eq!(note.read_count, 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn commits_store_exactly_what_was_sent(
        name in note_name_strategy(),
        contents in prop::collection::vec(note_content_strategy(), 1..5),
    ) {
        let fixture = TestRepository::memory();
        let mut token = fixture.fetch(&name).version_token;

        for content in &contents {
            let done = fixture
                .repo
                .commit(CommitRequest::new(name.clone(), token.clone(), content.clone()))
                .unwrap();
            prop_assert_ne!(&done.version_token, &token);
            token = done.version_token;
        }

        let note = fixture.fetch(&name);
        prop_assert_eq!(&note.content, contents.last().unwrap());
        prop_assert_eq!(note.version_token, token);
    }

    #[test]
    fn reads_are_masked_and_classified(
        origin in ipv4_origin_strategy(),
        user_agent in user_agent_strategy(),
    ) {
        let fixture = TestRepository::memory();
        let client = ClientInfo::new(origin.clone(), user_agent.clone());
        let note = fixture.repo.fetch_or_create("n", "", &client).unwrap();

        let entry = note.access_log.newest().unwrap();
        prop_assert_eq!(&entry.origin, &mask_origin(&origin));
        prop_assert_eq!(entry.client_class, ClientClass::from_user_agent(&user_agent));
    }
}
