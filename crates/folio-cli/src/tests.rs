use std::collections::BTreeMap;
use std::sync::Arc;

use clap::Parser;
use folio_core::auth::{AuthSession, AuthUser, MemorySessionStore, SessionIdentity};
use folio_core::models::SyncMetadata;
use folio_core::store::{
    FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, LAST_SYNC_TIME_KEY,
};
use folio_core::sync::{
    MemoryTransport, ResolveStrategy, SyncCoordinator, SyncError, SyncOptions, SyncResult,
};
use folio_core::util::unix_timestamp_now;
use folio_core::{Article, Category, ConflictSide, SyncConflict, SyncableRecord};
use pretty_assertions::assert_eq;

use crate::cli::{Cli, Collection, Commands, SideArg, StrategyArg};
use crate::commands::auth_cmd::build_session;
use crate::commands::common::{
    format_relative_time, format_sync_conflict_lines, format_sync_timestamp, merge_incoming,
    read_records, replace_record, sync_conflict_to_item, sync_state_path, write_records,
};
use crate::commands::config::merge_profile;
use crate::commands::status::read_last_sync_time;
use crate::commands::resolve::resolve_in_file;
use crate::commands::sync::{summarize, sync_file, sync_options};
use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

fn article(id: &str, content: &str, updated_at: i64) -> Article {
    Article {
        id: id.to_string(),
        title: id.to_string(),
        content: content.to_string(),
        category_id: None,
        created_at: 1,
        updated_at,
        is_deleted: false,
    }
}

fn wrapped(record: Article, device_id: &str) -> SyncableRecord<Article> {
    let timestamp = record.updated_at;
    SyncableRecord::new(
        record,
        SyncMetadata {
            user_id: "user-1".to_string(),
            device_id: device_id.to_string(),
            timestamp,
            version: 1,
        },
    )
}

type MemoryCoordinator = SyncCoordinator<MemoryTransport, SessionIdentity<MemorySessionStore>>;

fn memory_coordinator(transport: &MemoryTransport) -> MemoryCoordinator {
    let session = AuthSession {
        access_token: "access".to_string(),
        refresh_token: String::new(),
        expires_at: unix_timestamp_now() + 3600,
        user: AuthUser {
            id: "user-1".to_string(),
            email: None,
        },
    };
    SyncCoordinator::new(
        transport.clone(),
        SessionIdentity::new(MemorySessionStore::with_session(session)),
        Arc::new(MemoryKeyValueStore::new()),
    )
}

fn seed_remote(transport: &MemoryTransport, records: Vec<Article>) {
    let wrapped = records
        .into_iter()
        .map(|record| wrapped(record, "phone"))
        .collect::<Vec<_>>();
    transport.seed("articles", &wrapped).unwrap();
}

#[test]
fn sync_command_parses_options() {
    let cli = Cli::try_parse_from([
        "folio",
        "--profile",
        "work",
        "sync",
        "articles",
        "--input",
        "articles.json",
        "--strategy",
        "remote",
        "--force",
        "--device-id",
        "laptop",
    ])
    .unwrap();

    assert_eq!(cli.profile.as_deref(), Some("work"));
    let Commands::Sync(args) = cli.command else {
        panic!("expected sync command");
    };
    assert_eq!(args.collection, Collection::Articles);
    assert_eq!(args.strategy, StrategyArg::Remote);

    let options = sync_options(&args);
    assert!(options.force_sync);
    assert_eq!(options.strategy(), ResolveStrategy::Remote);
    assert_eq!(options.device_id.as_deref(), Some("laptop"));
    assert!(options.cancellation.is_some());
}

#[test]
fn sync_strategy_defaults_to_manual() {
    let cli =
        Cli::try_parse_from(["folio", "sync", "categories", "--input", "c.json"]).unwrap();
    let Commands::Sync(args) = cli.command else {
        panic!("expected sync command");
    };
    assert_eq!(args.strategy, StrategyArg::Manual);
    assert_eq!(sync_options(&args).strategy(), ResolveStrategy::Manual);
}

#[test]
fn resolve_command_requires_side() {
    assert!(Cli::try_parse_from([
        "folio", "resolve", "articles", "--input", "a.json", "--id", "a1"
    ])
    .is_err());

    let cli = Cli::try_parse_from([
        "folio", "resolve", "articles", "--input", "a.json", "--id", "a1", "--use", "remote",
    ])
    .unwrap();
    let Commands::Resolve(args) = cli.command else {
        panic!("expected resolve command");
    };
    assert_eq!(args.side, SideArg::Remote);
    assert!(!args.side.use_local());
}

#[test]
fn record_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    let records = vec![article("a1", "hello", 10), article("a2", "world", 20)];

    write_records(&path, &records).unwrap();
    assert_eq!(read_records::<Article>(&path).unwrap(), records);
}

#[test]
fn empty_record_file_reads_as_no_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("categories.json");
    std::fs::write(&path, "  \n").unwrap();
    assert!(read_records::<Category>(&path).unwrap().is_empty());
}

#[test]
fn malformed_record_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    std::fs::write(&path, "{\"not\": \"an array\"}").unwrap();

    let error = read_records::<Article>(&path).unwrap_err();
    assert!(matches!(error, CliError::RecordFile { .. }));
    assert!(error.to_string().contains("articles.json"));
}

#[test]
fn merge_incoming_skips_known_ids() {
    let mut local = vec![article("a1", "mine", 10)];
    let incoming = vec![
        wrapped(article("a1", "theirs", 5), "phone"),
        wrapped(article("a2", "new", 7), "phone"),
    ];

    assert_eq!(merge_incoming(&mut local, incoming), 1);
    assert_eq!(local.len(), 2);
    assert_eq!(local[0].content, "mine");
    assert_eq!(local[1].id, "a2");
}

#[test]
fn replace_record_overwrites_matching_id() {
    let mut local = vec![article("a1", "mine", 10), article("a2", "other", 10)];
    replace_record(&mut local, article("a1", "theirs", 20));
    assert_eq!(local[0].content, "theirs");
    assert_eq!(local.len(), 2);

    replace_record(&mut local, article("a3", "fresh", 30));
    assert_eq!(local.len(), 3);
}

#[test]
fn conflict_item_and_lines_include_key_fields() {
    let conflict = SyncConflict::new(
        wrapped(article("a1", "mine", 100), "laptop"),
        wrapped(article("a1", "theirs", 200), "phone"),
    );

    let item = sync_conflict_to_item(&conflict);
    assert_eq!(item.id, "a1");
    assert_eq!(item.kind, "article");
    assert_eq!(item.local_updated_at, 100);
    assert_eq!(item.remote_updated_at, 200);
    assert_eq!(item.remote_device_id, "phone");

    let lines = format_sync_conflict_lines(&[conflict]);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("a1"));
    assert!(lines[0].contains("local=100"));
    assert!(lines[0].contains("remote=200"));
    assert!(lines[0].contains("remote_device=phone"));
}

#[test]
fn summarize_reports_conflicts_and_errors() {
    let conflict = SyncConflict::new(
        wrapped(article("a1", "mine", 100), "laptop"),
        wrapped(article("a1", "theirs", 200), "phone"),
    );
    let result = SyncResult {
        success: false,
        synced_items: 0,
        conflicts: vec![conflict],
        error: Some("conflicts detected".to_string()),
        incoming: Vec::new(),
        superseded: Vec::new(),
    };

    let summary = summarize(&result, 0);
    assert!(!summary.success);
    assert_eq!(summary.conflicts.len(), 1);
    assert_eq!(summary.error.as_deref(), Some("conflicts detected"));

    let failed = summarize(&SyncResult::<Article>::from_error(&SyncError::Cancelled), 0);
    assert_eq!(failed.error.as_deref(), Some("sync cancelled"));
}

#[test]
fn merge_profile_validates_and_normalizes_url() {
    let profile = merge_profile(
        &CliProfile::default(),
        Some(" https://api.example.com/ ".to_string()),
        None,
        Some(20),
    )
    .unwrap();
    assert_eq!(profile.api_base_url.as_deref(), Some("https://api.example.com"));
    assert_eq!(profile.request_timeout_secs, Some(20));

    let error = merge_profile(&CliProfile::default(), Some("api.example.com".to_string()), None, None)
        .unwrap_err();
    assert!(matches!(error, CliError::Config(_)));
}

#[test]
fn merge_profile_falls_back_to_env_then_existing() {
    let existing = CliProfile {
        api_base_url: Some("https://old.example.com".to_string()),
        request_timeout_secs: Some(9),
    };

    let from_env = merge_profile(
        &existing,
        None,
        Some("https://env.example.com".to_string()),
        None,
    )
    .unwrap();
    assert_eq!(from_env.api_base_url.as_deref(), Some("https://env.example.com"));
    assert_eq!(from_env.request_timeout_secs, Some(9));

    let kept = merge_profile(&existing, None, None, None).unwrap();
    assert_eq!(kept.api_base_url.as_deref(), Some("https://old.example.com"));
}

#[test]
fn build_session_rejects_blank_credentials() {
    assert!(build_session(" ", "token", None, 60).is_err());
    assert!(build_session("user", " ", None, 60).is_err());
    assert!(build_session("user", "token", None, 0).is_err());

    let session = build_session("user", "token", Some(" ".to_string()), 3600).unwrap();
    assert_eq!(session.user.email, None);
    assert!(session.is_usable());
}

#[test]
fn last_sync_time_reads_from_state_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = sync_state_path(dir.path(), "work");
    assert!(path.ends_with("work/sync-state.json"));

    let store: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(path));
    assert_eq!(read_last_sync_time(store.as_ref()).unwrap(), None);

    store.set(LAST_SYNC_TIME_KEY, "1700000000000").unwrap();
    assert_eq!(
        read_last_sync_time(store.as_ref()).unwrap(),
        Some(1_700_000_000_000)
    );
}

#[test]
fn format_sync_timestamp_returns_utc_label() {
    assert_eq!(format_sync_timestamp(0), "1970-01-01 00:00:00 UTC");
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
}

#[test]
fn profiles_config_default_is_empty() {
    let config = CliProfilesConfig::default();
    assert_eq!(config.profiles, BTreeMap::new());
    assert_eq!(config.resolve_profile_name(Some(" ops ")), "ops");
}

#[tokio::test]
async fn sync_file_writes_incoming_records_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    write_records(&path, &[article("a1", "mine", 100)]).unwrap();

    let transport = MemoryTransport::new();
    seed_remote(&transport, vec![article("a2", "from phone", 150)]);
    let coordinator = memory_coordinator(&transport);

    let summary = sync_file::<Article, _, _>(&coordinator, &path, SyncOptions::default())
        .await
        .unwrap();
    assert!(summary.success);
    assert_eq!(summary.synced_items, 1);
    assert_eq!(summary.incoming_added, 1);
    assert_eq!(summary.superseded, 0);

    let stored = read_records::<Article>(&path).unwrap();
    let ids = stored.iter().map(|record| record.id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["a1", "a2"]);
}

#[tokio::test]
async fn sync_file_leaves_file_untouched_on_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    let local = vec![article("a1", "mine", 100)];
    write_records(&path, &local).unwrap();

    let transport = MemoryTransport::new();
    seed_remote(
        &transport,
        vec![article("a1", "theirs", 200), article("a2", "new", 150)],
    );
    let coordinator = memory_coordinator(&transport);

    let summary = sync_file::<Article, _, _>(&coordinator, &path, SyncOptions::default())
        .await
        .unwrap();
    assert!(!summary.success);
    assert_eq!(summary.conflicts.len(), 1);
    assert_eq!(summary.incoming_added, 0);
    assert_eq!(read_records::<Article>(&path).unwrap(), local);
}

#[tokio::test]
async fn remote_strategy_writes_winner_and_next_manual_sync_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    write_records(&path, &[article("a1", "mine", 100), article("a2", "draft", 100)]).unwrap();

    let transport = MemoryTransport::new();
    seed_remote(&transport, vec![article("a1", "theirs", 200)]);
    let coordinator = memory_coordinator(&transport);

    let options = SyncOptions::default().with_strategy(ResolveStrategy::Remote);
    let summary = sync_file::<Article, _, _>(&coordinator, &path, options)
        .await
        .unwrap();
    assert!(summary.success);
    assert_eq!(summary.synced_items, 2);
    assert_eq!(summary.superseded, 1);

    let stored = read_records::<Article>(&path).unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].content, "theirs");
    assert_eq!(stored[0].updated_at, 200);
    assert_eq!(stored[1].content, "draft");

    let again = sync_file::<Article, _, _>(&coordinator, &path, SyncOptions::default())
        .await
        .unwrap();
    assert!(again.success, "{:?}", again.error);
    assert!(again.conflicts.is_empty());
    assert_eq!(again.superseded, 0);
}

#[tokio::test]
async fn resolve_using_remote_overwrites_file_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    write_records(&path, &[article("a1", "mine", 100), article("a2", "other", 100)]).unwrap();

    let transport = MemoryTransport::new();
    seed_remote(&transport, vec![article("a1", "theirs", 200)]);
    let coordinator = memory_coordinator(&transport);

    let side = resolve_in_file::<Article, _, _>(&coordinator, &path, "a1", false)
        .await
        .unwrap();
    assert_eq!(side, ConflictSide::Remote);

    let stored = read_records::<Article>(&path).unwrap();
    assert_eq!(stored[0].content, "theirs");
    assert_eq!(stored[1].content, "other");
    assert!(coordinator
        .pending_conflicts(&stored)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn resolve_using_local_keeps_file_and_pushes_local() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    let local = vec![article("a1", "mine", 100)];
    write_records(&path, &local).unwrap();

    let transport = MemoryTransport::new();
    seed_remote(&transport, vec![article("a1", "theirs", 200)]);
    let coordinator = memory_coordinator(&transport);

    let side = resolve_in_file::<Article, _, _>(&coordinator, &path, "a1", true)
        .await
        .unwrap();
    assert_eq!(side, ConflictSide::Local);
    assert_eq!(read_records::<Article>(&path).unwrap(), local);

    let remote = transport.records::<Article>("articles").unwrap();
    assert_eq!(remote[0].record.content, "mine");
}

#[tokio::test]
async fn resolve_unknown_id_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    write_records(&path, &[article("a1", "mine", 100)]).unwrap();

    let transport = MemoryTransport::new();
    seed_remote(&transport, vec![article("a1", "theirs", 200)]);
    let coordinator = memory_coordinator(&transport);

    let error = resolve_in_file::<Article, _, _>(&coordinator, &path, "missing", false)
        .await
        .unwrap_err();
    assert!(matches!(error, CliError::ConflictNotFound(id) if id == "missing"));
}
