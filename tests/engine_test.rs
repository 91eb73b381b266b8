//! End-to-end engine tests against the real SQLite store and job queue.
//!
//! Covers the full derivative lifecycle: lazy admission on first
//! resolution, worker write-back, exposure of the ready derivative, and
//! removal followed by re-admission.

use std::sync::Arc;

use vodforge::{
    DerivativeCatalog, FsDerivativeStore, ResolveOptions, SourceResolver, SqliteJobQueue,
    SqliteStateStore, VideoAsset,
};

use vf_core::EngineConfig;
use vf_db::pool::{init_memory_pool, DbPool};
use vf_db::queries::{jobs, transcode};

struct Harness {
    pool: DbPool,
    resolver: SourceResolver,
    _tmp: tempfile::TempDir,
    derivative_root: std::path::PathBuf,
}

fn harness(config: EngineConfig) -> Harness {
    let pool = init_memory_pool().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let derivative_root = tmp.path().to_path_buf();

    let resolver = SourceResolver::new(
        config,
        DerivativeCatalog::builtin(),
        Arc::new(SqliteStateStore::new(pool.clone(), 100)),
        Arc::new(SqliteJobQueue::new(pool.clone())),
        Arc::new(FsDerivativeStore::new(&derivative_root)),
    );

    Harness {
        pool,
        resolver,
        _tmp: tmp,
        derivative_root,
    }
}

fn config() -> EngineConfig {
    EngineConfig {
        enabled_transcodes: vec!["480p.ogv".into(), "480p.webm".into(), "720p.mp4".into()],
        ..EngineConfig::default()
    }
}

fn asset() -> VideoAsset {
    VideoAsset::new("Clip.ogv", "/media/Clip.ogv", 1920, 1080)
        .with_duration(120.0)
        .with_bitrate(4_000_000)
        .with_framerate(25.0)
}

#[test]
fn first_resolution_admits_jobs_and_returns_primary_only() {
    let h = harness(config());
    let session = h.resolver.new_session();

    let sources = h
        .resolver
        .resolve(&session, &asset(), &ResolveOptions::default())
        .unwrap();

    assert_eq!(sources.len(), 1);
    assert!(sources[0].transcodekey.is_none());

    let conn = h.pool.get().unwrap();
    let rows = transcode::get_for_file(&conn, "Clip.ogv", 100).unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.is_pending()));
    assert_eq!(jobs::count_pending(&conn, "Clip.ogv").unwrap(), 3);
}

#[test]
fn worker_write_back_exposes_ready_derivative() {
    let h = harness(config());

    // First request admits everything.
    let session = h.resolver.new_session();
    h.resolver
        .resolve(&session, &asset(), &ResolveOptions::default())
        .unwrap();
    drop(session);

    // The external worker completes one encode out of band.
    {
        let conn = h.pool.get().unwrap();
        transcode::record_success(&conn, "Clip.ogv", "480p.webm", 1_024_000).unwrap();
    }

    // A new request (fresh session) sees the ready derivative.
    let session = h.resolver.new_session();
    let sources = h
        .resolver
        .resolve(&session, &asset(), &ResolveOptions::default())
        .unwrap();

    assert_eq!(sources.len(), 2);
    let derivative = &sources[1];
    assert_eq!(derivative.transcodekey.as_deref(), Some("480p.webm"));
    assert_eq!((derivative.width, derivative.height), (854, 480));
    assert_eq!(derivative.bandwidth, Some(1_024_000));
    assert_eq!(derivative.src, "/media/Clip.ogv.480p.webm");

    // No duplicate admission happened for the still-pending profiles.
    let conn = h.pool.get().unwrap();
    assert_eq!(jobs::count_pending(&conn, "Clip.ogv").unwrap(), 3);
}

#[test]
fn errored_encode_stays_pending_and_is_not_readmitted() {
    let h = harness(config());

    let session = h.resolver.new_session();
    h.resolver
        .resolve(&session, &asset(), &ResolveOptions::default())
        .unwrap();
    drop(session);

    {
        let conn = h.pool.get().unwrap();
        transcode::record_error(&conn, "Clip.ogv", "720p.mp4", "encoder crashed").unwrap();
    }

    // The record still carries its admission timestamp, so the next
    // resolution does not resubmit; retry is the worker's business.
    let session = h.resolver.new_session();
    h.resolver
        .resolve(&session, &asset(), &ResolveOptions::default())
        .unwrap();

    let conn = h.pool.get().unwrap();
    assert_eq!(jobs::count_pending(&conn, "Clip.ogv").unwrap(), 3);
    let row = transcode::get(&conn, "Clip.ogv", "720p.mp4").unwrap().unwrap();
    assert_eq!(row.error, "encoder crashed");
}

#[test]
fn removal_deletes_file_record_and_pending_job_for_one_key_only() {
    let h = harness(config());

    let session = h.resolver.new_session();
    h.resolver
        .resolve(&session, &asset(), &ResolveOptions::default())
        .unwrap();

    // Simulate a completed encode with its derivative file on disk.
    {
        let conn = h.pool.get().unwrap();
        transcode::record_success(&conn, "Clip.ogv", "480p.webm", 1_024_000).unwrap();
    }
    let file_path = h.derivative_root.join("Clip.ogv.480p.webm");
    std::fs::write(&file_path, b"webm bytes").unwrap();

    h.resolver
        .remove_derivatives(&session, &asset(), Some("480p.webm"))
        .unwrap();

    assert!(!file_path.exists());

    let conn = h.pool.get().unwrap();
    let rows = transcode::get_for_file(&conn, "Clip.ogv", 100).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.key != "480p.webm"));
    // The other profiles' queued jobs survive.
    assert_eq!(jobs::count_pending(&conn, "Clip.ogv").unwrap(), 2);
}

#[test]
fn removed_derivative_is_readmitted_on_next_resolution() {
    let h = harness(config());
    let session = h.resolver.new_session();

    h.resolver
        .resolve(&session, &asset(), &ResolveOptions::default())
        .unwrap();
    h.resolver
        .remove_derivatives(&session, &asset(), None)
        .unwrap();

    {
        let conn = h.pool.get().unwrap();
        assert!(transcode::get_for_file(&conn, "Clip.ogv", 100).unwrap().is_empty());
        assert_eq!(jobs::count_pending(&conn, "Clip.ogv").unwrap(), 0);
    }

    // Removal invalidated the session cache, so the same session re-admits.
    h.resolver
        .resolve(&session, &asset(), &ResolveOptions::default())
        .unwrap();

    let conn = h.pool.get().unwrap();
    assert_eq!(transcode::get_for_file(&conn, "Clip.ogv", 100).unwrap().len(), 3);
    assert_eq!(jobs::count_pending(&conn, "Clip.ogv").unwrap(), 3);
}

#[test]
fn full_url_resolution_uses_configured_base() {
    let h = harness(EngineConfig {
        base_url: Some("https://media.example.org".into()),
        ..config()
    });
    let session = h.resolver.new_session();

    let sources = h
        .resolver
        .resolve(
            &session,
            &asset(),
            &ResolveOptions {
                full_url: true,
                no_data: false,
            },
        )
        .unwrap();

    assert_eq!(sources[0].src, "https://media.example.org/media/Clip.ogv");
}
