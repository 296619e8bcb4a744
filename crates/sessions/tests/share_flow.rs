//! Walks a session from creation to completion the way the two browsers do.

use std::sync::Arc;
use std::time::Duration;

use pb_domain::config::ShareConfig;
use pb_domain::error::Error;
use pb_sessions::{
    FileMetadata, LifecycleManager, ManualClock, MemoryStore, SessionStatus, StatusUpdate,
    WatchEvent,
};

fn manager(clock: &Arc<ManualClock>) -> Arc<LifecycleManager> {
    let store = Arc::new(MemoryStore::with_clock(clock.clone()));
    let config = ShareConfig {
        frontend_url: "https://share.example".into(),
        ..ShareConfig::default()
    };
    Arc::new(LifecycleManager::new(config, store).with_clock(clock.clone()))
}

#[tokio::test]
async fn initiator_and_receiver_complete_a_share() {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let mgr = manager(&clock);

    let summary = mgr
        .create_session(
            "Mozilla/5.0 1a2b3c4d",
            FileMetadata {
                name: "a.txt".into(),
                size: 10,
                mime_type: "text/plain".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(summary.session_id.len(), 16);
    assert_eq!(summary.torrent_info_hash.len(), 40);
    assert_eq!(summary.public_key.len(), 64);
    assert_eq!(
        summary.shareable_link,
        format!("https://share.example/receive/{}", summary.session_id)
    );

    let id = summary.session_id.as_str();
    let info = mgr.get_session_info(id).await.unwrap();
    assert_eq!(info.status, SessionStatus::Initiated);
    assert_eq!(info.magnet_uri, None);

    clock.advance(Duration::from_secs(5));
    mgr.update_torrent(id, "abcd1234", "magnet:?xt=urn:btih:abcd1234")
        .await
        .unwrap();
    let info = mgr.get_session_info(id).await.unwrap();
    assert_eq!(info.status, SessionStatus::Ready);
    assert_eq!(info.torrent_info_hash, "abcd1234");
    assert_eq!(info.magnet_uri.as_deref(), Some("magnet:?xt=urn:btih:abcd1234"));
    assert!(info.expires_at > summary.expires_at);

    mgr.update_status(
        id,
        StatusUpdate {
            status: SessionStatus::Connected,
            peers: Some(1),
            progress: Some(0),
        },
    )
    .await
    .unwrap();
    mgr.update_status(
        id,
        StatusUpdate {
            status: SessionStatus::Completed,
            peers: None,
            progress: Some(100),
        },
    )
    .await
    .unwrap();

    let info = mgr.get_session_info(id).await.unwrap();
    assert_eq!(info.status, SessionStatus::Completed);
    assert_eq!(info.peers, Some(1));
    assert_eq!(info.progress, Some(100));
}

#[tokio::test]
async fn unknown_session_is_not_found_everywhere() {
    let clock = Arc::new(ManualClock::new(0));
    let mgr = manager(&clock);

    assert!(matches!(
        mgr.get_session_info("nonexistent").await,
        Err(Error::NotFound)
    ));
    assert!(matches!(
        mgr.update_torrent("nonexistent", "h", "magnet:?").await,
        Err(Error::NotFound)
    ));
    assert!(matches!(
        mgr.update_status("nonexistent", StatusUpdate::status(SessionStatus::Ready))
            .await,
        Err(Error::NotFound)
    ));
}

#[tokio::test]
async fn session_disappears_after_ttl() {
    let clock = Arc::new(ManualClock::new(0));
    let mgr = manager(&clock);
    let id = mgr
        .create_session(
            "fp",
            FileMetadata {
                name: "b.bin".into(),
                size: 1,
                mime_type: "application/octet-stream".into(),
            },
        )
        .await
        .unwrap()
        .session_id;

    clock.advance(Duration::from_secs(24 * 60 * 60));
    assert!(matches!(
        mgr.get_session_info(&id).await,
        Err(Error::NotFound)
    ));
}

#[tokio::test(start_paused = true)]
async fn watcher_sees_progress_then_expiry() {
    let clock = Arc::new(ManualClock::new(0));
    let mgr = manager(&clock);
    let id = mgr
        .create_session(
            "fp",
            FileMetadata {
                name: "c.iso".into(),
                size: 4096,
                mime_type: "application/x-iso9660-image".into(),
            },
        )
        .await
        .unwrap()
        .session_id;

    let mut sub = mgr.subscribe(&id);
    mgr.update_status(
        &id,
        StatusUpdate {
            status: SessionStatus::Connected,
            peers: Some(2),
            progress: Some(30),
        },
    )
    .await
    .unwrap();

    match sub.next().await {
        Some(WatchEvent::Snapshot(snap)) => {
            assert_eq!(snap.status, SessionStatus::Connected);
            assert_eq!((snap.peers, snap.progress), (2, 30));
        }
        other => panic!("expected a snapshot, got {other:?}"),
    }

    clock.advance(Duration::from_secs(24 * 60 * 60));
    assert_eq!(sub.next().await, Some(WatchEvent::Expired));
    assert_eq!(sub.next().await, None);
}
