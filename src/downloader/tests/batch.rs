use crate::config::FolderNaming;
use crate::credentials::CredentialStore;
use crate::downloader::test_helpers::*;
use crate::error::Error;
use crate::types::Event;
use crate::utils::{LINKS_FILE_NAME, TEXT_FILE_NAME};
use std::sync::atomic::Ordering;
use std::time::Duration;

#[tokio::test]
async fn downloads_selected_courses_into_dated_folders() {
    let fixture = create_test_downloader(vec![course("c1", "Math"), course("c2", "Art")]).await;
    let downloader = &fixture.downloader;
    downloader.discover_courses(&fixture.session).await.unwrap();
    let mut events = downloader.subscribe();

    let report = downloader
        .download_courses(&fixture.session, &["c1".to_string()])
        .await
        .unwrap();

    assert_eq!(report.items_total, 2);
    assert_eq!(report.items_succeeded, 2);
    assert_eq!(report.files_downloaded, 1);
    assert_eq!(report.links_saved, 1);

    let root = &downloader.config().download.download_root;
    let announcement = root.join("Math/01-02-2024");
    let coursework = root.join("Math/05-02-2024");
    assert_eq!(
        std::fs::read_to_string(announcement.join(TEXT_FILE_NAME)).unwrap(),
        "Hi\n"
    );
    assert_eq!(
        std::fs::read_to_string(announcement.join(LINKS_FILE_NAME)).unwrap(),
        "https://example.com/c1\n"
    );
    assert_eq!(
        std::fs::read_to_string(coursework.join("Notes.pdf")).unwrap(),
        "content-of-c1-file"
    );
    assert!(!root.join("Art").exists());

    assert!(matches!(
        events.try_recv().unwrap(),
        Event::BatchStarted { items: 2 }
    ));
    let mut saw_complete = false;
    while let Ok(event) = events.try_recv() {
        if let Event::BatchComplete { succeeded, failed } = event {
            assert_eq!((succeeded, failed), (2, 0));
            saw_complete = true;
        }
    }
    assert!(saw_complete);
}

#[tokio::test]
async fn unknown_course_fails_before_downloading() {
    let fixture = create_test_downloader(vec![course("c1", "Math")]).await;
    fixture
        .downloader
        .discover_courses(&fixture.session)
        .await
        .unwrap();

    let err = fixture
        .downloader
        .download_courses(&fixture.session, &["c1".to_string(), "ghost".to_string()])
        .await
        .unwrap_err();

    match err {
        Error::NotFound(message) => assert!(message.contains("ghost")),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(fixture.content.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unusable_download_root_is_a_config_error() {
    let fixture = create_test_downloader_with(
        vec![course("c1", "Math")],
        RecordingContent::default(),
        |config| {
            config.download.download_root = config
                .persistence
                .database_path
                .with_file_name("root-is-a-file");
        },
    )
    .await;
    let root = fixture.downloader.config().download.download_root.clone();
    std::fs::write(&root, "occupied").unwrap();
    fixture
        .downloader
        .discover_courses(&fixture.session)
        .await
        .unwrap();

    let err = fixture
        .downloader
        .download_courses(&fixture.session, &["c1".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config { .. }));
    assert_eq!(fixture.content.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn credential_is_refreshed_during_a_long_batch() {
    let fixture = create_test_downloader_with(
        vec![course("c1", "Math")],
        RecordingContent::with_delay(Duration::from_millis(150)),
        |config| {
            config.oauth.refresh_interval = Duration::from_millis(40);
        },
    )
    .await;
    fixture
        .downloader
        .discover_courses(&fixture.session)
        .await
        .unwrap();

    fixture
        .downloader
        .download_courses(&fixture.session, &["c1".to_string()])
        .await
        .unwrap();

    let refreshes = fixture.refresher.calls.load(Ordering::SeqCst);
    assert!(refreshes >= 1, "expected a refresh during the batch");

    // the renewed token was persisted for the session
    let stored = fixture.downloader.db.credential(&fixture.session).await.unwrap();
    assert!(stored.access_token.starts_with("renewed-"));
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-0"));

    // the refresher stopped with the batch
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(fixture.refresher.calls.load(Ordering::SeqCst), refreshes);
}

#[tokio::test]
async fn date_and_id_naming_separates_items() {
    let mut same_day = course("c1", "Math");
    same_day.coursework[0].creation_time = same_day.announcements[0].creation_time;
    let fixture = create_test_downloader_with(
        vec![same_day],
        RecordingContent::default(),
        |config| config.download.folder_naming = FolderNaming::ByDateAndId,
    )
    .await;
    fixture
        .downloader
        .discover_courses(&fixture.session)
        .await
        .unwrap();

    fixture
        .downloader
        .download_courses(&fixture.session, &["c1".to_string()])
        .await
        .unwrap();

    let course_dir = fixture
        .downloader
        .config()
        .download
        .download_root
        .join("Math");
    assert!(course_dir.join("01-02-2024_c1-a1").is_dir());
    assert!(course_dir.join("01-02-2024_c1-w1/Notes.pdf").is_file());
}
