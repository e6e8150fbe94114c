//! Shared test doubles and helpers for creating ClassroomDownloader instances in tests.

use crate::config::Config;
use crate::credentials::TokenRefresher;
use crate::downloader::{ClassroomDownloader, Providers};
use crate::error::{DownloadError, Error, Result};
use crate::provider::{ContentProvider, CourseProvider, FileIdResolver};
use crate::types::{
    ContentItem, ContentKind, Course, Credential, DownloadItem, Material, MaterialDetail,
    SessionId,
};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

/// Course provider returning a fixed list
pub(crate) struct StaticCourses(pub Vec<Course>);

#[async_trait]
impl CourseProvider for StaticCourses {
    async fn list_courses(&self, _access_token: &str) -> Result<Vec<Course>> {
        Ok(self.0.clone())
    }
}

/// Content provider that writes `content-of-<file id>` and records concurrency
#[derive(Default)]
pub(crate) struct RecordingContent {
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: AtomicUsize,
    pub delay: Duration,
    pub failing_ids: HashSet<String>,
    pub panicking_ids: HashSet<String>,
    pub tokens_seen: Mutex<Vec<String>>,
}

impl RecordingContent {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }
}

#[async_trait]
impl ContentProvider for RecordingContent {
    async fn download_file(&self, access_token: &str, file_id: &str, dest: &Path) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen
            .lock()
            .unwrap()
            .push(access_token.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panicking_ids.contains(file_id) {
            panic!("provider blew up on {file_id}");
        }
        if self.failing_ids.contains(file_id) {
            return Err(Error::Download(DownloadError::FetchFailed {
                file_id: file_id.to_string(),
                status: 500,
            }));
        }

        let body = format!("content-of-{file_id}");
        tokio::fs::write(dest, &body).await?;
        Ok(body.len() as u64)
    }
}

/// Resolver that knows nothing; file ids come from the materials themselves
pub(crate) struct NoStoredIds;

#[async_trait]
impl FileIdResolver for NoStoredIds {
    async fn file_id_for_material(&self, _material: &Material) -> Result<Option<String>> {
        Ok(None)
    }

    async fn file_id_by_title(&self, _title: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Token refresher handing out `renewed-<n>`
#[derive(Default)]
pub(crate) struct CountingRefresher {
    pub calls: AtomicUsize,
}

#[async_trait]
impl TokenRefresher for CountingRefresher {
    async fn refresh(&self, credential: &Credential) -> Result<Credential> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Credential {
            access_token: format!("renewed-{n}"),
            refresh_token: credential.refresh_token.clone(),
            expiry: None,
        })
    }
}

pub(crate) fn drive(remote_id: &str, title: &str) -> Material {
    Material {
        id: None,
        title: title.to_string(),
        url: format!("https://drive/{remote_id}"),
        detail: MaterialDetail::DriveFile {
            remote_id: remote_id.to_string(),
            title: title.to_string(),
            link: format!("https://drive/{remote_id}"),
        },
    }
}

pub(crate) fn link(url: &str) -> Material {
    Material {
        id: None,
        title: "link".to_string(),
        url: url.to_string(),
        detail: MaterialDetail::Link {
            url: url.to_string(),
            title: "link".to_string(),
        },
    }
}

pub(crate) fn video(remote_id: &str) -> Material {
    Material {
        id: None,
        title: "video".to_string(),
        url: format!("https://www.youtube.com/watch?v={remote_id}"),
        detail: MaterialDetail::YoutubeVideo {
            remote_id: remote_id.to_string(),
            title: "video".to_string(),
            link: format!("https://www.youtube.com/watch?v={remote_id}"),
        },
    }
}

pub(crate) fn form(url: &str) -> Material {
    Material {
        id: None,
        title: "form".to_string(),
        url: url.to_string(),
        detail: MaterialDetail::Form {
            form_url: url.to_string(),
            title: "form".to_string(),
        },
    }
}

pub(crate) fn item(folder: PathBuf, text: &str, materials: Vec<Material>) -> DownloadItem {
    DownloadItem {
        folder_path: folder,
        text: text.to_string(),
        kind: ContentKind::Announcement,
        materials,
    }
}

/// Course with one announcement (text + link) and one coursework item (drive file)
pub(crate) fn course(id: &str, name: &str) -> Course {
    Course {
        id: id.to_string(),
        name: name.to_string(),
        section: None,
        user_id: String::new(),
        announcements: vec![ContentItem {
            id: format!("{id}-a1"),
            kind: ContentKind::Announcement,
            text: "Hi".to_string(),
            creation_time: Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap(),
            materials: vec![link(&format!("https://example.com/{id}"))],
        }],
        coursework: vec![ContentItem {
            id: format!("{id}-w1"),
            kind: ContentKind::Coursework,
            text: "Homework".to_string(),
            creation_time: Utc.with_ymd_and_hms(2024, 2, 5, 9, 0, 0).unwrap(),
            materials: vec![drive(&format!("{id}-file"), "Notes.pdf")],
        }],
    }
}

/// Test fixture: downloader over temp storage, session "s1" owned by user "u1"
pub(crate) struct TestDownloader {
    pub downloader: ClassroomDownloader,
    pub content: Arc<RecordingContent>,
    pub refresher: Arc<CountingRefresher>,
    pub session: SessionId,
    pub _temp_dir: tempfile::TempDir,
}

/// Helper to create a test ClassroomDownloader with mock providers.
pub(crate) async fn create_test_downloader(courses: Vec<Course>) -> TestDownloader {
    create_test_downloader_with(courses, RecordingContent::default(), |_| {}).await
}

/// Like [`create_test_downloader`] with a custom content provider and config tweaks.
pub(crate) async fn create_test_downloader_with(
    courses: Vec<Course>,
    content: RecordingContent,
    tweak: impl FnOnce(&mut Config),
) -> TestDownloader {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.persistence.database_path = temp_dir.path().join("test.db");
    config.download.download_root = temp_dir.path().join("downloads");
    config.download.max_concurrent_downloads = 3;
    tweak(&mut config);

    let content = Arc::new(content);
    let refresher = Arc::new(CountingRefresher::default());
    let providers = Providers {
        courses: Arc::new(StaticCourses(courses)),
        content: content.clone(),
        token_refresher: refresher.clone(),
    };

    let downloader = ClassroomDownloader::with_providers(config, providers)
        .await
        .unwrap();

    let session = SessionId::new("s1");
    downloader
        .register_session(
            &session,
            "u1",
            &Credential::new("access-0").with_refresh_token("refresh-0"),
        )
        .await
        .unwrap();

    TestDownloader {
        downloader,
        content,
        refresher,
        session,
        _temp_dir: temp_dir,
    }
}
