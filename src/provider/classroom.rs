//! Course discovery against the classroom REST API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::CourseProvider;
use crate::classifier::classify_all;
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::types::{ContentItem, ContentKind, Course, RawMaterial};

/// [`CourseProvider`] backed by the classroom REST API
pub struct ClassroomClient {
    client: reqwest::Client,
    base_url: String,
    page_size: u32,
    concurrency: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CoursesPage {
    courses: Vec<CourseDto>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseDto {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    section: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AnnouncementsPage {
    announcements: Vec<AnnouncementDto>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnouncementDto {
    id: String,
    #[serde(default)]
    text: String,
    creation_time: DateTime<Utc>,
    #[serde(default)]
    materials: Vec<RawMaterial>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CourseWorkMaterialsPage {
    // singular on the wire
    course_work_material: Vec<CourseWorkMaterialDto>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseWorkMaterialDto {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    creation_time: DateTime<Utc>,
    #[serde(default)]
    materials: Vec<RawMaterial>,
}

/// A page of a paginated listing
trait Page: DeserializeOwned {
    type Item;

    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

impl Page for CoursesPage {
    type Item = CourseDto;

    fn into_parts(self) -> (Vec<CourseDto>, Option<String>) {
        (self.courses, self.next_page_token)
    }
}

impl Page for AnnouncementsPage {
    type Item = AnnouncementDto;

    fn into_parts(self) -> (Vec<AnnouncementDto>, Option<String>) {
        (self.announcements, self.next_page_token)
    }
}

impl Page for CourseWorkMaterialsPage {
    type Item = CourseWorkMaterialDto;

    fn into_parts(self) -> (Vec<CourseWorkMaterialDto>, Option<String>) {
        (self.course_work_material, self.next_page_token)
    }
}

impl ClassroomClient {
    /// Create a client from the provider configuration
    pub fn new(config: &ProviderConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client that reuses an existing HTTP client
    pub fn with_client(client: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            base_url: config.classroom_base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            concurrency: config.discovery_concurrency.max(1),
        }
    }

    /// Follow `nextPageToken` until the listing at `path` is exhausted
    async fn fetch_all<P: Page>(&self, access_token: &str, path: &str) -> Result<Vec<P::Item>> {
        let url = format!("{}/{}", self.base_url, path);
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", self.page_size.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self
                .client
                .get(&url)
                .bearer_auth(access_token)
                .query(&query)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(Error::Upstream {
                    status: status.as_u16(),
                    message: format!("GET {}: {}", path, message),
                });
            }

            let page: P = response.json().await?;
            let (mut batch, next) = page.into_parts();
            items.append(&mut batch);

            match next {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(items)
    }

    async fn populate(&self, access_token: &str, dto: CourseDto) -> Result<Course> {
        let course_path = urlencoding::encode(&dto.id).into_owned();

        let announcements = self
            .fetch_all::<AnnouncementsPage>(
                access_token,
                &format!("courses/{}/announcements", course_path),
            )
            .await?
            .into_iter()
            .map(|a| ContentItem {
                id: a.id,
                kind: ContentKind::Announcement,
                text: a.text,
                creation_time: a.creation_time,
                materials: classify_all(&a.materials),
            })
            .collect::<Vec<_>>();

        let coursework = self
            .fetch_all::<CourseWorkMaterialsPage>(
                access_token,
                &format!("courses/{}/courseWorkMaterials", course_path),
            )
            .await?
            .into_iter()
            .map(|w| ContentItem {
                id: w.id,
                kind: ContentKind::Coursework,
                text: w
                    .description
                    .filter(|d| !d.is_empty())
                    .unwrap_or(w.title),
                creation_time: w.creation_time,
                materials: classify_all(&w.materials),
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            course_id = %dto.id,
            announcements = announcements.len(),
            coursework = coursework.len(),
            "course contents fetched"
        );

        Ok(Course {
            id: dto.id,
            name: dto.name,
            section: dto.section,
            user_id: String::new(),
            announcements,
            coursework,
        })
    }
}

#[async_trait]
impl CourseProvider for ClassroomClient {
    async fn list_courses(&self, access_token: &str) -> Result<Vec<Course>> {
        let courses = self
            .fetch_all::<CoursesPage>(access_token, "courses")
            .await?;
        tracing::info!(courses = courses.len(), "courses listed");

        stream::iter(courses)
            .map(|dto| self.populate(access_token, dto))
            .buffered(self.concurrency)
            .try_collect()
            .await
    }
}
