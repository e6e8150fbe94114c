//! Course tree storage: courses, content items and materials.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DatabaseError;
use crate::provider::FileIdResolver;
use crate::types::{ContentItem, ContentKind, Course, Material, MaterialDetail, MaterialKind};
use crate::{Error, Result};

use super::{ContentItemRow, CourseRow, Database, MaterialRow};

fn query_failed(what: &str, e: sqlx::Error) -> Error {
    Error::Database(DatabaseError::QueryFailed(format!("{}: {}", what, e)))
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

impl Database {
    /// Store courses with their content items and materials in one transaction
    ///
    /// Returns the stored courses with database ids assigned to every material.
    pub async fn insert_courses(&self, courses: &[Course]) -> Result<Vec<Course>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| query_failed("Failed to begin transaction", e))?;
        let now = chrono::Utc::now().timestamp();
        let mut stored = Vec::with_capacity(courses.len());

        for course in courses {
            sqlx::query(
                "INSERT INTO courses (id, user_id, name, section, created_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&course.id)
            .bind(&course.user_id)
            .bind(&course.name)
            .bind(&course.section)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| query_failed("Failed to insert course", e))?;

            let mut stored_course = course.clone();
            let items = stored_course
                .announcements
                .iter_mut()
                .enumerate()
                .chain(stored_course.coursework.iter_mut().enumerate());

            for (position, item) in items {
                let item_id = sqlx::query(
                    r#"
                    INSERT INTO content_items (course_id, remote_id, kind, text, creation_time, position)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&course.id)
                .bind(&item.id)
                .bind(item.kind.to_i32())
                .bind(&item.text)
                .bind(item.creation_time.timestamp_millis())
                .bind(position as i64)
                .execute(&mut *tx)
                .await
                .map_err(|e| query_failed("Failed to insert content item", e))?
                .last_insert_rowid();

                for (material_position, material) in item.materials.iter_mut().enumerate() {
                    let (remote_id, detail_title, detail_link) = detail_columns(&material.detail);
                    let material_id = sqlx::query(
                        r#"
                        INSERT INTO materials (
                            content_item_id, position, kind, title, url,
                            remote_id, detail_title, detail_link
                        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                        "#,
                    )
                    .bind(item_id)
                    .bind(material_position as i64)
                    .bind(material.kind().as_str())
                    .bind(&material.title)
                    .bind(&material.url)
                    .bind(remote_id)
                    .bind(detail_title)
                    .bind(detail_link)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| query_failed("Failed to insert material", e))?
                    .last_insert_rowid();
                    material.id = Some(material_id);
                }
            }

            stored.push(stored_course);
        }

        tx.commit()
            .await
            .map_err(|e| query_failed("Failed to commit courses", e))?;

        Ok(stored)
    }

    /// Which of `ids` are already stored
    pub async fn existing_course_ids(&self, ids: &[String]) -> Result<HashSet<String>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let sql = format!("SELECT id FROM courses WHERE id IN ({})", placeholders(ids.len()));
        let mut query = sqlx::query_scalar::<_, String>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let found = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to query course ids", e))?;
        Ok(found.into_iter().collect())
    }

    /// Load the requested courses with their full trees, in request order
    ///
    /// Unknown ids are skipped.
    pub async fn get_courses_by_ids(&self, ids: &[String]) -> Result<Vec<Course>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, user_id, name, section FROM courses WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, CourseRow>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to get courses", e))?;

        let mut by_id: HashMap<String, Course> = self
            .load_trees(rows)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// All stored courses of a user with their full trees, in insertion order
    pub async fn list_courses_for_user(&self, user_id: &str) -> Result<Vec<Course>> {
        let rows = sqlx::query_as::<_, CourseRow>(
            "SELECT id, user_id, name, section FROM courses WHERE user_id = ? ORDER BY rowid",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to list courses", e))?;

        self.load_trees(rows).await
    }

    /// Delete a course; its content items and materials go with it
    pub async fn delete_course(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to delete course", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Provider file id stored for a drive material
    pub async fn drive_file_id(&self, material_id: i64) -> Result<Option<String>> {
        let id = sqlx::query_scalar::<_, Option<String>>(
            "SELECT remote_id FROM materials WHERE id = ? AND kind = 'driveFile'",
        )
        .bind(material_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to get drive file id", e))?;
        Ok(id.flatten().filter(|id| !id.is_empty()))
    }

    /// Provider file id of the first stored drive material with this sanitized title
    pub async fn drive_file_id_by_title(&self, title: &str) -> Result<Option<String>> {
        let id = sqlx::query_scalar::<_, Option<String>>(
            r#"
            SELECT remote_id FROM materials
            WHERE kind = 'driveFile' AND title = ? AND remote_id IS NOT NULL AND remote_id != ''
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to look up drive file by title", e))?;
        Ok(id.flatten())
    }

    async fn load_trees(&self, rows: Vec<CourseRow>) -> Result<Vec<Course>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let course_ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        let ids_sql = placeholders(course_ids.len());

        let items_sql = format!(
            r#"
            SELECT id, course_id, remote_id, kind, text, creation_time
            FROM content_items
            WHERE course_id IN ({})
            ORDER BY course_id, kind, position
            "#,
            ids_sql
        );
        let mut items_query = sqlx::query_as::<_, ContentItemRow>(&items_sql);
        for id in &course_ids {
            items_query = items_query.bind(*id);
        }
        let item_rows = items_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to get content items", e))?;

        let materials_sql = format!(
            r#"
            SELECT m.id, m.content_item_id, m.kind, m.title, m.url,
                   m.remote_id, m.detail_title, m.detail_link
            FROM materials m
            JOIN content_items c ON c.id = m.content_item_id
            WHERE c.course_id IN ({})
            ORDER BY m.content_item_id, m.position
            "#,
            ids_sql
        );
        let mut materials_query = sqlx::query_as::<_, MaterialRow>(&materials_sql);
        for id in &course_ids {
            materials_query = materials_query.bind(*id);
        }
        let material_rows = materials_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to get materials", e))?;

        let mut materials_by_item: HashMap<i64, Vec<Material>> = HashMap::new();
        for row in material_rows {
            let item_id = row.content_item_id;
            materials_by_item
                .entry(item_id)
                .or_default()
                .push(material_from_row(row)?);
        }

        let mut items_by_course: HashMap<String, Vec<ContentItem>> = HashMap::new();
        for row in item_rows {
            let creation_time = DateTime::<Utc>::from_timestamp_millis(row.creation_time).ok_or_else(|| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "content item {} has an invalid creation time",
                    row.remote_id
                )))
            })?;
            items_by_course
                .entry(row.course_id)
                .or_default()
                .push(ContentItem {
                    id: row.remote_id,
                    kind: ContentKind::from_i32(row.kind),
                    text: row.text,
                    creation_time,
                    materials: materials_by_item.remove(&row.id).unwrap_or_default(),
                });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let (announcements, coursework): (Vec<_>, Vec<_>) = items_by_course
                    .remove(&row.id)
                    .unwrap_or_default()
                    .into_iter()
                    .partition(|item| item.kind == ContentKind::Announcement);
                Course {
                    id: row.id,
                    name: row.name,
                    section: row.section,
                    user_id: row.user_id,
                    announcements,
                    coursework,
                }
            })
            .collect())
    }
}

fn detail_columns(detail: &MaterialDetail) -> (Option<&str>, &str, &str) {
    match detail {
        MaterialDetail::DriveFile {
            remote_id,
            title,
            link,
        }
        | MaterialDetail::YoutubeVideo {
            remote_id,
            title,
            link,
        } => (Some(remote_id.as_str()), title.as_str(), link.as_str()),
        MaterialDetail::Link { url, title } => (None, title.as_str(), url.as_str()),
        MaterialDetail::Form { form_url, title } => (None, title.as_str(), form_url.as_str()),
    }
}

fn material_from_row(row: MaterialRow) -> Result<Material> {
    let kind: MaterialKind = row.kind.parse()?;
    let detail = match kind {
        MaterialKind::DriveFile => MaterialDetail::DriveFile {
            remote_id: row.remote_id.unwrap_or_default(),
            title: row.detail_title,
            link: row.detail_link,
        },
        MaterialKind::YoutubeVideo => MaterialDetail::YoutubeVideo {
            remote_id: row.remote_id.unwrap_or_default(),
            title: row.detail_title,
            link: row.detail_link,
        },
        MaterialKind::Link => MaterialDetail::Link {
            url: row.detail_link,
            title: row.detail_title,
        },
        MaterialKind::Form => MaterialDetail::Form {
            form_url: row.detail_link,
            title: row.detail_title,
        },
    };
    Ok(Material {
        id: Some(row.id),
        title: row.title,
        url: row.url,
        detail,
    })
}

#[async_trait]
impl FileIdResolver for Database {
    async fn file_id_for_material(&self, material: &Material) -> Result<Option<String>> {
        match material.id {
            Some(id) => self.drive_file_id(id).await,
            None => Ok(None),
        }
    }

    async fn file_id_by_title(&self, title: &str) -> Result<Option<String>> {
        self.drive_file_id_by_title(title).await
    }
}
