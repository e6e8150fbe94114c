//! Course discovery and listing.

use crate::credentials::CredentialStore;
use crate::error::Result;
use crate::types::{Course, Event, SessionId};

use super::ClassroomDownloader;

impl ClassroomDownloader {
    /// Fetch the session user's courses upstream and store the ones not stored yet
    ///
    /// Returns only the newly stored courses, with database ids on every material.
    pub async fn discover_courses(&self, session: &SessionId) -> Result<Vec<Course>> {
        let user_id = self.db.user_for_session(session).await?;
        let credential = self.db.credential(session).await?;

        let mut courses = self
            .providers
            .courses
            .list_courses(&credential.access_token)
            .await?;
        for course in &mut courses {
            course.user_id = user_id.clone();
        }

        let ids: Vec<String> = courses.iter().map(|c| c.id.clone()).collect();
        let existing = self.db.existing_course_ids(&ids).await?;
        let fresh: Vec<Course> = courses
            .into_iter()
            .filter(|c| !existing.contains(&c.id))
            .collect();

        if fresh.is_empty() {
            tracing::info!(session = %session, known = existing.len(), "no new courses");
            return Ok(Vec::new());
        }

        let stored = self.db.insert_courses(&fresh).await?;
        tracing::info!(
            session = %session,
            new = stored.len(),
            known = existing.len(),
            "courses discovered"
        );
        self.emit(Event::CoursesDiscovered {
            count: stored.len(),
        });

        Ok(stored)
    }

    /// All stored courses of the session's user, with content items and materials
    pub async fn list_courses(&self, session: &SessionId) -> Result<Vec<Course>> {
        let user_id = self.db.user_for_session(session).await?;
        self.db.list_courses_for_user(&user_id).await
    }
}
