use super::{drive_material, sample_course};
use crate::db::*;
use crate::provider::FileIdResolver;
use crate::types::{ContentKind, MaterialKind};
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_insert_and_load_course_tree() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let course = sample_course("c1", "u1");
    let stored = db.insert_courses(std::slice::from_ref(&course)).await.unwrap();

    // every material got a database id
    assert!(
        stored[0]
            .announcements
            .iter()
            .chain(stored[0].coursework.iter())
            .flat_map(|item| item.materials.iter())
            .all(|m| m.id.is_some())
    );

    let loaded = db.get_courses_by_ids(&["c1".to_string()]).await.unwrap();
    assert_eq!(loaded.len(), 1);
    let loaded = &loaded[0];
    assert_eq!(loaded, &stored[0]);
    assert_eq!(loaded.section.as_deref(), Some("A"));
    assert_eq!(loaded.announcements.len(), 2);
    assert_eq!(loaded.announcements[0].id, "c1-a1");
    assert_eq!(loaded.announcements[1].id, "c1-a2");
    assert_eq!(loaded.coursework[0].kind, ContentKind::Coursework);
    assert_eq!(loaded.coursework[0].materials[0].kind(), MaterialKind::DriveFile);
    assert_eq!(loaded.coursework[0].materials[1].kind(), MaterialKind::Link);
    assert_eq!(
        loaded.coursework[0].creation_time,
        course.coursework[0].creation_time
    );

    db.close().await;
}

#[tokio::test]
async fn test_get_courses_by_ids_keeps_request_order_and_skips_unknown() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.insert_courses(&[sample_course("c1", "u1"), sample_course("c2", "u1")])
        .await
        .unwrap();

    let loaded = db
        .get_courses_by_ids(&["c2".to_string(), "nope".to_string(), "c1".to_string()])
        .await
        .unwrap();
    let ids: Vec<_> = loaded.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c2", "c1"]);

    assert!(db.get_courses_by_ids(&[]).await.unwrap().is_empty());

    db.close().await;
}

#[tokio::test]
async fn test_existing_course_ids() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.insert_courses(&[sample_course("c1", "u1")]).await.unwrap();

    let existing = db
        .existing_course_ids(&["c1".to_string(), "c2".to_string()])
        .await
        .unwrap();
    assert!(existing.contains("c1"));
    assert!(!existing.contains("c2"));

    db.close().await;
}

#[tokio::test]
async fn test_list_courses_for_user_only_returns_own_courses() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.insert_courses(&[
        sample_course("c1", "u1"),
        sample_course("c2", "u2"),
        sample_course("c3", "u1"),
    ])
    .await
    .unwrap();

    let courses = db.list_courses_for_user("u1").await.unwrap();
    let ids: Vec<_> = courses.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c3"]);
    assert!(db.list_courses_for_user("nobody").await.unwrap().is_empty());

    db.close().await;
}

#[tokio::test]
async fn test_duplicate_course_rolls_back_whole_insert() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.insert_courses(&[sample_course("c1", "u1")]).await.unwrap();
    let result = db
        .insert_courses(&[sample_course("c2", "u1"), sample_course("c1", "u1")])
        .await;
    assert!(result.is_err());

    let existing = db.existing_course_ids(&["c2".to_string()]).await.unwrap();
    assert!(existing.is_empty(), "c2 should have been rolled back");

    db.close().await;
}

#[tokio::test]
async fn test_delete_course_cascades_to_items_and_materials() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.insert_courses(&[sample_course("c1", "u1")]).await.unwrap();
    assert!(db.delete_course("c1").await.unwrap());
    assert!(!db.delete_course("c1").await.unwrap());

    let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content_items")
        .fetch_one(db.pool())
        .await
        .unwrap();
    let materials: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM materials")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(items, 0);
    assert_eq!(materials, 0);

    db.close().await;
}

#[tokio::test]
async fn test_file_id_resolution_by_material_then_title() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let stored = db.insert_courses(&[sample_course("c1", "u1")]).await.unwrap();
    let drive = &stored[0].coursework[0].materials[0];
    let link = &stored[0].coursework[0].materials[1];

    assert_eq!(
        db.file_id_for_material(drive).await.unwrap().as_deref(),
        Some("c1-f1")
    );
    // links have no file id
    assert_eq!(db.file_id_for_material(link).await.unwrap(), None);
    // materials that were never stored resolve through the title only
    let unsaved = drive_material("other", "Notes.pdf");
    assert_eq!(db.file_id_for_material(&unsaved).await.unwrap(), None);
    assert_eq!(
        db.file_id_by_title("Notes.pdf").await.unwrap().as_deref(),
        Some("c1-f1")
    );
    assert_eq!(db.file_id_by_title("Missing.pdf").await.unwrap(), None);

    db.close().await;
}
