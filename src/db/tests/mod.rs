use crate::types::{ContentItem, ContentKind, Course, Material, MaterialDetail};
use chrono::{TimeZone, Utc};

mod courses;
mod sessions;

fn drive_material(remote_id: &str, title: &str) -> Material {
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

fn link_material(url: &str) -> Material {
    Material {
        id: None,
        title: "Link".to_string(),
        url: url.to_string(),
        detail: MaterialDetail::Link {
            url: url.to_string(),
            title: "Link".to_string(),
        },
    }
}

fn sample_course(id: &str, user_id: &str) -> Course {
    Course {
        id: id.to_string(),
        name: format!("Course {id}"),
        section: Some("A".to_string()),
        user_id: user_id.to_string(),
        announcements: vec![
            ContentItem {
                id: format!("{id}-a1"),
                kind: ContentKind::Announcement,
                text: "Hi".to_string(),
                creation_time: Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap(),
                materials: vec![link_material("https://example.com/1")],
            },
            ContentItem {
                id: format!("{id}-a2"),
                kind: ContentKind::Announcement,
                text: String::new(),
                creation_time: Utc.with_ymd_and_hms(2024, 2, 2, 9, 0, 0).unwrap(),
                materials: vec![],
            },
        ],
        coursework: vec![ContentItem {
            id: format!("{id}-w1"),
            kind: ContentKind::Coursework,
            text: "Read".to_string(),
            creation_time: Utc.with_ymd_and_hms(2024, 2, 3, 9, 0, 0).unwrap(),
            materials: vec![
                drive_material(&format!("{id}-f1"), "Notes.pdf"),
                link_material("https://example.com/2"),
            ],
        }],
    }
}
