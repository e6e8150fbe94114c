//! Download-item planning
//!
//! Flattens a course into independent [`DownloadItem`]s, one per content item,
//! each with its target folder and an owned copy of its materials.

use std::path::{Path, PathBuf};

use crate::config::FolderNaming;
use crate::types::{ContentItem, Course, DownloadItem};
use crate::utils::{date_folder, sanitize_filename};

/// Plan the download items of one course
///
/// Announcements come first, then coursework, each in upstream order.
/// With [`FolderNaming::ByDate`] items created on the same day share a folder.
pub fn plan(course: &Course, root: &Path, naming: FolderNaming) -> Vec<DownloadItem> {
    let course_folder = course_folder(course, root);

    course
        .announcements
        .iter()
        .chain(course.coursework.iter())
        .map(|item| DownloadItem {
            folder_path: course_folder.join(item_folder_name(item, naming)),
            text: item.text.clone(),
            kind: item.kind,
            materials: item.materials.clone(),
        })
        .collect()
}

/// Plan the download items of several courses, in course order
pub fn plan_all(courses: &[Course], root: &Path, naming: FolderNaming) -> Vec<DownloadItem> {
    courses
        .iter()
        .flat_map(|course| plan(course, root, naming))
        .collect()
}

/// Folder of a course below the download root
pub fn course_folder(course: &Course, root: &Path) -> PathBuf {
    root.join(course_folder_name(course))
}

fn course_folder_name(course: &Course) -> String {
    let name = sanitize_filename(&course.name);
    if name.is_empty() {
        sanitize_filename(&course.id)
    } else {
        name
    }
}

fn item_folder_name(item: &ContentItem, naming: FolderNaming) -> String {
    let date = date_folder(&item.creation_time);
    match naming {
        FolderNaming::ByDate => date,
        FolderNaming::ByDateAndId => format!("{}_{}", date, sanitize_filename(&item.id)),
    }
}
