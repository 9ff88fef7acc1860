// Media classification by file extension

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Still-image extensions accepted as sources and image targets
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp"];

/// Video extensions discovered by batch runs
pub const BATCH_VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mkv", "mov", "wmv", "flv"];

/// Video extensions accepted by task submission
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm"];

/// Kind of media a target holds; decides how a task executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Unsupported,
}

impl MediaKind {
    pub fn classify(path: &Path) -> Self {
        match lowercase_extension(path) {
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => MediaKind::Image,
            Some(ext) if VIDEO_EXTENSIONS.contains(&ext.as_str()) => MediaKind::Video,
            _ => MediaKind::Unsupported,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Unsupported => write!(f, "unsupported"),
        }
    }
}

pub fn is_image(path: &Path) -> bool {
    MediaKind::classify(path) == MediaKind::Image
}

pub fn is_batch_video(path: &Path) -> bool {
    lowercase_extension(path)
        .map(|ext| BATCH_VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_case_insensitive() {
        assert_eq!(MediaKind::classify(Path::new("a/face.JPG")), MediaKind::Image);
        assert_eq!(MediaKind::classify(Path::new("clip.MoV")), MediaKind::Video);
        assert_eq!(MediaKind::classify(Path::new("notes.txt")), MediaKind::Unsupported);
        assert_eq!(MediaKind::classify(Path::new("no_extension")), MediaKind::Unsupported);
    }

    #[test]
    fn test_webm_is_task_video_but_not_batch_video() {
        let path = Path::new("clip.webm");
        assert_eq!(MediaKind::classify(path), MediaKind::Video);
        assert!(!is_batch_video(path));
        assert!(is_batch_video(Path::new("clip.FLV")));
    }
}
