//! Writing generated images to disk

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use studio_core::codec::{decode_data_url, export_file_name, extension_for_mime, EXPORT_PREFIX};
use studio_core::GeneratedImage;

/// Save the current result under a timestamp-derived name
pub fn save_image(image: &GeneratedImage, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
    let decoded = decode_data_url(&image.data_url)
        .with_context(|| format!("Generated image {} has unreadable data", image.id))?;
    let path = dir.join(export_file_name(now, &decoded.mime_type));
    write(&path, &decoded.bytes)?;
    Ok(path)
}

/// Save every history entry, numbered in generation order
pub fn save_history(history: &[GeneratedImage], dir: &Path, now: DateTime<Utc>) -> Result<Vec<PathBuf>> {
    history
        .iter()
        .enumerate()
        .map(|(index, image)| {
            let decoded = decode_data_url(&image.data_url)
                .with_context(|| format!("History entry {} has unreadable data", image.id))?;
            let name = format!(
                "{}-{}-{:02}.{}",
                EXPORT_PREFIX,
                now.timestamp_millis(),
                index + 1,
                extension_for_mime(&decoded.mime_type)
            );
            let path = dir.join(name);
            write(&path, &decoded.bytes)?;
            Ok(path)
        })
        .collect()
}

fn write(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use studio_core::{ImageFile, Settings};

    fn image(payload: &str) -> GeneratedImage {
        GeneratedImage::new(ImageFile::from_base64("image/jpeg", payload), "p", Settings::default())
    }

    #[test]
    fn test_save_image_uses_timestamp_name() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();

        let path = save_image(&image("aGVsbG8="), &dir.path().join("out"), now).unwrap();

        assert_eq!(path.file_name().unwrap(), "otto-studio-1700000000000.jpg");
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn test_save_history_numbers_entries() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc.timestamp_millis_opt(5).unwrap();

        let paths = save_history(&[image("YQ=="), image("Yg==")], dir.path(), now).unwrap();

        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["otto-studio-5-01.jpg", "otto-studio-5-02.jpg"]);
        assert_eq!(std::fs::read(&paths[1]).unwrap(), b"b");
    }

    #[test]
    fn test_save_image_rejects_bad_payload() {
        let dir = tempfile::tempdir().unwrap();
        let bad = GeneratedImage::new(ImageFile::new("data:image/png;base64,%%%", "image/png"), "p", Settings::default());
        assert!(save_image(&bad, dir.path(), Utc::now()).is_err());
    }
}
