//! Upload-time assignment of a video's storage location.
//!
//! Every rendition of a video lives under `shard/segment1/segment2/quality/filename`.
//! The shard and segments are derived once from the generated filename and stored
//! on the video row; later stages only swap the quality component.

use crate::config::settings::AppConfig;
use rand::RngCore;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoragePathError {
    #[error("filename '{0}' is too short to derive path segments")]
    FilenameTooShort(String),

    #[error("filename '{0}' must start with four ASCII characters")]
    NonAsciiPrefix(String),

    #[error("shard count must be at least 1")]
    NoShards,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    pub bucket_id: String,
    pub shard_id: String,
    pub path_segment1: String,
    pub path_segment2: String,
    pub filename: String,
}

impl StorageLocation {
    pub fn assign(
        filename: &str,
        bucket_id: &str,
        shard_count: u32,
    ) -> Result<Self, StoragePathError> {
        if shard_count == 0 {
            return Err(StoragePathError::NoShards);
        }
        if filename.len() < 4 {
            return Err(StoragePathError::FilenameTooShort(filename.to_string()));
        }
        let prefix = &filename.as_bytes()[..4];
        if !prefix.is_ascii() {
            return Err(StoragePathError::NonAsciiPrefix(filename.to_string()));
        }

        // Shard key is the first byte of the generated name.
        let shard = u32::from(prefix[0]) % shard_count;

        Ok(Self {
            bucket_id: bucket_id.to_string(),
            shard_id: shard.to_string(),
            path_segment1: filename[..2].to_string(),
            path_segment2: filename[2..4].to_string(),
            filename: filename.to_string(),
        })
    }

    pub fn file_path(&self, quality: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.shard_id, self.path_segment1, self.path_segment2, quality, self.filename
        )
    }

    /// Key of the thumbnail inside the thumbnails bucket: `shard/seg1/seg2/<stem>.jpg`.
    pub fn thumbnail_path(&self) -> String {
        let (stem, _) = split_extension(&self.filename);
        format!(
            "{}/{}/{}/{}.jpg",
            self.shard_id, self.path_segment1, self.path_segment2, stem
        )
    }
}

/// Bucket and shard count that new uploads are placed with.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub bucket_id: String,
    pub shard_count: u32,
}

impl StorageLayout {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            bucket_id: config.minio_bucket.clone(),
            shard_count: config.storage_shard_count,
        }
    }

    /// Picks a fresh storage filename for an upload and assigns its location.
    pub fn reserve(&self, original_filename: &str) -> Result<StorageLocation, StoragePathError> {
        StorageLocation::assign(
            &generate_filename(original_filename),
            &self.bucket_id,
            self.shard_count,
        )
    }
}

/// Splits at the last dot. The extension keeps its dot and is empty when there is none.
pub fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(idx) => filename.split_at(idx),
        None => (filename, ""),
    }
}

/// Generates a collision-resistant storage filename keeping the original extension:
/// `<unix-nanos>_<16 hex chars><.ext>`.
pub fn generate_filename(original_filename: &str) -> String {
    let ext = Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();

    let mut random = [0u8; 8];
    rand::rng().fill_bytes(&mut random);
    let hex: String = random.iter().map(|b| format!("{:02x}", b)).collect();

    format!("{}_{}{}", nanos, hex, ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::video::model::QUALITY_ORIGINAL;

    #[test]
    fn assigns_shard_and_segments_from_filename() {
        let location = StorageLocation::assign("1712345_ab.mp4", "videos", 64).unwrap();

        // '1' is 0x31 = 49
        assert_eq!(location.shard_id, "49");
        assert_eq!(location.path_segment1, "17");
        assert_eq!(location.path_segment2, "12");
        assert_eq!(
            location.file_path(QUALITY_ORIGINAL),
            "49/17/12/original/1712345_ab.mp4"
        );
    }

    #[test]
    fn assignment_is_deterministic_and_bounded() {
        for name in ["9999_x.mp4", "abcd.mkv", "ZZZZ"] {
            let a = StorageLocation::assign(name, "videos", 7).unwrap();
            let b = StorageLocation::assign(name, "videos", 7).unwrap();
            assert_eq!(a, b);
            assert!(a.shard_id.parse::<u32>().unwrap() < 7);
        }
    }

    #[test]
    fn rejects_unusable_filenames() {
        assert_eq!(
            StorageLocation::assign("abc", "videos", 4),
            Err(StoragePathError::FilenameTooShort("abc".to_string()))
        );
        assert!(matches!(
            StorageLocation::assign("éé.mp4", "videos", 4),
            Err(StoragePathError::NonAsciiPrefix(_))
        ));
        assert_eq!(
            StorageLocation::assign("abcd", "videos", 0),
            Err(StoragePathError::NoShards)
        );
    }

    #[test]
    fn generated_filename_keeps_extension() {
        let name = generate_filename("My Holiday.MOV");
        assert!(name.ends_with(".MOV"));

        let (nanos, rest) = name.split_once('_').unwrap();
        assert!(nanos.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(rest.len(), 16 + ".MOV".len());

        assert!(StorageLocation::assign(&name, "videos", 64).is_ok());
        assert_ne!(generate_filename("a.mp4"), generate_filename("a.mp4"));
    }

    #[test]
    fn thumbnail_path_swaps_extension_for_jpg() {
        let location = StorageLocation::assign("1712345_ab.mp4", "videos", 64).unwrap();
        assert_eq!(location.thumbnail_path(), "49/17/12/1712345_ab.jpg");
    }

    #[test]
    fn reserved_location_uses_layout() {
        let layout = StorageLayout {
            bucket_id: "videos".to_string(),
            shard_count: 8,
        };

        let location = layout.reserve("holiday.mkv").unwrap();
        assert_eq!(location.bucket_id, "videos");
        assert!(location.filename.ends_with(".mkv"));
        assert!(location.shard_id.parse::<u32>().unwrap() < 8);
        assert_eq!(location.path_segment1, &location.filename[..2]);
        assert_eq!(location.path_segment2, &location.filename[2..4]);
    }

    #[test]
    fn extension_split_keeps_the_dot() {
        assert_eq!(split_extension("a.b.mp4"), ("a.b", ".mp4"));
        assert_eq!(split_extension("noext"), ("noext", ""));
    }

    #[test]
    fn generated_filename_without_extension() {
        let name = generate_filename("README");
        assert!(!name.contains('.'));
    }
}
