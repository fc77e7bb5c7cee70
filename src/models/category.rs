use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    #[default]
    All,
    Photos,
    Video,
    Audio,
    Docs,
    Code,
    Others,
}

const PHOTO_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "heic", "gif", "webp", "tiff", "bmp", "raw", "svg",
];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm", "flv", "wmv"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "aac", "ogg", "m4a"];
const DOC_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "txt", "rtf", "xls", "xlsx", "ppt", "pptx", "csv", "md",
];
const CODE_EXTENSIONS: &[&str] = &[
    "py", "ts", "tsx", "js", "jsx", "html", "css", "json", "yaml", "yml", "sh", "sql", "c",
    "cpp", "h", "java", "go", "rs", "php",
];

impl FileCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Photos => "photos",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Docs => "docs",
            Self::Code => "code",
            Self::Others => "others",
        }
    }

    /// Buckets a file name by extension. Never returns `All`.
    pub fn classify(file_name: &str) -> FileCategory {
        let Some(ext) = extension_of(file_name) else {
            return Self::Others;
        };
        let ext = ext.to_ascii_lowercase();
        let ext = ext.as_str();
        if PHOTO_EXTENSIONS.contains(&ext) {
            Self::Photos
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Self::Video
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            Self::Audio
        } else if DOC_EXTENSIONS.contains(&ext) {
            Self::Docs
        } else if CODE_EXTENSIONS.contains(&ext) {
            Self::Code
        } else {
            Self::Others
        }
    }
}

impl std::fmt::Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "photos" => Ok(Self::Photos),
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            "docs" => Ok(Self::Docs),
            "code" => Ok(Self::Code),
            "others" => Ok(Self::Others),
            _ => Err(format!("unknown file category: {s}")),
        }
    }
}

fn extension_of(file_name: &str) -> Option<&str> {
    let base = file_name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(file_name);
    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(FileCategory::classify("IMG_0001.JPG"), FileCategory::Photos);
        assert_eq!(FileCategory::classify("clip.MoV"), FileCategory::Video);
        assert_eq!(FileCategory::classify("notes.md"), FileCategory::Docs);
        assert_eq!(FileCategory::classify("main.rs"), FileCategory::Code);
        assert_eq!(FileCategory::classify("song.flac"), FileCategory::Audio);
    }

    #[test]
    fn classify_without_extension_is_others() {
        assert_eq!(FileCategory::classify("Makefile"), FileCategory::Others);
        assert_eq!(FileCategory::classify(".bashrc"), FileCategory::Others);
        assert_eq!(FileCategory::classify("archive.zip"), FileCategory::Others);
    }

    #[test]
    fn classify_uses_last_path_component() {
        assert_eq!(FileCategory::classify("2024/trip.v2/beach.png"), FileCategory::Photos);
        assert_eq!(FileCategory::classify("albums.d/README"), FileCategory::Others);
    }
}
