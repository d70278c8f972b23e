//! Naming conventions, icon tables, and classification lists used by folder views.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::fs::util::join;

/// Static configuration shared by every folder view.
///
/// Every field has a default, so a JSON override only needs the keys it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FolderConfig {
    /// Extension carried by link files, including the dot.
    pub shortcut_extension: String,
    /// Inserted between the target name and the extension of a generated link file.
    pub shortcut_append: String,
    /// Characters stripped from user supplied names.
    pub invalid_file_characters: String,
    pub folder_icon: String,
    pub unknown_icon: String,
    /// Lowercase extension (with dot) to icon path.
    pub extension_icons: HashMap<String, String>,
    /// Extensions the file explorer can open as a virtual drive.
    pub mountable_extensions: HashSet<String>,
    /// Base names hidden from every listing.
    pub system_files: HashSet<String>,
    /// Absolute paths hidden from listings.
    pub system_paths: HashSet<String>,
    /// Process identifiers whose shortcuts count as built-in.
    pub system_processes: HashSet<String>,
    pub file_explorer_process: String,
    pub archive_fallback_name: String,
    pub download_fallback_name: String,
}

impl Default for FolderConfig {
    fn default() -> Self {
        let icons = [
            (".exe", "/System/Icons/executable.webp"),
            (".iso", "/System/Icons/disc.webp"),
            (".img", "/System/Icons/disc.webp"),
            (".zip", "/System/Icons/compressed.webp"),
            (".rar", "/System/Icons/compressed.webp"),
            (".7z", "/System/Icons/compressed.webp"),
            (".txt", "/System/Icons/notepad.webp"),
            (".md", "/System/Icons/marked.webp"),
            (".pdf", "/System/Icons/pdf.webp"),
            (".png", "/System/Icons/photo.webp"),
            (".jpg", "/System/Icons/photo.webp"),
            (".jpeg", "/System/Icons/photo.webp"),
            (".gif", "/System/Icons/photo.webp"),
            (".webp", "/System/Icons/photo.webp"),
            (".mp3", "/System/Icons/music.webp"),
            (".mp4", "/System/Icons/video.webp"),
            (".webm", "/System/Icons/video.webp"),
            (".swf", "/System/Icons/flash.webp"),
            (".wsz", "/System/Icons/webamp.webp"),
        ];
        let processes = [
            "Browser",
            "BoxedWine",
            "ClassiCube",
            "DevTools",
            "Emulator",
            "FileExplorer",
            "IRC",
            "JSDOS",
            "Marked",
            "MonacoEditor",
            "Paint",
            "PDF",
            "Photos",
            "Quake3",
            "Ruffle",
            "Run",
            "SpaceCadetPinball",
            "Terminal",
            "Transfer",
            "V86",
            "VideoPlayer",
            "Vim",
            "Webamp",
        ];

        Self {
            shortcut_extension: ".url".to_string(),
            shortcut_append: " - Shortcut".to_string(),
            invalid_file_characters: "\"*/:<>?\\|".to_string(),
            folder_icon: "/System/Icons/folder.webp".to_string(),
            unknown_icon: "/System/Icons/unknown.webp".to_string(),
            extension_icons: icons
                .into_iter()
                .map(|(ext, icon)| (ext.to_string(), icon.to_string()))
                .collect(),
            mountable_extensions: [".iso", ".img", ".zip"].into_iter().map(String::from).collect(),
            system_files: ["desktop.ini"].into_iter().map(String::from).collect(),
            system_paths: ["/.index"].into_iter().map(String::from).collect(),
            system_processes: processes.into_iter().map(String::from).collect(),
            file_explorer_process: "FileExplorer".to_string(),
            archive_fallback_name: "archive".to_string(),
            download_fallback_name: "download.zip".to_string(),
        }
    }
}

impl FolderConfig {
    /// Parse a JSON override on top of the defaults.
    pub fn from_json(bytes: &[u8]) -> anyhow::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn with_system_processes<I, S>(mut self, processes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.system_processes = processes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_shortcut_extension<S: Into<String>>(mut self, extension: S) -> Self {
        self.shortcut_extension = extension.into();
        self
    }

    pub fn is_shortcut(&self, name: &str) -> bool {
        crate::fs::util::extname(name).eq_ignore_ascii_case(&self.shortcut_extension)
    }

    /// Icon for an extension such as `.png`; unknown extensions get the generic icon.
    pub fn icon_for_extension(&self, extension: &str) -> &str {
        self.extension_icons
            .get(&extension.to_lowercase())
            .map(String::as_str)
            .unwrap_or(&self.unknown_icon)
    }

    /// Whether `name` inside `directory` is store-internal and must not be listed.
    pub fn is_system_entry(&self, directory: &str, name: &str) -> bool {
        self.system_files.contains(name) || self.system_paths.contains(&join(directory, name))
    }
}
