//! Payload types decoded from File Station responses

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub name: String,
    #[serde(rename = "isdir", default)]
    pub is_dir: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional: Option<FileAdditional>,
}

impl FileEntry {
    pub fn size(&self) -> Option<u64> {
        self.additional.as_ref().and_then(|a| a.size)
    }

    pub fn modified(&self) -> Option<i64> {
        self.additional
            .as_ref()
            .and_then(|a| a.time.as_ref())
            .and_then(|t| t.mtime)
    }

    /// `/volume1` for a share whose real path is `/volume1/photos`.
    pub fn volume(&self) -> Option<&str> {
        let real_path = self.additional.as_ref()?.real_path.as_deref()?;
        let rest = real_path.strip_prefix('/')?;
        let end = rest.find('/').map_or(real_path.len(), |i| i + 1);
        Some(&real_path[..end])
    }

    pub fn volume_status(&self) -> Option<&VolumeStatus> {
        self.additional
            .as_ref()
            .and_then(|a| a.volume_status.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileAdditional {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<FileTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_status: Option<VolumeStatus>,
    /// Location on the host filesystem, e.g. `/volume1/photos`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_path: Option<String>,
}

/// Unix timestamps in seconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileTime {
    #[serde(default)]
    pub atime: Option<i64>,
    #[serde(default)]
    pub mtime: Option<i64>,
    #[serde(default)]
    pub ctime: Option<i64>,
    #[serde(default)]
    pub crtime: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeStatus {
    #[serde(default)]
    pub freespace: u64,
    #[serde(default)]
    pub totalspace: u64,
    #[serde(default)]
    pub readonly: bool,
}

impl VolumeStatus {
    pub fn used(&self) -> u64 {
        self.totalspace.saturating_sub(self.freespace)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolderListing {
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub offset: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShareListing {
    #[serde(default)]
    pub shares: Vec<FileEntry>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareLink {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "isFolder")]
    pub is_folder: bool,
    #[serde(default)]
    pub has_password: bool,
    #[serde(default)]
    pub date_expired: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShareLinkPage {
    #[serde(default)]
    pub links: Vec<ShareLink>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub offset: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub is_manager: bool,
    #[serde(default)]
    pub support_sharing: bool,
    /// DSM 6 sends a comma-separated string, DSM 7 an array
    #[serde(default)]
    pub support_virtual_protocol: Option<StringOrList>,
    #[serde(default)]
    pub system_codepage: Option<String>,
}

impl ServerInfo {
    pub fn virtual_protocols(&self) -> Vec<&str> {
        match &self.support_virtual_protocol {
            None => Vec::new(),
            Some(StringOrList::List(items)) => items.iter().map(String::as_str).collect(),
            Some(StringOrList::Text(text)) => text
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    List(Vec<String>),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub path: String,
    pub name: String,
    pub is_dir: bool,
    pub size: Option<u64>,
}

impl From<FileEntry> for SearchMatch {
    fn from(entry: FileEntry) -> Self {
        let size = entry.size();
        Self {
            path: entry.path,
            name: entry.name,
            is_dir: entry.is_dir,
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_listing_with_additional_fields() {
        let listing: FolderListing = serde_json::from_value(json!({
            "files": [
                {"path": "/photos/2024", "name": "2024", "isdir": true},
                {
                    "path": "/photos/a.jpg",
                    "name": "a.jpg",
                    "isdir": false,
                    "additional": {"size": 2048, "time": {"mtime": 1700000000}}
                }
            ],
            "total": 2,
            "offset": 0
        }))
        .unwrap();

        assert_eq!(listing.files.len(), 2);
        assert!(listing.files[0].is_dir);
        assert_eq!(listing.files[0].size(), None);
        assert_eq!(listing.files[1].size(), Some(2048));
        assert_eq!(listing.files[1].modified(), Some(1700000000));
    }

    #[test]
    fn virtual_protocols_accept_string_and_array() {
        let dsm7: ServerInfo = serde_json::from_value(json!({
            "hostname": "diskstation",
            "support_virtual_protocol": ["cifs", "nfs", "iso"]
        }))
        .unwrap();
        assert_eq!(dsm7.virtual_protocols(), vec!["cifs", "nfs", "iso"]);

        let dsm6: ServerInfo = serde_json::from_value(json!({
            "hostname": "diskstation",
            "support_virtual_protocol": "cifs,iso"
        }))
        .unwrap();
        assert_eq!(dsm6.virtual_protocols(), vec!["cifs", "iso"]);

        assert!(ServerInfo::default().virtual_protocols().is_empty());
    }

    #[test]
    fn volume_comes_from_real_path() {
        let share: FileEntry = serde_json::from_value(json!({
            "path": "/photos",
            "name": "photos",
            "isdir": true,
            "additional": {"real_path": "/volume2/photos"}
        }))
        .unwrap();
        assert_eq!(share.volume(), Some("/volume2"));

        let bare: FileEntry =
            serde_json::from_value(json!({"path": "/homes", "name": "homes"})).unwrap();
        assert_eq!(bare.volume(), None);
    }

    #[test]
    fn volume_usage() {
        let status = VolumeStatus {
            freespace: 25,
            totalspace: 100,
            readonly: false,
        };
        assert_eq!(status.used(), 75);
    }
}
