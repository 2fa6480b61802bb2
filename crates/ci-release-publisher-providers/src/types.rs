//! Common types for hosting providers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A release as reported by the hosting provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Provider-assigned release ID
    pub id: u64,

    /// Tag name, unique per repository
    pub tag_name: String,

    /// Release title
    #[serde(default)]
    pub name: Option<String>,

    /// Release body text
    #[serde(default)]
    pub body: Option<String>,

    /// Hidden staging state
    pub draft: bool,

    /// Prerelease flag
    pub prerelease: bool,

    /// Commit the release points at
    #[serde(default)]
    pub target_commitish: Option<String>,

    /// Creation time, used for age-based retention
    pub created_at: DateTime<Utc>,

    /// API URL of the release itself
    #[serde(default)]
    pub url: String,

    /// Upload endpoint (may carry a URI template suffix)
    #[serde(default)]
    pub upload_url: String,

    /// Uploaded assets
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Release {
    /// Release title, or an empty string when unset
    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Release body, or an empty string when unset
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}

/// An artifact file attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Provider-assigned asset ID
    pub id: u64,

    /// File name
    pub name: String,

    /// Size in bytes
    pub size: u64,

    /// API locator used to download the asset
    pub url: String,
}

/// Parameters for creating a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRelease {
    pub tag_name: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,

    /// Commit to pin the release (and the tag, once published) to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_commitish: Option<String>,
}

/// Parameters for updating a release in a single call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseUpdate {
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,

    /// New tag name, when renaming
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_deserializes_github_payload() {
        let json = r#"{
            "id": 1,
            "tag_name": "ci-master-latest",
            "name": null,
            "body": "text",
            "draft": true,
            "prerelease": false,
            "target_commitish": "abc123",
            "created_at": "2024-03-01T10:00:00Z",
            "url": "https://api.github.com/repos/o/r/releases/1",
            "upload_url": "https://uploads.github.com/repos/o/r/releases/1/assets{?name,label}",
            "html_url": "https://github.com/o/r/releases/tag/ci-master-latest",
            "assets": [
                {"id": 7, "name": "a.bin", "size": 3, "url": "https://api.github.com/repos/o/r/releases/assets/7", "state": "uploaded"}
            ]
        }"#;

        let release: Release = serde_json::from_str(json).unwrap();
        assert_eq!(release.tag_name, "ci-master-latest");
        assert_eq!(release.title(), "");
        assert_eq!(release.body_text(), "text");
        assert!(release.draft);
        assert_eq!(release.assets.len(), 1);
        assert_eq!(release.assets[0].name, "a.bin");
    }

    #[test]
    fn test_release_update_omits_tag_when_not_renaming() {
        let update = ReleaseUpdate {
            name: "n".to_string(),
            body: "b".to_string(),
            draft: false,
            prerelease: true,
            tag_name: None,
        };
        let value = serde_json::to_value(&update).unwrap();
        assert!(value.get("tag_name").is_none());
        assert_eq!(value["prerelease"], true);
    }
}
