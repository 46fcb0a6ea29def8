//! Named capture configurations.

use serde::{Deserialize, Serialize};

/// One named capture configuration, e.g. `"chrome.laptop"`.
///
/// A configuration binds a target name to target-specific settings
/// (viewport, media, UA and so on). The runner itself only reads
/// `target` and the story filter fields; everything else is passed
/// through to the target untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Name of the target that captures this configuration.
    pub target: String,

    /// Per-configuration story exclusion pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_stories: Option<String>,

    /// Per-configuration story inclusion pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stories_filter: Option<String>,

    /// Target-specific settings, forwarded opaquely.
    #[serde(flatten)]
    pub settings: serde_json::Map<String, serde_json::Value>,
}

impl Configuration {
    /// Create a configuration for a target with no extra settings.
    pub fn for_target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            skip_stories: None,
            stories_filter: None,
            settings: serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_keys_flatten_into_settings() {
        let conf: Configuration = serde_json::from_str(
            r#"{"target":"chrome.app","width":1366,"height":768,"skipStories":"skipped"}"#,
        )
        .unwrap();
        assert_eq!(conf.target, "chrome.app");
        assert_eq!(conf.skip_stories.as_deref(), Some("skipped"));
        assert_eq!(conf.settings["width"], 1366);
        assert_eq!(conf.settings["height"], 768);
    }

    #[test]
    fn test_roundtrip_keeps_camel_case_keys() {
        let mut conf = Configuration::for_target("chrome.docs");
        conf.stories_filter = Some("^Button".to_owned());
        let json = serde_json::to_value(&conf).unwrap();
        assert_eq!(json["storiesFilter"], "^Button");
    }
}
