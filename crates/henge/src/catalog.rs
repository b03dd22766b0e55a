//! Asset-catalog record types.
//!
//! The engine performs no asset discovery or disk I/O of its own; the embedding shell scans
//! for images, landmark files, and addon stickers, and hands decoded buffers over. These
//! types only pin down the metadata schema so editor output and shell catalogs stay
//! compatible.

use serde::{Deserialize, Serialize};

use crate::overlay::AddonKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// One catalog entry describing a morph target or an addon asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Display name, unique within a catalog.
    pub name: String,
    /// Path or handle of the asset image.
    pub image: String,
    /// Path or handle of the landmark JSON for morph targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    /// Present for addon assets; fixes the placement anchors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AddonKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addon_record_round_trips() {
        let record = AssetRecord {
            name: "aviators".into(),
            image: "addons/aviators.png".into(),
            landmarks: None,
            gender: None,
            kind: Some(AddonKind::Glasses),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"name":"aviators","image":"addons/aviators.png","kind":"glasses"}"#
        );
        let parsed: AssetRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.kind, Some(AddonKind::Glasses));
    }

    #[test]
    fn target_record_parses_with_optional_fields() {
        let json = r#"{
            "name": "model-a",
            "image": "targets/model-a.jpg",
            "landmarks": "targets/model-a.json",
            "gender": "female"
        }"#;
        let record: AssetRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.gender, Some(Gender::Female));
        assert_eq!(record.landmarks.as_deref(), Some("targets/model-a.json"));
        assert_eq!(record.kind, None);
    }
}
