//! Data model for versioned model results.
//!
//! The containment hierarchy is Model -> Model Version -> Result -> Result
//! Version. Models and model versions have no representation of their own
//! beyond their identifiers: they exist exactly as long as something exists
//! beneath them, so only the result document and the model metadata summary
//! are modeled here.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// An immutable `(version, payload)` pair within a result.
///
/// Version numbers are assigned by the engine, never by callers. After
/// deletions they are not necessarily contiguous.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResultVersion {
    /// The engine-assigned version number.
    pub version: u32,
    /// The opaque result payload.
    pub data: JsonValue,
}

/// A named record holding one or more versioned payloads and a tag.
///
/// The `versions` list is kept sorted ascending by version number. The tag
/// applies to the result as a whole; the empty string means "untagged",
/// which is distinct from "no tag filter" at query time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResultRecord {
    /// The result identifier, unique within its (model, model version) pair.
    pub identifier: String,
    /// The whole-result tag; `""` when untagged.
    pub tag: String,
    /// The versioned payloads, sorted ascending by version number.
    pub versions: Vec<ResultVersion>,
}

impl ResultRecord {
    /// Build the payload for a write: one result version, untagged.
    ///
    /// The version number carried here is a placeholder; the engine assigns
    /// the stored number at write time.
    pub fn new(identifier: impl Into<String>, data: JsonValue) -> Self {
        ResultRecord {
            identifier: identifier.into(),
            tag: String::new(),
            versions: vec![ResultVersion { version: 0, data }],
        }
    }

    /// Set the tag on this record.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Sort the version list ascending by version number.
    pub fn normalize(&mut self) {
        self.versions.sort_by_key(|v| v.version);
    }

    /// The highest version number currently in the record.
    ///
    /// Returns `None` only for a record with an empty version list, which a
    /// well-formed store never produces.
    pub fn latest_version(&self) -> Option<u32> {
        self.versions.iter().map(|v| v.version).max()
    }

    /// Find a specific version by number.
    pub fn find_version(&self, version: u32) -> Option<&ResultVersion> {
        self.versions.iter().find(|v| v.version == version)
    }
}

/// Metadata summary for a model: its identifier and the model-version
/// names currently present beneath it, sorted lexicographically.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ModelMetadata {
    pub identifier: String,
    pub versions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_record_has_one_untagged_version() {
        let r = ResultRecord::new("r0", json!({"hello": "world"}));
        assert_eq!(r.identifier, "r0");
        assert_eq!(r.tag, "");
        assert_eq!(r.versions.len(), 1);
        assert_eq!(r.versions[0].data, json!({"hello": "world"}));
    }

    #[test]
    fn with_tag_sets_tag() {
        let r = ResultRecord::new("r0", json!(null)).with_tag("t0");
        assert_eq!(r.tag, "t0");
    }

    #[test]
    fn normalize_sorts_by_version() {
        let mut r = ResultRecord {
            identifier: "r0".to_string(),
            tag: String::new(),
            versions: vec![
                ResultVersion {
                    version: 2,
                    data: json!(2),
                },
                ResultVersion {
                    version: 0,
                    data: json!(0),
                },
                ResultVersion {
                    version: 1,
                    data: json!(1),
                },
            ],
        };
        r.normalize();
        let order: Vec<u32> = r.versions.iter().map(|v| v.version).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn latest_and_find_version() {
        let mut r = ResultRecord::new("r0", json!(0));
        r.versions.push(ResultVersion {
            version: 2,
            data: json!(2),
        });
        assert_eq!(r.latest_version(), Some(2));
        assert!(r.find_version(0).is_some());
        assert!(r.find_version(1).is_none());
    }

    #[test]
    fn serde_field_names_match_document_schema() {
        let r = ResultRecord::new("r0", json!({"a": 1})).with_tag("t0");
        let doc = serde_json::to_value(&r).unwrap();
        assert_eq!(
            doc,
            json!({
                "identifier": "r0",
                "tag": "t0",
                "versions": [{"version": 0, "data": {"a": 1}}],
            })
        );
    }
}
