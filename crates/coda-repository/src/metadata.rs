//! Repository metadata documents (`maven-metadata.xml`).
//!
//! Only the fields version resolution needs are read:
//!
//! ```xml
//! <metadata>
//!   <versioning>
//!     <versions><version>1.0</version><version>1.1</version></versions>
//!     <snapshot>
//!       <timestamp>20230615.143000</timestamp>
//!       <buildNumber>3</buildNumber>
//!       <localCopy>false</localCopy>
//!     </snapshot>
//!     <lastUpdated>20230615143000</lastUpdated>
//!   </versioning>
//! </metadata>
//! ```

use crate::error::{FetchError, Result};
use roxmltree::{Document, Node};

/// Parsed metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// `versioning/versions/version`, in document order.
    pub versions: Vec<String>,
    /// `versioning/snapshot`.
    pub snapshot: Option<SnapshotInfo>,
    /// `versioning/lastUpdated`.
    pub last_updated: Option<String>,
}

/// Snapshot build information from version-scoped metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotInfo {
    /// `timestamp`, as `yyyyMMdd.HHmmss`.
    pub timestamp: Option<String>,
    /// `buildNumber`.
    pub build_number: Option<u32>,
    /// `localCopy`: the snapshot was built locally.
    pub local_copy: bool,
}

impl Metadata {
    /// Parse a metadata document. `source` names it in errors.
    ///
    /// # Errors
    /// Returns [`FetchError::InvalidMetadata`] if the text is not XML or has
    /// no `<metadata>` root.
    pub fn from_xml(source: &str, xml: &str) -> Result<Self> {
        let invalid = |message: String| FetchError::InvalidMetadata {
            source: source.to_string(),
            message,
        };
        let document = Document::parse(xml).map_err(|e| invalid(e.to_string()))?;
        let root = document.root_element();
        if !root.has_tag_name("metadata") {
            return Err(invalid(format!(
                "expected <metadata>, found <{}>",
                root.tag_name().name()
            )));
        }

        let Some(versioning) = child(&root, "versioning") else {
            return Ok(Self::default());
        };

        let versions = child(&versioning, "versions")
            .map(|versions| {
                versions
                    .children()
                    .filter(|n| n.has_tag_name("version"))
                    .filter_map(|n| n.text())
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let snapshot = child(&versioning, "snapshot").map(|snapshot| SnapshotInfo {
            timestamp: node_text(&snapshot, "timestamp"),
            build_number: node_text(&snapshot, "buildNumber").and_then(|n| n.parse().ok()),
            local_copy: node_text(&snapshot, "localCopy").is_some_and(|v| v == "true"),
        });

        Ok(Self {
            versions,
            snapshot,
            last_updated: node_text(&versioning, "lastUpdated"),
        })
    }

    /// The last listed version, which the document orders highest.
    #[must_use]
    pub fn latest_version(&self) -> Option<&str> {
        self.versions.last().map(String::as_str)
    }
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == tag)
}

fn node_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|c| c.text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
