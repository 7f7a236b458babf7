//! Artifact coordinates and the compact reference grammar.
//!
//! A reference reads
//! `[repository-url '!'] groupId '/' artifactId ['/' [version] ['/' [classifier] '/' type]]`.
//! The repository part is split at the *last* `!` so that nested
//! `jar:file:/x.zip!/repo!g/a` URLs keep their inner separator.

use crate::error::{Error, Result};
use crate::version::VersionSpec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between an inline repository URL and the coordinate.
pub const REPOSITORY_SEPARATOR: char = '!';

/// Artifact type used when none is given.
pub const DEFAULT_TYPE: &str = "jar";

/// Key under which nodes collide on a flattened classpath.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConflictKey {
    /// Group id.
    pub group_id: String,
    /// Artifact id.
    pub artifact_id: String,
    /// Classifier, if any.
    pub classifier: Option<String>,
    /// Artifact type.
    pub artifact_type: String,
}

impl fmt::Display for ConflictKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)?;
        if let Some(c) = &self.classifier {
            write!(f, ":{c}")?;
        }
        write!(f, ":{}", self.artifact_type)
    }
}

/// Immutable artifact coordinate (GAV plus classifier and type).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coordinate {
    group_id: String,
    artifact_id: String,
    version: VersionSpec,
    classifier: Option<String>,
    artifact_type: String,
}

impl Coordinate {
    /// Create a coordinate with the default type and no classifier.
    ///
    /// # Errors
    /// Returns a parse error if group or artifact id is empty.
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: VersionSpec,
    ) -> Result<Self> {
        let group_id = group_id.into();
        let artifact_id = artifact_id.into();
        if group_id.trim().is_empty() {
            return Err(Error::parse(group_id, "groupId must not be empty"));
        }
        if artifact_id.trim().is_empty() {
            return Err(Error::parse(artifact_id, "artifactId must not be empty"));
        }
        Ok(Self {
            group_id,
            artifact_id,
            version,
            classifier: None,
            artifact_type: DEFAULT_TYPE.to_string(),
        })
    }

    /// Set the classifier. A blank string clears it.
    #[must_use]
    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        let classifier = classifier.into();
        self.classifier = Some(classifier).filter(|c| !c.trim().is_empty());
        self
    }

    /// Set the type. A blank string means the default type.
    #[must_use]
    pub fn with_type(mut self, artifact_type: impl Into<String>) -> Self {
        let artifact_type = artifact_type.into();
        self.artifact_type = if artifact_type.trim().is_empty() {
            DEFAULT_TYPE.to_string()
        } else {
            artifact_type
        };
        self
    }

    /// Copy of this coordinate with another version.
    #[must_use]
    pub fn with_version(&self, version: VersionSpec) -> Self {
        Self {
            version,
            ..self.clone()
        }
    }

    /// Parse the artifact part of a reference (no repository prefix).
    ///
    /// # Errors
    /// Returns a parse error naming the offending segment.
    pub fn parse(s: &str) -> Result<Self> {
        let segments: Vec<&str> = s.split('/').collect();
        if segments.len() < 2 {
            return Err(Error::parse(s, "expected groupId/artifactId"));
        }
        if segments.len() > 5 {
            return Err(Error::parse(
                s,
                "expected at most groupId/artifactId/version/classifier/type",
            ));
        }

        let version = match segments.get(2).map(|v| v.trim()) {
            Some(v) if !v.is_empty() => VersionSpec::parse(v)?,
            _ => VersionSpec::Latest,
        };

        let mut coordinate = Self::new(segments[0].trim(), segments[1].trim(), version)?;
        match segments.len() {
            4 => coordinate = coordinate.with_type(segments[3].trim()),
            5 => {
                coordinate = coordinate
                    .with_classifier(segments[3].trim())
                    .with_type(segments[4].trim());
            }
            _ => {}
        }
        Ok(coordinate)
    }

    /// Group id.
    #[must_use]
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Artifact id.
    #[must_use]
    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    /// Requested version.
    #[must_use]
    pub const fn version(&self) -> &VersionSpec {
        &self.version
    }

    /// Classifier.
    #[must_use]
    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    /// Artifact type (also the file extension).
    #[must_use]
    pub fn artifact_type(&self) -> &str {
        &self.artifact_type
    }

    /// Conflict-group key.
    #[must_use]
    pub fn conflict_key(&self) -> ConflictKey {
        ConflictKey {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            classifier: self.classifier.clone(),
            artifact_type: self.artifact_type.clone(),
        }
    }

    /// Group id as a repository path (`org/example`).
    #[must_use]
    pub fn group_path(&self) -> String {
        self.group_id.replace('.', "/")
    }

    /// File name for a concrete file version.
    #[must_use]
    pub fn file_name(&self, file_version: &str) -> String {
        match &self.classifier {
            Some(c) => format!(
                "{}-{file_version}-{c}.{}",
                self.artifact_id, self.artifact_type
            ),
            None => format!("{}-{file_version}.{}", self.artifact_id, self.artifact_type),
        }
    }

    /// File name of a timestamped snapshot build:
    /// `artifactId-<base>-<timestamp>-<buildNumber>[-classifier].type`.
    #[must_use]
    pub fn snapshot_file_name(&self, base: &str, timestamp: &str, build_number: u32) -> String {
        self.file_name(&format!("{base}-{timestamp}-{build_number}"))
    }

    /// Repository-relative artifact path.
    ///
    /// `dir_version` names the version directory; `file_version` the
    /// version embedded in the file name. They differ for timestamped
    /// snapshots.
    #[must_use]
    pub fn artifact_path(&self, dir_version: &str, file_version: &str) -> String {
        format!(
            "{}/{}/{dir_version}/{}",
            self.group_path(),
            self.artifact_id,
            self.file_name(file_version)
        )
    }

    /// Path of the artifact-level metadata document.
    #[must_use]
    pub fn metadata_path(&self) -> String {
        format!("{}/{}/maven-metadata.xml", self.group_path(), self.artifact_id)
    }

    /// Path of the version-level metadata document.
    #[must_use]
    pub fn version_metadata_path(&self, version: &str) -> String {
        format!(
            "{}/{}/{version}/maven-metadata.xml",
            self.group_path(),
            self.artifact_id
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.group_id, self.artifact_id, self.version)?;
        match &self.classifier {
            Some(c) => write!(f, "/{c}/{}", self.artifact_type),
            None if self.artifact_type != DEFAULT_TYPE => write!(f, "/{}", self.artifact_type),
            None => Ok(()),
        }
    }
}

impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Coordinate {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Coordinate> for String {
    fn from(value: Coordinate) -> Self {
        value.to_string()
    }
}

/// A parsed reference: a coordinate and an optional inline repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReference {
    /// Repository URL written before the last `!`, unparsed.
    pub repository: Option<String>,
    /// The coordinate.
    pub coordinate: Coordinate,
}

impl ArtifactReference {
    /// Parse a full reference.
    ///
    /// # Errors
    /// Returns a parse error when the reference starts or ends with the
    /// repository separator, or the coordinate part is malformed.
    pub fn parse(path: &str) -> Result<Self> {
        let path = path.trim();
        if path.starts_with(REPOSITORY_SEPARATOR) || path.ends_with(REPOSITORY_SEPARATOR) {
            return Err(Error::parse(
                path,
                "reference cannot start or end with the repository separator '!'",
            ));
        }
        match path.rsplit_once(REPOSITORY_SEPARATOR) {
            Some((repository, artifact)) => Ok(Self {
                repository: Some(repository.to_string()),
                coordinate: Coordinate::parse(artifact)?,
            }),
            None => Ok(Self {
                repository: None,
                coordinate: Coordinate::parse(path)?,
            }),
        }
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(repository) = &self.repository {
            write!(f, "{repository}{REPOSITORY_SEPARATOR}")?;
        }
        self.coordinate.fmt(f)
    }
}

impl FromStr for ArtifactReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Parse a coordinate reference string.
///
/// # Errors
/// See [`ArtifactReference::parse`].
pub fn parse_coordinate(path: &str) -> Result<ArtifactReference> {
    ArtifactReference::parse(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn minimal_defaults_to_latest_jar() {
        let c = Coordinate::parse("org.example/lib").unwrap();
        assert_eq!(c.group_id(), "org.example");
        assert_eq!(c.artifact_id(), "lib");
        assert_eq!(c.version(), &VersionSpec::Latest);
        assert_eq!(c.classifier(), None);
        assert_eq!(c.artifact_type(), "jar");
    }

    #[test]
    fn empty_version_segment_is_latest() {
        let c = Coordinate::parse("g/a//sources/jar").unwrap();
        assert!(c.version().is_latest());
        assert_eq!(c.classifier(), Some("sources"));
    }

    #[test]
    fn classifier_then_type() {
        let c = Coordinate::parse("g/a/1.0/jdk8/zip").unwrap();
        assert_eq!(c.classifier(), Some("jdk8"));
        assert_eq!(c.artifact_type(), "zip");
        assert_eq!(c.file_name("1.0"), "a-1.0-jdk8.zip");
    }

    #[test]
    fn four_segments_is_type() {
        let c = Coordinate::parse("g/a/1.0/pom").unwrap();
        assert_eq!(c.classifier(), None);
        assert_eq!(c.artifact_type(), "pom");
    }

    #[test]
    fn empty_ids_rejected() {
        assert!(Coordinate::parse("/a/1.0").unwrap_err().is_parse());
        assert!(Coordinate::parse("g//1.0").unwrap_err().is_parse());
        assert!(Coordinate::parse("g").unwrap_err().is_parse());
        assert!(Coordinate::parse("g/a/1/c/t/x").unwrap_err().is_parse());
    }

    #[test]
    fn repository_prefix_split_at_last_separator() {
        let r = ArtifactReference::parse("jar:file:/tmp/r.zip!/repo!g/a/1.0").unwrap();
        assert_eq!(r.repository.as_deref(), Some("jar:file:/tmp/r.zip!/repo"));
        assert_eq!(r.coordinate.artifact_id(), "a");

        let plain = ArtifactReference::parse("http://repo.example.com/m2!g/a").unwrap();
        assert_eq!(plain.repository.as_deref(), Some("http://repo.example.com/m2"));
    }

    #[test]
    fn leading_or_trailing_separator_rejected() {
        let err = ArtifactReference::parse("!g/a").unwrap_err();
        assert!(err.is_parse());
        assert!(ArtifactReference::parse("http://r!").is_err());
    }

    #[test]
    fn paths() {
        let c = Coordinate::parse("org.ops4j/pax/1.0-SNAPSHOT").unwrap();
        assert_eq!(c.metadata_path(), "org/ops4j/pax/maven-metadata.xml");
        assert_eq!(
            c.version_metadata_path("1.0-SNAPSHOT"),
            "org/ops4j/pax/1.0-SNAPSHOT/maven-metadata.xml"
        );
        assert_eq!(
            c.artifact_path("1.0-SNAPSHOT", "1.0-20230615.143000-3"),
            "org/ops4j/pax/1.0-SNAPSHOT/pax-1.0-20230615.143000-3.jar"
        );
        assert_eq!(
            c.snapshot_file_name("1.0", "20230615.143000", 3),
            "pax-1.0-20230615.143000-3.jar"
        );
    }

    #[test]
    fn conflict_key_fields_never_blank() {
        let c = Coordinate::new("g", "a", VersionSpec::Latest)
            .unwrap()
            .with_classifier("  ")
            .with_type(" \t");
        let key = c.conflict_key();
        assert_eq!(key.artifact_type, DEFAULT_TYPE);
        assert_eq!(key.classifier, None);
        assert!(Coordinate::new(" ", "a", VersionSpec::Latest).unwrap_err().is_parse());
        assert!(Coordinate::new("g", "\t", VersionSpec::Latest).unwrap_err().is_parse());
    }

    #[test]
    fn conflict_key_ignores_version() {
        let a = Coordinate::parse("g/a/1.0").unwrap();
        let b = Coordinate::parse("g/a/2.0").unwrap();
        let c = Coordinate::parse("g/a/2.0/tests/jar").unwrap();
        assert_eq!(a.conflict_key(), b.conflict_key());
        assert_ne!(a.conflict_key(), c.conflict_key());
    }

    #[test]
    fn serde_as_string() {
        let c = Coordinate::parse("g/a/[1.0,2.0)/war").unwrap();
        let json = sonic_rs::to_string(&c).unwrap();
        assert_eq!(json, "\"g/a/[1.0,2.0)/war\"");
        let back: Coordinate = sonic_rs::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    fn segment() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9.]{0,10}".prop_filter("no trailing dot", |s| !s.ends_with('.'))
    }

    fn version() -> impl Strategy<Value = String> {
        prop_oneof![
            "[0-9]{1,2}\\.[0-9]{1,2}(\\.[0-9]{1,2})?",
            "[0-9]{1,2}\\.[0-9]{1,2}-SNAPSHOT",
            Just("LATEST".to_string()),
        ]
    }

    proptest! {
        #[test]
        fn parse_display_round_trip(
            g in segment(),
            a in segment(),
            v in version(),
            tail in prop_oneof![
                Just(String::new()),
                Just("/war".to_string()),
                Just("/sources/jar".to_string()),
            ],
        ) {
            let text = format!("{g}/{a}/{v}{tail}");
            let parsed = Coordinate::parse(&text).unwrap();
            let reparsed = Coordinate::parse(&parsed.to_string()).unwrap();
            prop_assert_eq!(&parsed, &reparsed);
            prop_assert_eq!(parsed.group_id(), g.as_str());
            prop_assert_eq!(parsed.artifact_id(), a.as_str());
            prop_assert_eq!(parsed.version().to_string(), v);
        }
    }
}
