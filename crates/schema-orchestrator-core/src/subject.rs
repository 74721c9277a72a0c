//! Subjects, version sets and the registry paths derived from them

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Key under which the resolved compatibility mode is merged into every
/// version's metadata document.
pub const COMPATIBILITY_KEY: &str = "compatibility";

/// Schema metadata documents keyed by version number.
pub type SchemaMap = BTreeMap<u32, serde_json::Map<String, serde_json::Value>>;

/// Longest topic name a Kafka broker accepts.
pub const MAX_TOPIC_LENGTH: usize = 249;

/// Rejected environment or topic name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidSubject {
    #[error("Schema environment is missing")]
    MissingEnvironment,
    #[error("Invalid environment name: {0:?}")]
    Environment(String),
    #[error("Invalid topic name: {0:?}")]
    Topic(String),
}

/// Kafka's legal name alphabet: ASCII alphanumerics, `.`, `_` and `-`.
/// `.` and `..` are reserved.
fn is_legal_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}

/// A value-schema subject living in one logical environment.
///
/// The subject name is always derived as `{topic}-value`; key schemas are not
/// addressed by this type. Both names are restricted to Kafka's topic
/// alphabet, so every path built from a key stays inside that subject's
/// endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubjectKey {
    environment: String,
    topic: String,
}

impl SubjectKey {
    pub fn new(
        environment: impl Into<String>,
        topic: impl Into<String>,
    ) -> Result<Self, InvalidSubject> {
        let environment = environment.into();
        let topic = topic.into();

        if environment.trim().is_empty() {
            return Err(InvalidSubject::MissingEnvironment);
        }
        if !is_legal_name(&environment) {
            return Err(InvalidSubject::Environment(environment));
        }
        if topic.len() > MAX_TOPIC_LENGTH || !is_legal_name(&topic) {
            return Err(InvalidSubject::Topic(topic));
        }

        Ok(Self { environment, topic })
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Registry subject name for the topic's value schema.
    pub fn subject(&self) -> String {
        format!("{}-value", self.topic)
    }

    /// `{env}/subjects/{subject}/versions`
    pub fn versions_path(&self) -> String {
        format!("{}/subjects/{}/versions", self.environment, self.subject())
    }

    /// `{env}/subjects/{subject}/versions/{version}`
    pub fn version_path(&self, version: u32) -> String {
        format!("{}/{}", self.versions_path(), version)
    }

    /// `{env}/subjects/{subject}`
    pub fn subject_path(&self) -> String {
        format!("{}/subjects/{}", self.environment, self.subject())
    }

    /// `{env}/config/{subject}`
    pub fn subject_config_path(&self) -> String {
        format!("{}/config/{}", self.environment, self.subject())
    }

    /// `{env}/config`, the registry-global default.
    pub fn global_config_path(&self) -> String {
        format!("{}/config", self.environment)
    }

    /// `{env}/compatibility/subjects/{subject}/versions/latest`
    pub fn compatibility_path(&self) -> String {
        format!(
            "{}/compatibility/subjects/{}/versions/latest",
            self.environment,
            self.subject()
        )
    }
}

impl std::fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.environment, self.subject())
    }
}

/// Registered version numbers of a subject.
///
/// Duplicates reported by the registry collapse into one entry and iteration
/// is always ascending. An empty set means no schema has been registered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionSet(BTreeSet<u32>);

impl VersionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, version: u32) -> bool {
        self.0.contains(&version)
    }

    /// Highest registered version, if any.
    pub fn latest(&self) -> Option<u32> {
        self.0.iter().next_back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<u32> for VersionSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for VersionSet {
    type Item = u32;
    type IntoIter = std::collections::btree_set::IntoIter<u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
