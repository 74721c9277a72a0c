//! Inbound request shapes

use serde::{Deserialize, Serialize};

use crate::protocol::KafkaProtocol;
use crate::subject::{InvalidSubject, SubjectKey};

/// Topic-level request forwarded by the cluster management application.
///
/// A topic's schema may live in a registry that is reached through a
/// different environment and protocol than the topic itself, so the schema
/// coordinates are carried separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterTopicRequest {
    pub cluster_name: String,
    pub topic_name: String,
    /// Environment of the Kafka cluster hosting the topic
    pub env: String,
    #[serde(default)]
    pub protocol: KafkaProtocol,
    #[serde(default)]
    pub delete_associated_schema: bool,
    #[serde(default)]
    pub schema_cluster_identification: Option<String>,
    /// Environment of the schema registry holding the topic's subject
    #[serde(default)]
    pub schema_env: Option<String>,
    #[serde(default)]
    pub schema_env_protocol: KafkaProtocol,
}

impl ClusterTopicRequest {
    /// Subject in the schema registry environment.
    ///
    /// Fails with [`InvalidSubject::MissingEnvironment`] when no schema
    /// environment is configured for the topic.
    pub fn schema_subject(&self) -> Result<SubjectKey, InvalidSubject> {
        let env = self
            .schema_env
            .as_deref()
            .ok_or(InvalidSubject::MissingEnvironment)?;
        SubjectKey::new(env, self.topic_name.as_str())
    }
}

/// Request to register a new value schema for a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRequest {
    pub env: String,
    #[serde(default)]
    pub protocol: KafkaProtocol,
    pub cluster_identification: String,
    pub topic_name: String,
    pub full_schema: String,
    /// Register even if incompatible by temporarily relaxing the subject to `NONE`
    #[serde(default)]
    pub force_register: bool,
}

impl SchemaRequest {
    pub fn subject_key(&self) -> Result<SubjectKey, InvalidSubject> {
        SubjectKey::new(self.env.as_str(), self.topic_name.as_str())
    }
}
