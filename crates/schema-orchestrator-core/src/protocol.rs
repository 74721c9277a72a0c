//! Wire protocols and cluster kinds

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Protocol used to reach a cluster in a given environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KafkaProtocol {
    #[default]
    Plaintext,
    Ssl,
    SaslPlain,
    SaslSsl,
    SaslSslPlain,
    SaslSslScram,
    SaslSslGssapi,
}

impl KafkaProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plaintext => "PLAINTEXT",
            Self::Ssl => "SSL",
            Self::SaslPlain => "SASL_PLAIN",
            Self::SaslSsl => "SASL_SSL",
            Self::SaslSslPlain => "SASL_SSL_PLAIN",
            Self::SaslSslScram => "SASL_SSL_SCRAM",
            Self::SaslSslGssapi => "SASL_SSL_GSSAPI",
        }
    }

    /// Whether traffic for this protocol runs over TLS.
    pub fn is_secure(&self) -> bool {
        !matches!(self, Self::Plaintext | Self::SaslPlain)
    }
}

impl std::fmt::Display for KafkaProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown protocol: {0}")]
pub struct ParseProtocolError(pub String);

impl FromStr for KafkaProtocol {
    type Err = ParseProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PLAINTEXT" => Ok(Self::Plaintext),
            "SSL" => Ok(Self::Ssl),
            "SASL_PLAIN" => Ok(Self::SaslPlain),
            "SASL_SSL" => Ok(Self::SaslSsl),
            "SASL_SSL_PLAIN" => Ok(Self::SaslSslPlain),
            "SASL_SSL_SCRAM" => Ok(Self::SaslSslScram),
            "SASL_SSL_GSSAPI" => Ok(Self::SaslSslGssapi),
            _ => Err(ParseProtocolError(s.to_string())),
        }
    }
}

/// Kind of cluster a set of credentials belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterKind {
    Kafka,
    SchemaRegistry,
    KafkaConnect,
}

impl std::fmt::Display for ClusterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Kafka => "KAFKA",
            Self::SchemaRegistry => "SCHEMA_REGISTRY",
            Self::KafkaConnect => "KAFKA_CONNECT",
        };
        f.write_str(name)
    }
}
