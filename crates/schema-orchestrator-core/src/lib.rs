//! Core domain types for the schema orchestrator
//!
//! This crate holds the vocabulary shared by the orchestration service and the
//! HTTP surface built on top of it:
//!
//! - [`SubjectKey`] and the registry endpoint paths derived from it
//! - [`VersionSet`] and the per-version [`SchemaMap`]
//! - [`CompatibilityMode`] and the registry's [`CompatibilityVerdict`]
//! - [`OperationResult`], the uniform pass/fail contract returned upward
//! - [`ClusterTopicRequest`] and [`SchemaRequest`], the inbound request shapes

pub mod compatibility;
pub mod protocol;
pub mod request;
pub mod result;
pub mod subject;

pub use compatibility::{CompatibilityMode, CompatibilityVerdict, ParseCompatibilityError};
pub use protocol::{ClusterKind, KafkaProtocol, ParseProtocolError};
pub use request::{ClusterTopicRequest, SchemaRequest};
pub use result::{ApiResultStatus, OperationResult};
pub use subject::{
    InvalidSubject, SchemaMap, SubjectKey, VersionSet, COMPATIBILITY_KEY, MAX_TOPIC_LENGTH,
};
