//! Versioned envelope for every outbound progress-WebSocket message.

use super::state::JobPipeline;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire version of the envelope format.
pub const ENVELOPE_VERSION: &str = "1.0.0";

/// Outbound message discriminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Progress,
    Complete,
    Error,
    ReadyAck,
}

/// Envelope wrapped around every message sent to a progress WebSocket.
///
/// Clients may observe the same `complete` or terminal `error` message more
/// than once (terminal transitions are idempotent) and must tolerate it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressMessage {
    pub pipeline: JobPipeline,
    pub version: String,
    #[serde(rename = "jobId")]
    pub job_id: Uuid,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// RFC 3339 timestamp of enqueue time.
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl ProgressMessage {
    /// Build an envelope stamped with the current time.
    #[must_use]
    pub fn new(
        pipeline: JobPipeline,
        job_id: Uuid,
        message_type: MessageType,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            pipeline,
            version: ENVELOPE_VERSION.to_string(),
            job_id,
            message_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    #[must_use]
    pub fn progress(pipeline: JobPipeline, job_id: Uuid, payload: serde_json::Value) -> Self {
        Self::new(pipeline, job_id, MessageType::Progress, payload)
    }

    #[must_use]
    pub fn complete(pipeline: JobPipeline, job_id: Uuid, payload: serde_json::Value) -> Self {
        Self::new(pipeline, job_id, MessageType::Complete, payload)
    }

    #[must_use]
    pub fn error(pipeline: JobPipeline, job_id: Uuid, payload: serde_json::Value) -> Self {
        Self::new(pipeline, job_id, MessageType::Error, payload)
    }

    #[must_use]
    pub fn ready_ack(pipeline: JobPipeline, job_id: Uuid) -> Self {
        Self::new(pipeline, job_id, MessageType::ReadyAck, serde_json::Value::Null)
    }
}

/// The single inbound frame clients send after connecting.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ready,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_wire_shape() {
        let job_id = Uuid::new_v4();
        let msg = ProgressMessage::progress(
            JobPipeline::BatchEnrichment,
            job_id,
            serde_json::json!({"progress": 0.5}),
        );
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["pipeline"], "batch_enrichment");
        assert_eq!(json["version"], ENVELOPE_VERSION);
        assert_eq!(json["jobId"], job_id.to_string());
        assert_eq!(json["type"], "progress");
        assert!(json["timestamp"].is_string());
        assert_eq!(json["payload"]["progress"], 0.5);
    }

    #[test]
    fn test_ready_parses() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ready"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ready));
    }

    #[test]
    fn test_unknown_client_message_is_an_error() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"shout"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
    }
}
