use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct WebhookMessage {
    pub id: Uuid,
    pub received_at: DateTime<Utc>,
    pub payload: Value,
}
