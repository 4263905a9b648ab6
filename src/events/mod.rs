use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use uuid::Uuid;

pub mod loggable;
pub use loggable::{Loggable, Severity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent<T> {
    pub id: Uuid,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
    pub actor_id: Option<Uuid>,
    pub department_id: Uuid,
    pub subject_id: Uuid,
    pub payload: T,
}

impl<T> DomainEvent<T> {
    pub fn new(name: String, actor_id: Option<Uuid>, department_id: Uuid, subject_id: Uuid, payload: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            occurred_at: Utc::now(),
            actor_id,
            department_id,
            subject_id,
            payload,
        }
    }
}

pub type EventBus = broadcast::Sender<Value>;

pub fn init_event_bus() -> (EventBus, broadcast::Receiver<Value>) {
    broadcast::channel(1024)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityPayload {
    #[serde(rename = "new")]
    pub current: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    pub severity: Severity,
}

/// Publishes an overlay change. Every event carries the department id so that
/// cache listeners can invalidate without decoding the payload.
pub fn log_activity<T: Loggable>(
    event_bus: &EventBus,
    action: &str,
    actor_id: Option<Uuid>,
    entity: &T,
    old_entity: Option<&T>,
) {
    let severity = entity.severity_for_action(action);
    let payload = ActivityPayload {
        current: serde_json::to_value(entity).unwrap_or_default(),
        old: old_entity.map(|e| serde_json::to_value(e).unwrap_or_default()),
        severity,
    };

    let event = DomainEvent::new(
        format!("{}.{}", T::entity_type(), action),
        actor_id,
        entity.department_id(),
        entity.subject_id(),
        payload,
    );

    // no receivers is fine: the write already succeeded
    if let Ok(value) = serde_json::to_value(event) {
        let _ = event_bus.send(value);
    }
}

/// Department id carried by a published event, if any.
pub fn event_department(event: &Value) -> Option<Uuid> {
    event
        .get("department_id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
}

pub async fn start_activity_listener(mut rx: broadcast::Receiver<Value>, pool: SqlitePool) {
    tracing::info!("activity listener started");
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "activity listener lagged, events dropped");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        let name = event.get("name").and_then(|v| v.as_str()).unwrap_or("unknown");
        let actor_id = event.get("actor_id").and_then(|v| v.as_str());
        let subject_id = event.get("subject_id").and_then(|v| v.as_str());
        let department_id = event.get("department_id").and_then(|v| v.as_str());
        let occurred_at = event
            .get("occurred_at")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        let severity = event
            .get("payload")
            .and_then(|p| p.get("severity"))
            .and_then(|s| s.as_str())
            .unwrap_or(Severity::Important.as_str());

        let result = sqlx::query(
            r#"
            INSERT INTO activity_log (id, event_name, actor_id, department_id, subject_id, occurred_at, properties, severity)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(actor_id)
        .bind(department_id)
        .bind(subject_id)
        .bind(occurred_at.to_rfc3339())
        .bind(event.to_string())
        .bind(severity)
        .execute(&pool)
        .await;

        if let Err(e) = result {
            tracing::error!(event = name, "failed to save activity log: {}", e);
        }
    }
    tracing::info!("activity listener stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DepartmentMenuOverlay;

    #[tokio::test]
    async fn published_event_carries_department() {
        let (bus, mut rx) = init_event_bus();
        let overlay = DepartmentMenuOverlay {
            department_id: Uuid::new_v4(),
            menu_id: Uuid::new_v4(),
            hidden_override: Some(true),
            ..Default::default()
        };

        log_activity(&bus, "hidden", Some(Uuid::new_v4()), &overlay, None);

        let event = rx.recv().await.unwrap();
        assert_eq!(event["name"], "department_menu.hidden");
        assert_eq!(event_department(&event), Some(overlay.department_id));
        assert_eq!(event["payload"]["severity"], "important");
    }
}
