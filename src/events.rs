//! Domain event publishing.

use crate::domain::events::DomainEvent;

pub const SUBJECT_PREFIX: &str = "junimo.catalog";

/// Where drained aggregate events go. Publishing is best effort: failures are
/// logged and never fail the write that raised the event.
#[derive(Clone, Debug, Default)]
pub enum EventPublisher {
    #[default]
    Log,
    Nats(async_nats::Client),
}

impl EventPublisher {
    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else { return Self::Log };
        match async_nats::connect(url).await {
            Ok(client) => { tracing::info!(%url, "publishing catalog events to NATS"); Self::Nats(client) }
            Err(err) => { tracing::warn!(%url, error = %err, "NATS unavailable; events will only be logged"); Self::Log }
        }
    }

    pub fn subject(event: &DomainEvent) -> String { format!("{SUBJECT_PREFIX}.{}", event.kind()) }

    pub async fn publish(&self, events: Vec<DomainEvent>) {
        for event in events {
            let subject = Self::subject(&event);
            match self {
                Self::Log => tracing::debug!(%subject, ?event, "domain event"),
                Self::Nats(client) => {
                    let payload = match serde_json::to_vec(&event) {
                        Ok(p) => p,
                        Err(err) => { tracing::error!(%subject, error = %err, "could not encode event"); continue; }
                    };
                    if let Err(err) = client.publish(subject.clone(), payload.into()).await {
                        tracing::warn!(%subject, error = %err, "failed to publish event");
                    }
                }
            }
        }
    }
}
