use super::notifications::LoggingNotificationDispatcher;
use crate::config::KafkaConfig;
use crate::domains::task_assignment::{NotificationDispatcher, RealtimeNotification, Task};
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;

/// Publishes real-time task notifications to a Kafka topic. Emails are
/// handed to the logging dispatcher.
pub struct KafkaNotificationDispatcher {
    producer: FutureProducer,
    topic: String,
    send_timeout: Duration,
    email: LoggingNotificationDispatcher,
}

impl KafkaNotificationDispatcher {
    pub fn new(config: &KafkaConfig) -> Result<Self, String> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", config.brokers.join(","))
            .set("client.id", &config.client_id)
            .set("message.timeout.ms", config.message_timeout_ms.to_string())
            .create()
            .map_err(|e| format!("Failed to create Kafka producer: {}", e))?;

        Ok(Self {
            producer,
            topic: config.realtime_topic.clone(),
            send_timeout: Duration::from_millis(config.message_timeout_ms),
            email: LoggingNotificationDispatcher::new(),
        })
    }
}

#[async_trait]
impl NotificationDispatcher for KafkaNotificationDispatcher {
    async fn send_email(&self, recipients: &[String], task: &Task) -> Result<(), String> {
        self.email.send_email(recipients, task).await
    }

    async fn send_realtime(&self, payload: &RealtimeNotification) -> Result<(), String> {
        let body = serde_json::to_string(payload)
            .map_err(|e| format!("Failed to serialize notification: {}", e))?;
        let record = FutureRecord::to(&self.topic)
            .key(&payload.task_id)
            .payload(&body);

        self.producer
            .send(record, self.send_timeout)
            .await
            .map_err(|(e, _)| format!("Failed to publish notification to Kafka: {}", e))?;

        tracing::debug!(topic = %self.topic, task_id = %payload.task_id, "published realtime notification");
        Ok(())
    }
}
