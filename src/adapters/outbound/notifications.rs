use crate::domains::identity::{OtpPurpose, OtpSender};
use crate::domains::task_assignment::{NotificationDispatcher, RealtimeNotification, Task};
use async_trait::async_trait;

/// A rendered email, ready for whatever transport delivers it.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

pub fn render_task_email(recipients: &[String], task: &Task) -> EmailMessage {
    let mut body = format!(
        "A new task near you is available.\n\nTitle: {}\nLocation: {:.5}, {:.5}\n",
        task.title, task.location.latitude, task.location.longitude
    );
    if let Some(description) = &task.description {
        body.push_str(&format!("Description: {}\n", description));
    }
    if let Some(shop) = &task.shop_name {
        body.push_str(&format!("Shop: {}\n", shop));
    }
    if let Some(incentive) = task.incentive {
        body.push_str(&format!("Incentive: {:.2}\n", incentive));
    }
    if let Some(deadline) = task.deadline {
        body.push_str(&format!("Deadline: {}\n", deadline.format("%Y-%m-%d %H:%M UTC")));
    }
    body.push_str(&format!("\nTask id: {}\n", task.id));

    EmailMessage {
        recipients: recipients.to_vec(),
        subject: format!("New task available: {}", task.title),
        body,
    }
}

pub fn render_otp_email(email: &str, code: &str, purpose: OtpPurpose) -> EmailMessage {
    let subject = match purpose {
        OtpPurpose::Registration => "Verify your account",
        OtpPurpose::PasswordReset => "Reset your password",
    };
    EmailMessage {
        recipients: vec![email.to_string()],
        subject: subject.to_string(),
        body: format!("Your one-time passcode is {}. It expires shortly.", code),
    }
}

/// Dispatcher that renders messages and writes them to the trace log
/// instead of delivering them. Bodies, passcodes included, go out at `debug`.
#[derive(Debug, Default, Clone)]
pub struct LoggingNotificationDispatcher;

impl LoggingNotificationDispatcher {
    pub fn new() -> Self {
        Self
    }

    fn deliver(&self, message: &EmailMessage) {
        tracing::info!(
            recipients = ?message.recipients,
            subject = %message.subject,
            "email queued"
        );
        tracing::debug!(body = %message.body, "email body");
    }
}

#[async_trait]
impl NotificationDispatcher for LoggingNotificationDispatcher {
    async fn send_email(&self, recipients: &[String], task: &Task) -> Result<(), String> {
        if recipients.is_empty() {
            return Ok(());
        }
        self.deliver(&render_task_email(recipients, task));
        Ok(())
    }

    async fn send_realtime(&self, payload: &RealtimeNotification) -> Result<(), String> {
        tracing::info!(
            task_id = %payload.task_id,
            title = %payload.title,
            "realtime notification: {}",
            payload.message
        );
        Ok(())
    }
}

#[async_trait]
impl OtpSender for LoggingNotificationDispatcher {
    async fn send_otp(&self, email: &str, code: &str, purpose: OtpPurpose) -> Result<(), String> {
        self.deliver(&render_otp_email(email, code, purpose));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::task_assignment::NewTask;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn otp_email_reaches_the_log_with_its_code() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tokio_test::block_on(LoggingNotificationDispatcher::new().send_otp(
                "w@example.com",
                "482910",
                OtpPurpose::Registration,
            ))
            .unwrap();
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("w@example.com"));
        assert!(output.contains("Verify your account"));
        assert!(output.contains("Your one-time passcode is 482910"));
    }

    #[test]
    fn task_email_mentions_title_and_optional_fields() {
        let task = Task::create(
            "t-9".to_string(),
            NewTask {
                title: "Stock shelves".to_string(),
                company_id: "c-1".to_string(),
                shop_name: Some("Corner Mart".to_string()),
                incentive: Some(12.5),
                latitude: Some(1.0),
                longitude: Some(2.0),
                deadline: Some("2030-01-02".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let email = render_task_email(&["w@example.com".to_string()], &task);
        assert_eq!(email.subject, "New task available: Stock shelves");
        assert!(email.body.contains("Shop: Corner Mart"));
        assert!(email.body.contains("Incentive: 12.50"));
        assert!(email.body.contains("Deadline: 2030-01-02 00:00 UTC"));
        assert!(email.body.contains("Task id: t-9"));
    }
}
