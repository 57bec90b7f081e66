use crate::alert::AlertRecord;
use crate::sender::{OutboundSms, SmsSender};

/// SendAttempt is a single message which an alert calls for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendAttempt {
    pub to: String,
    pub body: String,
}

/// Plan the messages to send for `record`: one per recipient having a
/// non-blank phone number, each carrying the record's effective message.
pub fn plan_sends(record: &AlertRecord) -> Vec<SendAttempt> {
    let body = record.effective_message();

    record
        .recipient_phones()
        .into_iter()
        .map(|to| SendAttempt {
            to,
            body: body.to_string(),
        })
        .collect()
}

/// Why an invocation sent nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Skipped {
    EmptyRecord,
    MalformedRecord,
    NotConfigured,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum AttemptStatus {
    Sent { sid: String },
    Failed { detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AttemptOutcome {
    pub to: String,
    #[serde(flatten)]
    pub status: AttemptStatus,
}

/// NotifyReport is the outcome of notifying the recipients of one alert.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NotifyReport {
    pub skipped: Option<Skipped>,
    pub attempts: Vec<AttemptOutcome>,
}

impl NotifyReport {
    pub fn skipped(reason: Skipped) -> Self {
        Self {
            skipped: Some(reason),
            attempts: Vec::new(),
        }
    }

    pub fn sent(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| matches!(a.status, AttemptStatus::Sent { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.attempts.len() - self.sent()
    }
}

/// Notifier sends an SMS to each recipient of an alert.
///
/// A Notifier holds no per-invocation state, and a single instance is shared
/// by all concurrent invocations. If either the transport `client` or the
/// `from` address is missing then the Notifier runs in a degraded mode where
/// every invocation is logged and skipped.
#[derive(Debug)]
pub struct Notifier<S> {
    client: Option<S>,
    from: Option<String>,
}

impl<S: SmsSender> Notifier<S> {
    pub fn new(client: Option<S>, from: Option<String>) -> Self {
        Self {
            client,
            from: from.filter(|from| !from.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some() && self.from.is_some()
    }

    /// Notify all recipients of `record`, returning once every send has
    /// either succeeded or failed. This never fails: a failed send is logged
    /// and recorded in the returned report, and doesn't affect other sends.
    pub async fn notify(&self, record: Option<&AlertRecord>) -> NotifyReport {
        let Some(record) = record else {
            tracing::debug!("alert record is empty, nothing to notify");
            return NotifyReport::skipped(Skipped::EmptyRecord);
        };

        let (Some(client), Some(from)) = (&self.client, self.from.as_deref()) else {
            tracing::info!("SMS transport is not configured, skipping send");
            return NotifyReport::skipped(Skipped::NotConfigured);
        };

        let sends = plan_sends(record)
            .into_iter()
            .map(move |SendAttempt { to, body }| async move {
                let sms = OutboundSms {
                    to: to.clone(),
                    from: from.to_string(),
                    body,
                };

                let status = match client.send(sms).await {
                    Ok(receipt) => {
                        tracing::info!(%to, sid = %receipt.sid, "sent SMS");
                        AttemptStatus::Sent { sid: receipt.sid }
                    }
                    Err(err) => {
                        let detail = format!("{:#}", anyhow::Error::new(err));
                        tracing::error!(%to, error = %detail, "failed to send SMS");
                        AttemptStatus::Failed { detail }
                    }
                };
                AttemptOutcome { to, status }
            });

        let report = NotifyReport {
            skipped: None,
            attempts: futures::future::join_all(sends).await,
        };
        tracing::debug!(
            sent = report.sent(),
            failed = report.failed(),
            "finished sending alert notifications"
        );

        report
    }
}
