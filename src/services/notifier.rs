// SPDX-License-Identifier: MIT

//! Outbound notification events via Cloud Tasks.
//!
//! The engine never delivers notifications itself; it queues an event
//! for the external dispatcher and moves on. Events are queued only
//! after the originating mutation has committed, and queue failures are
//! logged rather than surfaced as failure of the primary operation.
//!
//! Uses the official google-cloud-tasks-v2 SDK.

use crate::config::NOTIFICATION_QUEUE_NAME;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Event kind tag carried to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ChallengeInvite,
    RecognitionReceived,
}

/// Payload sent to the notification dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub recipient_user_id: String,
    pub actor_user_id: String,
    pub kind: NotificationKind,
    pub message: String,
    /// Deep-link reference into the app (e.g. "challenge/{id}")
    pub link: String,
}

/// Cloud Tasks client wrapper for the notification queue.
pub struct NotifierService {
    project_id: String,
    location: String,
    queue_name: String,
    /// Mock: recipient IDs that should fail when queued (test builds only).
    #[cfg(test)]
    mock_fail_recipients: std::sync::Mutex<std::collections::HashSet<String>>,
}

impl NotifierService {
    pub fn new(project_id: &str, region: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            location: region.to_string(),
            queue_name: NOTIFICATION_QUEUE_NAME.to_string(),
            #[cfg(test)]
            mock_fail_recipients: std::sync::Mutex::new(std::collections::HashSet::new()),
        }
    }

    /// Set recipient IDs that should fail when queued (test builds only).
    #[cfg(test)]
    pub fn set_mock_fail_recipients(&self, ids: impl IntoIterator<Item = String>) {
        let mut guard = self.mock_fail_recipients.lock().unwrap();
        guard.clear();
        guard.extend(ids);
    }

    /// Queue a single notification event.
    pub async fn queue_event(&self, dispatcher_url: &str, event: NotificationEvent) -> Result<()> {
        #[cfg(test)]
        {
            let should_fail = self
                .mock_fail_recipients
                .lock()
                .unwrap()
                .contains(&event.recipient_user_id);
            if should_fail {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "Mock notification failure"
                )));
            }
        }

        self.queue_task(dispatcher_url, "/events/notify", &event)
            .await
    }

    /// Queue a batch of events, logging failures individually.
    ///
    /// Returns the number of events successfully queued. Used after a
    /// committed mutation, where a lost notification is acceptable but a
    /// failed mutation is not.
    pub async fn queue_events_best_effort(
        &self,
        dispatcher_url: &str,
        events: Vec<NotificationEvent>,
    ) -> u32 {
        let mut queued = 0u32;
        for event in events {
            let recipient = event.recipient_user_id.clone();
            let kind = event.kind;
            match self.queue_event(dispatcher_url, event).await {
                Ok(()) => queued += 1,
                Err(e) => {
                    tracing::warn!(
                        recipient = %recipient,
                        kind = ?kind,
                        error = %e,
                        "Failed to queue notification event"
                    );
                }
            }
        }
        queued
    }

    /// Generic task queuing helper.
    async fn queue_task<T: Serialize>(
        &self,
        dispatcher_url: &str,
        endpoint: &str,
        payload: &T,
    ) -> Result<()> {
        use google_cloud_tasks_v2::client::CloudTasks;
        use google_cloud_tasks_v2::model::{HttpRequest, OidcToken, Task};

        let client = CloudTasks::builder()
            .build()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Cloud Tasks client error: {}", e)))?;

        let queue_path = format!(
            "projects/{}/locations/{}/queues/{}",
            self.project_id, self.location, self.queue_name
        );

        let body = serde_json::to_vec(payload)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JSON error: {}", e)))?;

        let http_request = HttpRequest::default()
            .set_url(format!("{}{}", dispatcher_url, endpoint))
            .set_http_method("POST")
            .set_body(axum::body::Bytes::from(body))
            .set_headers(std::collections::HashMap::from([(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )]))
            .set_oidc_token(
                OidcToken::default()
                    .set_service_account_email(format!(
                        "teampulse-api@{}.iam.gserviceaccount.com",
                        self.project_id
                    ))
                    .set_audience(dispatcher_url.to_string()),
            );

        let task = Task::default().set_http_request(http_request);

        let _response = client
            .create_task()
            .set_parent(queue_path)
            .set_task(task)
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Cloud Tasks create error: {}", e)))?;

        Ok(())
    }
}
