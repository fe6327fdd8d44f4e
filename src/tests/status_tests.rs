//! tests/status_tests.rs
//! Pruebas del StatusStore en aislamiento.

#[cfg(test)]
mod tests {
    use actix_rt::test;

    use crate::models::status_model::{FailedEmail, SessionState, StatusSummary};
    use crate::services::status_service::StatusStore;

    #[test]
    async fn test_skipped_row_clears_current_email() {
        let store = StatusStore::new();
        store
            .begin("s1", "sender@example.com", 3, "2025-01-10T10:00:00+00:00")
            .await
            .unwrap();

        store.publish_current("a@x.com").await;
        store.record_success("a@x.com").await;
        store.record_skipped(FailedEmail::new("", "invalid address")).await;

        let status = store.read().await;
        assert_eq!(status.current_email, "");
        assert_eq!(status.failed_count, 1);
        assert_eq!(status.sent_count, 1);
        assert_eq!(status.failed_emails, vec![FailedEmail::new("", "invalid address")]);
    }

    #[test]
    async fn test_summary_matches_counters() {
        let store = StatusStore::new();
        store
            .begin("s1", "sender@example.com", 2, "2025-01-10T10:00:00+00:00")
            .await
            .unwrap();
        store.publish_current("a@x.com").await;
        store.record_success("a@x.com").await;
        store
            .record_failure(FailedEmail::new("b@x.com", "mailbox full"))
            .await;
        store.finish(SessionState::Completed, None).await;

        let summary = store.summary().await;
        assert_eq!(summary, StatusSummary::from(&store.read().await));
        assert_eq!(summary.state, SessionState::Completed);
        assert_eq!(summary.sent_count, 1);
        assert_eq!(summary.failed_count, 1);
        assert!(!summary.is_sending);

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("failed_emails").is_none());
        assert_eq!(json["session_id"], "s1");
    }
}
