//! tests/session_log_tests.rs
//! Pruebas de persistencia de logs sobre SQLite temporal.

#[cfg(test)]
mod tests {
    use actix_rt::test;

    use crate::models::session_log_model::SessionRecord;
    use crate::models::status_model::{FailedEmail, SessionState};
    use crate::services::session_log_service::SessionLogService;
    use crate::tests::support::test_log_service;

    fn record(session_id: &str, timestamp: &str) -> SessionRecord {
        SessionRecord {
            session_id: session_id.to_string(),
            timestamp: timestamp.to_string(),
            sender_email: "sender@example.com".to_string(),
            duration_seconds: 12.5,
            subject: "Hola {Name}".to_string(),
            total_emails: 4,
            sent_count: 2,
            failed_count: 2,
            success_emails: vec!["b@x.com".to_string(), "a@x.com".to_string()],
            failed_emails: vec![
                FailedEmail::new("c@x.com", "550 5.1.1: user unknown"),
                FailedEmail::new("", "invalid address"),
            ],
            filename: "list.csv".to_string(),
            outcome: SessionState::Completed,
            abort_reason: None,
            cc_emails: vec!["boss@x.com".to_string()],
            bcc_emails: vec![],
            attachment_names: vec!["promo.pdf".to_string()],
        }
    }

    #[test]
    async fn test_commit_and_get_full_record() {
        let (service, _dir) = test_log_service().await;
        let original = record("s1", "2025-01-10T10:00:00+00:00");

        let id = service.commit(&original).await.expect("commit failed");
        let stored = service
            .get_log(&id)
            .await
            .expect("query failed")
            .expect("record should exist");

        assert_eq!(stored.id, id);
        // el orden de las listas y el ':' dentro del error se conservan
        assert_eq!(stored.record, original);
    }

    #[test]
    async fn test_aborted_record_keeps_reason() {
        let (service, _dir) = test_log_service().await;
        let mut aborted = record("s1", "2025-01-10T10:00:00+00:00");
        aborted.outcome = SessionState::Aborted;
        aborted.abort_reason = Some("authentication failed: 535".to_string());

        let id = service.commit(&aborted).await.unwrap();
        let stored = service.get_log(&id).await.unwrap().unwrap();
        assert_eq!(stored.record.outcome, SessionState::Aborted);
        assert_eq!(
            stored.record.abort_reason.as_deref(),
            Some("authentication failed: 535")
        );
    }

    #[test]
    async fn test_every_commit_gets_its_own_id() {
        let (service, _dir) = test_log_service().await;
        let r = record("s1", "2025-01-10T10:00:00+00:00");
        let a = service.commit(&r).await.unwrap();
        let b = service.commit(&r).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(service.list_logs(1, 10).await.unwrap().total, 2);
    }

    #[test]
    async fn test_list_most_recent_first_with_pages() {
        let (service, _dir) = test_log_service().await;
        service
            .commit(&record("first", "2025-01-10T10:00:00+00:00"))
            .await
            .unwrap();
        service
            .commit(&record("third", "2025-01-12T10:00:00+00:00"))
            .await
            .unwrap();
        service
            .commit(&record("second", "2025-01-11T10:00:00+00:00"))
            .await
            .unwrap();

        let page1 = service.list_logs(1, 2).await.unwrap();
        assert_eq!(page1.total, 3);
        let ids: Vec<_> = page1.items.iter().map(|i| i.session_id.as_str()).collect();
        assert_eq!(ids, vec!["third", "second"]);
        assert_eq!(page1.items[0].outcome, "completed");
        assert_eq!(page1.items[0].sent_count, 2);

        let page2 = service.list_logs(2, 2).await.unwrap();
        assert_eq!(page2.items.len(), 1);
        assert_eq!(page2.items[0].session_id, "first");

        // página 0 se trata como 1
        assert_eq!(service.list_logs(0, 2).await.unwrap().page, 1);
    }

    #[test]
    async fn test_page_size_is_clamped() {
        let (base, dir) = test_log_service().await;
        for i in 0..4 {
            base.commit(&record(&format!("s{i}"), "2025-01-10T10:00:00+00:00"))
                .await
                .unwrap();
        }
        let pool = SessionLogService::connect(&dir.path().join("logs.db"))
            .await
            .unwrap();
        let service = SessionLogService::new(pool, 3);

        let list = service.list_logs(1, 500).await.unwrap();
        assert_eq!(list.page_size, 3);
        assert_eq!(list.items.len(), 3);
        assert_eq!(service.list_logs(1, 0).await.unwrap().page_size, 1);
    }

    #[test]
    async fn test_page_past_the_end_is_empty() {
        let (service, _dir) = test_log_service().await;
        service
            .commit(&record("s1", "2025-01-10T10:00:00+00:00"))
            .await
            .unwrap();

        let past = service.list_logs(5, 10).await.unwrap();
        assert_eq!(past.total, 1);
        assert!(past.items.is_empty());

        // (page - 1) * page_size no cabe en u64
        let huge = service.list_logs(u64::MAX, 10).await.unwrap();
        assert_eq!(huge.page, u64::MAX);
        assert_eq!(huge.total, 1);
        assert!(huge.items.is_empty());

        // cabe en u64 pero no en i64
        let wide = service.list_logs(u64::MAX / 20, 10).await.unwrap();
        assert!(wide.items.is_empty());
    }

    #[test]
    async fn test_unknown_id_is_none() {
        let (service, _dir) = test_log_service().await;
        assert!(service.get_log("does-not-exist").await.unwrap().is_none());
    }
}
