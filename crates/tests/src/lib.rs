//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Contract snapshot tests
//! - Mailbox → dispatcher e2e runs (in-memory store, no server)
//! - Capture handler under the dispatcher's retry loop

#[cfg(test)]
mod contract_tests {
    use chrono::NaiveDate;
    use contracts::{DetectionEvent, EventType};

    #[test]
    fn test_event_json_shape() {
        let event = DetectionEvent::new(
            EventType::LineCrossing,
            vec![1, 2],
            NaiveDate::from_ymd_opt(2022, 1, 15)
                .unwrap()
                .and_hms_opt(19, 37, 36)
                .unwrap(),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "event_type": "line_crossing",
                "camera_ids": [1, 2],
                "occurred_at": "2022-01-15T19:37:36"
            })
        );
    }

    #[test]
    fn test_default_dispatch_settings_become_bounded_policy() {
        let settings = contracts::DispatchSettings::default();
        let config = dispatcher::DispatcherConfig::from(&settings);
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.retry.max_rounds, Some(10));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use contracts::{handler_fn, DetectionEvent, EventSource, EventType};
    use dispatcher::{BatchDispatcher, DispatcherConfig, RetryPolicy};
    use mailbox::{MailboxEventSource, MemoryMailStore, MockEventSource, SearchFilter};

    const SENDER: &str = "dvr@example.com";
    const PROCESSED: &str = "INBOX/processed";

    fn alert(event_type: &str, time: &str, cameras: &str) -> String {
        format!(
            "This is an automatically generated e-mail from your DVR.\r\n\r\n\
             EVENT TYPE:       {event_type}\r\n\
             EVENT TIME:       {time}\r\n\
             DVR NAME:         Embedded Net DVR\r\n\
             CAMERA NAME(NUM): {cameras}\r\n"
        )
    }

    fn source_with(bodies: &[String]) -> MailboxEventSource<MemoryMailStore> {
        let store = MemoryMailStore::new("INBOX");
        for body in bodies {
            store.deliver(SENDER, "Alarm Event", body);
        }
        let filter = SearchFilter {
            sender: SENDER.to_string(),
            subject: "Alarm".to_string(),
            unseen_only: true,
        };
        MailboxEventSource::new(store, filter, Some(PROCESSED.to_string()))
    }

    /// Fails the first attempt of every event matching `fails_once`
    fn flaky_handler(
        fails_once: impl Fn(&DetectionEvent) -> bool + Send + Sync + 'static,
    ) -> (
        Arc<impl contracts::CaptureHandler + Sync + 'static>,
        Arc<Mutex<Vec<DetectionEvent>>>,
    ) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = Mutex::new(HashSet::new());
        let recorded = Arc::clone(&calls);
        let handler = handler_fn(move |event: &DetectionEvent| {
            recorded.lock().unwrap().push(event.clone());
            if !fails_once(event) {
                return true;
            }
            // Second and later attempts succeed.
            !seen.lock().unwrap().insert(event.to_string())
        });
        (Arc::new(handler), calls)
    }

    /// End-to-end: alert emails → MailboxEventSource → BatchDispatcher
    ///
    /// Intrusion captures fail once; the batch settles in two rounds and
    /// every fetched email ends up in the processed folder.
    #[tokio::test]
    async fn test_e2e_mailbox_dispatch_with_retry() {
        let mut source = source_with(&[
            alert("Motion Detected", "2022-01-15,19:30:57", "Camera 01(D1)"),
            alert("Motion Detected", "2022-01-15,19:37:36", "Camera 02(D2)"),
            alert("intrusion", "2022-01-15,19:37:30", "Camera 01(D1)"),
            alert(
                "Motion Detected",
                "2022-01-15,19:30:49",
                "Camera 01(D1), Camera 02(D2)",
            ),
            alert("intrusion", "2022-01-15,19:38:02", "Camera 02(D2)"),
        ]);

        let events = source.poll_events().await.unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(source.store().uids_in(PROCESSED).len(), 5);

        let (handler, calls) = flaky_handler(|e| e.event_type == EventType::Intrusion);
        let dispatcher = BatchDispatcher::new(DispatcherConfig {
            max_workers: 2,
            retry: RetryPolicy::bounded(5),
        })
        .unwrap();

        let report = dispatcher.dispatch(events.clone(), handler).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.rounds, 2);
        assert_eq!(
            report.round_statuses,
            vec![vec![true, true, false, true, false], vec![true, true]]
        );
        assert_eq!(report.attempts, 7);

        let calls = calls.lock().unwrap();
        let intrusion_calls = calls
            .iter()
            .filter(|e| e.event_type == EventType::Intrusion)
            .count();
        assert_eq!(intrusion_calls, 4);
        assert_eq!(calls.len(), 7);

        // Everything was archived, the next poll is empty.
        assert!(source.poll_events().await.unwrap().is_empty());
    }

    /// Unparseable emails are skipped but still archived
    #[tokio::test]
    async fn test_e2e_bad_email_does_not_block_batch() {
        let mut source = source_with(&[
            "Your DVR disk is almost full.".to_string(),
            alert("line crossing", "2022-01-15,19:37:36", "Camera 03(D3)"),
        ]);

        let events = source.poll_events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].camera_ids, vec![3]);
        assert!(source.store().uids_in("INBOX").is_empty());

        let report = dispatcher::dispatch(
            events,
            Arc::new(handler_fn(|_: &DetectionEvent| true)),
            1,
        )
        .await
        .unwrap();
        assert_eq!(report.rounds, 1);
        assert_eq!(report.succeeded, 1);
    }

    /// Mock source batches under a bounded policy: events on camera 0 never
    /// capture and are reported unresolved, everything else succeeds.
    #[tokio::test]
    async fn test_e2e_mock_source_bounded_retries() {
        let mut source = MockEventSource::with_seed(11);
        let dispatcher = BatchDispatcher::new(DispatcherConfig {
            max_workers: 3,
            retry: RetryPolicy::bounded(3),
        })
        .unwrap();
        let handler = Arc::new(handler_fn(|e: &DetectionEvent| !e.camera_ids.contains(&0)));

        for _ in 0..10 {
            let events = source.poll_events().await.unwrap();
            let doomed: Vec<_> = events
                .iter()
                .filter(|e| e.camera_ids.contains(&0))
                .cloned()
                .collect();

            let report = dispatcher
                .dispatch(events.clone(), Arc::clone(&handler))
                .await
                .unwrap();

            assert_eq!(report.unresolved, doomed);
            assert_eq!(report.succeeded, events.len() - doomed.len());
            if events.is_empty() {
                assert_eq!(report.rounds, 0);
            } else if doomed.is_empty() {
                assert_eq!(report.rounds, 1);
            } else {
                assert_eq!(report.rounds, 3);
            }
        }
    }

    /// The ffmpeg handler under the retry loop: without a usable ffmpeg
    /// binary every camera capture fails, while an event without cameras
    /// has nothing to capture and succeeds.
    #[tokio::test]
    async fn test_e2e_capture_handler_without_ffmpeg() {
        use capture::{CaptureSettings, DvrEndpoint, FfmpegCaptureHandler};

        let storage = tempfile::tempdir().unwrap();
        let handler = FfmpegCaptureHandler::new(
            DvrEndpoint {
                host: "127.0.0.1".into(),
                port: 554,
                username: "admin".into(),
                password: "secret".into(),
            },
            CaptureSettings {
                storage: storage.path().to_path_buf(),
                clip_length: Duration::from_secs(1),
                grace: Duration::from_secs(1),
                ffmpeg_path: "/nonexistent/ffmpeg".into(),
            },
        );

        let at = chrono::NaiveDate::from_ymd_opt(2022, 1, 15)
            .unwrap()
            .and_hms_opt(19, 30, 57)
            .unwrap();
        let events = vec![
            DetectionEvent::new(EventType::Motion, vec![1], at),
            DetectionEvent::new(EventType::Misc, vec![], at),
        ];

        let dispatcher = BatchDispatcher::new(DispatcherConfig {
            max_workers: 2,
            retry: RetryPolicy::bounded(2),
        })
        .unwrap();
        let report = dispatcher
            .dispatch(events.clone(), Arc::new(handler))
            .await
            .unwrap();

        assert_eq!(report.round_statuses, vec![vec![false, true], vec![false]]);
        assert_eq!(report.unresolved, vec![events[0].clone()]);
        // The month directory is prepared before ffmpeg is started.
        assert!(storage.path().join("2022-01").is_dir());
    }

    /// Config file → dispatcher settings
    #[test]
    fn test_config_drives_dispatcher() {
        let config = config_loader::ConfigLoader::load_from_str(
            r#"
[imap]
server = "imap.example.com"
username = "alerts@example.com"
processed_folder = "processed"

[cctv_alerts]
email_sender = "dvr@example.com"

[dvr]
host = "192.168.1.64"

[stream_capture]
storage_location = "/tmp/cctv"

[dispatch]
max_workers = 3

[dispatch.retry]
max_rounds = 0
initial_backoff_ms = 100
"#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        let dispatcher = BatchDispatcher::new(DispatcherConfig::from(&config.dispatch)).unwrap();
        assert_eq!(dispatcher.config().max_workers, 3);
        assert_eq!(dispatcher.config().retry.max_rounds, None);
        assert_eq!(
            dispatcher.config().retry.backoff_for(2),
            Duration::from_millis(200)
        );

        let source = MailboxEventSource::from_config(MemoryMailStore::new("INBOX"), &config);
        assert_eq!(source.name(), "memory:INBOX");
    }
}
