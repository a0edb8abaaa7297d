use crate::fixtures::{dual_stack_node, ipv4_node, read_records, record, LABEL_KEY};
use headscale_dns::{FailurePolicy, RecordSync};
use tests::test_source::TestContainerSource;
use tests::test_ticker::{CountingTicker, ManualTicker};

#[tokio::test]
async fn sync_once_writes_sorted_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("extra-records.json");
    let source = TestContainerSource::default();
    source.start_container("c1", LABEL_KEY, "app").await;
    source.start_container("c2", LABEL_KEY, "web|api").await;

    let record_sync = RecordSync::builder(ipv4_node(), &path)
        .container_source(source.clone())
        .ticker(CountingTicker::new(0))
        .build()
        .expect("failed to build RecordSync");

    let report = record_sync.sync_once().await.expect("sync failed");

    assert_eq!(report.containers, 2);
    assert_eq!(report.subdomains, 3);
    assert_eq!(report.records, 3);
    assert_eq!(
        read_records(&path),
        vec![
            record("api.node1.ts.net", "A", "100.64.0.1"),
            record("app.node1.ts.net", "A", "100.64.0.1"),
            record("web.node1.ts.net", "A", "100.64.0.1"),
        ]
    );
}

#[tokio::test]
async fn custom_label_key_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("extra-records.json");
    let source = TestContainerSource::default();
    source.start_container("c1", LABEL_KEY, "ignored").await;
    source.start_container("c2", "dns.names", "picked").await;

    RecordSync::builder(ipv4_node(), &path)
        .container_source(source)
        .label_key("dns.names")
        .ticker(CountingTicker::new(1))
        .build()
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(
        read_records(&path),
        vec![record("picked.node1.ts.net", "A", "100.64.0.1")]
    );
}

#[tokio::test]
async fn records_follow_containers_across_passes() {
    // Steps:
    //  1. Run a pass with no container running.
    //  2. Start containers and run a pass.
    //  3. Stop one of them and run a pass.
    // What we want to test:
    //  Every pass rewrites the whole file from the containers running at that time.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("extra-records.json");
    let source = TestContainerSource::default();
    let (ticker, trigger) = ManualTicker::new();

    let record_sync = RecordSync::builder(dual_stack_node(), &path)
        .container_source(source.clone())
        .ticker(ticker)
        .build()
        .unwrap();

    let steps = {
        let path = path.clone();
        let source = source.clone();
        async move {
            trigger.pass().await;
            assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");

            source.start_container("web", LABEL_KEY, "web").await;
            source.start_container("api", LABEL_KEY, "api").await;
            trigger.pass().await;
            assert_eq!(
                read_records(&path),
                vec![
                    record("api.node1.ts.net", "A", "100.64.0.1"),
                    record("api.node1.ts.net", "AAAA", "fd7a:115c:a1e0::1"),
                    record("web.node1.ts.net", "A", "100.64.0.1"),
                    record("web.node1.ts.net", "AAAA", "fd7a:115c:a1e0::1"),
                ]
            );

            source.stop_container("api").await;
            trigger.pass().await;
            assert_eq!(
                read_records(&path),
                vec![
                    record("web.node1.ts.net", "A", "100.64.0.1"),
                    record("web.node1.ts.net", "AAAA", "fd7a:115c:a1e0::1"),
                ]
            );
        }
    };

    let (result, ()) = tokio::join!(record_sync.run(), steps);

    result.expect("sync loop failed");
    assert_eq!(source.calls().await, 3);
}

#[tokio::test]
async fn unchanged_containers_produce_identical_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("extra-records.json");
    let source = TestContainerSource::default();
    source.start_container("b", LABEL_KEY, "beta|alpha").await;
    source.start_container("a", LABEL_KEY, "gamma").await;
    let (ticker, trigger) = ManualTicker::new();

    let record_sync = RecordSync::builder(dual_stack_node(), &path)
        .container_source(source.clone())
        .ticker(ticker)
        .build()
        .unwrap();

    let steps = {
        let path = path.clone();
        async move {
            trigger.pass().await;
            let first = std::fs::read(&path).unwrap();

            // Same containers, listed in a different order.
            source.stop_container("b").await;
            source.start_container("b", LABEL_KEY, "alpha | beta").await;
            trigger.pass().await;
            let second = std::fs::read(&path).unwrap();

            assert_eq!(first, second);
        }
    };

    let (result, ()) = tokio::join!(record_sync.run(), steps);
    result.unwrap();
}

#[tokio::test]
async fn failed_pass_is_skipped_by_default() {
    // Scenario:
    // The container runtime is briefly unavailable. The previous file stays
    // in place and the next pass picks up where it left off.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("extra-records.json");
    let source = TestContainerSource::default();
    source.start_container("c1", LABEL_KEY, "app").await;
    let (ticker, trigger) = ManualTicker::new();

    let record_sync = RecordSync::builder(ipv4_node(), &path)
        .container_source(source.clone())
        .ticker(ticker)
        .build()
        .unwrap();

    let steps = {
        let path = path.clone();
        let source = source.clone();
        async move {
            trigger.pass().await;
            let before = read_records(&path);
            assert_eq!(before.len(), 1);

            source.set_failing(true).await;
            source.start_container("c2", LABEL_KEY, "web").await;
            trigger.pass().await;
            assert_eq!(read_records(&path), before);

            source.set_failing(false).await;
            trigger.pass().await;
            assert_eq!(
                read_records(&path),
                vec![
                    record("app.node1.ts.net", "A", "100.64.0.1"),
                    record("web.node1.ts.net", "A", "100.64.0.1"),
                ]
            );
        }
    };

    let (result, ()) = tokio::join!(record_sync.run(), steps);

    result.expect("skipped failures must not stop the loop");
    assert_eq!(source.calls().await, 3);
}

#[tokio::test]
async fn exit_policy_stops_on_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("extra-records.json");
    let source = TestContainerSource::default();
    source.set_failing(true).await;

    let result = RecordSync::builder(ipv4_node(), &path)
        .container_source(source.clone())
        .failure_policy(FailurePolicy::Exit)
        .ticker(CountingTicker::new(5))
        .build()
        .unwrap()
        .run()
        .await;

    let err = result.expect_err("the loop should have stopped");
    assert!(format!("{:#}", err).contains("container runtime unavailable"));
    assert_eq!(source.calls().await, 1);
    assert!(!path.exists());
}

#[tokio::test]
async fn write_failures_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing-directory").join("extra-records.json");

    let record_sync = RecordSync::builder(ipv4_node(), &path)
        .container_source(TestContainerSource::default())
        .ticker(CountingTicker::new(0))
        .build()
        .unwrap();

    let err = record_sync.sync_once().await.expect_err("write should fail");
    assert!(format!("{:#}", err).contains("failed to write DNS records file"));
}

#[tokio::test]
async fn zero_refresh_interval_is_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let result = RecordSync::builder(ipv4_node(), dir.path().join("records.json"))
        .container_source(TestContainerSource::default())
        .refresh_interval(std::time::Duration::ZERO)
        .build();

    assert!(result.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_loop_runs_on_a_spawned_task() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("extra-records.json");
    let source = TestContainerSource::default();
    source.start_container("c1", LABEL_KEY, "app").await;

    let record_sync = RecordSync::builder(ipv4_node(), &path)
        .container_source(source.clone())
        .ticker(CountingTicker::new(2))
        .build()
        .unwrap();

    tokio::spawn(record_sync.run())
        .await
        .expect("sync task panicked")
        .expect("sync loop failed");

    assert_eq!(source.calls().await, 2);
    assert_eq!(
        read_records(&path),
        vec![record("app.node1.ts.net", "A", "100.64.0.1")]
    );
}

#[tokio::test]
async fn single_pass_future_is_send() {
    fn assert_send<T: Send>(value: T) -> T {
        value
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("extra-records.json");

    let record_sync = RecordSync::builder(ipv4_node(), &path)
        .container_source(TestContainerSource::default())
        .ticker(CountingTicker::new(0))
        .build()
        .unwrap();

    let report = assert_send(record_sync.sync_once())
        .await
        .expect("sync failed");

    assert_eq!(report.records, 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
}
