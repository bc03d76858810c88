//! Integration test: a replica goes down mid-run.
//!
//! A read at ALL needs every replica, so losing one fails the repair of the
//! partition being read.

use std::time::Duration;

use tickler_integration_tests::SimulatedCluster;
use tickler_repair::{
    ConsoleReporter, FailurePolicy, ProgressReporter, RepairError, RepairOptions, RepairRun,
    SessionError,
};
use tickler_types::{Consistency, KeyValue, PartitionKeyTuple};

fn cluster_with(ids: &[i32]) -> SimulatedCluster {
    let c = SimulatedCluster::int_keyed("shop", "orders");
    for &id in ids {
        c.write(vec![KeyValue::Int(id)], "v");
    }
    c
}

fn key(id: i32) -> PartitionKeyTuple {
    PartitionKeyTuple::new(vec![("id".to_string(), KeyValue::Int(id))])
}

/// Default policy: the run aborts on the second partition and the third is
/// never attempted.
#[tokio::test(start_paused = true)]
async fn test_abort_on_replica_loss() {
    let c = cluster_with(&[1, 2, 3]);
    c.take_down_before_execution(2, 1);
    let mut reporter = ConsoleReporter::new(Vec::new());
    let options = RepairOptions {
        delay: Duration::from_millis(100),
        ..RepairOptions::default()
    };

    let err = RepairRun::new(&c, "shop", "orders", options)
        .execute(&mut reporter)
        .await
        .unwrap_err();

    match err {
        RepairError::RepairFailed {
            partition_key,
            source,
        } => {
            assert_eq!(partition_key, key(2));
            match source {
                SessionError::Unavailable {
                    consistency,
                    required,
                    alive,
                } => {
                    assert_eq!(consistency, Consistency::All);
                    assert_eq!(required, 3);
                    assert_eq!(alive, 2);
                }
                other => panic!("unexpected session error: {other:?}"),
            }
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(c.executions().len(), 2);
    // No completion summary after a failed run.
    assert!(reporter.into_inner().is_empty());
}

/// Once the replica is back, a fresh run repairs everything from the start.
#[tokio::test]
async fn test_restart_after_recovery() {
    let c = cluster_with(&[1, 2, 3]);
    c.take_down_before_execution(2, 1);

    let mut reporter = ConsoleReporter::new(Vec::new());
    assert!(
        RepairRun::new(&c, "shop", "orders", RepairOptions::default())
            .execute(&mut reporter)
            .await
            .is_err()
    );

    c.bring_up(1);
    let mut reporter = ConsoleReporter::new(Vec::new());
    let summary = RepairRun::new(&c, "shop", "orders", RepairOptions::default())
        .execute(&mut reporter)
        .await
        .unwrap();

    assert_eq!(summary.row_count, 3);
    let values: Vec<Vec<KeyValue>> = c.executions()[2..].iter().map(|e| e.values.clone()).collect();
    assert_eq!(
        values,
        vec![
            vec![KeyValue::Int(1)],
            vec![KeyValue::Int(2)],
            vec![KeyValue::Int(3)]
        ]
    );
}

/// Continue policy: the failed partition is listed and the rest are repaired.
#[tokio::test]
async fn test_continue_policy_lists_failed_partitions() {
    let c = cluster_with(&[1, 2, 3]);
    c.take_down_before_execution(2, 1);
    let options = RepairOptions {
        on_failure: FailurePolicy::Continue,
        ..RepairOptions::default()
    };

    // Brings the replica back after the failed read, so the outage covers
    // exactly one partition.
    struct BringBack<'a>(&'a SimulatedCluster, ConsoleReporter<Vec<u8>>);
    impl ProgressReporter for BringBack<'_> {
        fn on_tuple_processed(&mut self, row_count: u64) {
            self.1.on_tuple_processed(row_count);
        }
        fn on_partition_failed(&mut self, partition_key: &PartitionKeyTuple, error: &RepairError) {
            self.1.on_partition_failed(partition_key, error);
            self.0.bring_up(1);
        }
        fn on_completion(&mut self, table: &str, row_count: u64) {
            self.1.on_completion(table, row_count);
        }
        fn on_failures(&mut self, failed: &[PartitionKeyTuple]) {
            self.1.on_failures(failed);
        }
    }

    let mut reporter = BringBack(&c, ConsoleReporter::new(Vec::new()));
    let summary = RepairRun::new(&c, "shop", "orders", options)
        .execute(&mut reporter)
        .await
        .unwrap();

    assert_eq!(summary.row_count, 3);
    assert_eq!(summary.failed, vec![key(2)]);
    assert!(!summary.is_complete());
    assert_eq!(c.executions().len(), 3);
    assert_eq!(
        String::from_utf8(reporter.1.into_inner()).unwrap(),
        "Repair of table orders complete\n3 rows read and repaired\n\
         1 partitions could not be repaired:\n  (id=2)\n"
    );
}
