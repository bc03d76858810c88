//! Integration test: enumeration across several pages.

use tickler_integration_tests::SimulatedCluster;
use tickler_repair::{ConsoleReporter, QueryOptions, RepairOptions, RepairRun};
use tickler_types::KeyValue;

fn cluster_with(count: i32) -> SimulatedCluster {
    let c = SimulatedCluster::int_keyed("metrics", "samples");
    for id in 0..count {
        c.write(vec![KeyValue::Int(id)], "x");
    }
    c
}

/// 2500 partitions: three pages, two progress lines, every key once.
#[tokio::test]
async fn test_progress_lines_across_pages() {
    let c = cluster_with(2500);
    let mut reporter = ConsoleReporter::new(Vec::new());

    let summary = RepairRun::new(&c, "metrics", "samples", RepairOptions::default())
        .execute(&mut reporter)
        .await
        .unwrap();

    assert_eq!(summary.row_count, 2500);
    assert_eq!(c.pages().len(), 3);
    assert_eq!(
        String::from_utf8(reporter.into_inner()).unwrap(),
        "1000\n2000\nRepair of table samples complete\n2500 rows read and repaired\n"
    );

    let mut repaired: Vec<i32> = c
        .executions()
        .iter()
        .map(|e| match e.values.as_slice() {
            [KeyValue::Int(id)] => *id,
            other => panic!("unexpected bind values {other:?}"),
        })
        .collect();
    repaired.sort_unstable();
    assert_eq!(repaired, (0..2500).collect::<Vec<_>>());
}

/// A page size that divides the table exactly still terminates.
#[tokio::test]
async fn test_exact_multiple_of_page_size() {
    let c = cluster_with(30);
    let mut reporter = ConsoleReporter::new(Vec::new());
    let options = RepairOptions {
        queries: QueryOptions {
            page_size: 10,
            ..QueryOptions::default()
        },
        ..RepairOptions::default()
    };

    let summary = RepairRun::new(&c, "metrics", "samples", options)
        .execute(&mut reporter)
        .await
        .unwrap();

    assert_eq!(summary.row_count, 30);
    assert_eq!(c.executions().len(), 30);
    assert_eq!(c.pages().len(), 3);
    assert!(c.pages().iter().all(|p| p.page_size == Some(10)));
}

/// Enumeration at LOCAL_QUORUM tolerates one replica being down.
#[tokio::test]
async fn test_enumeration_survives_one_replica_down() {
    let c = cluster_with(5);
    c.take_down(2);

    let mut reporter = ConsoleReporter::new(Vec::new());
    let err = RepairRun::new(&c, "metrics", "samples", RepairOptions::default())
        .execute(&mut reporter)
        .await
        .unwrap_err();

    // Enumeration worked; the first ALL read could not be satisfied.
    assert_eq!(c.pages().len(), 1);
    assert_eq!(c.executions().len(), 1);
    assert!(err.to_string().contains("required 3, alive 2"), "got {err}");
}
