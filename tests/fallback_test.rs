mod common;

use assert_cmd::prelude::*;
use common::{paywatch, serve_status};
use httpmock::prelude::*;
use predicates::prelude::*;

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let server = MockServer::start();

    paywatch(&server)
        .args(["--db-path", "some_db", "payment-error", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No payment error for 7"))
        .stderr(predicate::str::contains(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage.",
        ));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let server = MockServer::start();
    serve_status(&server, "7", "Success");
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    paywatch(&server)
        .arg("--db-path")
        .arg(&db_path)
        .args(["watch", "--order", "7"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Falling back").not());
}

#[test]
fn test_in_memory_errors_do_not_outlive_the_process() {
    let server = MockServer::start();
    serve_status(&server, "8", "Expired");

    paywatch(&server)
        .args(["watch", "--order", "8"])
        .assert()
        .success();

    paywatch(&server)
        .args(["payment-error", "8"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No payment error for 8"));
}
