//! Integration test against a real bucket.
//!
//! Requires AWS credentials and `CHATMETRIC_TEST_BUCKET` in the environment.
//!
//! Run with: `cargo test -p chatmetric-storage --test s3_roundtrip -- --ignored`

use chatmetric_core::locations::S3Location;
use chatmetric_core::models::message::Role;
use chatmetric_core::models::session::{ChatTurn, ScoredSession};
use chatmetric_storage::client::build_default_client;
use chatmetric_storage::objects;
use chatmetric_storage::records::{RecordSource, S3RecordSource};
use chatmetric_storage::sink::{ResultSink, S3ParquetSink};

fn test_bucket() -> String {
    std::env::var("CHATMETRIC_TEST_BUCKET").expect("CHATMETRIC_TEST_BUCKET must be set")
}

#[tokio::test]
#[ignore]
async fn reads_session_objects_under_prefix() {
    let client = build_default_client().await;
    let bucket = test_bucket();
    let location = S3Location::new(bucket.clone(), "chatmetric-test/raw/acme/");

    objects::put_object(
        &client,
        &bucket,
        "chatmetric-test/raw/acme/session-1.json",
        br#"{"question_id":"q1","role":"user","content":"hello","timestamp":1}"#.to_vec(),
        "application/json",
    )
    .await
    .unwrap();

    let records = S3RecordSource::new(client)
        .read_records(&location)
        .await
        .unwrap();
    assert!(records.iter().any(|r| r.session_id == "session-1"));
}

#[tokio::test]
#[ignore]
async fn overwrite_leaves_only_the_new_results() {
    let client = build_default_client().await;
    let bucket = test_bucket();
    let location = S3Location::new(bucket.clone(), "chatmetric-test/scored/acme/");

    objects::put_object(
        &client,
        &bucket,
        "chatmetric-test/scored/acme/old-part.parquet",
        b"stale".to_vec(),
        "application/octet-stream",
    )
    .await
    .unwrap();

    let sessions = vec![ScoredSession {
        session_id: "session-1".to_string(),
        chat: vec![ChatTurn {
            role: Role::User,
            content: "hello".to_string(),
        }],
        score: 2,
    }];
    let receipt = S3ParquetSink::new(client.clone())
        .write_results(&location, &sessions)
        .await
        .unwrap();
    assert_eq!(receipt.rows, 1);

    let keys: Vec<String> = objects::list_objects(&client, &bucket, &location.prefix)
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.key)
        .collect();
    assert_eq!(keys, vec![location.results_key()]);
}
