use std::path::Path;

use ludwigia::clock::Interval;
use ludwigia::input::Stitcher;
use ludwigia::service::skye_v1::{Outcome, Payload, Query, Response, Skye};
use ludwigia::source::{replay::Replay, DataSource};

#[tokio::test]
async fn test_that_skye_works() {
    let fixtures = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data"));
    let stitcher = Stitcher::new(
        DataSource::Replay(Replay::new(fixtures, "av")),
        DataSource::Replay(Replay::new(fixtures, "fh")),
    );
    let skye = Skye::new(
        stitcher,
        Interval::ThirtyMin,
        std::env::temp_dir().join("skye_integration.csv"),
    );
    skye.init(&["ACME".to_string()]).await.unwrap();

    let query = Query::new("data", Some("2021-06-01-10:00".to_string()));
    let blob = skye.process(&serde_json::to_vec(&query).unwrap()).await;
    let response: Response = serde_json::from_slice(&blob).unwrap();

    assert_eq!(response.result, Outcome::Success);
    match response.payload {
        Payload::Table(table) => {
            assert_eq!(table.ticker, vec!["ACME".to_string()]);
            assert_eq!(table.price, vec![101.0]);
        }
        other => panic!("expected table payload, got {other:?}"),
    }
}
