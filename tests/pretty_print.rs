//! The JSON settings are process-wide, so this runs in its own test binary.

use jsontools::axum::routing::get;
use jsontools::config::{self, ConfigService, JsonConfig};
use jsontools::prelude::*;
use jsontools::testing::JsonClient;
use serde_json::json;

#[tokio::test]
async fn test_pretty_printed_responses() {
    let service = ConfigService::from_pairs([(JsonConfig::PRETTY_PRINT_KEY, "1")]);
    assert!(config::install(JsonConfig::from_service(&service)));
    assert!(config::json_config().pretty_print);
    // already installed
    assert!(!config::install(JsonConfig::default()));

    let app = Router::new().route("/", get(|| async { JsonApi(json!({"a": 1})) }));
    let rv = JsonClient::new(app).get("/").await.unwrap();

    assert_eq!(rv.text(), "{\n  \"a\": 1\n}");
    assert_eq!(rv.get_json(), Some(&json!({"a": 1})));
}
