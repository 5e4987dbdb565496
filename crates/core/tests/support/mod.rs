// Shared fixtures for integration tests: an in-memory snapshot driver, an
// HTTP driver with a cookie store, and an axum test application.
//
// Not every test binary uses every fixture.
#![allow(dead_code)]

pub mod app;
pub mod form_state;
pub mod http_driver;

pub use app::TestApp;
pub use http_driver::HttpDriver;
pub use static_driver::StaticDriver;

use serde_json::Value;

/// Installs a compact stderr subscriber so `RUST_LOG=marmot=debug` shows
/// engine activity during a test run. Safe to call from every test.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .compact()
        .try_init();
}

/// Extracts the JSON payload the test app renders into `<pre id="results">`.
pub fn extract_results(body: &str) -> Value {
    let doc = scraper::Html::parse_document(body);
    let selector = scraper::Selector::parse("pre#results").unwrap();
    let pre = doc
        .select(&selector)
        .next()
        .expect("response has no #results element");
    let text: String = pre.text().collect();
    serde_json::from_str(text.trim()).expect("results payload is not valid JSON")
}
