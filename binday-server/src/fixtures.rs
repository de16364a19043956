//! Canned council pages for handler and command tests.

use std::sync::Arc;

use binday_core::service::BindayService;
use binday_provider_belfast::{BelfastConfig, plugin};
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LANDING: &str = r#"<form id="form1" action="./lookup">
    <input type="hidden" name="__VIEWSTATE" value="vs1">
    <input type="text" name="ctl00$MainContent$Postcode_textbox"></form>"#;
const ADDRESSES: &str = r#"<form id="form1" action="./lookup">
    <input type="hidden" name="__VIEWSTATE" value="vs2">
    <select id="lstAddresses" name="ctl00$MainContent$lstAddresses">
      <option value="1">1 TEST STREET, BELFAST</option>
      <option value="2">2 TEST STREET, BELFAST</option>
    </select></form>"#;
const RESULTS: &str = r#"<div id="BinDetailsPnl"><p>2 TEST STREET, BELFAST</p><table>
    <tr><td>Recycling bin</td><td>Monday</td><td>Fortnightly</td><td>Mon Sep 8 2025</td></tr>
    <tr><td>General waste bin</td><td>Monday</td><td>Fortnightly</td><td>Mon Sep 1 2025</td></tr>
    </table></div>"#;

fn page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(body)
}

/// A council that answers the postcode flow and ends on a results panel.
pub(crate) async fn council() -> MockServer {
    council_ending_on(RESULTS).await
}

/// A council that answers the postcode flow and ends on `results`.
pub(crate) async fn council_ending_on(results: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(page(LANDING))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("AddressLookup_button"))
        .respond_with(page(ADDRESSES))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("SelectAddress_button"))
        .respond_with(page(results))
        .mount(&server)
        .await;
    server
}

/// A council whose lookup page has no form.
pub(crate) async fn council_down() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(page("<p>down for maintenance</p>"))
        .mount(&server)
        .await;
    server
}

pub(crate) fn service(server: &MockServer) -> Arc<BindayService> {
    let config = BelfastConfig {
        base_url: format!("{}/lookup", server.uri()),
        ..BelfastConfig::default()
    };
    Arc::new(BindayService::new(plugin(config)))
}
