// Axum test application the HTTP driver navigates against.
//
// Bound to an ephemeral port per test; `shutdown` aborts the serve task.

use axum::Router;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub struct TestApp {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestApp {
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/", get(home))
            .route("/with_html", get(with_html))
            .route("/with_html_entities", get(with_html_entities))
            .route("/set_cookie", get(set_cookie))
            .route("/get_cookie", get(get_cookie))
            .route("/error", get(error_page))
            .route("/form", get(form).post(submit_form));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test app");
        let addr = listener.local_addr().expect("test app addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test app serve");
        });
        Self { addr, handle }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

async fn home() -> Html<&'static str> {
    Html(
        "<html><body><h1>Hello world!</h1>\
         <a href='/with_html'>Second page</a></body></html>",
    )
}

async fn with_html() -> Html<&'static str> {
    Html(
        "<html><body><h1>This is a test</h1>\
         <div id='first'><p>Lorem ipsum dolor</p></div>\
         <div id='second'><a href='/'>Back home</a></div>\
         </body></html>",
    )
}

async fn with_html_entities() -> Html<&'static str> {
    Html(
        "<html><body><p>Les caf&eacute;s &copy; 2011 &mdash; tous &amp; chacun</p>\
         </body></html>",
    )
}

async fn set_cookie() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, "marmot=test_cookie; Path=/")],
        Html("<html><body>Cookie set to test_cookie</body></html>"),
    )
}

async fn get_cookie(headers: HeaderMap) -> Html<String> {
    let value = headers
        .get(header::COOKIE)
        .and_then(|raw| raw.to_str().ok())
        .and_then(|raw| {
            raw.split(';')
                .filter_map(|pair| pair.trim().split_once('='))
                .find(|(name, _)| *name == "marmot")
                .map(|(_, value)| value.to_string())
        })
        .unwrap_or_default();
    Html(format!(
        "<html><body><pre id='cookie'>{value}</pre></body></html>"
    ))
}

async fn error_page() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "TestAppError: boom")
}

async fn form() -> Html<&'static str> {
    Html(
        "<html><body><form action='/form' method='post'>\
         <fieldset>\
         <label for='address1_city'>City</label>\
         <input type='text' id='address1_city' name='addresses[][city]'/>\
         <label for='address1_street'>Street</label>\
         <input type='text' id='address1_street' name='addresses[][street]'/>\
         <label for='address1_country'>Country</label>\
         <select id='address1_country' name='addresses[][country]'>\
         <option></option><option>France</option><option>Ukraine</option>\
         </select>\
         </fieldset>\
         <fieldset>\
         <label for='address2_city'>City</label>\
         <input type='text' id='address2_city' name='addresses[][city]'/>\
         <label for='address2_street'>Street</label>\
         <input type='text' id='address2_street' name='addresses[][street]'/>\
         <label for='address2_country'>Country</label>\
         <select id='address2_country' name='addresses[][country]'>\
         <option></option><option>France</option><option>Ukraine</option>\
         </select>\
         </fieldset>\
         <button type='submit' name='form_button' value='awesome'>awesome</button>\
         </form></body></html>",
    )
}

/// Echoes the submitted form back as JSON, grouping repeated
/// `addresses[][...]` fields into records in submission order — a new
/// record starts whenever a field name repeats within the current one.
async fn submit_form(body: String) -> Html<String> {
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(body.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut addresses: Vec<BTreeMap<String, String>> = Vec::new();
    let mut flat: BTreeMap<String, String> = BTreeMap::new();
    for (key, value) in pairs {
        if let Some(field) = key
            .strip_prefix("addresses[][")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let start_new = addresses
                .last()
                .is_none_or(|record| record.contains_key(field));
            if start_new {
                addresses.push(BTreeMap::new());
            }
            addresses
                .last_mut()
                .expect("record exists")
                .insert(field.to_string(), value);
        } else {
            flat.insert(key, value);
        }
    }

    let results = serde_json::json!({
        "addresses": addresses,
        "params": flat,
    });
    Html(format!(
        "<html><body><h1>Form submitted</h1><pre id='results'>{}</pre></body></html>",
        escape_html(&results.to_string())
    ))
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
