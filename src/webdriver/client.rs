use std::time::Duration;

use reqwest::Method;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{By, Driver, ELEMENT_KEY, ElementRef, Rect, Scroll};
use crate::error::WebDriverError;

const SCROLL_FRACTION_SCRIPT: &str =
    "window.scrollTo(0, document.body.scrollHeight * arguments[0]);";
const SCROLL_BOTTOM_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";
const SCROLL_INTO_VIEW_SCRIPT: &str = "arguments[0].scrollIntoView({block: 'center'});";

/// A live W3C WebDriver session spoken to over HTTP/JSON.
pub struct WebDriverClient {
    http: reqwest::Client,
    base: String,
    session_id: String,
}

impl WebDriverClient {
    pub async fn create_session(endpoint: &str, capabilities: &Value) -> Result<Self, WebDriverError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        let base = endpoint.trim_end_matches('/').to_string();

        let value = send(&http, Method::POST, &format!("{base}/session"), Some(capabilities)).await?;
        let session_id = value
            .pointer("/sessionId")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                WebDriverError::Decode(format!(
                    "session id missing in response: {}",
                    truncate_for_log(&value.to_string(), 220)
                ))
            })?;
        debug!(session_id = %session_id, endpoint = %base, "webdriver session created");

        Ok(Self {
            http,
            base,
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn delete_session(&self) -> Result<(), WebDriverError> {
        let url = format!("{}/session/{}", self.base, self.session_id);
        send(&self.http, Method::DELETE, &url, None).await?;
        Ok(())
    }

    async fn command(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, WebDriverError> {
        let url = format!("{}/session/{}{}", self.base, self.session_id, path);
        send(&self.http, method, &url, body).await
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, WebDriverError> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(&json!({ "script": script, "args": args })),
        )
        .await
    }
}

impl Driver for WebDriverClient {
    async fn navigate(&self, url: &str) -> Result<(), WebDriverError> {
        self.command(Method::POST, "/url", Some(&json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn find_all(&self, by: &By) -> Result<Vec<ElementRef>, WebDriverError> {
        let value = self
            .command(Method::POST, "/elements", Some(&locator_body(by)))
            .await?;
        Ok(element_refs(&value))
    }

    async fn find_all_in(&self, parent: &ElementRef, by: &By) -> Result<Vec<ElementRef>, WebDriverError> {
        let value = self
            .command(
                Method::POST,
                &format!("/element/{}/elements", parent.0),
                Some(&locator_body(by)),
            )
            .await?;
        Ok(element_refs(&value))
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>, WebDriverError> {
        let value = self
            .command(
                Method::GET,
                &format!("/element/{}/attribute/{}", element.0, name),
                None,
            )
            .await?;
        Ok(value.as_str().map(|s| s.to_string()))
    }

    async fn text(&self, element: &ElementRef) -> Result<String, WebDriverError> {
        let value = self
            .command(Method::GET, &format!("/element/{}/text", element.0), None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn rect(&self, element: &ElementRef) -> Result<Rect, WebDriverError> {
        let value = self
            .command(Method::GET, &format!("/element/{}/rect", element.0), None)
            .await?;
        serde_json::from_value(value).map_err(|e| WebDriverError::Decode(format!("rect: {e}")))
    }

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool, WebDriverError> {
        let value = self
            .command(
                Method::GET,
                &format!("/element/{}/displayed", element.0),
                None,
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn click(&self, element: &ElementRef) -> Result<(), WebDriverError> {
        self.command(
            Method::POST,
            &format!("/element/{}/click", element.0),
            Some(&json!({})),
        )
        .await?;
        Ok(())
    }

    async fn scroll(&self, to: Scroll<'_>) -> Result<(), WebDriverError> {
        match to {
            Scroll::PageFraction(fraction) => {
                self.execute(SCROLL_FRACTION_SCRIPT, vec![json!(fraction)])
                    .await?
            }
            Scroll::Bottom => self.execute(SCROLL_BOTTOM_SCRIPT, Vec::new()).await?,
            Scroll::IntoView(element) => {
                self.execute(SCROLL_INTO_VIEW_SCRIPT, vec![element_arg(element)])
                    .await?
            }
        };
        Ok(())
    }

    async fn page_source(&self) -> Result<String, WebDriverError> {
        let value = self.command(Method::GET, "/source", None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}

/// Asks a WebDriver server whether it accepts new sessions (`GET /status`).
/// Servers that omit `ready` are taken as ready.
pub async fn server_ready(endpoint: &str) -> Result<bool, WebDriverError> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;
    let url = format!("{}/status", endpoint.trim_end_matches('/'));
    let value = send(&http, Method::GET, &url, None).await?;
    Ok(value.get("ready").and_then(Value::as_bool).unwrap_or(true))
}

async fn send(
    http: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<&Value>,
) -> Result<Value, WebDriverError> {
    let mut request = http.request(method, url);
    if let Some(body) = body {
        request = request.json(body);
    }
    let res = request.send().await?;
    let status = res.status();
    let text = res.text().await?;

    let parsed: Option<Value> = serde_json::from_str(&text).ok();
    if let Some(err) = parsed.as_ref().and_then(protocol_error) {
        return Err(err);
    }
    if !status.is_success() {
        warn!(status = status.as_u16(), url, "webdriver command failed");
        return Err(WebDriverError::Http {
            status: status.as_u16(),
            body: truncate_for_log(&text, 260),
        });
    }

    let parsed = parsed.ok_or_else(|| {
        WebDriverError::Decode(format!("non-JSON body: {}", truncate_for_log(&text, 220)))
    })?;
    Ok(parsed.get("value").cloned().unwrap_or(Value::Null))
}

fn protocol_error(value: &Value) -> Option<WebDriverError> {
    let error = value.pointer("/value/error").and_then(|v| v.as_str())?;
    let message = value
        .pointer("/value/message")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown webdriver error");
    Some(WebDriverError::Protocol {
        error: error.to_string(),
        message: truncate_for_log(message, 260),
    })
}

fn locator_body(by: &By) -> Value {
    json!({ "using": by.strategy(), "value": by.value() })
}

fn element_arg(element: &ElementRef) -> Value {
    json!({ ELEMENT_KEY: element.0 })
}

fn element_refs(value: &Value) -> Vec<ElementRef> {
    value
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|entry| entry.get(ELEMENT_KEY).and_then(|id| id.as_str()))
                .map(|id| ElementRef(id.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

pub fn truncate_for_log(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    input.chars().take(max_chars).collect::<String>() + "..."
}
