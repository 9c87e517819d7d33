//! W3C WebDriver page session
//!
//! Talks the WebDriver wire protocol to a running driver (geckodriver,
//! chromedriver, a Selenium grid) over plain HTTP.

use super::{ElementRef, PageSession, Query};
use crate::ScraperError;
use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::Duration;

/// Key under which the protocol serializes element references
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52f-4ce3ba0a8a8b";

/// A reply from the driver, either a value or a protocol error
#[derive(Debug)]
enum Reply {
    Value(Value),
    Error { error: String, message: String },
}

/// Page session driven through a WebDriver endpoint
#[derive(Debug)]
pub struct WebDriverSession {
    client: Client,
    endpoint: String,
    session_id: Option<String>,
}

impl WebDriverSession {
    /// Starts a new browser session on the driver at `webdriver_url`
    pub async fn start(webdriver_url: &str, browser: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let endpoint = webdriver_url.trim_end_matches('/').to_string();

        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": { "browserName": browser }
            }
        });

        let response = client
            .post(format!("{}/session", endpoint))
            .json(&capabilities)
            .send()
            .await?;
        let body: Value = response.json().await?;
        let value = into_value("new session", parse_reply(body))?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| ScraperError::WebDriver {
                command: "new session".to_string(),
                message: "driver reply carries no session id".to_string(),
            })?
            .to_string();

        tracing::info!("Started {} session {} on {}", browser, session_id, endpoint);

        Ok(Self {
            client,
            endpoint,
            session_id: Some(session_id),
        })
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Reply, ScraperError> {
        let session_id = self.session_id.as_deref().ok_or_else(|| {
            ScraperError::Unsupported("the browser session is already closed".to_string())
        })?;
        let url = format!("{}/session/{}{}", self.endpoint, session_id, path);

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let body: Value = response.json().await?;
        Ok(parse_reply(body))
    }

    async fn command(
        &self,
        name: &str,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ScraperError> {
        let reply = self.send(method, path, body).await?;
        into_value(name, reply)
    }

    fn scoped_path(scope: Option<&ElementRef>, suffix: &str) -> String {
        match scope {
            Some(element) => format!("/element/{}/{}", element.id(), suffix),
            None => format!("/{}", suffix),
        }
    }
}

#[async_trait]
impl PageSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
        tracing::debug!("Navigating to {}", url);
        self.command("navigate", Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    async fn current_url(&mut self) -> Result<String, ScraperError> {
        let value = self.command("current url", Method::GET, "/url", None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn find(
        &mut self,
        scope: Option<&ElementRef>,
        query: &Query,
    ) -> Result<Option<ElementRef>, ScraperError> {
        let path = Self::scoped_path(scope, "element");
        let body = json!({ "using": query.using.webdriver_name(), "value": query.value });

        match self.send(Method::POST, &path, Some(body)).await? {
            Reply::Error { error, .. } if error == "no such element" => Ok(None),
            reply => {
                let value = into_value("find element", reply)?;
                element_from_value(&value).map(Some)
            }
        }
    }

    async fn find_all(
        &mut self,
        scope: Option<&ElementRef>,
        query: &Query,
    ) -> Result<Vec<ElementRef>, ScraperError> {
        let path = Self::scoped_path(scope, "elements");
        let body = json!({ "using": query.using.webdriver_name(), "value": query.value });
        let value = self.command("find elements", Method::POST, &path, Some(body)).await?;

        match value {
            Value::Array(items) => items.iter().map(element_from_value).collect(),
            other => Err(ScraperError::WebDriver {
                command: "find elements".to_string(),
                message: format!("expected a list of elements, got {}", other),
            }),
        }
    }

    async fn text(&mut self, element: &ElementRef) -> Result<String, ScraperError> {
        let path = format!("/element/{}/text", element.id());
        let value = self.command("element text", Method::GET, &path, None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(
        &mut self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, ScraperError> {
        // Properties first: they carry resolved links and markup
        let path = format!("/element/{}/property/{}", element.id(), name);
        let mut value = self.command("element property", Method::GET, &path, None).await?;
        if value.is_null() {
            let path = format!("/element/{}/attribute/{}", element.id(), name);
            value = self.command("element attribute", Method::GET, &path, None).await?;
        }

        Ok(match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    async fn execute(
        &mut self,
        script: &str,
        args: &[ElementRef],
    ) -> Result<Value, ScraperError> {
        let args: Vec<Value> = args
            .iter()
            .map(|element| json!({ ELEMENT_KEY: element.id() }))
            .collect();
        let body = json!({ "script": script, "args": args });
        self.command("execute script", Method::POST, "/execute/sync", Some(body))
            .await
    }

    async fn capture(&mut self, element: &ElementRef) -> Result<Vec<u8>, ScraperError> {
        let path = format!("/element/{}/screenshot", element.id());
        let value = self.command("element screenshot", Method::GET, &path, None).await?;
        let encoded = value.as_str().unwrap_or_default();

        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| ScraperError::WebDriver {
                command: "element screenshot".to_string(),
                message: format!("screenshot is not valid base64: {}", e),
            })
    }

    async fn send_keys(&mut self, element: &ElementRef, keys: &str) -> Result<(), ScraperError> {
        let path = format!("/element/{}/value", element.id());
        self.command("send keys", Method::POST, &path, Some(json!({ "text": keys })))
            .await
            .map(|_| ())
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        if self.session_id.is_none() {
            return Ok(());
        }
        let result = self.command("delete session", Method::DELETE, "", None).await;
        if let Some(id) = self.session_id.take() {
            tracing::info!("Closed browser session {}", id);
        }
        result.map(|_| ())
    }
}

fn parse_reply(body: Value) -> Reply {
    let value = body.get("value").cloned().unwrap_or(Value::Null);
    match value.get("error").and_then(Value::as_str) {
        Some(error) => Reply::Error {
            error: error.to_string(),
            message: value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        None => Reply::Value(value),
    }
}

fn into_value(command: &str, reply: Reply) -> Result<Value, ScraperError> {
    match reply {
        Reply::Value(value) => Ok(value),
        Reply::Error { error, message } => Err(classify_error(command, &error, &message)),
    }
}

/// Maps a protocol error code onto the crate's error kinds
fn classify_error(command: &str, error: &str, message: &str) -> ScraperError {
    match error {
        "no such element" | "stale element reference" | "element not interactable"
        | "timeout" | "script timeout" => {
            ScraperError::TransientRemote(format!("{} ({}): {}", command, error, message))
        }
        "invalid selector" | "invalid argument" => {
            ScraperError::InvalidParameter(format!("{} ({}): {}", command, error, message))
        }
        _ => ScraperError::WebDriver {
            command: command.to_string(),
            message: format!("{}: {}", error, message),
        },
    }
}

fn element_from_value(value: &Value) -> Result<ElementRef, ScraperError> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(|id| ElementRef(id.to_string()))
        .ok_or_else(|| ScraperError::WebDriver {
            command: "find element".to_string(),
            message: format!("not an element reference: {}", value),
        })
}
