//! W3C WebDriver adapter
//!
//! Minimal client over the WebDriver HTTP protocol, enough for the
//! evidence extractors: session lifecycle, navigation with a bounded
//! load wait, script execution, screenshots, and window control. No
//! retry logic; transport failures surface to the criterion check.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{BrowserError, PageSession, SessionFactory};

const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct WebDriverFactory {
    client: Client,
    server_url: String,
    load_timeout_secs: u64,
}

impl WebDriverFactory {
    pub fn new(server_url: String, load_timeout_secs: u64) -> Self {
        Self {
            client: Client::new(),
            server_url,
            load_timeout_secs,
        }
    }
}

#[async_trait]
impl SessionFactory for WebDriverFactory {
    async fn open(&self, url: &str) -> Result<Box<dyn PageSession>, BrowserError> {
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": [
                            "--headless=new",
                            "--window-size=1920,1080",
                            "--autoplay-policy=no-user-gesture-required"
                        ]
                    }
                }
            }
        });

        let created = post_command(
            &self.client,
            &format!("{}/session", self.server_url.trim_end_matches('/')),
            &capabilities,
        )
        .await?;
        let session_id = created["sessionId"]
            .as_str()
            .or_else(|| created["value"]["sessionId"].as_str())
            .ok_or_else(|| BrowserError::Protocol("session reply without sessionId".to_string()))?
            .to_string();
        debug!(session_id = %session_id, "webdriver session created");

        let session = WebDriverSession {
            client: self.client.clone(),
            base: format!(
                "{}/session/{}",
                self.server_url.trim_end_matches('/'),
                session_id
            ),
        };

        session.navigate(url).await?;
        session.wait_for_load(self.load_timeout_secs).await?;
        Ok(Box::new(session))
    }
}

pub struct WebDriverSession {
    client: Client,
    base: String,
}

impl WebDriverSession {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        post_command(&self.client, &format!("{}/url", self.base), &json!({ "url": url })).await?;
        Ok(())
    }

    /// Poll `document.readyState` until the page reports complete.
    async fn wait_for_load(&self, timeout_secs: u64) -> Result<(), BrowserError> {
        let deadline = Instant::now() + Duration::from_secs(timeout_secs);
        loop {
            let state = self
                .execute_script("return document.readyState;", Vec::new())
                .await?;
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::LoadTimeout(timeout_secs));
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl PageSession for WebDriverSession {
    async fn outer_html_by_css(&self, selector: &str) -> Result<Vec<String>, BrowserError> {
        let value = self
            .execute_script(
                "return Array.from(document.querySelectorAll(arguments[0]))\
                 .map(function (el) { return el.outerHTML; });",
                vec![Value::from(selector)],
            )
            .await?;
        json_string_array(value)
    }

    async fn attributes_by_css(
        &self,
        selector: &str,
        attributes: &[&str],
    ) -> Result<Vec<(String, String)>, BrowserError> {
        let attrs: Vec<Value> = attributes.iter().map(|a| Value::from(*a)).collect();
        let value = self
            .execute_script(
                "var names = arguments[1];\
                 return Array.from(document.querySelectorAll(arguments[0])).map(function (el) {\
                   var opening = el.outerHTML.slice(0, el.outerHTML.indexOf('>') + 1);\
                   var facts = names.map(function (n) {\
                     return n + '=' + (el.getAttribute(n) === null ? '<absent>' : el.getAttribute(n));\
                   }).join('; ');\
                   return [opening, facts];\
                 });",
                vec![Value::from(selector), Value::Array(attrs)],
            )
            .await?;

        let pairs = value
            .as_array()
            .ok_or_else(|| BrowserError::Protocol("expected an array of pairs".to_string()))?;
        pairs
            .iter()
            .map(|pair| {
                let key = pair[0].as_str();
                let val = pair[1].as_str();
                match (key, val) {
                    (Some(k), Some(v)) => Ok((k.to_string(), v.to_string())),
                    _ => Err(BrowserError::Protocol(
                        "expected [string, string] pairs".to_string(),
                    )),
                }
            })
            .collect()
    }

    async fn execute_script(
        &self,
        script: &str,
        args: Vec<Value>,
    ) -> Result<Value, BrowserError> {
        post_command(
            &self.client,
            &format!("{}/execute/sync", self.base),
            &json!({ "script": script, "args": args }),
        )
        .await
    }

    async fn screenshot_png_base64(&self) -> Result<String, BrowserError> {
        let value = get_command(&self.client, &format!("{}/screenshot", self.base)).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BrowserError::Protocol("screenshot reply was not a string".to_string()))
    }

    async fn set_window_size(&self, width: u32, height: u32) -> Result<(), BrowserError> {
        post_command(
            &self.client,
            &format!("{}/window/rect", self.base),
            &json!({ "x": 0, "y": 0, "width": width, "height": height }),
        )
        .await?;
        Ok(())
    }

    async fn page_title(&self) -> Result<String, BrowserError> {
        let value = get_command(&self.client, &format!("{}/title", self.base)).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BrowserError::Protocol("title reply was not a string".to_string()))
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let value = get_command(&self.client, &format!("{}/url", self.base)).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BrowserError::Protocol("url reply was not a string".to_string()))
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.client.delete(&self.base).send().await?;
        Ok(())
    }
}

/// POST a WebDriver command and unwrap the `value` envelope.
async fn post_command(client: &Client, url: &str, body: &Value) -> Result<Value, BrowserError> {
    let reply: Value = client.post(url).json(body).send().await?.json().await?;
    unwrap_value(reply)
}

async fn get_command(client: &Client, url: &str) -> Result<Value, BrowserError> {
    let reply: Value = client.get(url).send().await?.json().await?;
    unwrap_value(reply)
}

fn unwrap_value(mut reply: Value) -> Result<Value, BrowserError> {
    let value = reply["value"].take();
    if let Some(error) = value["error"].as_str() {
        if error == "invalid session id" {
            return Err(BrowserError::SessionClosed);
        }
        let message = value["message"].as_str().unwrap_or("");
        return Err(BrowserError::Protocol(format!("{}: {}", error, message)));
    }
    Ok(value)
}

fn json_string_array(value: Value) -> Result<Vec<String>, BrowserError> {
    value
        .as_array()
        .ok_or_else(|| BrowserError::Protocol("expected an array of strings".to_string()))?
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| BrowserError::Protocol("expected string entries".to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_value_surfaces_protocol_errors() {
        let reply = json!({
            "value": { "error": "no such element", "message": "css selector matched nothing" }
        });
        match unwrap_value(reply) {
            Err(BrowserError::Protocol(msg)) => assert!(msg.contains("no such element")),
            other => panic!("expected protocol error, got {:?}", other),
        }
    }

    #[test]
    fn test_unwrap_value_maps_dead_session() {
        let reply = json!({
            "value": { "error": "invalid session id", "message": "session deleted" }
        });
        assert!(matches!(
            unwrap_value(reply),
            Err(BrowserError::SessionClosed)
        ));
    }

    #[test]
    fn test_unwrap_value_passes_payload_through() {
        let reply = json!({ "value": ["<a>", "<img>"] });
        let value = unwrap_value(reply).unwrap();
        assert_eq!(json_string_array(value).unwrap(), vec!["<a>", "<img>"]);
    }
}
