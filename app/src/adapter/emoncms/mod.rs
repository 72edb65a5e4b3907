use infrastructure::HttpClientConfig;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::Value;

use crate::core::{Error, FeedId, Result};
use crate::port::FeedStore;

const TARGET: &str = "emoncms";

#[derive(Debug, Deserialize, Clone)]
pub struct Emoncms {
    pub url: String,
    pub api_key: String,
}

impl Emoncms {
    pub fn new_client(&self, timeout_secs: u64) -> anyhow::Result<EmoncmsClient> {
        let client = HttpClientConfig::new(Some(self.api_key.clone()))
            .with_timeout_secs(timeout_secs)
            .new_tracing_client()?;

        Ok(EmoncmsClient {
            client,
            base_url: self.url.trim_end_matches('/').to_owned(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct EmoncmsClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl FeedStore for EmoncmsClient {
    #[tracing::instrument(skip(self))]
    async fn get(&self, feed: FeedId) -> Result<Option<f64>> {
        let response = self
            .client
            .get(format!("{}/feed/value.json", self.base_url))
            .query(&[("id", feed.0)])
            .send()
            .await
            .map_err(|e| Error::unavailable(TARGET, e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| Error::unavailable(TARGET, e))?;

        if !status.is_success() {
            return Err(Error::unavailable(
                TARGET,
                format!("reading {} returned {}: {}", feed, status, body),
            ));
        }

        let value = parse_feed_value(&body).map_err(|e| Error::unavailable(TARGET, format!("{}: {}", feed, e)))?;
        tracing::debug!(%feed, ?value, "Read feed value");

        Ok(value)
    }

    #[tracing::instrument(skip(self))]
    async fn post(&self, node: &str, values: &[(&str, f64)]) -> Result<()> {
        let fulljson = to_fulljson(values);

        let response = self
            .client
            .post(format!("{}/input/post.json", self.base_url))
            .query(&[("node", node), ("fulljson", fulljson.as_str())])
            .send()
            .await
            .map_err(|e| Error::unavailable(TARGET, e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| Error::unavailable(TARGET, e))?;

        if !status.is_success() {
            return Err(Error::unavailable(
                TARGET,
                format!("posting to node {} returned {}: {}", node, status, body),
            ));
        }

        check_post_response(&body).map_err(|e| Error::unavailable(TARGET, format!("node {}: {}", node, e)))?;
        tracing::debug!(node, payload = %fulljson, "Posted inputs");

        Ok(())
    }
}

/// Feed values come back as a JSON number, a quoted number or `null` for a feed without data.
/// Errors are reported as `{"success": false, "message": ...}`.
fn parse_feed_value(body: &str) -> std::result::Result<Option<f64>, String> {
    let body = body.trim();

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Null) => Ok(None),
        Ok(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(|| format!("number out of range: {}", n)),
        Ok(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| format!("not a number: {:?}", s)),
        Ok(Value::Object(obj)) => Err(error_message(&obj)),
        Ok(other) => Err(format!("unexpected value: {}", other)),
        Err(_) => body.parse::<f64>().map(Some).map_err(|_| format!("not a number: {:?}", body)),
    }
}

fn check_post_response(body: &str) -> std::result::Result<(), String> {
    match serde_json::from_str::<Value>(body.trim()) {
        Ok(Value::Object(obj)) if obj.get("success").and_then(Value::as_bool) == Some(false) => {
            Err(error_message(&obj))
        }
        _ => Ok(()),
    }
}

fn error_message(obj: &serde_json::Map<String, Value>) -> String {
    obj.get("message")
        .and_then(Value::as_str)
        .unwrap_or("request rejected")
        .to_string()
}

fn to_fulljson(values: &[(&str, f64)]) -> String {
    let map: serde_json::Map<String, Value> = values
        .iter()
        .map(|(name, value)| (name.to_string(), Value::from(*value)))
        .collect();

    Value::Object(map).to_string()
}
