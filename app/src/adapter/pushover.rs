use infrastructure::HttpClientConfig;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;

use crate::port::Notifier;

#[derive(Debug, Deserialize, Clone)]
pub struct Pushover {
    pub token: String,
    pub user_key: String,
    #[serde(default = "default_url")]
    pub url: String,
}

fn default_url() -> String {
    "https://api.pushover.net/1/messages.json".to_string()
}

impl Pushover {
    pub fn new_notifier(&self, title: &str, timeout_secs: u64) -> anyhow::Result<PushoverNotifier> {
        let client = HttpClientConfig::anonymous()
            .with_timeout_secs(timeout_secs)
            .new_tracing_client()?;

        Ok(PushoverNotifier {
            client,
            config: self.clone(),
            title: title.to_owned(),
        })
    }
}

pub struct PushoverNotifier {
    client: ClientWithMiddleware,
    config: Pushover,
    title: String,
}

impl Notifier for PushoverNotifier {
    #[tracing::instrument(skip(self))]
    async fn send(&self, message: &str) -> anyhow::Result<()> {
        let form = [
            ("token", self.config.token.as_str()),
            ("user", self.config.user_key.as_str()),
            ("title", self.title.as_str()),
            ("message", message),
        ];

        self.client
            .post(&self.config.url)
            .form(&form)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
