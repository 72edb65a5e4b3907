use tokio::sync::mpsc::{self, error::TrySendError};

use crate::port::{HealthSink, HealthStatus, Notifier};

#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    Notify(String),
    Health(HealthStatus),
}

/// Sending half handed to the automation loop. Never blocks and never fails the caller.
#[derive(Debug, Clone)]
pub struct SideEffects {
    name: &'static str,
    tx: mpsc::Sender<SideEffect>,
}

impl SideEffects {
    pub fn channel(name: &'static str, capacity: usize) -> (Self, mpsc::Receiver<SideEffect>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { name, tx }, rx)
    }

    pub fn notify(&self, message: impl Into<String>) {
        self.dispatch(SideEffect::Notify(message.into()));
    }

    pub fn report_health(&self, status: HealthStatus) {
        self.dispatch(SideEffect::Health(status));
    }

    fn dispatch(&self, effect: SideEffect) {
        match self.tx.try_send(effect) {
            Ok(()) => {}
            Err(TrySendError::Full(effect)) => {
                tracing::warn!(automation = self.name, "Side-effect queue full, dropping {:?}", effect);
            }
            Err(TrySendError::Closed(effect)) => {
                tracing::warn!(automation = self.name, "Side-effect runner gone, dropping {:?}", effect);
            }
        }
    }
}

pub struct SideEffectRunner<N: Notifier, H: HealthSink> {
    name: &'static str,
    rx: mpsc::Receiver<SideEffect>,
    notifier: Option<N>,
    health: Option<H>,
}

impl<N: Notifier, H: HealthSink> SideEffectRunner<N, H> {
    pub fn new(name: &'static str, rx: mpsc::Receiver<SideEffect>, notifier: Option<N>, health: Option<H>) -> Self {
        Self {
            name,
            rx,
            notifier,
            health,
        }
    }

    pub async fn run(mut self) {
        while let Some(effect) = self.rx.recv().await {
            self.handle(effect).await;
        }

        tracing::debug!(automation = self.name, "Side-effect channel closed");
    }

    async fn handle(&self, effect: SideEffect) {
        match effect {
            SideEffect::Notify(message) => {
                let Some(notifier) = &self.notifier else {
                    tracing::debug!(automation = self.name, "No notifier configured, skipping: {}", message);
                    return;
                };

                if let Err(e) = notifier.send(&message).await {
                    tracing::error!(automation = self.name, "Error sending notification '{}': {:?}", message, e);
                }
            }

            SideEffect::Health(status) => {
                let Some(health) = &self.health else {
                    return;
                };

                if let Err(e) = health.ping(status).await {
                    tracing::warn!(automation = self.name, "Error sending health ping {}: {:?}", status, e);
                }
            }
        }
    }
}
