//! Per-ride chat between passenger and driver, relayed through the
//! server and refreshed by polling.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::api::DynAPI;
use crate::entities::{ChatMessage, RideId};
use crate::error::{invalid_input_error, Error};
use crate::poll::Repeater;

/// The client's view of one ride's conversation. Messages are kept in
/// the order the server first showed them, and a message id is never
/// appended twice even when polls overlap in content.
pub struct ChatRelay {
    api: DynAPI,
    ride_id: RideId,
    log: Vec<ChatMessage>,
    seen: HashSet<i64>,
}

impl ChatRelay {
    pub fn new(api: DynAPI, ride_id: RideId) -> Self {
        Self {
            api,
            ride_id,
            log: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn ride_id(&self) -> RideId {
        self.ride_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.log
    }

    /// Fetches the conversation and appends whatever is new.
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<(), Error> {
        let fetched = self.api.list_messages(self.ride_id).await?;
        self.merge(fetched);

        Ok(())
    }

    fn merge(&mut self, fetched: Vec<ChatMessage>) {
        for message in fetched {
            if self.seen.insert(message.id) {
                self.log.push(message);
            }
        }
    }

    /// Sends a message and folds the server's copy into the log. A
    /// blank message is refused before any network call.
    #[tracing::instrument(skip(self, content))]
    pub async fn send(&mut self, content: &str) -> Result<(), Error> {
        let content = content.trim();

        if content.is_empty() {
            return Err(invalid_input_error());
        }

        let sent = self.api.send_message(self.ride_id, content).await?;
        self.merge(vec![sent]);

        // catching up on the rest of the conversation is best effort;
        // the send itself already succeeded
        if let Err(err) = self.refresh().await {
            tracing::warn!(code = err.code, "failed to refresh chat after send");
        }

        Ok(())
    }
}

/// A relay plus the repeater that keeps it fresh.
pub struct ChatFeed {
    relay: Arc<Mutex<ChatRelay>>,
    repeater: Repeater,
}

impl ChatFeed {
    pub fn start(api: DynAPI, ride_id: RideId, interval: Duration) -> Self {
        let relay = Arc::new(Mutex::new(ChatRelay::new(api, ride_id)));

        let repeater = {
            let relay = relay.clone();

            Repeater::spawn("chat", interval, move || {
                let relay = relay.clone();

                async move {
                    if let Err(err) = relay.lock().await.refresh().await {
                        tracing::warn!(code = err.code, "chat poll failed");
                    }
                }
            })
        };

        Self { relay, repeater }
    }

    pub async fn send(&self, content: &str) -> Result<(), Error> {
        self.relay.lock().await.send(content).await
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.relay.lock().await.messages().to_vec()
    }

    pub async fn stop(self) {
        self.repeater.cancel().await;
    }
}
