use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use super::Gateway;
use crate::api::ChatAPI;
use crate::entities::{ChatMessage, RideId};
use crate::error::Error;

#[async_trait]
impl ChatAPI for Gateway {
    #[tracing::instrument(skip(self))]
    async fn list_messages(&self, ride_id: RideId) -> Result<Vec<ChatMessage>, Error> {
        self.dispatch(self.request(Method::GET, &format!("/rides/{}/messages/", ride_id)))
            .await
    }

    #[tracing::instrument(skip(self, content))]
    async fn send_message(&self, ride_id: RideId, content: &str) -> Result<ChatMessage, Error> {
        self.dispatch(
            self.request(Method::POST, &format!("/rides/{}/messages/", ride_id))
                .json(&json!({ "content": content })),
        )
        .await
    }
}
