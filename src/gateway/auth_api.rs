use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use super::Gateway;
use crate::api::AuthAPI;
use crate::error::Error;
use crate::session::{Credentials, Principal, Registration};

#[async_trait]
impl AuthAPI for Gateway {
    #[tracing::instrument(skip(self, password))]
    async fn issue_token(&self, username: &str, password: &str) -> Result<Credentials, Error> {
        self.dispatch(
            self.request(Method::POST, "/token/")
                .json(&json!({ "username": username, "password": password })),
        )
        .await
    }

    #[tracing::instrument(skip(self, registration))]
    async fn register(&self, registration: &Registration) -> Result<Principal, Error> {
        self.dispatch(
            self.request(Method::POST, "/users/register/")
                .json(registration),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn current_user(&self) -> Result<Principal, Error> {
        self.dispatch(self.request(Method::GET, "/users/me/"))
            .await
    }
}
