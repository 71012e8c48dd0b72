mod auth_api;
mod chat_api;
mod location_api;
mod ride_api;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::api::API;
use crate::config::Config;
use crate::error::{action_rejected_error, unauthorized_error, upstream_error, Error};
use crate::session::SessionHandle;

/// The only component that talks to the remote ride service. Holds no
/// state beyond the HTTP client, the base URL, and a read-only view of
/// the current credential.
pub struct Gateway {
    http: reqwest::Client,
    base_url: String,
    session: SessionHandle,
}

impl Gateway {
    pub fn new(config: &Config, session: SessionHandle) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_base.clone(),
            session,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self
            .http
            .request(method, format!("{}{}", self.base_url, path));

        if let Some(token) = self.session.access_token() {
            request = request.bearer_auth(token);
        }

        request
    }

    async fn dispatch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        let response = check_status(request.send().await?)?;

        Ok(response.json().await?)
    }
}

fn check_status(response: Response) -> Result<Response, Error> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::UNAUTHORIZED {
        return Err(unauthorized_error());
    }

    if status.is_client_error() {
        // 400/403/404/409: the server refused this particular action;
        // the next poll reflects whatever it actually committed
        return Err(action_rejected_error());
    }

    Err(upstream_error())
}

impl API for Gateway {}
