use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use super::Gateway;
use crate::api::RideAPI;
use crate::entities::{Bid, Estimate, Ride, RideId, RideSpec};
use crate::error::Error;

#[async_trait]
impl RideAPI for Gateway {
    #[tracing::instrument(skip(self))]
    async fn create_estimate(&self, spec: &RideSpec) -> Result<Estimate, Error> {
        self.dispatch(self.request(Method::POST, "/rides/estimate/").json(spec))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn create_ride(&self, spec: &RideSpec) -> Result<Ride, Error> {
        self.dispatch(self.request(Method::POST, "/rides/").json(spec))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn find_ride(&self, id: RideId) -> Result<Ride, Error> {
        self.dispatch(self.request(Method::GET, &format!("/rides/{}/", id)))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn list_rides(&self) -> Result<Vec<Ride>, Error> {
        self.dispatch(self.request(Method::GET, "/rides/")).await
    }

    #[tracing::instrument(skip(self))]
    async fn accept_ride(&self, id: RideId) -> Result<Ride, Error> {
        self.dispatch(self.request(Method::PATCH, &format!("/rides/{}/accept/", id)))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn start_ride(&self, id: RideId) -> Result<Ride, Error> {
        self.dispatch(self.request(Method::POST, &format!("/rides/{}/start_ride/", id)))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn complete_ride(&self, id: RideId) -> Result<Ride, Error> {
        self.dispatch(self.request(Method::POST, &format!("/rides/{}/complete_ride/", id)))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn place_bid(&self, id: RideId, amount: f64) -> Result<Bid, Error> {
        self.dispatch(
            self.request(Method::POST, &format!("/rides/{}/bid/", id))
                .json(&json!({ "amount": amount })),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn accept_bid(&self, id: RideId, bid_id: i64) -> Result<Ride, Error> {
        self.dispatch(
            self.request(Method::POST, &format!("/rides/{}/accept_bid/", id))
                .json(&json!({ "bid_id": bid_id })),
        )
        .await
    }
}
