use async_trait::async_trait;
use reqwest::Method;

use super::{check_status, Gateway};
use crate::api::LocationAPI;
use crate::entities::{DriverLocation, PositionReport};
use crate::error::Error;

#[async_trait]
impl LocationAPI for Gateway {
    #[tracing::instrument(skip(self))]
    async fn list_driver_locations(&self) -> Result<Vec<DriverLocation>, Error> {
        self.dispatch(self.request(Method::GET, "/rides/drivers/"))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn report_driver_location(&self, report: &PositionReport) -> Result<(), Error> {
        let response = self
            .request(Method::POST, "/rides/drivers/")
            .json(report)
            .send()
            .await?;

        check_status(response)?;

        Ok(())
    }
}
