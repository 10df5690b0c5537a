use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::models::{IrrigationConfig, Plant, SensorSnapshot};

/// Errors that can occur when talking to the watering controller.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// 409 from `/addPlant`: a plant with that name already exists.
    #[error("already exists")]
    Conflict,
    /// 404 from `/deletePlant`: no plant with that name.
    #[error("not found")]
    NotFound,
    #[error("server error {0}")]
    Status(u16),
}

/// Client-side view of the controller's HTTP endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GardenApi: Send + Sync {
    /// Current sensor readings.
    async fn sensor_data(&self) -> Result<SensorSnapshot, ApiError>;

    /// The irrigation configuration persisted on the controller.
    async fn load_config(&self) -> Result<IrrigationConfig, ApiError>;

    /// Persist an irrigation configuration. Returns the controller's
    /// confirmation text.
    async fn save_config(&self, config: IrrigationConfig) -> Result<String, ApiError>;

    /// All registered plants.
    async fn plants(&self) -> Result<Vec<Plant>, ApiError>;

    /// Register a plant. `ApiError::Conflict` when the name is taken.
    async fn add_plant(&self, plant: Plant) -> Result<String, ApiError>;

    /// Remove a plant by name. `ApiError::NotFound` when it does not exist.
    async fn delete_plant(&self, name: String) -> Result<String, ApiError>;
}

#[derive(Debug, Serialize)]
struct DeleteRequest {
    name: String,
}

/// `GardenApi` over reqwest against the embedded web server.
pub struct HttpGardenApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGardenApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(2))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl GardenApi for HttpGardenApi {
    async fn sensor_data(&self) -> Result<SensorSnapshot, ApiError> {
        let response = self.client.get(self.url("/data.json")).send().await?;
        map_status(response.status())?;
        Ok(response.json().await?)
    }

    async fn load_config(&self) -> Result<IrrigationConfig, ApiError> {
        let response = self.client.get(self.url("/loadConfig")).send().await?;
        map_status(response.status())?;
        Ok(response.json().await?)
    }

    async fn save_config(&self, config: IrrigationConfig) -> Result<String, ApiError> {
        let response = self
            .client
            .post(self.url("/saveConfig"))
            .json(&config)
            .send()
            .await?;
        confirmation_text(response).await
    }

    async fn plants(&self) -> Result<Vec<Plant>, ApiError> {
        let response = self.client.get(self.url("/getPlants")).send().await?;
        map_status(response.status())?;
        Ok(response.json().await?)
    }

    async fn add_plant(&self, plant: Plant) -> Result<String, ApiError> {
        let response = self
            .client
            .post(self.url("/addPlant"))
            .json(&plant)
            .send()
            .await?;
        confirmation_text(response).await
    }

    async fn delete_plant(&self, name: String) -> Result<String, ApiError> {
        let response = self
            .client
            .delete(self.url("/deletePlant"))
            .json(&DeleteRequest { name })
            .send()
            .await?;
        confirmation_text(response).await
    }
}

/// The controller answers mutating requests with a short plain-text
/// confirmation body.
async fn confirmation_text(response: reqwest::Response) -> Result<String, ApiError> {
    map_status(response.status())?;
    Ok(response.text().await?)
}

fn map_status(status: StatusCode) -> Result<(), ApiError> {
    if status.is_success() {
        return Ok(());
    }

    Err(match status {
        StatusCode::CONFLICT => ApiError::Conflict,
        StatusCode::NOT_FOUND => ApiError::NotFound,
        _ => ApiError::Status(status.as_u16()),
    })
}
