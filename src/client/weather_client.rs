use std::time::Duration;

use anyhow::Context;

use reqwest::{Client, StatusCode};

use secrecy::{ExposeSecret, Secret};

use serde::{Deserialize, Deserializer, Serialize};

use url::Url;

/// Errors returned by the weather provider client
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("City cannot be empty")]
    InvalidInput,
    #[error("City not found")]
    NotFound,
    #[error("Weather provider returned {0}")]
    UpstreamError(String),
    #[error("Weather provider is unavailable")]
    UpstreamUnavailable(#[source] reqwest::Error),
    #[error("Weather provider returned a malformed response")]
    InvalidUpstreamResponse(#[source] serde_json::Error),
}

/// Current weather for a city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub temperature: f64,
    pub humidity: f64,
    pub description: String,
}

/// Client for the OpenWeatherMap current weather API
#[derive(Debug)]
pub struct WeatherClient {
    client: Client,
    api_current_weather_url: Url,
    api_key: Secret<String>,
}

impl WeatherClient {
    /// Build a client. Without `api_timeout` the transport default applies.
    pub fn new(
        api_base_url: Url,
        api_key: Secret<String>,
        api_timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = api_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build http client")?;

        let api_current_weather_url = api_base_url
            .join("weather")
            .context("Failed to create current weather endpoint URL")?;

        Ok(Self {
            client,
            api_current_weather_url,
            api_key,
        })
    }

    #[tracing::instrument(name = "Fetch current weather", skip(self))]
    pub async fn get_weather(&self, city: &str) -> Result<Weather, WeatherError> {
        if city.is_empty() {
            return Err(WeatherError::InvalidInput);
        }

        let res = self
            .client
            .get(self.api_current_weather_url.clone())
            .query(&[
                ("q", city),
                ("appid", self.api_key.expose_secret().as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(WeatherError::UpstreamUnavailable)?;

        match res.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(WeatherError::NotFound),
            status => return Err(WeatherError::UpstreamError(status.to_string())),
        }

        let body = res
            .bytes()
            .await
            .map_err(WeatherError::UpstreamUnavailable)?;
        // A `null` body decodes like an empty object
        let current: Option<CurrentWeatherResponse> =
            serde_json::from_slice(&body).map_err(WeatherError::InvalidUpstreamResponse)?;

        Ok(current.unwrap_or_default().into())
    }
}

/// Missing and `null` provider fields both take the zero value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
struct CurrentWeatherMain {
    #[serde(default, deserialize_with = "null_as_default")]
    temp: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    humidity: f64,
}

#[derive(Debug, Default, Deserialize)]
struct CurrentWeatherCondition {
    #[serde(default, deserialize_with = "null_as_default")]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct CurrentWeatherResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    main: CurrentWeatherMain,
    #[serde(default, deserialize_with = "null_as_default")]
    weather: Vec<Option<CurrentWeatherCondition>>,
}

impl From<CurrentWeatherResponse> for Weather {
    fn from(value: CurrentWeatherResponse) -> Self {
        let description = value
            .weather
            .into_iter()
            .next()
            .flatten()
            .map(|condition| condition.description)
            .unwrap_or_default();

        Self {
            temperature: value.main.temp,
            humidity: value.main.humidity,
            description,
        }
    }
}
