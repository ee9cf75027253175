use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};

use secrecy::{ExposeSecret, Secret};

use serde::Deserialize;
use serde_aux::prelude::*;

use sqlx::postgres::PgConnectOptions;

use url::Url;

/// Port used when neither the settings files nor the environment set one
pub const DEFAULT_PORT: u16 = 8080;

/// Runtime environment, either `Dev` for local development, or `Prod` for release
#[derive(Debug)]
pub enum Runtime {
    Dev,
    Prod,
}

impl Runtime {
    pub fn as_str(&self) -> &str {
        match self {
            Runtime::Dev => "dev",
            Runtime::Prod => "prod",
        }
    }
}

impl TryFrom<String> for Runtime {
    type Error = anyhow::Error;

    fn try_from(s: String) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            other => anyhow::bail!("{} is not a valid runtime environment", other),
        }
    }
}

/// Application settings wrapper
#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: ApplicationSettings,
    pub database: DatabaseSettings,
    pub weather: WeatherSettings,
}

impl Settings {
    /// Load application settings from the settings directory
    pub fn load() -> anyhow::Result<Self> {
        // Get the path to the settings directory
        let path = env::current_dir()?.join("settings");
        // Get the current environment based on the `APP_ENV` environment variable, default to `Dev`
        let runtime: Runtime = env::var("APP_ENV")
            .unwrap_or_else(|_| "dev".into())
            .try_into()?;

        Self::load_from(runtime, &path)
    }

    /// Load application settings from a specified path and runtime
    pub fn load_from(runtime: Runtime, base_path: &Path) -> anyhow::Result<Self> {
        let builder = Config::builder()
            .set_default("app.port", i64::from(DEFAULT_PORT))?
            // Include the base settings
            .add_source(File::from(base_path.join("base")).required(true))
            // Include the runtime settings
            .add_source(File::from(base_path.join(runtime.as_str())).required(true))
            // Override/include any settings from environment variables
            // NOTE: Should be used for any prod secrets. Takes the form `APP_<settings category>__<setting name>`.
            .add_source(
                Environment::with_prefix("app")
                    .prefix_separator("_")
                    .separator("__"),
            );

        Self::from_builder(with_deployment_env(builder)?)
    }

    /// Deserialize and validate settings from a prepared builder
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
        let settings: Self = builder
            .build()?
            .try_deserialize()
            .context("Failed to load/deserialize settings")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the service cannot start without
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.url.expose_secret().trim().is_empty() {
            anyhow::bail!("Missing database connection string (DATABASE_URL)");
        }
        if self.weather.api_key.expose_secret().trim().is_empty() {
            anyhow::bail!("Missing weather provider API key (OPENWEATHER_API_KEY)");
        }
        Ok(())
    }
}

/// Plain environment variables the service has always been deployed with.
/// These take precedence over everything else.
fn with_deployment_env(
    builder: ConfigBuilder<DefaultState>,
) -> anyhow::Result<ConfigBuilder<DefaultState>> {
    let port = env::var("PORT").ok().filter(|port| !port.is_empty());

    Ok(builder
        .set_override_option("database.url", env::var("DATABASE_URL").ok())?
        .set_override_option("weather.api_key", env::var("OPENWEATHER_API_KEY").ok())?
        .set_override_option("app.port", port)?)
}

#[derive(Debug, Deserialize)]
pub struct ApplicationSettings {
    host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    port: u16,
}

impl ApplicationSettings {
    /// The application address to bind to
    pub fn addr(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    url: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    acquire_timeout_milliseconds: u64,
}

impl DatabaseSettings {
    /// The database connection options, parsed from the connection string
    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        PgConnectOptions::from_str(self.url.expose_secret())
            .context("Failed to parse database connection string")
    }
    /// How long to wait for a pooled connection
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_milliseconds)
    }
}

#[derive(Debug, Deserialize)]
pub struct WeatherSettings {
    api_base_url: String,
    api_key: Secret<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    api_timeout_milliseconds: Option<u64>,
}

impl WeatherSettings {
    /// The base URL for the weather REST service
    pub fn api_base_url(&self) -> anyhow::Result<Url> {
        Url::parse(&self.api_base_url).context("Failed to parse weather base URL")
    }
    /// The weather provider API key
    pub fn api_key(&self) -> Secret<String> {
        self.api_key.clone()
    }
    /// Request timeout, `None` keeps the HTTP client default
    pub fn api_timeout(&self) -> Option<Duration> {
        self.api_timeout_milliseconds.map(Duration::from_millis)
    }
}
