use std::net::TcpListener;
use std::sync::Arc;

use anyhow::Context;

use sqlx::postgres::PgPoolOptions;

use weather_service::app;
use weather_service::client::WeatherClient;
use weather_service::repo::PgSubscriptionRepo;
use weather_service::settings::Settings;
use weather_service::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = telemetry::create_subscriber(telemetry::DEFAULT_ENV_FILTER, std::io::stdout);
    telemetry::set_subscriber(subscriber)?;

    // Missing required settings end the process here, before any request is served
    let settings = Settings::load().context("Failed to load settings")?;

    let pool = PgPoolOptions::new()
        .acquire_timeout(settings.database.acquire_timeout())
        .connect_with(settings.database.connect_options()?)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let weather_client = WeatherClient::new(
        settings.weather.api_base_url()?,
        settings.weather.api_key(),
        settings.weather.api_timeout(),
    )?;

    let listener = TcpListener::bind(settings.app.addr())?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    let store = Arc::new(PgSubscriptionRepo::new(pool));

    app::run(listener, store, weather_client)?
        .await
        .context("Failed to run app")
}
