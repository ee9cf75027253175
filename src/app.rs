use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{get, HttpResponse, Responder};
use actix_web::{web, App, HttpServer};

use tracing_actix_web::TracingLogger;

use crate::client::WeatherClient;
use crate::controller::{subscriptions, weather};
use crate::repo::SubscriptionStore;

/// Simple health-check endpoint
#[tracing::instrument(name = "Health check")]
#[get("/health_check")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("I am alive")
}

/// Run the application on a specified TCP listener
pub fn run(
    listener: TcpListener,
    store: Arc<dyn SubscriptionStore>,
    weather_client: WeatherClient,
) -> anyhow::Result<Server> {
    // Wrap application data
    let store: web::Data<dyn SubscriptionStore> = web::Data::from(store);
    let weather_client = web::Data::new(weather_client);

    // Start the server
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(store.clone())
            .app_data(weather_client.clone())
            .service(health_check)
            .service(
                web::scope("/api")
                    .configure(weather::configure)
                    .configure(subscriptions::configure),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
