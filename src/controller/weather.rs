use actix_web::{get, web, HttpRequest, HttpResponse, Responder};

use crate::client::WeatherClient;
use crate::error::{RestError, RestResult};

/// First `city` value of the query string, empty when absent
fn city_param(req: &HttpRequest) -> String {
    url::form_urlencoded::parse(req.query_string().as_bytes())
        .find(|(key, _)| key == "city")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

/// Current weather for a city, proxied from the weather provider
#[tracing::instrument(name = "Get current weather", skip(req, weather_client), fields(city))]
#[get("/weather")]
async fn current(
    req: HttpRequest,
    weather_client: web::Data<WeatherClient>,
) -> RestResult<impl Responder> {
    let city = city_param(&req);
    tracing::Span::current().record("city", city.as_str());
    if city.is_empty() {
        return Err(RestError::InvalidInput("city parameter is required".into()));
    }

    let weather = weather_client.get_weather(&city).await?;

    Ok(HttpResponse::Ok().json(weather))
}

/// Register weather API endpoints
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(current);
}
