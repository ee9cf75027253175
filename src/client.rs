mod weather_client;

pub use weather_client::{Weather, WeatherClient, WeatherError};
