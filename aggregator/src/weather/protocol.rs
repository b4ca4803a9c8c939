use crate::errors::AggregatorError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CurrentWeather {
    pub main: Option<MainReadings>,
    pub weather: Option<Vec<Condition>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MainReadings {
    pub temp: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Condition {
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct WeatherReport {
    pub temperature: i64,
    pub description: String,
    pub icon: String,
}

/// Half-up rounding, so -0.5 becomes 0 and 2.5 becomes 3.
fn round_temperature(temp: f64) -> i64 {
    (temp + 0.5).floor() as i64
}

/// A missing temperature fails the request; missing conditions are blank.
pub fn normalize_weather(
    upstream: &str,
    current: CurrentWeather,
) -> Result<WeatherReport, AggregatorError> {
    let temp = current
        .main
        .and_then(|main| main.temp)
        .filter(|temp| temp.is_finite())
        .ok_or_else(|| AggregatorError::payload(upstream, "missing main.temp"))?;

    let condition = current
        .weather
        .unwrap_or_default()
        .into_iter()
        .next()
        .unwrap_or_default();

    Ok(WeatherReport {
        temperature: round_temperature(temp),
        description: condition.description.unwrap_or_default(),
        icon: condition.icon.unwrap_or_default(),
    })
}

pub fn decode_weather(upstream: &str, body: &[u8]) -> Result<WeatherReport, AggregatorError> {
    let current: CurrentWeather =
        serde_json::from_slice(body).map_err(|e| AggregatorError::payload(upstream, e))?;
    normalize_weather(upstream, current)
}
