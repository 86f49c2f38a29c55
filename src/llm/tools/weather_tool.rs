//! `get_weather` capability backed by OpenWeatherMap.
//!
//! A lookup is two dependent steps: the city name is geocoded to
//! coordinates, then current conditions and air quality are fetched for those
//! coordinates. Air quality is optional; the report is still returned when
//! that call fails.

use crate::config::Endpoint;
use crate::error::{DispatchError, Result};
use crate::llm::tools::tool::{string_arg, LlmTool, ToolArguments, ToolDescriptor, ToolOutput};
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_LANG: &str = "zh_cn";

#[derive(Debug, Deserialize)]
struct GeoMatch {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    #[serde(default)]
    name: String,
    main: Readings,
    #[serde(default)]
    visibility: f64,
    wind: Wind,
    weather: Vec<Condition>,
    #[serde(default)]
    sys: Sys,
}

#[derive(Debug, Deserialize)]
struct Readings {
    temp: f64,
    feels_like: f64,
    humidity: i64,
    pressure: i64,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct Sys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct AirPollution {
    list: Vec<AirSample>,
}

#[derive(Debug, Deserialize)]
struct AirSample {
    main: AirIndex,
    #[serde(default)]
    components: Pollutants,
}

#[derive(Debug, Deserialize)]
struct AirIndex {
    aqi: u8,
}

/// Pollutant concentrations in μg/m³
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pollutants {
    pub pm2_5: f64,
    pub pm10: f64,
    pub co: f64,
    pub no2: f64,
    pub o3: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQuality {
    pub air_quality_index: u8,
    pub air_quality_level: &'static str,
    #[serde(flatten)]
    pub pollutants: Pollutants,
}

/// Report returned to the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub query_date: String,
    pub query_time: String,
    pub city: String,
    pub country: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub description: String,
    pub humidity: i64,
    pub pressure: i64,
    /// Kilometres
    pub visibility: f64,
    pub wind_speed: f64,
    pub wind_direction: &'static str,
    #[serde(flatten)]
    pub air_quality: Option<AirQuality>,
    pub clothing_suggestion: String,
    pub health_suggestion: String,
    pub travel_suggestion: String,
}

/// 8-point compass direction for a wind bearing in degrees
pub fn wind_direction(degrees: f64) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let sector = ((degrees.rem_euclid(360.0) + 22.5) / 45.0) as usize % 8;
    POINTS[sector]
}

pub fn aqi_level(aqi: u8) -> &'static str {
    match aqi {
        1 => "good",
        2 => "fair",
        3 => "light pollution",
        4 => "moderate pollution",
        _ => "heavy pollution",
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn build_report(
    requested_city: &str,
    weather: CurrentWeather,
    air: Option<AirSample>,
    now: NaiveDateTime,
) -> WeatherReport {
    let description = weather
        .weather
        .into_iter()
        .next()
        .map(|c| c.description)
        .unwrap_or_default();
    let temperature = round1(weather.main.temp);
    let air_quality = air.map(|sample| AirQuality {
        air_quality_index: sample.main.aqi,
        air_quality_level: aqi_level(sample.main.aqi),
        pollutants: sample.components,
    });

    let clothing = if temperature > 25.0 {
        "light clothing"
    } else if temperature > 15.0 {
        "moderate layers"
    } else {
        "warm clothing"
    };

    // Without an air reading assume the worst index
    let aqi = air_quality.as_ref().map_or(5, |a| a.air_quality_index);
    let level = air_quality.as_ref().map_or("unknown", |a| a.air_quality_level);
    let outdoor = if aqi <= 2 {
        "outdoor activity is fine"
    } else {
        "reduce outdoor activity"
    };

    let travel = if !description.to_lowercase().contains("rain") && weather.wind.speed < 5.0 {
        "good conditions for travel"
    } else {
        "take care when travelling"
    };

    WeatherReport {
        query_date: now.format("%Y-%m-%d").to_string(),
        query_time: now.format("%H:%M").to_string(),
        city: if weather.name.is_empty() {
            requested_city.to_string()
        } else {
            weather.name
        },
        country: weather.sys.country,
        temperature,
        feels_like: round1(weather.main.feels_like),
        humidity: weather.main.humidity,
        pressure: weather.main.pressure,
        visibility: round1(weather.visibility / 1000.0),
        wind_speed: weather.wind.speed,
        wind_direction: wind_direction(weather.wind.deg),
        clothing_suggestion: format!("It is {:.1}°C, wear {}", temperature, clothing),
        health_suggestion: format!("Air quality {}, {}", level, outdoor),
        travel_suggestion: format!("Currently {}, {}", description, travel),
        air_quality,
        description,
    }
}

/// Tool reporting current weather and air quality for a city
#[derive(Clone)]
pub struct WeatherTool {
    client: reqwest::Client,
    endpoint: Endpoint,
    lang: String,
}

impl WeatherTool {
    pub fn new(endpoint: &Endpoint, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.clone(),
            lang: DEFAULT_LANG.to_string(),
        })
    }

    /// Language of the weather description (default `zh_cn`)
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.base_url.trim_end_matches('/'), path)
    }

    async fn geocode(&self, city: &str) -> Result<Option<GeoMatch>> {
        let url = format!(
            "{}?q={}&limit=1&appid={}",
            self.url("/geo/1.0/direct"),
            urlencoding::encode(city),
            urlencoding::encode(&self.endpoint.api_key)
        );
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), city = %city, "Geocoding failed");
            return Ok(None);
        }

        let matches: Vec<GeoMatch> = response
            .json()
            .await
            .map_err(|e| DispatchError::UpstreamFormat(format!("geocoding response: {}", e)))?;
        Ok(matches.into_iter().next())
    }

    fn coordinate_url(&self, path: &str, place: &GeoMatch) -> String {
        format!(
            "{}?lat={}&lon={}&appid={}",
            self.url(path),
            place.lat,
            place.lon,
            urlencoding::encode(&self.endpoint.api_key)
        )
    }

    /// Current conditions; an error status is reported as `UpstreamFormat`.
    async fn current_weather(&self, city: &str, place: &GeoMatch) -> Result<CurrentWeather> {
        let url = format!(
            "{}&units=metric&lang={}",
            self.coordinate_url("/data/2.5/weather", place),
            urlencoding::encode(&self.lang)
        );
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), city = %city, "Weather request failed");
            return Err(DispatchError::UpstreamFormat(format!(
                "failed to fetch weather for {}: HTTP {}",
                city,
                status.as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DispatchError::UpstreamFormat(format!("weather response: {}", e)))
    }

    async fn air_quality(&self, place: &GeoMatch) -> Option<AirSample> {
        let url = self.coordinate_url("/data/2.5/air_pollution", place);
        let response = match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(status = response.status().as_u16(), "Air quality request failed");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Air quality request failed");
                return None;
            }
        };

        match response.json::<AirPollution>().await {
            Ok(air) => air.list.into_iter().next(),
            Err(e) => {
                warn!(error = %e, "Unreadable air quality response");
                None
            }
        }
    }

    /// Look up the weather for `city`.
    ///
    /// Unknown cities and upstream error statuses come back as error
    /// payloads; transport failures are returned as `Err`.
    pub async fn lookup(&self, city: &str) -> Result<ToolOutput> {
        if !self.endpoint.has_api_key() {
            return Ok(ToolOutput::error(
                "weather is not configured: OPENWEATHER_API_KEY is not set",
            ));
        }

        info!(city = %city, "Looking up weather");
        let place = match self.geocode(city).await {
            Ok(Some(place)) => place,
            Ok(None) => {
                warn!(city = %city, "City not found");
                return Ok(ToolOutput::error("city not found"));
            }
            Err(DispatchError::UpstreamFormat(message)) => return Ok(ToolOutput::Error(message)),
            Err(e) => return Err(e),
        };

        let weather = match self.current_weather(city, &place).await {
            Ok(weather) => weather,
            Err(DispatchError::UpstreamFormat(message)) => return Ok(ToolOutput::Error(message)),
            Err(e) => return Err(e),
        };

        let air = self.air_quality(&place).await;
        let report = build_report(city, weather, air, Local::now().naive_local());
        Ok(ToolOutput::Value(serde_json::to_value(report)?))
    }
}

#[async_trait]
impl LlmTool for WeatherTool {
    async fn run(&self, args: &ToolArguments) -> Result<ToolOutput> {
        match string_arg(args, "city") {
            Some(city) => self.lookup(city).await,
            None => Ok(ToolOutput::error("city is required")),
        }
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::function(
            "get_weather",
            "Get the current weather, air quality and daily suggestions for a city",
            json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "City name, e.g. 北京 or London"
                    }
                },
                "required": ["city"]
            }),
        )
    }
}
