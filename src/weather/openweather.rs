use std::time::Duration;

use serde::Deserialize;

use super::{Conditions, WeatherError, WeatherSource};
use crate::model::config::WeatherConfig;

const CURRENT_URL: &str = "http://api.openweathermap.org/data/2.5/weather";
const KELVIN_OFFSET: f64 = 273.15;

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    #[serde(default)]
    main: Option<MainBlock>,
    #[serde(default)]
    weather: Vec<WeatherBlock>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WeatherBlock {
    icon: Option<String>,
}

/// OpenWeather current-conditions client.
pub struct OpenWeather {
    agent: ureq::Agent,
    api_key: String,
    city_id: String,
}

impl OpenWeather {
    pub fn new(config: &WeatherConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self {
            agent,
            api_key: config.api_key.clone(),
            city_id: config.city_id.clone(),
        }
    }
}

impl WeatherSource for OpenWeather {
    fn fetch(&mut self) -> Result<Conditions, WeatherError> {
        if self.api_key.is_empty() || self.city_id.is_empty() {
            return Err(WeatherError::NotConfigured);
        }

        tracing::info!(city = %self.city_id, "fetching weather");
        let response: CurrentResponse = self
            .agent
            .get(CURRENT_URL)
            .query("id", &self.city_id)
            .query("APPID", &self.api_key)
            .call()
            .map_err(|err| WeatherError::Http(err.to_string()))?
            .into_json()?;

        Ok(conditions_from(response))
    }
}

fn conditions_from(response: CurrentResponse) -> Conditions {
    Conditions {
        temperature: response
            .main
            .and_then(|main| main.temp)
            .map(|kelvin| (kelvin - KELVIN_OFFSET) as i32),
        icon: response.weather.into_iter().next().and_then(|w| w.icon),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kelvin_truncates_to_whole_celsius() {
        let raw = r#"{"main":{"temp":295.9},"weather":[{"icon":"01d"},{"icon":"02d"}]}"#;
        let conditions = conditions_from(serde_json::from_str(raw).unwrap());
        assert_eq!(conditions.temperature, Some(22));
        assert_eq!(conditions.icon.as_deref(), Some("01d"));
    }

    #[test]
    fn missing_blocks_are_tolerated() {
        let conditions = conditions_from(serde_json::from_str("{}").unwrap());
        assert_eq!(conditions, Conditions::default());
    }

    #[test]
    fn unconfigured_client_does_not_hit_the_network() {
        let mut client = OpenWeather::new(&WeatherConfig {
            api_key: String::new(),
            city_id: "2643743".into(),
            timeout_secs: 1,
        });
        assert!(matches!(client.fetch(), Err(WeatherError::NotConfigured)));
    }
}
