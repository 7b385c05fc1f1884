use crate::error::{EtlError, Result};
use crate::models::{Temperature, WeatherObservation};
use crate::transform::fields::{epoch, float, integer, text};
use chrono::NaiveDateTime;
use serde_json::Value;

/// Flatten one current-weather payload into exactly one observation.
///
/// Every field is looked up independently; anything missing becomes `None`.
/// Only a payload that is not a JSON object at all is rejected.
pub fn normalize_weather(payload: &Value, fetched_at: NaiveDateTime) -> Result<WeatherObservation> {
    if !payload.is_object() {
        return Err(EtlError::Validation(
            "weather payload is not a JSON object".to_string(),
        ));
    }

    Ok(WeatherObservation {
        city: text(payload, "/name"),
        country: text(payload, "/sys/country"),
        description: text(payload, "/weather/0/description"),
        temp: Temperature::from_source(float(payload, "/main/temp")),
        feels_like: Temperature::from_source(float(payload, "/main/feels_like")),
        temp_min: Temperature::from_source(float(payload, "/main/temp_min")),
        temp_max: Temperature::from_source(float(payload, "/main/temp_max")),
        pressure: integer(payload, "/main/pressure"),
        humidity: integer(payload, "/main/humidity"),
        wind_speed: float(payload, "/wind/speed"),
        recorded_at: epoch(payload, "/dt"),
        sunrise: epoch(payload, "/sys/sunrise"),
        sunset: epoch(payload, "/sys/sunset"),
        fetched_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn full_payload() -> Value {
        json!({
            "name": "Portland",
            "sys": { "country": "US", "sunrise": 1_700_000_000, "sunset": 1_700_036_000 },
            "weather": [{ "description": "overcast clouds" }, { "description": "mist" }],
            "main": {
                "temp": 283.15,
                "feels_like": 282.0,
                "temp_min": 281.5,
                "temp_max": 284.9,
                "pressure": 1021,
                "humidity": 87
            },
            "wind": { "speed": 3.6 },
            "dt": 1_700_010_000
        })
    }

    #[test]
    fn test_full_payload() {
        let now = Utc::now().naive_utc();
        let obs = normalize_weather(&full_payload(), now).unwrap();

        assert_eq!(obs.city.as_deref(), Some("Portland"));
        assert_eq!(obs.country.as_deref(), Some("US"));
        assert_eq!(obs.description.as_deref(), Some("overcast clouds"));
        assert_eq!(obs.temp.celsius, Some(283.15));
        assert_eq!(obs.temp.fahrenheit, Some(283.15 * 9.0 / 5.0 + 32.0));
        assert_eq!(obs.temp_max.fahrenheit, Some(284.9 * 9.0 / 5.0 + 32.0));
        assert_eq!(obs.pressure, Some(1021));
        assert_eq!(obs.humidity, Some(87));
        assert_eq!(obs.wind_speed, Some(3.6));
        assert_eq!(obs.sunrise.unwrap().to_string(), "2023-11-14 22:13:20");
        assert_eq!(obs.recorded_at.unwrap().to_string(), "2023-11-15 01:00:00");
        assert_eq!(obs.fetched_at, now);
    }

    #[test]
    fn test_missing_fields_become_null() {
        let mut payload = full_payload();
        let main = payload["main"].as_object_mut().unwrap();
        main.remove("temp");
        main.remove("humidity");
        payload.as_object_mut().unwrap().remove("wind");
        payload["sys"].as_object_mut().unwrap().remove("sunset");

        let obs = normalize_weather(&payload, Utc::now().naive_utc()).unwrap();
        assert_eq!(obs.temp, Temperature::default());
        assert_eq!(obs.humidity, None);
        assert_eq!(obs.wind_speed, None);
        assert_eq!(obs.sunset, None);
        // untouched fields stay populated
        assert_eq!(obs.feels_like.celsius, Some(282.0));
        assert_eq!(obs.pressure, Some(1021));
        assert!(obs.sunrise.is_some());
    }

    #[test]
    fn test_empty_object_still_yields_one_record() {
        let obs = normalize_weather(&json!({}), Utc::now().naive_utc()).unwrap();
        assert_eq!(obs.city, None);
        assert_eq!(obs.description, None);
        assert_eq!(obs.recorded_at, None);
    }

    #[test]
    fn test_non_object_rejected() {
        let err = normalize_weather(&json!([1, 2]), Utc::now().naive_utc()).unwrap_err();
        assert!(matches!(err, EtlError::Validation(_)));
    }

    #[test]
    fn test_idempotent() {
        let now = Utc::now().naive_utc();
        let a = normalize_weather(&full_payload(), now).unwrap();
        let b = normalize_weather(&full_payload(), now).unwrap();
        assert_eq!(a, b);
    }
}
