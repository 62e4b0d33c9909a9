//! Weather alerts. Append and read only.

use backend_core::Fields;

use crate::backend::Backend;
use crate::documents;
use crate::error::Result;
use crate::models::{fields, EntityKind, NewWeatherAlert, WeatherAlert};

/// The user's alerts, newest first.
pub async fn get_weather_alerts(backend: &Backend, user_id: &str) -> Result<Vec<WeatherAlert>> {
    documents::list_for_owner(backend, user_id).await
}

pub async fn add_weather_alert(
    backend: &Backend,
    user_id: &str,
    alert: &NewWeatherAlert,
) -> Result<String> {
    documents::insert_owned(
        backend,
        EntityKind::WeatherAlert,
        user_id,
        alert,
        Fields::new(),
        &[fields::CREATED_AT],
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertType;
    use crate::test_support::sqlite_backend;

    #[tokio::test]
    async fn test_add_and_list() {
        let (backend, _db) = sqlite_backend().await;

        add_weather_alert(
            &backend,
            "u1",
            &NewWeatherAlert {
                alert_type: AlertType::Warning,
                title: "Heavy Rain Expected".to_string(),
                description: "Heavy rainfall expected in next 24 hours.".to_string(),
                time: Some("Tomorrow 2:00 PM".to_string()),
            },
        )
        .await
        .unwrap();
        add_weather_alert(
            &backend,
            "u1",
            &NewWeatherAlert {
                alert_type: AlertType::Info,
                title: "Optimal Spraying Conditions".to_string(),
                description: "Low wind speed and humidity.".to_string(),
                time: None,
            },
        )
        .await
        .unwrap();

        let alerts = get_weather_alerts(&backend, "u1").await.unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].alert_type, AlertType::Info);
        assert_eq!(alerts[1].time.as_deref(), Some("Tomorrow 2:00 PM"));
        assert!(alerts[0].created_at > alerts[1].created_at);

        let stored = backend
            .documents()
            .get("weatherAlerts", &alerts[0].id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.get("updatedAt").is_none());
    }
}
