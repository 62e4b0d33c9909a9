//! Data layer for the farm dashboard.
//!
//! This crate provides:
//!
//! - [`select_backend`] / [`BackendSelector`] - choose the SQLite backend or
//!   fall back to the mock, once per process
//! - typed document access per entity: [`users`], [`locations`], [`crops`],
//!   [`weather`], [`market`] and [`chat`]
//! - [`chat::subscribe_to_chat_messages`] - live chat delivery with a
//!   [`Subscription`] cancellation handle
//! - [`upload`] - crop photo storage
//! - [`AuthSession`] - signed-in user tracking
//! - [`Advisor`] - canned farming advice for the chat
//!
//! # Example
//!
//! ```rust,no_run
//! use farm_services::{locations, select_backend, BackendConfig, NewFarmLocation};
//!
//! # async fn example() -> Result<(), farm_services::ServiceError> {
//! let backend = select_backend(&BackendConfig::from_env()).await;
//!
//! let id = locations::add_farm_location(
//!     &backend,
//!     "user-1",
//!     &NewFarmLocation {
//!         name: "North Field".to_string(),
//!         address: "Punjab, India".to_string(),
//!         coordinates: None,
//!         area: 25.5,
//!         crop_type: "Wheat".to_string(),
//!         soil_type: "Loamy".to_string(),
//!     },
//! )
//! .await?;
//!
//! for location in locations::get_farm_locations(&backend, "user-1").await? {
//!     println!("{} {}", location.id, location.name);
//! }
//! # let _ = id;
//! # Ok(())
//! # }
//! ```

pub mod advisor;
pub mod backend;
pub mod chat;
pub mod clock;
pub mod config;
pub mod crops;
pub mod documents;
pub mod error;
pub mod locations;
pub mod market;
pub mod models;
pub mod session;
pub mod subscription;
pub mod upload;
pub mod users;
pub mod weather;

pub use advisor::Advisor;
pub use backend::{select_backend, Backend, BackendKind, BackendSelector};
pub use clock::Clock;
pub use config::BackendConfig;
pub use error::{Result, ServiceError};
pub use models::{
    AlertType, ChatMessage, Coordinates, CropAnalysis, CropRecord, CropRecordUpdate, Entity,
    EntityKind, FarmLocation, FarmLocationUpdate, HealthStatus, MarketPrice, MessageType,
    NewChatMessage, NewCropRecord, NewFarmLocation, NewMarketPrice, NewPriceAlert,
    NewWeatherAlert, PriceAlert, PriceDirection, PriceTrend, Record, Sender, UserProfile,
    UserProfileUpdate, WeatherAlert,
};
pub use session::{AuthSession, SessionState};
pub use subscription::Subscription;

pub use backend_core::{AuthUser, BackendError, Payload, Query, Timestamp};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use database::Database;
    use mock_backend::FailingBackend;

    use crate::backend::{Backend, BackendKind};

    /// A migrated in-memory database and a bundle over it.
    pub async fn sqlite_backend() -> (Backend, Database) {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        (Backend::from_database(db.clone()), db)
    }

    /// A bundle whose every operation fails.
    pub fn failing_backend() -> Backend {
        let failing = FailingBackend::default();
        Backend::from_parts(
            BackendKind::Real,
            Arc::new(failing.clone()),
            Arc::new(failing.clone()),
            Arc::new(failing),
        )
    }
}
