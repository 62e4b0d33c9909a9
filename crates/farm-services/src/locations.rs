//! Farm locations.

use backend_core::Fields;

use crate::backend::Backend;
use crate::documents;
use crate::error::Result;
use crate::models::{fields, EntityKind, FarmLocation, FarmLocationUpdate, NewFarmLocation};

/// The user's locations, newest first.
pub async fn get_farm_locations(backend: &Backend, user_id: &str) -> Result<Vec<FarmLocation>> {
    documents::list_for_owner(backend, user_id).await
}

/// Add a location owned by `user_id`, returning its id.
pub async fn add_farm_location(
    backend: &Backend,
    user_id: &str,
    location: &NewFarmLocation,
) -> Result<String> {
    let id = documents::insert_owned(
        backend,
        EntityKind::FarmLocation,
        user_id,
        location,
        Fields::new(),
        &[fields::CREATED_AT, fields::UPDATED_AT],
    )
    .await?;
    tracing::info!("Added farm location {} for user {}", id, user_id);
    Ok(id)
}

pub async fn update_farm_location(
    backend: &Backend,
    location_id: &str,
    update: &FarmLocationUpdate,
) -> Result<()> {
    documents::update(backend, EntityKind::FarmLocation, location_id, update).await
}

/// Permanently remove a location.
pub async fn delete_farm_location(backend: &Backend, location_id: &str) -> Result<()> {
    documents::delete(backend, EntityKind::FarmLocation, location_id).await?;
    tracing::info!("Deleted farm location {}", location_id);
    Ok(())
}
