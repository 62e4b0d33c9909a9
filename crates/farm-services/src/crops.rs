//! Crop records and their photos.

use backend_core::{Fields, Payload};
use serde_json::Value;

use crate::backend::Backend;
use crate::documents;
use crate::error::Result;
use crate::models::{fields, CropRecord, CropRecordUpdate, EntityKind, NewCropRecord};
use crate::upload;

/// The user's crop records, newest first.
pub async fn get_crop_records(backend: &Backend, user_id: &str) -> Result<Vec<CropRecord>> {
    documents::list_for_owner(backend, user_id).await
}

/// Add a crop record, uploading `image` first when given.
///
/// The stored `imageUrl` is the URL the upload resolved to, or `null` when
/// no image was supplied. A failed upload aborts the insert.
pub async fn add_crop_record(
    backend: &Backend,
    user_id: &str,
    record: &NewCropRecord,
    image: Option<Payload>,
) -> Result<String> {
    let image_url = match image {
        Some(payload) => Value::String(upload::upload_crop_image(backend, user_id, payload).await?),
        None => Value::Null,
    };

    let mut extra = Fields::new();
    extra.insert(fields::IMAGE_URL.to_string(), image_url);

    let id = documents::insert_owned(
        backend,
        EntityKind::CropRecord,
        user_id,
        record,
        extra,
        &[fields::CREATED_AT, fields::UPDATED_AT],
    )
    .await?;
    tracing::info!("Added crop record {} for user {}", id, user_id);
    Ok(id)
}

pub async fn update_crop_record(
    backend: &Backend,
    record_id: &str,
    update: &CropRecordUpdate,
) -> Result<()> {
    documents::update(backend, EntityKind::CropRecord, record_id, update).await
}
