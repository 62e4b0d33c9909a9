//! Object uploads.

use backend_core::{Payload, Timestamp};
use tracing::debug;

use crate::backend::Backend;
use crate::error::Result;

/// Prefix under which crop photos are stored.
pub const CROP_IMAGE_PREFIX: &str = "crop-images";

/// Storage path for a crop photo: `crop-images/{owner}/{micros}-{file name}`.
///
/// Path separators in `owner_id` and `file_name` are replaced so neither can
/// escape the owner's prefix.
pub fn object_path(owner_id: &str, stamp: Timestamp, file_name: &str) -> String {
    let owner = path_segment(owner_id);
    let name = path_segment(file_name.trim());
    let name = if name.is_empty() { "upload".to_string() } else { name };
    format!(
        "{}/{}/{}-{}",
        CROP_IMAGE_PREFIX,
        owner,
        stamp.as_micros(),
        name
    )
}

fn path_segment(raw: &str) -> String {
    raw.chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect()
}

/// Store `payload` at `path` and resolve its public URL.
pub async fn upload(backend: &Backend, path: &str, payload: Payload) -> Result<String> {
    let size = payload.len();
    backend.objects().put(path, payload).await?;
    let url = backend.objects().download_url(path).await?;
    debug!(path, size, "Uploaded object");
    Ok(url)
}

/// Upload a crop photo under the owner's prefix and return its URL.
pub async fn upload_crop_image(backend: &Backend, owner_id: &str, payload: Payload) -> Result<String> {
    let path = object_path(owner_id, backend.clock().now(), &payload.file_name);
    upload(backend, &path, payload).await
}
