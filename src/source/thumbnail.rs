use iced::widget::image::Handle;
use image::{imageops::FilterType, RgbaImage};
use log::debug;

/// Download one photo and scale it to the tile height.
///
/// # Returns
/// * `Ok(handle)` - Pixels ready for the grid
/// * `Err(String)` - Error message if download or decode fails
pub async fn load_tile_image(
    client: reqwest::Client,
    url: String,
    tile_height: u32,
) -> Result<Handle, String> {
    let response = client
        .get(&url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| format!("Failed to download {}: {}", url, e))?;

    let bytes = response
        .bytes()
        .await
        .map_err(|e| format!("Failed to read {}: {}", url, e))?;

    // Decoding is CPU-bound, keep it off the UI executor
    let pixels = tokio::task::spawn_blocking(move || decode_tile(&bytes, tile_height))
        .await
        .map_err(|e| format!("Task join error: {}", e))??;

    debug!("Loaded tile {}x{} from {}", pixels.width(), pixels.height(), url);
    Ok(Handle::from_rgba(pixels.width(), pixels.height(), pixels.into_raw()))
}

/// Decode any supported format and resize to `tile_height`, keeping aspect
pub fn decode_tile(bytes: &[u8], tile_height: u32) -> Result<RgbaImage, String> {
    let img = image::load_from_memory(bytes).map_err(|e| format!("Failed to decode image: {}", e))?;

    let (width, height) = scaled_size(img.width(), img.height(), tile_height);
    Ok(img.resize_exact(width, height, FilterType::Triangle).to_rgba8())
}

/// Size of an image scaled to `target_height`; never collapses to zero
pub fn scaled_size(width: u32, height: u32, target_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (1, target_height.max(1));
    }
    let scaled = (width as u64 * target_height as u64 / height as u64).max(1);
    (scaled.min(u32::MAX as u64) as u32, target_height.max(1))
}
