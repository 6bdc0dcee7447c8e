/// Rendering side of the gallery
///
/// - `grid.rs` - the tile window and the `GalleryView` seam
/// - `animation.rs` - clock-free scroll tween
/// - `tiles.rs` - iced widgets for the tile grid

pub mod animation;
pub mod grid;
pub mod tiles;
