use iced::widget::scrollable::{self, AbsoluteOffset};
use iced::widget::{container, image, text, Column, Row, Scrollable};
use iced::{Border, Element, Length, Task, Theme};

use super::grid::{Tile, TileImage, TileWindow};
use crate::Message;

/// Horizontal gap between tiles
const TILE_SPACING: f32 = 12.0;

fn grid_id() -> scrollable::Id {
    scrollable::Id::new("tile-grid")
}

/// Scroll the grid to the window's current offset
pub fn scroll_to(offset: f32) -> Task<Message> {
    scrollable::scroll_to(grid_id(), AbsoluteOffset { x: 0.0, y: offset })
}

/// The rendered window laid out in rows of `columns` tiles.
///
/// Rows are `img_height` tall and `row_margin` apart, matching the row
/// pitch the scroll offsets are computed with.
pub fn grid<'a>(
    window: &'a TileWindow,
    columns: usize,
    img_height: u32,
    row_margin: u32,
) -> Element<'a, Message> {
    let tiles: Vec<&Tile> = window.tiles().collect();

    let rows = tiles.chunks(columns.max(1)).map(|chunk| {
        Row::with_children(
            chunk
                .iter()
                .map(|tile| tile_view(tile, window.is_selected(tile.id), img_height)),
        )
        .spacing(TILE_SPACING)
        .into()
    });

    let content = Column::with_children(rows)
        .spacing(row_margin as f32)
        .padding(TILE_SPACING)
        .width(Length::Fill);

    Scrollable::new(content)
        .id(grid_id())
        .on_scroll(|viewport| Message::GridScrolled(viewport.absolute_offset().y))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn tile_view(tile: &Tile, selected: bool, img_height: u32) -> Element<'_, Message> {
    let height = img_height as f32;
    // Landscape frame, photos are scaled to the tile height
    let width = height * 4.0 / 3.0;

    let content: Element<'_, Message> = match &tile.image {
        TileImage::Ready(handle) => image(handle.clone()).height(Length::Fixed(height)).into(),
        TileImage::Loading => text("Loading…").size(14).into(),
        TileImage::Placeholder => text(placeholder_label(tile)).size(14).into(),
    };

    container(content)
        .center_x(Length::Fixed(width))
        .center_y(Length::Fixed(height))
        .clip(true)
        .style(move |theme: &Theme| tile_style(theme, selected))
        .into()
}

/// Text shown instead of a photo
fn placeholder_label(tile: &Tile) -> &'static str {
    if tile.link.is_missing() {
        "No image"
    } else {
        "Failed to load"
    }
}

fn tile_style(theme: &Theme, selected: bool) -> container::Style {
    let palette = theme.extended_palette();

    let (color, width) = if selected {
        (palette.primary.strong.color, 3.0)
    } else {
        (palette.background.strong.color, 1.0)
    };

    container::Style {
        background: Some(palette.background.weak.color.into()),
        border: Border {
            color,
            width,
            radius: 4.0.into(),
        },
        ..container::Style::default()
    }
}

/// One-line status text shown under the grid
pub fn status_line(status: &str) -> Element<'_, Message> {
    container(text(status).size(14))
        .padding([4, 12])
        .width(Length::Fill)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::{PhotoLink, Placement};
    use crate::ui::grid::GalleryView;

    #[test]
    fn test_placeholder_label_tells_missing_from_failed() {
        let mut window = TileWindow::new(224.0, 6);
        window.render(
            &[PhotoLink::missing(), PhotoLink::new("https://live.test/1_m.jpg")],
            Placement::End,
        );

        let failed = window.drain_fresh()[0].0;
        assert!(window.set_image(failed, None));

        let labels: Vec<&str> = window.tiles().map(placeholder_label).collect();
        assert_eq!(labels, vec!["No image", "Failed to load"]);
    }
}
