use iced::widget::image::Handle;
use std::collections::VecDeque;

use super::animation::{row_offset, ScrollTween, TweenStep};
use crate::state::data::{PhotoLink, Placement};

/// Surface the controller renders into.
///
/// Indices passed to `select_element` are positions inside the currently
/// rendered window, not absolute cache indices.
pub trait GalleryView {
    /// Insert one tile per link as a single batch at either end.
    /// Existing tiles are left alone.
    fn render(&mut self, links: &[PhotoLink], placement: Placement);

    /// Remove up to `count` tiles from the chosen end.
    /// Asking for more tiles than exist removes all of them.
    fn remove_elements(&mut self, count: usize, from: Placement);

    /// Highlight the tile at `index`, clearing any previous highlight
    fn select_element(&mut self, index: usize);

    /// Bring `row` (1-based) into view, either at once or as an animation
    /// driven by `advance_scroll`
    fn scroll_to_row(&mut self, row: usize, animate: bool);

    /// Advance a running scroll animation by one frame
    fn advance_scroll(&mut self) -> ScrollStatus;

    fn is_scrolling(&self) -> bool;

    /// Number of rendered tiles
    fn len(&self) -> usize;
}

/// What a frame did to the scroll animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollStatus {
    /// No animation was running
    Idle,
    /// Still on the way
    Moving,
    /// The animation just reached its target
    Finished,
}

/// Stable identity of a tile, survives evictions at either end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(u64);

/// Image state of a tile
#[derive(Debug, Clone)]
pub enum TileImage {
    Loading,
    Ready(Handle),
    /// No URL, or the download/decode failed
    Placeholder,
}

#[derive(Debug, Clone)]
pub struct Tile {
    pub id: TileId,
    pub link: PhotoLink,
    pub image: TileImage,
}

/// The rendered window: an ordered list of tiles plus the scroll state
/// of the grid that shows them
#[derive(Debug)]
pub struct TileWindow {
    tiles: VecDeque<Tile>,
    selected: Option<TileId>,
    next_id: u64,
    row_height: f32,
    scroll_steps: u32,
    offset: f32,
    tween: Option<ScrollTween>,
    /// Tiles rendered since the last `drain_fresh`, waiting for a download
    fresh: Vec<(TileId, String)>,
}

impl TileWindow {
    pub fn new(row_height: f32, scroll_steps: u32) -> Self {
        Self {
            tiles: VecDeque::new(),
            selected: None,
            next_id: 0,
            row_height,
            scroll_steps,
            offset: 0.0,
            tween: None,
            fresh: Vec::new(),
        }
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Links in render order
    #[cfg(test)]
    pub fn links(&self) -> Vec<PhotoLink> {
        self.tiles.iter().map(|tile| tile.link.clone()).collect()
    }

    pub fn is_selected(&self, id: TileId) -> bool {
        self.selected == Some(id)
    }

    /// Position of the highlighted tile in the window
    #[cfg(test)]
    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.selected?;
        self.tiles.iter().position(|tile| tile.id == selected)
    }

    /// Current vertical scroll offset in pixels
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// The scrollable moved on its own, e.g. from the mouse wheel.
    ///
    /// The next animation starts from there. Ignored (returns false) while
    /// a tween owns the offset.
    pub fn viewport_moved(&mut self, offset: f32) -> bool {
        if self.tween.is_some() {
            return false;
        }
        self.offset = offset;
        true
    }

    /// Hand out the downloads needed by newly rendered tiles.
    /// Tiles evicted in the meantime are skipped.
    pub fn drain_fresh(&mut self) -> Vec<(TileId, String)> {
        let mut fresh = std::mem::take(&mut self.fresh);
        fresh.retain(|(id, _)| self.tiles.iter().any(|tile| tile.id == *id));
        fresh
    }

    /// Store a finished download. Returns false if the tile is gone.
    pub fn set_image(&mut self, id: TileId, image: Option<Handle>) -> bool {
        match self.tiles.iter_mut().find(|tile| tile.id == id) {
            Some(tile) => {
                tile.image = match image {
                    Some(handle) => TileImage::Ready(handle),
                    None => TileImage::Placeholder,
                };
                true
            }
            None => false,
        }
    }

    fn make_tile(&mut self, link: &PhotoLink) -> Tile {
        let id = TileId(self.next_id);
        self.next_id += 1;

        let image = match link.url() {
            Some(url) => {
                self.fresh.push((id, url.to_string()));
                TileImage::Loading
            }
            None => TileImage::Placeholder,
        };

        Tile {
            id,
            link: link.clone(),
            image,
        }
    }
}

impl GalleryView for TileWindow {
    fn render(&mut self, links: &[PhotoLink], placement: Placement) {
        let batch: Vec<Tile> = links.iter().map(|link| self.make_tile(link)).collect();

        match placement {
            Placement::End => self.tiles.extend(batch),
            Placement::Start => {
                for tile in batch.into_iter().rev() {
                    self.tiles.push_front(tile);
                }
            }
        }
    }

    fn remove_elements(&mut self, count: usize, from: Placement) {
        let count = count.min(self.tiles.len());
        match from {
            Placement::Start => {
                self.tiles.drain(..count);
            }
            Placement::End => {
                let keep = self.tiles.len() - count;
                self.tiles.truncate(keep);
            }
        }

        if let Some(selected) = self.selected {
            if !self.tiles.iter().any(|tile| tile.id == selected) {
                self.selected = None;
            }
        }
    }

    fn select_element(&mut self, index: usize) {
        self.selected = self.tiles.get(index).map(|tile| tile.id);
    }

    fn scroll_to_row(&mut self, row: usize, animate: bool) {
        let target = row_offset(row, self.row_height);

        if !animate {
            self.tween = None;
            self.offset = target;
            return;
        }

        // A new animation takes over from wherever the previous one got to
        self.tween = Some(ScrollTween::new(self.offset, target, self.scroll_steps));
    }

    fn advance_scroll(&mut self) -> ScrollStatus {
        let Some(tween) = self.tween.as_mut() else {
            return ScrollStatus::Idle;
        };

        match tween.advance() {
            TweenStep::Moving(offset) => {
                self.offset = offset;
                ScrollStatus::Moving
            }
            TweenStep::Finished(offset) => {
                self.offset = offset;
                self.tween = None;
                ScrollStatus::Finished
            }
        }
    }

    fn is_scrolling(&self) -> bool {
        self.tween.is_some()
    }

    fn len(&self) -> usize {
        self.tiles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(range: std::ops::Range<usize>) -> Vec<PhotoLink> {
        range
            .map(|i| PhotoLink::new(format!("https://photos.test/{i}.jpg")))
            .collect()
    }

    fn window_with(range: std::ops::Range<usize>) -> TileWindow {
        let mut window = TileWindow::new(224.0, 6);
        window.render(&links(range), Placement::End);
        window
    }

    #[test]
    fn test_render_appends_and_prepends_batches() {
        let mut window = window_with(10..15);
        window.render(&links(15..18), Placement::End);
        window.render(&links(7..10), Placement::Start);
        assert_eq!(window.links(), links(7..18));
    }

    #[test]
    fn test_render_leaves_existing_tiles_alone() {
        let mut window = window_with(0..3);
        let before: Vec<TileId> = window.tiles().map(|tile| tile.id).collect();
        window.render(&links(3..5), Placement::End);
        let after: Vec<TileId> = window.tiles().take(3).map(|tile| tile.id).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_remove_from_either_end() {
        let mut window = window_with(0..10);
        window.remove_elements(3, Placement::Start);
        assert_eq!(window.links(), links(3..10));
        window.remove_elements(2, Placement::End);
        assert_eq!(window.links(), links(3..8));
        window.remove_elements(0, Placement::End);
        assert_eq!(window.len(), 5);
    }

    #[test]
    fn test_remove_more_than_rendered_removes_all() {
        let mut window = window_with(0..3);
        window.remove_elements(5, Placement::Start);
        assert_eq!(window.len(), 0);

        let mut window = window_with(0..3);
        window.remove_elements(5, Placement::End);
        assert_eq!(window.len(), 0);
    }

    #[test]
    fn test_selection_is_exclusive_and_follows_the_tile() {
        let mut window = window_with(0..10);
        window.select_element(2);
        window.select_element(7);
        assert_eq!(window.selected_index(), Some(7));
        assert_eq!(window.tiles().filter(|tile| window.is_selected(tile.id)).count(), 1);

        // Evicting from the front shifts the position, not the tile
        window.remove_elements(5, Placement::Start);
        assert_eq!(window.selected_index(), Some(2));

        window.remove_elements(5, Placement::End);
        assert_eq!(window.selected_index(), None);
    }

    #[test]
    fn test_select_out_of_range_clears() {
        let mut window = window_with(0..4);
        window.select_element(1);
        window.select_element(9);
        assert_eq!(window.selected_index(), None);
    }

    #[test]
    fn test_snap_scroll() {
        let mut window = window_with(0..50);
        window.scroll_to_row(3, false);
        assert_eq!(window.offset(), 224.0 * 1.5);
        assert!(!window.is_scrolling());
        assert_eq!(window.advance_scroll(), ScrollStatus::Idle);
        window.scroll_to_row(1, false);
        assert_eq!(window.offset(), 0.0);
    }

    #[test]
    fn test_animated_scroll_runs_for_configured_steps() {
        let mut window = window_with(0..50);
        window.scroll_to_row(4, true);
        assert!(window.is_scrolling());
        assert_eq!(window.offset(), 0.0);

        for _ in 0..5 {
            assert_eq!(window.advance_scroll(), ScrollStatus::Moving);
        }
        assert_eq!(window.advance_scroll(), ScrollStatus::Finished);
        assert_eq!(window.offset(), 224.0 * 2.5);
        assert_eq!(window.advance_scroll(), ScrollStatus::Idle);
    }

    #[test]
    fn test_animation_starts_from_native_scroll() {
        let mut window = window_with(0..50);
        assert!(window.viewport_moved(600.0));
        assert_eq!(window.offset(), 600.0);

        // Same row as before the wheel moved the grid, still scrolls back
        window.scroll_to_row(1, true);
        assert_eq!(window.advance_scroll(), ScrollStatus::Moving);
        assert_eq!(window.offset(), 500.0);

        // The tween owns the offset until it lands
        assert!(!window.viewport_moved(80.0));
        assert_eq!(window.offset(), 500.0);
        while window.advance_scroll() == ScrollStatus::Moving {}
        assert_eq!(window.offset(), 0.0);
    }

    #[test]
    fn test_fresh_tiles_need_downloads() {
        let mut window = TileWindow::new(224.0, 6);
        let mut batch = links(0..3);
        batch.push(PhotoLink::missing());
        window.render(&batch, Placement::End);

        let fresh = window.drain_fresh();
        assert_eq!(fresh.len(), 3);
        assert_eq!(fresh[0].1, "https://photos.test/0.jpg");
        assert!(window.drain_fresh().is_empty());
        assert!(matches!(
            window.tiles().last().map(|tile| &tile.image),
            Some(TileImage::Placeholder)
        ));
    }

    #[test]
    fn test_evicted_tiles_drop_their_downloads() {
        let mut window = window_with(0..5);
        window.remove_elements(2, Placement::Start);
        let fresh = window.drain_fresh();
        assert_eq!(fresh.len(), 3);

        let gone = TileId(0);
        assert!(!window.set_image(gone, None));
        assert!(window.set_image(fresh[0].0, None));
    }
}
