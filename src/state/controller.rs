use log::{debug, info, warn};
use std::ops::Range;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::cache::{LinkCache, PageStatus};
use super::data::{row_of, NavKey, PhotoLink, Placement, WheelDirection};
use crate::config::GalleryConfig;
use crate::error::{GalleryError, SourceError};
use crate::source::{FetchRequest, RequestId};
use crate::ui::grid::{GalleryView, ScrollStatus};

/// Work the host has to carry out for the controller
#[derive(Debug)]
pub enum Effect {
    /// Fetch a page and report back through `on_page_loaded`
    Fetch(FetchRequest),
    /// Call `on_wheel_elapsed` after this delay
    ScheduleWheelMove(Duration),
    /// Something went wrong; show it to the user
    Failed(GalleryError),
}

/// Coarse controller state, for callers and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    AwaitingInitialLoad,
    Idle,
    AwaitingMoreLoad,
}

/// A fetch that is still outstanding
#[derive(Debug)]
struct Pending {
    id: RequestId,
    api_page: u32,
    cancel: CancellationToken,
}

#[derive(Debug)]
enum Phase {
    AwaitingInitialLoad(Pending),
    Idle,
    AwaitingMoreLoad { pending: Pending, next_page: u32 },
}

/// Wheel events are coalesced: the first one arms a delayed move, the
/// rest are dropped until that move has been issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WheelState {
    Ready,
    Cooling { step: isize },
}

/// Row checks to run once the current scroll animation lands
#[derive(Debug, Clone, Copy)]
struct ScrollTrigger {
    row: usize,
    moved_up: bool,
}

/// Navigation and paging state of the gallery.
///
/// The controller owns the link cache and the selection and decides when
/// to fetch, when to reuse cached links and when to evict tiles. All tile
/// work goes through the `GalleryView`; all I/O is handed back to the host
/// as `Effect`s.
pub struct Controller<V: GalleryView> {
    config: GalleryConfig,
    view: V,
    cache: LinkCache,
    /// 1-based page of the rendered window
    page: u32,
    /// Absolute cache index of the first rendered tile
    window_start: usize,
    window_len: usize,
    /// Absolute cache index of the highlighted photo
    selection: usize,
    phase: Phase,
    wheel: WheelState,
    trigger: Option<ScrollTrigger>,
    next_request: u64,
}

impl<V: GalleryView> Controller<V> {
    /// Build the controller and the request for the first page
    pub fn new(config: GalleryConfig, view: V) -> (Self, FetchRequest) {
        let mut controller = Self {
            cache: LinkCache::new(config.page_size),
            config,
            view,
            page: 1,
            window_start: 0,
            window_len: 0,
            selection: 0,
            phase: Phase::Idle,
            wheel: WheelState::Ready,
            trigger: None,
            next_request: 0,
        };

        let (pending, request) = controller.issue_request(1);
        controller.phase = Phase::AwaitingInitialLoad(pending);
        (controller, request)
    }

    // ========== Accessors ==========

    pub fn state(&self) -> State {
        match self.phase {
            Phase::AwaitingInitialLoad(_) => State::AwaitingInitialLoad,
            Phase::Idle => State::Idle,
            Phase::AwaitingMoreLoad { .. } => State::AwaitingMoreLoad,
        }
    }

    pub fn is_fetching(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn selection(&self) -> usize {
        self.selection
    }

    pub fn cache(&self) -> &LinkCache {
        &self.cache
    }

    /// Absolute cache range currently rendered
    pub fn window(&self) -> Range<usize> {
        self.window_start..self.window_end()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    fn window_end(&self) -> usize {
        self.window_start + self.window_len
    }

    fn columns(&self) -> usize {
        self.config.columns_per_row
    }

    // ========== Input ==========

    pub fn on_key(&mut self, key: NavKey) {
        self.move_selection(key.step(self.columns()));
    }

    pub fn on_wheel(&mut self, direction: WheelDirection) -> Option<Effect> {
        if let WheelState::Cooling { .. } = self.wheel {
            return None;
        }
        self.wheel = WheelState::Cooling {
            step: direction.step(self.columns()),
        };
        Some(Effect::ScheduleWheelMove(self.config.wheel_delay()))
    }

    /// The wheel delay ran out: issue the armed move and accept wheel
    /// events again
    pub fn on_wheel_elapsed(&mut self) {
        if let WheelState::Cooling { step } = std::mem::replace(&mut self.wheel, WheelState::Ready) {
            self.move_selection(step);
        }
    }

    /// Move the highlight by `step` tiles.
    ///
    /// Ignored while a fetch is outstanding. Moves that would leave the
    /// rendered window are rejected. Paging checks run when the scroll
    /// animation started here finishes.
    pub fn move_selection(&mut self, step: isize) {
        if step == 0 || self.is_fetching() || self.window_len == 0 {
            return;
        }

        let Some(target) = self.selection.checked_add_signed(step) else {
            return;
        };
        if target < self.window_start || target >= self.window_end() {
            debug!("Rejected move to {} outside {:?}", target, self.window());
            return;
        }

        let old_row = row_of(self.selection - self.window_start, self.columns());
        let relative = target - self.window_start;
        let row = row_of(relative, self.columns());

        self.selection = target;
        self.view.select_element(relative);
        self.view.scroll_to_row(row, true);
        self.trigger = Some(ScrollTrigger {
            row,
            moved_up: row < old_row,
        });
    }

    /// One animation frame. When the scroll lands, the paging triggers of
    /// the move that started it are evaluated.
    pub fn on_frame(&mut self) -> Option<Effect> {
        match self.view.advance_scroll() {
            ScrollStatus::Finished => {
                let trigger = self.trigger.take()?;
                self.evaluate_trigger(trigger)
            }
            ScrollStatus::Moving | ScrollStatus::Idle => None,
        }
    }

    fn evaluate_trigger(&mut self, trigger: ScrollTrigger) -> Option<Effect> {
        if trigger.row + 1 == self.config.rows_per_page() {
            // Second-to-last row of the window
            self.get_more_photos()
        } else if trigger.moved_up && trigger.row == 1 && self.page > 1 {
            self.get_cached_photos();
            None
        } else {
            None
        }
    }

    // ========== Paging ==========

    /// Links that paging forward would append
    fn forward_slice(&self) -> Range<usize> {
        self.window_end()..self.window_end() + self.config.advance()
    }

    /// Advance the window by one page, from the cache if it already holds
    /// the links, otherwise by fetching the next API page.
    pub fn get_more_photos(&mut self) -> Option<Effect> {
        if self.is_fetching() || self.window_len == 0 {
            return None;
        }

        let next_page = self.page + 1;
        let slice = self.forward_slice();

        if slice.end <= self.cache.len() {
            debug!("Page {} served from cache ({:?})", next_page, slice);
            self.shift_forward(slice);
            return None;
        }

        let api_page = self.cache.next_page();
        let (pending, request) = self.issue_request(api_page);
        info!("Fetching page {} for window page {}", api_page, next_page);
        self.phase = Phase::AwaitingMoreLoad { pending, next_page };
        Some(Effect::Fetch(request))
    }

    /// Evict from the start, append `slice` at the end, keep the same
    /// photo selected. Returns false if there was nothing to show.
    fn shift_forward(&mut self, slice: Range<usize>) -> bool {
        let columns = self.columns();
        let available = slice.end.min(self.cache.len()).saturating_sub(slice.start);
        // Whole rows only, so the grid stays aligned
        let count = available / columns * columns;
        if count == 0 {
            info!("No more photos after index {}", slice.start);
            return false;
        }

        let links: Vec<PhotoLink> = self.cache.slice(slice.start..slice.start + count).to_vec();
        let removed = count.min(self.window_len);

        self.view.remove_elements(removed, Placement::Start);
        self.view.render(&links, Placement::End);

        self.window_start += removed;
        self.window_len = self.window_len - removed + count;
        self.page += 1;

        if self.selection < self.window_start {
            self.selection = self.window_start + self.selection % columns;
        }
        self.reselect();
        true
    }

    /// Step the window back one page using cached links only
    pub fn get_cached_photos(&mut self) {
        if self.is_fetching() || self.page <= 1 || self.window_start == 0 {
            return;
        }

        let amount = self.config.advance().min(self.window_start);
        let previous = self.window_start - amount..self.window_start;
        let links: Vec<PhotoLink> = self.cache.slice(previous.clone()).to_vec();
        let removed = amount.min(self.window_len);

        debug!("Restoring page {} from cache ({:?})", self.page - 1, previous);
        self.view.remove_elements(removed, Placement::End);
        self.view.render(&links, Placement::Start);

        self.window_start = previous.start;
        self.window_len = self.window_len - removed + links.len();
        self.page -= 1;

        if self.selection >= self.window_end() {
            self.selection = self.window_end() - 1;
        }
        self.reselect();
    }

    /// Re-highlight the selection after the window moved and snap to it
    fn reselect(&mut self) {
        debug_assert_eq!(self.view.len(), self.window_len);
        let relative = self.selection - self.window_start;
        self.view.select_element(relative);
        self.view.scroll_to_row(row_of(relative, self.columns()), false);
    }

    // ========== Fetch lifecycle ==========

    fn issue_request(&mut self, api_page: u32) -> (Pending, FetchRequest) {
        self.next_request += 1;
        let id = RequestId(self.next_request);
        let cancel = CancellationToken::new();

        let request = FetchRequest {
            id,
            page: api_page,
            page_size: self.config.page_size,
            cancel: cancel.clone(),
        };
        (Pending { id, api_page, cancel }, request)
    }

    /// Completion of a fetch issued earlier. Completions that don't match
    /// the outstanding request are ignored.
    pub fn on_page_loaded(
        &mut self,
        id: RequestId,
        result: Result<Vec<PhotoLink>, SourceError>,
    ) -> Option<Effect> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::AwaitingInitialLoad(pending) if pending.id == id => {
                self.finish_initial_load(pending.api_page, result)
            }
            Phase::AwaitingMoreLoad { pending, next_page } if pending.id == id => {
                self.finish_more_load(pending.api_page, next_page, result)
            }
            phase => {
                debug!("Ignoring stale completion {:?}", id);
                self.phase = phase;
                None
            }
        }
    }

    fn finish_initial_load(
        &mut self,
        api_page: u32,
        result: Result<Vec<PhotoLink>, SourceError>,
    ) -> Option<Effect> {
        let links = match result {
            Ok(links) => links,
            Err(err) => {
                warn!("Initial load failed: {}", err);
                return Some(Effect::Failed(GalleryError::InitialLoad(err)));
            }
        };

        info!("Loaded {} photos for page {}", links.len(), api_page);
        if !self.cache.append_page(api_page, links) {
            warn!("Dropping out-of-order page {}", api_page);
            return None;
        }

        let first: Vec<PhotoLink> = self.cache.slice(0..self.config.page_size).to_vec();
        if first.is_empty() {
            info!("The photo API returned no photos");
            return None;
        }

        self.view.render(&first, Placement::End);
        self.window_start = 0;
        self.window_len = first.len();
        self.selection = 0;
        self.view.select_element(0);
        self.view.scroll_to_row(1, false);
        None
    }

    fn finish_more_load(
        &mut self,
        api_page: u32,
        next_page: u32,
        result: Result<Vec<PhotoLink>, SourceError>,
    ) -> Option<Effect> {
        let links = match result {
            Ok(links) => links,
            Err(err) => {
                warn!("Loading page {} failed: {}", api_page, err);
                return Some(Effect::Failed(GalleryError::MorePhotos {
                    page: api_page,
                    source: err,
                }));
            }
        };

        info!("Loaded {} photos for page {}", links.len(), api_page);
        if self.cache.page_status(api_page) == PageStatus::Fetched
            || !self.cache.append_page(api_page, links)
        {
            warn!("Dropping out-of-order page {}", api_page);
            return None;
        }

        let slice = self.forward_slice();
        if self.shift_forward(slice) {
            debug!("Advanced to window page {}", next_page);
        }
        None
    }

    /// Stop waiting for the outstanding fetch, if any. State stays as it
    /// was before the fetch was issued.
    pub fn cancel_fetch(&mut self) -> bool {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::AwaitingInitialLoad(pending) | Phase::AwaitingMoreLoad { pending, .. } => {
                info!("Cancelled fetch of page {}", pending.api_page);
                pending.cancel.cancel();
                true
            }
            Phase::Idle => false,
        }
    }

    /// Start over after the first page failed to load
    pub fn retry(&mut self) -> Option<Effect> {
        if self.is_fetching() || !self.cache.is_empty() {
            return None;
        }
        let (pending, request) = self.issue_request(self.cache.next_page());
        self.phase = Phase::AwaitingInitialLoad(pending);
        Some(Effect::Fetch(request))
    }
}
