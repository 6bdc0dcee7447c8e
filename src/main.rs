use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};
use iced::keyboard::{self, key::Named, Key};
use iced::mouse::{self, ScrollDelta};
use iced::widget::column;
use iced::widget::image::Handle;
use iced::{event, time, window, Element, Event, Subscription, Task, Theme};
use log::{error, info, warn};
use std::path::PathBuf;

mod config;
mod error;
mod source;
mod state;
mod ui;

use config::GalleryConfig;
use error::SourceError;
use source::{run_fetch, thumbnail, FlickrSource, RequestId};
use state::controller::{Controller, Effect, State};
use state::data::{NavKey, PhotoLink, WheelDirection};
use ui::grid::{GalleryView, TileId, TileWindow};
use ui::tiles;

/// Main application state
struct Gallery {
    /// Navigation, paging and the rendered tile window
    controller: Controller<TileWindow>,
    /// Where pages of photo links come from
    source: FlickrSource,
    /// Status message to display to the user
    status: String,
    /// Offset the grid was last scrolled to
    synced_offset: f32,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// A page fetch finished
    PageLoaded(RequestId, Result<Vec<PhotoLink>, SourceError>),
    /// A tile image finished downloading
    TileLoaded(TileId, Result<Handle, String>),
    /// Arrow key released
    Key(NavKey),
    /// Mouse wheel notch
    Wheel(WheelDirection),
    /// The wheel delay ran out
    WheelElapsed,
    /// Scroll animation timer tick
    Frame,
    /// The grid's scrollable reported a new vertical offset
    GridScrolled(f32),
    /// User pressed Escape
    CancelFetch,
    /// User asked to reload after a failed start
    Retry,
}

impl Gallery {
    /// Create the gallery and start loading the first page
    fn new(config: GalleryConfig, source: FlickrSource) -> (Self, Task<Message>) {
        let view = TileWindow::new(config.row_height(), config.scroll_steps);
        let (controller, request) = Controller::new(config, view);

        let mut gallery = Gallery {
            controller,
            source,
            status: "Loading photos…".to_string(),
            synced_offset: 0.0,
        };
        let task = gallery.perform(Some(Effect::Fetch(request)));
        (gallery, task)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        let task = match message {
            Message::PageLoaded(id, result) => {
                let effect = self.controller.on_page_loaded(id, result);
                self.status = self.summary();
                self.perform(effect)
            }
            Message::TileLoaded(id, result) => {
                let handle = match result {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        warn!("{}", e);
                        None
                    }
                };
                self.controller.view_mut().set_image(id, handle);
                Task::none()
            }
            Message::Key(key) => {
                self.controller.on_key(key);
                self.status = self.summary();
                Task::none()
            }
            Message::Wheel(direction) => {
                let effect = self.controller.on_wheel(direction);
                self.perform(effect)
            }
            Message::WheelElapsed => {
                self.controller.on_wheel_elapsed();
                self.status = self.summary();
                Task::none()
            }
            Message::Frame => {
                let before = (self.controller.page(), self.controller.window());
                let effect = self.controller.on_frame();
                // Landing a scroll can page the window from the cache
                if before != (self.controller.page(), self.controller.window()) {
                    self.status = self.summary();
                }
                self.perform(effect)
            }
            Message::GridScrolled(offset) => {
                if self.controller.view_mut().viewport_moved(offset) {
                    self.synced_offset = offset;
                }
                Task::none()
            }
            Message::CancelFetch => {
                if self.controller.cancel_fetch() {
                    self.status = if self.controller.cache().is_empty() {
                        "Loading cancelled. Press R to retry.".to_string()
                    } else {
                        "Loading cancelled. Move again to retry.".to_string()
                    };
                }
                Task::none()
            }
            Message::Retry => {
                let effect = self.controller.retry();
                self.perform(effect)
            }
        };

        Task::batch([task, self.load_new_tiles(), self.sync_scroll()])
    }

    /// Turn a controller effect into a task
    fn perform(&mut self, effect: Option<Effect>) -> Task<Message> {
        match effect {
            None => Task::none(),
            Some(Effect::Fetch(request)) => {
                self.status = format!("Loading page {}…", request.page);

                let id = request.id;
                let timeout = self.controller.config().fetch_timeout();
                Task::perform(
                    run_fetch(self.source.clone(), request, timeout),
                    move |result| Message::PageLoaded(id, result),
                )
            }
            Some(Effect::ScheduleWheelMove(delay)) => {
                Task::perform(
                    async move { tokio::time::sleep(delay).await },
                    |_| Message::WheelElapsed,
                )
            }
            Some(Effect::Failed(err)) => {
                error!("{}", err);
                self.status = format!("⚠️  {}", err);
                Task::none()
            }
        }
    }

    /// Start downloads for tiles rendered during the last update
    fn load_new_tiles(&mut self) -> Task<Message> {
        let tile_height = self.controller.config().img_height;
        let fresh = self.controller.view_mut().drain_fresh();

        Task::batch(fresh.into_iter().map(|(id, url)| {
            Task::perform(
                thumbnail::load_tile_image(self.source.client().clone(), url, tile_height),
                move |result| Message::TileLoaded(id, result),
            )
        }))
    }

    /// Move the scrollable to wherever the tile window says it should be
    fn sync_scroll(&mut self) -> Task<Message> {
        let offset = self.controller.view().offset();
        if offset == self.synced_offset {
            return Task::none();
        }
        self.synced_offset = offset;
        tiles::scroll_to(offset)
    }

    fn summary(&self) -> String {
        let cache = self.controller.cache();
        if cache.is_empty() {
            return "No photos loaded. Press R to retry.".to_string();
        }

        let selection = self.controller.selection();
        let mut summary = format!(
            "Page {} · photo {} of {}",
            self.controller.page(),
            selection + 1,
            cache.len()
        );
        if let Some(link) = cache.get(selection) {
            summary.push_str(&format!(" · {}", link));
        }
        if self.controller.state() == State::AwaitingMoreLoad {
            summary.push_str(" · loading more…");
        }
        summary
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let config = self.controller.config();

        column![
            tiles::grid(
                self.controller.view(),
                config.columns_per_row,
                config.img_height,
                config.row_margin,
            ),
            tiles::status_line(&self.status),
        ]
        .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![
            keyboard::on_key_release(key_message),
            event::listen_with(wheel_message),
        ];

        // Frames only tick while a scroll animation is running
        if self.controller.view().is_scrolling() {
            subscriptions.push(
                time::every(self.controller.config().scroll_interval()).map(|_| Message::Frame),
            );
        }

        Subscription::batch(subscriptions)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn key_message(key: Key, _modifiers: keyboard::Modifiers) -> Option<Message> {
    match key.as_ref() {
        Key::Named(Named::ArrowLeft) => Some(Message::Key(NavKey::Left)),
        Key::Named(Named::ArrowRight) => Some(Message::Key(NavKey::Right)),
        Key::Named(Named::ArrowUp) => Some(Message::Key(NavKey::Up)),
        Key::Named(Named::ArrowDown) => Some(Message::Key(NavKey::Down)),
        Key::Named(Named::Escape) => Some(Message::CancelFetch),
        Key::Character("r") | Key::Character("R") => Some(Message::Retry),
        _ => None,
    }
}

fn wheel_message(event: Event, _status: event::Status, _window: window::Id) -> Option<Message> {
    let Event::Mouse(mouse::Event::WheelScrolled { delta }) = event else {
        return None;
    };

    let y = match delta {
        ScrollDelta::Lines { y, .. } | ScrollDelta::Pixels { y, .. } => y,
    };

    // Positive y means the wheel was rolled away from the user
    if y < 0.0 {
        Some(Message::Wheel(WheelDirection::Down))
    } else if y > 0.0 {
        Some(Message::Wheel(WheelDirection::Up))
    } else {
        None
    }
}

/// Log files go to ~/.local/share/infinite-gallery/logs on Linux
fn log_dir() -> Option<PathBuf> {
    let mut dir = dirs::data_dir()?;
    dir.push("infinite-gallery");
    dir.push("logs");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

fn start_logger() -> Option<LoggerHandle> {
    let Some(log_dir) = log_dir() else {
        eprintln!("Failed to create log directory");
        return None;
    };

    let logger = Logger::try_with_env_or_str(
        "info, iced=error, wgpu_hal=error, wgpu_core=error, naga=error, cosmic_text=error",
    )
    .and_then(|logger| {
        logger
            .log_to_file(
                FileSpec::default()
                    .directory(&log_dir)
                    .basename("infinite-gallery")
                    .suffix("log")
                    .suppress_timestamp(),
            )
            .rotate(Criterion::Size(256 * 1024), Naming::Numbers, Cleanup::KeepLogFiles(3))
            .duplicate_to_stderr(Duplicate::Warn)
            .start()
    });

    match logger {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Failed to start logger: {}", e);
            None
        }
    }
}

fn main() -> iced::Result {
    // Keep the handle alive, dropping it stops file logging
    let _logger = start_logger();
    info!("Starting {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = match GalleryConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let source = match FlickrSource::new(config.api_url.clone(), config.api_key.clone()) {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to set up the HTTP client: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Paging {} photos per page, {} per row, keeping {} in reserve",
        config.page_size, config.columns_per_row, config.offset_margin
    );

    iced::application("Infinite Gallery", Gallery::update, Gallery::view)
        .subscription(Gallery::subscription)
        .theme(Gallery::theme)
        .centered()
        .run_with(move || Gallery::new(config, source))
}
