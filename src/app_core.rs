use crate::error::{AlbumPickerError, Result};
use crate::search::{search_albums, SearchOutcome, SearchSequence};
use crate::spotify_client::{AccessToken, Album, AlbumCatalog};
use crate::ui_manager::{self, UIManager};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Events that can occur in the application
#[derive(Debug)]
pub enum AppEvent {
    Submit(String),
    SearchCompleted {
        seq: u64,
        result: Result<SearchOutcome>,
    },
    OpenAlbum(usize),
    InvalidCommand(String),
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Message shown above the grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(err: &AlbumPickerError) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: format!("{} error: {}", err.class().label(), err),
        }
    }
}

/// Session state. Only changed through the transitions below.
#[derive(Debug, Default)]
pub struct AppState {
    token: Option<AccessToken>,
    query: String,
    albums: Vec<Album>,
    sequence: SearchSequence,
    pending_query: Option<String>,
    notice: Option<Notice>,
}

impl AppState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn pending_query(&self) -> Option<&str> {
        self.pending_query.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token_acquired(&mut self, token: AccessToken) {
        self.token = Some(token);
    }

    pub fn token_failed(&mut self, err: &AlbumPickerError) {
        self.token = None;
        self.notice = Some(Notice::error(err));
    }

    /// Record a new search and hand out its sequence number and token.
    ///
    /// Returns `None` without touching the album list when no token is held.
    pub fn begin_search(&mut self, query: &str) -> Option<(u64, AccessToken)> {
        self.query = query.to_string();

        let Some(token) = self.token.clone() else {
            self.notice = Some(Notice::error(&AlbumPickerError::NotAuthenticated));
            return None;
        };

        let seq = self.sequence.next();
        self.pending_query = Some(query.to_string());
        self.notice = None;
        Some((seq, token))
    }

    /// Apply a finished search. Returns false if a newer search superseded it.
    pub fn complete_search(&mut self, seq: u64, result: Result<SearchOutcome>) -> bool {
        if !self.sequence.is_latest(seq) {
            log::debug!(
                "Dropping stale search result {} (latest is {})",
                seq,
                self.sequence.latest()
            );
            return false;
        }

        let query = self.pending_query.take().unwrap_or_default();
        match result {
            Ok(SearchOutcome::Albums(albums)) => {
                self.notice = albums
                    .is_empty()
                    .then(|| Notice::info(format!("No albums found for {:?}", query)));
                self.albums = albums;
            }
            Ok(SearchOutcome::ArtistNotFound) => {
                self.albums.clear();
                self.notice = Some(Notice::info(format!("No artist found for {:?}", query)));
            }
            Err(e) => {
                log::error!("Search for {:?} failed: {}", query, e);
                self.notice = Some(Notice::error(&e));
            }
        }
        true
    }

    fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }
}

/// Main application structure coordinating all components
pub struct App<C: AlbumCatalog + 'static> {
    catalog: Arc<C>,
    ui_manager: UIManager,
    state: AppState,
    event_rx: mpsc::Receiver<AppEvent>,
    event_tx: mpsc::Sender<AppEvent>,
}

impl<C: AlbumCatalog + 'static> App<C> {
    pub fn new(catalog: C, ui_manager: UIManager) -> Self {
        let (event_tx, event_rx) = mpsc::channel(100);

        Self {
            catalog: Arc::new(catalog),
            ui_manager,
            state: AppState::default(),
            event_rx,
            event_tx,
        }
    }

    /// Sender for components feeding events into the loop
    pub fn sender(&self) -> mpsc::Sender<AppEvent> {
        self.event_tx.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Acquire the session token. Failure is shown to the user, not returned.
    pub async fn initialize(&mut self) -> Result<()> {
        log::info!("Initializing application");

        match self.catalog.request_token().await {
            Ok(token) => {
                log::info!("Authenticated with Spotify");
                self.state.token_acquired(token);
            }
            Err(e) => {
                log::error!("Failed to acquire access token: {}", e);
                self.state.token_failed(&e);
            }
        }

        self.ui_manager.draw(&self.state)
    }

    /// Run the main event loop
    pub async fn run(&mut self) -> Result<()> {
        log::info!("Starting main event loop");

        while let Some(event) = self.event_rx.recv().await {
            match event {
                AppEvent::Submit(query) => self.handle_submit(query),
                AppEvent::SearchCompleted { seq, result } => {
                    if !self.state.complete_search(seq, result) {
                        continue;
                    }
                }
                AppEvent::OpenAlbum(number) => self.handle_open_album(number),
                AppEvent::InvalidCommand(command) => {
                    self.state
                        .set_notice(Notice::info(format!("Unknown command {:?}, try :help", command)));
                }
                AppEvent::Help => {
                    self.ui_manager.show_help()?;
                    continue;
                }
                AppEvent::Quit => {
                    log::info!("Quit event received");
                    break;
                }
            }
            self.ui_manager.draw(&self.state)?;
        }

        log::info!("Shutdown complete");
        Ok(())
    }

    fn handle_submit(&mut self, query: String) {
        let Some((seq, token)) = self.state.begin_search(&query) else {
            log::warn!("Search for {:?} refused, no access token", query);
            return;
        };

        let catalog = Arc::clone(&self.catalog);
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = search_albums(catalog.as_ref(), &token, &query).await;
            if let Err(e) = event_tx
                .send(AppEvent::SearchCompleted { seq, result })
                .await
            {
                log::error!("Failed to send SearchCompleted event: {}", e);
            }
        });
    }

    fn handle_open_album(&mut self, number: usize) {
        let link = self
            .state
            .albums()
            .get(number.wrapping_sub(1))
            .and_then(|album| album.link().map(str::to_string));

        match link {
            Some(url) => {
                log::info!("Opening {}", url);
                if let Err(e) = ui_manager::open_url(&url) {
                    log::error!("Failed to open browser: {}", e);
                    self.state.set_notice(Notice::error(&e));
                }
            }
            None => self
                .state
                .set_notice(Notice::info(format!("No album link for card {}", number))),
        }
    }
}
