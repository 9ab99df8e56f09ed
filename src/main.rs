mod app_core;
mod config;
mod error;
mod search;
mod spotify_client;
mod ui_manager;

use app_core::App;
use config::{AppConfig, Credentials};
use error::AlbumPickerError;
use spotify_client::SpotifyClient;
use ui_manager::UIManager;

#[tokio::main]
async fn main() -> Result<(), AlbumPickerError> {
    // Logs go to stderr, the grid to stdout
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Album Picker...");

    let config = AppConfig::load()?;

    let credentials = match Credentials::load() {
        Ok(credentials) => Some(credentials),
        Err(e) => {
            log::error!("Spotify credentials unavailable: {}", e);
            None
        }
    };

    let spotify_client = SpotifyClient::new(&config, credentials)?;
    let ui = UIManager::new(&config);

    let mut app = App::new(spotify_client, ui);
    app.initialize().await?;
    if !app.state().is_authenticated() {
        log::warn!("Running without an access token; searches are disabled");
    }

    ui_manager::spawn_input_reader(app.sender());
    app.run().await
}
