use crate::error::Result;
use crate::spotify_client::{AccessToken, Album, AlbumCatalog, ArtistLookup};

/// Result of a completed artist search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Albums of the first matching artist, in API order
    Albums(Vec<Album>),
    ArtistNotFound,
}

/// Resolve `query` to an artist, then fetch that artist's albums.
///
/// The two calls are strictly sequential since the albums call needs the
/// artist id from the first response.
pub async fn search_albums<C: AlbumCatalog>(
    catalog: &C,
    token: &AccessToken,
    query: &str,
) -> Result<SearchOutcome> {
    let artist_id = match catalog.find_artist(token, query).await? {
        ArtistLookup::Found(id) => id,
        ArtistLookup::NotFound => {
            log::info!("No artist found for {:?}", query);
            return Ok(SearchOutcome::ArtistNotFound);
        }
    };
    log::info!("Search input: {:?}, artist id: {}", query, artist_id);

    let albums = catalog.artist_albums(token, &artist_id).await?;
    log::info!("Fetched {} albums for artist {}", albums.len(), artist_id);

    Ok(SearchOutcome::Albums(albums))
}

/// Monotonic counter tagging each submitted search
#[derive(Debug, Default)]
pub struct SearchSequence {
    latest: u64,
}

impl SearchSequence {
    pub fn next(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    /// Only the most recently issued search may commit its result
    pub fn is_latest(&self, seq: u64) -> bool {
        seq == self.latest
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }
}
