use crate::app_core::{AppEvent, AppState, NoticeLevel};
use crate::config::AppConfig;
use crate::error::{AlbumPickerError, Result};
use crate::spotify_client::Album;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const TITLE: &str = "Album Picker";
const PROMPT: &str = "Search For Artist";
const COLUMN_GAP: &str = "  ";

pub const HELP_TEXT: &str = "Type an artist name and press Enter to search.
Commands:
  :open N   open album N in the browser
  :help     show this help
  :quit     exit";

/// Grid layout settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub columns: usize,
    pub card_width: usize,
}

impl Layout {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            columns: config.grid_columns.max(1),
            card_width: config.card_width.max(16),
        }
    }

    /// Characters available between the card borders
    fn inner_width(&self) -> usize {
        self.card_width - 4
    }
}

/// Render the whole screen from the current session state
pub fn render(state: &AppState, layout: Layout) -> String {
    let mut out = String::new();

    out.push_str(TITLE);
    out.push('\n');
    out.push_str(&"=".repeat(TITLE.len()));
    out.push('\n');
    out.push_str(&format!("{}: {}\n", PROMPT, state.query()));

    if let Some(notice) = state.notice() {
        let tag = match notice.level {
            NoticeLevel::Info => "note",
            NoticeLevel::Error => "error",
        };
        out.push_str(&format!("[{}] {}\n", tag, notice.message));
    }

    if let Some(query) = state.pending_query() {
        out.push_str(&format!("Searching for {:?}...\n", query));
    }

    out.push('\n');
    if state.albums().is_empty() {
        out.push_str("No albums to show.\n");
    } else {
        out.push_str(&render_grid(state.albums(), layout));
    }

    out
}

/// Lay cards out in rows of `layout.columns`, keeping list order.
///
/// Cover and album URLs are listed unbroken under each row so they stay
/// usable when copied.
pub fn render_grid(albums: &[Album], layout: Layout) -> String {
    let mut out = String::new();
    let numbered: Vec<(usize, &Album)> = albums
        .iter()
        .enumerate()
        .map(|(index, album)| (index + 1, album))
        .collect();

    for row in numbered.chunks(layout.columns) {
        let bodies: Vec<Vec<String>> = row
            .iter()
            .map(|(number, album)| card_body(*number, album, layout.inner_width()))
            .collect();
        let height = bodies.iter().map(Vec::len).max().unwrap_or(0);
        let border = format!("+{}+", "-".repeat(layout.card_width - 2));

        let mut lines: Vec<Vec<String>> = vec![Vec::new(); height + 2];
        for body in &bodies {
            lines[0].push(border.clone());
            for (i, line) in lines[1..=height].iter_mut().enumerate() {
                let text = body.get(i).map(String::as_str).unwrap_or("");
                line.push(format!("| {} |", pad(text, layout.inner_width())));
            }
            lines[height + 1].push(border.clone());
        }

        for line in lines {
            out.push_str(line.join(COLUMN_GAP).trim_end());
            out.push('\n');
        }

        for (number, album) in row {
            if let Some(url) = album.cover_url() {
                out.push_str(&format!("  #{} cover: {}\n", number, url));
            }
            if let Some(link) = album.link() {
                out.push_str(&format!("  #{} link:  {}\n", number, link));
            }
        }
        out.push('\n');
    }

    out
}

fn card_body(number: usize, album: &Album, width: usize) -> Vec<String> {
    let mut body = vec![format!("#{}", number)];

    body.push(match album.cover_url() {
        Some(_) => "[cover art below]".to_string(),
        None => "(no cover art)".to_string(),
    });
    body.push(String::new());
    body.extend(wrap_text(&album.name, width));
    body.push("Release Date:".to_string());
    body.extend(wrap_text(&album.release_date, width));
    body.push(String::new());

    body.push(match album.link() {
        Some(_) => "Album Link: below".to_string(),
        None => "(no album link)".to_string(),
    });

    body
}

/// Word wrap by display width, hard-splitting words wider than `width`
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let word_width = word.width();

        if !current.is_empty() && current.width() + 1 + word_width > width {
            lines.push(std::mem::take(&mut current));
        }

        if word_width > width {
            let mut chunk = String::new();
            for c in word.chars() {
                if chunk.width() + c.width().unwrap_or(0) > width {
                    lines.push(std::mem::take(&mut chunk));
                }
                chunk.push(c);
            }
            current = chunk;
            continue;
        }

        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn pad(text: &str, width: usize) -> String {
    format!("{}{}", text, " ".repeat(width.saturating_sub(text.width())))
}

/// Turn one line of user input into an event
pub fn parse_input(line: &str) -> Option<AppEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let Some(command) = line.strip_prefix(':') else {
        return Some(AppEvent::Submit(line.to_string()));
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("quit") | Some("q"), _) => Some(AppEvent::Quit),
        (Some("help"), _) => Some(AppEvent::Help),
        (Some("open"), Some(arg)) => match arg.parse::<usize>() {
            Ok(number) if number > 0 => Some(AppEvent::OpenAlbum(number)),
            _ => Some(AppEvent::InvalidCommand(line.to_string())),
        },
        _ => Some(AppEvent::InvalidCommand(line.to_string())),
    }
}

/// Forward stdin lines to the event channel until input closes
pub fn spawn_input_reader(event_tx: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(event) = parse_input(&line) {
                        if event_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                }
                Ok(None) => {
                    log::info!("Input closed");
                    let _ = event_tx.send(AppEvent::Quit).await;
                    break;
                }
                Err(e) => {
                    log::error!("Failed to read input: {}", e);
                    let _ = event_tx.send(AppEvent::Quit).await;
                    break;
                }
            }
        }
    });
}

/// Draws the screen to a terminal or any other writer
pub struct UIManager {
    out: Box<dyn Write + Send>,
    layout: Layout,
}

impl UIManager {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_writer(Box::new(std::io::stdout()), Layout::from_config(config))
    }

    pub fn with_writer(out: Box<dyn Write + Send>, layout: Layout) -> Self {
        Self { out, layout }
    }

    pub fn draw(&mut self, state: &AppState) -> Result<()> {
        let screen = render(state, self.layout);
        self.write_all(&screen)?;
        self.write_all(&format!("{}> ", PROMPT))
    }

    pub fn show_help(&mut self) -> Result<()> {
        self.write_all(&format!("{}\n{}> ", HELP_TEXT, PROMPT))
    }

    fn write_all(&mut self, text: &str) -> Result<()> {
        self.out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.flush())
            .map_err(|e| AlbumPickerError::UIError(format!("Failed to write to terminal: {}", e)))
    }
}

/// Open a URL in the default browser
pub fn open_url(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    let mut command = std::process::Command::new("open");

    #[cfg(target_os = "windows")]
    let mut command = {
        let mut command = std::process::Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    };

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut command = std::process::Command::new("xdg-open");

    command
        .arg(url)
        .spawn()
        .map_err(|e| AlbumPickerError::UIError(format!("Failed to open URL: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::tests::album;
    use crate::search::SearchOutcome;
    use crate::spotify_client::AccessToken;

    fn layout() -> Layout {
        Layout {
            columns: 2,
            card_width: 32,
        }
    }

    fn populated_state(albums: Vec<Album>) -> AppState {
        let mut state = AppState::default();
        state.token_acquired(AccessToken::new("tok"));
        let (seq, _) = state.begin_search("Radiohead").unwrap();
        state.complete_search(seq, Ok(SearchOutcome::Albums(albums)));
        state
    }

    #[test]
    fn test_render_single_card_scenario() {
        let state = populated_state(vec![album("a1", "OK Computer", "1997-05-21")]);
        let screen = render(&state, layout());

        assert!(screen.starts_with("Album Picker\n"));
        assert!(screen.contains("Search For Artist: Radiohead"));
        assert!(screen.contains("OK Computer"));
        assert!(screen.contains("Release Date:"));
        assert!(screen.contains("1997-05-21"));
        assert!(screen.contains("#1 cover: https://img/a1.jpg\n"));
        assert!(screen.contains("#1 link:  https://open.spotify.com/album/a1\n"));
        assert!(!screen.contains("#2"));
    }

    #[test]
    fn test_render_keeps_list_order() {
        let names = ["Pablo Honey", "The Bends", "OK Computer", "Kid A", "Amnesiac"];
        let albums: Vec<Album> = names
            .iter()
            .enumerate()
            .map(|(i, name)| album(&format!("a{}", i), name, "2000-01-01"))
            .collect();
        let screen = render(&populated_state(albums), layout());

        let positions: Vec<usize> = names
            .iter()
            .map(|name| screen.find(name).unwrap())
            .collect();
        let row_of = |pos: usize| screen[..pos].matches('\n').count();

        // two per row: 0,1 share a row, 2,3 share the next, 4 alone
        assert_eq!(row_of(positions[0]), row_of(positions[1]));
        assert!(positions[0] < positions[1]);
        assert!(row_of(positions[1]) < row_of(positions[2]));
        assert!(positions[2] < positions[3]);
        assert!(row_of(positions[3]) < row_of(positions[4]));
    }

    #[test]
    fn test_render_empty_state() {
        let screen = render(&AppState::default(), layout());
        assert!(screen.contains("No albums to show."));
        assert!(!screen.contains('+'));
    }

    #[test]
    fn test_card_without_images_or_link() {
        let mut bare = album("a9", "Demo Tape", "1991");
        bare.images.clear();
        bare.external_urls.spotify = None;

        let grid = render_grid(&[bare], layout());
        assert!(grid.contains("(no cover art)"));
        assert!(grid.contains("(no album link)"));
    }

    #[test]
    fn test_card_lines_have_fixed_width() {
        let albums = vec![
            album("a1", "A Moon Shaped Pool With A Very Long Title Indeed", "2016-05-08"),
            album("a2", "Kid A", "2000-10-02"),
        ];
        let grid = render_grid(&albums, layout());

        let box_lines: Vec<&str> = grid
            .lines()
            .filter(|line| line.starts_with('+') || line.starts_with('|'))
            .collect();
        assert!(!box_lines.is_empty());
        for line in box_lines {
            assert_eq!(line.width(), 32 * 2 + COLUMN_GAP.len());
        }
    }

    #[test]
    fn test_long_urls_are_never_split() {
        let mut real = album("a1", "OK Computer", "1997-05-21");
        real.images[0].url =
            "https://i.scdn.co/image/ab67616d0000b273c8b444df094279e70d0ed856".to_string();
        real.external_urls.spotify =
            Some("https://open.spotify.com/album/6dVIqQ8qmQ5GBnJ9shOYGE".to_string());

        let grid = render_grid(&[real], layout());
        assert!(grid.contains(
            "#1 cover: https://i.scdn.co/image/ab67616d0000b273c8b444df094279e70d0ed856\n"
        ));
        assert!(grid.contains("#1 link:  https://open.spotify.com/album/6dVIqQ8qmQ5GBnJ9shOYGE\n"));
    }

    #[test]
    fn test_wide_characters_keep_borders_aligned() {
        let albums = vec![
            album("t1", "東京事変 教育 大人 スポーツ 娯楽 音楽 ", "2004-11-25"),
            album("t2", "Kid A", "2000-10-02"),
        ];
        let grid = render_grid(&albums, layout());

        for line in grid.lines().filter(|line| line.starts_with('|')) {
            assert_eq!(line.width(), 32 * 2 + COLUMN_GAP.len(), "misaligned: {}", line);
        }
        assert!(grid.contains("東京事変"));
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("OK Computer", 20), vec!["OK Computer"]);
        assert_eq!(
            wrap_text("Hail to the Thief", 10),
            vec!["Hail to", "the Thief"]
        );
        assert_eq!(
            wrap_text("https://open.spotify.com/album/a1", 12),
            vec!["https://open", ".spotify.com", "/album/a1"]
        );
        assert_eq!(wrap_text("", 10), vec![""]);
        assert_eq!(wrap_text("東京事変 教育", 8), vec!["東京事変", "教育"]);
        assert_eq!(wrap_text("東京事変", 5), vec!["東京", "事変"]);
    }

    #[test]
    fn test_parse_input() {
        assert!(parse_input("   ").is_none());
        assert!(matches!(parse_input(" Radiohead "), Some(AppEvent::Submit(q)) if q == "Radiohead"));
        assert!(matches!(parse_input(":quit"), Some(AppEvent::Quit)));
        assert!(matches!(parse_input(":help"), Some(AppEvent::Help)));
        assert!(matches!(parse_input(":open 3"), Some(AppEvent::OpenAlbum(3))));
        assert!(matches!(parse_input(":open 0"), Some(AppEvent::InvalidCommand(_))));
        assert!(matches!(parse_input(":open x"), Some(AppEvent::InvalidCommand(_))));
        assert!(matches!(parse_input(":dance"), Some(AppEvent::InvalidCommand(_))));
    }

    #[test]
    fn test_render_notice_and_pending() {
        let mut state = AppState::default();
        state.token_acquired(AccessToken::new("tok"));
        state.begin_search("Björk").unwrap();

        let screen = render(&state, layout());
        assert!(screen.contains("Searching for \"Björk\"..."));

        let mut state = AppState::default();
        assert!(state.begin_search("Björk").is_none());
        let screen = render(&state, layout());
        assert!(screen.contains("[error]"));
    }
}
