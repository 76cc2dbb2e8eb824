//! Application state types and entry glue.
//!
//! Defines the enums and structs that model the TUI state, the colour theme,
//! and the clickable-region map, and re-exports the event loop as `run`.
//!
pub mod debounce;
pub mod keymap;
pub mod update;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratatui::layout::{Position, Rect};
use ratatui::style::Color;
use tokio::runtime::Handle;

use crate::config::Settings;
use crate::list::UserListState;
use crate::remote::{self, LoadPoll, PendingLoad, UserFetcher};
use debounce::Debouncer;
use keymap::Keymap;

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Modal,
}

/// Everything a key press or a mouse click can ask the list screen to do.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UiAction {
    PrevPage,
    NextPage,
    ToggleSelectAll,
    ToggleRow(u64),
    EditUser(u64),
    DeleteUser(u64),
    EditSelected,
    DeleteSelected,
    ConnectUsers,
    FocusSearch,
}

/// Screen regions registered during the last draw, used to route mouse clicks.
#[derive(Clone, Debug, Default)]
pub struct HitMap {
    regions: Vec<(Rect, UiAction)>,
}

impl HitMap {
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    pub fn register(&mut self, area: Rect, action: UiAction) {
        if area.width > 0 && area.height > 0 {
            self.regions.push((area, action));
        }
    }

    /// Topmost action under the given cell.
    pub fn hit(&self, column: u16, row: u16) -> Option<UiAction> {
        let pos = Position::new(column, row);
        self.regions
            .iter()
            .rev()
            .find(|(area, _)| area.contains(pos))
            .map(|(_, action)| *action)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    /// Checked checkboxes and contained buttons.
    pub accent: Color,
    /// Unchecked checkboxes.
    pub checkbox: Color,
    /// Left edge marker of selected rows.
    pub selected_marker: Color,
}

impl Theme {
    /// Default palette built around the indigo accent of the account screens.
    pub fn indigo() -> Self {
        Self {
            text: Color::Rgb(0x2d, 0x37, 0x48),
            muted: Color::Rgb(0x71, 0x80, 0x96),
            title: Color::Rgb(0x1a, 0x20, 0x2c),
            border: Color::Rgb(0xcb, 0xd5, 0xe0),
            header_bg: Color::Reset,
            header_fg: Color::Rgb(0x1a, 0x20, 0x2c),
            status_bg: Color::Rgb(0xed, 0xf2, 0xf7),
            status_fg: Color::Rgb(0x4a, 0x55, 0x68),
            highlight_fg: Color::Rgb(0x47, 0x5d, 0xe5),
            highlight_bg: Color::Rgb(0xed, 0xf2, 0xf7),
            accent: Color::Rgb(0x47, 0x5d, 0xe5),
            checkbox: Color::Rgb(0xcb, 0xd5, 0xe0),
            selected_marker: Color::Rgb(0x00, 0x00, 0xff),
        }
    }

    /// Load theme from a simple key=value file. Missing keys fall back to `indigo`.
    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut theme = Self::indigo();
        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let key = parts.next().map(|s| s.trim()).unwrap_or("");
            let val = parts.next().map(|s| s.trim()).unwrap_or("");
            if key.is_empty() || val.is_empty() {
                continue;
            }
            let Some(color) = Self::parse_color(val) else {
                tracing::warn!(key, val, "ignoring unparsable theme colour");
                continue;
            };
            match key {
                "text" => theme.text = color,
                "muted" => theme.muted = color,
                "title" => theme.title = color,
                "border" => theme.border = color,
                "header_bg" => theme.header_bg = color,
                "header_fg" => theme.header_fg = color,
                "status_bg" => theme.status_bg = color,
                "status_fg" => theme.status_fg = color,
                "highlight_fg" => theme.highlight_fg = color,
                "highlight_bg" => theme.highlight_bg = color,
                "accent" => theme.accent = color,
                "checkbox" => theme.checkbox = color,
                "selected_marker" => theme.selected_marker = color,
                _ => {}
            }
        }
        theme
    }

    /// Parse `#RRGGBB`, `RRGGBB`, `index:N` or `reset`.
    fn parse_color(s: &str) -> Option<Color> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "reset" {
            return Some(Color::Reset);
        }
        if let Some(idx) = lower.strip_prefix("index:") {
            return idx.parse().ok().map(Color::Indexed);
        }
        let hex = lower.strip_prefix('#').unwrap_or(&lower);
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    fn color_to_str(c: Color) -> String {
        match c {
            Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
            Color::Reset => "reset".to_string(),
            Color::Indexed(i) => format!("index:{}", i),
            // Named colours are written as their ANSI index
            Color::Black => "index:0".to_string(),
            Color::Red => "index:1".to_string(),
            Color::Green => "index:2".to_string(),
            Color::Yellow => "index:3".to_string(),
            Color::Blue => "index:4".to_string(),
            Color::Magenta => "index:5".to_string(),
            Color::Cyan => "index:6".to_string(),
            Color::Gray => "index:7".to_string(),
            Color::DarkGray => "index:8".to_string(),
            Color::LightRed => "index:9".to_string(),
            Color::LightGreen => "index:10".to_string(),
            Color::LightYellow => "index:11".to_string(),
            Color::LightBlue => "index:12".to_string(),
            Color::LightMagenta => "index:13".to_string(),
            Color::LightCyan => "index:14".to_string(),
            Color::White => "index:15".to_string(),
        }
    }

    /// Persist the theme to a config file in key=value format.
    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# account-users theme configuration\n");
        buf.push_str("# Colors: #RRGGBB, RRGGBB, index:N or 'reset'\n\n");

        let mut kv = |k: &str, v: Color| {
            let _ = writeln!(&mut buf, "{} = {}", k, Self::color_to_str(v));
        };
        kv("text", self.text);
        kv("muted", self.muted);
        kv("title", self.title);
        kv("border", self.border);
        kv("header_bg", self.header_bg);
        kv("header_fg", self.header_fg);
        kv("status_bg", self.status_bg);
        kv("status_fg", self.status_fg);
        kv("highlight_fg", self.highlight_fg);
        kv("highlight_bg", self.highlight_bg);
        kv("accent", self.accent);
        kv("checkbox", self.checkbox);
        kv("selected_marker", self.selected_marker);

        std::fs::write(path, buf)
    }

    /// Load `path` if present, else the user config directory, else write the default there.
    pub fn load_or_init(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            return Self::from_file(path).unwrap_or_else(Self::indigo);
        }
        if let Some(existing) = config_file_read_path("theme.conf") {
            return Self::from_file(&existing.to_string_lossy()).unwrap_or_else(Self::indigo);
        }
        let t = Self::indigo();
        if let Err(err) = t.write_file(path) {
            tracing::warn!(path, error = %err, "could not write default theme");
        }
        t
    }
}

/// Look for `name` under `$XDG_CONFIG_HOME/account-users` or `~/.config/account-users`.
pub fn config_file_read_path(name: &str) -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    let candidate = base.join("account-users").join(name);
    candidate.is_file().then_some(candidate)
}

/// Modal dialogs drawn above the list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModalState {
    Info { message: String },
    Help { scroll: u16 },
}

pub struct AppState {
    pub started_at: Instant,
    pub list: UserListState,
    /// Raw search box text; reaches `list` only through `debouncer`.
    pub search_input: String,
    pub debouncer: Debouncer<String>,
    pub input_mode: InputMode,
    pub theme: Theme,
    pub keymap: Keymap,
    pub modal: Option<ModalState>,
    /// Largest help scroll that still shows the last line; set when help is drawn.
    pub help_scroll_max: u16,
    pub hits: HitMap,
    /// First visible row of the current page when it does not fit the terminal.
    pub row_offset: usize,
    pub fetcher: Option<UserFetcher>,
    pub pending_load: Option<PendingLoad>,
}

impl AppState {
    /// Build state from settings, loading (or creating) the theme and keymap files.
    pub fn new(settings: &Settings) -> Self {
        Self::from_parts(
            UserListState::new(settings.page_size),
            Theme::load_or_init(&settings.theme_path),
            Keymap::load_or_init(&settings.keybinds_path),
            settings.debounce,
        )
    }

    pub fn from_parts(list: UserListState, theme: Theme, keymap: Keymap, debounce: Duration) -> Self {
        Self {
            started_at: Instant::now(),
            list,
            search_input: String::new(),
            debouncer: Debouncer::new(debounce),
            input_mode: InputMode::Normal,
            theme,
            keymap,
            modal: None,
            help_scroll_max: 0,
            hits: HitMap::default(),
            row_offset: 0,
            fetcher: None,
            pending_load: None,
        }
    }

    pub fn with_fetcher(mut self, fetcher: UserFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Kick off a (re)load; any load still in flight is cancelled first.
    pub fn start_load(&mut self, handle: &Handle) {
        let Some(fetcher) = self.fetcher.clone() else {
            tracing::warn!("no user source configured; nothing to load");
            return;
        };
        if let Some(previous) = self.pending_load.take() {
            previous.cancel();
        }
        self.list.begin_load();
        self.pending_load = Some(remote::spawn_load(handle, fetcher));
    }

    /// Advance time-driven state: collect a finished load and fire the debouncer.
    pub fn tick(&mut self, now: Instant) {
        if let Some(load) = self.pending_load.as_mut() {
            match load.poll() {
                LoadPoll::Pending => {}
                LoadPoll::Ready(users) => {
                    self.pending_load = None;
                    self.list.finish_load(users);
                    self.row_offset = 0;
                }
                LoadPoll::Abandoned => {
                    self.pending_load = None;
                    self.list.finish_load(Vec::new());
                    self.row_offset = 0;
                }
            }
        }
        if let Some(query) = self.debouncer.poll(now) {
            self.apply_search(query);
        }
    }

    pub fn apply_search(&mut self, query: String) {
        self.list.set_search(query);
        self.row_offset = 0;
    }

    /// How long the event loop may block before `tick` has work to do.
    pub fn next_wakeup(&self, now: Instant, max: Duration) -> Duration {
        self.debouncer
            .remaining(now)
            .map_or(max, |left| left.min(max))
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
