//! Keybinding configuration: parse `keybinds.conf`, provide defaults, and map keys to actions.
//!
//! This module manages keyboard shortcuts for the user list. It supports:
//! - Loading custom keybindings from a config file (`keybinds.conf`)
//! - Providing defaults if no config is present
//! - Resolving key presses (with modifiers) to semantic actions
//! - Exporting the current keymap back to a file for customization

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Semantic keyboard actions that can be bound to key combinations.
///
/// Several key combinations can map to the same action (e.g. both `j` and Down
/// move the cursor down).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyAction {
    /// Exit the application.
    Quit,
    /// Focus the search box.
    StartSearch,
    /// Show the help modal.
    OpenHelp,
    /// Move the row cursor up.
    MoveUp,
    /// Move the row cursor down.
    MoveDown,
    /// Previous page of results.
    PrevPage,
    /// Next page of results.
    NextPage,
    /// Check or uncheck the row under the cursor.
    ToggleRow,
    /// Flip the header "select all" checkbox.
    ToggleSelectAll,
    /// Edit the row under the cursor.
    EditRow,
    /// Delete the row under the cursor.
    DeleteRow,
    /// Edit every selected user.
    EditSelected,
    /// Delete every selected user.
    DeleteSelected,
    /// The "Connect users" header button.
    ConnectUsers,
    /// Fetch the user list again.
    Reload,
    /// Swallow the key.
    Ignore,
}

/// Maps `(KeyModifiers, KeyCode)` pairs to [`KeyAction`]s.
#[derive(Clone, Debug)]
pub struct Keymap {
    bindings: std::collections::HashMap<(KeyModifiers, KeyCode), KeyAction>,
}

impl Keymap {
    /// Create a keymap with the default bindings: arrows and vim keys for
    /// movement, Space/`a` for selection, `e`/`d` for row actions and
    /// `E`/`D` for bulk actions.
    pub fn new_defaults() -> Self {
        use KeyCode::*;
        use KeyModifiers as M;
        let mut bindings = std::collections::HashMap::new();
        bindings.insert((M::NONE, Char('q')), KeyAction::Quit);
        bindings.insert((M::NONE, Esc), KeyAction::Ignore);
        bindings.insert((M::NONE, Char('/')), KeyAction::StartSearch);
        bindings.insert((M::NONE, Char('?')), KeyAction::OpenHelp);
        bindings.insert((M::SHIFT, Char('?')), KeyAction::OpenHelp);

        bindings.insert((M::NONE, Up), KeyAction::MoveUp);
        bindings.insert((M::NONE, Down), KeyAction::MoveDown);
        bindings.insert((M::NONE, Char('k')), KeyAction::MoveUp);
        bindings.insert((M::NONE, Char('j')), KeyAction::MoveDown);
        bindings.insert((M::NONE, Left), KeyAction::PrevPage);
        bindings.insert((M::NONE, Right), KeyAction::NextPage);
        bindings.insert((M::NONE, Char('h')), KeyAction::PrevPage);
        bindings.insert((M::NONE, Char('l')), KeyAction::NextPage);
        bindings.insert((M::NONE, PageUp), KeyAction::PrevPage);
        bindings.insert((M::NONE, PageDown), KeyAction::NextPage);

        bindings.insert((M::NONE, Char(' ')), KeyAction::ToggleRow);
        bindings.insert((M::NONE, Char('a')), KeyAction::ToggleSelectAll);
        bindings.insert((M::NONE, Char('e')), KeyAction::EditRow);
        bindings.insert((M::NONE, Char('d')), KeyAction::DeleteRow);
        bindings.insert((M::NONE, Delete), KeyAction::DeleteRow);
        // Terminals disagree on whether uppercase letters carry SHIFT
        bindings.insert((M::SHIFT, Char('E')), KeyAction::EditSelected);
        bindings.insert((M::NONE, Char('E')), KeyAction::EditSelected);
        bindings.insert((M::SHIFT, Char('D')), KeyAction::DeleteSelected);
        bindings.insert((M::NONE, Char('D')), KeyAction::DeleteSelected);
        bindings.insert((M::NONE, Char('c')), KeyAction::ConnectUsers);
        bindings.insert((M::NONE, Char('r')), KeyAction::Reload);

        Self { bindings }
    }

    /// Load a keymap from `path`, or from the user config directory, or write
    /// the defaults to `path` when neither exists.
    pub fn load_or_init(path: &str) -> Self {
        let p = std::path::Path::new(path);
        if p.exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        if let Some(existing) = crate::app::config_file_read_path("keybinds.conf") {
            return Self::from_file(&existing.to_string_lossy()).unwrap_or_default();
        }
        let km = Self::default();
        if let Err(err) = km.write_file(path) {
            tracing::warn!(path, error = %err, "could not write default keybindings");
        }
        km
    }

    /// Load a keymap from a configuration file of `<Action> = <KeySpec>` lines,
    /// layered over the defaults. Returns `None` if the file cannot be read.
    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    /// Parse keymap text over the defaults; unknown lines are skipped.
    pub fn parse(contents: &str) -> Self {
        let mut map = Self::default();
        for raw in contents.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let lhs = parts.next().map(|s| s.trim()).unwrap_or("");
            let rhs = parts.next().map(|s| s.trim()).unwrap_or("");
            if lhs.is_empty() || rhs.is_empty() {
                continue;
            }
            match (parse_action(lhs), parse_key(rhs)) {
                (Some(action), Some(key)) => {
                    map.bindings.insert(key, action);
                }
                _ => tracing::warn!(line, "ignoring unrecognised keybinding"),
            }
        }
        map
    }

    /// Write every binding to `path`, grouped by action.
    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# account-users keybindings\n");
        buf.push_str("# Format: <Action> = <KeySpec>\n");
        buf.push_str("# KeySpec examples: q, Ctrl+q, Shift+E, Space, Enter, Esc, Up, Down, Left, Right, PageUp, PageDown, Delete, /\n\n");

        let mut dump = self.all_bindings();
        dump.sort_by(|(ka, a), (kb, b)| {
            a.cmp(b)
                .then_with(|| Self::format_key(ka.0, ka.1).cmp(&Self::format_key(kb.0, kb.1)))
        });
        for ((mods, code), action) in dump {
            let _ = writeln!(
                &mut buf,
                "{} = {}",
                format_action(action),
                Self::format_key(mods, code)
            );
        }

        std::fs::write(path, buf)
    }

    /// Resolve a key event to its action, if bound.
    pub fn resolve(&self, key: &KeyEvent) -> Option<KeyAction> {
        self.bindings.get(&(key.modifiers, key.code)).copied()
    }

    /// Snapshot of all bindings as `((modifiers, code), action)` pairs.
    pub fn all_bindings(&self) -> Vec<((KeyModifiers, KeyCode), KeyAction)> {
        self.bindings.iter().map(|(k, v)| (*k, *v)).collect()
    }

    /// Format a key (modifiers + code) into a string like `Ctrl+q` or `Shift+E`.
    pub fn format_key(mods: KeyModifiers, code: KeyCode) -> String {
        use KeyCode::*;
        let base = match code {
            Enter => "Enter".to_string(),
            Delete => "Delete".to_string(),
            Esc => "Esc".to_string(),
            Tab => "Tab".to_string(),
            BackTab => "BackTab".to_string(),
            Up => "Up".to_string(),
            Down => "Down".to_string(),
            Left => "Left".to_string(),
            Right => "Right".to_string(),
            PageUp => "PageUp".to_string(),
            PageDown => "PageDown".to_string(),
            Char(' ') => "Space".to_string(),
            Char(c) => c.to_string(),
            _ => format!("{:?}", code),
        };
        if mods.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{}", base)
        } else if mods.contains(KeyModifiers::SHIFT) {
            format!("Shift+{}", base)
        } else {
            base
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new_defaults()
    }
}

fn parse_key(text: &str) -> Option<(KeyModifiers, KeyCode)> {
    use KeyCode::*;
    let mut rest = text.trim();
    let mut mods = KeyModifiers::NONE;
    if let Some(after) = rest.strip_prefix("Ctrl+") {
        mods |= KeyModifiers::CONTROL;
        rest = after;
    } else if let Some(after) = rest.strip_prefix("Shift+") {
        mods |= KeyModifiers::SHIFT;
        rest = after;
    }
    let code = match rest {
        "Enter" => Enter,
        "Delete" => Delete,
        "Space" => Char(' '),
        "Esc" | "Escape" => Esc,
        "Tab" => Tab,
        "BackTab" => BackTab,
        "Up" => Up,
        "Down" => Down,
        "Left" => Left,
        "Right" => Right,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        _ => {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Char(c),
                _ => return None,
            }
        }
    };
    Some((mods, code))
}

fn parse_action(s: &str) -> Option<KeyAction> {
    match s.trim() {
        "Quit" => Some(KeyAction::Quit),
        "StartSearch" => Some(KeyAction::StartSearch),
        "OpenHelp" => Some(KeyAction::OpenHelp),
        "MoveUp" => Some(KeyAction::MoveUp),
        "MoveDown" => Some(KeyAction::MoveDown),
        "PrevPage" => Some(KeyAction::PrevPage),
        "NextPage" => Some(KeyAction::NextPage),
        "ToggleRow" => Some(KeyAction::ToggleRow),
        "ToggleSelectAll" => Some(KeyAction::ToggleSelectAll),
        "EditRow" => Some(KeyAction::EditRow),
        "DeleteRow" => Some(KeyAction::DeleteRow),
        "EditSelected" => Some(KeyAction::EditSelected),
        "DeleteSelected" => Some(KeyAction::DeleteSelected),
        "ConnectUsers" => Some(KeyAction::ConnectUsers),
        "Reload" => Some(KeyAction::Reload),
        "Ignore" => Some(KeyAction::Ignore),
        _ => None,
    }
}

pub fn format_action(a: KeyAction) -> &'static str {
    match a {
        KeyAction::Quit => "Quit",
        KeyAction::StartSearch => "StartSearch",
        KeyAction::OpenHelp => "OpenHelp",
        KeyAction::MoveUp => "MoveUp",
        KeyAction::MoveDown => "MoveDown",
        KeyAction::PrevPage => "PrevPage",
        KeyAction::NextPage => "NextPage",
        KeyAction::ToggleRow => "ToggleRow",
        KeyAction::ToggleSelectAll => "ToggleSelectAll",
        KeyAction::EditRow => "EditRow",
        KeyAction::DeleteRow => "DeleteRow",
        KeyAction::EditSelected => "EditSelected",
        KeyAction::DeleteSelected => "DeleteSelected",
        KeyAction::ConnectUsers => "ConnectUsers",
        KeyAction::Reload => "Reload",
        KeyAction::Ignore => "Ignore",
    }
}

/// Short human label used by the help modal.
pub fn describe_action(a: KeyAction) -> &'static str {
    match a {
        KeyAction::Quit => "Quit",
        KeyAction::StartSearch => "Search",
        KeyAction::OpenHelp => "Help",
        KeyAction::MoveUp => "Move up",
        KeyAction::MoveDown => "Move down",
        KeyAction::PrevPage => "Previous page",
        KeyAction::NextPage => "Next page",
        KeyAction::ToggleRow => "Toggle row checkbox",
        KeyAction::ToggleSelectAll => "Select all on page",
        KeyAction::EditRow => "Edit user",
        KeyAction::DeleteRow => "Delete user",
        KeyAction::EditSelected => "Edit selected",
        KeyAction::DeleteSelected => "Delete selected",
        KeyAction::ConnectUsers => "Connect users",
        KeyAction::Reload => "Reload users",
        KeyAction::Ignore => "Ignore",
    }
}
