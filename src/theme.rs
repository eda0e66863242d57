use std::borrow::Cow;

use crate::record::Level;

/// SGR sequence that restores the terminal's default style.
pub const RESET: &str = "\x1b[0m";

/// Part of a rendered line that can be colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Timestamp,
    Message,
    Source,
    Key,
    Value,
    /// Bound group label in multiline output.
    Group,
    /// Bound group label in inline output.
    InlineGroup,
    LevelDebug,
    LevelInfo,
    LevelWarn,
    LevelError,
}

impl Role {
    /// Color role of a level label; `None` leaves the label uncolored.
    pub fn for_level(level: Level) -> Option<Role> {
        match level {
            Level::Debug => Some(Role::LevelDebug),
            Level::Info => Some(Role::LevelInfo),
            Level::Warn => Some(Role::LevelWarn),
            Level::Error => Some(Role::LevelError),
            Level::Trace => None,
        }
    }
}

/// ANSI SGR foreground codes per [`Role`].
///
/// Handlers take a theme at construction and only ever read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTheme {
    pub timestamp: u8,
    pub message: u8,
    pub source: u8,
    pub key: u8,
    pub value: u8,
    pub group: u8,
    pub inline_group: u8,
    pub level_debug: u8,
    pub level_info: u8,
    pub level_warn: u8,
    pub level_error: u8,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            timestamp: 37,    // light gray
            message: 97,      // white
            source: 90,       // dark gray
            key: 95,          // light magenta
            value: 94,        // light blue
            group: 35,        // magenta
            inline_group: 36, // cyan
            level_debug: 95,  // light magenta
            level_info: 96,   // light cyan
            level_warn: 93,   // light yellow
            level_error: 91,  // light red
        }
    }
}

impl ColorTheme {
    pub fn code(&self, role: Role) -> u8 {
        match role {
            Role::Timestamp => self.timestamp,
            Role::Message => self.message,
            Role::Source => self.source,
            Role::Key => self.key,
            Role::Value => self.value,
            Role::Group => self.group,
            Role::InlineGroup => self.inline_group,
            Role::LevelDebug => self.level_debug,
            Role::LevelInfo => self.level_info,
            Role::LevelWarn => self.level_warn,
            Role::LevelError => self.level_error,
        }
    }
}

/// Wrap `text` in the SGR sequence for `code` followed by [`RESET`].
pub fn colorize(code: u8, text: &str) -> String {
    format!("\x1b[{}m{}{}", code, text, RESET)
}

/// Applies a theme, or nothing at all when colors are disabled.
#[derive(Debug, Clone, Copy)]
pub struct Painter<'a> {
    theme: Option<&'a ColorTheme>,
}

impl<'a> Painter<'a> {
    pub fn new(theme: &'a ColorTheme, enabled: bool) -> Self {
        Painter {
            theme: enabled.then_some(theme),
        }
    }

    pub fn plain() -> Self {
        Painter { theme: None }
    }

    pub fn paint<'t>(&self, role: Role, text: &'t str) -> Cow<'t, str> {
        match self.theme {
            Some(theme) => Cow::Owned(colorize(theme.code(role), text)),
            None => Cow::Borrowed(text),
        }
    }

    /// Like [`paint`](Self::paint) but skips coloring when `role` is `None`.
    pub fn paint_opt<'t>(&self, role: Option<Role>, text: &'t str) -> Cow<'t, str> {
        match role {
            Some(role) => self.paint(role, text),
            None => Cow::Borrowed(text),
        }
    }
}

/// Remove every SGR escape sequence from `text`.
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for c in chars.by_ref() {
                if c == 'm' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colorize_wraps_with_reset() {
        assert_eq!(colorize(96, "INFO"), "\x1b[96mINFO\x1b[0m");
    }

    #[test]
    fn disabled_painter_is_identity() {
        let theme = ColorTheme::default();
        let painter = Painter::new(&theme, false);
        assert_eq!(painter.paint(Role::Key, "port"), "port");
        assert!(matches!(painter.paint(Role::Key, "port"), Cow::Borrowed(_)));
    }

    #[test]
    fn custom_theme_codes_are_used() {
        let theme = ColorTheme {
            key: 32,
            ..ColorTheme::default()
        };
        let painter = Painter::new(&theme, true);
        assert_eq!(painter.paint(Role::Key, "port"), "\x1b[32mport\x1b[0m");
    }

    #[test]
    fn trace_level_has_no_color() {
        assert_eq!(Role::for_level(Level::Trace), None);
        assert_eq!(Role::for_level(Level::Error), Some(Role::LevelError));
    }

    #[test]
    fn strip_ansi_recovers_plain_text() {
        let painted = format!("{} {}", colorize(95, "k"), colorize(94, "v"));
        assert_eq!(strip_ansi(&painted), "k v");
    }
}
