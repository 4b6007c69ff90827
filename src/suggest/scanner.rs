/// Characters that open a suggestion popover
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `@`: tables and columns
    Object,
    /// `/`: slash commands
    Command,
}

impl Marker {
    pub fn as_char(self) -> char {
        match self {
            Marker::Object => '@',
            Marker::Command => '/',
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            '@' => Some(Marker::Object),
            '/' => Some(Marker::Command),
            _ => None,
        }
    }
}

/// An unterminated marker token ending at the cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub marker: Marker,
    /// Char index of the marker
    pub start: usize,
    /// Text between the marker and the cursor
    pub partial: String,
}

/// Walk backward from `cursor` (a char index) looking for an open marker
///
/// Whitespace ends the walk. A marker only counts at the start of the text
/// or right after whitespace, so `user@host` and `a/b` never trigger.
pub fn scan(text: &str, cursor: usize) -> Option<Trigger> {
    let chars: Vec<char> = text.chars().collect();
    let cursor = cursor.min(chars.len());

    let mut i = cursor;
    while i > 0 {
        i -= 1;
        let c = chars[i];
        if c.is_whitespace() {
            return None;
        }
        if let Some(marker) = Marker::from_char(c) {
            if i > 0 && !chars[i - 1].is_whitespace() {
                return None;
            }
            return Some(Trigger {
                marker,
                start: i,
                partial: chars[i + 1..cursor].iter().collect(),
            });
        }
    }
    None
}

/// Result of accepting a suggestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub text: String,
    /// Char index just past the inserted space
    pub cursor: usize,
}

/// Replace the token at `trigger` with marker + `value` + one space
///
/// The token runs from the marker to the next whitespace or the end of the
/// text; whatever follows it loses its leading whitespace.
pub fn apply_selection(text: &str, trigger: &Trigger, value: &str) -> Edit {
    let chars: Vec<char> = text.chars().collect();
    let start = trigger.start.min(chars.len());
    let end = chars[start..]
        .iter()
        .position(|c| c.is_whitespace())
        .map(|offset| start + offset)
        .unwrap_or(chars.len());

    let before: String = chars[..start].iter().collect();
    let after: String = chars[end..].iter().collect();
    let inserted = format!("{}{} ", trigger.marker.as_char(), value);

    Edit {
        cursor: start + inserted.chars().count(),
        text: format!("{}{}{}", before, inserted, after.trim_start()),
    }
}
