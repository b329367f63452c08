//! Keyboard key definitions.
//!
//! WebDriver encodes non-printable keys as characters in the Unicode
//! private-use range `U+E000..U+E05D`. A [`Key`] converts to that
//! character so it can be mixed into `send_keys` text.
//!
//! # Example
//!
//! ```ignore
//! use remote_webdriver::Key;
//!
//! // Navigation keys
//! element.press(Key::Enter).await?;
//! element.press(Key::Tab).await?;
//!
//! // Mixed with text
//! element.send_keys(&format!("hello{}", Key::Enter)).await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// Key Enum
// ============================================================================

/// Common keyboard keys for navigation and control.
///
/// For typing text, pass it to `send_keys` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    // ========================================================================
    // Navigation & Control
    // ========================================================================
    /// Enter key
    Enter,
    /// Return key
    Return,
    /// Tab key
    Tab,
    /// Escape key
    Escape,
    /// Backspace key
    Backspace,
    /// Delete key
    Delete,
    /// Space bar
    Space,

    // ========================================================================
    // Arrow Keys
    // ========================================================================
    /// Arrow Up
    ArrowUp,
    /// Arrow Down
    ArrowDown,
    /// Arrow Left
    ArrowLeft,
    /// Arrow Right
    ArrowRight,

    // ========================================================================
    // Page Navigation
    // ========================================================================
    /// Home key
    Home,
    /// End key
    End,
    /// Page Up key
    PageUp,
    /// Page Down key
    PageDown,

    // ========================================================================
    // Modifiers
    // ========================================================================
    /// Shift modifier
    Shift,
    /// Control modifier
    Control,
    /// Alt modifier
    Alt,
    /// Meta (Command/Windows) modifier
    Meta,
    /// Releases all held modifiers
    Null,
}

impl Key {
    /// Returns the WebDriver code point for this key.
    #[must_use]
    pub fn code_point(self) -> u32 {
        match self {
            Key::Null => 0xE000,
            Key::Backspace => 0xE003,
            Key::Tab => 0xE004,
            Key::Return => 0xE006,
            Key::Enter => 0xE007,
            Key::Shift => 0xE008,
            Key::Control => 0xE009,
            Key::Alt => 0xE00A,
            Key::Escape => 0xE00C,
            Key::Space => 0xE00D,
            Key::PageUp => 0xE00E,
            Key::PageDown => 0xE00F,
            Key::End => 0xE010,
            Key::Home => 0xE011,
            Key::ArrowLeft => 0xE012,
            Key::ArrowUp => 0xE013,
            Key::ArrowRight => 0xE014,
            Key::ArrowDown => 0xE015,
            Key::Delete => 0xE017,
            Key::Meta => 0xE03D,
        }
    }

    /// Returns the key as a `send_keys` character.
    #[inline]
    #[must_use]
    pub fn as_char(self) -> char {
        // All code points above are in the BMP private-use area.
        char::from_u32(self.code_point()).unwrap_or('\u{E000}')
    }

    /// Returns `true` for modifier keys that stay held until released.
    #[inline]
    #[must_use]
    pub fn is_modifier(self) -> bool {
        matches!(self, Key::Shift | Key::Control | Key::Alt | Key::Meta)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl From<Key> for char {
    fn from(key: Key) -> Self {
        key.as_char()
    }
}

// ============================================================================
// Tests
// ============================================================================
