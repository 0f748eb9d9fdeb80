//! Input domain types: synthetic mouse and keyboard events.

use serde::Serialize;

/// `type` field of `Input.dispatchMouseEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MouseEventType {
    /// Button pressed.
    MousePressed,
    /// Button released.
    MouseReleased,
    /// Pointer moved.
    MouseMoved,
}

/// Parameters for `Input.dispatchMouseEvent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchMouseEventParams {
    /// Kind of mouse event.
    #[serde(rename = "type")]
    pub event_type: MouseEventType,
    /// X coordinate relative to the viewport, in CSS pixels.
    pub x: f64,
    /// Y coordinate relative to the viewport, in CSS pixels.
    pub y: f64,
    /// Mouse button involved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button: Option<String>,
    /// Number of times the button has been clicked in quick succession.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_count: Option<i32>,
}

impl DispatchMouseEventParams {
    /// A left-button press at `(x, y)`.
    #[must_use]
    pub fn left_press(x: f64, y: f64) -> Self {
        Self {
            event_type: MouseEventType::MousePressed,
            x,
            y,
            button: Some("left".to_string()),
            click_count: Some(1),
        }
    }

    /// A left-button release at `(x, y)`.
    #[must_use]
    pub fn left_release(x: f64, y: f64) -> Self {
        Self {
            event_type: MouseEventType::MouseReleased,
            x,
            y,
            button: Some("left".to_string()),
            click_count: Some(1),
        }
    }
}

/// `type` field of `Input.dispatchKeyEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyEventType {
    /// Key pressed down and released, for keys without distinct repeat
    /// semantics.
    KeyDown,
    /// Key released.
    KeyUp,
    /// A full keystroke producing character input.
    Char,
}

/// Bit flags for `DispatchKeyEventParams::modifiers` / `DispatchMouseEventParams`.
pub const MODIFIER_ALT: i32 = 1;
/// Control key modifier bit.
pub const MODIFIER_CTRL: i32 = 2;
/// Meta (Cmd/Win) key modifier bit.
pub const MODIFIER_META: i32 = 4;
/// Shift key modifier bit.
pub const MODIFIER_SHIFT: i32 = 8;

/// Parameters for `Input.dispatchKeyEvent`.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DispatchKeyEventParams {
    /// Kind of key event.
    #[serde(rename = "type")]
    pub event_type: Option<KeyEventType>,
    /// Character produced, for `Char` events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Key value, e.g. `"Enter"`, `"a"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Windows virtual key code, required for most non-printable keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windows_virtual_key_code: Option<i32>,
    /// Bitmask of `MODIFIER_*` flags held during this event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<i32>,
}

impl DispatchKeyEventParams {
    /// A single printable character keystroke.
    #[must_use]
    pub fn char_event(ch: char) -> Self {
        Self {
            event_type: Some(KeyEventType::Char),
            text: Some(ch.to_string()),
            ..Self::default()
        }
    }

    /// A named key (e.g. `"Enter"`, `"Escape"`, `"ArrowDown"`) press or release.
    #[must_use]
    pub fn named_key(event_type: KeyEventType, key: &str, modifiers: i32) -> Self {
        Self {
            event_type: Some(event_type),
            key: Some(key.to_string()),
            windows_virtual_key_code: key_code_for_name(key),
            modifiers: if modifiers == 0 { None } else { Some(modifiers) },
            ..Self::default()
        }
    }
}

/// Windows virtual key code for the named keys the core dispatches directly.
#[must_use]
pub fn key_code_for_name(name: &str) -> Option<i32> {
    Some(match name {
        "Backspace" => 8,
        "Tab" => 9,
        "Enter" => 13,
        "Shift" => 16,
        "Control" => 17,
        "Alt" => 18,
        "Escape" => 27,
        " " | "Space" => 32,
        "ArrowLeft" => 37,
        "ArrowUp" => 38,
        "ArrowRight" => 39,
        "ArrowDown" => 40,
        "Delete" => 46,
        "Meta" => 91,
        "F1" => 112,
        "F2" => 113,
        "F3" => 114,
        "F4" => 115,
        "F5" => 116,
        "F6" => 117,
        "F7" => 118,
        "F8" => 119,
        "F9" => 120,
        "F10" => 121,
        "F11" => 122,
        "F12" => 123,
        _ => return None,
    })
}

/// Parameters for `Input.insertText`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertTextParams {
    /// Text to insert at the current caret position.
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_press_and_release_use_left_button() {
        let press = DispatchMouseEventParams::left_press(10.0, 20.0);
        let release = DispatchMouseEventParams::left_release(10.0, 20.0);
        assert_eq!(press.button.as_deref(), Some("left"));
        assert_eq!(release.event_type, MouseEventType::MouseReleased);
    }

    #[test]
    fn named_key_resolves_its_virtual_key_code() {
        let event = DispatchKeyEventParams::named_key(KeyEventType::KeyDown, "Enter", 0);
        assert_eq!(event.windows_virtual_key_code, Some(13));
        assert!(event.modifiers.is_none());
    }

    #[test]
    fn unknown_key_name_has_no_virtual_key_code() {
        assert_eq!(key_code_for_name("Numpad5WithExtraJunk"), None);
    }
}
