//! [`WebElement`]: a handle onto one DOM node, resolved by
//! [`crate::locator::Locator`] and bound to a remote object id for its
//! lifetime.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use devtool_cdp::protocol::dom::{
    GetAttributesParams, GetAttributesResult, GetBoxModelParams, GetBoxModelResult,
    GetOuterHtmlParams, GetOuterHtmlResult, RequestNodeParams, RequestNodeResult,
    SetFileInputFilesParams,
};
use devtool_cdp::protocol::input::{
    DispatchKeyEventParams, DispatchMouseEventParams, InsertTextParams, KeyEventType,
};
use devtool_cdp::protocol::page::{CaptureScreenshotParams, CaptureScreenshotResult, ScreenshotClip, ScreenshotFormat};
use devtool_cdp::protocol::runtime::{CallFunctionOnParams, EvaluateResult};
use devtool_cdp::Connection;
use tracing::instrument;

use crate::error::CoreError;
use crate::locator::{Locator, SearchMethod};

/// The geometry of an element's content box, in CSS pixels relative to the
/// viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Content box width.
    pub width: f64,
    /// Content box height.
    pub height: f64,
}

/// A handle onto one DOM node. Every interaction resolves against the
/// `object_id` captured at find time; if the underlying node is removed from
/// the document the next command fails with a stale-object protocol error.
pub struct WebElement {
    object_id: String,
    connection: Arc<Connection>,
    search_method: SearchMethod,
    selector: String,
    attributes: HashMap<String, String>,
    tag_name: String,
}

impl WebElement {
    pub(crate) fn new(
        object_id: String,
        connection: Arc<Connection>,
        search_method: SearchMethod,
        selector: String,
        attributes: HashMap<String, String>,
        tag_name: String,
    ) -> Self {
        Self {
            object_id,
            connection,
            search_method,
            selector,
            attributes,
            tag_name,
        }
    }

    /// The search strategy this element was found with.
    #[must_use]
    pub fn search_method(&self) -> SearchMethod {
        self.search_method
    }

    /// The selector or expression this element was found with.
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Lowercased tag name, e.g. `"button"`.
    #[must_use]
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// The `id` attribute, if set.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").map(String::as_str)
    }

    /// The raw `class` attribute value.
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        self.attributes.get("class").map(String::as_str)
    }

    /// The `name` attribute, if set.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.attributes.get("name").map(String::as_str)
    }

    /// The `type` attribute, if set.
    #[must_use]
    pub fn element_type(&self) -> Option<&str> {
        self.attributes.get("type").map(String::as_str)
    }

    /// The `href` attribute, if set.
    #[must_use]
    pub fn href(&self) -> Option<&str> {
        self.attributes.get("href").map(String::as_str)
    }

    /// The `src` attribute, if set.
    #[must_use]
    pub fn src(&self) -> Option<&str> {
        self.attributes.get("src").map(String::as_str)
    }

    /// The static `value` attribute captured at find time. Call
    /// [`WebElement::get_attribute`] with `"value"` for the live value of an
    /// input the user has since edited.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.attributes.get("value").map(String::as_str)
    }

    /// Whether the element has no `disabled` attribute.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.attributes.contains_key("disabled")
    }

    /// The object id bound to the live DOM node.
    #[must_use]
    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    async fn call_function(&self, body: &str) -> Result<devtool_cdp::protocol::runtime::RemoteObject, CoreError> {
        let result: EvaluateResult = self
            .connection
            .execute_command(
                "Runtime.callFunctionOn",
                Some(CallFunctionOnParams {
                    function_declaration: format!("function() {{ {body} }}"),
                    object_id: Some(self.object_id.clone()),
                    arguments: None,
                    return_by_value: Some(true),
                }),
            )
            .await?;
        Ok(result.result)
    }

    /// The element's `textContent`, whitespace as the DOM reports it.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn text(&self) -> Result<String, CoreError> {
        let result = self.call_function("return this.textContent || '';").await?;
        Ok(result.value.and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default())
    }

    /// The element's `innerHTML`.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn inner_html(&self) -> Result<String, CoreError> {
        let result = self.call_function("return this.innerHTML;").await?;
        Ok(result.value.and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default())
    }

    /// The element's serialized `outerHTML`, via `DOM.getOuterHTML` rather
    /// than the `Runtime` round trip [`WebElement::inner_html`] uses, since
    /// CDP exposes it as a first-class DOM command.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn outer_html(&self) -> Result<String, CoreError> {
        let result: GetOuterHtmlResult = self
            .connection
            .execute_command(
                "DOM.getOuterHTML",
                Some(GetOuterHtmlParams {
                    node_id: None,
                    object_id: Some(self.object_id.clone()),
                }),
            )
            .await?;
        Ok(result.outer_html)
    }

    /// Read a live attribute value, bypassing the snapshot captured at find
    /// time.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn get_attribute(&self, name: &str) -> Result<Option<String>, CoreError> {
        let node: RequestNodeResult = self
            .connection
            .execute_command(
                "DOM.requestNode",
                Some(RequestNodeParams {
                    object_id: self.object_id.clone(),
                }),
            )
            .await?;
        let attributes: GetAttributesResult = self
            .connection
            .execute_command("DOM.getAttributes", Some(GetAttributesParams { node_id: node.node_id }))
            .await?;
        Ok(attributes.into_map().remove(name))
    }

    /// Content-box geometry, viewport-relative, in CSS pixels. Falls back to
    /// `getBoundingClientRect()` for nodes `DOM.getBoxModel` reports no model
    /// for, e.g. inline elements with no layout box of their own.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn bounds(&self) -> Result<Bounds, CoreError> {
        let box_model: Result<GetBoxModelResult, _> = self
            .connection
            .execute_command(
                "DOM.getBoxModel",
                Some(GetBoxModelParams {
                    object_id: Some(self.object_id.clone()),
                }),
            )
            .await;

        if let Ok(box_model) = box_model {
            let quad = box_model.model.content;
            let xs = [quad[0], quad[2], quad[4], quad[6]];
            let ys = [quad[1], quad[3], quad[5], quad[7]];
            let min_x = xs.iter().cloned().fold(f64::INFINITY, f64::min);
            let min_y = ys.iter().cloned().fold(f64::INFINITY, f64::min);
            let max_x = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let max_y = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            return Ok(Bounds {
                x: min_x,
                y: min_y,
                width: max_x - min_x,
                height: max_y - min_y,
            });
        }

        let result = self
            .call_function(
                "var r = this.getBoundingClientRect(); return {x: r.x, y: r.y, width: r.width, height: r.height};",
            )
            .await?;
        let value = result.value.ok_or(CoreError::ElementNotVisible)?;
        Ok(Bounds {
            x: value["x"].as_f64().unwrap_or_default(),
            y: value["y"].as_f64().unwrap_or_default(),
            width: value["width"].as_f64().unwrap_or_default(),
            height: value["height"].as_f64().unwrap_or_default(),
        })
    }

    /// Whether the element is rendered: not `display: none`, not
    /// `visibility: hidden`, and has a non-zero box.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn is_visible(&self) -> Result<bool, CoreError> {
        let result = self
            .call_function(
                "var s = window.getComputedStyle(this); var r = this.getBoundingClientRect(); return s.display !== 'none' && s.visibility !== 'hidden' && r.width > 0 && r.height > 0;",
            )
            .await?;
        Ok(result.value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    /// Whether the point at the element's center resolves (via
    /// `document.elementFromPoint`) to this element or one of its
    /// descendants, i.e. nothing else is drawn on top of it.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn is_on_top(&self) -> Result<bool, CoreError> {
        let result = self
            .call_function(
                "var r = this.getBoundingClientRect(); var cx = r.x + r.width / 2; var cy = r.y + r.height / 2; var top = document.elementFromPoint(cx, cy); return top !== null && (top === this || this.contains(top));",
            )
            .await?;
        Ok(result.value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    /// Visible, enabled, and not covered by another element.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn is_interactable(&self) -> Result<bool, CoreError> {
        Ok(self.is_enabled() && self.is_visible().await? && self.is_on_top().await?)
    }

    /// Scroll the element into the viewport if it is not already visible.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn scroll_into_view(&self) -> Result<(), CoreError> {
        self.call_function("this.scrollIntoView({block: 'center', inline: 'center'});")
            .await?;
        Ok(())
    }

    /// Click via synthetic `Input.dispatchMouseEvent` press/release at the
    /// element's center plus the given offset, held for `hold_time` between
    /// press and release. `<option>` elements have no hit-testable box in
    /// most renderers, so they are selected by setting `HTMLSelectElement`'s
    /// `value` and dispatching a `change` event instead.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ElementNotVisible`] or
    /// [`CoreError::ElementNotInteractable`] if a real mouse click could not
    /// land on the element. Propagates [`CoreError::Cdp`] on protocol
    /// failure.
    #[instrument(level = "debug", skip(self), fields(tag = %self.tag_name))]
    pub async fn click(&self, x_offset: f64, y_offset: f64, hold_time: Duration) -> Result<(), CoreError> {
        if self.tag_name == "option" {
            return self.click_using_js().await;
        }

        self.scroll_into_view().await?;
        if !self.is_visible().await? {
            return Err(CoreError::ElementNotVisible);
        }
        if !self.is_on_top().await? {
            return Err(CoreError::ElementNotInteractable);
        }

        let bounds = self.bounds().await?;
        let x = bounds.x + bounds.width / 2.0 + x_offset;
        let y = bounds.y + bounds.height / 2.0 + y_offset;

        self.connection
            .execute_command::<_, serde_json::Value>("Input.dispatchMouseEvent", Some(DispatchMouseEventParams::left_press(x, y)))
            .await?;
        tokio::time::sleep(hold_time).await;
        self.connection
            .execute_command::<_, serde_json::Value>("Input.dispatchMouseEvent", Some(DispatchMouseEventParams::left_release(x, y)))
            .await?;
        Ok(())
    }

    /// Click by calling `HTMLElement.click()` in page JavaScript rather than
    /// dispatching synthetic input events. Bypasses visibility/occlusion
    /// checks, at the cost of not exercising the page's real event-handling
    /// path the way a user's click would.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn click_using_js(&self) -> Result<(), CoreError> {
        if self.tag_name == "option" {
            self.call_function(
                "if (this.parentElement) { this.selected = true; this.parentElement.dispatchEvent(new Event('change', {bubbles: true})); }",
            )
            .await?;
        } else {
            self.call_function("this.click();").await?;
        }
        Ok(())
    }

    /// Type `text` one character at a time via `Input.dispatchKeyEvent`,
    /// sleeping `interval` between characters.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn type_text(&self, text: &str, interval: Duration) -> Result<(), CoreError> {
        for ch in text.chars() {
            self.connection
                .execute_command::<_, serde_json::Value>(
                    "Input.dispatchKeyEvent",
                    Some(DispatchKeyEventParams::char_event(ch)),
                )
                .await?;
            if !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
        }
        Ok(())
    }

    /// Insert `text` at the current caret position in a single
    /// `Input.insertText` call, without per-character key events.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn insert_text(&self, text: &str) -> Result<(), CoreError> {
        self.connection
            .execute_command::<_, serde_json::Value>(
                "Input.insertText",
                Some(InsertTextParams { text: text.to_string() }),
            )
            .await?;
        Ok(())
    }

    /// Press and release a named key (e.g. `"Enter"`, `"Escape"`) with the
    /// given modifier bitmask (see `devtool_cdp::protocol::input::MODIFIER_*`).
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn press_keyboard_key(&self, key: &str, modifiers: i32) -> Result<(), CoreError> {
        self.key_down(key, modifiers).await?;
        self.key_up(key, modifiers).await
    }

    /// Dispatch a key-down event without a matching key-up.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn key_down(&self, key: &str, modifiers: i32) -> Result<(), CoreError> {
        self.connection
            .execute_command::<_, serde_json::Value>(
                "Input.dispatchKeyEvent",
                Some(DispatchKeyEventParams::named_key(KeyEventType::KeyDown, key, modifiers)),
            )
            .await?;
        Ok(())
    }

    /// Dispatch a key-up event.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn key_up(&self, key: &str, modifiers: i32) -> Result<(), CoreError> {
        self.connection
            .execute_command::<_, serde_json::Value>(
                "Input.dispatchKeyEvent",
                Some(DispatchKeyEventParams::named_key(KeyEventType::KeyUp, key, modifiers)),
            )
            .await?;
        Ok(())
    }

    /// Attach `files` to an `<input type="file">` element.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn set_input_files(&self, files: Vec<String>) -> Result<(), CoreError> {
        self.connection
            .execute_command::<_, serde_json::Value>(
                "DOM.setFileInputFiles",
                Some(SetFileInputFilesParams {
                    files,
                    object_id: self.object_id.clone(),
                }),
            )
            .await?;
        Ok(())
    }

    /// Capture a screenshot clipped to this element's bounds and write it to
    /// `path`. Format is fixed to JPEG regardless of `path`'s extension,
    /// since the clip-plus-quality combination this uses is only meaningful
    /// for JPEG; unlike [`crate::Tab::screenshot`], there is no
    /// `InvalidFileExtension` case here.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ElementNotVisible`] if the browser returns no
    /// image data, or propagates [`CoreError::Cdp`] / [`CoreError::Io`].
    pub async fn take_screenshot(&self, path: &std::path::Path, quality: Option<u8>) -> Result<(), CoreError> {
        let bounds = self.bounds().await?;
        let result: CaptureScreenshotResult = self
            .connection
            .execute_command(
                "Page.captureScreenshot",
                Some(CaptureScreenshotParams {
                    format: Some(ScreenshotFormat::Jpeg),
                    quality,
                    capture_beyond_viewport: Some(true),
                    clip: Some(ScreenshotClip {
                        x: bounds.x,
                        y: bounds.y,
                        width: bounds.width,
                        height: bounds.height,
                        scale: 1.0,
                    }),
                }),
            )
            .await?;

        let data = result.data.ok_or(CoreError::ElementNotVisible)?;
        use base64::{engine::general_purpose::STANDARD, Engine};
        let bytes = STANDARD
            .decode(data)
            .map_err(|e| CoreError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}

impl Locator for WebElement {
    fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    fn root_object_id(&self) -> Option<&str> {
        Some(&self.object_id)
    }
}

impl std::fmt::Debug for WebElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebElement")
            .field("tag_name", &self.tag_name)
            .field("search_method", &self.search_method)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}
