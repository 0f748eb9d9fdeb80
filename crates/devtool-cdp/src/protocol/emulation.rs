//! Emulation domain types: device metrics and user agent overrides.

use serde::Serialize;

/// Parameters for `Emulation.setDeviceMetricsOverride`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDeviceMetricsOverrideParams {
    /// Overridden screen width, in pixels. 0 disables the override.
    pub width: i32,
    /// Overridden screen height, in pixels. 0 disables the override.
    pub height: i32,
    /// Overridden device scale factor. 0 uses the default value.
    pub device_scale_factor: f64,
    /// Whether the emulated device is a mobile device.
    pub mobile: bool,
}

/// Parameters for `Emulation.setUserAgentOverride`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUserAgentOverrideParams {
    /// User agent string reported to scripts and the network stack.
    pub user_agent: String,
    /// `Accept-Language` header value to report alongside it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_language: Option<String>,
}
