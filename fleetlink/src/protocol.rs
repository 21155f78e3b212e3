//! Fleet hub wire format.
//!
//! Request and response bodies for the hub's JSON-over-POST API. Every
//! response carries a server-defined result code, distinct from the
//! transport-level HTTP status: `"000"` means success, a small set of
//! codes signals a stale session token, and anything else is a business
//! rejection.
//!
//! Numeric fields travel as strings: coordinates are scaled by 1e6 and
//! rounded, timestamps are local-time digit strings (14 digits with
//! seconds for power events, 12 digits without for batch windows).

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;

/// Result code the hub returns on success.
pub const RESULT_SUCCESS: &str = "000";

/// Result codes signalling that the session token is no longer valid
/// and must be re-acquired.
pub const STALE_TOKEN_CODES: &[&str] = &["100", "101"];

/// Token issuing endpoint, relative to the API base URL.
pub const TOKEN_PATH: &str = "/api/emulator/token";
/// Session-start event endpoint, relative to the hub base URL.
pub const POWER_ON_PATH: &str = "/api/on";
/// Session-end event endpoint, relative to the hub base URL.
pub const POWER_OFF_PATH: &str = "/api/off";
/// Telemetry batch endpoint, relative to the hub base URL.
pub const TELEMETRY_PATH: &str = "/api/gps";

/// Header carrying the session token on authenticated calls.
pub const TOKEN_HEADER: &str = "Token";

/// GPS fix quality placeholder: the emulator always reports a normal fix.
const FIX_QUALITY_NORMAL: &str = "A";
/// Battery voltage placeholder (value x10, so 12.0 V).
const BATTERY_PLACEHOLDER: &str = "120";
/// Odometer placeholder: no durable trip history is kept.
const ODOMETER_PLACEHOLDER: &str = "0";

/// Identity and protocol descriptor sent with every request.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceDescriptor {
    /// Vehicle identifier (MDN).
    pub mdn: String,
    /// Terminal id.
    pub tid: String,
    /// Maker id.
    pub mid: String,
    /// Protocol version.
    pub pv: String,
    /// Device id.
    pub did: String,
}

impl DeviceDescriptor {
    /// Creates the descriptor for a vehicle, with the fixed protocol
    /// fields the hub expects.
    pub fn new(mdn: impl Into<String>) -> Self {
        Self {
            mdn: mdn.into(),
            tid: "A001".to_string(),
            mid: "6".to_string(),
            pv: "5".to_string(),
            did: "1".to_string(),
        }
    }
}

/// Body of the token-issuing request.
#[derive(Debug, Serialize)]
pub struct TokenRequest {
    #[serde(flatten)]
    pub device: DeviceDescriptor,
    #[serde(rename = "dFWVer")]
    pub firmware_version: String,
}

/// Body of the session-start and session-end events.
#[derive(Debug, Serialize)]
pub struct PowerEventRequest {
    #[serde(flatten)]
    pub device: DeviceDescriptor,
    #[serde(rename = "onTime")]
    pub on_time: String,
    #[serde(rename = "offTime", skip_serializing_if = "Option::is_none")]
    pub off_time: Option<String>,
    pub gcd: String,
    pub lat: String,
    pub lon: String,
    pub ang: String,
    pub spd: String,
    pub sum: String,
}

impl PowerEventRequest {
    /// Builds a session-start event at the given position.
    pub fn power_on(device: DeviceDescriptor, on_time: &str, position: Coordinate) -> Self {
        Self::event(device, on_time, None, position)
    }

    /// Builds a session-end event carrying the original start time.
    pub fn power_off(
        device: DeviceDescriptor,
        on_time: &str,
        off_time: &str,
        position: Coordinate,
    ) -> Self {
        Self::event(device, on_time, Some(off_time.to_string()), position)
    }

    fn event(
        device: DeviceDescriptor,
        on_time: &str,
        off_time: Option<String>,
        position: Coordinate,
    ) -> Self {
        Self {
            device,
            on_time: on_time.to_string(),
            off_time,
            gcd: FIX_QUALITY_NORMAL.to_string(),
            lat: scale_coordinate(position.latitude),
            lon: scale_coordinate(position.longitude),
            ang: "0".to_string(),
            spd: "0".to_string(),
            sum: ODOMETER_PLACEHOLDER.to_string(),
        }
    }
}

/// One positional sample inside a telemetry batch.
#[derive(Debug, Clone, Serialize)]
pub struct SampleEntry {
    /// Two-digit sequence label within the batch window.
    pub sec: String,
    /// GPS fix quality.
    pub gcd: String,
    /// Latitude x1e6.
    pub lat: String,
    /// Longitude x1e6.
    pub lon: String,
    /// Bearing in degrees, [0, 360).
    pub ang: String,
    /// Speed in km/h, clamped to [0, 255].
    pub spd: String,
    /// Accumulated odometer in meters.
    pub sum: String,
    /// Battery voltage x10.
    pub bat: String,
}

impl SampleEntry {
    /// Builds the wire entry for the sample at `index` within its batch.
    pub fn new(index: usize, position: Coordinate, speed_kmh: f64, bearing_deg: f64) -> Self {
        Self {
            sec: format!("{:02}", index % 60),
            gcd: FIX_QUALITY_NORMAL.to_string(),
            lat: scale_coordinate(position.latitude),
            lon: scale_coordinate(position.longitude),
            ang: format_bearing(bearing_deg),
            spd: format_speed(speed_kmh),
            sum: ODOMETER_PLACEHOLDER.to_string(),
            bat: BATTERY_PLACEHOLDER.to_string(),
        }
    }
}

/// Body of the telemetry batch upload.
#[derive(Debug, Serialize)]
pub struct TelemetryBatchRequest {
    #[serde(flatten)]
    pub device: DeviceDescriptor,
    /// Batch window start, 12-digit local timestamp.
    #[serde(rename = "oTime")]
    pub window_start: String,
    /// Number of samples in the batch.
    #[serde(rename = "cCnt")]
    pub sample_count: String,
    /// Samples, index-ordered.
    #[serde(rename = "cList")]
    pub samples: Vec<SampleEntry>,
}

/// Response body shared by every hub endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct HubResponse {
    #[serde(rename = "resultCode")]
    pub result_code: String,
    #[serde(rename = "resultMessage", default)]
    pub result_message: String,
    /// Present only on token-issuing responses.
    #[serde(default)]
    pub token: Option<String>,
}

impl HubResponse {
    /// True when the result code signals success.
    pub fn is_success(&self) -> bool {
        self.result_code == RESULT_SUCCESS
    }

    /// True when the result code signals a stale session token.
    pub fn is_stale_token(&self) -> bool {
        STALE_TOKEN_CODES.contains(&self.result_code.as_str())
    }
}

/// Scales a coordinate component by 1e6 and renders it as the integer
/// string the hub expects.
pub fn scale_coordinate(degrees: f64) -> String {
    ((degrees * 1_000_000.0).round() as i64).to_string()
}

/// Renders a speed in km/h as an integer string clamped to [0, 255].
pub fn format_speed(speed_kmh: f64) -> String {
    (speed_kmh.clamp(0.0, 255.0).round() as u16).to_string()
}

/// Renders a bearing as an integer string normalized to [0, 360).
pub fn format_bearing(bearing_deg: f64) -> String {
    ((bearing_deg.rem_euclid(360.0)).round() as u16 % 360).to_string()
}

/// Formats a local timestamp as the 14-digit `YYYYMMDDHHmmss` form used
/// by power events.
pub fn format_timestamp_seconds(at: DateTime<Local>) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}

/// Formats a local timestamp as the 12-digit `YYYYMMDDHHmm` form used
/// by batch windows.
pub fn format_timestamp_minutes(at: DateTime<Local>) -> String {
    at.format("%Y%m%d%H%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_request_shape() {
        let request = TokenRequest {
            device: DeviceDescriptor::new("123"),
            firmware_version: "1.0.0".to_string(),
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();

        assert_eq!(json["mdn"], "123");
        assert_eq!(json["tid"], "A001");
        assert_eq!(json["mid"], "6");
        assert_eq!(json["pv"], "5");
        assert_eq!(json["did"], "1");
        assert_eq!(json["dFWVer"], "1.0.0");
    }

    #[test]
    fn test_power_on_omits_off_time() {
        let request = PowerEventRequest::power_on(
            DeviceDescriptor::new("123"),
            "20250101120000",
            Coordinate::new(37.5, 127.0),
        );
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();

        assert_eq!(json["onTime"], "20250101120000");
        assert!(json.get("offTime").is_none());
        assert_eq!(json["lat"], "37500000");
        assert_eq!(json["lon"], "127000000");
        assert_eq!(json["gcd"], "A");
        assert_eq!(json["ang"], "0");
        assert_eq!(json["spd"], "0");
    }

    #[test]
    fn test_power_off_carries_both_times() {
        let request = PowerEventRequest::power_off(
            DeviceDescriptor::new("123"),
            "20250101120000",
            "20250101123000",
            Coordinate::new(37.5, 127.0),
        );
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();

        assert_eq!(json["onTime"], "20250101120000");
        assert_eq!(json["offTime"], "20250101123000");
    }

    #[test]
    fn test_sample_entry_sequence_and_scaling() {
        let entry = SampleEntry::new(7, Coordinate::new(37.5665, 126.978), 62.4, 90.2);
        assert_eq!(entry.sec, "07");
        assert_eq!(entry.lat, "37566500");
        assert_eq!(entry.lon, "126978000");
        assert_eq!(entry.spd, "62");
        assert_eq!(entry.ang, "90");
        assert_eq!(entry.bat, "120");
        assert_eq!(entry.sum, "0");
    }

    #[test]
    fn test_sample_entry_sequence_wraps_at_sixty() {
        let entry = SampleEntry::new(61, Coordinate::new(0.0, 0.0), 0.0, 0.0);
        assert_eq!(entry.sec, "01");
    }

    #[test]
    fn test_format_speed_clamps() {
        assert_eq!(format_speed(-10.0), "0");
        assert_eq!(format_speed(300.0), "255");
        assert_eq!(format_speed(254.6), "255");
        assert_eq!(format_speed(80.4), "80");
    }

    #[test]
    fn test_format_bearing_normalizes() {
        assert_eq!(format_bearing(0.0), "0");
        assert_eq!(format_bearing(359.6), "0");
        assert_eq!(format_bearing(-90.0), "270");
        assert_eq!(format_bearing(720.5), "1");
    }

    #[test]
    fn test_hub_response_parsing() {
        let ok: HubResponse =
            serde_json::from_str(r#"{"resultCode":"000","resultMessage":"OK","token":"T1"}"#)
                .unwrap();
        assert!(ok.is_success());
        assert!(!ok.is_stale_token());
        assert_eq!(ok.token.as_deref(), Some("T1"));

        let stale: HubResponse =
            serde_json::from_str(r#"{"resultCode":"100","resultMessage":"token expired"}"#)
                .unwrap();
        assert!(!stale.is_success());
        assert!(stale.is_stale_token());
        assert!(stale.token.is_none());

        let minimal: HubResponse = serde_json::from_str(r#"{"resultCode":"903"}"#).unwrap();
        assert!(!minimal.is_success());
        assert_eq!(minimal.result_message, "");
    }

    #[test]
    fn test_timestamp_formats() {
        let at = Local::now();
        assert_eq!(format_timestamp_seconds(at).len(), 14);
        assert_eq!(format_timestamp_minutes(at).len(), 12);
        assert!(format_timestamp_seconds(at).starts_with(&format_timestamp_minutes(at)));
    }

    #[test]
    fn test_batch_request_shape() {
        let request = TelemetryBatchRequest {
            device: DeviceDescriptor::new("123"),
            window_start: "202501011200".to_string(),
            sample_count: "1".to_string(),
            samples: vec![SampleEntry::new(0, Coordinate::new(37.5, 127.0), 50.0, 10.0)],
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();

        assert_eq!(json["oTime"], "202501011200");
        assert_eq!(json["cCnt"], "1");
        assert_eq!(json["cList"][0]["sec"], "00");
        assert_eq!(json["mdn"], "123");
    }
}
