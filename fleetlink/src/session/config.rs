//! Session configuration.

use std::time::Duration;

use crate::protocol::{self, DeviceDescriptor};

/// Configuration for a tracking session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the token-issuing API.
    pub api_base_url: String,
    /// Base URL of the fleet-tracking hub.
    pub hub_base_url: String,
    /// Vehicle identifier (MDN). Format validation is the caller's
    /// concern.
    pub vehicle_id: String,
    /// Firmware version reported in the token request.
    pub firmware_version: String,
    /// Collection tick period.
    pub collect_period: Duration,
    /// Number of samples accumulated before an upload is triggered.
    pub batch_window: usize,
}

impl SessionConfig {
    /// Creates a configuration for the given vehicle with production
    /// defaults: 1 second tick, 60 sample window.
    pub fn new(vehicle_id: impl Into<String>) -> Self {
        Self {
            api_base_url: "https://api.where-car.com:8080".to_string(),
            hub_base_url: "http://ts.where-car.com:8090".to_string(),
            vehicle_id: vehicle_id.into(),
            firmware_version: "1.0.0".to_string(),
            collect_period: Duration::from_secs(1),
            batch_window: 60,
        }
    }

    /// Overrides the token API base URL.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Overrides the hub base URL.
    pub fn with_hub_base_url(mut self, url: impl Into<String>) -> Self {
        self.hub_base_url = url.into();
        self
    }

    /// Overrides the collection tick period.
    pub fn with_collect_period(mut self, period: Duration) -> Self {
        self.collect_period = period;
        self
    }

    /// Overrides the batch window size.
    pub fn with_batch_window(mut self, window: usize) -> Self {
        self.batch_window = window;
        self
    }

    /// Device descriptor for this vehicle.
    pub fn descriptor(&self) -> DeviceDescriptor {
        DeviceDescriptor::new(self.vehicle_id.clone())
    }

    pub fn token_url(&self) -> String {
        format!("{}{}", self.api_base_url, protocol::TOKEN_PATH)
    }

    pub fn power_on_url(&self) -> String {
        format!("{}{}", self.hub_base_url, protocol::POWER_ON_PATH)
    }

    pub fn power_off_url(&self) -> String {
        format!("{}{}", self.hub_base_url, protocol::POWER_OFF_PATH)
    }

    pub fn telemetry_url(&self) -> String {
        format!("{}{}", self.hub_base_url, protocol::TELEMETRY_PATH)
    }
}
