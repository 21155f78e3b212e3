//! Telemetry batch accumulation and upload.
//!
//! Samples accumulate in memory until the session controller triggers a
//! drain. The drain snapshots and clears the accumulator before the
//! network call, so upload latency never stalls collection: ticks keep
//! appending into the fresh buffer while the previous window is in
//! flight. Samples of a failed upload are not restored (at-most-once
//! delivery per window).

use std::sync::Mutex;

use chrono::Local;
use tracing::info;

use crate::auth::{AuthError, CredentialManager};
use crate::protocol::{self, DeviceDescriptor, SampleEntry, TelemetryBatchRequest};
use crate::source::Sample;
use crate::transport::AsyncHttpClient;

/// Accumulates samples and ships them as fixed-shape batch payloads.
#[derive(Default)]
pub struct BatchUploader {
    samples: Mutex<Vec<Sample>>,
}

impl BatchUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample to the live accumulator.
    pub fn append(&self, sample: Sample) {
        self.samples.lock().unwrap().push(sample);
    }

    /// Number of samples currently accumulated.
    pub fn len(&self) -> usize {
        self.samples.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().unwrap().is_empty()
    }

    /// Ships the accumulated samples as one batch.
    ///
    /// An empty accumulator is a no-op that makes no network call.
    /// Otherwise the accumulator is cleared immediately and the payload
    /// is built from the snapshot: one index-ordered entry per sample
    /// with a two-digit sequence label. Returns the number of samples
    /// shipped. On failure the drained samples are lost by design.
    pub async fn drain<C: AsyncHttpClient>(
        &self,
        credentials: &CredentialManager<C>,
        url: &str,
        device: &DeviceDescriptor,
    ) -> Result<usize, AuthError> {
        let drained = {
            let mut samples = self.samples.lock().unwrap();
            if samples.is_empty() {
                return Ok(0);
            }
            std::mem::take(&mut *samples)
        };

        let request = TelemetryBatchRequest {
            device: device.clone(),
            window_start: protocol::format_timestamp_minutes(Local::now()),
            sample_count: drained.len().to_string(),
            samples: drained
                .iter()
                .enumerate()
                .map(|(index, sample)| {
                    SampleEntry::new(
                        index,
                        sample.coordinate,
                        sample.speed_kmh,
                        sample.bearing_deg,
                    )
                })
                .collect(),
        };

        credentials.authenticated_call(url, &request).await?;
        info!(samples = drained.len(), "telemetry batch uploaded");
        Ok(drained.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;
    use crate::transport::tests::MockHttpClient;
    use std::time::Instant;

    const TOKEN_OK: &str = r#"{"resultCode":"000","resultMessage":"OK","token":"T1"}"#;
    const CALL_OK: &str = r#"{"resultCode":"000","resultMessage":"OK"}"#;

    fn credentials(mock: &MockHttpClient) -> CredentialManager<MockHttpClient> {
        CredentialManager::new(
            mock.clone(),
            "http://api/token".to_string(),
            DeviceDescriptor::new("123"),
            "1.0.0".to_string(),
        )
    }

    fn sample(latitude: f64, longitude: f64, speed_kmh: f64, bearing_deg: f64) -> Sample {
        Sample {
            coordinate: Coordinate::new(latitude, longitude),
            timestamp: Instant::now(),
            speed_kmh,
            bearing_deg,
        }
    }

    #[tokio::test]
    async fn test_empty_drain_makes_no_network_call() {
        let mock = MockHttpClient::new();
        let credentials = credentials(&mock);
        let uploader = BatchUploader::new();

        // Idempotent on empty: two drains, zero calls.
        assert_eq!(
            uploader
                .drain(&credentials, "http://hub/api/gps", &DeviceDescriptor::new("123"))
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            uploader
                .drain(&credentials, "http://hub/api/gps", &DeviceDescriptor::new("123"))
                .await
                .unwrap(),
            0
        );
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_full_window_payload_shape() {
        let mock = MockHttpClient::new();
        mock.push_response(TOKEN_OK);
        mock.push_response(CALL_OK);

        let credentials = credentials(&mock);
        let uploader = BatchUploader::new();
        for i in 0..60 {
            uploader.append(sample(37.5 + 0.0001 * i as f64, 127.0, 50.0, 10.0));
        }

        let shipped = uploader
            .drain(&credentials, "http://hub/api/gps", &DeviceDescriptor::new("123"))
            .await
            .unwrap();
        assert_eq!(shipped, 60);
        assert!(uploader.is_empty());

        let requests = mock.requests();
        // Token request plus exactly one batch call.
        assert_eq!(requests.len(), 2);
        let body: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
        assert_eq!(body["cCnt"], "60");
        assert_eq!(body["oTime"].as_str().unwrap().len(), 12);

        let entries = body["cList"].as_array().unwrap();
        assert_eq!(entries.len(), 60);
        assert_eq!(entries[0]["sec"], "00");
        assert_eq!(entries[59]["sec"], "59");
        assert_eq!(entries[0]["spd"], "50");
        assert_eq!(entries[0]["bat"], "120");
    }

    #[tokio::test]
    async fn test_failed_drain_does_not_restore_samples() {
        let mock = MockHttpClient::new();
        mock.push_response(TOKEN_OK);
        mock.push_error(crate::transport::TransportError::HttpStatus {
            url: "http://hub/api/gps".to_string(),
            status: 500,
        });

        let credentials = credentials(&mock);
        let uploader = BatchUploader::new();
        uploader.append(sample(37.5, 127.0, 50.0, 0.0));

        let result = uploader
            .drain(&credentials, "http://hub/api/gps", &DeviceDescriptor::new("123"))
            .await;
        assert!(result.is_err());
        // At-most-once: the window is gone.
        assert!(uploader.is_empty());
    }

    #[tokio::test]
    async fn test_appends_during_conceptual_flight_land_in_fresh_buffer() {
        let mock = MockHttpClient::new();
        mock.push_response(TOKEN_OK);
        mock.push_response(CALL_OK);

        let credentials = credentials(&mock);
        let uploader = BatchUploader::new();
        uploader.append(sample(37.5, 127.0, 50.0, 0.0));

        uploader
            .drain(&credentials, "http://hub/api/gps", &DeviceDescriptor::new("123"))
            .await
            .unwrap();

        // A sample appended after the drain belongs to the next window.
        uploader.append(sample(37.6, 127.0, 51.0, 0.0));
        assert_eq!(uploader.len(), 1);
    }
}
