//! Geolocation web service client.
//!
//! Speaks the Ichnaea/Google style `geolocate` JSON protocol:
//!
//! ```text
//! POST <endpoint>
//! {"considerIp": false,
//!  "cellTowers": [{"radioType": "lte", "mobileCountryCode": 244, ...}],
//!  "wifiAccessPoints": [{"macAddress": "...", "signalStrength": -60}]}
//!
//! 200 {"location": {"lat": 60.17, "lng": 24.94}, "accuracy": 1200.0}
//! 404 no position known
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::locator::{BoxFuture, LocateRequest, OnlineError, OnlineFix, OnlineLocator};
use super::query::LocationQuery;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeolocateRequest {
    consider_ip: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cell_towers: Vec<CellTower>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    wifi_access_points: Vec<WifiAccessPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CellTower {
    radio_type: &'static str,
    mobile_country_code: u16,
    mobile_network_code: u16,
    location_area_code: u32,
    cell_id: u32,
    signal_strength: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WifiAccessPoint {
    mac_address: String,
    signal_strength: i32,
}

#[derive(Debug, Deserialize)]
struct GeolocateResponse {
    location: ResponseLocation,
    accuracy: f64,
}

#[derive(Debug, Deserialize)]
struct ResponseLocation {
    lat: f64,
    lng: f64,
}

fn request_body(query: &LocationQuery) -> GeolocateRequest {
    GeolocateRequest {
        consider_ip: false,
        cell_towers: query
            .cells
            .iter()
            .map(|obs| CellTower {
                radio_type: obs.cell.technology().radio_type(),
                mobile_country_code: obs.cell.mcc(),
                mobile_network_code: obs.cell.mnc(),
                location_area_code: obs.cell.location_code(),
                cell_id: obs.cell.cell_id(),
                signal_strength: obs.signal_strength,
            })
            .collect(),
        wifi_access_points: query
            .wlans
            .iter()
            .map(|wlan| WifiAccessPoint {
                mac_address: wlan.bssid.clone(),
                signal_strength: wlan.signal_strength_dbm,
            })
            .collect(),
    }
}

fn parse_response(body: &[u8]) -> Result<OnlineFix, OnlineError> {
    let response: GeolocateResponse =
        serde_json::from_slice(body).map_err(|e| OnlineError::Decode(e.to_string()))?;
    Ok(OnlineFix {
        latitude: response.location.lat,
        longitude: response.location.lng,
        accuracy: response.accuracy,
    })
}

/// [`OnlineLocator`] backed by an HTTP geolocation endpoint.
#[derive(Debug, Clone)]
pub struct HttpLocator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpLocator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, OnlineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OnlineError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn geolocate(&self, request: LocateRequest) -> Result<OnlineFix, OnlineError> {
        if let Some(previous) = &request.previous {
            debug!(
                since_previous_ms = request.query.created_at_ms.saturating_sub(previous.created_at_ms),
                "Sending follow-up geolocate query"
            );
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request_body(&request.query))
            .send()
            .await
            .map_err(|e| OnlineError::Http(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(OnlineError::NotFound);
        }
        if !status.is_success() {
            return Err(OnlineError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| OnlineError::Http(format!("Failed to read response: {}", e)))?;
        parse_response(&body)
    }
}

impl OnlineLocator for HttpLocator {
    fn locate(&self, request: LocateRequest) -> BoxFuture<'_, Result<OnlineFix, OnlineError>> {
        Box::pin(self.geolocate(request))
    }
}
