// Atlas API response types
//
// Models for the RIPE Atlas v2 JSON API. Listing endpoints wrap their
// payload in `Page<T>`. Fields use `#[serde(default)]` liberally because
// the API omits or nulls fields depending on probe type and account state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::de;

// ── Listing envelope ─────────────────────────────────────────────────

/// One page of a listing endpoint.
///
/// ```json
/// { "count": 120, "next": "https://…?page=2", "previous": null, "results": [...] }
/// ```
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new", deserialize_with = "de::null_as_default")]
    pub results: Vec<T>,
}

// ── Credits ──────────────────────────────────────────────────────────

/// Account credit snapshot from `GET /credits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credits {
    pub current_balance: i64,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub credit_checked: bool,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub max_daily_credits: i64,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub estimated_daily_income: i64,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub estimated_daily_expenditure: i64,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub estimated_daily_balance: i64,
    #[serde(default, deserialize_with = "de::resilient_time")]
    pub calculation_time: Option<DateTime<Utc>>,
    /// Seconds until the balance hits zero at the current spend rate.
    #[serde(default)]
    pub estimated_run_out_seconds: Option<i64>,
    #[serde(default)]
    pub past_day_measurement_results: Option<i64>,
    #[serde(default)]
    pub past_day_credits_spending: Option<i64>,
    #[serde(default, deserialize_with = "de::resilient_time")]
    pub last_date_debited: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de::resilient_time")]
    pub last_date_credited: Option<DateTime<Utc>>,
}

// ── Probes ───────────────────────────────────────────────────────────

/// A probe owned by the authenticated account (`GET /probes/my`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    pub id: u64,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub country_code: String,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub description: String,
    #[serde(default)]
    pub address_v4: Option<String>,
    #[serde(default)]
    pub address_v6: Option<String>,
    #[serde(default)]
    pub asn_v4: Option<u32>,
    #[serde(default)]
    pub asn_v6: Option<u32>,
    #[serde(default)]
    pub prefix_v4: Option<String>,
    #[serde(default)]
    pub prefix_v6: Option<String>,
    #[serde(default)]
    pub firmware_version: Option<u32>,
    /// Unix seconds.
    #[serde(default)]
    pub first_connected: Option<i64>,
    /// Unix seconds; `0` if the probe never connected.
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub last_connected: i64,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub status: ProbeStatus,
    #[serde(default)]
    pub status_since: Option<i64>,
    #[serde(default)]
    pub total_uptime: Option<i64>,
    #[serde(rename = "type", default, deserialize_with = "de::null_as_default")]
    pub probe_type: String,
    #[serde(
        rename = "is_anchor",
        default,
        deserialize_with = "de::null_as_default"
    )]
    pub anchor: bool,
    #[serde(
        rename = "is_public",
        default,
        deserialize_with = "de::null_as_default"
    )]
    pub public: bool,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub tags: Vec<ProbeTag>,
}

impl Probe {
    /// `last_connected` as a timestamp.
    pub fn last_connected_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.last_connected, 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeStatus {
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "de::resilient_time")]
    pub since: Option<DateTime<Utc>>,
}

/// GeoJSON point, `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type", default, deserialize_with = "de::null_as_default")]
    pub geometry_type: String,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeTag {
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub slug: String,
}

// ── Probe measurements ───────────────────────────────────────────────

/// A measurement a probe took part in (`GET /probes/{id}/measurements`).
///
/// The wire record does not name the probe; `probe_id` is filled in by the
/// fetcher that walked that probe's listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeMeasurement {
    #[serde(skip_deserializing, default)]
    pub probe_id: u64,
    #[serde(rename = "id", deserialize_with = "de::string_or_number")]
    pub measurement_id: String,
    #[serde(rename = "type", default, deserialize_with = "de::string_or_name")]
    pub measurement_type: String,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "de::string_or_name")]
    pub status: String,
    #[serde(default, deserialize_with = "de::resilient_time")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de::resilient_time")]
    pub stop_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub target: String,
}
