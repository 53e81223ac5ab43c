//! # Solar Data Enrichment
//!
//! Sunrise, sunset and golden-hour times come from the sunrisesunset.io API,
//! queried for the fixed crossing location once per distinct date.
//!
//! ## Data Source
//! - **URL**: `https://api.sunrisesunset.io/json?lat=..&lng=..&date=YYYY-MM-DD`
//! - **Format**: JSON, times in local 12-hour form with seconds (`"6:33:12 AM"`)
//! - **Status**: `"OK"` in the payload on success, anything else is a failure
//!
//! ## Caching Strategy
//! [`SolarEnricher`] keeps a per-run map of date to result. A failed lookup is
//! cached as `None` and not retried in the same run. Nothing is persisted
//! between runs.
//!
//! ## Rate Limiting
//! After every real lookup (never after a cache hit) the enricher sleeps for a
//! configurable courtesy delay. Lookups are strictly sequential.

use crate::{
    config::{LocationConfig, SolarConfig},
    error::CrossingError,
    time::convert_twelve_hour_to_twenty_four,
    SolarData,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::{
    cell::Cell,
    collections::HashMap,
    future::Future,
    time::Duration,
};
use tracing::{debug, warn};

/// Raw solar times as the service reports them, before normalisation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SolarTimes {
    pub sunrise: String,
    pub sunset: String,
    pub dawn: String,
    pub dusk: String,
    pub solar_noon: String,
    pub golden_hour: String,
    pub day_length: String,
}

impl SolarTimes {
    /// Convert every time to 24-hour `HH:MM` and build the golden-hour ranges.
    pub fn normalize(&self) -> SolarData {
        let sunrise = convert_twelve_hour_to_twenty_four(&self.sunrise);
        let sunset = convert_twelve_hour_to_twenty_four(&self.sunset);
        let golden_hour = convert_twelve_hour_to_twenty_four(&self.golden_hour);

        SolarData {
            golden_hour_morning: format!("{sunrise}-{golden_hour}"),
            golden_hour_evening: format!("{golden_hour}-{sunset}"),
            dawn: convert_twelve_hour_to_twenty_four(&self.dawn),
            dusk: convert_twelve_hour_to_twenty_four(&self.dusk),
            solar_noon: convert_twelve_hour_to_twenty_four(&self.solar_noon),
            day_length: self.day_length.clone(),
            sunrise,
            sunset,
        }
    }
}

/// Source of solar times for a date at the configured location.
pub trait SolarLookup {
    fn lookup(&self, date: NaiveDate) -> impl Future<Output = Result<SolarTimes, CrossingError>>;
}

#[derive(Deserialize)]
struct ApiEnvelope {
    status: String,
    #[serde(default)]
    results: serde_json::Value,
}

/// Decode a sunrisesunset.io response body.
pub fn parse_response(date: NaiveDate, body: &str) -> Result<SolarTimes, CrossingError> {
    let envelope: ApiEnvelope = serde_json::from_str(body).map_err(|e| CrossingError::Lookup {
        date,
        reason: format!("malformed payload: {e}"),
    })?;

    if envelope.status != "OK" {
        return Err(CrossingError::Lookup {
            date,
            reason: format!("API returned error: {}", envelope.status),
        });
    }

    serde_json::from_value(envelope.results).map_err(|e| CrossingError::Lookup {
        date,
        reason: format!("malformed results: {e}"),
    })
}

/// HTTP client for the sunrisesunset.io API.
#[derive(Debug, Clone)]
pub struct SunriseSunsetClient {
    http: reqwest::Client,
    base_url: String,
    latitude: f64,
    longitude: f64,
}

impl SunriseSunsetClient {
    pub fn new(solar: &SolarConfig, location: &LocationConfig) -> Result<Self, CrossingError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(solar.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: solar.base_url.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
        })
    }

    async fn fetch(&self, date: NaiveDate) -> Result<SolarTimes, CrossingError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("lat", self.latitude.to_string()),
                ("lng", self.longitude.to_string()),
                ("date", date.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrossingError::Lookup {
                date,
                reason: format!("API request failed: {}", status.as_u16()),
            });
        }

        let body = response.text().await?;
        parse_response(date, &body)
    }
}

impl SolarLookup for SunriseSunsetClient {
    async fn lookup(&self, date: NaiveDate) -> Result<SolarTimes, CrossingError> {
        // Transport errors and timeouts are lookup failures for this date
        self.fetch(date).await.map_err(|err| match err {
            CrossingError::Http(e) => CrossingError::Lookup {
                date,
                reason: e.to_string(),
            },
            other => other,
        })
    }
}

/// In-memory lookup serving fixed times, for running without the network.
///
/// Dates with no entry fall back to the default times, or fail if there is no
/// default.
#[derive(Debug, Default)]
pub struct StaticSolarLookup {
    times: HashMap<NaiveDate, SolarTimes>,
    default: Option<SolarTimes>,
    calls: Cell<usize>,
}

impl StaticSolarLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, times: SolarTimes) -> Self {
        self.default = Some(times);
        self
    }

    pub fn with_date(mut self, date: NaiveDate, times: SolarTimes) -> Self {
        self.times.insert(date, times);
        self
    }

    /// Number of lookups served (including failures).
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl SolarLookup for StaticSolarLookup {
    async fn lookup(&self, date: NaiveDate) -> Result<SolarTimes, CrossingError> {
        self.calls.set(self.calls.get() + 1);
        self.times
            .get(&date)
            .or(self.default.as_ref())
            .cloned()
            .ok_or_else(|| CrossingError::Lookup {
                date,
                reason: "no static solar data".into(),
            })
    }
}

/// Per-run solar data cache in front of a [`SolarLookup`].
pub struct SolarEnricher<L> {
    lookup: L,
    cache: HashMap<NaiveDate, Option<SolarData>>,
    courtesy_delay: Duration,
    lookups: usize,
}

impl<L: SolarLookup> SolarEnricher<L> {
    pub fn new(lookup: L, courtesy_delay: Duration) -> Self {
        Self {
            lookup,
            cache: HashMap::new(),
            courtesy_delay,
            lookups: 0,
        }
    }

    /// Solar data for `date`, fetched at most once per run.
    ///
    /// Returns `None` if the lookup failed; the failure is logged once and
    /// remembered.
    pub async fn solar_for(&mut self, date: NaiveDate) -> Option<SolarData> {
        if let Some(cached) = self.cache.get(&date) {
            debug!(%date, "solar data cache hit");
            return cached.clone();
        }

        let result = match self.lookup.lookup(date).await {
            Ok(times) => Some(times.normalize()),
            Err(err) => {
                warn!(%date, %err, "could not fetch solar data");
                None
            }
        };
        self.lookups += 1;
        self.cache.insert(date, result.clone());

        if !self.courtesy_delay.is_zero() {
            tokio::time::sleep(self.courtesy_delay).await;
        }

        result
    }

    /// Lookups actually issued this run (cache misses).
    pub fn lookups_made(&self) -> usize {
        self.lookups
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }
}
