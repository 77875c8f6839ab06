//! Alert and forecast lookups exposed as tools.
//!
//! Both pipelines always produce text. Fetch failures and responses that do
//! not have the expected shape collapse into the message for the stage in
//! which they happened.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::client::Fetcher;
use crate::constants::{
    ALERTS_UNAVAILABLE, FORECAST_UNAVAILABLE, MAX_FORECAST_PERIODS, NO_ACTIVE_ALERTS,
    POINTS_UNAVAILABLE,
};
use crate::formatters::{format_alert, format_period, join_blocks};
use crate::models::{AlertResponse, ForecastResponse, PointsResponse};

/// Decodes a fetched document, treating a shape mismatch like a failed fetch.
fn decode<T: DeserializeOwned>(data: Option<Value>, what: &str) -> Option<T> {
    match serde_json::from_value(data?) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(error = %e, "Unexpected {} response shape", what);
            None
        }
    }
}

/// Active alerts for a US state, one block per alert in upstream order.
///
/// `state` is inserted into the URL verbatim; validating the code is left to
/// the upstream API.
pub async fn get_alerts<F: Fetcher + ?Sized>(fetcher: &F, state: &str) -> String {
    let url = format!("{}/alerts/active/area/{}", fetcher.base_url(), state);

    let Some(alerts) = decode::<AlertResponse>(fetcher.fetch(&url).await, "alerts") else {
        return ALERTS_UNAVAILABLE.to_string();
    };

    if alerts.features.is_empty() {
        return NO_ACTIVE_ALERTS.to_string();
    }

    info!(count = alerts.features.len(), "Formatting alerts");
    join_blocks(alerts.features.iter().map(format_alert).collect())
}

/// Forecast for a coordinate: resolves the grid point, then fetches and
/// formats its first periods.
pub async fn get_forecast<F: Fetcher + ?Sized>(
    fetcher: &F,
    latitude: f64,
    longitude: f64,
) -> String {
    // `{:?}` keeps the trailing `.0` on whole coordinates, e.g. `40.0,-74.0`.
    let points_url = format!("{}/points/{:?},{:?}", fetcher.base_url(), latitude, longitude);

    let Some(points) = decode::<PointsResponse>(fetcher.fetch(&points_url).await, "points") else {
        return POINTS_UNAVAILABLE.to_string();
    };

    let forecast_url = points.properties.forecast;
    let Some(forecast) =
        decode::<ForecastResponse>(fetcher.fetch(&forecast_url).await, "forecast")
    else {
        return FORECAST_UNAVAILABLE.to_string();
    };

    join_blocks(
        forecast
            .properties
            .periods
            .iter()
            .take(MAX_FORECAST_PERIODS)
            .map(format_period)
            .collect(),
    )
}
