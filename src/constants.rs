use std::time::Duration;

/// User agent string for HTTP requests
pub const USER_AGENT: &str = "weather-app/1.0";

/// Accept header value expected by the NWS API
pub const ACCEPT_GEO_JSON: &str = "application/geo+json";

/// National Weather Service API base URL
pub const NWS_API_BASE: &str = "https://api.weather.gov";

/// Timeout applied to every upstream request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Number of forecast periods included in a forecast
pub const MAX_FORECAST_PERIODS: usize = 5;

/// Separator placed between formatted alerts or forecast periods
pub const BLOCK_SEPARATOR: &str = "\n---\n";

pub const ALERTS_UNAVAILABLE: &str = "Unable to fetch alerts or no alerts found.";
pub const NO_ACTIVE_ALERTS: &str = "No active alerts for this state.";
pub const POINTS_UNAVAILABLE: &str = "Unable to fetch forecast data for this location.";
pub const FORECAST_UNAVAILABLE: &str = "Unable to fetch detailed forecast.";
