use anyhow::Result;
use rmcp::{
    handler::server::{wrapper::Parameters, ServerHandler, tool::ToolRouter},
    model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    ErrorData as McpError,
};

use crate::client::NwsClient;
use crate::models::{GetAlertsRequest, GetForecastRequest};
use crate::tools;

/// Weather service that exposes the alert and forecast lookups as MCP tools
#[derive(Clone)]
pub struct Weather {
    client: NwsClient,
    tool_router: ToolRouter<Self>,
}

impl Weather {
    /// Creates a Weather service backed by the public NWS API
    pub fn new() -> Result<Self> {
        Ok(Self::with_client(NwsClient::new()?))
    }

    /// Creates a Weather service backed by the given client
    pub fn with_client(client: NwsClient) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_handler]
impl ServerHandler for Weather {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "weather".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                title: None,
                website_url: None,
            },
            instructions: Some(
                "Weather alerts for US states and short-term forecasts for US coordinates, \
                powered by the National Weather Service API."
                    .to_string(),
            ),
        }
    }
}

#[tool_router]
impl Weather {
    /// Gets active weather alerts for a US state
    #[tool(description = "Get weather alerts for a US state. Provide a two-letter US state code (e.g. CA, NY).")]
    async fn get_alerts(
        &self,
        Parameters(request): Parameters<GetAlertsRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!("Getting alerts for state: {}", request.state);

        let text = tools::get_alerts(&self.client, &request.state).await;

        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Gets the short-term forecast for a location
    #[tool(description = "Get weather forecast for a location. Provide the latitude and longitude of the location.")]
    async fn get_forecast(
        &self,
        Parameters(request): Parameters<GetForecastRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            "Getting forecast for coordinates: {}, {}",
            request.latitude,
            request.longitude
        );

        let text = tools::get_forecast(&self.client, request.latitude, request.longitude).await;

        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_service(mock_server: &MockServer) -> Weather {
        let client = NwsClient::with_base_url(mock_server.uri(), Duration::from_secs(5)).unwrap();
        Weather::with_client(client)
    }

    fn result_text(result: &CallToolResult) -> String {
        assert_eq!(result.is_error, Some(false));
        assert_eq!(result.content.len(), 1);
        result.content[0].as_text().unwrap().text.clone()
    }

    #[test]
    fn test_registers_both_tools() {
        let tools = Weather::tool_router().list_all();
        let mut names: Vec<String> = tools.iter().map(|t| t.name.to_string()).collect();
        names.sort();

        assert_eq!(names, vec!["get_alerts", "get_forecast"]);

        let forecast = tools.iter().find(|t| t.name == "get_forecast").unwrap();
        let properties = forecast.input_schema.get("properties").unwrap();
        assert!(properties.get("latitude").is_some());
        assert!(properties.get("longitude").is_some());
    }

    #[tokio::test]
    async fn test_get_alerts_tool() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/alerts/active/area/CA"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "type": "FeatureCollection",
                "features": [{
                    "properties": {
                        "event": "Red Flag Warning",
                        "areaDesc": "Los Angeles County",
                        "severity": "Severe",
                        "description": "Gusty winds and low humidity.",
                        "instruction": "Avoid outdoor burning."
                    }
                }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let service = create_test_service(&mock_server);
        let result = service
            .get_alerts(Parameters(GetAlertsRequest {
                state: "CA".to_string(),
            }))
            .await
            .unwrap();

        assert_eq!(
            result_text(&result),
            "\nEvent: Red Flag Warning\nArea: Los Angeles County\nSeverity: Severe\n\
             Description: Gusty winds and low humidity.\nInstructions: Avoid outdoor burning.\n"
        );
    }

    #[tokio::test]
    async fn test_get_alerts_tool_upstream_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let service = create_test_service(&mock_server);
        let result = service
            .get_alerts(Parameters(GetAlertsRequest {
                state: "CA".to_string(),
            }))
            .await
            .unwrap();

        assert_eq!(
            result_text(&result),
            "Unable to fetch alerts or no alerts found."
        );
    }

    #[tokio::test]
    async fn test_get_forecast_tool_follows_grid_point() {
        let mock_server = MockServer::start().await;
        let forecast_url = format!("{}/gridpoints/OKX/33,35/forecast", mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/points/40.7128,-74.006"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "properties": { "forecast": forecast_url }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/gridpoints/OKX/33,35/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "properties": {
                    "periods": [
                        {
                            "name": "Today",
                            "temperature": 75,
                            "temperatureUnit": "F",
                            "windSpeed": "5 mph",
                            "windDirection": "E",
                            "detailedForecast": "Sunny, with a high near 75."
                        },
                        {
                            "name": "Tonight",
                            "temperature": 60,
                            "temperatureUnit": "F",
                            "windSpeed": "3 mph",
                            "windDirection": "NE",
                            "detailedForecast": "Clear, with a low around 60."
                        }
                    ]
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let service = create_test_service(&mock_server);
        let result = service
            .get_forecast(Parameters(GetForecastRequest {
                latitude: 40.7128,
                longitude: -74.006,
            }))
            .await
            .unwrap();

        assert_eq!(
            result_text(&result),
            "\nToday:\nTemperature: 75°F\nWind: 5 mph E\nForecast: Sunny, with a high near 75.\n\
             \n---\n\
             \nTonight:\nTemperature: 60°F\nWind: 3 mph NE\nForecast: Clear, with a low around 60.\n"
        );
    }

    #[tokio::test]
    async fn test_get_forecast_tool_unknown_location() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/points/0.0,0.0"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        let service = create_test_service(&mock_server);
        let result = service
            .get_forecast(Parameters(GetForecastRequest {
                latitude: 0.0,
                longitude: 0.0,
            }))
            .await
            .unwrap();

        assert_eq!(
            result_text(&result),
            "Unable to fetch forecast data for this location."
        );
    }
}
