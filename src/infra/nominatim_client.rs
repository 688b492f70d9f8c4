use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::app::ports::{ForwardQuery, GeocoderPort, RawReverseResponse, ReverseQuery};
use crate::config::GeocoderConfig;
use crate::domain::{GeoPoint, SuggestionEntry};
use crate::error::{GeocodeError, Result};
use crate::infra::http_client::{build_client, endpoint};

/// One element of the `/search` response. Coordinates arrive as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct NominatimPlace {
    #[serde(default)]
    pub place_id: Value,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub lat: String,
    #[serde(default)]
    pub lon: String,
}

/// Geocoder adapter for a Nominatim-compatible HTTP API
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config.user_agent, config.timeout_seconds)?,
            base_url: config.base_url.clone(),
        })
    }

    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> std::result::Result<Value, GeocodeError> {
        let url = endpoint(&self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| GeocodeError::Malformed(e.to_string()))
    }
}

pub fn search_params(query: &ForwardQuery) -> Vec<(&'static str, String)> {
    vec![
        ("q", query.text.clone()),
        ("countrycodes", query.country_codes.clone()),
        ("viewbox", query.viewbox.to_viewbox()),
        ("bounded", if query.bounded { "1" } else { "0" }.to_string()),
        ("accept-language", query.language.code().to_string()),
        ("format", "json".to_string()),
        ("limit", query.limit.to_string()),
    ]
}

pub fn reverse_params(query: &ReverseQuery) -> Vec<(&'static str, String)> {
    vec![
        ("format", "json".to_string()),
        ("lat", query.point.latitude().to_string()),
        ("lon", query.point.longitude().to_string()),
        ("zoom", query.zoom.to_string()),
        ("addressdetails", if query.address_details { "1" } else { "0" }.to_string()),
        ("accept-language", query.language.code().to_string()),
    ]
}

/// Convert search results into suggestions, keeping provider order.
///
/// Places with unparsable or out-of-range coordinates are skipped; at most
/// `limit` entries are returned.
pub fn suggestions_from_places(places: Vec<NominatimPlace>, limit: usize) -> Vec<SuggestionEntry> {
    places
        .into_iter()
        .filter_map(|place| match GeoPoint::parse(&place.lat, &place.lon) {
            Ok(point) => Some(SuggestionEntry {
                id: place_id_text(&place.place_id, &place.display_name),
                label: place.display_name,
                point,
            }),
            Err(e) => {
                warn!(label = %place.display_name, "Skipping place with bad coordinates: {}", e);
                None
            }
        })
        .take(limit)
        .collect()
}

fn place_id_text(place_id: &Value, fallback: &str) -> String {
    match place_id {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => fallback.to_string(),
    }
}

#[async_trait]
impl GeocoderPort for NominatimClient {
    #[instrument(skip(self, query), fields(service = "nominatim", api_call = "search", q = %query.text))]
    async fn search(&self, query: &ForwardQuery) -> std::result::Result<Vec<SuggestionEntry>, GeocodeError> {
        let body = self.get_json("search", &search_params(query)).await?;
        let places: Vec<NominatimPlace> =
            serde_json::from_value(body).map_err(|e| GeocodeError::Malformed(e.to_string()))?;
        let suggestions = suggestions_from_places(places, query.limit);
        debug!(count = suggestions.len(), "Search returned suggestions");
        Ok(suggestions)
    }

    #[instrument(skip(self, query), fields(service = "nominatim", api_call = "reverse_geocode", point = %query.point))]
    async fn reverse(&self, query: &ReverseQuery) -> std::result::Result<RawReverseResponse, GeocodeError> {
        let body = self.get_json("reverse", &reverse_params(query)).await?;
        if !body.is_object() {
            return Err(GeocodeError::Malformed("reverse response is not an object".into()));
        }
        if let Some(error) = body.get("error").and_then(Value::as_str) {
            return Err(GeocodeError::Malformed(error.to_string()));
        }
        Ok(body)
    }
}
