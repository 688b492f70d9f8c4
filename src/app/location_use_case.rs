//! Location resolution: search suggestions, point selection, device location
//! and reverse lookup, all feeding one [`LocationState`].
//!
//! Network and device calls are the only suspension points. Each search and
//! each selected point is tagged with a generation number when issued; a
//! result whose generation is no longer the latest is dropped on arrival, so
//! a slow response can never overwrite a newer one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::app::ports::{DeviceLocationPort, ForwardQuery, GeocoderPort, ReverseQuery};
use crate::config::GeocoderConfig;
use crate::constants::MAX_SUGGESTIONS;
use crate::domain::{GeoPoint, ResolvedAddress, SuggestionEntry};
use crate::error::{DeviceLocationFailure, GeocodeError};
use crate::normalize::{AddressNormalizer, NominatimAddressNormalizer};
use crate::observability::metrics;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("geocoding failed: {0}")]
    Geocode(#[from] GeocodeError),

    #[error("device location failed: {0}")]
    Device(#[from] DeviceLocationFailure),

    #[error("coordinates out of range: {latitude}, {longitude}")]
    InvalidPoint { latitude: f64, longitude: f64 },

    #[error("a newer location was selected before this address arrived")]
    Superseded,
}

/// Result of one `search` call.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Blank query: suggestions cleared, nothing sent.
    Cleared,
    /// Suggestions replaced with these entries.
    Updated(Vec<SuggestionEntry>),
    /// Request failed; suggestions cleared.
    Failed(GeocodeError),
    /// A newer search was issued meanwhile; this result was dropped.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationTicket(u64);

/// Session state for location resolution.
///
/// All transitions are synchronous; the async pipeline only decides when to
/// call them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationState {
    query: String,
    suggestions: Vec<SuggestionEntry>,
    current_location: Option<GeoPoint>,
    address: Option<ResolvedAddress>,
    search_generation: u64,
    location_generation: u64,
    device_lookups: usize,
}

impl LocationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[SuggestionEntry] {
        &self.suggestions
    }

    pub fn current_location(&self) -> Option<GeoPoint> {
        self.current_location
    }

    /// Address for `current_location`, once its reverse lookup has landed.
    pub fn address(&self) -> Option<&ResolvedAddress> {
        self.address.as_ref()
    }

    /// True while at least one device-location request is running.
    pub fn resolution_in_progress(&self) -> bool {
        self.device_lookups > 0
    }

    /// Record a newly typed query.
    ///
    /// Every call supersedes earlier searches. Returns `None` for a blank
    /// query, after clearing the suggestions.
    pub fn begin_search(&mut self, query: &str) -> Option<SearchTicket> {
        self.query = query.to_string();
        self.search_generation += 1;
        if query.trim().is_empty() {
            self.suggestions.clear();
            return None;
        }
        Some(SearchTicket(self.search_generation))
    }

    pub fn finish_search(
        &mut self,
        ticket: SearchTicket,
        result: Result<Vec<SuggestionEntry>, GeocodeError>,
    ) -> SearchOutcome {
        if ticket.0 != self.search_generation {
            return SearchOutcome::Superseded;
        }
        match result {
            Ok(mut suggestions) => {
                suggestions.truncate(MAX_SUGGESTIONS);
                self.suggestions = suggestions.clone();
                SearchOutcome::Updated(suggestions)
            }
            Err(e) => {
                self.suggestions.clear();
                SearchOutcome::Failed(e)
            }
        }
    }

    /// Move to `point`, closing the suggestion list and dropping any pending
    /// search results. The previous address no longer applies and is cleared.
    pub fn select_point(&mut self, point: GeoPoint) -> LocationTicket {
        self.search_generation += 1;
        self.location_generation += 1;
        self.suggestions.clear();
        self.current_location = Some(point);
        self.address = None;
        LocationTicket(self.location_generation)
    }

    /// Like [`select_point`](Self::select_point), keeping the label as the query text.
    pub fn select_suggestion(&mut self, entry: &SuggestionEntry) -> LocationTicket {
        self.query = entry.label.clone();
        self.select_point(entry.point)
    }

    /// A device fix replaces whatever was typed.
    pub fn select_device_point(&mut self, point: GeoPoint) -> LocationTicket {
        self.query.clear();
        self.select_point(point)
    }

    pub fn finish_address(
        &mut self,
        ticket: LocationTicket,
        address: ResolvedAddress,
    ) -> Result<ResolvedAddress, LocationError> {
        if ticket.0 != self.location_generation {
            return Err(LocationError::Superseded);
        }
        self.address = Some(address.clone());
        Ok(address)
    }

    pub fn begin_device_lookup(&mut self) {
        self.device_lookups += 1;
    }

    pub fn end_device_lookup(&mut self) {
        self.device_lookups = self.device_lookups.saturating_sub(1);
    }
}

fn lock_state(state: &Mutex<LocationState>) -> MutexGuard<'_, LocationState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps the in-progress flag raised for one device lookup and lowers it on drop.
struct DeviceLookupGuard<'a> {
    state: &'a Mutex<LocationState>,
}

impl<'a> DeviceLookupGuard<'a> {
    fn start(state: &'a Mutex<LocationState>) -> Self {
        lock_state(state).begin_device_lookup();
        Self { state }
    }
}

impl Drop for DeviceLookupGuard<'_> {
    fn drop(&mut self) {
        lock_state(self.state).end_device_lookup();
    }
}

/// Orchestrates the geocoder, the device-location port and the normalizer
/// around one session's [`LocationState`].
///
/// Methods take `&self` so several calls can be in flight together; the
/// state lock is never held across an await.
pub struct LocationPipeline {
    geocoder: Arc<dyn GeocoderPort>,
    device: Arc<dyn DeviceLocationPort>,
    normalizer: Box<dyn AddressNormalizer>,
    config: GeocoderConfig,
    state: Mutex<LocationState>,
}

impl LocationPipeline {
    pub fn new(
        geocoder: Arc<dyn GeocoderPort>,
        device: Arc<dyn DeviceLocationPort>,
        config: GeocoderConfig,
    ) -> Self {
        Self::with_normalizer(geocoder, device, Box::new(NominatimAddressNormalizer), config)
    }

    pub fn with_normalizer(
        geocoder: Arc<dyn GeocoderPort>,
        device: Arc<dyn DeviceLocationPort>,
        normalizer: Box<dyn AddressNormalizer>,
        config: GeocoderConfig,
    ) -> Self {
        Self {
            geocoder,
            device,
            normalizer,
            config,
            state: Mutex::new(LocationState::new()),
        }
    }

    /// Copy of the current session state.
    pub fn snapshot(&self) -> LocationState {
        lock_state(&self.state).clone()
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> SearchOutcome {
        let ticket = lock_state(&self.state).begin_search(query);
        let Some(ticket) = ticket else {
            debug!("Blank query, suggestions cleared");
            return SearchOutcome::Cleared;
        };

        metrics::geocode::request("search");
        let request = ForwardQuery::from_config(query, &self.config);
        let result = self.geocoder.search(&request).await;
        if let Err(e) = &result {
            warn!("Search failed: {}", e);
            metrics::geocode::failure("search");
        }

        let outcome = lock_state(&self.state).finish_search(ticket, result);
        if outcome == SearchOutcome::Superseded {
            debug!("Discarded superseded search result");
            metrics::geocode::search_superseded();
        }
        outcome
    }

    /// Pick the first suggestion of a non-blank query, if there is one.
    pub async fn submit_search(&self) -> Option<Result<ResolvedAddress, LocationError>> {
        let first = {
            let state = lock_state(&self.state);
            if state.query().trim().is_empty() {
                None
            } else {
                state.suggestions().first().cloned()
            }
        };
        match first {
            Some(entry) => Some(self.select_suggestion(&entry).await),
            None => None,
        }
    }

    #[instrument(skip(self, entry), fields(id = %entry.id, point = %entry.point))]
    pub async fn select_suggestion(
        &self,
        entry: &SuggestionEntry,
    ) -> Result<ResolvedAddress, LocationError> {
        let ticket = lock_state(&self.state).select_suggestion(entry);
        self.resolve_address(entry.point, ticket).await
    }

    /// Map click or marker drag.
    #[instrument(skip(self))]
    pub async fn select_point(&self, point: GeoPoint) -> Result<ResolvedAddress, LocationError> {
        let ticket = lock_state(&self.state).select_point(point);
        self.resolve_address(point, ticket).await
    }

    /// Raw coordinates; rejected before any state change when out of range.
    pub async fn select_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ResolvedAddress, LocationError> {
        let point = GeoPoint::new(latitude, longitude)
            .map_err(|_| LocationError::InvalidPoint { latitude, longitude })?;
        self.select_point(point).await
    }

    /// Locate via the device and resolve the address there.
    ///
    /// The in-progress flag is raised for the whole call and lowered exactly
    /// once when it returns, whether the device or the reverse lookup failed.
    #[instrument(skip(self))]
    pub async fn use_device_location(&self) -> Result<ResolvedAddress, LocationError> {
        let _lookup = DeviceLookupGuard::start(&self.state);

        let point = match self.device.current_position().await {
            Ok(point) => point,
            Err(failure) => {
                warn!("Device location failed: {}", failure);
                metrics::device::failure(device_failure_kind(failure));
                return Err(failure.into());
            }
        };

        info!(%point, "Device location acquired");
        let ticket = lock_state(&self.state).select_device_point(point);
        self.resolve_address(point, ticket).await
    }

    async fn resolve_address(
        &self,
        point: GeoPoint,
        ticket: LocationTicket,
    ) -> Result<ResolvedAddress, LocationError> {
        if !self.config.viewbox.contains(&point) {
            debug!(%point, "Point lies outside the search region");
        }
        metrics::geocode::request("reverse");
        let request = ReverseQuery::from_config(point, &self.config);
        let raw = self.geocoder.reverse(&request).await.map_err(|e| {
            warn!(%point, "Reverse geocoding failed: {}", e);
            metrics::geocode::failure("reverse");
            LocationError::from(e)
        })?;

        let address = self.normalizer.normalize(&raw);
        let result = lock_state(&self.state).finish_address(ticket, address);
        match &result {
            Ok(address) => debug!(%point, display = %address.display_address, "Address resolved"),
            Err(_) => {
                debug!(%point, "Discarded address for superseded location");
                metrics::geocode::address_superseded();
            }
        }
        result
    }
}

fn device_failure_kind(failure: DeviceLocationFailure) -> &'static str {
    match failure {
        DeviceLocationFailure::PermissionDenied => "permission_denied",
        DeviceLocationFailure::PositionUnavailable => "unavailable",
        DeviceLocationFailure::Timeout => "timeout",
        DeviceLocationFailure::Unsupported => "unsupported",
    }
}
