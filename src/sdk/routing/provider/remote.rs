use super::{build_client, directions_url, send_directions, DEFAULT_PROFILE, DEFAULT_TIMEOUT_SECS};
use crate::sdk::config::RoutingSettings;
use crate::sdk::geo::Coordinate;
use crate::sdk::routing::error::RoutingError;
use crate::sdk::routing::route::RouteSummary;
use crate::sdk::routing::service::RoutingProvider;
use crate::sdk::util::rate_limit::{self, Limiter};
use reqwest::blocking::Client;

pub const ORS_BASE_URL: &str = "https://api.openrouteservice.org";

/// Hosted openrouteservice, authenticated with an API key.
pub struct RemoteOrsProvider {
    client: Client,
    api_key: String,
    base_url: String,
    profile: String,
    timeout_secs: u64,
    limiter: Limiter,
}

impl RemoteOrsProvider {
    pub fn new(api_key: String, limiter: Limiter) -> Result<Self, RoutingError> {
        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
            api_key,
            base_url: ORS_BASE_URL.to_string(),
            profile: DEFAULT_PROFILE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            limiter,
        })
    }

    pub fn from_settings(
        api_key: String,
        base_url: String,
        settings: &RoutingSettings,
    ) -> Result<Self, RoutingError> {
        Ok(Self {
            client: build_client(settings.timeout_secs)?,
            api_key,
            base_url,
            profile: settings.profile.clone(),
            timeout_secs: settings.timeout_secs,
            limiter: rate_limit::ors_limiter(settings.requests_per_minute),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl RoutingProvider for RemoteOrsProvider {
    fn get_directions(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<RouteSummary, RoutingError> {
        if start == end {
            log::debug!("Start and end coordinates are identical. Returning zero route.");
            return Ok(RouteSummary::stationary(start));
        }

        rate_limit::wait(&self.limiter);
        log::debug!(
            "[PROVIDER] Calling remote get_directions for {} -> {}",
            start,
            end
        );
        let url = directions_url(&self.base_url, &self.profile);
        let request = self
            .client
            .post(&url)
            .header("Authorization", &self.api_key);

        send_directions(request, &url, start, end, self.timeout_secs)
    }
}
