//! Price backend adapter over blocking HTTP.

use crate::adapters::json_adapter::{filter_to_request, parse_wire_bars};
use crate::domain::error::TraderError;
use crate::domain::price_bar::PriceBar;
use crate::ports::data_port::{DataPort, FetchRequest};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

const QUERY_DATE_FORMAT: &str = "%Y-%m-%d";

pub struct HttpAdapter {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl HttpAdapter {
    pub fn new(base_url: &str) -> Result<Self, TraderError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("tradetrainer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TraderError::DataSource {
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stock_url(&self, symbol: &str) -> String {
        format!("{}/stock/{}", self.base_url, symbol)
    }
}

/// `start`/`end` query pairs; an open end of the request is left out.
fn query_params(request: &FetchRequest) -> Vec<(&'static str, String)> {
    let mut query = Vec::with_capacity(2);
    if request.has_start() {
        query.push(("start", request.start.format(QUERY_DATE_FORMAT).to_string()));
    }
    if request.has_end() {
        query.push(("end", request.end.format(QUERY_DATE_FORMAT).to_string()));
    }
    query
}

impl DataPort for HttpAdapter {
    fn fetch_bars(&self, request: &FetchRequest) -> Result<Vec<PriceBar>, TraderError> {
        let url = self.stock_url(&request.symbol);
        let query = query_params(request);

        tracing::debug!(%url, ?query, "requesting price series");

        let body = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .and_then(|resp| resp.text())
            .map_err(|e| {
                tracing::warn!(%url, error = %e, "price request failed");
                TraderError::DataSource {
                    reason: format!("request to {} failed: {}", url, e),
                }
            })?;

        // error responses carry an {"error": ...} body, decoded below
        let bars = parse_wire_bars(&body)?;
        Ok(filter_to_request(bars, request))
    }
}
