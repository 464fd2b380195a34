// =================================================================
// exchange/alpaca.rs - Alpaca Market Data Implementation
// =================================================================

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::{
    errors::ExchangeError,
    traits::MarketDataProvider,
    types::{AlpacaBarsResponse, AlpacaErrorMessage, BarParams, MINUTE_TIMEFRAME},
    utils::{build_bars_query, convert_alpaca_bar, select_symbol_bars, sort_and_dedup, validate_symbol},
};
use crate::config;
use crossover_common::data::Bar;

// Constants
const BARS_PATH: &str = "/v2/stocks/bars";
const KEY_ID_HEADER: &str = "APCA-API-KEY-ID";
const SECRET_KEY_HEADER: &str = "APCA-API-SECRET-KEY";
const MAX_PAGE_LIMIT: u32 = 10_000;

/// Alpaca market data REST client
pub struct AlpacaClient {
    data_url: String,
    key_id: String,
    secret_key: String,
    client: reqwest::Client,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
    page_limit: u32,
}

impl AlpacaClient {
    pub fn from_settings(settings: &config::Alpaca) -> Self {
        Self {
            data_url: settings.data_url.trim_end_matches('/').to_string(),
            key_id: settings.key_id.clone(),
            secret_key: settings.secret_key.clone(),
            client: reqwest::Client::new(),
            timeout: settings.timeout(),
            max_retries: settings.max_retries,
            retry_delay: settings.retry_delay(),
            page_limit: settings.page_limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    fn has_credentials(&self) -> bool {
        !self.key_id.is_empty() && !self.secret_key.is_empty()
    }

    /// Fetch a single page of bars
    async fn fetch_page(
        &self,
        params: &BarParams,
        page_token: Option<&str>,
    ) -> Result<AlpacaBarsResponse, ExchangeError> {
        let url = format!("{}{}", self.data_url, BARS_PATH);
        let query = build_bars_query(params, page_token);

        debug!("Fetching bars from {} (page token: {:?})", url, page_token);

        let response = self
            .client
            .get(&url)
            .query(&query)
            .header(KEY_ID_HEADER, &self.key_id)
            .header(SECRET_KEY_HEADER, &self.secret_key)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch one page, retrying transient failures with a fixed delay
    async fn fetch_page_with_retry(
        &self,
        params: &BarParams,
        page_token: Option<&str>,
    ) -> Result<AlpacaBarsResponse, ExchangeError> {
        let mut attempt = 0;

        loop {
            match self.fetch_page(params, page_token).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "Bar request failed (attempt {}/{}): {}. Retrying in {:?}...",
                        attempt, self.max_retries, e, self.retry_delay
                    );
                    sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Map a non-success HTTP status to an error
pub fn classify_status(status: StatusCode, body: &str) -> ExchangeError {
    let message = serde_json::from_str::<AlpacaErrorMessage>(body)
        .map(|m| m.message)
        .unwrap_or_else(|_| body.trim().to_string());
    let detail = format!("HTTP {}: {}", status, message);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ExchangeError::Unauthorized(detail),
        StatusCode::TOO_MANY_REQUESTS => ExchangeError::RateLimit(detail),
        s if s.is_server_error() => ExchangeError::ServerError(detail),
        _ => ExchangeError::ApiError(detail),
    }
}

#[async_trait]
impl MarketDataProvider for AlpacaClient {
    async fn get_bars(&self, params: &BarParams) -> Result<Vec<Bar>, ExchangeError> {
        let symbol = validate_symbol(&params.symbol)?;

        if !self.has_credentials() {
            return Err(ExchangeError::Unauthorized(
                "APCA_API_KEY_ID and APCA_API_SECRET_KEY must be set".to_string(),
            ));
        }

        let mut params = params.clone();
        params.symbol = symbol.clone();
        if params.limit.is_none() {
            params = params.with_limit(self.page_limit);
        }

        info!(
            "Fetching {} bars for {} from {} to {}",
            MINUTE_TIMEFRAME,
            symbol,
            params.start,
            params.end
        );

        let mut bars = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        let mut pages = 0;

        loop {
            let mut page = self
                .fetch_page_with_retry(&params, page_token.as_deref())
                .await?;
            pages += 1;

            for alpaca_bar in select_symbol_bars(&mut page, &symbol) {
                match convert_alpaca_bar(&symbol, alpaca_bar) {
                    Ok(bar) => bars.push(bar),
                    Err(e) => warn!("Failed to convert bar: {}", e),
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => {
                    if !seen_tokens.insert(token.clone()) {
                        return Err(ExchangeError::ApiError(format!(
                            "Pagination repeated page token {} after {} page(s)",
                            token, pages
                        )));
                    }
                    page_token = Some(token);
                }
                _ => break,
            }
        }

        sort_and_dedup(&mut bars);

        info!(
            "Successfully fetched {} bars for {} in {} page(s)",
            bars.len(),
            symbol,
            pages
        );
        Ok(bars)
    }
}

impl Default for AlpacaClient {
    fn default() -> Self {
        Self::from_settings(&config::Alpaca::default())
    }
}
