//! Client for the voucher listing service.
//!
//! The listing is paged with `limit`/`offset`; pages are requested until the
//! service's reported total is reached.

use super::{RecordSource, VoucherQuery};
use crate::config::VoucherSourceConfig;
use crate::error::FetchError;
use crate::models::VoucherRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

const LISTING_PATH: &str = "/api/v1.0/voucher/";

/// One page of the voucher listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherPage {
    pub rows: Vec<VoucherRecord>,
    pub total: usize,
}

pub struct VoucherApiClient {
    client: reqwest::Client,
    base_url: String,
    status_code: String,
    page_size: usize,
    max_attempts: u32,
    backoff: Duration,
}

impl VoucherApiClient {
    pub fn new(config: &VoucherSourceConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            status_code: config.status_code.clone(),
            page_size: config.page_size,
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_millis(config.backoff_ms),
        })
    }

    /// Fetch a page, retrying transient failures with exponential backoff.
    async fn fetch_page(
        &self,
        query: &VoucherQuery,
        offset: usize,
    ) -> Result<VoucherPage, FetchError> {
        let mut delay = self.backoff;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.request_page(query, offset).await {
                Ok(page) => return Ok(page),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt >= self.max_attempts => {
                    return Err(FetchError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    })
                }
                Err(e) => {
                    warn!(error = %e, offset, attempt, "failed to fetch voucher page; retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }

    async fn request_page(
        &self,
        query: &VoucherQuery,
        offset: usize,
    ) -> Result<VoucherPage, FetchError> {
        let url = format!("{}{}", self.base_url, LISTING_PATH);
        let mut params = vec![
            ("status__code", self.status_code.clone()),
            ("limit", self.page_size.to_string()),
            ("offset", offset.to_string()),
        ];
        if !query.facility_ids.is_empty() {
            let ids: Vec<String> = query.facility_ids.iter().map(i64::to_string).collect();
            params.push(("sanatorium_id__in", ids.join(",")));
        }
        if let Some(period) = query.period {
            params.push(("date_begin__gte", period.from.to_string()));
            params.push(("date_begin__lte", period.to.to_string()));
        }

        debug!(url = %url, offset, "fetching voucher page");
        let response = self.client.get(&url).query(&params).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RecordSource for VoucherApiClient {
    async fn fetch(&self, query: &VoucherQuery) -> Result<Vec<VoucherRecord>, FetchError> {
        let mut vouchers: Vec<VoucherRecord> = Vec::new();
        let mut pages = 0;

        loop {
            let page = self.fetch_page(query, vouchers.len()).await?;
            pages += 1;
            let total = page.total;

            if page.rows.is_empty() && vouchers.len() < total {
                return Err(FetchError::PaginationDidNotTerminate {
                    fetched: vouchers.len(),
                    total,
                    pages,
                });
            }
            vouchers.extend(page.rows);

            if vouchers.len() >= total {
                break;
            }
            // every accepted page adds a row, so more pages than rows means a moving total
            if pages > total {
                return Err(FetchError::PaginationDidNotTerminate {
                    fetched: vouchers.len(),
                    total,
                    pages,
                });
            }
        }

        info!(vouchers = vouchers.len(), pages, "voucher listing fetched");
        Ok(vouchers)
    }
}
