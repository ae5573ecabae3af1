//! Market-data sources for pair snapshots and current prices.
//!
//! `SnapshotSource` is the seam the monitoring cycle talks to; the DexScreener
//! implementation fetches over HTTP with adaptive rate limiting and retries.
//! Missing numeric fields are defaulted to neutral values when a pair is
//! mapped to a snapshot, but a missing price on a price lookup is a failure.

use crate::hunter::error::LookupError;
use crate::hunter::rate_limit::AdaptiveRateLimiter;
use crate::hunter::types::HunterConfig;
use crate::types::{TokenSnapshot, UNKNOWN_AGE_HOURS};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, instrument, warn};

/// Supplier of pair snapshots and current prices.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Recently created pairs on `chain`.
    async fn fetch_recent_pairs(&self, chain: &str) -> Result<Vec<TokenSnapshot>, LookupError>;

    /// Current USD price of `address`.
    async fn fetch_current_price(&self, address: &str) -> Result<f64, LookupError>;
}

// --- DexScreener wire format ---
//
// The feed is loosely typed: numbers sometimes arrive as strings and single
// pairs can be malformed. Numeric fields accept a number or a numeric string
// and fall back to `None` on anything else. A pair that still fails to decode
// is dropped on its own instead of failing the whole response.

fn number_from(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from))
}

/// Counts: negative values are discarded, fractions truncated.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_from)
        .filter(|v| *v >= 0.0)
        .map(|v| v as u64))
}

fn lenient_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|v| v as i64)),
        Some(other) => number_from(&other).map(|v| v as i64),
        None => None,
    })
}

fn lenient_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn decode_pairs<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<DexPair>>, D::Error> {
    let Some(raw) = Option::<Vec<Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let total = raw.len();
    let pairs: Vec<DexPair> = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<DexPair>(value) {
            Ok(pair) => Some(pair),
            Err(e) => {
                warn!("Dropping malformed pair: {}", e);
                None
            }
        })
        .collect();
    if pairs.len() < total {
        debug!("Decoded {} of {} pairs", pairs.len(), total);
    }
    Ok(Some(pairs))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DexResponse {
    #[serde(default, deserialize_with = "decode_pairs")]
    pub pairs: Option<Vec<DexPair>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexPair {
    #[serde(default, deserialize_with = "lenient_text")]
    pub chain_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub dex_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub url: Option<String>,
    #[serde(default)]
    pub pair_address: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub base_token: Option<DexToken>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price_usd: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub txns: Option<DexTxns>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub volume: Option<DexWindows>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub price_change: Option<DexWindows>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub liquidity: Option<DexLiquidity>,
    /// Creation time in epoch milliseconds
    #[serde(default, deserialize_with = "lenient_millis")]
    pub pair_created_at: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DexToken {
    #[serde(default, deserialize_with = "lenient_text")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DexTxns {
    #[serde(default, deserialize_with = "lenient_object")]
    pub m5: Option<DexTxnCount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DexTxnCount {
    #[serde(default, deserialize_with = "lenient_count")]
    pub buys: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub sells: Option<u64>,
}

/// Per-window figures (volume in USD or price change in percent).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DexWindows {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub m5: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub h1: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DexLiquidity {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usd: Option<f64>,
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Parse a DexScreener decimal string into a usable price.
pub fn parse_price(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|p| p.is_finite() && *p > 0.0)
}

/// Last-hour volume against the 24h hourly average, 1.0 when unknown.
pub fn volume_surge(volume: Option<&DexWindows>) -> f64 {
    let Some(volume) = volume else {
        return 1.0;
    };
    match (volume.h1, volume.h24) {
        (Some(h1), Some(h24)) if h24 > 0.0 && h1.is_finite() && h24.is_finite() => h1 * 24.0 / h24,
        _ => 1.0,
    }
}

impl DexPair {
    /// Map to a snapshot, defaulting anything the feed left out.
    pub fn to_snapshot(&self, fallback_chain: &str, now_ms: i64) -> TokenSnapshot {
        let address = self.pair_address.clone().unwrap_or_default();
        let chain = self
            .chain_id
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| fallback_chain.to_string());
        let base = self.base_token.clone().unwrap_or_default();
        let txns_5m = self
            .txns
            .as_ref()
            .and_then(|t| t.m5.as_ref())
            .map(|m5| m5.buys.unwrap_or(0).saturating_add(m5.sells.unwrap_or(0)))
            .unwrap_or(0);
        let age_hours = match self.pair_created_at {
            Some(created) if created > 0 => ((now_ms - created) as f64 / 3_600_000.0).max(0.0),
            _ => UNKNOWN_AGE_HOURS,
        };
        let url = self
            .url
            .clone()
            .unwrap_or_else(|| format!("https://dexscreener.com/{}/{}", chain, address));

        TokenSnapshot {
            name: base.name.unwrap_or_default(),
            symbol: base.symbol.unwrap_or_default(),
            dex: self.dex_id.clone().unwrap_or_default(),
            price_usd: parse_price(self.price_usd.as_deref()).unwrap_or(0.0),
            liquidity_usd: finite_or_zero(self.liquidity.as_ref().and_then(|l| l.usd)),
            volume_24h: finite_or_zero(self.volume.as_ref().and_then(|v| v.h24)),
            age_hours,
            holders: 0,
            price_change_5m: finite_or_zero(self.price_change.as_ref().and_then(|p| p.m5)),
            price_change_1h: finite_or_zero(self.price_change.as_ref().and_then(|p| p.h1)),
            txns_5m,
            volume_surge: volume_surge(self.volume.as_ref()),
            address,
            chain,
            url,
        }
    }
}

/// Keep the first `max_pairs` pairs younger than `max_age_hours`.
pub fn recent_snapshots(
    pairs: &[DexPair],
    chain: &str,
    now_ms: i64,
    max_pairs: usize,
    max_age_hours: f64,
) -> Vec<TokenSnapshot> {
    pairs
        .iter()
        .take(max_pairs)
        .map(|pair| pair.to_snapshot(chain, now_ms))
        .filter(|snapshot| snapshot.age_hours < max_age_hours && !snapshot.address.is_empty())
        .collect()
}

fn is_retryable(error: &LookupError) -> bool {
    match error {
        LookupError::Unavailable(_) => true,
        LookupError::Status(code) => *code == StatusCode::TOO_MANY_REQUESTS.as_u16() || *code >= 500,
        _ => false,
    }
}

/// DexScreener HTTP client.
pub struct DexScreenerSource {
    http_client: Client,
    base_url: String,
    limiter: Mutex<AdaptiveRateLimiter>,
    timeout: Duration,
    retry_attempts: usize,
    max_pairs_per_chain: usize,
    max_pair_age_hours: f64,
}

impl DexScreenerSource {
    pub fn new(http_client: Client, config: &HunterConfig) -> Self {
        Self {
            http_client,
            base_url: config.dexscreener_base_url.trim_end_matches('/').to_string(),
            limiter: Mutex::new(AdaptiveRateLimiter::new(config.requests_per_minute, 20, 0.3)),
            timeout: Duration::from_secs(config.http_timeout_seconds),
            retry_attempts: config.retry_attempts,
            max_pairs_per_chain: config.max_pairs_per_chain,
            max_pair_age_hours: config.max_pair_age_hours,
        }
    }

    async fn send_once<T: DeserializeOwned>(&self, url: &str) -> Result<T, LookupError> {
        let response = self.http_client.get(url).timeout(self.timeout).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }
        Ok(response.json::<T>().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, LookupError> {
        self.limiter.lock().await.acquire().await;
        let result = self.send_once::<T>(url).await;

        let mut limiter = self.limiter.lock().await;
        match &result {
            Ok(_) => limiter.record_success(),
            Err(e) if is_retryable(e) => limiter.record_failure(),
            Err(_) => {}
        }
        result
    }

    async fn get_with_retries<T: DeserializeOwned>(&self, url: &str) -> Result<T, LookupError> {
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(100)
            .max_delay(Duration::from_secs(5))
            .take(self.retry_attempts);

        RetryIf::spawn(strategy, || self.get_json::<T>(url), is_retryable).await
    }
}

#[async_trait]
impl SnapshotSource for DexScreenerSource {
    #[instrument(skip(self))]
    async fn fetch_recent_pairs(&self, chain: &str) -> Result<Vec<TokenSnapshot>, LookupError> {
        let url = format!("{}/search?q={}", self.base_url, chain);
        let response: DexResponse = self.get_with_retries(&url).await?;
        let pairs = response.pairs.unwrap_or_default();
        let now_ms = chrono::Utc::now().timestamp_millis();

        let snapshots = recent_snapshots(
            &pairs,
            chain,
            now_ms,
            self.max_pairs_per_chain,
            self.max_pair_age_hours,
        );
        debug!("{} of {} pairs on {} are recent", snapshots.len(), pairs.len(), chain);
        Ok(snapshots)
    }

    #[instrument(skip(self))]
    async fn fetch_current_price(&self, address: &str) -> Result<f64, LookupError> {
        let url = format!("{}/tokens/{}", self.base_url, address);
        let response: DexResponse = self.get_with_retries(&url).await?;

        let first = response
            .pairs
            .and_then(|pairs| pairs.into_iter().next())
            .ok_or_else(|| LookupError::NoPrice(address.to_string()))?;

        match parse_price(first.price_usd.as_deref()) {
            Some(price) => Ok(price),
            None => {
                warn!("Pair for {} reported no usable price: {:?}", address, first.price_usd);
                Err(LookupError::NoPrice(address.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW_MS: i64 = 1_700_000_000_000;

    fn sample_response() -> DexResponse {
        let body = serde_json::json!({
            "schemaVersion": "1.0.0",
            "pairs": [
                {
                    "chainId": "ethereum",
                    "dexId": "uniswap",
                    "url": "https://dexscreener.com/ethereum/0xpair1",
                    "pairAddress": "0xpair1",
                    "baseToken": { "address": "0xtoken1", "name": "Frog Coin", "symbol": "FROG" },
                    "priceUsd": "0.00001234",
                    "txns": { "m5": { "buys": 40, "sells": 25 }, "h1": { "buys": 100, "sells": 80 } },
                    "volume": { "h24": 240000.0, "h6": 100000.0, "h1": 60000.0, "m5": 5000.0 },
                    "priceChange": { "m5": 12.5, "h1": 64.0, "h24": 300.0 },
                    "liquidity": { "usd": 55000.0, "base": 1.0, "quote": 2.0 },
                    "pairCreatedAt": NOW_MS - 2 * 3_600_000
                },
                {
                    "chainId": "ethereum",
                    "dexId": "uniswap",
                    "pairAddress": "0xold",
                    "baseToken": { "name": "Old", "symbol": "OLD" },
                    "priceUsd": "1.5",
                    "pairCreatedAt": NOW_MS - 100 * 3_600_000
                },
                {
                    "chainId": "ethereum",
                    "pairAddress": "0xnodate",
                    "baseToken": { "symbol": "NODATE" },
                    "priceUsd": null,
                    "liquidity": null
                }
            ]
        });
        serde_json::from_value(body).expect("fixture parses")
    }

    #[test]
    fn test_pair_maps_to_snapshot() {
        let response = sample_response();
        let pair = &response.pairs.as_ref().unwrap()[0];
        let snapshot = pair.to_snapshot("ethereum", NOW_MS);

        assert_eq!(snapshot.address, "0xpair1");
        assert_eq!(snapshot.name, "Frog Coin");
        assert_eq!(snapshot.symbol, "FROG");
        assert_eq!(snapshot.dex, "uniswap");
        assert!((snapshot.price_usd - 0.00001234).abs() < 1e-12);
        assert_eq!(snapshot.liquidity_usd, 55000.0);
        assert_eq!(snapshot.volume_24h, 240000.0);
        assert_eq!(snapshot.txns_5m, 65);
        assert!((snapshot.age_hours - 2.0).abs() < 1e-9);
        assert_eq!(snapshot.price_change_5m, 12.5);
        assert_eq!(snapshot.price_change_1h, 64.0);
        assert!((snapshot.volume_surge - 6.0).abs() < 1e-9);
        assert_eq!(snapshot.holders, 0);
    }

    #[test]
    fn test_missing_fields_default_to_neutral() {
        let response = sample_response();
        let pair = &response.pairs.as_ref().unwrap()[2];
        let snapshot = pair.to_snapshot("bsc", NOW_MS);

        assert_eq!(snapshot.chain, "ethereum");
        assert_eq!(snapshot.price_usd, 0.0);
        assert_eq!(snapshot.liquidity_usd, 0.0);
        assert_eq!(snapshot.txns_5m, 0);
        assert_eq!(snapshot.age_hours, UNKNOWN_AGE_HOURS);
        assert_eq!(snapshot.volume_surge, 1.0);
        assert_eq!(snapshot.url, "https://dexscreener.com/ethereum/0xnodate");
    }

    #[test]
    fn test_recent_snapshots_filters_by_age() {
        let response = sample_response();
        let pairs = response.pairs.unwrap();
        let recent = recent_snapshots(&pairs, "ethereum", NOW_MS, 20, 48.0);

        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].address, "0xpair1");
    }

    #[test]
    fn test_recent_snapshots_respects_pair_limit() {
        let response = sample_response();
        let pairs = response.pairs.unwrap();
        assert!(recent_snapshots(&pairs, "ethereum", NOW_MS, 0, 48.0).is_empty());
    }

    #[test]
    fn test_parse_price_rejects_unusable_values() {
        assert_eq!(parse_price(Some("0.5")), Some(0.5));
        assert_eq!(parse_price(Some(" 2 ")), Some(2.0));
        assert_eq!(parse_price(Some("0")), None);
        assert_eq!(parse_price(Some("-1")), None);
        assert_eq!(parse_price(Some("abc")), None);
        assert_eq!(parse_price(None), None);
    }

    #[test]
    fn test_volume_surge_defaults() {
        assert_eq!(volume_surge(None), 1.0);
        let no_daily = DexWindows { h1: Some(100.0), h24: Some(0.0), ..Default::default() };
        assert_eq!(volume_surge(Some(&no_daily)), 1.0);
    }

    #[test]
    fn test_malformed_pair_does_not_sink_response() {
        let body = serde_json::json!({
            "pairs": [
                {
                    "chainId": "bsc",
                    "pairAddress": "0xgood",
                    "baseToken": { "symbol": "GOOD" },
                    "priceUsd": "0.25",
                    "txns": { "m5": { "buys": 10, "sells": 5 } },
                    "liquidity": { "usd": 50000.0 },
                    "pairCreatedAt": NOW_MS - 3_600_000
                },
                {
                    "chainId": "bsc",
                    "pairAddress": "0xsloppy",
                    "baseToken": { "symbol": 42 },
                    "priceUsd": 0.5,
                    "txns": { "m5": { "buys": 3.7, "sells": -2 } },
                    "volume": { "h24": "abc", "h1": "600" },
                    "priceChange": "n/a",
                    "liquidity": { "usd": "12000" },
                    "pairCreatedAt": (NOW_MS - 7_200_000).to_string()
                },
                { "chainId": "bsc", "pairAddress": 123 },
                "garbage"
            ]
        });
        let response: DexResponse = serde_json::from_value(body).expect("response still parses");
        let pairs = response.pairs.unwrap();
        assert_eq!(pairs.len(), 2);

        let snapshots = recent_snapshots(&pairs, "bsc", NOW_MS, 20, 48.0);
        assert_eq!(snapshots.len(), 2);

        let good = &snapshots[0];
        assert_eq!(good.address, "0xgood");
        assert_eq!(good.liquidity_usd, 50000.0);
        assert_eq!(good.txns_5m, 15);

        let sloppy = &snapshots[1];
        assert_eq!(sloppy.address, "0xsloppy");
        assert_eq!(sloppy.symbol, "");
        assert_eq!(sloppy.liquidity_usd, 12000.0);
        assert_eq!(sloppy.price_usd, 0.5);
        assert_eq!(sloppy.txns_5m, 3);
        assert_eq!(sloppy.volume_24h, 0.0);
        assert_eq!(sloppy.volume_surge, 1.0);
        assert_eq!(sloppy.price_change_5m, 0.0);
        assert!((sloppy.age_hours - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_oversized_txn_counts_saturate() {
        let body = serde_json::json!({
            "pairs": [{
                "pairAddress": "0xbig",
                "txns": { "m5": { "buys": u64::MAX, "sells": 10 } }
            }]
        });
        let response: DexResponse = serde_json::from_value(body).unwrap();
        let snapshot = response.pairs.unwrap()[0].to_snapshot("ethereum", NOW_MS);
        assert_eq!(snapshot.txns_5m, u64::MAX);
    }

    #[test]
    fn test_null_pairs_parse() {
        let response: DexResponse =
            serde_json::from_str(r#"{"schemaVersion":"1.0.0","pairs":null}"#).unwrap();
        assert!(response.pairs.is_none());
    }

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable(&LookupError::Status(429)));
        assert!(is_retryable(&LookupError::Status(503)));
        assert!(is_retryable(&LookupError::Unavailable("reset".into())));
        assert!(!is_retryable(&LookupError::Status(404)));
        assert!(!is_retryable(&LookupError::Parse("bad".into())));
    }

    #[tokio::test]
    async fn test_source_creation() {
        let config = HunterConfig::default();
        let source = DexScreenerSource::new(Client::new(), &config);
        assert_eq!(source.base_url, "https://api.dexscreener.com/latest/dex");
        assert_eq!(source.max_pairs_per_chain, 20);
    }
}
