//! Advisory history of launches, pumps and fired price alerts.
//!
//! The ledger is append-only and never consulted for live decisions: tracked
//! positions live only in memory and are lost on restart.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, FromRow, Pool, Sqlite};
use tracing::{debug, info};

use crate::hunter::types::{ExitKind, LaunchRecord, PriceAlertRecord, PumpRecord};

/// Persistence contract for the hunter's history.
#[async_trait]
pub trait HunterStorage: Send + Sync {
    /// Store a launch. Returns `false` when the address was already stored.
    async fn record_launch(&self, record: &LaunchRecord) -> Result<bool>;

    async fn record_pump(&self, record: &PumpRecord) -> Result<i64>;

    async fn record_price_alert(&self, record: &PriceAlertRecord) -> Result<i64>;

    /// Launches first seen at or after `since` (ms), oldest first.
    async fn launches_since(&self, since: i64) -> Result<Vec<LaunchRecord>>;

    async fn pumps_since(&self, since: i64) -> Result<Vec<PumpRecord>>;

    async fn price_alerts_since(&self, since: i64) -> Result<Vec<PriceAlertRecord>>;

    /// Row counts as (launches, pumps, price alerts).
    async fn counts(&self) -> Result<(i64, i64, i64)>;

    async fn health_check(&self) -> Result<bool>;
}

#[derive(FromRow)]
struct LaunchRow {
    address: String,
    name: String,
    symbol: String,
    chain: String,
    dex: String,
    price_usd: f64,
    liquidity_usd: f64,
    score: i64,
    is_pumping: bool,
    seen_at: i64,
}

impl From<LaunchRow> for LaunchRecord {
    fn from(row: LaunchRow) -> Self {
        Self {
            address: row.address,
            name: row.name,
            symbol: row.symbol,
            chain: row.chain,
            dex: row.dex,
            price_usd: row.price_usd,
            liquidity_usd: row.liquidity_usd,
            score: row.score.clamp(0, 100) as u8,
            is_pumping: row.is_pumping,
            seen_at: row.seen_at,
        }
    }
}

#[derive(FromRow)]
struct PumpRow {
    address: String,
    symbol: String,
    chain: String,
    price_change_5m: f64,
    price_change_1h: f64,
    volume_surge: f64,
    score: i64,
    seen_at: i64,
}

impl From<PumpRow> for PumpRecord {
    fn from(row: PumpRow) -> Self {
        Self {
            address: row.address,
            symbol: row.symbol,
            chain: row.chain,
            price_change_5m: row.price_change_5m,
            price_change_1h: row.price_change_1h,
            volume_surge: row.volume_surge,
            score: row.score.clamp(0, 100) as u8,
            seen_at: row.seen_at,
        }
    }
}

#[derive(FromRow)]
struct PriceAlertRow {
    address: String,
    symbol: String,
    entry_price: f64,
    current_price: f64,
    stop_loss: f64,
    take_profit: f64,
    alert_type: String,
    pnl_percent: f64,
    triggered_at: i64,
}

fn parse_exit_kind(raw: &str) -> Result<ExitKind> {
    match raw {
        "STOP_LOSS" => Ok(ExitKind::StopLoss),
        "TAKE_PROFIT" => Ok(ExitKind::TakeProfit),
        other => anyhow::bail!("unknown alert type in ledger: {}", other),
    }
}

/// SQLite implementation of [`HunterStorage`].
pub struct SqliteLedger {
    pool: Pool<Sqlite>,
}

impl SqliteLedger {
    /// Open (or create) the database file at `db_path`.
    pub async fn new(db_path: &str) -> Result<Self> {
        Self::connect(&format!("sqlite:{}?mode=rwc", db_path), 5).await
    }

    /// Private in-memory database, mainly for tests.
    pub async fn in_memory() -> Result<Self> {
        // Every pooled connection to :memory: is a separate database.
        Self::connect("sqlite::memory:", 1).await
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .with_context(|| format!("Failed to connect to SQLite database {}", url))?;

        Self::create_schema(&pool).await?;
        info!("SqliteLedger initialized and connected to {}", url);

        Ok(Self { pool })
    }

    async fn create_schema(pool: &Pool<Sqlite>) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS new_launches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                address TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                symbol TEXT NOT NULL,
                chain TEXT NOT NULL,
                dex TEXT NOT NULL,
                price_usd REAL NOT NULL,
                liquidity_usd REAL NOT NULL,
                score INTEGER NOT NULL,
                is_pumping BOOLEAN NOT NULL,
                seen_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create new_launches table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pump_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                address TEXT NOT NULL,
                symbol TEXT NOT NULL,
                chain TEXT NOT NULL,
                price_change_5m REAL NOT NULL,
                price_change_1h REAL NOT NULL,
                volume_surge REAL NOT NULL,
                score INTEGER NOT NULL,
                seen_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create pump_events table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS price_alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                address TEXT NOT NULL,
                symbol TEXT NOT NULL,
                entry_price REAL NOT NULL,
                current_price REAL NOT NULL,
                stop_loss REAL NOT NULL,
                take_profit REAL NOT NULL,
                alert_type TEXT NOT NULL,
                pnl_percent REAL NOT NULL,
                triggered_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create price_alerts table")?;

        Ok(())
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl HunterStorage for SqliteLedger {
    async fn record_launch(&self, record: &LaunchRecord) -> Result<bool> {
        debug!("Recording launch {} ({})", record.symbol, record.address);

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO new_launches (
                address, name, symbol, chain, dex, price_usd, liquidity_usd,
                score, is_pumping, seen_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.address)
        .bind(&record.name)
        .bind(&record.symbol)
        .bind(&record.chain)
        .bind(&record.dex)
        .bind(record.price_usd)
        .bind(record.liquidity_usd)
        .bind(record.score as i64)
        .bind(record.is_pumping)
        .bind(record.seen_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert launch")?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_pump(&self, record: &PumpRecord) -> Result<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO pump_events (
                address, symbol, chain, price_change_5m, price_change_1h,
                volume_surge, score, seen_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.address)
        .bind(&record.symbol)
        .bind(&record.chain)
        .bind(record.price_change_5m)
        .bind(record.price_change_1h)
        .bind(record.volume_surge)
        .bind(record.score as i64)
        .bind(record.seen_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert pump event")?
        .last_insert_rowid();

        Ok(id)
    }

    async fn record_price_alert(&self, record: &PriceAlertRecord) -> Result<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO price_alerts (
                address, symbol, entry_price, current_price, stop_loss,
                take_profit, alert_type, pnl_percent, triggered_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.address)
        .bind(&record.symbol)
        .bind(record.entry_price)
        .bind(record.current_price)
        .bind(record.stop_loss)
        .bind(record.take_profit)
        .bind(record.kind.as_str())
        .bind(record.pnl_percent)
        .bind(record.triggered_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert price alert")?
        .last_insert_rowid();

        Ok(id)
    }

    async fn launches_since(&self, since: i64) -> Result<Vec<LaunchRecord>> {
        let rows: Vec<LaunchRow> = sqlx::query_as(
            r#"
            SELECT address, name, symbol, chain, dex, price_usd, liquidity_usd,
                   score, is_pumping, seen_at
            FROM new_launches
            WHERE seen_at >= ?
            ORDER BY seen_at ASC, id ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch launches")?;

        Ok(rows.into_iter().map(LaunchRecord::from).collect())
    }

    async fn pumps_since(&self, since: i64) -> Result<Vec<PumpRecord>> {
        let rows: Vec<PumpRow> = sqlx::query_as(
            r#"
            SELECT address, symbol, chain, price_change_5m, price_change_1h,
                   volume_surge, score, seen_at
            FROM pump_events
            WHERE seen_at >= ?
            ORDER BY seen_at ASC, id ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch pump events")?;

        Ok(rows.into_iter().map(PumpRecord::from).collect())
    }

    async fn price_alerts_since(&self, since: i64) -> Result<Vec<PriceAlertRecord>> {
        let rows: Vec<PriceAlertRow> = sqlx::query_as(
            r#"
            SELECT address, symbol, entry_price, current_price, stop_loss,
                   take_profit, alert_type, pnl_percent, triggered_at
            FROM price_alerts
            WHERE triggered_at >= ?
            ORDER BY triggered_at ASC, id ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch price alerts")?;

        rows.into_iter()
            .map(|row| {
                Ok(PriceAlertRecord {
                    kind: parse_exit_kind(&row.alert_type)?,
                    address: row.address,
                    symbol: row.symbol,
                    entry_price: row.entry_price,
                    current_price: row.current_price,
                    stop_loss: row.stop_loss,
                    take_profit: row.take_profit,
                    pnl_percent: row.pnl_percent,
                    triggered_at: row.triggered_at,
                })
            })
            .collect()
    }

    async fn counts(&self) -> Result<(i64, i64, i64)> {
        let (launches,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM new_launches")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count launches")?;
        let (pumps,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pump_events")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count pump events")?;
        let (alerts,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM price_alerts")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count price alerts")?;

        Ok((launches, pumps, alerts))
    }

    async fn health_check(&self) -> Result<bool> {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }
}
