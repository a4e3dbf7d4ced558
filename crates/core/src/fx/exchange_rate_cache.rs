use std::sync::{Arc, RwLock};

use chrono::{Duration, Utc};
use crossprice_market_data::RateSource;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::constants::{BASE_CURRENCY, DEFAULT_RATE_TTL_HOURS};

use super::convert::{apply_rate, validate_amount};
use super::fx_errors::FxError;
use super::fx_model::{CacheState, ConversionResult, RateSnapshot};
use super::fx_traits::RateSnapshotStore;

/// Exchange-rate cache keyed to CNY.
///
/// Holds at most one snapshot, swapped atomically behind an `Arc` on each
/// successful refresh. A failed refresh leaves the previous snapshot in
/// place and it keeps being served. Concurrent refreshes are collapsed into
/// one upstream call.
pub struct ExchangeRateCache {
    source: Option<Arc<dyn RateSource>>,
    store: Arc<dyn RateSnapshotStore>,
    snapshot: RwLock<Option<Arc<RateSnapshot>>>,
    refresh_lock: Mutex<()>,
    ttl: Duration,
}

impl ExchangeRateCache {
    /// Create the cache and load any persisted snapshot.
    ///
    /// An unreadable or empty persisted snapshot leaves the cache cold.
    pub fn new(source: Option<Arc<dyn RateSource>>, store: Arc<dyn RateSnapshotStore>) -> Self {
        let initial = match store.load() {
            Ok(Some(snapshot)) => {
                let snapshot = snapshot.sanitized();
                if snapshot.is_empty() {
                    log::warn!("Persisted rate snapshot has no usable rates, starting cold");
                    None
                } else {
                    log::info!(
                        "Loaded {} exchange rates from {}",
                        snapshot.rates.len(),
                        snapshot.last_update
                    );
                    Some(Arc::new(snapshot))
                }
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("Failed to load rate snapshot, starting cold: {}", e);
                None
            }
        };

        Self {
            source,
            store,
            snapshot: RwLock::new(initial),
            refresh_lock: Mutex::new(()),
            ttl: Duration::hours(DEFAULT_RATE_TTL_HOURS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn current(&self) -> Option<Arc<RateSnapshot>> {
        match self.snapshot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn state_of(&self, snapshot: Option<&RateSnapshot>) -> CacheState {
        match snapshot {
            None => CacheState::Cold,
            Some(s) if s.is_stale(Utc::now(), self.ttl) => CacheState::Stale,
            Some(_) => CacheState::Fresh,
        }
    }

    pub fn state(&self) -> CacheState {
        self.state_of(self.current().as_deref())
    }

    /// Read-only copy of the current snapshot.
    pub fn snapshot(&self) -> Option<RateSnapshot> {
        self.current().map(|s| s.as_ref().clone())
    }

    /// Refresh when cold or stale. Failures are logged, never returned.
    pub async fn ensure_fresh(&self) {
        if self.state() == CacheState::Fresh {
            return;
        }
        if let Err(e) = self.refresh(false).await {
            log::warn!("Exchange rate refresh failed, serving previous rates: {}", e);
        }
    }

    /// Refresh regardless of age.
    pub async fn force_refresh(&self) -> Result<(), FxError> {
        self.refresh(true).await
    }

    async fn refresh(&self, force: bool) -> Result<(), FxError> {
        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited
        if !force && self.state() == CacheState::Fresh {
            return Ok(());
        }

        let source = self.source.as_ref().ok_or(FxError::NoRateSource)?;
        let rates = source.fetch_rates(BASE_CURRENCY).await?;

        let snapshot = RateSnapshot::new(rates, Utc::now());
        if snapshot.is_empty() {
            return Err(FxError::EmptyRateTable);
        }

        if let Err(e) = self.store.save(&snapshot) {
            log::warn!("Failed to persist rate snapshot: {}", e);
        }

        log::info!(
            "Refreshed {} exchange rates from {}",
            snapshot.rates.len(),
            source.id()
        );

        let mut slot = self
            .snapshot
            .write()
            .map_err(|e| FxError::CacheError(e.to_string()))?;
        *slot = Some(Arc::new(snapshot));
        Ok(())
    }

    /// Rate to multiply an amount in `from` by to express it in `to`.
    ///
    /// Same currency is 1.0 without touching the cache. Otherwise a cold or
    /// stale cache is refreshed first, then the rate is read as in
    /// [`cached_rate`](Self::cached_rate).
    pub async fn get_rate(&self, from: &str, to: &str) -> f64 {
        if normalize_code(from) == normalize_code(to) {
            return 1.0;
        }
        self.ensure_fresh().await;
        self.cached_rate(from, to)
    }

    /// Rate from whatever snapshot is held now, never refreshing:
    /// - into CNY: `1 / rate(from)`
    /// - anything else: `rate(to) / rate(from)`
    ///
    /// Codes missing from the snapshot count as 1.0.
    pub fn cached_rate(&self, from: &str, to: &str) -> f64 {
        let from = normalize_code(from);
        let to = normalize_code(to);
        if from == to {
            return 1.0;
        }

        let snapshot = self.current();
        let lookup = |code: &str| {
            snapshot
                .as_ref()
                .and_then(|s| s.rate(code))
                .unwrap_or_else(|| {
                    log::debug!("No rate for {}, assuming 1.0", code);
                    1.0
                })
        };

        if to == BASE_CURRENCY {
            1.0 / lookup(&from)
        } else {
            lookup(&to) / lookup(&from)
        }
    }

    /// Convert `amount` from one currency to another.
    pub async fn convert(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
    ) -> Result<ConversionResult, FxError> {
        validate_amount(amount)?;
        let rate = self.get_rate(from, to).await;
        conversion(amount, from, to, rate)
    }

    /// Convert with the snapshot held now. Batch callers run
    /// [`ensure_fresh`](Self::ensure_fresh) once up front and then use this.
    pub fn convert_cached(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
    ) -> Result<ConversionResult, FxError> {
        validate_amount(amount)?;
        conversion(amount, from, to, self.cached_rate(from, to))
    }
}

fn conversion(amount: Decimal, from: &str, to: &str, rate: f64) -> Result<ConversionResult, FxError> {
    Ok(ConversionResult {
        original_amount: amount,
        original_currency: normalize_code(from),
        converted_amount: apply_rate(amount, rate)?,
        converted_currency: normalize_code(to),
        rate,
        timestamp: Utc::now(),
    })
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
