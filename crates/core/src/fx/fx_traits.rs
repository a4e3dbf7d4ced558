use super::fx_errors::FxError;
use super::fx_model::RateSnapshot;

/// Trait defining the contract for rate snapshot persistence.
///
/// `load` returns `Ok(None)` when nothing has been persisted yet.
pub trait RateSnapshotStore: Send + Sync {
    fn load(&self) -> Result<Option<RateSnapshot>, FxError>;
    fn save(&self, snapshot: &RateSnapshot) -> Result<(), FxError>;
}
