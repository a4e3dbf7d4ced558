use crate::errors::MarketDataError;

/// Outcome of a fail-soft client call.
///
/// A client never propagates an upstream failure. It either has data, or it
/// hands back `Empty` carrying the reason, and the caller substitutes the
/// default value (empty list, empty detail).
#[derive(Debug)]
pub enum Fetched<T> {
    Data(T),
    Empty(MarketDataError),
}

impl<T: Default> Fetched<T> {
    /// The fetched value, or `T::default()` when the call degraded.
    pub fn into_value(self) -> T {
        match self {
            Fetched::Data(value) => value,
            Fetched::Empty(_) => T::default(),
        }
    }

    /// Split into the value (defaulted on failure) and the failure reason.
    pub fn into_parts(self) -> (T, Option<MarketDataError>) {
        match self {
            Fetched::Data(value) => (value, None),
            Fetched::Empty(err) => (T::default(), Some(err)),
        }
    }
}

impl<T> Fetched<T> {
    pub fn is_data(&self) -> bool {
        matches!(self, Fetched::Data(_))
    }

    pub fn failure(&self) -> Option<&MarketDataError> {
        match self {
            Fetched::Data(_) => None,
            Fetched::Empty(err) => Some(err),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Data(value) => Fetched::Data(f(value)),
            Fetched::Empty(err) => Fetched::Empty(err),
        }
    }
}

impl<T> From<Result<T, MarketDataError>> for Fetched<T> {
    fn from(result: Result<T, MarketDataError>) -> Self {
        match result {
            Ok(value) => Fetched::Data(value),
            Err(err) => Fetched::Empty(err),
        }
    }
}
