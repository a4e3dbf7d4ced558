use serde::Serialize;

/// Classification of an upstream failure.
///
/// Every class is absorbed at the client boundary and turned into an empty
/// contribution. The class only changes how the failure is reported.
///
/// | Class | Typical cause |
/// |-------|---------------|
/// | `Transport` | connection refused, timeout, non-2xx |
/// | `Logical` | HTTP 200 carrying an error payload, unknown id |
/// | `Malformed` | body does not decode into the expected shape |
/// | `Unsupported` | client does not offer the operation |
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    Logical,
    Malformed,
    Unsupported,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::Logical => "logical",
            FailureKind::Malformed => "malformed",
            FailureKind::Unsupported => "unsupported",
        }
    }
}
