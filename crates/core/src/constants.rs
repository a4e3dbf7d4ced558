/// Currency every rate snapshot is keyed to
pub const BASE_CURRENCY: &str = "CNY";

/// Hours a rate snapshot stays fresh
pub const DEFAULT_RATE_TTL_HOURS: i64 = 24;

/// Decimal places of converted prices
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Days of history requested for a price analysis
pub const PRICE_HISTORY_DAYS: u32 = 30;

/// Category used when asking for platform-wide market insights
pub const DEFAULT_INSIGHT_CATEGORY: &str = "all";
