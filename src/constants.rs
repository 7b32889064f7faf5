/// Decimal precision for valuation calculations
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for display amounts
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Default base URL of the portfolio REST API
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// Default timeout for gateway requests, in seconds
pub const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 30;
