/// Application name
pub const APP_NAME: &str = "tglog";

/// Maximum number of items the remote service returns per page
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Delay between two consecutive page requests, in milliseconds
pub const RATE_LIMIT_BACKOFF_MS: u64 = 500;

/// Remote error code signalling that the stored authorization key expired
pub const AUTH_EXPIRED_CODE: i32 = 401;

/// Remote error code for a rejected login code
pub const INVALID_LOGIN_CODE: i32 = 400;

/// Port used when a data center is configured without one
pub const DEFAULT_DATACENTER_PORT: u16 = 443;

/// Language code sent when requesting a login code
pub const DEFAULT_LANGUAGE_CODE: &str = "en";

/// `chrono` format of a day key (`YYYY-MM-DD`)
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// `chrono` format of the time prefix on each log line
pub const LINE_TIME_FORMAT: &str = "%H:%M:%S";

/// Extension of the per-day log files
pub const LOG_FILE_EXTENSION: &str = "txt";
