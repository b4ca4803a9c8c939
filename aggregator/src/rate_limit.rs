use hyper::header::HeaderMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Key shared by every request that carries no forwarded address.
pub const UNKNOWN_CLIENT: &str = "unknown";

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Per-client cooldown: one accepted request per window per key.
///
/// Entries are never evicted. The map is held in memory only.
pub struct RateLimiter {
    window_ms: u64,
    last_seen: Mutex<HashMap<String, u64>>,
}

impl RateLimiter {
    /// Cooldowns beyond `u64::MAX` milliseconds saturate.
    pub fn new(cooldown: Duration) -> Self {
        RateLimiter {
            window_ms: u64::try_from(cooldown.as_millis()).unwrap_or(u64::MAX),
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    /// Accepts and records the request, or returns the whole seconds
    /// (rounded up) the client still has to wait.
    ///
    /// Check and record happen under one lock.
    pub fn check_and_record(&self, key: &str, now_ms: u64) -> Result<(), u64> {
        let window_ms = self.window_ms;
        let mut last_seen = self.last_seen.lock();

        if let Some(&previous) = last_seen.get(key) {
            let elapsed = now_ms.saturating_sub(previous);
            if elapsed < window_ms {
                return Err((window_ms - elapsed).div_ceil(1000));
            }
        }

        last_seen.insert(key.to_string(), now_ms);
        Ok(())
    }

    pub fn tracked_clients(&self) -> usize {
        self.last_seen.lock().len()
    }
}

/// First non-empty `X-Forwarded-For` entry, or [`UNKNOWN_CLIENT`].
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.split(',')
                .map(str::trim)
                .find(|candidate| !candidate.is_empty())
        })
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
