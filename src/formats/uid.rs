use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generates a UID under the `2.25` root (UUID-derived, ISO/IEC 9834-8).
/// Uniqueness within a process comes from the counter in the low 20 bits.
pub fn generate_uid() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let count = u128::from(COUNTER.fetch_add(1, Ordering::Relaxed) & 0xF_FFFF);
    let process = u128::from(std::process::id()) << 96;
    let value = (process ^ ((nanos & ((1 << 76) - 1)) << 20)) | count;
    format!("2.25.{value}")
}
