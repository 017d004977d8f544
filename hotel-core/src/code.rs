use chrono::Utc;
use rand::Rng;

pub const ORDER_PREFIX: &str = "ORD";
pub const ROOM_BOOKING_PREFIX: &str = "RM";
pub const EVENT_BOOKING_PREFIX: &str = "EVR";
pub const EVENT_PREFIX: &str = "EV";

/// Human-facing reference such as `ORD-482911234`: a random five digit block
/// followed by the last four digits of the current epoch milliseconds.
///
/// Uniqueness is enforced by the storage layer, not here.
pub fn generate_code(prefix: &str) -> String {
    let random: u32 = rand::rng().random_range(10000..=99999);
    let stamp = Utc::now().timestamp_millis().rem_euclid(10000);
    format!("{prefix}-{random}{stamp:04}")
}
