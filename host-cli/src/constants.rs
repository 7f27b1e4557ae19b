/// Milliseconds a single HID report read may block before it counts as a timeout.
pub const READ_TIMEOUT_MS: i32 = 500;
/// Entropy requested when `--size` is omitted.
pub const DEFAULT_ENTROPY_SIZE: u32 = 32;
pub const DEFAULT_COIN: &str = "Bitcoin";
pub const DEFAULT_DEVICE: &str = "trezor";
