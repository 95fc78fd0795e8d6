/**
 * GPIO number used in the device's HTTP endpoints for the heating pad (`/26/on`).
 */
pub const HEATING_PAD_PIN: u8 = 26;

/**
 * GPIO number used in the device's HTTP endpoints for the temperature sensor (`/27/on`).
 */
pub const TEMPERATURE_SENSOR_PIN: u8 = 27;

/**
 * Device endpoint that reports the state of every peripheral.
 */
pub const STATUS_ENDPOINT: &str = "status";

/**
 * The value the device returns in `status` for an accepted command.
 */
pub const STATUS_SUCCESS: &str = "success";

/**
 * Integer stored in the remote store for "on". Every other present value means "off".
 */
pub const STORE_VALUE_ON: i64 = 1;
pub const STORE_VALUE_OFF: i64 = 0;

/**
 * How long (milliseconds) to wait before re-subscribing to the remote store after the event
 * stream ended.
 */
pub const RESUBSCRIBE_DELAY: u64 = 1000;
