use uuid::Uuid;

/**
 * How often (milliseconds) to poll the adapters for newly discovered peripherals while scanning.
 */
pub const POLL_DELAY: u64 = 100;

/**
 * How long (milliseconds) to scan for the laser before giving up.
 */
pub const SCAN_TIMEOUT: u64 = 10_000;

/**
 * How long (milliseconds) connecting and discovering services may take.
 */
pub const CONNECT_TIMEOUT: u64 = 10_000;

/**
 * How long (milliseconds) a write to a characteristic may take.
 */
pub const WRITE_DEADLINE: u64 = 2000;

/**
 * How long (milliseconds) the laser stays on before measuring, so the operator can aim.
 */
pub const AIM_DELAY: u64 = 1500;

/**
 * The UUID of the Bluetooth BLE service advertised by the DISTO.
 */
pub const DISTO_SERVICE: Uuid = Uuid::from_u128(0x3ab10100_f831_4395_b29d_570977d5bf94);

/**
 * The UUID of the characteristic that notifies distances (f32, little endian, meters).
 */
pub const DISTO_DISTANCE_CHARACTERISTIC: Uuid = Uuid::from_u128(0x3ab10101_f831_4395_b29d_570977d5bf94);

/**
 * The UUID of the characteristic that accepts single byte commands.
 */
pub const DISTO_COMMAND_CHARACTERISTIC: Uuid = Uuid::from_u128(0x3ab10109_f831_4395_b29d_570977d5bf94);

pub const COMMAND_LASER_ON: [u8; 1] = [0x6F]; // o
pub const COMMAND_MEASURE: [u8; 1] = [0x67]; // g
pub const COMMAND_LASER_OFF: [u8; 1] = [0x70]; // p

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuids_match_advertised_strings() {
        assert_eq!(DISTO_SERVICE.to_string(), "3ab10100-f831-4395-b29d-570977d5bf94");
        assert_eq!(DISTO_DISTANCE_CHARACTERISTIC.to_string(), "3ab10101-f831-4395-b29d-570977d5bf94");
        assert_eq!(DISTO_COMMAND_CHARACTERISTIC.to_string(), "3ab10109-f831-4395-b29d-570977d5bf94");
    }

    #[test]
    fn uuid_parsing_ignores_case() {
        let upper = Uuid::parse_str("3AB10109-F831-4395-B29D-570977d5BF94").unwrap();
        assert_eq!(upper, DISTO_COMMAND_CHARACTERISTIC);
    }
}
