//! Unit tests pinning the packed settings layout.
use super::*;

#[test]
/// The blob is exactly 21 bytes: 1 + 3 * 6 + 2.
fn test_record_size() {
    assert_eq!(SETTINGS_RECORD_SIZE, 21);
}

#[test]
/// Field order and endianness of a fully populated record.
fn test_layout_is_byte_stable() {
    let mut record = SettingsRecord::new();
    record.num_busses = 2;
    record.bus_config[0] = BusConfig {
        enabled: true,
        listen_only: false,
        bitrate: 500_000,
    };
    record.bus_config[1] = BusConfig {
        enabled: false,
        listen_only: true,
        bitrate: 125_000,
    };
    record.bridged = [0, 1];

    let bytes = record.to_bytes();
    assert_eq!(
        bytes,
        [
            2, // num_busses
            1, 0, 0x20, 0xA1, 0x07, 0x00, // bus 0: enabled, 500 kbit/s
            0, 1, 0x48, 0xE8, 0x01, 0x00, // bus 1: listen-only, 125 kbit/s
            0, 0, 0, 0, 0, 0, // bus 2: zeroed
            0, 1, // bridged
        ]
    );
    assert_eq!(SettingsRecord::from_bytes(&bytes), record);
}

#[test]
/// A zeroed blob decodes to the default record.
fn test_zero_blob_is_default() {
    let record = SettingsRecord::from_bytes(&[0; SETTINGS_RECORD_SIZE]);
    assert_eq!(record, SettingsRecord::default());
    assert_eq!(record, SettingsRecord::new());
    assert_eq!(record.bridge(), (0, 0));
}

#[test]
/// Flag bytes other than 0/1 written by foreign tools still read as `true`.
fn test_non_canonical_flags() {
    let mut bytes = [0u8; SETTINGS_RECORD_SIZE];
    bytes[1] = 0xFF;
    bytes[2] = 0x02;
    let record = SettingsRecord::from_bytes(&bytes);
    assert!(record.bus_config[0].enabled);
    assert!(record.bus_config[0].listen_only);
}
