//! Value information resolution against the EN 13757-3 tables.

use mbus_telegram::payload::vif::{
    normalize_record, resolve_extension, resolve_primary, ExtensionTable, Quantity,
    VIF_CODE_OFFSET_COMBINABLE, VIF_CODE_OFFSET_FD,
};
use mbus_telegram::payload::parse_records;
use proptest::prelude::*;

#[test]
fn test_volume_litres() {
    let unit = resolve_primary(0x13);
    assert_eq!(unit.quantity, Quantity::Volume);
    assert_eq!(unit.unit, "m^3");
    assert_eq!(unit.magnitude, -3);
    assert_eq!(unit.code, 0x13);
}

#[test]
fn test_magnitude_computed_per_byte() {
    let exponents: Vec<i32> = (0x00..=0x07).map(|b| resolve_primary(b).magnitude).collect();
    assert_eq!(exponents, vec![-3, -2, -1, 0, 1, 2, 3, 4]);
    assert_eq!(resolve_primary(0x5A).magnitude, -1);
    assert_eq!(resolve_primary(0x48).magnitude, -9);
}

#[test]
fn test_extension_bit_ignored() {
    assert_eq!(resolve_primary(0x86).quantity, resolve_primary(0x06).quantity);
    assert_eq!(resolve_primary(0x86).magnitude, 3);
}

#[test]
fn test_undefined_primary() {
    let unit = resolve_primary(0x6F);
    assert_eq!(unit.quantity, Quantity::Undefined);
    assert_eq!(unit.unit, "6F");
    assert_eq!(unit.text, "Undefined");
}

#[test]
fn test_fd_extension() {
    let unit = resolve_extension(0x17, ExtensionTable::Fd);
    assert_eq!(unit.quantity, Quantity::ErrorFlags);
    assert_eq!(unit.code, VIF_CODE_OFFSET_FD + 0x17);

    let voltage = resolve_extension(0x49, ExtensionTable::Fd);
    assert_eq!(voltage.quantity, Quantity::Voltage);
    assert_eq!(voltage.unit, "V");
}

#[test]
fn test_combinable_extension() {
    let unit = resolve_extension(0x3B, ExtensionTable::Combinable);
    assert_eq!(unit.quantity, Quantity::AccumulationPositive);
    assert_eq!(unit.code, VIF_CODE_OFFSET_COMBINABLE + 0x3B);
}

#[test]
fn test_manufacturer_extension_is_opaque() {
    let unit = resolve_extension(0x17, ExtensionTable::Manufacturer);
    assert_eq!(unit.quantity, Quantity::ManufacturerSpecific);
    assert_eq!(unit.magnitude, 0);
}

#[test]
fn test_normalized_value() {
    // 12565 l, VIF 0x13 (10^-3 m^3)
    let stream = parse_records(&[0x03, 0x13, 0x15, 0x31, 0x00]).unwrap();
    let value = normalize_record(&stream.records[0]).unwrap();
    assert_eq!(value.quantity, Quantity::Volume);
    assert_eq!(value.unit, "m^3");
    assert!((value.value - 12.565).abs() < 1e-9);
}

#[test]
fn test_normalize_skips_non_numeric() {
    let stream = parse_records(&[0x0D, 0xFD, 0x0E, 0x02, 0x31, 0x2E]).unwrap();
    assert!(normalize_record(&stream.records[0]).is_none());
}

#[test]
fn test_additive_correction_is_an_offset() {
    // 5 x 10^-3 m^3, VIFE 0x79 adds 10^-2
    let stream = parse_records(&[0x01, 0x93, 0x79, 0x05]).unwrap();
    let record = &stream.records[0];
    assert_eq!(record.units[1].quantity, Quantity::AdditiveCorrection);
    assert_eq!(record.units[1].magnitude, -2);

    let value = normalize_record(record).unwrap();
    assert_eq!(value.quantity, Quantity::Volume);
    assert_eq!(value.unit, "m^3");
    // an exponent of -5 would give 0.00005 + 0.01
    assert!((value.value - 0.015).abs() < 1e-12);
}

#[test]
fn test_multiplicative_and_additive_corrections() {
    // 5 x 10^-3 m^3, VIFE 0x7D scales by 10^3, VIFE 0x79 adds 10^-2
    let stream = parse_records(&[0x01, 0x93, 0xFD, 0x79, 0x05]).unwrap();
    let record = &stream.records[0];
    assert_eq!(record.units.len(), 3);
    assert_eq!(record.units[1].quantity, Quantity::MultiplicativeCorrection);
    let value = normalize_record(record).unwrap();
    assert!((value.value - 5.01).abs() < 1e-12);

    // 8 x 10^-3 m^3, VIFE 0x75 scales by 10^-1, VIFE 0x7A adds 10^-1
    let stream = parse_records(&[0x01, 0x93, 0xF5, 0x7A, 0x08]).unwrap();
    let value = normalize_record(&stream.records[0]).unwrap();
    assert!((value.value - 0.1008).abs() < 1e-12);
}

proptest! {
    #[test]
    fn prop_primary_resolution_is_pure(vif in any::<u8>()) {
        prop_assert_eq!(resolve_primary(vif), resolve_primary(vif));
    }

    #[test]
    fn prop_extension_resolution_is_pure(vife in any::<u8>(), fd in any::<bool>()) {
        let table = if fd { ExtensionTable::Fd } else { ExtensionTable::Fb };
        prop_assert_eq!(resolve_extension(vife, table), resolve_extension(vife, table));
        prop_assert_eq!(resolve_extension(vife, table), resolve_extension(vife | 0x80, table));
    }
}
