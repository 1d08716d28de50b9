//! Value window decoding: integers, BCD, variable length fields and dates.

use chrono::NaiveDate;
use mbus_telegram::payload::data_encoding::{
    decode_identification, encode_bcd, lvar_length, parse_variable_length,
};
use mbus_telegram::payload::{
    decode_date, decode_manufacturer, encode_manufacturer, parse_value, DataType, RecordValue,
};
use proptest::prelude::*;

#[test]
fn test_data_type_from_dif() {
    assert_eq!(DataType::from_dif(0x04), DataType::Int32);
    assert_eq!(DataType::from_dif(0x84), DataType::Int32);
    assert_eq!(DataType::from_dif(0x0D), DataType::VariableLength);
    assert_eq!(DataType::from_dif(0x0E).byte_len(), Some(6));
    assert_eq!(DataType::from_dif(0x0D).byte_len(), None);
    assert_eq!(DataType::from_dif(0x08).byte_len(), Some(0));
    assert!(DataType::Bcd8.is_bcd());
    assert!(!DataType::Int32.is_bcd());
}

#[test]
fn test_bcd_with_hex_digits_falls_back_to_text() {
    assert_eq!(
        parse_value(DataType::Bcd8, &[0xAB, 0x00, 0x00, 0x00]),
        RecordValue::Text("000000AB".to_string())
    );
    assert_eq!(
        parse_value(DataType::Bcd2, &[0xF1]),
        RecordValue::Text("F1".to_string())
    );
}

#[test]
fn test_no_data_encodings() {
    assert_eq!(parse_value(DataType::NoData, &[]), RecordValue::None);
    assert_eq!(parse_value(DataType::SelectionForReadout, &[0x01]), RecordValue::None);
    assert!(parse_value(DataType::Reserved, &[]).is_none());
}

#[test]
fn test_lvar_lengths() {
    assert_eq!(lvar_length(0x00), Some(0));
    assert_eq!(lvar_length(0x10), Some(16));
    assert_eq!(lvar_length(0xC5), Some(5));
    assert_eq!(lvar_length(0xE8), Some(8));
    assert_eq!(lvar_length(0xF0), Some(16));
    assert_eq!(lvar_length(0xF4), Some(32));
    assert_eq!(lvar_length(0xF5), Some(48));
    assert_eq!(lvar_length(0xF6), Some(64));
    assert_eq!(lvar_length(0xF7), None);
    assert_eq!(lvar_length(0xFA), None);
    assert_eq!(lvar_length(0xFB), None);
    assert_eq!(lvar_length(0xFF), None);
}

#[test]
fn test_variable_length_values() {
    assert_eq!(
        parse_variable_length(0x02, b"AB"),
        RecordValue::Text("AB".to_string())
    );
    assert_eq!(
        parse_variable_length(0xC2, &[0x34, 0x12]),
        RecordValue::I64(1234)
    );
    assert_eq!(
        parse_variable_length(0xD2, &[0x34, 0x12]),
        RecordValue::I64(-1234)
    );
    assert_eq!(
        parse_variable_length(0xE2, &[0x01, 0x02]),
        RecordValue::I64(0x0201)
    );
    assert_eq!(
        parse_variable_length(0xF0, &[0xAB; 16]),
        RecordValue::Text("AB".repeat(16))
    );
    assert_eq!(parse_variable_length(0xFB, &[]), RecordValue::None);
}

#[test]
fn test_date_type_g() {
    assert_eq!(
        decode_date(&[0xBF, 0x1C]),
        RecordValue::Date(NaiveDate::from_ymd_opt(2013, 12, 31).unwrap())
    );
    // two-digit year 99 belongs to the previous century
    assert_eq!(
        decode_date(&[0x61, 0xC1]),
        RecordValue::Date(NaiveDate::from_ymd_opt(1999, 1, 1).unwrap())
    );
}

#[test]
fn test_date_time_type_f() {
    match decode_date(&[0x19, 0x0F, 0x8A, 0x17]) {
        RecordValue::DateTime(dt) => {
            assert_eq!(
                dt.datetime,
                NaiveDate::from_ymd_opt(2012, 7, 10)
                    .unwrap()
                    .and_hms_opt(15, 25, 0)
                    .unwrap()
            );
            assert!(!dt.invalid);
            assert!(!dt.summer_time);
        }
        other => panic!("unexpected {other:?}"),
    }

    match decode_date(&[0x99, 0x8F, 0x8A, 0x17]) {
        RecordValue::DateTime(dt) => {
            assert!(dt.invalid);
            assert!(dt.summer_time);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_date_time_type_i() {
    match decode_date(&[0x1E, 0x19, 0x0F, 0x8A, 0x17, 0x00]) {
        RecordValue::DateTime(dt) => assert_eq!(
            dt.datetime,
            NaiveDate::from_ymd_opt(2012, 7, 10)
                .unwrap()
                .and_hms_opt(15, 25, 30)
                .unwrap()
        ),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_impossible_dates() {
    assert_eq!(decode_date(&[0x00, 0x00]), RecordValue::NoDate);
    // hour 25
    assert_eq!(decode_date(&[0x00, 0x19, 0x8A, 0x17]), RecordValue::NoDate);
    assert_eq!(decode_date(&[0x00, 0x00, 0x00]), RecordValue::None);
}

#[test]
fn test_manufacturer_codes() {
    assert_eq!(encode_manufacturer("PAD").unwrap(), 0x4024);
    assert_eq!(encode_manufacturer("pad").unwrap(), 0x4024);
    assert_eq!(decode_manufacturer(0x4024), "PAD");
    assert_eq!(decode_manufacturer(0x1593), "ELS");
    assert!(encode_manufacturer("PA").is_err());
    assert!(encode_manufacturer("P1D").is_err());
}

#[test]
fn test_identification() {
    assert_eq!(decode_identification([0x78, 0x56, 0x34, 0x12]), 12345678);
    // non-decimal nibble: read as binary
    assert_eq!(decode_identification([0x0A, 0x00, 0x00, 0x00]), 10);
    assert_eq!(encode_bcd(12345678).unwrap(), [0x78, 0x56, 0x34, 0x12]);
    assert!(encode_bcd(100_000_000).is_err());
}

proptest! {
    #[test]
    fn prop_value_parser_never_panics(dif in any::<u8>(), data in prop::collection::vec(any::<u8>(), 0..10)) {
        let _ = parse_value(DataType::from_dif(dif), &data);
    }

    #[test]
    fn prop_int24_is_never_negative(data in prop::array::uniform3(any::<u8>())) {
        match parse_value(DataType::Int24, &data) {
            RecordValue::I32(v) => prop_assert!((0..=0x00FF_FFFF).contains(&v)),
            other => prop_assert!(false, "unexpected {:?}", other),
        }
    }

    #[test]
    fn prop_identification_survives_bcd(value in 0u32..100_000_000) {
        prop_assert_eq!(decode_identification(encode_bcd(value).unwrap()), value);
    }
}
