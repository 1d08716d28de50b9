//! VIF/VIFE Mapping Tables and Lookup Functions
//!
//! This module holds the EN 13757-3 value information tables: primary VIFs,
//! combinable (orthogonal) VIFEs, and the linear extensions selected by VIF
//! 0xFD and 0xFB.
//!
//! Each table is a flat list of rows. A row covers a contiguous key range that
//! shares one quantity and unit, and its magnitude function derives the decimal
//! exponent from the low bits of the actual byte. The rows are expanded once
//! into per-table hash maps keyed by the 7-bit value (extension bit masked).

use crate::constants::MBUS_DIB_VIF_WITHOUT_EXTENSION;
use crate::payload::vif::Quantity as Q;
use crate::payload::vif::{ExtensionTable, Quantity};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// One table row covering keys `first..=last`.
#[derive(Debug)]
pub struct VifRow {
    pub first: u8,
    pub last: u8,
    pub quantity: Quantity,
    pub unit: &'static str,
    pub text: &'static str,
    pub magnitude: fn(u8) -> i32,
}

impl VifRow {
    const fn new(
        first: u8,
        last: u8,
        quantity: Quantity,
        unit: &'static str,
        text: &'static str,
        magnitude: fn(u8) -> i32,
    ) -> Self {
        VifRow {
            first,
            last,
            quantity,
            unit,
            text,
            magnitude,
        }
    }

    const fn single(
        key: u8,
        quantity: Quantity,
        unit: &'static str,
        text: &'static str,
    ) -> Self {
        VifRow::new(key, key, quantity, unit, text, zero)
    }
}

// Magnitude functions. The suffix names the masked bits and the bias.

fn zero(_: u8) -> i32 {
    0
}

fn low3(n: u8) -> i32 {
    (n & 0x07) as i32
}

fn low3_minus3(n: u8) -> i32 {
    (n & 0x07) as i32 - 3
}

fn low3_minus6(n: u8) -> i32 {
    (n & 0x07) as i32 - 6
}

fn low3_minus7(n: u8) -> i32 {
    (n & 0x07) as i32 - 7
}

fn low3_minus9(n: u8) -> i32 {
    (n & 0x07) as i32 - 9
}

fn low2_minus3(n: u8) -> i32 {
    (n & 0x03) as i32 - 3
}

fn low1_minus1(n: u8) -> i32 {
    (n & 0x01) as i32 - 1
}

fn low1_plus2(n: u8) -> i32 {
    (n & 0x01) as i32 + 2
}

fn low4_minus9(n: u8) -> i32 {
    (n & 0x0F) as i32 - 9
}

fn low4_minus12(n: u8) -> i32 {
    (n & 0x0F) as i32 - 12
}

fn minus1(_: u8) -> i32 {
    -1
}

fn minus3(_: u8) -> i32 {
    -3
}

fn plus3(_: u8) -> i32 {
    3
}

/// Primary VIF table (EN 13757-3 table 10).
pub static PRIMARY_VIF_TABLE: &[VifRow] = &[
    VifRow::new(0x00, 0x07, Q::Energy, "Wh", "Energy", low3_minus3),
    VifRow::new(0x08, 0x0F, Q::Energy, "J", "Energy", low3),
    VifRow::new(0x10, 0x17, Q::Volume, "m^3", "Volume", low3_minus6),
    VifRow::new(0x18, 0x1F, Q::Mass, "kg", "Mass", low3_minus3),
    VifRow::single(0x20, Q::OnTime, "s", "On time"),
    VifRow::single(0x21, Q::OnTime, "min", "On time"),
    VifRow::single(0x22, Q::OnTime, "h", "On time"),
    VifRow::single(0x23, Q::OnTime, "d", "On time"),
    VifRow::single(0x24, Q::OperatingTime, "s", "Operating time"),
    VifRow::single(0x25, Q::OperatingTime, "min", "Operating time"),
    VifRow::single(0x26, Q::OperatingTime, "h", "Operating time"),
    VifRow::single(0x27, Q::OperatingTime, "d", "Operating time"),
    VifRow::new(0x28, 0x2F, Q::Power, "W", "Power", low3_minus3),
    VifRow::new(0x30, 0x37, Q::Power, "J/h", "Power", low3),
    VifRow::new(0x38, 0x3F, Q::VolumeFlow, "m^3/h", "Volume flow", low3_minus6),
    VifRow::new(0x40, 0x47, Q::VolumeFlow, "m^3/min", "Volume flow ext.", low3_minus7),
    VifRow::new(0x48, 0x4F, Q::VolumeFlow, "m^3/s", "Volume flow ext.", low3_minus9),
    VifRow::new(0x50, 0x57, Q::MassFlow, "kg/h", "Mass flow", low3_minus3),
    VifRow::new(0x58, 0x5B, Q::FlowTemperature, "°C", "Flow temperature", low2_minus3),
    VifRow::new(0x5C, 0x5F, Q::ReturnTemperature, "°C", "Return temperature", low2_minus3),
    VifRow::new(0x60, 0x63, Q::TemperatureDifference, "K", "Temperature difference", low2_minus3),
    VifRow::new(0x64, 0x67, Q::ExternalTemperature, "°C", "External temperature", low2_minus3),
    VifRow::new(0x68, 0x6B, Q::Pressure, "bar", "Pressure", low2_minus3),
    VifRow::single(0x6C, Q::TimePoint, "", "Time point (date)"),
    VifRow::single(0x6D, Q::TimePoint, "", "Time point (date & time)"),
    VifRow::single(0x6E, Q::HcaUnits, "", "Units for H.C.A."),
    VifRow::single(0x70, Q::AveragingDuration, "s", "Averaging duration"),
    VifRow::single(0x71, Q::AveragingDuration, "min", "Averaging duration"),
    VifRow::single(0x72, Q::AveragingDuration, "h", "Averaging duration"),
    VifRow::single(0x73, Q::AveragingDuration, "d", "Averaging duration"),
    VifRow::single(0x74, Q::ActualityDuration, "s", "Actuality duration"),
    VifRow::single(0x75, Q::ActualityDuration, "min", "Actuality duration"),
    VifRow::single(0x76, Q::ActualityDuration, "h", "Actuality duration"),
    VifRow::single(0x77, Q::ActualityDuration, "d", "Actuality duration"),
    VifRow::single(0x78, Q::FabricationNumber, "", "Fabrication no"),
    VifRow::single(0x79, Q::EnhancedIdentification, "", "(Enhanced) Identification"),
    VifRow::single(0x7A, Q::BusAddress, "", "Bus address"),
    VifRow::single(0x7B, Q::ExtensionFb, "", "Linear VIF-extension FB"),
    VifRow::single(0x7C, Q::PlainText, "", "VIF in following string"),
    VifRow::single(0x7D, Q::ExtensionFd, "", "Linear VIF-extension FD"),
    VifRow::single(0x7E, Q::AnyVif, "", "Any VIF"),
    VifRow::single(0x7F, Q::ManufacturerSpecific, "", "Manufacturer specific"),
];

/// Linear VIF extension selected by 0xFD (EN 13757-3 table 14).
pub static VIFE_FD_TABLE: &[VifRow] = &[
    VifRow::new(0x00, 0x03, Q::Credit, "currency units", "Credit", low2_minus3),
    VifRow::new(0x04, 0x07, Q::Debit, "currency units", "Debit", low2_minus3),
    VifRow::single(0x08, Q::AccessNumber, "", "Access number (transmission count)"),
    VifRow::single(0x09, Q::Medium, "", "Medium (as in fixed header)"),
    VifRow::single(0x0A, Q::Manufacturer, "", "Manufacturer (as in fixed header)"),
    VifRow::single(0x0B, Q::ParameterSetId, "", "Parameter set identification"),
    VifRow::single(0x0C, Q::ModelVersion, "", "Model / Version"),
    VifRow::single(0x0D, Q::HardwareVersion, "", "Hardware version #"),
    VifRow::single(0x0E, Q::FirmwareVersion, "", "Firmware version #"),
    VifRow::single(0x0F, Q::SoftwareVersion, "", "Software version #"),
    VifRow::single(0x10, Q::CustomerLocation, "", "Customer location"),
    VifRow::single(0x11, Q::Customer, "", "Customer"),
    VifRow::single(0x12, Q::AccessCodeUser, "", "Access code user"),
    VifRow::single(0x13, Q::AccessCodeOperator, "", "Access code operator"),
    VifRow::single(0x14, Q::AccessCodeSystemOperator, "", "Access code system operator"),
    VifRow::single(0x15, Q::AccessCodeDeveloper, "", "Access code developer"),
    VifRow::single(0x16, Q::Password, "", "Password"),
    VifRow::single(0x17, Q::ErrorFlags, "", "Error flags (binary)"),
    VifRow::single(0x18, Q::ErrorMask, "", "Error mask"),
    VifRow::single(0x1A, Q::DigitalOutput, "", "Digital output (binary)"),
    VifRow::single(0x1B, Q::DigitalInput, "", "Digital input (binary)"),
    VifRow::single(0x1C, Q::BaudRate, "Bd", "Baud rate"),
    VifRow::single(0x1D, Q::ResponseDelayTime, "bittimes", "Response delay time"),
    VifRow::single(0x1E, Q::Retry, "", "Retry"),
    VifRow::single(0x20, Q::FirstStorageNumber, "", "First storage # for cyclic storage"),
    VifRow::single(0x21, Q::LastStorageNumber, "", "Last storage # for cyclic storage"),
    VifRow::single(0x22, Q::StorageBlockSize, "", "Size of storage block"),
    VifRow::single(0x24, Q::StorageInterval, "s", "Storage interval"),
    VifRow::single(0x25, Q::StorageInterval, "min", "Storage interval"),
    VifRow::single(0x26, Q::StorageInterval, "h", "Storage interval"),
    VifRow::single(0x27, Q::StorageInterval, "d", "Storage interval"),
    VifRow::single(0x28, Q::StorageInterval, "months", "Storage interval"),
    VifRow::single(0x29, Q::StorageInterval, "years", "Storage interval"),
    VifRow::single(0x2C, Q::DurationSinceLastReadout, "s", "Duration since last readout"),
    VifRow::single(0x2D, Q::DurationSinceLastReadout, "min", "Duration since last readout"),
    VifRow::single(0x2E, Q::DurationSinceLastReadout, "h", "Duration since last readout"),
    VifRow::single(0x2F, Q::DurationSinceLastReadout, "d", "Duration since last readout"),
    VifRow::single(0x30, Q::TariffStart, "", "Start (date/time) of tariff"),
    VifRow::single(0x31, Q::TariffDuration, "min", "Duration of tariff"),
    VifRow::single(0x32, Q::TariffDuration, "h", "Duration of tariff"),
    VifRow::single(0x33, Q::TariffDuration, "d", "Duration of tariff"),
    VifRow::single(0x34, Q::TariffPeriod, "s", "Period of tariff"),
    VifRow::single(0x35, Q::TariffPeriod, "min", "Period of tariff"),
    VifRow::single(0x36, Q::TariffPeriod, "h", "Period of tariff"),
    VifRow::single(0x37, Q::TariffPeriod, "d", "Period of tariff"),
    VifRow::single(0x38, Q::TariffPeriod, "months", "Period of tariff"),
    VifRow::single(0x39, Q::TariffPeriod, "years", "Period of tariff"),
    VifRow::single(0x3A, Q::Dimensionless, "", "Dimensionless / no VIF"),
    VifRow::new(0x40, 0x4F, Q::Voltage, "V", "Voltage", low4_minus9),
    VifRow::new(0x50, 0x5F, Q::Current, "A", "Current", low4_minus12),
    VifRow::single(0x60, Q::ResetCounter, "", "Reset counter"),
    VifRow::single(0x61, Q::CumulationCounter, "", "Cumulation counter"),
    VifRow::single(0x62, Q::ControlSignal, "", "Control signal"),
    VifRow::single(0x63, Q::DayOfWeek, "", "Day of week"),
    VifRow::single(0x64, Q::WeekNumber, "", "Week number"),
    VifRow::single(0x65, Q::DayChangeTimePoint, "", "Time point of day change"),
    VifRow::single(0x66, Q::ParameterActivationState, "", "State of parameter activation"),
    VifRow::single(0x67, Q::SpecialSupplierInformation, "", "Special supplier information"),
    VifRow::single(0x68, Q::DurationSinceLastCumulation, "s", "Duration since last cumulation"),
    VifRow::single(0x69, Q::DurationSinceLastCumulation, "min", "Duration since last cumulation"),
    VifRow::single(0x6A, Q::DurationSinceLastCumulation, "h", "Duration since last cumulation"),
    VifRow::single(0x6B, Q::DurationSinceLastCumulation, "d", "Duration since last cumulation"),
    VifRow::single(0x6C, Q::BatteryOperatingTime, "s", "Operating time battery"),
    VifRow::single(0x6D, Q::BatteryOperatingTime, "min", "Operating time battery"),
    VifRow::single(0x6E, Q::BatteryOperatingTime, "h", "Operating time battery"),
    VifRow::single(0x6F, Q::BatteryOperatingTime, "d", "Operating time battery"),
    VifRow::single(0x70, Q::BatteryChangeDate, "", "Date and time of battery change"),
];

/// Linear VIF extension selected by 0xFB (EN 13757-3 table 12).
pub static VIFE_FB_TABLE: &[VifRow] = &[
    VifRow::new(0x00, 0x01, Q::Energy, "MWh", "Energy", low1_minus1),
    VifRow::new(0x08, 0x09, Q::Energy, "GJ", "Energy", low1_minus1),
    VifRow::new(0x10, 0x11, Q::Volume, "m^3", "Volume", low1_plus2),
    VifRow::new(0x18, 0x19, Q::Mass, "t", "Mass", low1_plus2),
    VifRow::new(0x21, 0x21, Q::Volume, "feet^3", "Volume", minus1),
    VifRow::new(0x22, 0x22, Q::Volume, "american gallon", "Volume", minus1),
    VifRow::single(0x23, Q::Volume, "american gallon", "Volume"),
    VifRow::new(0x24, 0x24, Q::VolumeFlow, "american gallon/min", "Volume flow", minus3),
    VifRow::single(0x25, Q::VolumeFlow, "american gallon/min", "Volume flow"),
    VifRow::single(0x26, Q::VolumeFlow, "american gallon/h", "Volume flow"),
    VifRow::new(0x28, 0x29, Q::Power, "MW", "Power", low1_minus1),
    VifRow::new(0x30, 0x31, Q::Power, "GJ/h", "Power", low1_minus1),
    VifRow::new(0x58, 0x5B, Q::FlowTemperature, "°F", "Flow temperature", low2_minus3),
    VifRow::new(0x5C, 0x5F, Q::ReturnTemperature, "°F", "Return temperature", low2_minus3),
    VifRow::new(0x60, 0x63, Q::TemperatureDifference, "°F", "Temperature difference", low2_minus3),
    VifRow::new(0x64, 0x67, Q::ExternalTemperature, "°F", "External temperature", low2_minus3),
    VifRow::new(0x70, 0x73, Q::TemperatureLimit, "°F", "Cold / Warm Temperature Limit", low2_minus3),
    VifRow::new(0x74, 0x77, Q::TemperatureLimit, "°C", "Cold / Warm Temperature Limit", low2_minus3),
    VifRow::new(0x78, 0x7F, Q::CumulativeMaxPower, "W", "Cumulative count max power", low3_minus3),
];

/// Combinable (orthogonal) VIFEs following a primary VIF (EN 13757-3 table 15).
pub static VIFE_COMBINABLE_TABLE: &[VifRow] = &[
    VifRow::single(0x00, Q::RecordError, "", "None"),
    VifRow::single(0x01, Q::RecordError, "", "Too many DIFEs"),
    VifRow::single(0x02, Q::RecordError, "", "Storage number not implemented"),
    VifRow::single(0x03, Q::RecordError, "", "Unit number not implemented"),
    VifRow::single(0x04, Q::RecordError, "", "Tariff number not implemented"),
    VifRow::single(0x05, Q::RecordError, "", "Function not implemented"),
    VifRow::single(0x06, Q::RecordError, "", "Data class not implemented"),
    VifRow::single(0x07, Q::RecordError, "", "Data size not implemented"),
    VifRow::single(0x0B, Q::RecordError, "", "Too many VIFEs"),
    VifRow::single(0x0C, Q::RecordError, "", "Illegal VIF-Group"),
    VifRow::single(0x0D, Q::RecordError, "", "Illegal VIF-Exponent"),
    VifRow::single(0x0E, Q::RecordError, "", "VIF/DIF mismatch"),
    VifRow::single(0x0F, Q::RecordError, "", "Unimplemented action"),
    VifRow::single(0x15, Q::RecordError, "", "No data available (undefined value)"),
    VifRow::single(0x16, Q::RecordError, "", "Data overflow"),
    VifRow::single(0x17, Q::RecordError, "", "Data underflow"),
    VifRow::single(0x18, Q::RecordError, "", "Data error"),
    VifRow::single(0x1C, Q::RecordError, "", "Premature end of record"),
    VifRow::single(0x20, Q::PerTime, "1/s", "per second"),
    VifRow::single(0x21, Q::PerTime, "1/min", "per minute"),
    VifRow::single(0x22, Q::PerTime, "1/h", "per hour"),
    VifRow::single(0x23, Q::PerTime, "1/d", "per day"),
    VifRow::single(0x24, Q::PerTime, "1/week", "per week"),
    VifRow::single(0x25, Q::PerTime, "1/month", "per month"),
    VifRow::single(0x26, Q::PerTime, "1/year", "per year"),
    VifRow::single(0x27, Q::PerUnit, "1/revolution", "per revolution / measurement"),
    VifRow::single(0x28, Q::PerUnit, "1/pulse", "increment per input pulse on input channel #0"),
    VifRow::single(0x29, Q::PerUnit, "1/pulse", "increment per input pulse on input channel #1"),
    VifRow::single(0x2A, Q::PerUnit, "1/pulse", "increment per output pulse on output channel #0"),
    VifRow::single(0x2B, Q::PerUnit, "1/pulse", "increment per output pulse on output channel #1"),
    VifRow::single(0x2C, Q::PerUnit, "1/l", "per liter"),
    VifRow::single(0x2D, Q::PerUnit, "1/m^3", "per m^3"),
    VifRow::single(0x2E, Q::PerUnit, "1/kg", "per kg"),
    VifRow::single(0x2F, Q::PerUnit, "1/K", "per K (Kelvin)"),
    VifRow::single(0x30, Q::PerUnit, "1/kWh", "per kWh"),
    VifRow::single(0x31, Q::PerUnit, "1/GJ", "per GJ"),
    VifRow::single(0x32, Q::PerUnit, "1/kW", "per kW"),
    VifRow::single(0x33, Q::PerUnit, "1/(K*l)", "per (K*l) (Kelvin*liter)"),
    VifRow::single(0x34, Q::PerUnit, "1/V", "per V (Volt)"),
    VifRow::single(0x35, Q::PerUnit, "1/A", "per A (Ampere)"),
    VifRow::single(0x36, Q::MultipliedBy, "s", "multiplied by sek"),
    VifRow::single(0x37, Q::MultipliedBy, "s/V", "multiplied by sek / V"),
    VifRow::single(0x38, Q::MultipliedBy, "s/A", "multiplied by sek / A"),
    VifRow::single(0x39, Q::StartDateOf, "", "start date(/time) of"),
    VifRow::single(0x3A, Q::UncorrectedUnit, "", "VIF contains uncorrected unit instead of corrected unit"),
    VifRow::single(0x3B, Q::AccumulationPositive, "", "Accumulation only if positive contributions"),
    VifRow::single(0x3C, Q::AccumulationNegative, "", "Accumulation of abs value only if negative contributions"),
    VifRow::single(0x40, Q::LimitValue, "", "lower limit value"),
    VifRow::single(0x41, Q::LimitExceedCount, "", "# of exceeds of lower limit"),
    VifRow::single(0x42, Q::LimitExceedTimePoint, "", "Date (/time) of begin of first lower limit exceed"),
    VifRow::single(0x43, Q::LimitExceedTimePoint, "", "Date (/time) of end of first lower limit exceed"),
    VifRow::single(0x46, Q::LimitExceedTimePoint, "", "Date (/time) of begin of last lower limit exceed"),
    VifRow::single(0x47, Q::LimitExceedTimePoint, "", "Date (/time) of end of last lower limit exceed"),
    VifRow::single(0x48, Q::LimitValue, "", "upper limit value"),
    VifRow::single(0x49, Q::LimitExceedCount, "", "# of exceeds of upper limit"),
    VifRow::single(0x4A, Q::LimitExceedTimePoint, "", "Date (/time) of begin of first upper limit exceed"),
    VifRow::single(0x4B, Q::LimitExceedTimePoint, "", "Date (/time) of end of first upper limit exceed"),
    VifRow::single(0x4E, Q::LimitExceedTimePoint, "", "Date (/time) of begin of last upper limit exceed"),
    VifRow::single(0x4F, Q::LimitExceedTimePoint, "", "Date (/time) of end of last upper limit exceed"),
    VifRow::single(0x50, Q::LimitExceedDuration, "s", "Duration of first lower limit exceed"),
    VifRow::single(0x51, Q::LimitExceedDuration, "min", "Duration of first lower limit exceed"),
    VifRow::single(0x52, Q::LimitExceedDuration, "h", "Duration of first lower limit exceed"),
    VifRow::single(0x53, Q::LimitExceedDuration, "d", "Duration of first lower limit exceed"),
    VifRow::single(0x54, Q::LimitExceedDuration, "s", "Duration of last lower limit exceed"),
    VifRow::single(0x55, Q::LimitExceedDuration, "min", "Duration of last lower limit exceed"),
    VifRow::single(0x56, Q::LimitExceedDuration, "h", "Duration of last lower limit exceed"),
    VifRow::single(0x57, Q::LimitExceedDuration, "d", "Duration of last lower limit exceed"),
    VifRow::single(0x58, Q::LimitExceedDuration, "s", "Duration of first upper limit exceed"),
    VifRow::single(0x59, Q::LimitExceedDuration, "min", "Duration of first upper limit exceed"),
    VifRow::single(0x5A, Q::LimitExceedDuration, "h", "Duration of first upper limit exceed"),
    VifRow::single(0x5B, Q::LimitExceedDuration, "d", "Duration of first upper limit exceed"),
    VifRow::single(0x5C, Q::LimitExceedDuration, "s", "Duration of last upper limit exceed"),
    VifRow::single(0x5D, Q::LimitExceedDuration, "min", "Duration of last upper limit exceed"),
    VifRow::single(0x5E, Q::LimitExceedDuration, "h", "Duration of last upper limit exceed"),
    VifRow::single(0x5F, Q::LimitExceedDuration, "d", "Duration of last upper limit exceed"),
    VifRow::new(0x70, 0x77, Q::MultiplicativeCorrection, "", "Multiplicative correction factor", low3_minus6),
    VifRow::new(0x78, 0x7B, Q::AdditiveCorrection, "", "Additive correction constant", low2_minus3),
    VifRow::new(0x7D, 0x7D, Q::MultiplicativeCorrection, "", "Multiplicative correction factor", plus3),
    VifRow::single(0x7E, Q::FutureValue, "", "Future value"),
    VifRow::single(0x7F, Q::ManufacturerSpecific, "", "Next VIFEs and data are manufacturer specific"),
];

type VifIndex = HashMap<u8, &'static VifRow>;

fn build_index(rows: &'static [VifRow]) -> VifIndex {
    let mut index = HashMap::with_capacity(128);
    for row in rows {
        for key in row.first..=row.last {
            index.insert(key, row);
        }
    }
    index
}

static PRIMARY_INDEX: Lazy<VifIndex> = Lazy::new(|| build_index(PRIMARY_VIF_TABLE));
static FD_INDEX: Lazy<VifIndex> = Lazy::new(|| build_index(VIFE_FD_TABLE));
static FB_INDEX: Lazy<VifIndex> = Lazy::new(|| build_index(VIFE_FB_TABLE));
static COMBINABLE_INDEX: Lazy<VifIndex> = Lazy::new(|| build_index(VIFE_COMBINABLE_TABLE));

/// Looks up the primary VIF row for `vif`.
pub fn lookup_primary(vif: u8) -> Option<&'static VifRow> {
    PRIMARY_INDEX
        .get(&(vif & MBUS_DIB_VIF_WITHOUT_EXTENSION))
        .copied()
}

/// Looks up the row for `vife` in an extension table. The manufacturer
/// selector has no table and always misses.
pub fn lookup_extension(table: ExtensionTable, vife: u8) -> Option<&'static VifRow> {
    let index: &VifIndex = match table {
        ExtensionTable::Combinable => &COMBINABLE_INDEX,
        ExtensionTable::Fd => &FD_INDEX,
        ExtensionTable::Fb => &FB_INDEX,
        ExtensionTable::Manufacturer => return None,
    };
    index.get(&(vife & MBUS_DIB_VIF_WITHOUT_EXTENSION)).copied()
}
