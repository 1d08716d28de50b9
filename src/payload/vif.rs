//! # Value Information Block
//!
//! Types describing what a VIF/VIFE byte means, the resolution entry points on
//! top of the tables in [`crate::payload::vif_maps`], and the helper that
//! folds a record's unit list into one scaled reading.

use crate::constants::{
    MBUS_DIB_VIF_WITHOUT_EXTENSION, MBUS_VIF_ANY, MBUS_VIF_EXTENSION_FB, MBUS_VIF_EXTENSION_FD,
    MBUS_VIF_MANUFACTURER_SPECIFIC, MBUS_VIF_PLAIN_TEXT,
};
use crate::payload::data_encoding::RecordValue;
use crate::payload::record::DataRecord;
use crate::payload::vif_maps::{lookup_extension, lookup_primary, VifRow};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// Code offsets keeping the four tables apart in [`UnitInfo::code`].
pub const VIF_CODE_OFFSET_FD: u16 = 0x100;
pub const VIF_CODE_OFFSET_FB: u16 = 0x200;
pub const VIF_CODE_OFFSET_COMBINABLE: u16 = 0x300;
pub const VIF_CODE_OFFSET_MANUFACTURER: u16 = 0x400;

/// Physical quantity or administrative field a value descriptor names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Quantity {
    Energy,
    Volume,
    Mass,
    OnTime,
    OperatingTime,
    Power,
    VolumeFlow,
    MassFlow,
    FlowTemperature,
    ReturnTemperature,
    TemperatureDifference,
    ExternalTemperature,
    Pressure,
    TimePoint,
    HcaUnits,
    AveragingDuration,
    ActualityDuration,
    FabricationNumber,
    EnhancedIdentification,
    BusAddress,
    ExtensionFb,
    PlainText,
    ExtensionFd,
    AnyVif,
    ManufacturerSpecific,
    Credit,
    Debit,
    AccessNumber,
    Medium,
    Manufacturer,
    ParameterSetId,
    ModelVersion,
    HardwareVersion,
    FirmwareVersion,
    SoftwareVersion,
    CustomerLocation,
    Customer,
    AccessCodeUser,
    AccessCodeOperator,
    AccessCodeSystemOperator,
    AccessCodeDeveloper,
    Password,
    ErrorFlags,
    ErrorMask,
    DigitalOutput,
    DigitalInput,
    BaudRate,
    ResponseDelayTime,
    Retry,
    FirstStorageNumber,
    LastStorageNumber,
    StorageBlockSize,
    StorageInterval,
    DurationSinceLastReadout,
    TariffStart,
    TariffDuration,
    TariffPeriod,
    Dimensionless,
    Voltage,
    Current,
    ResetCounter,
    CumulationCounter,
    ControlSignal,
    DayOfWeek,
    WeekNumber,
    DayChangeTimePoint,
    ParameterActivationState,
    SpecialSupplierInformation,
    DurationSinceLastCumulation,
    BatteryOperatingTime,
    BatteryChangeDate,
    TemperatureLimit,
    CumulativeMaxPower,
    RecordError,
    PerTime,
    PerUnit,
    MultipliedBy,
    StartDateOf,
    UncorrectedUnit,
    AccumulationPositive,
    AccumulationNegative,
    LimitValue,
    LimitExceedCount,
    LimitExceedTimePoint,
    LimitExceedDuration,
    MultiplicativeCorrection,
    AdditiveCorrection,
    FutureValue,
    Undefined,
}

impl Quantity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quantity::Energy => "Energy",
            Quantity::Volume => "Volume",
            Quantity::Mass => "Mass",
            Quantity::OnTime => "On time",
            Quantity::OperatingTime => "Operating time",
            Quantity::Power => "Power",
            Quantity::VolumeFlow => "Volume flow",
            Quantity::MassFlow => "Mass flow",
            Quantity::FlowTemperature => "Flow temperature",
            Quantity::ReturnTemperature => "Return temperature",
            Quantity::TemperatureDifference => "Temperature difference",
            Quantity::ExternalTemperature => "External temperature",
            Quantity::Pressure => "Pressure",
            Quantity::TimePoint => "Time point",
            Quantity::HcaUnits => "H.C.A.",
            Quantity::AveragingDuration => "Averaging duration",
            Quantity::ActualityDuration => "Actuality duration",
            Quantity::FabricationNumber => "Fabrication number",
            Quantity::EnhancedIdentification => "Enhanced identification",
            Quantity::BusAddress => "Bus address",
            Quantity::ExtensionFb => "Extension (FB)",
            Quantity::PlainText => "Plain text",
            Quantity::ExtensionFd => "Extension (FD)",
            Quantity::AnyVif => "Any VIF",
            Quantity::ManufacturerSpecific => "Manufacturer specific",
            Quantity::Credit => "Credit",
            Quantity::Debit => "Debit",
            Quantity::AccessNumber => "Access number",
            Quantity::Medium => "Medium",
            Quantity::Manufacturer => "Manufacturer",
            Quantity::ParameterSetId => "Parameter set identification",
            Quantity::ModelVersion => "Model / Version",
            Quantity::HardwareVersion => "Hardware version",
            Quantity::FirmwareVersion => "Firmware version",
            Quantity::SoftwareVersion => "Software version",
            Quantity::CustomerLocation => "Customer location",
            Quantity::Customer => "Customer",
            Quantity::AccessCodeUser => "Access code user",
            Quantity::AccessCodeOperator => "Access code operator",
            Quantity::AccessCodeSystemOperator => "Access code system operator",
            Quantity::AccessCodeDeveloper => "Access code developer",
            Quantity::Password => "Password",
            Quantity::ErrorFlags => "Error flags",
            Quantity::ErrorMask => "Error mask",
            Quantity::DigitalOutput => "Digital output",
            Quantity::DigitalInput => "Digital input",
            Quantity::BaudRate => "Baud rate",
            Quantity::ResponseDelayTime => "Response delay time",
            Quantity::Retry => "Retry",
            Quantity::FirstStorageNumber => "First storage number",
            Quantity::LastStorageNumber => "Last storage number",
            Quantity::StorageBlockSize => "Size of storage block",
            Quantity::StorageInterval => "Storage interval",
            Quantity::DurationSinceLastReadout => "Duration since last readout",
            Quantity::TariffStart => "Start of tariff",
            Quantity::TariffDuration => "Duration of tariff",
            Quantity::TariffPeriod => "Period of tariff",
            Quantity::Dimensionless => "Dimensionless",
            Quantity::Voltage => "Voltage",
            Quantity::Current => "Current",
            Quantity::ResetCounter => "Reset counter",
            Quantity::CumulationCounter => "Cumulation counter",
            Quantity::ControlSignal => "Control signal",
            Quantity::DayOfWeek => "Day of week",
            Quantity::WeekNumber => "Week number",
            Quantity::DayChangeTimePoint => "Time point of day change",
            Quantity::ParameterActivationState => "State of parameter activation",
            Quantity::SpecialSupplierInformation => "Special supplier information",
            Quantity::DurationSinceLastCumulation => "Duration since last cumulation",
            Quantity::BatteryOperatingTime => "Operating time battery",
            Quantity::BatteryChangeDate => "Date and time of battery change",
            Quantity::TemperatureLimit => "Temperature limit",
            Quantity::CumulativeMaxPower => "Cumulative count max power",
            Quantity::RecordError => "Record error",
            Quantity::PerTime => "Per time",
            Quantity::PerUnit => "Per unit",
            Quantity::MultipliedBy => "Multiplied by",
            Quantity::StartDateOf => "Start date(/time) of",
            Quantity::UncorrectedUnit => "Uncorrected unit",
            Quantity::AccumulationPositive => "Accumulation of positive contributions",
            Quantity::AccumulationNegative => "Accumulation of negative contributions",
            Quantity::LimitValue => "Limit value",
            Quantity::LimitExceedCount => "Number of limit exceeds",
            Quantity::LimitExceedTimePoint => "Time point of limit exceed",
            Quantity::LimitExceedDuration => "Duration of limit exceed",
            Quantity::MultiplicativeCorrection => "Multiplicative correction factor",
            Quantity::AdditiveCorrection => "Additive correction constant",
            Quantity::FutureValue => "Future value",
            Quantity::Undefined => "Undefined",
        }
    }

    /// Quantities whose value window holds a packed date or date-time.
    pub fn is_time_point(&self) -> bool {
        matches!(
            self,
            Quantity::TimePoint | Quantity::TariffStart | Quantity::BatteryChangeDate
        )
    }

    /// VIF bytes that only select where the real description lives.
    pub fn is_marker(&self) -> bool {
        matches!(
            self,
            Quantity::ExtensionFb | Quantity::ExtensionFd | Quantity::AnyVif
        )
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resolved unit descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitInfo {
    /// Table-qualified code: the 7-bit key plus the table offset.
    pub code: u16,
    pub quantity: Quantity,
    pub unit: Cow<'static, str>,
    /// Decimal exponent applied to the raw value.
    pub magnitude: i32,
    pub text: Cow<'static, str>,
}

impl UnitInfo {
    fn from_row(row: &'static VifRow, byte: u8, offset: u16) -> Self {
        UnitInfo {
            code: offset + (byte & MBUS_DIB_VIF_WITHOUT_EXTENSION) as u16,
            quantity: row.quantity,
            unit: Cow::Borrowed(row.unit),
            magnitude: (row.magnitude)(byte),
            text: Cow::Borrowed(row.text),
        }
    }

    /// Fallback for keys no table defines.
    pub fn undefined(byte: u8, offset: u16) -> Self {
        UnitInfo {
            code: offset + (byte & MBUS_DIB_VIF_WITHOUT_EXTENSION) as u16,
            quantity: Quantity::Undefined,
            unit: Cow::Owned(format!("{:02X}", byte & MBUS_DIB_VIF_WITHOUT_EXTENSION)),
            magnitude: 0,
            text: Cow::Borrowed("Undefined"),
        }
    }

    /// Unit carried as ASCII text after a plain-text VIF.
    pub fn plain_text(unit: String) -> Self {
        UnitInfo {
            code: MBUS_VIF_PLAIN_TEXT as u16,
            quantity: Quantity::PlainText,
            unit: Cow::Owned(unit),
            magnitude: 0,
            text: Cow::Borrowed("Plain text"),
        }
    }

    /// VIFE following a manufacturer-specific marker; opaque by definition.
    pub fn manufacturer_specific(byte: u8) -> Self {
        UnitInfo {
            code: VIF_CODE_OFFSET_MANUFACTURER + (byte & MBUS_DIB_VIF_WITHOUT_EXTENSION) as u16,
            quantity: Quantity::ManufacturerSpecific,
            unit: Cow::Borrowed(""),
            magnitude: 0,
            text: Cow::Borrowed("Manufacturer specific"),
        }
    }
}

/// The six VIF categories; each fixes which table the VIFEs resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VifCategory {
    Primary,
    PlainText,
    ExtensionFb,
    ExtensionFd,
    Any,
    ManufacturerSpecific,
}

impl VifCategory {
    pub fn of(vif: u8) -> Self {
        match vif & MBUS_DIB_VIF_WITHOUT_EXTENSION {
            MBUS_VIF_EXTENSION_FB => VifCategory::ExtensionFb,
            MBUS_VIF_PLAIN_TEXT => VifCategory::PlainText,
            MBUS_VIF_EXTENSION_FD => VifCategory::ExtensionFd,
            MBUS_VIF_ANY => VifCategory::Any,
            MBUS_VIF_MANUFACTURER_SPECIFIC => VifCategory::ManufacturerSpecific,
            _ => VifCategory::Primary,
        }
    }

    /// Table for the first VIFE after a VIF of this category.
    pub fn extension_table(&self) -> ExtensionTable {
        match self {
            VifCategory::ExtensionFb => ExtensionTable::Fb,
            VifCategory::ExtensionFd => ExtensionTable::Fd,
            VifCategory::ManufacturerSpecific => ExtensionTable::Manufacturer,
            VifCategory::Primary | VifCategory::PlainText | VifCategory::Any => {
                ExtensionTable::Combinable
            }
        }
    }
}

/// Selector for [`resolve_extension`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExtensionTable {
    /// Combinable (orthogonal) VIFEs following a primary VIF.
    Combinable,
    /// Linear extension selected by VIF 0xFB.
    Fb,
    /// Linear extension selected by VIF 0xFD.
    Fd,
    /// Everything after a manufacturer-specific marker.
    Manufacturer,
}

impl ExtensionTable {
    fn code_offset(&self) -> u16 {
        match self {
            ExtensionTable::Combinable => VIF_CODE_OFFSET_COMBINABLE,
            ExtensionTable::Fb => VIF_CODE_OFFSET_FB,
            ExtensionTable::Fd => VIF_CODE_OFFSET_FD,
            ExtensionTable::Manufacturer => VIF_CODE_OFFSET_MANUFACTURER,
        }
    }
}

/// Resolves a primary VIF. The extension bit is ignored.
pub fn resolve_primary(vif: u8) -> UnitInfo {
    match lookup_primary(vif) {
        Some(row) => UnitInfo::from_row(row, vif, 0),
        None => UnitInfo::undefined(vif, 0),
    }
}

/// Resolves a VIFE against `table`. The extension bit is ignored.
pub fn resolve_extension(vife: u8, table: ExtensionTable) -> UnitInfo {
    if table == ExtensionTable::Manufacturer {
        return UnitInfo::manufacturer_specific(vife);
    }
    match lookup_extension(table, vife) {
        Some(row) => UnitInfo::from_row(row, vife, table.code_offset()),
        None => UnitInfo::undefined(vife, table.code_offset()),
    }
}

/// A record's value with every unit descriptor applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedValue {
    pub value: f64,
    pub unit: String,
    pub quantity: Quantity,
}

/// Folds the unit list of `record` into one reading.
///
/// The raw value is scaled by ten to the sum of all magnitudes except those
/// of additive correction constants; each additive constant is then added
/// after scaling by its own magnitude. Unit and quantity come from the first
/// unit that is not an extension marker. Non-numeric values yield `None`.
pub fn normalize_record(record: &DataRecord) -> Option<NormalizedValue> {
    let raw = match &record.value {
        RecordValue::I8(v) => *v as f64,
        RecordValue::I16(v) => *v as f64,
        RecordValue::I32(v) => *v as f64,
        RecordValue::I64(v) => *v as f64,
        RecordValue::F32(v) => *v as f64,
        _ => return None,
    };

    let primary = record.primary_unit()?;

    let exponent: i32 = record
        .units
        .iter()
        .filter(|u| u.quantity != Quantity::AdditiveCorrection)
        .map(|u| u.magnitude)
        .sum();
    let offset: f64 = record
        .units
        .iter()
        .filter(|u| u.quantity == Quantity::AdditiveCorrection)
        .map(|u| 10f64.powi(u.magnitude))
        .sum();

    Some(NormalizedValue {
        value: raw * 10f64.powi(exponent) + offset,
        unit: primary.unit.to_string(),
        quantity: primary.quantity,
    })
}
