//! The payload module contains the application layer (EN 13757-3): the value
//! information tables, the value parser, the data record loop and the packet
//! mapper that ties them to a parsed frame.

pub mod data;
pub mod data_encoding;
pub mod record;
pub mod vif;
pub mod vif_maps;

pub use data::{map_to_packet, FixedData, MBusPacket, StatusFlags, VariableData};
pub use data_encoding::{
    decode_date, decode_manufacturer, encode_manufacturer, parse_value, DataType, MBusDateTime,
    RecordValue,
};
pub use record::{parse_records, DataRecord, Function, RecordStream};
pub use vif::{
    normalize_record, resolve_extension, resolve_primary, ExtensionTable, NormalizedValue,
    Quantity, UnitInfo, VifCategory,
};
