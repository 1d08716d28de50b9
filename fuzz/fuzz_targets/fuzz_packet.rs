#![no_main]

use libfuzzer_sys::fuzz_target;
use mbus_telegram::payload::{map_to_packet, normalize_record, MBusPacket};
use mbus_telegram::MBusFrame;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the CI, the rest is the payload of a slave response
    let ci = match data[0] % 4 {
        0 => 0x70,
        1 => 0x71,
        2 => 0x72,
        _ => 0x73,
    };
    let payload = data[1..].iter().take(252).copied().collect::<Vec<_>>();
    let Ok(frame) = MBusFrame::long(0x08, 0x01, ci, payload) else {
        return;
    };

    if let Ok(MBusPacket::VariableData(variable)) = map_to_packet(&frame) {
        for record in &variable.records {
            let _ = normalize_record(record);
        }
    }
});
