#![no_main]

use libfuzzer_sys::fuzz_target;
use mbus_telegram::mbus::frame::{pack_frame, parse_frame};

fuzz_target!(|data: &[u8]| {
    // Any accepted frame must pack back to the bytes it was read from
    if let Ok(frame) = parse_frame(data) {
        let packed = pack_frame(&frame).unwrap();
        assert_eq!(&data[..packed.len()], packed.as_slice());
    }

    // Repair the checksum and stop byte of long frames to reach the payload checks
    if data.len() >= 9 && data[0] == 0x68 {
        let len = (data.len() - 6).min(252) as u8;
        let mut repaired = data[..len as usize + 6].to_vec();
        repaired[1] = len;
        repaired[2] = len;
        repaired[3] = 0x68;
        let body_end = 4 + len as usize;
        repaired[body_end] = repaired[4..body_end]
            .iter()
            .fold(0u8, |acc, b| acc.wrapping_add(*b));
        repaired[body_end + 1] = 0x16;
        let _ = parse_frame(&repaired);
    }
});
