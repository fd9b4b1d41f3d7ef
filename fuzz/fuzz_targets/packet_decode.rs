//! Fuzz the session-management envelope decoder with arbitrary bytes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use spindle_proto::SmPacket;

fuzz_target!(|data: &[u8]| {
    // Decoding must never panic, whatever the wire carries.
    let _ = SmPacket::decode(data);
});
