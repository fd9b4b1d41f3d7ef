//! Fuzz the full decode → encode → decode cycle.

#![no_main]

use libfuzzer_sys::fuzz_target;
use spindle_proto::SmPacket;

fuzz_target!(|data: &[u8]| {
    if let Ok(packet) = SmPacket::decode(data) {
        // Anything that decodes must survive a re-encode unchanged.
        let reencoded = packet.encode();
        let reparsed = SmPacket::decode(&reencoded).expect("re-encoded packet must decode");
        assert_eq!(reparsed, packet);
    }
});
