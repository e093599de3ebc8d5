#![no_main]
use libfuzzer_sys::fuzz_target;

use dns_types::protocol::types::Message;

fuzz_target!(|data: &[u8]| {
    if let Ok(message) = Message::from_octets(data) {
        let header = message.header();
        assert_eq!(usize::from(header.qdcount), message.questions().len());
        assert_eq!(header.record_count(), message.records().len());
        assert!(message.octets_len() <= data.len());

        for rr in message.records() {
            let rdata_stop = rr.rdata_offset + rr.rdata.len();
            assert_eq!(&data[rr.rdata_offset..rdata_stop], &rr.rdata[..]);
        }
    }
});
