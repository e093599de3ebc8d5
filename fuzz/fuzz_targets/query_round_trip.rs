#![no_main]
use libfuzzer_sys::fuzz_target;

use dns_types::protocol::types::{Message, Question};

fuzz_target!(|input: (u16, Question, bool)| {
    let (id, question, recursion_desired) = input;
    let serialised = Message::query_for(id, &question, recursion_desired);
    let message = Message::from_octets(&serialised).unwrap();

    assert_eq!(id, message.header().id);
    assert_eq!(recursion_desired, message.header().flags.recursion_desired());
    assert_eq!(&[question][..], message.questions());
    assert!(message.records().is_empty());
});
