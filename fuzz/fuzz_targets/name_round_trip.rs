#![no_main]
use libfuzzer_sys::fuzz_target;

use dns_types::protocol::types::DomainName;

fuzz_target!(|name: DomainName| {
    let serialised = name.to_octets();
    let deserialised = DomainName::from_octets(&serialised, 0);
    assert_eq!(Ok((name, serialised.len())), deserialised);
});
