//! The DNS wire format: types, serialisation, and deserialisation of
//! messages, as described in RFC 1035.

pub mod deserialise;
pub mod mnemonics;
pub mod serialise;
pub mod types;
