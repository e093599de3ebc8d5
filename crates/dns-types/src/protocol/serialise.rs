//! Serialisation of DNS messages to the wire format.  See the `types`
//! module for details of the format.

use bytes::{BufMut, BytesMut};

use crate::protocol::types::*;

impl Message {
    /// Build a recursive query for `hostname` with a random ID.
    ///
    /// # Errors
    ///
    /// If `hostname` is not a valid domain name.
    pub fn build_query(hostname: &str, qtype: RecordType) -> Result<BytesMut, Error> {
        Self::build_query_with_id(rand::random(), hostname, qtype)
    }

    /// Build a recursive query for `hostname` with the given ID: a
    /// header with RD set and a single IN-class question.
    ///
    /// # Errors
    ///
    /// If `hostname` is not a valid domain name.
    pub fn build_query_with_id(id: u16, hostname: &str, qtype: RecordType) -> Result<BytesMut, Error> {
        let question = Question {
            name: DomainName::from_dotted_string(hostname)?,
            qtype,
            qclass: RecordClass::IN,
        };

        Ok(Self::query_for(id, &question, true))
    }

    /// Encode a query consisting of just a header and `question`.
    pub fn query_for(id: u16, question: &Question, recursion_desired: bool) -> BytesMut {
        let mut buffer = WritableBuffer::default();
        Header::query(id, recursion_desired)
            .with_counts(1, 0, 0, 0)
            .serialise(&mut buffer);
        question.serialise(&mut buffer);
        buffer.octets
    }
}

impl Header {
    pub fn serialise(&self, buffer: &mut WritableBuffer) {
        buffer.write_u16(self.id);
        buffer.write_octets(&self.flags.octets());
        buffer.write_u16(self.qdcount);
        buffer.write_u16(self.ancount);
        buffer.write_u16(self.nscount);
        buffer.write_u16(self.arcount);
    }
}

impl Question {
    pub fn serialise(&self, buffer: &mut WritableBuffer) {
        self.name.serialise(buffer);
        buffer.write_u16(self.qtype.into());
        buffer.write_u16(self.qclass.into());
    }
}

impl ResourceRecord {
    /// # Errors
    ///
    /// If the RDATA is too long.
    pub fn serialise(&self, buffer: &mut WritableBuffer) -> Result<(), Error> {
        let rdlength = usize_to_u16(self.rdata.len())?;

        self.name.serialise(buffer);
        buffer.write_u16(self.rtype.into());
        buffer.write_u16(self.rclass.into());
        buffer.write_u32(self.ttl);
        buffer.write_u16(rdlength);
        buffer.write_octets(&self.rdata);

        Ok(())
    }
}

impl DomainName {
    /// The uncompressed wire form of this name.
    pub fn to_octets(&self) -> BytesMut {
        let mut buffer = WritableBuffer::default();
        self.serialise(&mut buffer);
        buffer.octets
    }

    pub fn serialise(&self, buffer: &mut WritableBuffer) {
        for label in &self.labels {
            buffer.write_u8(label.len());
            buffer.write_octets(label.octets());
        }
    }
}

/// Errors encountered when serialising a message.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Error {
    /// A label is over 63 octets, or a whole name is over 255.
    NameEncodingTooLong { octets: usize, limit: usize },

    /// A hostname has no labels.
    EmptyHostname,

    /// A backslash in a hostname is not followed by an octet, or by
    /// three digits making a number up to 255.
    InvalidEscape { position: usize },

    /// A counter does not fit in the desired width.
    CounterTooLarge { counter: usize, bits: u32 },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::NameEncodingTooLong { octets, limit } => {
                write!(f, "name is {octets} octets long but the limit is {limit}")
            }
            Error::EmptyHostname => write!(f, "hostname is empty"),
            Error::InvalidEscape { position } => {
                write!(f, "invalid escape at position {position} of hostname")
            }
            Error::CounterTooLarge { counter, bits } => {
                write!(f, "'{counter}' cannot be converted to a u{bits}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// A buffer which can be written to, for serialisation purposes.
pub struct WritableBuffer {
    pub octets: BytesMut,
}

impl Default for WritableBuffer {
    fn default() -> Self {
        Self {
            octets: BytesMut::with_capacity(512),
        }
    }
}

impl WritableBuffer {
    pub fn index(&self) -> usize {
        self.octets.len()
    }

    pub fn write_u8(&mut self, octet: u8) {
        self.octets.put_u8(octet);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.octets.put_u16(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.octets.put_u32(value);
    }

    pub fn write_octets(&mut self, octets: &[u8]) {
        self.octets.put_slice(octets);
    }
}

/// Helper function to convert a `usize` into a `u16` (or return an error).
///
/// # Errors
///
/// If the value cannot be converted.
fn usize_to_u16(counter: usize) -> Result<u16, Error> {
    if let Ok(t) = u16::try_from(counter) {
        Ok(t)
    } else {
        Err(Error::CounterTooLarge {
            counter,
            bits: u16::BITS,
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use rand::Rng;

    use super::*;
    use crate::protocol::types::test_util::*;

    #[test]
    #[rustfmt::skip]
    fn build_query_example_com() {
        let octets = Message::build_query_with_id(0x1234, "example.com", RecordType::A).unwrap();

        assert_eq!(
            vec![
                // header
                0x12, 0x34, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
                // QNAME
                0x07, 0x65, 0x78, 0x61, 0x6d, 0x70, 0x6c, 0x65, // "example"
                0x03, 0x63, 0x6f, 0x6d, 0x00, // "com"
                // QTYPE
                0x00, 0x01,
                // QCLASS
                0x00, 0x01,
            ],
            octets,
        );
    }

    #[test]
    fn build_query_other_type() {
        let octets = Message::build_query_with_id(7, "example.com.", RecordType::AAAA).unwrap();

        assert_eq!([0, 28, 0, 1], octets[octets.len() - 4..]);
    }

    #[test]
    fn build_query_rejects_bad_names() {
        assert_eq!(
            Err(Error::EmptyHostname),
            Message::build_query_with_id(1, "", RecordType::A)
        );
        assert!(matches!(
            Message::build_query_with_id(1, &"a".repeat(64), RecordType::A),
            Err(Error::NameEncodingTooLong { .. })
        ));
    }

    #[test]
    fn build_query_random_id_decodes() {
        for _ in 0..10 {
            let octets = Message::build_query("www.example.com", RecordType::A).unwrap();
            let message = Message::from_octets(&octets).unwrap();

            assert_eq!(1, message.questions().len());
            assert_eq!(domain("www.example.com."), message.questions()[0].name);
            assert_eq!(RecordType::A, message.questions()[0].qtype);
            assert_eq!(RecordClass::IN, message.questions()[0].qclass);
            assert!(message.records().is_empty());
        }
    }

    #[test]
    fn query_for_without_recursion() {
        let question = Question {
            name: domain("example.com."),
            qtype: RecordType::MX,
            qclass: RecordClass::CH,
        };
        let octets = Message::query_for(99, &question, false);
        let message = Message::from_octets(&octets).unwrap();

        assert_eq!(99, message.header().id);
        assert!(!message.header().flags.recursion_desired());
        assert_eq!(&[question], message.questions());
    }

    #[test]
    fn header_roundtrip() {
        let mut rng = rand::rng();
        for _ in 0..100 {
            let id = rng.random();
            let recursion_desired = rng.random();

            let mut buf = WritableBuffer::default();
            Header::query(id, recursion_desired).serialise(&mut buf);
            let message = Message::from_octets(&buf.octets).unwrap();
            let flags = message.header().flags;

            assert_eq!(id, message.header().id);
            assert_eq!(recursion_desired, flags.recursion_desired());
            assert!(!flags.is_response());
            assert_eq!(Opcode::Standard, flags.opcode());
            assert!(!flags.is_authoritative());
            assert!(!flags.is_truncated());
            assert!(!flags.recursion_available());
            assert_eq!(0, flags.z());
            assert_eq!(Rcode::NoError, flags.rcode());
        }
    }

    #[test]
    #[rustfmt::skip]
    fn name_uncompressed() {
        assert_eq!(
            vec![
                3, 119, 119, 119, // "www"
                7, 101, 120, 97, 109, 112, 108, 101, // "example"
                3, 99, 111, 109, 0, // "com"
            ],
            domain("www.example.com.").to_octets(),
        );
    }

    #[test]
    #[rustfmt::skip]
    fn record_sets_rdlength() {
        let mut buf = WritableBuffer::default();
        buf.write_u8(1);
        buf.write_u8(2);
        buf.write_u8(3);
        buf.write_u8(4);

        unknown_record("www.example.com.", &[9, 8, 7]).serialise(&mut buf).unwrap();

        assert_eq!(
            vec![
                1, 2, 3, 4,
                // NAME
                3, 119, 119, 119, // "www"
                7, 101, 120, 97, 109, 112, 108, 101, // "example"
                3, 99, 111, 109, 0, // "com"
                // TYPE
                0b0000_0000, 0b0110_0100, // 100
                // CLASS
                0b0000_0000, 0b0000_0001, // IN
                // TTL
                0b0000_0000, 0b0000_0000, 0b0000_0001, 0b0010_1100, // 300
                // RDLENGTH
                0b0000_0000, 0b0000_0011, // 3 octets
                // RDATA
                9, 8, 7,
            ],
            buf.octets,
        );
    }

    #[test]
    fn record_rdata_too_long() {
        let mut rr = unknown_record("www.example.com.", &[]);
        rr.rdata = Bytes::from(vec![0; 70000]);

        assert_eq!(
            Err(Error::CounterTooLarge {
                counter: 70000,
                bits: 16
            }),
            rr.serialise(&mut WritableBuffer::default())
        );
    }
}
