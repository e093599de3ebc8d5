//! Deserialisation of DNS messages from the network.  See the `types`
//! module for details of the format.

use bytes::Bytes;
use std::fmt;

use crate::protocol::types::*;

/// Smallest possible encoded question: the root name, QTYPE, and
/// QCLASS.
const QUESTION_MIN_LEN: usize = 5;

/// Smallest possible encoded resource record: the root name, TYPE,
/// CLASS, TTL, and RDLENGTH.
const RESOURCE_RECORD_MIN_LEN: usize = 11;

impl Message {
    /// Decode a complete message: the header, then exactly as many
    /// questions and records as it says there are.
    ///
    /// # Errors
    ///
    /// If the message cannot be parsed.  No partially-decoded message
    /// is ever returned.
    pub fn from_octets(octets: &[u8]) -> Result<Self, Error> {
        let mut buffer = ConsumableBuffer::new(octets);
        let header = Header::deserialise(&mut buffer)?;

        // the counts come from the network, so don't trust them when
        // allocating
        let mut questions =
            Vec::with_capacity(usize::from(header.qdcount).min(octets.len() / QUESTION_MIN_LEN));
        let mut records =
            Vec::with_capacity(header.record_count().min(octets.len() / RESOURCE_RECORD_MIN_LEN));

        for index in 0..header.qdcount {
            buffer.expect_entry(Section::Question, index, header.qdcount)?;
            let question = Question::deserialise(&mut buffer)
                .map_err(|err| err.in_section(Section::Question, index))?;
            questions.push(question);
        }

        for (section, count) in [
            (Section::Answer, header.ancount),
            (Section::Authority, header.nscount),
            (Section::Additional, header.arcount),
        ] {
            for index in 0..count {
                buffer.expect_entry(section, index, count)?;
                let rr = ResourceRecord::deserialise(&mut buffer)
                    .map_err(|err| err.in_section(section, index))?;
                records.push(rr);
            }
        }

        Ok(Self {
            header,
            questions,
            records,
            octets_len: octets.len(),
        })
    }
}

impl Header {
    /// # Errors
    ///
    /// If the header is too short.
    pub fn deserialise(buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        if buffer.remaining() < HEADER_LEN {
            return Err(Error::BufferTooShort {
                offset: buffer.position(),
                wanted: HEADER_LEN,
            });
        }

        let id = buffer.next_u16()?;
        let flags = Flags::from_octets([buffer.next_u8()?, buffer.next_u8()?]);
        let qdcount = buffer.next_u16()?;
        let ancount = buffer.next_u16()?;
        let nscount = buffer.next_u16()?;
        let arcount = buffer.next_u16()?;

        Ok(Self {
            id,
            flags,
            qdcount,
            ancount,
            nscount,
            arcount,
        })
    }
}

impl Question {
    /// Decode a question starting at `offset`, returning it and the
    /// offset immediately after it.
    ///
    /// # Errors
    ///
    /// If the question cannot be parsed.
    pub fn from_octets(octets: &[u8], offset: usize) -> Result<(Self, usize), Error> {
        let mut buffer = ConsumableBuffer::new(octets).at_offset(offset);
        let question = Self::deserialise(&mut buffer)?;
        Ok((question, buffer.position()))
    }

    /// # Errors
    ///
    /// If the question cannot be parsed.
    pub fn deserialise(buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let name = DomainName::deserialise(buffer)?;
        let qtype = RecordType::from(buffer.next_u16()?);
        let qclass = RecordClass::from(buffer.next_u16()?);

        Ok(Self {
            name,
            qtype,
            qclass,
        })
    }
}

impl ResourceRecord {
    /// Decode a resource record starting at `offset`, returning it and
    /// the offset immediately after its RDATA.
    ///
    /// # Errors
    ///
    /// If the record cannot be parsed.
    pub fn from_octets(octets: &[u8], offset: usize) -> Result<(Self, usize), Error> {
        let mut buffer = ConsumableBuffer::new(octets).at_offset(offset);
        let rr = Self::deserialise(&mut buffer)?;
        Ok((rr, buffer.position()))
    }

    /// # Errors
    ///
    /// If the record cannot be parsed.
    pub fn deserialise(buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let name = DomainName::deserialise(buffer)?;
        let rtype = RecordType::from(buffer.next_u16()?);
        let rclass = RecordClass::from(buffer.next_u16()?);
        let ttl = buffer.next_u32()?;
        let rdlength = buffer.next_u16()?;

        let rdata_offset = buffer.position();
        let rdata = Bytes::copy_from_slice(buffer.take(rdlength.into())?);

        Ok(Self {
            name,
            rtype,
            rclass,
            ttl,
            rdata,
            rdata_offset,
        })
    }
}

impl DomainName {
    /// Decode a name starting at `offset`, returning it and the offset
    /// immediately after the name as it appears at `offset`.  If the
    /// name ends in a compression pointer, that is the offset after
    /// the pointer, not after wherever the pointer led.
    ///
    /// # Errors
    ///
    /// If the domain cannot be parsed.
    pub fn from_octets(octets: &[u8], offset: usize) -> Result<(Self, usize), Error> {
        let mut buffer = ConsumableBuffer::new(octets).at_offset(offset);
        let name = Self::deserialise(&mut buffer)?;
        Ok((name, buffer.position()))
    }

    /// # Errors
    ///
    /// If the domain cannot be parsed.
    pub fn deserialise(buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let octets = buffer.octets;
        let start = buffer.position;

        let mut labels = Vec::<Label>::with_capacity(5);
        let mut len = 0;

        let mut cursor = start;
        // where the current run of labels began: a pointer must go
        // strictly before this (RFC 1035 section 4.1.4 says pointers
        // are to a prior occurrence), so every jump goes backwards and
        // the loop terminates.
        let mut run_start = start;
        // where the name ends in the buffer, once a pointer has been
        // followed
        let mut end = None;

        loop {
            let size = read_u8(octets, cursor)?;

            if size & NAME_POINTER_TAG == 0 {
                len += 1 + usize::from(size);
                if len > DOMAINNAME_MAX_LEN {
                    return Err(Error::DomainTooLong { offset: start });
                }

                if size == 0 {
                    labels.push(Label::new());
                    cursor += 1;
                    break;
                }

                let label_start = cursor + 1;
                let label_stop = label_start + usize::from(size);
                let label = octets
                    .get(label_start..label_stop)
                    .and_then(|os| Label::try_from(os).ok())
                    .ok_or(Error::InvalidLabelLength {
                        offset: cursor,
                        length: size,
                    })?;
                labels.push(label);
                cursor = label_stop;
            } else if size & NAME_POINTER_TAG == NAME_POINTER_TAG {
                let target = usize::from(read_u16(octets, cursor)? & NAME_POINTER_OFFSET_MASK);

                if target >= octets.len() || target >= run_start {
                    return Err(Error::CompressionPointerOutOfRange {
                        offset: cursor,
                        target,
                    });
                }

                end.get_or_insert(cursor + 2);
                cursor = target;
                run_start = target;
            } else {
                // 0b01 and 0b10 prefixes are reserved
                return Err(Error::InvalidLabelLength {
                    offset: cursor,
                    length: size,
                });
            }
        }

        buffer.position = end.unwrap_or(cursor);
        Ok(DomainName { labels, len })
    }
}

/// Errors encountered when parsing a datagram.  Every error records
/// the offset in the datagram at which parsing failed.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Error {
    /// A fixed-width field runs past the end of the datagram.
    BufferTooShort { offset: usize, wanted: usize },

    /// A domain label runs past the end of the datagram, or its length
    /// octet uses one of the reserved prefixes.
    InvalidLabelLength { offset: usize, length: u8 },

    /// A domain pointer points outside the datagram, or does not point
    /// to an earlier position (which includes every pointer cycle).
    CompressionPointerOutOfRange { offset: usize, target: usize },

    /// A domain is over 255 octets in size.
    DomainTooLong { offset: usize },

    /// The datagram ended before all of the questions or records the
    /// header promised.
    SectionCountMismatch {
        section: Section,
        index: u16,
        expected: u16,
        offset: usize,
    },

    /// A question or record could not be parsed.
    Section {
        section: Section,
        index: u16,
        cause: Box<Error>,
    },
}

impl Error {
    /// The offset at which parsing actually failed.
    pub fn offset(&self) -> usize {
        match self {
            Error::BufferTooShort { offset, .. } => *offset,
            Error::InvalidLabelLength { offset, .. } => *offset,
            Error::CompressionPointerOutOfRange { offset, .. } => *offset,
            Error::DomainTooLong { offset } => *offset,
            Error::SectionCountMismatch { offset, .. } => *offset,
            Error::Section { cause, .. } => cause.offset(),
        }
    }

    fn in_section(self, section: Section, index: u16) -> Self {
        Error::Section {
            section,
            index,
            cause: Box::new(self),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::BufferTooShort { offset, wanted } => {
                write!(f, "wanted {wanted} octets at offset {offset} but the message ended")
            }
            Error::InvalidLabelLength { offset, length } => {
                write!(f, "invalid label length {length} at offset {offset}")
            }
            Error::CompressionPointerOutOfRange { offset, target } => {
                write!(
                    f,
                    "compression pointer at offset {offset} has invalid target {target}"
                )
            }
            Error::DomainTooLong { offset } => {
                write!(f, "domain at offset {offset} is over {DOMAINNAME_MAX_LEN} octets")
            }
            Error::SectionCountMismatch {
                section,
                index,
                expected,
                offset,
            } => write!(
                f,
                "message ended at offset {offset} after {index} of {expected} {section} entries"
            ),
            Error::Section {
                section,
                index,
                cause,
            } => write!(f, "{section} entry {index}: {cause}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Section { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

/// Read the octet at `offset`.
///
/// # Errors
///
/// If `offset` is past the end of `octets`.
pub fn read_u8(octets: &[u8], offset: usize) -> Result<u8, Error> {
    fixed::<1>(octets, offset).map(|[a]| a)
}

/// Read a big-endian `u16` at `offset`.
///
/// # Errors
///
/// If there are fewer than 2 octets from `offset`.
pub fn read_u16(octets: &[u8], offset: usize) -> Result<u16, Error> {
    fixed::<2>(octets, offset).map(u16::from_be_bytes)
}

/// Read a big-endian `u32` at `offset`.
///
/// # Errors
///
/// If there are fewer than 4 octets from `offset`.
pub fn read_u32(octets: &[u8], offset: usize) -> Result<u32, Error> {
    fixed::<4>(octets, offset).map(u32::from_be_bytes)
}

fn fixed<const N: usize>(octets: &[u8], offset: usize) -> Result<[u8; N], Error> {
    octets
        .get(offset..)
        .and_then(|rest| rest.get(..N))
        .and_then(|slice| <[u8; N]>::try_from(slice).ok())
        .ok_or(Error::BufferTooShort { offset, wanted: N })
}

/// A buffer which will be consumed by the parsing process.
pub struct ConsumableBuffer<'a> {
    octets: &'a [u8],
    position: usize,
}

impl<'a> ConsumableBuffer<'a> {
    pub fn new(octets: &'a [u8]) -> Self {
        Self {
            octets,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.octets.len().saturating_sub(self.position)
    }

    pub fn next_u8(&mut self) -> Result<u8, Error> {
        let value = read_u8(self.octets, self.position)?;
        self.position += 1;
        Ok(value)
    }

    pub fn next_u16(&mut self) -> Result<u16, Error> {
        let value = read_u16(self.octets, self.position)?;
        self.position += 2;
        Ok(value)
    }

    pub fn next_u32(&mut self) -> Result<u32, Error> {
        let value = read_u32(self.octets, self.position)?;
        self.position += 4;
        Ok(value)
    }

    pub fn take(&mut self, size: usize) -> Result<&'a [u8], Error> {
        let slice = self
            .octets
            .get(self.position..)
            .and_then(|rest| rest.get(..size))
            .ok_or(Error::BufferTooShort {
                offset: self.position,
                wanted: size,
            })?;
        self.position += size;
        Ok(slice)
    }

    pub fn at_offset(&self, position: usize) -> ConsumableBuffer<'a> {
        Self {
            octets: self.octets,
            position,
        }
    }

    /// Fail if the buffer is exhausted but another entry of `section`
    /// is due.
    fn expect_entry(&self, section: Section, index: u16, expected: u16) -> Result<(), Error> {
        if self.remaining() == 0 {
            Err(Error::SectionCountMismatch {
                section,
                index,
                expected,
                offset: self.position,
            })
        } else {
            Ok(())
        }
    }
}
