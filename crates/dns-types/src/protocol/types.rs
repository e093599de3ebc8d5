use bytes::Bytes;
use std::fmt;
use std::str::FromStr;

use crate::protocol::mnemonics;
use crate::protocol::serialise;

/// Maximum encoded length of a domain name.  The number of labels
/// plus sum of the lengths of the labels.
pub const DOMAINNAME_MAX_LEN: usize = 255;

/// Maximum length of a single label in a domain name.
pub const LABEL_MAX_LEN: usize = 63;

/// Length of the fixed message header.
pub const HEADER_LEN: usize = 12;

/// Octet mask for the QR flag being set (response).
pub const HEADER_MASK_QR: u8 = 0b1000_0000;

/// Octet mask for the opcode field.
pub const HEADER_MASK_OPCODE: u8 = 0b0111_1000;

/// Offset for the opcode field.
pub const HEADER_OFFSET_OPCODE: usize = 3;

/// Octet mask for the AA flag being set (authoritative)
pub const HEADER_MASK_AA: u8 = 0b0000_0100;

/// Octet mask for the TC flag being set (truncated)
pub const HEADER_MASK_TC: u8 = 0b0000_0010;

/// Octet mask for the RD flag being set (desired)
pub const HEADER_MASK_RD: u8 = 0b0000_0001;

/// Octet mask for the RA flag being set (available)
pub const HEADER_MASK_RA: u8 = 0b1000_0000;

/// Octet mask for the reserved Z field.
pub const HEADER_MASK_Z: u8 = 0b0111_0000;

/// Offset for the reserved Z field.
pub const HEADER_OFFSET_Z: usize = 4;

/// Octet mask for the rcode field.
pub const HEADER_MASK_RCODE: u8 = 0b0000_1111;

/// Offset for the rcode field.
pub const HEADER_OFFSET_RCODE: usize = 0;

/// The top two bits of a length octet which mark it as the first half
/// of a compression pointer.
pub const NAME_POINTER_TAG: u8 = 0b1100_0000;

/// Mask selecting the target offset from a (big-endian) compression
/// pointer.
pub const NAME_POINTER_OFFSET_MASK: u16 = 0b0011_1111_1111_1111;

/// A decoded DNS message.
///
/// ```text
///     +---------------------+
///     |        Header       |
///     +---------------------+
///     |       Question      | the question for the name server
///     +---------------------+
///     |        Answer       | RRs answering the question
///     +---------------------+
///     |      Authority      | RRs pointing toward an authority
///     +---------------------+
///     |      Additional     | RRs holding additional information
///     +---------------------+
/// ```
///
/// See section 4.1 of RFC 1035.
///
/// A `Message` only comes into existence through
/// `Message::from_octets`, which guarantees that there are exactly as
/// many questions and records as the header counts say.  The answer,
/// authority, and additional records are held in one list, in that
/// order.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Message {
    pub(crate) header: Header,
    pub(crate) questions: Vec<Question>,
    pub(crate) records: Vec<ResourceRecord>,
    pub(crate) octets_len: usize,
}

impl Message {
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// All records, answers first, then authority, then additional.
    pub fn records(&self) -> &[ResourceRecord] {
        &self.records
    }

    pub fn answers(&self) -> &[ResourceRecord] {
        let an = usize::from(self.header.ancount);
        &self.records[..an]
    }

    pub fn authority(&self) -> &[ResourceRecord] {
        let an = usize::from(self.header.ancount);
        let ns = usize::from(self.header.nscount);
        &self.records[an..an + ns]
    }

    pub fn additional(&self) -> &[ResourceRecord] {
        let an = usize::from(self.header.ancount);
        let ns = usize::from(self.header.nscount);
        &self.records[an + ns..]
    }

    /// The records of a single section.
    pub fn section(&self, section: Section) -> &[ResourceRecord] {
        match section {
            Section::Question => &[],
            Section::Answer => self.answers(),
            Section::Authority => self.authority(),
            Section::Additional => self.additional(),
        }
    }

    /// Length of the datagram this message was decoded from.
    pub fn octets_len(&self) -> usize {
        self.octets_len
    }
}

/// Common header type for all messages.
///
/// ```text
///                                     1  1  1  1  1  1
///       0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                      ID                       |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |QR|   Opcode  |AA|TC|RD|RA|   Z    |   RCODE   |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                    QDCOUNT                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                    ANCOUNT                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                    NSCOUNT                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                    ARCOUNT                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
///
/// See section 4.1.1 of RFC 1035.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(any(feature = "test-util", test), derive(arbitrary::Arbitrary))]
pub struct Header {
    /// Identifier chosen by the querier and copied into the response,
    /// so replies can be matched up with outstanding queries.
    pub id: u16,

    /// The second and third octets of the header.
    pub flags: Flags,

    /// Number of entries in the question section.
    pub qdcount: u16,

    /// Number of resource records in the answer section.
    pub ancount: u16,

    /// Number of name server resource records in the authority
    /// section.
    pub nscount: u16,

    /// Number of resource records in the additional records section.
    pub arcount: u16,
}

impl Header {
    /// A header for a standard query with no entries in any section.
    pub fn query(id: u16, recursion_desired: bool) -> Self {
        Self {
            id,
            flags: Flags::query(recursion_desired),
            qdcount: 0,
            ancount: 0,
            nscount: 0,
            arcount: 0,
        }
    }

    #[must_use]
    pub fn with_counts(self, qdcount: u16, ancount: u16, nscount: u16, arcount: u16) -> Self {
        Self {
            qdcount,
            ancount,
            nscount,
            arcount,
            ..self
        }
    }

    /// Total number of resource records across the answer, authority,
    /// and additional sections.
    pub fn record_count(&self) -> usize {
        usize::from(self.ancount) + usize::from(self.nscount) + usize::from(self.arcount)
    }
}

/// The two flag octets of the header, kept exactly as they appeared on
/// the wire.  The individual fields are read-only views.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
#[cfg_attr(any(feature = "test-util", test), derive(arbitrary::Arbitrary))]
pub struct Flags {
    octets: [u8; 2],
}

impl Flags {
    pub fn from_octets(octets: [u8; 2]) -> Self {
        Self { octets }
    }

    /// Flags for a standard query: everything clear except, possibly,
    /// RD.
    pub fn query(recursion_desired: bool) -> Self {
        let flag_rd = if recursion_desired { HEADER_MASK_RD } else { 0 };
        Self {
            octets: [flag_rd, 0],
        }
    }

    pub fn octets(self) -> [u8; 2] {
        self.octets
    }

    /// QR: whether this message is a response (true) or a query.
    pub fn is_response(self) -> bool {
        self.octets[0] & HEADER_MASK_QR != 0
    }

    pub fn opcode(self) -> Opcode {
        Opcode::from((self.octets[0] & HEADER_MASK_OPCODE) >> HEADER_OFFSET_OPCODE)
    }

    /// AA: the responding name server is an authority for the name in
    /// the question section.
    pub fn is_authoritative(self) -> bool {
        self.octets[0] & HEADER_MASK_AA != 0
    }

    /// TC: the message was truncated to fit the transmission channel.
    pub fn is_truncated(self) -> bool {
        self.octets[0] & HEADER_MASK_TC != 0
    }

    /// RD: set in a query to ask the server to resolve recursively,
    /// and copied into the response.
    pub fn recursion_desired(self) -> bool {
        self.octets[0] & HEADER_MASK_RD != 0
    }

    /// RA: set in a response if the server supports recursion.
    pub fn recursion_available(self) -> bool {
        self.octets[1] & HEADER_MASK_RA != 0
    }

    /// The reserved Z bits, which should be zero.
    pub fn z(self) -> u8 {
        (self.octets[1] & HEADER_MASK_Z) >> HEADER_OFFSET_Z
    }

    pub fn rcode(self) -> Rcode {
        Rcode::from((self.octets[1] & HEADER_MASK_RCODE) >> HEADER_OFFSET_RCODE)
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flags")
            .field("is_response", &self.is_response())
            .field("opcode", &self.opcode())
            .field("is_authoritative", &self.is_authoritative())
            .field("is_truncated", &self.is_truncated())
            .field("recursion_desired", &self.recursion_desired())
            .field("recursion_available", &self.recursion_available())
            .field("z", &self.z())
            .field("rcode", &self.rcode())
            .finish()
    }
}

/// The sections of a message, in wire order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Section {
    Question,
    Answer,
    Authority,
    Additional,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Section::Question => write!(f, "question"),
            Section::Answer => write!(f, "answer"),
            Section::Authority => write!(f, "authority"),
            Section::Additional => write!(f, "additional"),
        }
    }
}

/// The question section has a list of questions (usually 1 but
/// possibly more) being asked.  This is the structure for a single
/// question.
///
/// ```text
///                                     1  1  1  1  1  1
///       0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                                               |
///     /                     QNAME                     /
///     /                                               /
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                     QTYPE                     |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                     QCLASS                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
///
/// See section 4.1.2 of RFC 1035.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(any(feature = "test-util", test), derive(arbitrary::Arbitrary))]
pub struct Question {
    pub name: DomainName,
    pub qtype: RecordType,
    pub qclass: RecordClass,
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.qclass, self.qtype)
    }
}

/// The answer, authority, and additional sections are all the same
/// format: a variable number of resource records.  This is the
/// structure for a single resource record.
///
/// ```text
///                                     1  1  1  1  1  1
///       0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                                               |
///     /                                               /
///     /                      NAME                     /
///     |                                               |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                      TYPE                     |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                     CLASS                     |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                      TTL                      |
///     |                                               |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                   RDLENGTH                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--|
///     /                     RDATA                     /
///     /                                               /
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
///
/// See section 4.1.3 of RFC 1035.
///
/// RDATA is kept as the raw octets: interpreting it is up to the
/// consumer, keyed on `rtype`.  Since the RDATA of some types contains
/// compressed domain names, which can only be resolved against the
/// whole message, `rdata_offset` records where in the message the
/// RDATA started.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ResourceRecord {
    pub name: DomainName,
    pub rtype: RecordType,
    pub rclass: RecordClass,

    /// Number of seconds the record may be cached for.  Zero means it
    /// must only be used for the transaction in progress.
    pub ttl: u32,

    pub rdata: Bytes,
    pub rdata_offset: usize,
}

/// What sort of query this is.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Opcode {
    Standard,
    Inverse,
    Status,
    Notify,
    Update,
    Dso,
    Reserved(OpcodeReserved),
}

/// A struct with a private constructor, to ensure invalid `Opcode`s
/// cannot be created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct OpcodeReserved(u8);

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let code = u8::from(*self);
        match mnemonics::opcode(code) {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "OPCODE{code}"),
        }
    }
}

impl From<u8> for Opcode {
    fn from(octet: u8) -> Self {
        match octet & 0b0000_1111 {
            0 => Opcode::Standard,
            1 => Opcode::Inverse,
            2 => Opcode::Status,
            4 => Opcode::Notify,
            5 => Opcode::Update,
            6 => Opcode::Dso,
            other => Opcode::Reserved(OpcodeReserved(other)),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(value: Opcode) -> Self {
        match value {
            Opcode::Standard => 0,
            Opcode::Inverse => 1,
            Opcode::Status => 2,
            Opcode::Notify => 4,
            Opcode::Update => 5,
            Opcode::Dso => 6,
            Opcode::Reserved(OpcodeReserved(octet)) => octet,
        }
    }
}

/// What sort of response this is.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Rcode {
    NoError,
    FormatError,
    ServerFailure,
    NameError,
    NotImplemented,
    Refused,
    YxDomain,
    YxRrSet,
    NxRrSet,
    NotAuth,
    NotZone,
    DsoTypeNotImplemented,
    Reserved(RcodeReserved),
}

/// A struct with a private constructor, to ensure invalid `Rcode`s
/// cannot be created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RcodeReserved(u8);

impl fmt::Display for Rcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let code = u8::from(*self);
        match mnemonics::rcode(code.into()) {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "RCODE{code}"),
        }
    }
}

impl From<u8> for Rcode {
    fn from(octet: u8) -> Self {
        match octet & 0b0000_1111 {
            0 => Rcode::NoError,
            1 => Rcode::FormatError,
            2 => Rcode::ServerFailure,
            3 => Rcode::NameError,
            4 => Rcode::NotImplemented,
            5 => Rcode::Refused,
            6 => Rcode::YxDomain,
            7 => Rcode::YxRrSet,
            8 => Rcode::NxRrSet,
            9 => Rcode::NotAuth,
            10 => Rcode::NotZone,
            11 => Rcode::DsoTypeNotImplemented,
            other => Rcode::Reserved(RcodeReserved(other)),
        }
    }
}

impl From<Rcode> for u8 {
    fn from(value: Rcode) -> Self {
        match value {
            Rcode::NoError => 0,
            Rcode::FormatError => 1,
            Rcode::ServerFailure => 2,
            Rcode::NameError => 3,
            Rcode::NotImplemented => 4,
            Rcode::Refused => 5,
            Rcode::YxDomain => 6,
            Rcode::YxRrSet => 7,
            Rcode::NxRrSet => 8,
            Rcode::NotAuth => 9,
            Rcode::NotZone => 10,
            Rcode::DsoTypeNotImplemented => 11,
            Rcode::Reserved(RcodeReserved(octet)) => octet,
        }
    }
}

/// A domain name is a sequence of labels, where each label is a
/// length octet followed by that number of octets.  The final label is
/// always the empty root label.
///
/// A label must be 63 octets or shorter.  A name must be 255 octets
/// or shorter in total, including both length and label octets.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct DomainName {
    pub(crate) labels: Vec<Label>,
    // INVARIANT: len == len(labels) + sum(map(len, labels))
    pub(crate) len: usize,
}

impl DomainName {
    pub fn root_domain() -> Self {
        DomainName {
            labels: vec![Label::new()],
            len: 1,
        }
    }

    /// The labels, ending with the empty root label.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Length of the uncompressed wire encoding, in octets.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_root(&self) -> bool {
        self.len == 1 && self.labels.first().is_some_and(Label::is_empty)
    }

    /// Presentation form, with a trailing dot.  `.` and `\` inside a
    /// label are backslash-escaped, and any octet which is not
    /// printable ASCII is written as `\DDD` (RFC 1035 section 5.1), so
    /// `from_dotted_string` gives back the same labels.
    pub fn to_dotted_string(&self) -> String {
        if self.is_root() {
            return ".".to_string();
        }

        let mut out = String::with_capacity(self.len);
        for label in &self.labels {
            for octet in label.octets() {
                match octet {
                    b'.' | b'\\' => {
                        out.push('\\');
                        out.push(char::from(*octet));
                    }
                    0x21..=0x7e => out.push(char::from(*octet)),
                    _ => out.push_str(&format!("\\{octet:03}")),
                }
            }
            if !label.is_empty() {
                out.push('.');
            }
        }

        out
    }

    /// Parse a hostname like `www.example.com`.  A trailing dot is
    /// optional, and empty labels are skipped.  `\DDD` and `\X`
    /// escapes are understood, so `to_dotted_string` round-trips.
    ///
    /// # Errors
    ///
    /// If there are no labels at all, if an escape is malformed, if a
    /// label is over 63 octets, or if the encoded name would be over
    /// 255 octets.
    pub fn from_dotted_string(s: &str) -> Result<Self, serialise::Error> {
        let octets = s.as_bytes();
        let mut labels = Vec::with_capacity(5);
        let mut current = Vec::with_capacity(LABEL_MAX_LEN);

        let mut position = 0;
        while let Some(&octet) = octets.get(position) {
            match octet {
                b'.' => {
                    push_dotted_label(&mut labels, &mut current)?;
                    position += 1;
                }
                b'\\' => {
                    let (unescaped, width) = unescape(octets, position)?;
                    current.push(unescaped);
                    position += width;
                }
                _ => {
                    current.push(octet);
                    position += 1;
                }
            }
        }
        push_dotted_label(&mut labels, &mut current)?;

        if labels.is_empty() {
            return Err(serialise::Error::EmptyHostname);
        }

        labels.push(Label::new());
        let len = labels.len() + labels.iter().map(Label::len).map(usize::from).sum::<usize>();

        if len <= DOMAINNAME_MAX_LEN {
            Ok(Self { labels, len })
        } else {
            Err(serialise::Error::NameEncodingTooLong {
                octets: len,
                limit: DOMAINNAME_MAX_LEN,
            })
        }
    }

    pub fn from_labels(labels: Vec<Label>) -> Option<Self> {
        if labels.is_empty() {
            return None;
        }

        let mut len = labels.len();
        let mut blank_label = false;

        for label in &labels {
            if blank_label {
                return None;
            }

            blank_label |= label.is_empty();
            len += label.len() as usize;
        }

        if blank_label && len <= DOMAINNAME_MAX_LEN {
            Some(Self { labels, len })
        } else {
            None
        }
    }
}

fn push_dotted_label(labels: &mut Vec<Label>, current: &mut Vec<u8>) -> Result<(), serialise::Error> {
    if current.is_empty() {
        return Ok(());
    }

    match Label::try_from(&current[..]) {
        Ok(label) => labels.push(label),
        Err(LabelTryFromOctetsError::TooLong) => {
            return Err(serialise::Error::NameEncodingTooLong {
                octets: current.len(),
                limit: LABEL_MAX_LEN,
            })
        }
    }
    current.clear();
    Ok(())
}

/// Decode the escape starting with the backslash at `position`,
/// returning the octet and how many input octets it took up.
fn unescape(octets: &[u8], position: usize) -> Result<(u8, usize), serialise::Error> {
    let invalid = serialise::Error::InvalidEscape { position };

    if let Some(digits) = octets.get(position + 1..position + 4) {
        if digits.iter().all(u8::is_ascii_digit) {
            let value = digits
                .iter()
                .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
            return u8::try_from(value).map(|o| (o, 4)).map_err(|_| invalid);
        }
    }

    match octets.get(position + 1) {
        Some(octet) => Ok((*octet, 2)),
        None => Err(invalid),
    }
}

impl fmt::Debug for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainName")
            .field("to_dotted_string()", &self.to_dotted_string())
            .finish()
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", &self.to_dotted_string())
    }
}

impl FromStr for DomainName {
    type Err = serialise::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DomainName::from_dotted_string(s)
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for DomainName {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let num_labels = u.int_in_range::<usize>(1..=10)?;
        let mut labels = Vec::with_capacity(num_labels + 1);
        for _ in 0..num_labels {
            labels.push(u.arbitrary()?);
        }
        labels.push(Label::new());
        DomainName::from_labels(labels).ok_or(arbitrary::Error::IncorrectFormat)
    }
}

/// A label is just a sequence of octets, no longer than 63.  Case is
/// preserved exactly as given.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Label {
    /// Private to this module so constructing an invalid `Label` is
    /// impossible.
    octets: Bytes,
}

impl Label {
    /// Create a new, empty, label.
    pub fn new() -> Self {
        Self {
            octets: Bytes::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn len(&self) -> u8 {
        // the `TryFrom` ensures a label is <= 63 octets
        self.octets.len() as u8
    }

    pub fn is_empty(&self) -> bool {
        self.octets.is_empty()
    }

    pub fn octets(&self) -> &Bytes {
        &self.octets
    }
}

impl Default for Label {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<&[u8]> for Label {
    type Error = LabelTryFromOctetsError;

    fn try_from(octets: &[u8]) -> Result<Self, Self::Error> {
        if octets.len() > LABEL_MAX_LEN {
            return Err(LabelTryFromOctetsError::TooLong);
        }

        Ok(Self {
            octets: Bytes::copy_from_slice(octets),
        })
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for Label {
    // only generates non-empty labels which survive a trip through a
    // dotted string
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Label> {
        let label_len = u.int_in_range::<u8>(1..=20)?;
        let octets = u
            .bytes(label_len.into())?
            .iter()
            .map(|b| {
                let ascii_byte = b % 128;
                if ascii_byte == b'.' || !ascii_byte.is_ascii_graphic() {
                    b'x'
                } else {
                    ascii_byte
                }
            })
            .collect::<Vec<u8>>();
        Ok(Self {
            octets: Bytes::from(octets),
        })
    }
}

/// Errors that can arise when converting a `[u8]` into a `Label`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LabelTryFromOctetsError {
    TooLong,
}

/// The TYPE of a resource record, or the QTYPE of a question (which
/// is a superset).  Any 16-bit code is representable; the well-known
/// ones have associated constants.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(any(feature = "test-util", test), derive(arbitrary::Arbitrary))]
pub struct RecordType(pub u16);

impl RecordType {
    pub const A: Self = Self(1);
    pub const NS: Self = Self(2);
    pub const MD: Self = Self(3);
    pub const MF: Self = Self(4);
    pub const CNAME: Self = Self(5);
    pub const SOA: Self = Self(6);
    pub const MB: Self = Self(7);
    pub const MG: Self = Self(8);
    pub const MR: Self = Self(9);
    pub const NULL: Self = Self(10);
    pub const WKS: Self = Self(11);
    pub const PTR: Self = Self(12);
    pub const HINFO: Self = Self(13);
    pub const MINFO: Self = Self(14);
    pub const MX: Self = Self(15);
    pub const TXT: Self = Self(16);
    pub const AAAA: Self = Self(28);
    pub const SRV: Self = Self(33);
    pub const DNAME: Self = Self(39);
    pub const OPT: Self = Self(41);
    pub const AXFR: Self = Self(252);
    pub const MAILB: Self = Self(253);
    pub const MAILA: Self = Self(254);
    pub const ANY: Self = Self(255);
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match mnemonics::qtype(self.0) {
            Some(name) if self.0 != 0 => write!(f, "{name}"),
            _ => write!(f, "TYPE{}", self.0),
        }
    }
}

impl FromStr for RecordType {
    type Err = RecordTypeFromStr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(code) = mnemonics::qtype_code(s) {
            return Ok(Self(code));
        }

        match s.get(..4) {
            Some(prefix) if prefix.eq_ignore_ascii_case("TYPE") => s[4..]
                .parse::<u16>()
                .map(Self)
                .map_err(|_| RecordTypeFromStr::BadType),
            _ => Err(RecordTypeFromStr::NoParse),
        }
    }
}

/// Errors that can arise when converting a `&str` into a `RecordType`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RecordTypeFromStr {
    BadType,
    NoParse,
}

impl fmt::Display for RecordTypeFromStr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordTypeFromStr::BadType => write!(f, "TYPE<num> number must be a u16"),
            RecordTypeFromStr::NoParse => write!(f, "could not parse string to type"),
        }
    }
}

impl std::error::Error for RecordTypeFromStr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl From<u16> for RecordType {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<RecordType> for u16 {
    fn from(value: RecordType) -> Self {
        value.0
    }
}

/// The CLASS of a resource record, or the QCLASS of a question.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(any(feature = "test-util", test), derive(arbitrary::Arbitrary))]
pub struct RecordClass(pub u16);

impl RecordClass {
    pub const IN: Self = Self(1);
    pub const CH: Self = Self(3);
    pub const HS: Self = Self(4);
    pub const NONE: Self = Self(254);
    pub const ANY: Self = Self(255);
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match mnemonics::qclass(self.0) {
            Some(name) if self.0 != 0 && self.0 != u16::MAX => write!(f, "{name}"),
            _ => write!(f, "CLASS{}", self.0),
        }
    }
}

impl FromStr for RecordClass {
    type Err = RecordClassFromStr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(code) = mnemonics::qclass_code(s) {
            return Ok(Self(code));
        }

        match s.get(..5) {
            Some(prefix) if prefix.eq_ignore_ascii_case("CLASS") => s[5..]
                .parse::<u16>()
                .map(Self)
                .map_err(|_| RecordClassFromStr::BadClass),
            _ => Err(RecordClassFromStr::NoParse),
        }
    }
}

/// Errors that can arise when converting a `&str` into a
/// `RecordClass`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RecordClassFromStr {
    BadClass,
    NoParse,
}

impl fmt::Display for RecordClassFromStr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordClassFromStr::BadClass => write!(f, "CLASS<num> number must be a u16"),
            RecordClassFromStr::NoParse => write!(f, "could not parse string to class"),
        }
    }
}

impl std::error::Error for RecordClassFromStr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl From<u16> for RecordClass {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<RecordClass> for u16 {
    fn from(value: RecordClass) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::test_util::*;
    use super::*;

    #[test]
    fn u8_opcode_roundtrip() {
        for i in 0..15 {
            assert_eq!(u8::from(Opcode::from(i)), i);
        }
    }

    #[test]
    fn u8_rcode_roundtrip() {
        for i in 0..15 {
            assert_eq!(u8::from(Rcode::from(i)), i);
        }
    }

    #[test]
    fn recordtype_display_fromstr_roundtrip() {
        for i in 1..300 {
            let rtype = RecordType(i);
            assert_eq!(Ok(rtype), rtype.to_string().parse());
        }
    }

    #[test]
    fn recordtype_display_unknown() {
        assert_eq!("A", RecordType::A.to_string());
        assert_eq!("TYPE54", RecordType(54).to_string());
        assert_eq!("TYPE0", RecordType(0).to_string());
        assert_eq!(Err(RecordTypeFromStr::NoParse), "BOGUS".parse::<RecordType>());
        assert_eq!(Err(RecordTypeFromStr::BadType), "TYPE70000".parse::<RecordType>());
    }

    #[test]
    fn recordclass_display_fromstr_roundtrip() {
        for i in 0..=u16::MAX {
            let rclass = RecordClass(i);
            assert_eq!(Ok(rclass), rclass.to_string().parse());
        }
    }

    #[test]
    fn flags_query() {
        assert_eq!([0b0000_0001, 0], Flags::query(true).octets());
        assert_eq!([0, 0], Flags::query(false).octets());
    }

    #[test]
    fn flags_each_bit_selects_one_field() {
        let cases: [(usize, u8, &str); 5] = [
            (0, HEADER_MASK_QR, "qr"),
            (0, HEADER_MASK_AA, "aa"),
            (0, HEADER_MASK_TC, "tc"),
            (0, HEADER_MASK_RD, "rd"),
            (1, HEADER_MASK_RA, "ra"),
        ];

        for (octet, mask, name) in cases {
            let mut octets = [0, 0];
            octets[octet] = mask;
            let flags = Flags::from_octets(octets);

            assert_eq!(name == "qr", flags.is_response(), "{name}");
            assert_eq!(name == "aa", flags.is_authoritative(), "{name}");
            assert_eq!(name == "tc", flags.is_truncated(), "{name}");
            assert_eq!(name == "rd", flags.recursion_desired(), "{name}");
            assert_eq!(name == "ra", flags.recursion_available(), "{name}");
            assert_eq!(Opcode::Standard, flags.opcode(), "{name}");
            assert_eq!(Rcode::NoError, flags.rcode(), "{name}");
            assert_eq!(0, flags.z(), "{name}");
        }
    }

    #[test]
    fn flags_fields() {
        let flags = Flags::from_octets([0b1010_1101, 0b1101_0011]);

        assert!(flags.is_response());
        assert_eq!(Opcode::Update, flags.opcode());
        assert!(flags.is_authoritative());
        assert!(!flags.is_truncated());
        assert!(flags.recursion_desired());
        assert!(flags.recursion_available());
        assert_eq!(0b101, flags.z());
        assert_eq!(Rcode::NameError, flags.rcode());
    }

    #[test]
    fn domainname_root_conversions() {
        assert_eq!(
            Some(DomainName::root_domain()),
            DomainName::from_labels(vec![Label::new()])
        );

        assert_eq!(".", DomainName::root_domain().to_dotted_string());
    }

    #[test]
    fn from_dotted_string_trailing_dot_optional() {
        assert_eq!(
            DomainName::from_dotted_string("www.example.com."),
            DomainName::from_dotted_string("www.example.com")
        );
        assert_eq!("www.example.com.", domain("www.example.com").to_dotted_string());
        assert_eq!(17, domain("www.example.com").len());
    }

    #[test]
    fn from_dotted_string_preserves_case() {
        assert_eq!("WwW.Example.COM.", domain("WwW.Example.COM").to_dotted_string());
    }

    #[test]
    fn from_dotted_string_skips_empty_labels() {
        assert_eq!(domain("a.b."), domain("a..b"));
    }

    #[test]
    fn from_dotted_string_empty() {
        assert_eq!(
            Err(serialise::Error::EmptyHostname),
            DomainName::from_dotted_string("")
        );
        assert_eq!(
            Err(serialise::Error::EmptyHostname),
            DomainName::from_dotted_string(".")
        );
    }

    #[test]
    fn from_dotted_string_label_too_long() {
        let ok = "a".repeat(63);
        let bad = "a".repeat(64);

        assert!(DomainName::from_dotted_string(&format!("{ok}.com")).is_ok());
        assert_eq!(
            Err(serialise::Error::NameEncodingTooLong {
                octets: 64,
                limit: LABEL_MAX_LEN
            }),
            DomainName::from_dotted_string(&format!("{bad}.com"))
        );
    }

    #[test]
    fn from_dotted_string_name_too_long() {
        // 4 * (1 + 62) + 1 = 253
        let label = "b".repeat(62);
        let fits = [label.as_str(); 4].join(".");
        assert_eq!(253, domain(&fits).len());

        // + (1 + 2) = 256
        assert_eq!(
            Err(serialise::Error::NameEncodingTooLong {
                octets: 256,
                limit: DOMAINNAME_MAX_LEN
            }),
            DomainName::from_dotted_string(&format!("{fits}.cc"))
        );
    }

    #[test]
    fn domainname_conversions() {
        let mut rng = rand::rng();
        for _ in 0..100 {
            let labels_len = rng.random_range(1..5);

            let mut dotted_string_input = String::new();
            let mut labels_input = Vec::with_capacity(labels_len);

            for i in 0..labels_len {
                let label_len = rng.random_range(1..10);

                if i > 0 {
                    dotted_string_input.push('.');
                }

                let mut octets = Vec::with_capacity(label_len);
                for _ in 0..label_len {
                    let mut chr = rng.random_range(33..127);
                    if chr == b'.' || chr == b'\\' {
                        chr = b'X';
                    }

                    octets.push(chr);
                    dotted_string_input.push(chr as char);
                }
                labels_input.push(Label::try_from(&octets[..]).unwrap());
            }

            labels_input.push(Label::new());

            let expected = format!("{dotted_string_input}.");

            assert_eq!(
                Ok(expected.clone()),
                DomainName::from_dotted_string(&dotted_string_input).map(|d| d.to_dotted_string())
            );

            assert_eq!(
                Some(expected),
                DomainName::from_labels(labels_input).map(|d| d.to_dotted_string())
            );
        }
    }

    #[test]
    fn dotted_string_escapes_non_ascii() {
        let name = domain("bücher.de");

        assert_eq!("bücher".as_bytes(), &name.labels()[0].octets()[..]);
        assert_eq!(3, name.labels().len());
        assert_eq!("b\\195\\188cher.de.", name.to_dotted_string());
        assert_eq!(Ok(name.clone()), name.to_dotted_string().parse());
    }

    #[test]
    fn dotted_string_escapes_dot_in_label() {
        let name = DomainName::from_labels(vec![
            Label::try_from(&b"a.b"[..]).unwrap(),
            Label::try_from(&b"com"[..]).unwrap(),
            Label::new(),
        ])
        .unwrap();

        assert_eq!("a\\.b.com.", name.to_dotted_string());
        assert_eq!(Ok(name.clone()), name.to_dotted_string().parse());
        assert_eq!(name, domain("a\\046b.com"));
    }

    #[test]
    fn dotted_string_escapes_backslash_and_space() {
        let name = DomainName::from_labels(vec![
            Label::try_from(&b"x\\ y"[..]).unwrap(),
            Label::new(),
        ])
        .unwrap();

        assert_eq!("x\\\\\\032y.", name.to_dotted_string());
        assert_eq!(Ok(name.clone()), name.to_dotted_string().parse());
    }

    #[test]
    fn from_dotted_string_bad_escape() {
        assert_eq!(
            Err(serialise::Error::InvalidEscape { position: 3 }),
            DomainName::from_dotted_string("abc\\")
        );
        assert_eq!(
            Err(serialise::Error::InvalidEscape { position: 0 }),
            DomainName::from_dotted_string("\\256.com")
        );
    }

    #[test]
    fn is_root_only_for_root() {
        assert!(DomainName::root_domain().is_root());
        assert!(!domain("com").is_root());
    }

    #[test]
    fn arbitrary_domainname_survives_dotted_string() {
        for _ in 0..100 {
            let name = arbitrary_domainname();
            assert_eq!(Ok(name.clone()), name.to_dotted_string().parse());
        }
    }
}

#[cfg(any(feature = "test-util", test))]
#[allow(clippy::missing_panics_doc)]
pub mod test_util {
    use super::*;

    use arbitrary::{Arbitrary, Unstructured};
    use rand::Rng;
    use std::net::Ipv4Addr;

    pub fn arbitrary_domainname() -> DomainName {
        let mut rng = rand::rng();
        for size in [128, 256, 512, 1024] {
            let buf = (0..size).map(|_| rng.random()).collect::<Vec<u8>>();

            if let Ok(name) = DomainName::arbitrary(&mut Unstructured::new(&buf)) {
                return name;
            }
        }

        panic!("could not generate arbitrary value!");
    }

    pub fn domain(name: &str) -> DomainName {
        DomainName::from_dotted_string(name).unwrap()
    }

    pub fn a_record(name: &str, address: Ipv4Addr) -> ResourceRecord {
        ResourceRecord {
            name: domain(name),
            rtype: RecordType::A,
            rclass: RecordClass::IN,
            ttl: 300,
            rdata: Bytes::copy_from_slice(&address.octets()),
            rdata_offset: 0,
        }
    }

    pub fn unknown_record(name: &str, octets: &[u8]) -> ResourceRecord {
        ResourceRecord {
            name: domain(name),
            rtype: RecordType(100),
            rclass: RecordClass::IN,
            ttl: 300,
            rdata: Bytes::copy_from_slice(octets),
            rdata_offset: 0,
        }
    }
}
