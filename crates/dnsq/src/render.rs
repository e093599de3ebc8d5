//! Human-readable output for decoded messages.
//!
//! The codec leaves RDATA as raw octets: this is where it gets
//! interpreted, by looking up a `RdataRenderer` for the record type.

use std::fmt::Write;
use std::net::{Ipv4Addr, Ipv6Addr};

use dns_types::protocol::deserialise::ConsumableBuffer;
use dns_types::protocol::types::*;

/// Render a whole message, `dig`-style.  `octets` must be the datagram
/// the message was decoded from, as names inside RDATA may be
/// compressed against it.
pub fn render_message(message: &Message, octets: &[u8]) -> String {
    let header = message.header();
    let flags = header.flags;

    let mut out = String::new();
    let _ = writeln!(
        out,
        ";; opcode: {}, status: {}, id: {}",
        flags.opcode(),
        flags.rcode(),
        header.id
    );

    let mut flag_names = String::from(";; flags:");
    for (set, name) in [
        (flags.is_response(), " qr"),
        (flags.is_authoritative(), " aa"),
        (flags.is_truncated(), " tc"),
        (flags.recursion_desired(), " rd"),
        (flags.recursion_available(), " ra"),
    ] {
        if set {
            flag_names.push_str(name);
        }
    }
    let _ = writeln!(
        out,
        "{flag_names}; QUERY: {}, ANSWER: {}, AUTHORITY: {}, ADDITIONAL: {}",
        header.qdcount, header.ancount, header.nscount, header.arcount
    );

    if !message.questions().is_empty() {
        let _ = writeln!(out, "\n;; QUESTION");
        for question in message.questions() {
            let _ = writeln!(
                out,
                "{}\t\t{}\t{}",
                question.name, question.qclass, question.qtype
            );
        }
    }

    for (heading, section) in [
        ("ANSWER", Section::Answer),
        ("AUTHORITY", Section::Authority),
        ("ADDITIONAL", Section::Additional),
    ] {
        let rrs = message.section(section);
        if rrs.is_empty() {
            continue;
        }

        let _ = writeln!(out, "\n;; {heading}");
        for rr in rrs {
            let _ = writeln!(out, "{}", render_record(rr, octets));
        }
    }

    out
}

pub fn render_record(rr: &ResourceRecord, octets: &[u8]) -> String {
    let rdata = renderer_for(rr.rtype)
        .render(rr, octets)
        .unwrap_or_else(|| Generic.render(rr, octets).unwrap_or_default());

    format!(
        "{}\t{}\t{}\t{}\t{}",
        rr.name, rr.ttl, rr.rclass, rr.rtype, rdata
    )
}

/// Presentation format for the RDATA of one kind of record.
pub trait RdataRenderer {
    /// `None` if the RDATA is not well-formed for this type.
    fn render(&self, rr: &ResourceRecord, octets: &[u8]) -> Option<String>;
}

pub fn renderer_for(rtype: RecordType) -> &'static dyn RdataRenderer {
    match rtype {
        RecordType::A => &Ipv4Address,
        RecordType::AAAA => &Ipv6Address,
        RecordType::NS
        | RecordType::MD
        | RecordType::MF
        | RecordType::CNAME
        | RecordType::MB
        | RecordType::MG
        | RecordType::MR
        | RecordType::PTR
        | RecordType::DNAME => &SingleName,
        RecordType::MX => &MailExchange,
        RecordType::SOA => &StartOfAuthority,
        RecordType::TXT => &CharacterStrings,
        _ => &Generic,
    }
}

struct Ipv4Address;

impl RdataRenderer for Ipv4Address {
    fn render(&self, rr: &ResourceRecord, _octets: &[u8]) -> Option<String> {
        let address: [u8; 4] = rr.rdata[..].try_into().ok()?;
        Some(Ipv4Addr::from(address).to_string())
    }
}

struct Ipv6Address;

impl RdataRenderer for Ipv6Address {
    fn render(&self, rr: &ResourceRecord, _octets: &[u8]) -> Option<String> {
        let address: [u8; 16] = rr.rdata[..].try_into().ok()?;
        Some(Ipv6Addr::from(address).to_string())
    }
}

struct SingleName;

impl RdataRenderer for SingleName {
    fn render(&self, rr: &ResourceRecord, octets: &[u8]) -> Option<String> {
        let mut buffer = rdata_buffer(rr, octets)?;
        let name = DomainName::deserialise(&mut buffer).ok()?;
        consumed_exactly(rr, &buffer)?;
        Some(name.to_string())
    }
}

struct MailExchange;

impl RdataRenderer for MailExchange {
    fn render(&self, rr: &ResourceRecord, octets: &[u8]) -> Option<String> {
        let mut buffer = rdata_buffer(rr, octets)?;
        let preference = buffer.next_u16().ok()?;
        let exchange = DomainName::deserialise(&mut buffer).ok()?;
        consumed_exactly(rr, &buffer)?;
        Some(format!("{preference} {exchange}"))
    }
}

struct StartOfAuthority;

impl RdataRenderer for StartOfAuthority {
    fn render(&self, rr: &ResourceRecord, octets: &[u8]) -> Option<String> {
        let mut buffer = rdata_buffer(rr, octets)?;
        let mname = DomainName::deserialise(&mut buffer).ok()?;
        let rname = DomainName::deserialise(&mut buffer).ok()?;
        let serial = buffer.next_u32().ok()?;
        let refresh = buffer.next_u32().ok()?;
        let retry = buffer.next_u32().ok()?;
        let expire = buffer.next_u32().ok()?;
        let minimum = buffer.next_u32().ok()?;
        consumed_exactly(rr, &buffer)?;
        Some(format!(
            "{mname} {rname} {serial} {refresh} {retry} {expire} {minimum}"
        ))
    }
}

struct CharacterStrings;

impl RdataRenderer for CharacterStrings {
    fn render(&self, rr: &ResourceRecord, _octets: &[u8]) -> Option<String> {
        let mut strings = Vec::new();
        let mut rest = &rr.rdata[..];
        while let Some((len, tail)) = rest.split_first() {
            let len = usize::from(*len);
            if tail.len() < len {
                return None;
            }
            strings.push(quote_character_string(&tail[..len]));
            rest = &tail[len..];
        }
        Some(strings.join(" "))
    }
}

/// RFC 3597 generic form: `\# <length> <hex>`.
struct Generic;

impl RdataRenderer for Generic {
    fn render(&self, rr: &ResourceRecord, _octets: &[u8]) -> Option<String> {
        if rr.rdata.is_empty() {
            return Some("\\# 0".to_string());
        }

        let mut out = format!("\\# {} ", rr.rdata.len());
        for octet in &rr.rdata {
            let _ = write!(out, "{octet:02x}");
        }
        Some(out)
    }
}

/// A cursor over the full message, positioned at the start of the
/// record's RDATA.
fn rdata_buffer<'a>(rr: &ResourceRecord, octets: &'a [u8]) -> Option<ConsumableBuffer<'a>> {
    let rdata_stop = rr.rdata_offset.checked_add(rr.rdata.len())?;
    if octets.get(rr.rdata_offset..rdata_stop)? != &rr.rdata[..] {
        return None;
    }
    Some(ConsumableBuffer::new(octets).at_offset(rr.rdata_offset))
}

fn consumed_exactly(rr: &ResourceRecord, buffer: &ConsumableBuffer) -> Option<()> {
    if buffer.position() == rr.rdata_offset + rr.rdata.len() {
        Some(())
    } else {
        None
    }
}

fn quote_character_string(octets: &[u8]) -> String {
    let mut out = String::with_capacity(octets.len() + 2);
    out.push('"');
    for octet in octets {
        match octet {
            b'"' | b'\\' => {
                out.push('\\');
                out.push(*octet as char);
            }
            0x20..=0x7e => out.push(*octet as char),
            _ => {
                let _ = write!(out, "\\{octet:03}");
            }
        }
    }
    out.push('"');
    out
}

/// Offset-annotated hex dump, 16 octets per line.
pub fn hex_dump(octets: &[u8]) -> String {
    let mut out = String::new();
    for (i, chunk) in octets.chunks(16).enumerate() {
        let _ = write!(out, "{:04x} ", i * 16);
        for octet in chunk {
            let _ = write!(out, " {octet:02x}");
        }
        out.push('\n');
    }
    out
}
