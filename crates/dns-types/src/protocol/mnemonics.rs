//! Presentation names for the numeric codes which appear on the wire.
//!
//! These tables are only used for display and for parsing user input:
//! the codec itself works entirely in terms of the numeric codes.
//! Each table is sorted by code, so lookups are a binary search.

/// Resource record types (and the query-only types), from the IANA
/// "Resource Record (RR) TYPEs" registry.
pub static QTYPES: &[(u16, &str)] = &[
    (0, "RESERVED"),
    (1, "A"),
    (2, "NS"),
    (3, "MD"),
    (4, "MF"),
    (5, "CNAME"),
    (6, "SOA"),
    (7, "MB"),
    (8, "MG"),
    (9, "MR"),
    (10, "NULL"),
    (11, "WKS"),
    (12, "PTR"),
    (13, "HINFO"),
    (14, "MINFO"),
    (15, "MX"),
    (16, "TXT"),
    (17, "RP"),
    (18, "AFSDB"),
    (19, "X25"),
    (20, "ISDN"),
    (21, "RT"),
    (22, "NSAP"),
    (23, "NSAP_PTR"),
    (24, "SIG"),
    (25, "KEY"),
    (26, "PX"),
    (27, "GPOS"),
    (28, "AAAA"),
    (29, "LOC"),
    (30, "NXT"),
    (31, "EID"),
    (32, "NIMLOC"),
    (33, "SRV"),
    (34, "ATMA"),
    (35, "NAPTR"),
    (36, "KX"),
    (37, "CERT"),
    (38, "A6"),
    (39, "DNAME"),
    (40, "SINK"),
    (41, "OPT"),
    (42, "APL"),
    (43, "DS"),
    (44, "SSHFP"),
    (45, "IPSECKEY"),
    (46, "RRSIG"),
    (47, "NSEC"),
    (48, "DNSKEY"),
    (49, "DHCID"),
    (50, "NSEC3"),
    (51, "NSEC3_PARAM"),
    (52, "TLSA"),
    (53, "SMIMEA"),
    (55, "HIP"),
    (56, "NINFO"),
    (57, "RKEY"),
    (58, "TALINK"),
    (59, "CDS"),
    (60, "CDNSKEY"),
    (61, "OPENPGPKEY"),
    (62, "CSYNC"),
    (63, "ZONEMD"),
    (64, "SVCB"),
    (65, "HTTPS"),
    (99, "SPF"),
    (100, "UINFO"),
    (101, "UID"),
    (102, "GID"),
    (103, "UNSPEC"),
    (104, "NID"),
    (105, "L32"),
    (106, "L64"),
    (107, "LP"),
    (108, "EUI48"),
    (109, "EUI64"),
    (249, "TKEY"),
    (250, "TSIG"),
    (251, "IXFR"),
    (252, "AXFR"),
    (253, "MAILB"),
    (254, "MAILA"),
    (255, "ANY"),
    (256, "URI"),
    (257, "CAA"),
    (258, "AVC"),
    (259, "DOA"),
    (260, "AMTRELAY"),
    (32768, "TA"),
    (32769, "DLV"),
];

/// Classes, from the IANA "DNS CLASSes" registry.
pub static QCLASSES: &[(u16, &str)] = &[
    (0, "RESERVED"),
    (1, "IN"),
    (3, "CH"),
    (4, "HS"),
    (254, "NONE"),
    (255, "ANY"),
    (65535, "RESERVED"),
];

/// Header opcodes.  Opcode 1 (inverse query) is obsolete but still
/// named.
pub static OPCODES: &[(u8, &str)] = &[
    (0, "QUERY"),
    (1, "INVERSE"),
    (2, "STATUS"),
    (4, "NOTIFY"),
    (5, "UPDATE"),
    (6, "DSO"),
];

/// Response codes.  Only codes 0 to 15 fit in the header; the rest are
/// extended codes carried by EDNS and TSIG, named here so that callers
/// which reconstruct them can display them.
pub static RCODES: &[(u16, &str)] = &[
    (0, "NOERROR"),
    (1, "FORMERR"),
    (2, "SERVFAIL"),
    (3, "NXDOMAIN"),
    (4, "NOTIMP"),
    (5, "REFUSED"),
    (6, "YXDOMAIN"),
    (7, "YXRRSET"),
    (8, "NXRRSET"),
    (9, "NOTAUTH"),
    (10, "NOTZONE"),
    (11, "DSOTYPENI"),
    (16, "BADSIG"),
    (17, "BADKEY"),
    (18, "BADTIME"),
    (19, "BADMODE"),
    (20, "BADNAME"),
    (21, "BADALG"),
    (22, "BADTRUNC"),
    (23, "BADCOOKIE"),
];

pub fn qtype(code: u16) -> Option<&'static str> {
    lookup(QTYPES, code)
}

pub fn qclass(code: u16) -> Option<&'static str> {
    lookup(QCLASSES, code)
}

pub fn opcode(code: u8) -> Option<&'static str> {
    lookup(OPCODES, code)
}

pub fn rcode(code: u16) -> Option<&'static str> {
    lookup(RCODES, code)
}

/// Reverse of `qtype`, ignoring ASCII case.  `RESERVED` is not
/// accepted, as it does not name a single code.
pub fn qtype_code(name: &str) -> Option<u16> {
    reverse_lookup(QTYPES, name)
}

/// Reverse of `qclass`, ignoring ASCII case.
pub fn qclass_code(name: &str) -> Option<u16> {
    reverse_lookup(QCLASSES, name)
}

fn lookup<T: Ord + Copy>(table: &'static [(T, &'static str)], code: T) -> Option<&'static str> {
    table
        .binary_search_by_key(&code, |(c, _)| *c)
        .ok()
        .map(|i| table[i].1)
}

fn reverse_lookup(table: &'static [(u16, &'static str)], name: &str) -> Option<u16> {
    if name.eq_ignore_ascii_case("RESERVED") {
        return None;
    }

    table
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
        .map(|(c, _)| *c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_sorted<T: Ord + Copy>(table: &[(T, &str)]) -> bool {
        table.windows(2).all(|w| w[0].0 < w[1].0)
    }

    #[test]
    fn tables_are_sorted() {
        assert!(is_sorted(QTYPES));
        assert!(is_sorted(QCLASSES));
        assert!(is_sorted(OPCODES));
        assert!(is_sorted(RCODES));
    }

    #[test]
    fn lookup_known_codes() {
        assert_eq!(Some("A"), qtype(1));
        assert_eq!(Some("AAAA"), qtype(28));
        assert_eq!(Some("DLV"), qtype(32769));
        assert_eq!(Some("IN"), qclass(1));
        assert_eq!(Some("QUERY"), opcode(0));
        assert_eq!(Some("NXDOMAIN"), rcode(3));
        assert_eq!(Some("BADCOOKIE"), rcode(23));
    }

    #[test]
    fn lookup_unassigned_codes() {
        assert_eq!(None, qtype(54));
        assert_eq!(None, qclass(2));
        assert_eq!(None, opcode(3));
        assert_eq!(None, rcode(12));
    }

    #[test]
    fn reverse_lookup_ignores_case() {
        assert_eq!(Some(28), qtype_code("aaaa"));
        assert_eq!(Some(15), qtype_code("MX"));
        assert_eq!(Some(3), qclass_code("ch"));
        assert_eq!(None, qtype_code("NOTATYPE"));
        assert_eq!(None, qclass_code("reserved"));
    }
}
