use bytes::Bytes;
use clap::Parser;
use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::process;
use tracing_subscriber::EnvFilter;

use dns_types::protocol::deserialise;
use dns_types::protocol::types::{DomainName, Message, Question, RecordClass, RecordType};

mod render;
mod transport;

// the doc comments for this struct turn into the CLI help text
#[derive(Parser)]
/// DNS lookup utility
///
/// Sends a single query for a domain to a nameserver over UDP, and
/// prints the response.  Set RUST_LOG=debug to see what is sent and
/// received.
struct Args {
    /// Domain name to resolve
    #[clap(value_parser)]
    domain: DomainName,

    /// Query type to resolve
    #[clap(default_value_t = RecordType::A, value_parser)]
    qtype: RecordType,

    /// Nameserver to send the query to
    #[clap(short, long, value_parser, env = "DNSQ_NAMESERVER", default_value_t = IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)))]
    nameserver: IpAddr,

    /// Port the nameserver listens on
    #[clap(short, long, value_parser, env = "DNSQ_PORT", default_value_t = 53)]
    port: u16,

    /// Clear the recursion desired flag
    #[clap(long, action(clap::ArgAction::SetTrue))]
    no_recurse: bool,

    /// Also print a hex dump of the response
    #[clap(long, action(clap::ArgAction::SetTrue))]
    raw: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let id = rand::random();
    let question = Question {
        name: args.domain,
        qtype: args.qtype,
        qclass: RecordClass::IN,
    };
    let query = Message::query_for(id, &question, !args.no_recurse);
    let nameserver = SocketAddr::new(args.nameserver, args.port);

    println!(";; query for {question} to {nameserver}");

    let octets = match query_nameserver(nameserver, &query).await {
        Ok(octets) => octets,
        Err(err) => fail(&err),
    };

    if args.raw {
        println!(";; {} octets", octets.len());
        print!("{}", render::hex_dump(&octets));
    }

    let response = match decode_response(&octets, id) {
        Ok(response) => response,
        Err(err) => fail(&err),
    };

    print!("{}", render::render_message(&response, &octets));
}

fn fail(err: &LookupError) -> ! {
    eprintln!("{err}");
    process::exit(1);
}

async fn query_nameserver(nameserver: SocketAddr, query: &[u8]) -> Result<Bytes, LookupError> {
    transport::query_udp(nameserver, query)
        .await
        .map_err(|error| {
            tracing::error!(%nameserver, ?error, "could not query nameserver");
            LookupError::Transport { nameserver, error }
        })
}

/// Decode a response and check it answers the query with ID `id`.
fn decode_response(octets: &[u8], id: u16) -> Result<Message, LookupError> {
    let response = Message::from_octets(octets).map_err(LookupError::Decode)?;

    let actual = response.header().id;
    if actual != id {
        tracing::warn!(expected = %id, %actual, "response ID does not match query");
        return Err(LookupError::IdMismatch {
            expected: id,
            actual,
        });
    }

    Ok(response)
}

/// Why a lookup failed.
#[derive(Debug)]
enum LookupError {
    Transport {
        nameserver: SocketAddr,
        error: io::Error,
    },
    Decode(deserialise::Error),
    IdMismatch {
        expected: u16,
        actual: u16,
    },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LookupError::Transport { nameserver, error } => {
                write!(f, "could not query nameserver {nameserver}: {error}")
            }
            LookupError::Decode(error) => write!(f, "could not decode response: {error}"),
            LookupError::IdMismatch { expected, actual } => write!(
                f,
                "response ID {actual} does not match query ID {expected}"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use dns_types::protocol::serialise::WritableBuffer;
    use dns_types::protocol::types::Header;

    fn response(id: u16) -> Vec<u8> {
        let mut buf = WritableBuffer::default();
        Header::query(id, true).serialise(&mut buf);
        buf.octets.to_vec()
    }

    #[test]
    fn decode_response_accepts_matching_id() {
        let response = decode_response(&response(7), 7).unwrap();

        assert_eq!(7, response.header().id);
    }

    #[test]
    fn decode_response_rejects_other_id() {
        let err = decode_response(&response(8), 7).unwrap_err();

        assert!(matches!(
            err,
            LookupError::IdMismatch {
                expected: 7,
                actual: 8
            }
        ));
        assert_eq!("response ID 8 does not match query ID 7", err.to_string());
    }

    #[test]
    fn decode_response_rejects_garbage() {
        let err = decode_response(&[1, 2, 3], 7).unwrap_err();

        assert!(matches!(err, LookupError::Decode(_)));
        assert!(err.to_string().starts_with("could not decode response: "));
    }

    #[tokio::test]
    async fn query_nameserver_reports_transport_failure() {
        // over the 65507-octet limit for a UDP payload over IPv4, so
        // sending fails before anything reaches the network
        let nameserver: SocketAddr = "127.0.0.1:53".parse().unwrap();
        let query = vec![0u8; transport::MAX_DATAGRAM_LEN];

        let err = query_nameserver(nameserver, &query).await.unwrap_err();

        assert!(matches!(err, LookupError::Transport { .. }));
        assert!(err
            .to_string()
            .starts_with("could not query nameserver 127.0.0.1:53: "));
    }
}
