use bytes::Bytes;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;

/// Size of the receive buffer: the largest possible UDP payload.
pub const MAX_DATAGRAM_LEN: usize = 65536;

/// Send a serialised query to a nameserver over UDP and wait for the
/// first datagram back from it.
///
/// Datagrams from any other peer are dropped.  There is no timeout
/// and no retry.
///
/// # Errors
///
/// If the socket cannot be bound, or sending or receiving fails.
pub async fn query_udp(nameserver: SocketAddr, query: &[u8]) -> io::Result<Bytes> {
    let local: SocketAddr = if nameserver.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let sock = UdpSocket::bind(local).await?;
    sock.send_to(query, nameserver).await?;
    tracing::debug!(%nameserver, length = %query.len(), "sent query");

    let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
    loop {
        let (size, peer) = sock.recv_from(&mut buf).await?;
        if peer == nameserver {
            tracing::debug!(%peer, length = %size, "got response");
            buf.truncate(size);
            return Ok(Bytes::from(buf));
        }

        tracing::debug!(%peer, length = %size, "dropping datagram from unexpected peer");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_the_nameserver_reply() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let nameserver = server.local_addr().unwrap();

        let responder = tokio::spawn(async move {
            let mut buf = [0u8; 512];
            let (size, peer) = server.recv_from(&mut buf).await.unwrap();

            // a stray datagram from somebody else first
            let stranger = UdpSocket::bind("127.0.0.1:0").await.unwrap();
            stranger.send_to(b"not me", peer).await.unwrap();

            let mut reply = buf[..size].to_vec();
            reply.extend_from_slice(b"!");
            server.send_to(&reply, peer).await.unwrap();
        });

        let response = query_udp(nameserver, b"hello").await.unwrap();
        responder.await.unwrap();

        assert_eq!(&b"hello!"[..], &response[..]);
    }
}
