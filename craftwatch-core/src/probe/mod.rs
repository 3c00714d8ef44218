// File: src/probe/mod.rs
//
// One bounded-time Server List Ping per endpoint. The probe never errors
// out to its caller: any failure — DNS, refused connection, timeout,
// protocol garbage — collapses to an offline-shaped result so a single
// unreachable endpoint cannot abort the cycle for the others.

pub mod protocol;

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::models::{EndpointSpec, ProbeResult};
use crate::Error;

/// Upper bound on a whole probe (connect + status + ping), well under the
/// refresh interval.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Probes one endpoint. Infallible by contract; failures surface only as
/// `online = false` in the result.
pub async fn probe(spec: &EndpointSpec) -> ProbeResult {
    match timeout(PROBE_TIMEOUT, query_endpoint(spec)).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            debug!("probe of '{}' failed: {e}", spec.name);
            ProbeResult::offline(&spec.name)
        }
        Err(_) => {
            debug!("probe of '{}' timed out after {PROBE_TIMEOUT:?}", spec.name);
            ProbeResult::offline(&spec.name)
        }
    }
}

async fn query_endpoint(spec: &EndpointSpec) -> Result<ProbeResult, Error> {
    let mut stream = TcpStream::connect((spec.host.as_str(), spec.port)).await?;
    let (status, latency_ms) = protocol::status_query(&mut stream, &spec.host, spec.port).await?;

    Ok(ProbeResult {
        endpoint_name: spec.name.clone(),
        online: true,
        latency_ms,
        players_online: status.players.online,
        players_max: status.players.max,
    })
}

#[cfg(test)]
mod tests {
    use super::protocol::{
        read_packet, read_varint, write_packet, write_string, write_varint, PACKET_PING,
        PACKET_STATUS,
    };
    use super::*;
    use crate::models::PopulationSemantics;
    use tokio::net::TcpListener;

    fn spec(name: &str, host: &str, port: u16) -> EndpointSpec {
        EndpointSpec {
            name: name.to_string(),
            host: host.to_string(),
            port,
            population: PopulationSemantics::PerServer,
        }
    }

    /// Accepts one connection and speaks the server side of the status
    /// exchange with a canned player count.
    async fn run_fake_server(listener: TcpListener, json: String) {
        let (mut socket, _) = listener.accept().await.unwrap();

        // Handshake, then the empty status request.
        let _handshake = read_packet(&mut socket).await.unwrap();
        let _request = read_packet(&mut socket).await.unwrap();

        let mut body = Vec::new();
        write_varint(&mut body, PACKET_STATUS);
        write_string(&mut body, &json);
        write_packet(&mut socket, &body).await.unwrap();

        // Echo the ping token back as the pong.
        let ping = read_packet(&mut socket).await.unwrap();
        let mut cursor: &[u8] = &ping;
        let id = read_varint(&mut cursor).await.unwrap();
        assert_eq!(id, PACKET_PING);
        write_packet(&mut socket, &ping).await.unwrap();
    }

    #[tokio::test]
    async fn probe_reads_player_counts_from_live_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(run_fake_server(
            listener,
            r#"{"players":{"online":7,"max":40},"version":{"name":"1.21"}}"#.to_string(),
        ));

        let result = probe(&spec("Lobby", "127.0.0.1", port)).await;
        server.await.unwrap();

        assert!(result.online);
        assert_eq!(result.endpoint_name, "Lobby");
        assert_eq!(result.players_online, 7);
        assert_eq!(result.players_max, 40);
    }

    #[tokio::test]
    async fn refused_connection_collapses_to_offline_shape() {
        // Bind-then-drop guarantees a port nothing is listening on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = probe(&spec("Survival", "127.0.0.1", port)).await;

        assert_eq!(result, ProbeResult::offline("Survival"));
    }

    #[tokio::test]
    async fn protocol_garbage_collapses_to_offline_shape() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _ = read_packet(&mut socket).await;
            let _ = read_packet(&mut socket).await;
            // Valid framing, wrong packet id.
            let mut body = Vec::new();
            write_varint(&mut body, 0x7f);
            let _ = write_packet(&mut socket, &body).await;
        });

        let result = probe(&spec("Lobby", "127.0.0.1", port)).await;
        server.await.unwrap();

        assert_eq!(result, ProbeResult::offline("Lobby"));
    }

    #[tokio::test]
    async fn unresolvable_host_collapses_to_offline_shape() {
        let result = probe(&spec("Ghost", "does-not-exist.invalid", 25565)).await;
        assert_eq!(result, ProbeResult::offline("Ghost"));
    }
}
