// File: src/probe/protocol.rs
//
// Minimal Server List Ping client: length-prefixed packets with
// VarInt-encoded ints, a handshake/status exchange for the JSON status
// document, and a ping/pong exchange for latency.

use std::time::Instant;

use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::Error;

/// Status protocol packet ids (clientbound and serverbound share them).
pub const PACKET_STATUS: i32 = 0x00;
pub const PACKET_PING: i32 = 0x01;

/// Handshake "next state" selector for a status query.
const NEXT_STATE_STATUS: i32 = 1;

/// VarInts are at most 5 bytes of 7 payload bits each.
const VARINT_MAX_BYTES: usize = 5;

pub fn write_varint(buf: &mut Vec<u8>, value: i32) {
    let mut remaining = value as u32;
    loop {
        let byte = (remaining & 0x7f) as u8;
        remaining >>= 7;
        if remaining == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

pub async fn read_varint<R: AsyncRead + Unpin>(reader: &mut R) -> Result<i32, Error> {
    let mut value: u32 = 0;
    for i in 0..VARINT_MAX_BYTES {
        let byte = reader.read_u8().await?;
        value |= ((byte & 0x7f) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(Error::Protocol("VarInt longer than 5 bytes".into()))
}

pub fn write_string(buf: &mut Vec<u8>, s: &str) {
    write_varint(buf, s.len() as i32);
    buf.extend_from_slice(s.as_bytes());
}

/// Frames `body` (packet id already included) with its VarInt length and
/// writes it out.
pub async fn write_packet<W: AsyncWrite + Unpin>(
    writer: &mut W,
    body: &[u8],
) -> Result<(), Error> {
    let mut framed = Vec::with_capacity(body.len() + VARINT_MAX_BYTES);
    write_varint(&mut framed, body.len() as i32);
    framed.extend_from_slice(body);
    writer.write_all(&framed).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one length-prefixed packet and returns its body (id + payload).
pub async fn read_packet<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, Error> {
    let len = read_varint(reader).await?;
    if len < 0 || len > 1 << 21 {
        return Err(Error::Protocol(format!("bad packet length {len}")));
    }
    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

/// The slice of the status JSON document we care about. Servers include
/// more (version, favicon, MOTD); everything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub players: PlayerStatus,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PlayerStatus {
    #[serde(default)]
    pub online: u32,
    #[serde(default)]
    pub max: u32,
}

fn handshake_body(host: &str, port: u16) -> Vec<u8> {
    let mut body = Vec::new();
    write_varint(&mut body, PACKET_STATUS);
    // Protocol version -1: status-only client, no version negotiation.
    write_varint(&mut body, -1);
    write_string(&mut body, host);
    body.extend_from_slice(&port.to_be_bytes());
    write_varint(&mut body, NEXT_STATE_STATUS);
    body
}

/// Runs the full status exchange on an established connection and returns
/// the parsed status document plus the ping round-trip in whole ms.
pub async fn status_query<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
    host: &str,
    port: u16,
) -> Result<(StatusResponse, u32), Error> {
    write_packet(stream, &handshake_body(host, port)).await?;

    let mut request = Vec::new();
    write_varint(&mut request, PACKET_STATUS);
    write_packet(stream, &request).await?;

    let body = read_packet(stream).await?;
    let mut cursor: &[u8] = &body;
    let packet_id = read_varint(&mut cursor).await?;
    if packet_id != PACKET_STATUS {
        return Err(Error::Protocol(format!(
            "expected status response, got packet id {packet_id}"
        )));
    }
    let json_len = read_varint(&mut cursor).await?;
    if json_len < 0 || json_len as usize > cursor.len() {
        return Err(Error::Protocol(format!("bad status length {json_len}")));
    }
    let status: StatusResponse = serde_json::from_slice(&cursor[..json_len as usize])?;

    let latency_ms = ping_round_trip(stream).await?;
    Ok((status, latency_ms))
}

/// Sends a ping packet and times the matching pong.
async fn ping_round_trip<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
) -> Result<u32, Error> {
    let token: i64 = chrono::Utc::now().timestamp_millis();
    let mut body = Vec::new();
    write_varint(&mut body, PACKET_PING);
    body.extend_from_slice(&token.to_be_bytes());

    let started = Instant::now();
    write_packet(stream, &body).await?;

    let pong = read_packet(stream).await?;
    let elapsed = started.elapsed();

    let mut cursor: &[u8] = &pong;
    let packet_id = read_varint(&mut cursor).await?;
    if packet_id != PACKET_PING {
        return Err(Error::Protocol(format!(
            "expected pong, got packet id {packet_id}"
        )));
    }

    Ok((elapsed.as_secs_f64() * 1000.0).round() as u32)
}
