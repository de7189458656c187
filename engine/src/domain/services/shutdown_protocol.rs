//! Shutdown protocol client
//!
//! Sends `{shutdown: 1, force: 1}` to `admin.$cmd` as a legacy OP_QUERY
//! message over a direct loopback connection.

use crate::constants::protocol::{
    CONNECT_TIMEOUT_MS, POST_SHUTDOWN_DELAY_MS, READ_BUFFER_LEN, READ_TIMEOUT_MS,
};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

const OP_QUERY: i32 = 2004;
const REQUEST_ID: i32 = 1;
const FULL_COLLECTION_NAME: &str = "admin.$cmd";

const BSON_INT32: u8 = 0x10;
const BSON_BOOLEAN: u8 = 0x08;

/// Wire bytes of the shutdown command, 71 bytes
#[rustfmt::skip]
pub const SHUTDOWN_COMMAND: [u8; 71] = [
    // header: messageLength, requestID, responseTo, opCode
    0x47, 0x00, 0x00, 0x00,
    0x01, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
    0xD4, 0x07, 0x00, 0x00,
    // flags
    0x00, 0x00, 0x00, 0x00,
    // "admin.$cmd\0"
    b'a', b'd', b'm', b'i', b'n', b'.', b'$', b'c', b'm', b'd', 0x00,
    // numberToSkip, numberToReturn
    0x00, 0x00, 0x00, 0x00,
    0xFF, 0xFF, 0xFF, 0xFF,
    // query document {shutdown: 1, force: true}
    0x1B, 0x00, 0x00, 0x00,
    0x10, b's', b'h', b'u', b't', b'd', b'o', b'w', b'n', 0x00, 0x01, 0x00, 0x00, 0x00,
    0x08, b'f', b'o', b'r', b'c', b'e', 0x00, 0x01,
    0x00,
    // empty field selector
    0x05, 0x00, 0x00, 0x00, 0x00,
];

/// Encodes the shutdown command from its parts
pub fn build_shutdown_command() -> Vec<u8> {
    let mut query = Vec::new();
    push_element(&mut query, BSON_INT32, "shutdown", &1i32.to_le_bytes());
    push_element(&mut query, BSON_BOOLEAN, "force", &[0x01]);
    let query = finish_document(query);
    let selector = finish_document(Vec::new());

    let mut body = Vec::new();
    body.extend_from_slice(&0i32.to_le_bytes());
    body.extend_from_slice(FULL_COLLECTION_NAME.as_bytes());
    body.push(0x00);
    body.extend_from_slice(&0i32.to_le_bytes());
    body.extend_from_slice(&(-1i32).to_le_bytes());
    body.extend_from_slice(&query);
    body.extend_from_slice(&selector);

    let length = (16 + body.len()) as i32;
    let mut message = Vec::with_capacity(length as usize);
    message.extend_from_slice(&length.to_le_bytes());
    message.extend_from_slice(&REQUEST_ID.to_le_bytes());
    message.extend_from_slice(&0i32.to_le_bytes());
    message.extend_from_slice(&OP_QUERY.to_le_bytes());
    message.extend_from_slice(&body);
    message
}

fn push_element(doc: &mut Vec<u8>, kind: u8, name: &str, value: &[u8]) {
    doc.push(kind);
    doc.extend_from_slice(name.as_bytes());
    doc.push(0x00);
    doc.extend_from_slice(value);
}

fn finish_document(elements: Vec<u8>) -> Vec<u8> {
    let length = (4 + elements.len() + 1) as i32;
    let mut doc = Vec::with_capacity(length as usize);
    doc.extend_from_slice(&length.to_le_bytes());
    doc.extend_from_slice(&elements);
    doc.push(0x00);
    doc
}

/// Socket timings of the client
#[derive(Debug, Clone, Copy)]
pub struct ShutdownClient {
    connect_timeout: Duration,
    read_timeout: Duration,
    settle_delay: Duration,
}

impl Default for ShutdownClient {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(CONNECT_TIMEOUT_MS),
            read_timeout: Duration::from_millis(READ_TIMEOUT_MS),
            settle_delay: Duration::from_millis(POST_SHUTDOWN_DELAY_MS),
        }
    }
}

impl ShutdownClient {
    pub fn new(connect_timeout: Duration, read_timeout: Duration, settle_delay: Duration) -> Self {
        Self {
            connect_timeout,
            read_timeout,
            settle_delay,
        }
    }

    /// Sends the shutdown command to `address:port`
    ///
    /// Returns true when the server accepted it: the read after the write
    /// timed out or hit EOF. A reply, a connect error or a write error is
    /// reported as false. Non-loopback addresses are refused without
    /// connecting.
    pub async fn send_shutdown(&self, address: IpAddr, port: u16) -> bool {
        if !address.is_loopback() {
            warn!(
                address = %address,
                port = port,
                "Refusing protocol shutdown of a non-loopback address"
            );
            return false;
        }

        let target = SocketAddr::new(address, port);
        let accepted = self.exchange(target).await;
        tokio::time::sleep(self.settle_delay).await;
        accepted
    }

    async fn exchange(&self, target: SocketAddr) -> bool {
        let mut stream =
            match tokio::time::timeout(self.connect_timeout, TcpStream::connect(target)).await {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => {
                    warn!(target = %target, error = %e, "Could not connect to send shutdown");
                    return false;
                }
                Err(_) => {
                    warn!(target = %target, "Timed out connecting to send shutdown");
                    return false;
                }
            };

        if let Err(e) = stream.write_all(&SHUTDOWN_COMMAND).await {
            warn!(target = %target, error = %e, "Failed to write shutdown command");
            return false;
        }
        if let Err(e) = stream.flush().await {
            warn!(target = %target, error = %e, "Failed to flush shutdown command");
            return false;
        }

        let mut buf = [0u8; READ_BUFFER_LEN];
        match tokio::time::timeout(self.read_timeout, stream.read(&mut buf)).await {
            Err(_) => {
                debug!(target = %target, "No reply to shutdown command");
                info!(port = target.port(), "Shutdown command accepted");
                true
            }
            Ok(Ok(0)) => {
                info!(port = target.port(), "Shutdown command accepted, connection closed");
                true
            }
            // reset or aborted: the server went down mid-read
            Ok(Err(e)) => {
                debug!(target = %target, error = %e, "Connection dropped after shutdown command");
                true
            }
            Ok(Ok(n)) => {
                warn!(target = %target, bytes = n, "Server replied to shutdown command");
                false
            }
        }
    }
}
