// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Owns one TCP connection to one type-C relay board device: connect,
//! reconnect, the serialized status request/response path, and the unlock
//! command queue. Everything that touches the socket for a given device goes
//! through this type, which is the unit of both serialization (one in-flight
//! request at a time) and failure isolation (one device going offline never
//! affects another).

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::Mutex,
    time::{sleep, timeout},
};
use tracing::{debug, warn};

use crate::{
    device::{
        cache::ResponseCache,
        error::DeviceError,
        queue::{self, PendingUnlock, UnlockReceiver, UnlockSender},
    },
    protocol::frame::{
        COMMAND_LEN, RESPONSE_LEN, decode_status_bitmap, encode_status, encode_unlock,
    },
};

const PORT: u16 = 23;
const READ_TIMEOUT: Duration = Duration::from_secs(2);
const RECONNECT_DELAY: Duration = Duration::from_secs(2);
const DRAIN_GAP: Duration = Duration::from_millis(500);
const MAX_ATTEMPTS: u8 = 3;
const DEFAULT_RETRIES: u8 = 3;

/// Owns the connection and serialization state for one device address.
#[derive(Debug)]
pub struct DeviceSession {
    pub address: String,
    port: u16,
    pub board_count: u8,
    io: Mutex<Option<TcpStream>>,
    cache: Mutex<ResponseCache>,
    unlock_tx: UnlockSender,
}

impl DeviceSession {
    /// Open a TCP connection to `address:23` and spin up the unlock-queue
    /// drainer. Fails with [`DeviceError::Unreachable`] if the transport
    /// refuses or times out.
    pub async fn connect(
        address: impl Into<String>,
        board_count: u8,
    ) -> Result<Arc<Self>, DeviceError> {
        Self::connect_to(address, PORT, board_count).await
    }

    /// Same as [`Self::connect`] but against an explicit port, so tests can
    /// point a session at a loopback mock device instead of the real
    /// port-23 relay boards.
    pub async fn connect_to(
        address: impl Into<String>,
        port: u16,
        board_count: u8,
    ) -> Result<Arc<Self>, DeviceError> {
        let address = address.into();
        let stream = Self::dial(&address, port).await?;
        let (unlock_tx, unlock_rx) = queue::channel();

        let session = Arc::new(Self {
            address,
            port,
            board_count,
            io: Mutex::new(Some(stream)),
            cache: Mutex::new(ResponseCache::new()),
            unlock_tx,
        });

        let drainer = Arc::clone(&session);
        tokio::spawn(async move { drainer.run_drainer(unlock_rx).await });

        Ok(session)
    }

    async fn dial(address: &str, port: u16) -> Result<TcpStream, DeviceError> {
        TcpStream::connect((address, port))
            .await
            .map_err(|_| DeviceError::Unreachable(address.to_string()))
    }

    /// Close the stream if present, tolerating a reset on shutdown. Always
    /// clears the connection so the next operation observes "disconnected".
    pub async fn disconnect(&self) {
        let mut guard = self.io.lock().await;
        if let Some(mut stream) = guard.take() {
            let _ = stream.shutdown().await;
        }
    }

    /// `disconnect -> sleep(retry_delay) -> connect`. Leaves the slot empty
    /// if reconnecting fails; the next operation will fail fast and consume
    /// a retry rather than block indefinitely.
    async fn reconnect(&self, guard: &mut Option<TcpStream>) {
        if let Some(mut stream) = guard.take() {
            let _ = stream.shutdown().await;
        }
        sleep(RECONNECT_DELAY).await;
        match Self::dial(&self.address, self.port).await {
            Ok(stream) => *guard = Some(stream),
            Err(e) => warn!(address = %self.address, error = %e, "reconnect failed"),
        }
    }

    /// Consult the cache; on miss, enter the serialized critical section and
    /// attempt up to 3 times: write, then read. A transport error triggers a
    /// reconnect and another attempt. Returns `None` once retries are
    /// exhausted.
    pub async fn send_status_request(&self, command: [u8; COMMAND_LEN]) -> Option<Vec<u8>> {
        if let Some(cached) = self.cache.lock().await.get(&command) {
            debug!(address = %self.address, "status cache hit");
            return Some(cached);
        }

        let mut guard = self.io.lock().await;
        for _attempt in 0..MAX_ATTEMPTS {
            match Self::write_and_read(&self.address, &mut guard, &command).await {
                Ok(response) => {
                    self.cache.lock().await.insert(command, response.clone());
                    return Some(response);
                },
                Err(DeviceError::TransportReset(_) | DeviceError::ShortRead(_)) => {
                    self.reconnect(&mut guard).await;
                },
                Err(e) => {
                    warn!(address = %self.address, error = %e, "status request failed");
                    break;
                },
            }
        }
        None
    }

    async fn write_and_read(
        address: &str,
        guard: &mut Option<TcpStream>,
        command: &[u8; COMMAND_LEN],
    ) -> Result<Vec<u8>, DeviceError> {
        let stream = guard
            .as_mut()
            .ok_or_else(|| DeviceError::Unreachable(address.to_string()))?;
        stream
            .write_all(command)
            .await
            .map_err(|_| DeviceError::TransportReset(address.to_string()))?;
        Self::read_response(address, stream).await
    }

    /// Accumulate exactly `RESPONSE_LEN` bytes, reissuing partial reads as
    /// needed. Each partial read is bounded by the 2s timeout; a timeout
    /// breaks out of the loop and returns whatever was collected so far — a
    /// short frame is not an error here, the caller's decode step is what
    /// turns it into a "no response".
    async fn read_response(
        address: &str,
        stream: &mut TcpStream,
    ) -> Result<Vec<u8>, DeviceError> {
        let mut buf = Vec::with_capacity(RESPONSE_LEN);
        let mut chunk = [0u8; RESPONSE_LEN];

        while buf.len() < RESPONSE_LEN {
            let remaining = RESPONSE_LEN - buf.len();
            match timeout(READ_TIMEOUT, stream.read(&mut chunk[..remaining])).await {
                Ok(Ok(0)) if buf.is_empty() => {
                    return Err(DeviceError::TransportReset(address.to_string()));
                },
                Ok(Ok(0)) => return Err(DeviceError::ShortRead(address.to_string())),
                Ok(Ok(n)) => buf.extend_from_slice(&chunk[..n]),
                Ok(Err(_)) => return Err(DeviceError::TransportReset(address.to_string())),
                Err(_) => break,
            }
        }

        Ok(buf)
    }

    /// Issue a status command for every board and decode the responses.
    /// Boards whose response is missing or malformed are omitted — the
    /// fleet aggregator treats an absent board as "offline".
    pub async fn get_status(&self) -> BTreeMap<u8, BTreeMap<u8, bool>> {
        let mut boards = BTreeMap::new();
        for board in 0..self.board_count {
            let command = encode_status(board);
            let Some(response) = self.send_status_request(command).await else {
                continue;
            };
            match decode_status_bitmap(&response) {
                Ok(bitmap) => {
                    boards.insert(board, bitmap);
                },
                Err(e) => {
                    warn!(address = %self.address, board, error = %e, "status decode failed");
                },
            }
        }
        boards
    }

    /// Append `(encode_unlock(board, lock), retries=3)` to the command
    /// queue. Returns immediately — the drainer sends it in the background.
    pub fn enqueue_unlock(&self, board: u8, lock: u8) {
        let command = encode_unlock(board, lock);
        if self
            .unlock_tx
            .send(PendingUnlock {
                command,
                retries: DEFAULT_RETRIES,
            })
            .is_err()
        {
            warn!(address = %self.address, "unlock drainer is gone, command dropped");
        }
    }

    /// At-most-one-concurrent drainer: pops commands in FIFO order, sends
    /// each under the session's serialization lock, and sleeps 500ms between
    /// sends. An unlock write is considered successful the moment it
    /// completes — the device never acknowledges it.
    async fn run_drainer(self: Arc<Self>, mut rx: UnlockReceiver) {
        while let Some(PendingUnlock {
            command,
            mut retries,
        }) = rx.recv().await
        {
            let mut guard = self.io.lock().await;
            loop {
                match Self::write_command(&self.address, &mut guard, &command).await {
                    Ok(()) => {
                        debug!(address = %self.address, "unlock command sent");
                        break;
                    },
                    Err(_) if retries > 1 => {
                        retries -= 1;
                        self.reconnect(&mut guard).await;
                    },
                    Err(e) => {
                        warn!(address = %self.address, error = %e, "dropping unlock command after exhausting retries");
                        break;
                    },
                }
            }
            drop(guard);
            sleep(DRAIN_GAP).await;
        }
    }

    async fn write_command(
        address: &str,
        guard: &mut Option<TcpStream>,
        command: &[u8; COMMAND_LEN],
    ) -> Result<(), DeviceError> {
        let stream = guard
            .as_mut()
            .ok_or_else(|| DeviceError::Unreachable(address.to_string()))?;
        stream
            .write_all(command)
            .await
            .map_err(|_| DeviceError::TransportReset(address.to_string()))
    }
}
