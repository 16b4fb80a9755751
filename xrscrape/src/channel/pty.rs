//! PTY channel abstraction for interactive sessions.

use std::time::Duration;

use bytes::BytesMut;
use log::{debug, trace};
use regex::bytes::Regex;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use crate::error::{ChannelError, Result};

/// Configuration for PTY channel behavior.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Search depth for pattern matching.
    pub search_depth: usize,

    /// How long the channel must stay silent before a drain stops reading.
    pub drain_idle: Duration,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            search_depth: 1000,
            drain_idle: Duration::from_millis(100),
        }
    }
}

/// High-level PTY channel for interactive device sessions.
///
/// Wraps a russh shell channel and provides line writes, raw writes,
/// prompt-terminated reads with a deadline, and non-blocking drains.
pub struct PtyChannel {
    channel: Channel<Msg>,
    config: PtyConfig,
    buffer: PatternBuffer,
    is_open: bool,
}

impl PtyChannel {
    pub fn new(channel: Channel<Msg>, config: PtyConfig) -> Self {
        Self {
            channel,
            buffer: PatternBuffer::new(config.search_depth),
            config,
            is_open: true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Write `text` followed by a newline.
    pub async fn send_line(&mut self, text: &str) -> Result<()> {
        self.write_raw(format!("{text}\n").as_bytes()).await
    }

    /// Write bytes to the channel as-is.
    pub async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        trace!("write {:?}", String::from_utf8_lossy(data));
        self.channel
            .data(data)
            .await
            .map_err(|e| ChannelError::Ssh(e).into())
    }

    /// Read until `pattern` appears in the buffer tail.
    ///
    /// Returns everything accumulated, including the matched prompt.
    pub async fn read_until_pattern(&mut self, pattern: &Regex, timeout: Duration) -> Result<Vec<u8>> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.buffer.tail_contains(pattern) {
                return Ok(self.buffer.take());
            }
            match tokio::time::timeout_at(deadline, self.channel.wait()).await {
                Ok(Some(msg)) => self.absorb(msg)?,
                Ok(None) => {
                    self.is_open = false;
                    return Err(ChannelError::Closed.into());
                }
                Err(_) => {
                    debug!(
                        "no match within {:?}, last line {:?}",
                        timeout,
                        String::from_utf8_lossy(self.buffer.last_line())
                    );
                    return Err(ChannelError::PatternTimeout(timeout).into());
                }
            }
        }
    }

    /// Return whatever is buffered or arrives before the channel goes quiet.
    ///
    /// Never waits longer than `drain_idle` for a single message, so a silent
    /// channel yields an empty result instead of blocking.
    pub async fn drain(&mut self) -> Result<Vec<u8>> {
        let mut pending = BytesMut::new();
        loop {
            match tokio::time::timeout(self.config.drain_idle, self.channel.wait()).await {
                Ok(Some(ChannelMsg::Data { data })) => pending.extend_from_slice(&data),
                Ok(Some(ChannelMsg::ExtendedData { data, .. })) => pending.extend_from_slice(&data),
                Ok(Some(ChannelMsg::Eof | ChannelMsg::Close)) | Ok(None) => {
                    self.is_open = false;
                    break;
                }
                Ok(Some(_)) => {}
                Err(_) => break,
            }
        }
        self.buffer.extend(&pending);
        Ok(self.buffer.take())
    }

    fn absorb(&mut self, msg: ChannelMsg) -> Result<()> {
        match msg {
            ChannelMsg::Data { data } => self.buffer.extend(&data),
            ChannelMsg::ExtendedData { data, .. } => self.buffer.extend(&data),
            ChannelMsg::Eof | ChannelMsg::Close => {
                self.is_open = false;
                return Err(ChannelError::Closed.into());
            }
            other => trace!("ignoring channel message {:?}", other),
        }
        Ok(())
    }

    /// Close the channel.
    pub async fn close(&mut self) -> Result<()> {
        self.is_open = false;
        self.channel
            .close()
            .await
            .map_err(|e| ChannelError::Ssh(e).into())
    }
}
