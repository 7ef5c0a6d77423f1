//! Datalink frame codec
//!
//! Every command frame shares one shape:
//!
//! ```text
//! +--------+-----+----------+------------+-------+---------+----------+
//! | HEADER | len | function | address BE | count | payload | checksum |
//! +--------+-----+----------+------------+-------+---------+----------+
//! ```
//!
//! `len` covers everything after itself, checksum included. The checksum is
//! an additive sum over the same range (payload responses from the console
//! carry the same trailing sum). The console answers every well-formed frame
//! with [`ACK`] after any response payload.

/// Frame header byte
pub const HEADER: u8 = 0x5A;

/// Acknowledge byte returned by the console after a well-formed frame
pub const ACK: u8 = 0xA5;

/// Largest payload carried by a single frame
pub const MAX_PAYLOAD: usize = 0x80;

/// Function codes understood by the console-side stub
pub mod function {
    /// Read console memory
    pub const DOWNLOAD: u8 = 0x01;
    /// Write console memory
    pub const UPLOAD: u8 = 0x09;
    /// Jump to the given address
    pub const EXECUTE: u8 = 0x0A;
}

/// Additive checksum over `bytes`, wrapping at 8 bits.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte))
}

/// Build a command frame.
///
/// `count` is the number of bytes the console should transfer for this
/// function (bytes to send back for a download, payload length for an
/// upload). `payload` must not exceed [`MAX_PAYLOAD`].
pub fn encode(function: u8, addr: u32, count: u8, payload: &[u8]) -> Vec<u8> {
    debug_assert!(payload.len() <= MAX_PAYLOAD);

    let mut frame = Vec::with_capacity(9 + payload.len());
    frame.push(HEADER);
    frame.push((7 + payload.len()) as u8);
    frame.push(function);
    frame.extend_from_slice(&addr.to_be_bytes());
    frame.push(count);
    frame.extend_from_slice(payload);
    frame.push(checksum(&frame[1..]));

    frame
}
