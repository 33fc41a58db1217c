//! Keyed 16-bit command tags.
//!
//! Every command frame is `payload ++ hi(tag) ++ lo(tag)`, with the tag computed
//! over the payload only. The tag is a rotate/xor/add mix of the payload and a
//! shared key:
//!
//! ```text
//! acc = 0xB33F
//! for i, byte in payload:
//!     acc = rotl(acc, 5) ^ key[i % key.len()]
//!     acc = acc + byte            (16-bit wrapping)
//! ```
//!
//! This keeps adjacent-channel traffic and corrupted frames from moving the
//! antenna. It is not a MAC: anyone who has seen a few frames can forge one.

use heapless::Vec;

use crate::consts::{AUTH_ROTATE, AUTH_SEED, AUTH_TAG_LEN, DEFAULT_AUTH_KEY, MAX_FRAME_LEN};
use crate::error::{ErrorKind, Result};

/// A sealed command frame: payload followed by its two tag bytes.
pub type Frame = Vec<u8, MAX_FRAME_LEN>;

/// Computes the tag of `payload` under the default shared key.
pub fn compute_tag(payload: &[u8]) -> u16 {
    compute_tag_with_key(DEFAULT_AUTH_KEY, payload)
}

/// Computes the tag of `payload` under `key`.
///
/// An empty key leaves the xor step out.
pub fn compute_tag_with_key(key: &[u8], payload: &[u8]) -> u16 {
    payload.iter().enumerate().fold(AUTH_SEED, |acc, (i, &b)| {
        let k = if key.is_empty() { 0 } else { key[i % key.len()] };
        (acc.rotate_left(AUTH_ROTATE) ^ u16::from(k)).wrapping_add(u16::from(b))
    })
}

/// Checks `tag` against the default key. Exact match only.
pub fn verify(payload: &[u8], tag: u16) -> bool {
    verify_with_key(DEFAULT_AUTH_KEY, payload, tag)
}

/// Checks `tag` against `key`. Exact match only.
pub fn verify_with_key(key: &[u8], payload: &[u8], tag: u16) -> bool {
    compute_tag_with_key(key, payload) == tag
}

/// Appends the tag of `payload` under `key`, producing the bytes to transmit.
pub fn seal(key: &[u8], payload: &[u8]) -> Result<Frame> {
    let tag = compute_tag_with_key(key, payload);
    let mut frame = Frame::new();
    frame
        .extend_from_slice(payload)
        .map_err(|_| ErrorKind::FrameTooLong)?;
    frame
        .extend_from_slice(&[hi8(tag), lo8(tag)])
        .map_err(|_| ErrorKind::FrameTooLong)?;
    Ok(frame)
}

/// Splits a received frame into its payload and checks the trailing tag.
///
/// Frames shorter than the tag itself fail like any other mismatch.
pub fn open<'a>(key: &[u8], frame: &'a [u8]) -> Result<&'a [u8]> {
    if frame.len() < AUTH_TAG_LEN {
        return Err(ErrorKind::AuthenticationFailure);
    }
    let (payload, tag) = frame.split_at(frame.len() - AUTH_TAG_LEN);
    let tag = u16::from_be_bytes([tag[0], tag[1]]);
    if verify_with_key(key, payload, tag) {
        Ok(payload)
    } else {
        Err(ErrorKind::AuthenticationFailure)
    }
}

pub(crate) fn lo8(x: u16) -> u8 {
    (x & 0xff) as u8
}

pub(crate) fn hi8(x: u16) -> u8 {
    (x >> 8) as u8
}
