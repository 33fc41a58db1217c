//! Error taxonomy of the protocol engine.
//!
//! Nothing in this crate is fatal. Errors split into two groups:
//!
//! - **Silent drops** on the phaser: a frame that fails authentication, comes
//!   from the wrong address, or does not decode is discarded without a reply.
//!   The initiator only ever sees its own timeout.
//! - **Recoverable failures** surfaced to the caller: rejected console input,
//!   a timed out or unexpected reply, or a transport that refused to send.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, ErrorKind>;

/// Every failure the protocol engine can report.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The trailing tag does not match the payload, or the frame is too short
    /// to carry one.
    #[error("authentication tag mismatch")]
    AuthenticationFailure,

    /// The frame came from an address other than the registered peer.
    #[error("frame from unregistered sender")]
    ForeignSender,

    /// The payload length is not one of the command shapes (1, 3 or 7 bytes),
    /// or a three byte payload carries an unknown marker.
    #[error("unknown frame shape")]
    UnknownFrameShape,

    /// A seven byte payload without the `AP1` prefix or with an unknown terminator.
    #[error("malformed set-direction command")]
    MalformedSetDirection,

    /// An azimuth string that is not one of the eight compass points.
    #[error("unknown azimuth")]
    UnknownAzimuth,

    /// A one byte payload that is neither `V` nor `;`.
    #[error("unknown single byte command")]
    UnknownSingleByteCommand,

    /// A direction name (or console angle) that does not name a compass point.
    #[error("unknown direction name")]
    UnknownName,

    /// A reply that starts with neither the position nor the power marker.
    #[error("unknown reply shape")]
    UnknownReplyShape,

    /// A position reply shorter than its fixed layout.
    #[error("truncated position reply")]
    TruncatedPositionReply,

    /// A power reply shorter than the marker plus six characters.
    #[error("truncated power reply")]
    TruncatedPowerReply,

    /// A telemetry field with a wrong marker byte or non-numeric content.
    #[error("malformed telemetry field")]
    MalformedTelemetryField,

    /// The reply shape does not belong to the request that was sent.
    #[error("reply does not match request")]
    UnexpectedReply,

    /// The transport timed out before a reply arrived.
    #[error("no reply before timeout")]
    NoReply,

    /// The transport rejected an outgoing frame.
    #[error("transport send failed")]
    SendFailure,

    /// The transport failed while receiving.
    #[error("transport receive failed")]
    ReceiveFailure,

    /// A frame larger than any frame this protocol defines.
    #[error("frame too long")]
    FrameTooLong,
}

impl ErrorKind {
    /// Whether the phaser answers this failure with silence.
    ///
    /// Decode, address and authentication failures are never reported over the
    /// air.
    pub fn is_silent_drop(&self) -> bool {
        matches!(
            self,
            ErrorKind::AuthenticationFailure
                | ErrorKind::ForeignSender
                | ErrorKind::UnknownFrameShape
                | ErrorKind::MalformedSetDirection
                | ErrorKind::UnknownAzimuth
                | ErrorKind::UnknownSingleByteCommand
                | ErrorKind::FrameTooLong
        )
    }

    /// Whether a caller may simply issue the same request again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::NoReply | ErrorKind::SendFailure | ErrorKind::ReceiveFailure
        )
    }
}
