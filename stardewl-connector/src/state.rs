/// Per-endpoint handshake state (`SPEC_FULL.md` §3, "HandshakeState").
///
/// The owning peer connection, the `stardewl` data channel, and the
/// deferred-ICE queue live alongside this tag on [`crate::connector::Shared`]
/// rather than inside the enum itself — Rust's ownership model makes a
/// single shared struct with one small state tag cleaner than a tagged union
/// that would otherwise have to carry the same handles in every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    AwaitingSignaling,
    AwaitingOffer,
    OfferSent,
    AnswerSent,
    RemoteDescSet,
    DataChannelOpen,
    Closed,
}

/// Which side of the room this endpoint occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Joiner,
}
