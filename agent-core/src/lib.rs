//! Hosts the agent request engine: key storage, wire codec, request dispatch and the
//! per-connection framing and reply-ordering machinery that sits on top of it.
//!
//! This crate is transport-agnostic — it drives any `AsyncRead + AsyncWrite` byte stream.
//! Binding a concrete listener, loading configuration, and setting up logging are left to
//! the `agentd` binary crate.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(missing_docs)]

/// Protocol constants fixed by the SSH agent wire format.
pub mod constants;

/// Cursor-based decoder/encoder for the agent wire primitives.
pub mod wire;

/// The error type produced by request handling; always collapses to a single wire failure byte.
pub mod error;

/// SHA-256 key fingerprints used only in log lines, never on the wire.
pub mod fingerprint;

/// [`key::Key`] and the version/ordering types used as the [`key_store::KeyStore`] key.
pub mod key;

/// Traits implemented by concrete signing/challenge-response backends in `agent-crypto`.
pub mod crypto;

/// The [`key_store::KeyStore`] interface implemented by every backend (currently: in-memory only).
pub mod key_store;


/// Per-client bookkeeping so in-flight operations can be cancelled on disconnect.
pub mod registry;

/// The per-connection FIFO that preserves reply ordering across asynchronous handlers.
pub mod response_queue;

/// Dispatches a decoded request to a reply buffer, consulting the [`key_store::KeyStore`].
pub mod request;

/// Drives the length-prefixed framing loop over a byte stream.
pub mod connection;
