//! An in-process [`KeyStore`] implementation backed by a `BTreeMap` keyed on `(version,
//! public_blob)`, which keeps entries in the version-then-lexicographic-blob order listing
//! requires without a separate sort step.
//!
//! Nothing here is persisted across a restart — loaded keys are exactly as ephemeral as the
//! process holding them, by design: an agent that wrote keys to disk would defeat the point
//! of keeping private key material off disk in the first place.
//!
//! [`KeyStore`]: agent_core::key_store::KeyStore

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(missing_docs)]

/// The in-memory [`agent_core::key_store::KeyStore`] implementation.
pub mod key_store;

pub use key_store::InMemoryKeyStore;
