//! Concrete [`Ssh1RsaPrivate`]/[`Signer`] backends and the [`KeyFactory`] that builds them from
//! raw `ADD_RSA_IDENTITY`/`ADD_IDENTITY` wire fields.
//!
//! [`Ssh1RsaPrivate`]: agent_core::crypto::Ssh1RsaPrivate
//! [`Signer`]: agent_core::crypto::Signer
//! [`KeyFactory`]: agent_core::crypto::KeyFactory

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(missing_docs)]

/// The SSH-1 RSA challenge-response backend.
pub mod rsa_v1;
/// The `ssh-rsa`/`rsa-sha2-256`/`rsa-sha2-512` SSH-2 signer.
pub mod rsa_v2;
/// The `ssh-ed25519` SSH-2 signer.
pub mod ed25519;
/// The `ecdsa-sha2-nistp256` SSH-2 signer.
pub mod ecdsa_p256;
/// Parses wire fields into one of the above backends.
pub mod factory;

pub use factory::DefaultKeyFactory;
