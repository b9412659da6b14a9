//! The loaded-key data model.

use crate::crypto::{Signer, Ssh1RsaPrivate};

/// Which agent protocol generation a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyVersion {
	/// SSH-1 RSA.
	V1,
	/// SSH-2, any supported public-key algorithm.
	V2,
}

/// The secret material backing a loaded key, one variant per protocol generation.
pub enum Secret {
	/// An SSH-1 RSA key usable for challenge-response.
	V1Rsa(Box<dyn Ssh1RsaPrivate>),
	/// An SSH-2 keyed signing object.
	V2Signer(Box<dyn Signer>),
}

impl std::fmt::Debug for Secret {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Secret::V1Rsa(_) => f.write_str("Secret::V1Rsa(..)"),
			Secret::V2Signer(_) => f.write_str("Secret::V2Signer(..)"),
		}
	}
}

/// A loaded key: the public half that identifies it on the wire, plus enough secret material
/// to sign or decrypt on its owner's behalf.
///
/// `public_blob` is the canonical, version-specific encoding of the public half and is this
/// key's external identity: the [`crate::key_store::KeyStore`] orders and deduplicates entries
/// by `(version, public_blob)`.
#[derive(Debug)]
pub struct Key {
	/// SSH-1 or SSH-2.
	pub version: KeyVersion,
	/// Canonical public-key bytes. Stable for the lifetime of this entry.
	pub public_blob: Vec<u8>,
	/// Free-form, user-supplied comment.
	pub comment: String,
	/// Secret material sufficient to sign or decrypt.
	pub secret: Secret,
}

impl Key {
	/// Builds a new key entry.
	pub fn new(version: KeyVersion, public_blob: Vec<u8>, comment: String, secret: Secret) -> Self {
		Self { version, public_blob, comment, secret }
	}

	/// Drops the secret immediately rather than waiting on `Key`'s own drop, so callers that
	/// reject a duplicate add can release it without delay. Zeroing the underlying bytes is up
	/// to each backend's `Drop` impl on the boxed trait object.
	pub fn zeroize_and_drop(self) {
		drop(self);
	}
}
