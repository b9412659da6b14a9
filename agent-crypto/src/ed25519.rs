//! `ssh-ed25519` SSH-2 signing. Ed25519 is deterministic by construction (RFC 8032): no flags,
//! no randomness, no digest negotiation.

use agent_core::crypto::Signer;
use ed25519_dalek::{Signer as _, SigningKey};

/// An `ssh-ed25519` signing key.
pub struct Ed25519Signer {
	key: SigningKey,
}

impl Ed25519Signer {
	/// Builds a signer from the 32-byte seed half of OpenSSH's 64-byte `ssh-ed25519` private key
	/// field (the trailing 32 bytes duplicate the public key and are not needed here).
	pub fn new(private_key_64: &[u8]) -> Result<Self, String> {
		let seed: [u8; 32] =
			private_key_64.get(..32).ok_or("ed25519 private key shorter than 32 bytes")?.try_into().unwrap();
		Ok(Self { key: SigningKey::from_bytes(&seed) })
	}
}

impl Signer for Ed25519Signer {
	fn algorithm_name(&self) -> &'static str {
		"ssh-ed25519"
	}

	fn supported_flags(&self) -> u32 {
		0
	}

	fn sign(&self, data: &[u8], _flags: u32) -> Result<(&'static str, Vec<u8>), String> {
		Ok(("ssh-ed25519", self.key.sign(data).to_bytes().to_vec()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sign_is_deterministic() {
		let signer = Ed25519Signer::new(&[7u8; 64]).unwrap();
		let (alg, sig1) = signer.sign(b"hello", 0).unwrap();
		let (_, sig2) = signer.sign(b"hello", 0).unwrap();
		assert_eq!(alg, "ssh-ed25519");
		assert_eq!(sig1, sig2);
		assert_eq!(sig1.len(), 64);
	}

	#[test]
	fn rejects_short_key() {
		assert!(Ed25519Signer::new(&[0u8; 10]).is_err());
	}
}
