//! `ecdsa-sha2-nistp256` SSH-2 signing, using RFC 6979 deterministic nonces (the `p256` crate's
//! default `Signer` behavior) rather than key generation's random nonce, as no flags exist to
//! request anything else.

use agent_core::crypto::Signer;
use agent_core::wire::Encoder;
use p256::ecdsa::signature::Signer as _;
use p256::ecdsa::{Signature, SigningKey};

/// An `ecdsa-sha2-nistp256` signing key.
pub struct EcdsaP256Signer {
	key: SigningKey,
}

impl EcdsaP256Signer {
	/// Builds a signer from the private scalar `d`, big-endian.
	pub fn new(private_scalar: &[u8]) -> Result<Self, String> {
		let key = SigningKey::from_slice(private_scalar)
			.map_err(|err| format!("invalid P-256 private scalar: {}", err))?;
		Ok(Self { key })
	}
}

impl Signer for EcdsaP256Signer {
	fn algorithm_name(&self) -> &'static str {
		"ecdsa-sha2-nistp256"
	}

	fn supported_flags(&self) -> u32 {
		0
	}

	fn sign(&self, data: &[u8], _flags: u32) -> Result<(&'static str, Vec<u8>), String> {
		let sig: Signature = self.key.sign(data);
		let raw = sig.to_bytes();
		let (r, s) = raw.split_at(32);

		let mut blob = Encoder::new();
		blob.put_mpint2(r);
		blob.put_mpint2(s);
		Ok(("ecdsa-sha2-nistp256", blob.into_bytes()))
	}
}
