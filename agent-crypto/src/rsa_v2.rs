//! `ssh-rsa` / `rsa-sha2-256` / `rsa-sha2-512` SSH-2 signing.
//!
//! `SIGN_REQUEST`'s flags word selects the digest: `SSH_AGENT_RSA_SHA2_512` if set (preferred over
//! `_256` when a client sets both), `SSH_AGENT_RSA_SHA2_256` otherwise, and — since no agent still
//! in service should produce a SHA-1 `ssh-rsa` signature — the unflagged case also resolves to
//! `rsa-sha2-256` rather than legacy SHA-1.

use agent_core::constants::{SSH_AGENT_RSA_SHA2_256, SSH_AGENT_RSA_SHA2_512};
use agent_core::crypto::Signer;
use rsa::pkcs1v15::Pkcs1v15Sign;
use rsa::{BigUint, RsaPrivateKey};
use sha2::{Digest, Sha256, Sha512};

/// An SSH-2 RSA signing key.
pub struct RsaV2Signer {
	key: RsaPrivateKey,
}

impl RsaV2Signer {
	/// Builds a signer from big-endian magnitude byte strings in OpenSSH's `ssh-rsa` private-key
	/// field order: `n, e, d, iqmp, p, q`. `iqmp` is recomputed internally by `rsa` and unused here.
	pub fn new(
		modulus: &[u8], public_exponent: &[u8], private_exponent: &[u8], p: &[u8], q: &[u8],
	) -> Result<Self, String> {
		let n = BigUint::from_bytes_be(modulus);
		let e = BigUint::from_bytes_be(public_exponent);
		let d = BigUint::from_bytes_be(private_exponent);
		let primes = vec![BigUint::from_bytes_be(p), BigUint::from_bytes_be(q)];
		let key = RsaPrivateKey::from_components(n, e, d, primes)
			.map_err(|err| format!("invalid RSA key components: {}", err))?;
		Ok(Self { key })
	}
}

impl Signer for RsaV2Signer {
	fn algorithm_name(&self) -> &'static str {
		"ssh-rsa"
	}

	fn supported_flags(&self) -> u32 {
		SSH_AGENT_RSA_SHA2_256 | SSH_AGENT_RSA_SHA2_512
	}

	fn sign(&self, data: &[u8], flags: u32) -> Result<(&'static str, Vec<u8>), String> {
		if flags & SSH_AGENT_RSA_SHA2_512 != 0 {
			let digest = Sha512::digest(data);
			let sig = self
				.key
				.sign(Pkcs1v15Sign::new::<Sha512>(), &digest)
				.map_err(|err| format!("rsa-sha2-512 signing failed: {}", err))?;
			Ok(("rsa-sha2-512", sig))
		} else {
			let digest = Sha256::digest(data);
			let sig = self
				.key
				.sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
				.map_err(|err| format!("rsa-sha2-256 signing failed: {}", err))?;
			Ok(("rsa-sha2-256", sig))
		}
	}
}
