//! SSH-1 RSA challenge-response, implemented as raw (unpadded) modular exponentiation — the
//! legacy protocol predates PKCS#1 padding for this operation entirely.

use agent_core::crypto::Ssh1RsaPrivate;
use rsa::BigUint;
use zeroize::Zeroizing;

/// A fixed, non-secret probe value used by [`RsaV1Key::self_test`]. Any constant works; what
/// matters is that it draws no randomness.
const SELF_TEST_PROBE: &[u8] = b"ssh-agent self test probe, not a secret";

/// An SSH-1 RSA key, usable only for the raw encrypt/decrypt operation the challenge-response
/// handshake requires.
///
/// `num-bigint-dig`'s `BigUint` does not zeroize its backing limbs on drop, so the private
/// exponent is kept as big-endian bytes in a [`Zeroizing`] buffer instead, and only parsed into a
/// transient `BigUint` for the duration of a single `modpow`.
pub struct RsaV1Key {
	modulus: BigUint,
	public_exponent: BigUint,
	private_exponent: Zeroizing<Vec<u8>>,
}

impl RsaV1Key {
	/// Builds a key from big-endian magnitude byte strings. `iqmp`/`p`/`q` are accepted (they are
	/// present on the wire) but unused: the raw modpow this key performs needs only `(n, e, d)`.
	pub fn new(modulus: &[u8], public_exponent: &[u8], private_exponent: &[u8]) -> Self {
		Self {
			modulus: BigUint::from_bytes_be(modulus),
			public_exponent: BigUint::from_bytes_be(public_exponent),
			private_exponent: Zeroizing::new(private_exponent.to_vec()),
		}
	}

	fn encrypt(&self, m: &BigUint) -> BigUint {
		m.modpow(&self.public_exponent, &self.modulus)
	}

	fn decrypt(&self, c: &BigUint) -> BigUint {
		let d = BigUint::from_bytes_be(&self.private_exponent);
		c.modpow(&d, &self.modulus)
	}
}

impl Ssh1RsaPrivate for RsaV1Key {
	fn decrypt_challenge(&self, challenge: &[u8]) -> [u8; 32] {
		let plaintext = self.decrypt(&BigUint::from_bytes_be(challenge));
		let bytes = plaintext.to_bytes_be();
		let mut out = [0u8; 32];
		let start = out.len().saturating_sub(bytes.len());
		out[start..].copy_from_slice(&bytes[bytes.len().saturating_sub(32)..]);
		out
	}

	fn self_test(&self) -> bool {
		let m = BigUint::from_bytes_be(SELF_TEST_PROBE) % &self.modulus;
		let c = self.encrypt(&m);
		self.decrypt(&c) == m
	}
}
