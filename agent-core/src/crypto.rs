//! Traits implemented by concrete key backends in `agent-crypto`.
//!
//! Kept free of any concrete crypto dependency — `agent-core` only ever dispatches through
//! these traits, with backends living in a separate crate. Every operation here is required to
//! be deterministic: nothing on the request path may draw randomness, so implementations must
//! use non-randomized padding / nonce schemes (PKCS#1v1.5 for RSA, RFC 6979 for ECDSA, native
//! determinism for Ed25519).

/// An SSH-1 RSA private key, usable only for challenge-response authentication.
pub trait Ssh1RsaPrivate: Send + Sync {
	/// Decrypts `challenge` (the raw big-endian RSA ciphertext) with the private key and
	/// returns the recovered plaintext integer as a big-endian, zero-padded 32-byte array.
	fn decrypt_challenge(&self, challenge: &[u8]) -> [u8; 32];

	/// Runs a self-consistency check (encrypt a fixed, non-secret test value with the public
	/// half, decrypt it with this private key, compare) used only when a key is first added.
	/// Uses a fixed constant rather than a random probe so it draws no randomness.
	fn self_test(&self) -> bool;
}

/// A keyed SSH-2 signing object for one of the supported public-key algorithms.
pub trait Signer: Send + Sync {
	/// The algorithm name as it appears in the canonical public blob (e.g. `"ssh-ed25519"`).
	fn algorithm_name(&self) -> &'static str;

	/// The set of sign-flag bits this algorithm advertises support for. Any bit in a
	/// `SIGN_REQUEST`'s flags word outside this set is a hard refusal.
	fn supported_flags(&self) -> u32;

	/// Produces a signature over `data`. `flags` has already been validated against
	/// [`Signer::supported_flags`] by the caller. Returns the signature-algorithm name to use
	/// in the reply (which may differ from [`Signer::algorithm_name`], e.g. `rsa-sha2-256`)
	/// alongside the raw signature bytes.
	///
	/// `Err` means the underlying primitive refused to sign (e.g. an RSA modulus too small to
	/// hold the padded digest) and must be treated as a request failure, never as a panic.
	fn sign(&self, data: &[u8], flags: u32) -> Result<(&'static str, Vec<u8>), String>;
}

/// Parses the private-key fields carried in `ADD_RSA_IDENTITY`/`ADD_IDENTITY` requests into a
/// concrete key object.
///
/// `agent-core` dispatches requests but never links against a concrete crypto crate.
/// `agentd` wires a concrete [`KeyFactory`] (from `agent-crypto`) into the
/// [`crate::request::RequestHandler`] at startup.
pub trait KeyFactory: Send + Sync {
	/// Builds an SSH-1 RSA private key from its `ADD_RSA_IDENTITY` wire fields and runs its
	/// self-test. All values are big-endian, unpadded magnitudes.
	#[allow(clippy::too_many_arguments)]
	fn build_ssh1_rsa(
		&self, modulus: &[u8], public_exponent: &[u8], private_exponent: &[u8], iqmp: &[u8],
		p: &[u8], q: &[u8],
	) -> Result<Box<dyn Ssh1RsaPrivate>, String>;

	/// Builds an SSH-2 signer for `algorithm`, reading that algorithm's private-key fields from
	/// `fields` (positioned right after the algorithm name has already been consumed).
	/// Returns the key's canonical public blob alongside the signer.
	fn build_v2_signer(
		&self, algorithm: &str, fields: &mut crate::wire::Decoder,
	) -> Result<(Vec<u8>, Box<dyn Signer>), String>;
}
