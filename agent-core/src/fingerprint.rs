//! Human-readable key fingerprints, used only in log lines — never on the wire.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Computes the conventional `SHA256:<base64-no-pad>` fingerprint of a canonical public blob.
pub fn fingerprint(public_blob: &[u8]) -> String {
	let digest = Sha256::digest(public_blob);
	format!("SHA256:{}", STANDARD_NO_PAD.encode(digest))
}
