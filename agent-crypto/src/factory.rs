//! Builds concrete signers from the private-key fields carried in `ADD_RSA_IDENTITY`/
//! `ADD_IDENTITY` requests.

use agent_core::crypto::{KeyFactory, Signer, Ssh1RsaPrivate};
use agent_core::wire::{Decoder, Encoder};

use crate::ecdsa_p256::EcdsaP256Signer;
use crate::ed25519::Ed25519Signer;
use crate::rsa_v1::RsaV1Key;
use crate::rsa_v2::RsaV2Signer;

/// The only [`KeyFactory`] this crate provides: `ssh-rsa` (v1 and v2), `ssh-ed25519`, and
/// `ecdsa-sha2-nistp256`.
#[derive(Default)]
pub struct DefaultKeyFactory;

impl KeyFactory for DefaultKeyFactory {
	fn build_ssh1_rsa(
		&self, modulus: &[u8], public_exponent: &[u8], private_exponent: &[u8], _iqmp: &[u8],
		_p: &[u8], _q: &[u8],
	) -> Result<Box<dyn Ssh1RsaPrivate>, String> {
		if modulus.is_empty() || public_exponent.is_empty() || private_exponent.is_empty() {
			return Err("RSA key field is empty".into());
		}
		Ok(Box::new(RsaV1Key::new(modulus, public_exponent, private_exponent)))
	}

	fn build_v2_signer(
		&self, algorithm: &str, fields: &mut Decoder,
	) -> Result<(Vec<u8>, Box<dyn Signer>), String> {
		match algorithm {
			"ssh-rsa" => {
				let n = fields.get_mpint2().to_vec();
				let e = fields.get_mpint2().to_vec();
				let d = fields.get_mpint2().to_vec();
				let _iqmp = fields.get_mpint2();
				let p = fields.get_mpint2().to_vec();
				let q = fields.get_mpint2().to_vec();
				if fields.failed() {
					return Err("truncated ssh-rsa private key fields".into());
				}
				let signer = RsaV2Signer::new(&n, &e, &d, &p, &q)?;

				let mut blob = Encoder::new();
				blob.put_string(b"ssh-rsa");
				blob.put_mpint2(&e);
				blob.put_mpint2(&n);
				Ok((blob.into_bytes(), Box::new(signer)))
			},
			"ssh-ed25519" => {
				let public_key = fields.get_string().to_vec();
				let private_key = fields.get_string().to_vec();
				if fields.failed() {
					return Err("truncated ssh-ed25519 private key fields".into());
				}
				let signer = Ed25519Signer::new(&private_key)?;

				let mut blob = Encoder::new();
				blob.put_string(b"ssh-ed25519");
				blob.put_string(&public_key);
				Ok((blob.into_bytes(), Box::new(signer)))
			},
			"ecdsa-sha2-nistp256" => {
				let curve_name = fields.get_string().to_vec();
				let public_point = fields.get_string().to_vec();
				let private_scalar = fields.get_mpint2().to_vec();
				if fields.failed() {
					return Err("truncated ecdsa-sha2-nistp256 private key fields".into());
				}
				if curve_name != b"nistp256" {
					return Err(format!(
						"unsupported curve {}",
						String::from_utf8_lossy(&curve_name)
					));
				}
				let signer = EcdsaP256Signer::new(&private_scalar)?;

				let mut blob = Encoder::new();
				blob.put_string(b"ecdsa-sha2-nistp256");
				blob.put_string(&curve_name);
				blob.put_string(&public_point);
				Ok((blob.into_bytes(), Box::new(signer)))
			},
			other => Err(format!("unsupported algorithm {}", other)),
		}
	}
}
