//! Dispatches a decoded request to a reply buffer.
//!
//! [`RequestHandler::handle`] dispatches on the request's leading type byte through an
//! `Arc<dyn KeyStore>` and an `Arc<dyn KeyFactory>`, with every branch collapsing to either a
//! typed success reply or the single-byte `SSH_AGENT_FAILURE`.

use std::sync::Arc;

use log::{debug, trace, warn};
use md5::{Digest, Md5};

use crate::constants::*;
use crate::crypto::KeyFactory;
use crate::error::AgentError;
use crate::fingerprint::fingerprint;
use crate::key::{Key, KeyVersion, Secret};
use crate::key_store::KeyStore;
use crate::wire::{encode_rsa_ssh1_pub_blob, Decoder, Encoder};

/// Per-connection context a handler needs beyond the request bytes themselves.
pub struct ClientContext {
	/// Opaque id used only to correlate log lines for one connection.
	pub connection_id: u64,
	/// When set, only an unadorned outcome line is logged.
	pub suppress_logging: bool,
}

/// Dispatches decoded request bodies against a [`KeyStore`] and a [`KeyFactory`].
pub struct RequestHandler {
	store: Arc<dyn KeyStore>,
	factory: Arc<dyn KeyFactory>,
}

impl RequestHandler {
	/// Builds a handler over the given store and key factory.
	pub fn new(store: Arc<dyn KeyStore>, factory: Arc<dyn KeyFactory>) -> Self {
		Self { store, factory }
	}

	/// Produces exactly one reply body (not including the 4-byte length prefix) for `body`,
	/// whose first byte is the request tag.
	pub fn handle(&self, ctx: &ClientContext, body: &[u8]) -> Vec<u8> {
		let mut dec = Decoder::new(body);
		let tag = dec.get_byte();
		match tag {
			SSH1_AGENTC_REQUEST_RSA_IDENTITIES => self.list_v1(ctx),
			SSH2_AGENTC_REQUEST_IDENTITIES => self.list_v2(ctx),
			SSH1_AGENTC_RSA_CHALLENGE => self.rsa_challenge(ctx, &mut dec),
			SSH2_AGENTC_SIGN_REQUEST => self.sign(ctx, &mut dec),
			SSH1_AGENTC_ADD_RSA_IDENTITY => self.add_rsa_identity(ctx, &mut dec),
			SSH2_AGENTC_ADD_IDENTITY => self.add_identity(ctx, &mut dec),
			SSH1_AGENTC_REMOVE_RSA_IDENTITY => self.remove_rsa_identity(ctx, &mut dec),
			SSH2_AGENTC_REMOVE_IDENTITY => self.remove_identity(ctx, &mut dec),
			SSH1_AGENTC_REMOVE_ALL_RSA_IDENTITIES => self.remove_all(ctx, KeyVersion::V1),
			SSH2_AGENTC_REMOVE_ALL_IDENTITIES => self.remove_all(ctx, KeyVersion::V2),
			other => self.fail(ctx, "unknown-request", AgentError::UnknownRequestTag(other), &[]),
		}
	}

	fn list_v1(&self, ctx: &ClientContext) -> Vec<u8> {
		// No body fields to parse; trailing bytes after the type byte are simply ignored.
		let mut out = Encoder::new();
		out.put_byte(SSH1_AGENT_RSA_IDENTITIES_ANSWER);
		self.store.list_serialized(KeyVersion::V1, &mut out);
		self.log_ok(ctx, "list-v1", &[]);
		out.into_bytes()
	}

	fn list_v2(&self, ctx: &ClientContext) -> Vec<u8> {
		let mut out = Encoder::new();
		out.put_byte(SSH2_AGENT_IDENTITIES_ANSWER);
		self.store.list_serialized(KeyVersion::V2, &mut out);
		self.log_ok(ctx, "list-v2", &[]);
		out.into_bytes()
	}

	fn rsa_challenge(&self, ctx: &ClientContext, dec: &mut Decoder) -> Vec<u8> {
		let pubkey = dec.get_rsa_ssh1_pub();
		let public_blob = encode_rsa_ssh1_pub_blob(pubkey.exponent, pubkey.modulus);
		let challenge = dec.get_mp_ssh1().to_vec();
		let session_id = dec.get_data(16).to_vec();
		let resp_type = dec.get_uint32();
		if dec.failed() {
			return self.fail(
				ctx,
				"rsa-challenge",
				AgentError::MalformedPayload("short read".into()),
				&[],
			);
		}
		let fp = fingerprint(&public_blob);
		if resp_type != SSH_AGENT_RSA_RESPONSE_TYPE_MD5 {
			return self.fail(
				ctx,
				"rsa-challenge",
				AgentError::Refused(format!("unsupported response type {}", resp_type)),
				&[fp],
			);
		}
		let Some(key) = self.store.find(KeyVersion::V1, &public_blob) else {
			return self.fail(ctx, "rsa-challenge", AgentError::KeyNotFound, &[fp]);
		};
		let Secret::V1Rsa(rsa) = &key.secret else {
			return self.fail(
				ctx,
				"rsa-challenge",
				AgentError::Refused("key is not an SSH-1 RSA key".into()),
				&[fp],
			);
		};
		let plaintext = rsa.decrypt_challenge(&challenge);
		let mut hasher = Md5::new();
		hasher.update(plaintext);
		hasher.update(&session_id);
		let digest = hasher.finalize();

		let mut out = Encoder::new();
		out.put_byte(SSH1_AGENT_RSA_RESPONSE);
		out.put_data(&digest);
		self.log_ok(ctx, "rsa-challenge", &[fp]);
		out.into_bytes()
	}

	fn sign(&self, ctx: &ClientContext, dec: &mut Decoder) -> Vec<u8> {
		let key_blob = dec.get_string().to_vec();
		let data = dec.get_string().to_vec();
		// The flags word is optional; its absence is equivalent to flags = 0.
		let flags = if dec.remaining().is_empty() { 0 } else { dec.get_uint32() };
		if dec.failed() || !dec.remaining().is_empty() {
			return self.fail(
				ctx,
				"sign",
				AgentError::MalformedPayload("trailing or short data".into()),
				&[],
			);
		}
		let fp = fingerprint(&key_blob);
		let Some(key) = self.store.find(KeyVersion::V2, &key_blob) else {
			return self.fail(ctx, "sign", AgentError::KeyNotFound, &[fp]);
		};
		let Secret::V2Signer(signer) = &key.secret else {
			return self.fail(ctx, "sign", AgentError::Refused("key is not a v2 signer".into()), &[fp]);
		};
		if flags & !signer.supported_flags() != 0 {
			return self.fail(
				ctx,
				"sign",
				AgentError::Refused(format!("unsupported sign flags 0x{:x}", flags)),
				&[fp],
			);
		}
		let (alg_name, sig_bytes) = match signer.sign(&data, flags) {
			Ok(pair) => pair,
			Err(reason) => return self.fail(ctx, "sign", AgentError::Refused(reason), &[fp]),
		};

		let mut sig_blob = Encoder::new();
		sig_blob.put_string(alg_name.as_bytes());
		sig_blob.put_string(&sig_bytes);

		let mut out = Encoder::new();
		out.put_byte(SSH2_AGENT_SIGN_RESPONSE);
		out.put_string(&sig_blob.into_bytes());
		self.log_ok(ctx, "sign", &[fp]);
		out.into_bytes()
	}

	fn add_rsa_identity(&self, ctx: &ClientContext, dec: &mut Decoder) -> Vec<u8> {
		let _declared_bits = dec.get_uint32();
		let modulus = dec.get_mp_ssh1().to_vec();
		let public_exponent = dec.get_mp_ssh1().to_vec();
		let private_exponent = dec.get_mp_ssh1().to_vec();
		let iqmp = dec.get_mp_ssh1().to_vec();
		let p = dec.get_mp_ssh1().to_vec();
		let q = dec.get_mp_ssh1().to_vec();
		let comment = String::from_utf8_lossy(dec.get_string()).into_owned();
		if dec.failed() {
			return self.fail(
				ctx,
				"add-rsa-identity",
				AgentError::MalformedPayload("short read".into()),
				&[],
			);
		}
		let public_blob = encode_rsa_ssh1_pub_blob(&public_exponent, &modulus);
		let fp = fingerprint(&public_blob);
		let rsa = match self.factory.build_ssh1_rsa(
			&modulus,
			&public_exponent,
			&private_exponent,
			&iqmp,
			&p,
			&q,
		) {
			Ok(rsa) => rsa,
			Err(reason) => {
				return self.fail(ctx, "add-rsa-identity", AgentError::Refused(reason), &[fp])
			},
		};
		if !rsa.self_test() {
			return self.fail(
				ctx,
				"add-rsa-identity",
				AgentError::Refused("RSA self-test failed".into()),
				&[fp],
			);
		}
		let key = Key::new(KeyVersion::V1, public_blob, comment, Secret::V1Rsa(rsa));
		self.finish_add(ctx, "add-rsa-identity", fp, key)
	}

	fn add_identity(&self, ctx: &ClientContext, dec: &mut Decoder) -> Vec<u8> {
		let algorithm = String::from_utf8_lossy(dec.get_string()).into_owned();
		let (public_blob, signer) = match self.factory.build_v2_signer(&algorithm, dec) {
			Ok(pair) => pair,
			Err(reason) => return self.fail(ctx, "add-identity", AgentError::Refused(reason), &[]),
		};
		let comment = String::from_utf8_lossy(dec.get_string()).into_owned();
		if dec.failed() {
			return self.fail(ctx, "add-identity", AgentError::MalformedPayload("short read".into()), &[]);
		}
		let fp = fingerprint(&public_blob);
		let key = Key::new(KeyVersion::V2, public_blob, comment, Secret::V2Signer(signer));
		self.finish_add(ctx, "add-identity", fp, key)
	}

	fn finish_add(&self, ctx: &ClientContext, kind: &str, fp: String, key: Key) -> Vec<u8> {
		match self.store.add(key) {
			Ok(()) => {
				self.log_ok(ctx, kind, &[fp]);
				vec![SSH_AGENT_SUCCESS]
			},
			Err(rejected) => {
				rejected.zeroize_and_drop();
				self.fail(ctx, kind, AgentError::Refused("duplicate key".into()), &[fp])
			},
		}
	}

	fn remove_rsa_identity(&self, ctx: &ClientContext, dec: &mut Decoder) -> Vec<u8> {
		let pubkey = dec.get_rsa_ssh1_pub();
		let public_blob = encode_rsa_ssh1_pub_blob(pubkey.exponent, pubkey.modulus);
		if dec.failed() {
			return self.fail(
				ctx,
				"remove-rsa-identity",
				AgentError::MalformedPayload("short read".into()),
				&[],
			);
		}
		let fp = fingerprint(&public_blob);
		match self.store.remove(KeyVersion::V1, &public_blob) {
			Some(_) => {
				self.log_ok(ctx, "remove-rsa-identity", &[fp]);
				vec![SSH_AGENT_SUCCESS]
			},
			None => self.fail(ctx, "remove-rsa-identity", AgentError::KeyNotFound, &[fp]),
		}
	}

	fn remove_identity(&self, ctx: &ClientContext, dec: &mut Decoder) -> Vec<u8> {
		let blob = dec.get_string().to_vec();
		if dec.failed() {
			return self.fail(
				ctx,
				"remove-identity",
				AgentError::MalformedPayload("short read".into()),
				&[],
			);
		}
		let fp = fingerprint(&blob);
		match self.store.remove(KeyVersion::V2, &blob) {
			Some(_) => {
				self.log_ok(ctx, "remove-identity", &[fp]);
				vec![SSH_AGENT_SUCCESS]
			},
			None => self.fail(ctx, "remove-identity", AgentError::KeyNotFound, &[fp]),
		}
	}

	fn remove_all(&self, ctx: &ClientContext, version: KeyVersion) -> Vec<u8> {
		let count = self.store.remove_all(version);
		self.log_ok(ctx, "remove-all", &[format!("{} keys removed", count)]);
		vec![SSH_AGENT_SUCCESS]
	}

	/// Failure-reporting helper: whatever the caller had partially written is already discarded
	/// by construction here (every branch above returns the failure reply freshly rather than
	/// reusing a partial buffer), emits the single `FAILURE` byte, and (unless suppressed) logs
	/// a formatted reason. Never logs secret material.
	fn fail(&self, ctx: &ClientContext, kind: &str, err: AgentError, keys: &[String]) -> Vec<u8> {
		if ctx.suppress_logging {
			debug!("request failed");
		} else {
			warn!(
				"connection {}: {} failed ({}): {}",
				ctx.connection_id,
				kind,
				keys.join(", "),
				err
			);
		}
		vec![SSH_AGENT_FAILURE]
	}

	fn log_ok(&self, ctx: &ClientContext, kind: &str, keys: &[String]) {
		if ctx.suppress_logging {
			debug!("request succeeded");
		} else {
			trace!("connection {}: {} succeeded ({})", ctx.connection_id, kind, keys.join(", "));
		}
	}
}
