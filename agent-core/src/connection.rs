//! Drives the length-prefixed framing loop over one connection.
//!
//! Modeled as a single cooperative async task: the only two suspension points a connection ever
//! needs — "need more bytes" and "await a pending handler" — become, respectively, the `.await`
//! on [`tokio::io::AsyncReadExt::read_exact`] and a request handler running inside its own
//! spawned task.
//!
//! Every accepted request is dispatched on its own [`tokio::spawn`]ed task so that a slow `sign`
//! never blocks a fast `list` behind it; [`crate::response_queue::ResponseQueue`] restores arrival
//! order on the way out, and [`crate::registry::ClientRegistry`] cancels whatever is still
//! in flight once the connection goes away.

use std::sync::Arc;

use log::warn;
use tokio::io::{split, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::unbounded_channel;

use crate::constants::{AGENT_MAX_MSGLEN, SSH_AGENT_FAILURE};
use crate::error::AgentError;
use crate::registry::ClientRegistry;
use crate::request::{ClientContext, RequestHandler};
use crate::response_queue::ResponseQueue;

const DISCARD_CHUNK: usize = 4096;

/// Runs the framing loop over `stream` until it's closed or errors, then tears down whatever
/// handlers are still in flight. Never returns early on a malformed or oversized request — only
/// on I/O failure or EOF.
///
/// `max_msglen` bounds a single framed message, including the type byte; callers may pass
/// anything at or below [`AGENT_MAX_MSGLEN`], the wire-fixed ceiling, but never above it.
pub async fn run_connection<S>(
	stream: S, handler: Arc<RequestHandler>, connection_id: u64, max_msglen: u32,
)
where
	S: AsyncRead + AsyncWrite + Send + 'static,
{
	let max_msglen = max_msglen.min(AGENT_MAX_MSGLEN);
	let (mut reader, mut writer) = split(stream);
	let (tx, mut rx) = unbounded_channel::<Vec<u8>>();
	let queue = Arc::new(ResponseQueue::new(tx));
	let registry = ClientRegistry::new();

	let writer_task = tokio::spawn(async move {
		while let Some(bytes) = rx.recv().await {
			if writer.write_all(&bytes).await.is_err() {
				break;
			}
		}
	});

	loop {
		let mut len_buf = [0u8; 4];
		if reader.read_exact(&mut len_buf).await.is_err() {
			break;
		}
		let len = u32::from_be_bytes(len_buf);

		if len >= max_msglen.saturating_sub(4) {
			warn!("connection {}: {}", connection_id, AgentError::FramingOverflow);
			let slot = queue.push();
			queue.complete(slot, frame(vec![SSH_AGENT_FAILURE]));
			if discard(&mut reader, len as usize).await.is_err() {
				break;
			}
			continue;
		}

		let mut payload = vec![0u8; len as usize];
		if reader.read_exact(&mut payload).await.is_err() {
			break;
		}

		let slot = queue.push();
		let client = registry.handle();
		let handler = Arc::clone(&handler);
		let queue_for_task = Arc::clone(&queue);
		let task = tokio::spawn(async move {
			let ctx = ClientContext { connection_id, suppress_logging: false };
			let reply = handler.handle(&ctx, &payload);
			if client.is_alive() {
				queue_for_task.complete(slot, frame(reply));
			}
		});
		registry.track(task.abort_handle());
	}

	registry.disconnect();
	drop(queue);
	let _ = writer_task.await;
}

async fn discard(reader: &mut (impl AsyncRead + Unpin), mut remaining: usize) -> std::io::Result<()> {
	let mut scratch = [0u8; DISCARD_CHUNK];
	while remaining > 0 {
		let n = remaining.min(DISCARD_CHUNK);
		reader.read_exact(&mut scratch[..n]).await?;
		remaining -= n;
	}
	Ok(())
}

fn frame(body: Vec<u8>) -> Vec<u8> {
	let mut framed = Vec::with_capacity(4 + body.len());
	framed.extend_from_slice(&(body.len() as u32).to_be_bytes());
	framed.extend_from_slice(&body);
	framed
}

#[cfg(test)]
mod tests {
	use std::sync::Mutex;

	use tokio::io::duplex;

	use super::*;
	use crate::crypto::{KeyFactory, Signer, Ssh1RsaPrivate};
	use crate::key::{Key, KeyVersion};
	use crate::key_store::KeyStore;
	use crate::wire::Decoder;

	#[derive(Default)]
	struct TestStore {
		keys: Mutex<Vec<Key>>,
	}

	impl KeyStore for TestStore {
		fn add(&self, key: Key) -> Result<(), Key> {
			let mut keys = self.keys.lock().unwrap();
			if keys.iter().any(|k| k.version == key.version && k.public_blob == key.public_blob) {
				return Err(key);
			}
			keys.push(key);
			keys.sort_by(|a, b| (a.version, &a.public_blob).cmp(&(b.version, &b.public_blob)));
			Ok(())
		}
		fn find(&self, version: KeyVersion, public_blob: &[u8]) -> Option<Arc<Key>> {
			let _ = (version, public_blob);
			None
		}
		fn remove(&self, version: KeyVersion, public_blob: &[u8]) -> Option<Arc<Key>> {
			let _ = (version, public_blob);
			None
		}
		fn remove_all(&self, version: KeyVersion) -> usize {
			let mut keys = self.keys.lock().unwrap();
			let before = keys.len();
			keys.retain(|k| k.version != version);
			before - keys.len()
		}
		fn count(&self, version: KeyVersion) -> usize {
			self.keys.lock().unwrap().iter().filter(|k| k.version == version).count()
		}
		fn nth(&self, version: KeyVersion, index: usize) -> Option<Arc<Key>> {
			let _ = (version, index);
			None
		}
	}

	struct UnreachableFactory;
	impl KeyFactory for UnreachableFactory {
		fn build_ssh1_rsa(
			&self, _modulus: &[u8], _public_exponent: &[u8], _private_exponent: &[u8], _iqmp: &[u8],
			_p: &[u8], _q: &[u8],
		) -> Result<Box<dyn Ssh1RsaPrivate>, String> {
			Err("not exercised in this test".into())
		}
		fn build_v2_signer(
			&self, _algorithm: &str, _fields: &mut Decoder,
		) -> Result<(Vec<u8>, Box<dyn Signer>), String> {
			Err("not exercised in this test".into())
		}
	}

	fn test_handler() -> Arc<RequestHandler> {
		Arc::new(RequestHandler::new(Arc::new(TestStore::default()), Arc::new(UnreachableFactory)))
	}

	#[tokio::test]
	async fn lists_identities_round_trip() {
		let (client, server) = duplex(4096);
		let handler = test_handler();
		tokio::spawn(run_connection(server, handler, 1, AGENT_MAX_MSGLEN));

		let (mut rx, mut tx) = tokio::io::split(client);
		let body = [crate::constants::SSH2_AGENTC_REQUEST_IDENTITIES];
		tx.write_all(&(body.len() as u32).to_be_bytes()).await.unwrap();
		tx.write_all(&body).await.unwrap();

		let mut len_buf = [0u8; 4];
		rx.read_exact(&mut len_buf).await.unwrap();
		let len = u32::from_be_bytes(len_buf) as usize;
		let mut reply = vec![0u8; len];
		rx.read_exact(&mut reply).await.unwrap();

		assert_eq!(reply[0], crate::constants::SSH2_AGENT_IDENTITIES_ANSWER);
		assert_eq!(&reply[1..5], &0u32.to_be_bytes()); // zero identities
	}

	#[tokio::test]
	async fn unknown_tag_replies_failure() {
		let (client, server) = duplex(4096);
		let handler = test_handler();
		tokio::spawn(run_connection(server, handler, 2, AGENT_MAX_MSGLEN));

		let (mut rx, mut tx) = tokio::io::split(client);
		let body = [0xeeu8];
		tx.write_all(&(body.len() as u32).to_be_bytes()).await.unwrap();
		tx.write_all(&body).await.unwrap();

		let mut len_buf = [0u8; 4];
		rx.read_exact(&mut len_buf).await.unwrap();
		let len = u32::from_be_bytes(len_buf) as usize;
		let mut reply = vec![0u8; len];
		rx.read_exact(&mut reply).await.unwrap();
		assert_eq!(reply, vec![SSH_AGENT_FAILURE]);
	}

	#[tokio::test]
	async fn oversized_frame_is_refused_without_buffering_the_payload() {
		let (client, server) = duplex(8192);
		let handler = test_handler();
		tokio::spawn(run_connection(server, handler, 3, AGENT_MAX_MSGLEN));

		let (mut rx, mut tx) = tokio::io::split(client);
		let oversized_len = AGENT_MAX_MSGLEN - 4;
		tx.write_all(&oversized_len.to_be_bytes()).await.unwrap();
		// Don't bother sending the declared payload; the server must still reply promptly.
		tokio::spawn(async move {
			let junk = vec![0u8; oversized_len as usize];
			let _ = tx.write_all(&junk).await;
		});

		let mut len_buf = [0u8; 4];
		rx.read_exact(&mut len_buf).await.unwrap();
		let len = u32::from_be_bytes(len_buf) as usize;
		let mut reply = vec![0u8; len];
		rx.read_exact(&mut reply).await.unwrap();
		assert_eq!(reply, vec![SSH_AGENT_FAILURE]);
	}
}
