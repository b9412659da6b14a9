use std::error::Error;
use std::fmt::{Display, Formatter};

/// The error kinds recognized by the agent request engine.
///
/// Every variant collapses to the single-byte `SSH_AGENT_FAILURE` reply on the wire — the
/// variant and its message exist only for the log line, never for the client.
#[derive(Debug)]
pub enum AgentError {
	/// Framed length was at or above `AGENT_MAX_MSGLEN - 4`.
	FramingOverflow,
	/// The decoder's sticky-error flag was set after the handler finished its reads.
	MalformedPayload(String),
	/// The request tag is not one this agent understands.
	UnknownRequestTag(u8),
	/// A sign, challenge, or remove request named a key the store does not hold.
	KeyNotFound,
	/// A cryptographic or protocol-level refusal: unknown algorithm, unsupported sign flag,
	/// a key that cannot honor the requested flags, a failed RSA self-test, or a duplicate add.
	Refused(String),
}

impl Display for AgentError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			AgentError::FramingOverflow => write!(f, "framed message exceeds AGENT_MAX_MSGLEN"),
			AgentError::MalformedPayload(reason) => write!(f, "malformed payload: {}", reason),
			AgentError::UnknownRequestTag(tag) => write!(f, "unknown request tag {}", tag),
			AgentError::KeyNotFound => write!(f, "key not found"),
			AgentError::Refused(reason) => write!(f, "refused: {}", reason),
		}
	}
}

impl Error for AgentError {}
