//! Encoding/decoding of the agent wire primitives.
//!
//! [`Decoder`] is a cursor over a borrowed byte span. Every read sets a sticky error flag on
//! short input rather than panicking or returning a `Result` per call; callers read everything
//! their request tag requires and check [`Decoder::failed`] once at the end. This mirrors the
//! protocol's own error model: a malformed request never partially applies, it just fails.

/// A cursor over a byte span with sticky-error reads.
///
/// Once a read comes up short, every subsequent read returns a zeroed default and `failed()`
/// stays `true` for the lifetime of the cursor.
pub struct Decoder<'a> {
	data: &'a [u8],
	pos: usize,
	failed: bool,
}

impl<'a> Decoder<'a> {
	/// Wraps `data` for reading from the front.
	pub fn new(data: &'a [u8]) -> Self {
		Self { data, pos: 0, failed: false }
	}

	/// Whether any read so far has come up short.
	pub fn failed(&self) -> bool {
		self.failed
	}

	/// Bytes not yet consumed.
	pub fn remaining(&self) -> &'a [u8] {
		if self.failed {
			&[]
		} else {
			&self.data[self.pos..]
		}
	}

	fn take(&mut self, n: usize) -> &'a [u8] {
		if self.failed || n > self.data.len() - self.pos {
			self.failed = true;
			return &[];
		}
		let slice = &self.data[self.pos..self.pos + n];
		self.pos += n;
		slice
	}

	/// Reads a single byte.
	pub fn get_byte(&mut self) -> u8 {
		let b = self.take(1);
		b.first().copied().unwrap_or(0)
	}

	/// Reads a 4-byte big-endian `uint32`.
	pub fn get_uint32(&mut self) -> u32 {
		let b = self.take(4);
		if b.len() < 4 {
			return 0;
		}
		u32::from_be_bytes([b[0], b[1], b[2], b[3]])
	}

	/// Reads exactly `n` raw bytes.
	pub fn get_data(&mut self, n: usize) -> &'a [u8] {
		self.take(n)
	}

	/// Reads a length-prefixed `string`: `uint32 len || len bytes`.
	pub fn get_string(&mut self) -> &'a [u8] {
		let len = self.get_uint32();
		self.take(len as usize)
	}

	/// Reads `mp_ssh1`: `uint16 bit_length_be || ceil(bit_length / 8)` bytes, big-endian.
	pub fn get_mp_ssh1(&mut self) -> &'a [u8] {
		let hi = self.take(1);
		let lo = self.take(1);
		if hi.len() < 1 || lo.len() < 1 {
			return &[];
		}
		let bits = u16::from_be_bytes([hi[0], lo[0]]) as usize;
		let bytes = bits.div_ceil(8);
		self.take(bytes)
	}

	/// Reads `rsa_ssh1_pub`: `uint32 bits || mp_ssh1 exponent || mp_ssh1 modulus`.
	pub fn get_rsa_ssh1_pub(&mut self) -> RsaSsh1Pub<'a> {
		let bits = self.get_uint32();
		let exponent = self.get_mp_ssh1();
		let modulus = self.get_mp_ssh1();
		RsaSsh1Pub { bits, exponent, modulus }
	}

	/// Reads an SSH-2 `mpint`: a `string` holding a two's-complement big-endian integer, used
	/// when parsing the private-key fields of an `ADD_IDENTITY` body, per RFC 4251 §5.
	pub fn get_mpint2(&mut self) -> &'a [u8] {
		let bytes = self.get_string();
		if bytes.first() == Some(&0) { &bytes[1..] } else { bytes }
	}
}

/// `rsa_ssh1_pub`, as read off the wire. `bits` is declarative and not re-derived from the
/// modulus length.
pub struct RsaSsh1Pub<'a> {
	/// Declared bit length of the modulus.
	pub bits: u32,
	/// Public exponent, big-endian.
	pub exponent: &'a [u8],
	/// Modulus, big-endian.
	pub modulus: &'a [u8],
}

/// An append-only byte buffer with primitives symmetric to [`Decoder`].
#[derive(Default)]
pub struct Encoder {
	buf: Vec<u8>,
}

impl Encoder {
	/// Starts an empty buffer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Consumes the encoder, returning the accumulated bytes.
	pub fn into_bytes(self) -> Vec<u8> {
		self.buf
	}

	/// Appends a single byte.
	pub fn put_byte(&mut self, b: u8) {
		self.buf.push(b);
	}

	/// Appends a 4-byte big-endian `uint32`.
	pub fn put_uint32(&mut self, v: u32) {
		self.buf.extend_from_slice(&v.to_be_bytes());
	}

	/// Appends raw bytes with no length prefix.
	pub fn put_data(&mut self, data: &[u8]) {
		self.buf.extend_from_slice(data);
	}

	/// Appends a length-prefixed `string`.
	pub fn put_string(&mut self, data: &[u8]) {
		self.put_uint32(data.len() as u32);
		self.put_data(data);
	}

	/// Appends `mp_ssh1`: `uint16 bit_length_be` followed by the minimal big-endian encoding.
	///
	/// `value` must already be the minimal (no leading zero byte, unless the value is zero)
	/// big-endian encoding; bit length is derived from it.
	pub fn put_mp_ssh1(&mut self, value: &[u8]) {
		let bits = mp_ssh1_bit_length(value);
		self.buf.extend_from_slice(&bits.to_be_bytes());
		self.put_data(value);
	}

	/// Appends `rsa_ssh1_pub`: `uint32 bits || mp_ssh1 exponent || mp_ssh1 modulus`.
	pub fn put_rsa_ssh1_pub(&mut self, exponent: &[u8], modulus: &[u8]) {
		let bits = mp_ssh1_bit_length(modulus);
		self.put_uint32(bits as u32);
		self.put_mp_ssh1(exponent);
		self.put_mp_ssh1(modulus);
	}

	/// Appends an SSH-2 `mpint`: a `string` holding the two's-complement big-endian encoding,
	/// left-padded with a zero byte if the high bit of `value` is set (so it reads as positive).
	pub fn put_mpint2(&mut self, value: &[u8]) {
		let trimmed = {
			let mut i = 0;
			while i + 1 < value.len() && value[i] == 0 {
				i += 1;
			}
			&value[i..]
		};
		if trimmed.first().is_some_and(|b| b & 0x80 != 0) {
			let mut padded = Vec::with_capacity(trimmed.len() + 1);
			padded.push(0);
			padded.extend_from_slice(trimmed);
			self.put_string(&padded);
		} else {
			self.put_string(trimmed);
		}
	}
}

/// Canonical `rsa_ssh1_pub` encoding of a key, used both to store an SSH-1 key's `public_blob`
/// and to re-derive the lookup key from a request's wire-decoded exponent/modulus — this way a
/// request's (ignored) declared bit length can never desync the store from what a client sees
/// on a later list.
pub fn encode_rsa_ssh1_pub_blob(exponent: &[u8], modulus: &[u8]) -> Vec<u8> {
	let mut enc = Encoder::new();
	enc.put_rsa_ssh1_pub(exponent, modulus);
	enc.into_bytes()
}

fn mp_ssh1_bit_length(value: &[u8]) -> u16 {
	for (leading, &b) in value.iter().enumerate() {
		if b != 0 {
			let extra = 8 - (b.leading_zeros() as usize);
			return ((value.len() - leading - 1) * 8 + extra) as u16;
		}
	}
	0
}
