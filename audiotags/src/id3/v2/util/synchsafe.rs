//! Utilities for working with unsynchronised ID3v2 content
//!
//! Unsynchronisation inserts a `0x00` after every `0xFF` that could be mistaken for an MPEG
//! frame sync. Synchsafe integers only use the lower 7 bits of each byte for the same reason.

use crate::error::Result;
use crate::macros::err;

/// Undo unsynchronisation, dropping the `0x00` that follows each `0xFF`
///
/// # Examples
///
/// ```rust
/// use audiotags::id3::v2::util::synchsafe::remove_unsynchronisation;
///
/// // The content has two `0xFF 0x00` pairs, which will be collapsed
/// let content = [0xFF, 0x00, 0x1A, 0xFF, 0x00, 0x15];
///
/// assert_eq!(remove_unsynchronisation(&content), [0xFF, 0x1A, 0xFF, 0x15]);
/// ```
pub fn remove_unsynchronisation(content: &[u8]) -> Vec<u8> {
	let mut out = Vec::with_capacity(content.len());

	let mut encountered_ff = false;
	for byte in content.iter().copied() {
		if encountered_ff {
			encountered_ff = false;

			// Only skip the byte if this is valid unsynchronisation
			if byte == 0 {
				continue;
			}
		}

		out.push(byte);
		encountered_ff = byte == 0xFF;
	}

	out
}

/// An integer that can be converted to and from synchsafe variants
pub trait SynchsafeInteger: Sized {
	/// Create a synchsafe integer
	///
	/// # Errors
	///
	/// `self` doesn't fit in 28 bits
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::id3::v2::util::synchsafe::SynchsafeInteger;
	///
	/// # fn main() -> audiotags::error::Result<()> {
	/// // Maximum value we can represent in a synchsafe u32
	/// let unsynch_number = 0xFFF_FFFF_u32;
	/// let synch_number = unsynch_number.synch()?;
	///
	/// // Each byte should have 7 set bits and an MSB of 0
	/// assert_eq!(synch_number, 0b01111111_01111111_01111111_01111111_u32);
	/// # Ok(()) }
	/// ```
	fn synch(self) -> Result<Self>;

	/// Unsynchronise a synchsafe integer
	fn unsynch(self) -> Self;
}

impl SynchsafeInteger for u32 {
	fn synch(self) -> Result<Self> {
		if self > 0x0FFF_FFFF {
			err!(TooMuchData);
		}

		Ok((self & 0x7F)
			| ((self & (0x7F << 7)) << 1)
			| ((self & (0x7F << 14)) << 2)
			| ((self & (0x7F << 21)) << 3))
	}

	fn unsynch(self) -> Self {
		((self & 0x7F00_0000) >> 3)
			| ((self & 0x7F_0000) >> 2)
			| ((self & 0x7F00) >> 1)
			| (self & 0x7F)
	}
}
