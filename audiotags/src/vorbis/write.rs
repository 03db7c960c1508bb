use super::VorbisComments;
use crate::error::Result;
use crate::macros::err;

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

impl VorbisComments {
	/// Serialize into the content of a `VORBIS_COMMENT` block
	pub(crate) fn as_bytes(&self) -> Result<Vec<u8>> {
		let mut packet = Vec::new();

		let vendor = self.vendor.as_bytes();
		let Ok(vendor_len) = u32::try_from(vendor.len()) else {
			err!(TooMuchData);
		};

		packet.write_u32::<LittleEndian>(vendor_len)?;
		packet.write_all(vendor)?;

		let Ok(count) = u32::try_from(self.items.len()) else {
			err!(TooMuchData);
		};
		packet.write_u32::<LittleEndian>(count)?;

		for (k, v) in &self.items {
			let Ok(bytes_len) = u32::try_from(k.len() + 1 + v.len()) else {
				err!(TooMuchData);
			};

			packet.write_u32::<LittleEndian>(bytes_len)?;
			packet.write_all(k.as_bytes())?;
			packet.write_u8(b'=')?;
			packet.write_all(v.as_bytes())?;
		}

		Ok(packet)
	}
}
