use super::constants::ID3V1_TAG_MARKER;
use super::tag::Id3v1Tag;
use crate::util::text::latin1_encode;

impl Id3v1Tag {
	/// Encode the tag into its 128 byte V1.1 layout
	///
	/// Text is truncated to fit its field, and anything outside of Latin-1 becomes `?`.
	pub fn as_bytes(&self) -> [u8; 128] {
		fn put(dest: &mut [u8], value: Option<&str>) {
			let Some(value) = value else {
				return;
			};

			for (slot, byte) in dest.iter_mut().zip(latin1_encode(value, true)) {
				// Lossy encoding never fails
				*slot = byte.unwrap_or(b'?');
			}
		}

		let mut writer = [0; 128];
		writer[..3].copy_from_slice(&ID3V1_TAG_MARKER);

		put(&mut writer[3..33], self.title.as_deref());
		put(&mut writer[33..63], self.artist.as_deref());
		put(&mut writer[63..93], self.album.as_deref());

		if let Some(year) = self.year {
			let year = format!("{:04}", year.min(9999));
			writer[93..97].copy_from_slice(year.as_bytes());
		}

		put(&mut writer[97..125], self.comment.as_deref());

		writer[125] = 0;
		writer[126] = self.track_number.unwrap_or(0);
		writer[127] = self.genre.unwrap_or(255);

		writer
	}
}
