use crate::error::Result;
use crate::macros::decode_err;
use crate::properties::AudioProperties;
use crate::util::math::samples_to_millis;

use byteorder::{BigEndian, ByteOrder};

// Block sizes (2 + 2), frame sizes (3 + 3)
const PACKED_FIELDS_OFFSET: usize = 10;

/// Derive the audio properties from a `STREAMINFO` block
///
/// `stream_length` is the size of the audio frames, `file_length` the size of the whole file.
pub(crate) fn read_properties(
	stream_info: &[u8],
	stream_length: u64,
	file_length: u64,
) -> Result<AudioProperties> {
	let Some(packed) = stream_info.get(PACKED_FIELDS_OFFSET..PACKED_FIELDS_OFFSET + 8) else {
		decode_err!(@BAIL Flac, "STREAMINFO is too short to hold the stream parameters");
	};

	// sample rate (20) | channels - 1 (3) | bits per sample - 1 (5) | total samples (36)
	let packed = BigEndian::read_u64(packed);

	let sample_rate = (packed >> 44) as u32;
	let channels = ((packed >> 41) & 0b111) as u8 + 1;
	let bit_depth = ((packed >> 36) & 0b1_1111) as u8 + 1;
	let total_samples = packed & 0xF_FFFF_FFFF;

	log::trace!(
		"FLAC: {sample_rate} Hz, {channels} channel(s), {bit_depth} bits, {total_samples} samples"
	);

	let mut properties = AudioProperties {
		sample_rate,
		bit_depth: Some(bit_depth),
		channels,
		..AudioProperties::default()
	};

	// An unknown sample count leaves the duration at zero
	if let Some(millis) = samples_to_millis(total_samples, sample_rate).filter(|&m| m > 0) {
		properties.set_duration(millis, stream_length, file_length);
	}

	Ok(properties)
}

#[cfg(test)]
pub(crate) mod tests {
	use super::read_properties;

	use std::time::Duration;

	// 44.1 kHz, 2 channels, 16 bits, 441000 samples
	pub(crate) fn stream_info() -> Vec<u8> {
		let mut block = vec![0x10, 0x00, 0x10, 0x00, 0, 0, 0, 0, 0, 0];
		let info: u32 = (44100 << 12) | (1 << 9) | (15 << 4);
		block.extend(info.to_be_bytes());
		block.extend(441_000_u32.to_be_bytes());
		block.extend([0; 16]);
		block
	}

	#[test_log::test]
	fn stream_info_properties() {
		let properties = read_properties(&stream_info(), 1_000_000, 1_010_000).unwrap();

		assert_eq!(properties.sample_rate(), 44100);
		assert_eq!(properties.channels(), 2);
		assert_eq!(properties.bit_depth(), Some(16));
		assert_eq!(properties.duration(), Duration::from_secs(10));
		assert_eq!(properties.audio_bitrate(), 800);
		assert_eq!(properties.overall_bitrate(), 808);
	}

	#[test_log::test]
	fn unknown_sample_count() {
		let mut info = stream_info();
		info[14..18].fill(0);

		let properties = read_properties(&info, 1_000_000, 1_010_000).unwrap();
		assert_eq!(properties.sample_rate(), 44100);
		assert_eq!(properties.duration(), Duration::ZERO);
		assert_eq!(properties.audio_bitrate(), 0);
	}

	#[test_log::test]
	fn short_stream_info() {
		assert!(read_properties(&[0; 10], 0, 0).unwrap_err().is_corrupt_block());
	}
}
