use crate::util::math::kbps;

use std::time::Duration;

/// Technical details of the audio stream
///
/// These are derived from the container on every load and after every save, so they can't be
/// edited. Whatever a container doesn't record is left zeroed.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[non_exhaustive]
pub struct AudioProperties {
	pub(crate) duration: Duration,
	pub(crate) overall_bitrate: u32,
	pub(crate) audio_bitrate: u32,
	pub(crate) sample_rate: u32,
	pub(crate) bit_depth: Option<u8>,
	pub(crate) channels: u8,
}

impl AudioProperties {
	/// Set the duration, deriving both bitrates from it
	///
	/// `audio_len` is the size of the encoded stream, `file_len` the size of the whole file.
	pub(crate) fn set_duration(&mut self, millis: u64, audio_len: u64, file_len: u64) {
		self.duration = Duration::from_millis(millis);
		self.overall_bitrate = kbps(file_len, millis);
		self.audio_bitrate = kbps(audio_len, millis);
	}

	/// Playback length
	pub fn duration(&self) -> Duration {
		self.duration
	}

	/// Playback length in whole milliseconds
	pub fn duration_ms(&self) -> u64 {
		self.duration.as_secs() * 1000 + u64::from(self.duration.subsec_millis())
	}

	/// Playback length in whole seconds
	pub fn duration_secs(&self) -> u64 {
		self.duration.as_secs()
	}

	/// Bitrate of the whole file, tags included (kbps)
	pub fn overall_bitrate(&self) -> u32 {
		self.overall_bitrate
	}

	/// Bitrate of the audio stream alone (kbps)
	///
	/// Where the codec declares an average bitrate, that is used instead.
	pub fn audio_bitrate(&self) -> u32 {
		self.audio_bitrate
	}

	/// Samples per second (Hz)
	pub fn sample_rate(&self) -> u32 {
		self.sample_rate
	}

	/// Bits per sample
	///
	/// Only lossless codecs record this, so MPEG streams are always `None`.
	pub fn bit_depth(&self) -> Option<u8> {
		self.bit_depth
	}

	/// Number of channels
	pub fn channels(&self) -> u8 {
		self.channels
	}

	/// Whether anything about the stream could be determined
	pub fn has_media(&self) -> bool {
		!self.duration.is_zero()
			|| self.overall_bitrate != 0
			|| self.audio_bitrate != 0
			|| self.sample_rate != 0
			|| self.channels != 0
			|| self.bit_depth.unwrap_or(0) != 0
	}
}

#[cfg(test)]
mod tests {
	use super::AudioProperties;

	#[test_log::test]
	fn bitrates_follow_duration() {
		let mut properties = AudioProperties::default();
		assert!(!properties.has_media());

		// 4 MB of audio in a 5 MB file, over 200 seconds
		properties.set_duration(200_000, 4_000_000, 5_000_000);

		assert_eq!(properties.duration_ms(), 200_000);
		assert_eq!(properties.duration_secs(), 200);
		assert_eq!(properties.audio_bitrate(), 160);
		assert_eq!(properties.overall_bitrate(), 200);
		assert!(properties.has_media());
	}
}
