#![no_main]

use audiotags::config::ParsingMode;
use audiotags::picture::Picture;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
	let _ = Picture::from_flac_bytes(data, true, ParsingMode::Relaxed);
	let _ = Picture::from_flac_bytes(data, false, ParsingMode::Relaxed);
});
