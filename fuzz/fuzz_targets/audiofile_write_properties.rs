#![no_main]

use audiotags::config::{ParseOptions, WriteOptions};
use audiotags::file::AudioFile;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: Vec<u8>| {
	let Ok(mut file) = AudioFile::open_from_memory(data, ParseOptions::new()) else {
		return;
	};

	// Anything that was read has to survive being written back
	if file
		.write_properties([("TITLE", "Fuzz"), ("ARTIST", "audiotags")], WriteOptions::default())
		.is_ok()
	{
		let bytes = file.into_bytes().unwrap();
		let file = AudioFile::open_from_memory(bytes, ParseOptions::new()).unwrap();
		assert_eq!(file.properties().unwrap().title(), Some("Fuzz"));
	}
});
