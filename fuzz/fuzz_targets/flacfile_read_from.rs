#![no_main]

use std::io::Cursor;

use audiotags::config::{ParseOptions, ParsingMode};
use audiotags::file::FileType;
use audiotags::probe::Probe;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: Vec<u8>| {
	let _ = Probe::with_file_type(Cursor::new(data), FileType::Flac)
		.options(ParseOptions::new().parsing_mode(ParsingMode::Relaxed))
		.read();
});
