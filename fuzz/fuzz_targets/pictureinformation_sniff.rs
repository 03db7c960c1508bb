#![no_main]

use audiotags::picture::PictureInformation;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
	let _ = PictureInformation::sniff(data);
});
