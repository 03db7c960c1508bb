use super::constants::GENRES;
use super::tag::Id3v1Tag;
use crate::util::text::latin1_decode;

pub(crate) fn parse_id3v1(reader: &[u8; 128]) -> Id3v1Tag {
	let reader = &reader[3..];

	let mut tag = Id3v1Tag {
		title: decode_text(&reader[..30]),
		artist: decode_text(&reader[30..60]),
		album: decode_text(&reader[60..90]),
		year: decode_text(&reader[90..94]).and_then(|year| year.parse::<u16>().ok()),
		comment: None,
		track_number: None,
		genre: None,
	};

	let range = if reader[122] == 0 && reader[123] != 0 {
		tag.track_number = Some(reader[123]);

		94_usize..122
	} else {
		94..124
	};

	tag.comment = decode_text(&reader[range]);

	if usize::from(reader[124]) < GENRES.len() {
		tag.genre = Some(reader[124]);
	}

	tag
}

fn decode_text(data: &[u8]) -> Option<String> {
	let end = data.iter().position(|c| *c == 0).unwrap_or(data.len());
	let read = latin1_decode(&data[..end]);
	let read = read.trim_end();

	if read.is_empty() {
		None
	} else {
		Some(read.to_owned())
	}
}
