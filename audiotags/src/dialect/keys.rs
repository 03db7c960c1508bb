use std::collections::HashMap;

// Creates a two-way lookup table between native identifiers and canonical keys
//
// Usage:
//
// gen_map!(
//     NAME;
//
//     "native" => "CANONICAL",
// );
//
// Native identifiers should be unique. When multiple native identifiers map to the same
// canonical key, the first one listed is used when encoding.
macro_rules! gen_map {
	(
		$(#[$meta:meta])*
		$NAME:ident;

		$(
			$native:literal => $canonical:literal
		),+ $(,)?
	) => {
		$(#[$meta])*
		#[allow(non_camel_case_types)]
		pub(crate) struct $NAME;

		impl $NAME {
			const ENTRIES: &'static [(&'static str, &'static str)] = &[$(($native, $canonical),)+];

			/// Get the canonical key for a native identifier
			pub(crate) fn canonical(native: &str) -> Option<&'static str> {
				static INSTANCE: std::sync::OnceLock<HashMap<&'static str, &'static str>> =
					std::sync::OnceLock::new();
				let map = INSTANCE.get_or_init(|| Self::ENTRIES.iter().copied().collect());

				map.get(native).copied().or_else(|| {
					map.iter()
						.find(|(k, _)| k.eq_ignore_ascii_case(native))
						.map(|(_, v)| *v)
				})
			}

			/// Get the native identifier for a canonical key
			pub(crate) fn native(canonical: &str) -> Option<&'static str> {
				static INSTANCE: std::sync::OnceLock<HashMap<&'static str, &'static str>> =
					std::sync::OnceLock::new();
				let map = INSTANCE.get_or_init(|| {
					let mut map = HashMap::new();
					for (native, canonical) in Self::ENTRIES {
						map.entry(*canonical).or_insert(*native);
					}
					map
				});

				map.get(canonical).copied().or_else(|| {
					map.iter()
						.find(|(k, _)| k.eq_ignore_ascii_case(canonical))
						.map(|(_, v)| *v)
				})
			}
		}
	}
}

gen_map!(
	/// ID3v2 text frames
	ID3V2_MAP;

	"TIT2" => "TITLE",
	"TPE1" => "ARTIST",
	"TALB" => "ALBUM",
	"TPE2" => "ALBUMARTIST",
	"TIT3" => "SUBTITLE",
	"TIT1" => "GROUPING",
	"TRCK" => "TRACKNUMBER",
	"TPOS" => "DISCNUMBER",
	"TDRC" => "DATE",
	"TDOR" => "ORIGINALDATE",
	"TDRL" => "RELEASEDATE",
	"TDTG" => "TAGGINGDATE",
	"TDEN" => "ENCODINGTIME",
	"TCON" => "GENRE",
	"TCOM" => "COMPOSER",
	"TEXT" => "LYRICIST",
	"TPE3" => "CONDUCTOR",
	"TPE4" => "REMIXER",
	"TPUB" => "LABEL",
	"TCOP" => "COPYRIGHT",
	"TENC" => "ENCODEDBY",
	"TSSE" => "ENCODING",
	"TBPM" => "BPM",
	"TKEY" => "INITIALKEY",
	"TLAN" => "LANGUAGE",
	"TLEN" => "LENGTH",
	"TMED" => "MEDIA",
	"TMOO" => "MOOD",
	"TSRC" => "ISRC",
	"TCMP" => "COMPILATION",
	"TSST" => "DISCSUBTITLE",
	"TOAL" => "ORIGINALALBUM",
	"TOPE" => "ORIGINALARTIST",
	"TOLY" => "ORIGINALLYRICIST",
	"TOFN" => "ORIGINALFILENAME",
	"TOWN" => "OWNER",
	"TRSN" => "RADIOSTATION",
	"TRSO" => "RADIOSTATIONOWNER",
	"TSOA" => "ALBUMSORT",
	"TSO2" => "ALBUMARTISTSORT",
	"TSOP" => "ARTISTSORT",
	"TSOT" => "TITLESORT",
	"TSOC" => "COMPOSERSORT",
	"TMCL" => "MUSICIANCREDITS",
	"MVNM" => "MOVEMENTNAME",
	"MVIN" => "MOVEMENTNUMBER",
);

gen_map!(
	/// ID3v2 URL link frames
	ID3V2_URL_MAP;

	"WCOM" => "COMMERCIALURL",
	"WCOP" => "COPYRIGHTURL",
	"WOAF" => "FILEWEBPAGE",
	"WOAR" => "ARTISTWEBPAGE",
	"WOAS" => "AUDIOSOURCEWEBPAGE",
	"WORS" => "RADIOSTATIONWEBPAGE",
	"WPAY" => "PAYMENTWEBPAGE",
	"WPUB" => "PUBLISHERWEBPAGE",
);

gen_map!(
	/// MP4 `ilst` atoms with a four character identifier
	ILST_MAP;

	"\u{a9}nam" => "TITLE",
	"\u{a9}ART" => "ARTIST",
	"\u{a9}alb" => "ALBUM",
	"aART"      => "ALBUMARTIST",
	"\u{a9}grp" => "GROUPING",
	"trkn"      => "TRACKNUMBER",
	"disk"      => "DISCNUMBER",
	"\u{a9}day" => "DATE",
	"\u{a9}gen" => "GENRE",
	"\u{a9}wrt" => "COMPOSER",
	"\u{a9}cmt" => "COMMENT",
	"\u{a9}lyr" => "LYRICS",
	"\u{a9}too" => "ENCODING",
	"\u{a9}enc" => "ENCODEDBY",
	"cprt"      => "COPYRIGHT",
	"tmpo"      => "BPM",
	"cpil"      => "COMPILATION",
	"pgap"      => "GAPLESSPLAYBACK",
	"pcst"      => "PODCAST",
	"soal"      => "ALBUMSORT",
	"soaa"      => "ALBUMARTISTSORT",
	"soar"      => "ARTISTSORT",
	"sonm"      => "TITLESORT",
	"soco"      => "COMPOSERSORT",
	"\u{a9}wrk" => "WORK",
	"\u{a9}mvn" => "MOVEMENTNAME",
	"\u{a9}mvi" => "MOVEMENTNUMBER",
	"tvsh"      => "SHOWNAME",
	"sosn"      => "SHOWSORT",
	"desc"      => "DESCRIPTION",
	"catg"      => "PODCASTCATEGORY",
	"keyw"      => "PODCASTKEYWORDS",
	"purl"      => "PODCASTURL",
	"egid"      => "PODCASTID",
);

gen_map!(
	/// Descriptions of ID3v2 `TXXX` frames and names of MP4 `com.apple.iTunes` freeform atoms
	///
	/// Anything not listed here uses its description uppercased.
	DESCRIPTION_MAP;

	"MusicBrainz Track Id"          => "MUSICBRAINZ_TRACKID",
	"MusicBrainz Album Id"          => "MUSICBRAINZ_ALBUMID",
	"MusicBrainz Artist Id"         => "MUSICBRAINZ_ARTISTID",
	"MusicBrainz Album Artist Id"   => "MUSICBRAINZ_ALBUMARTISTID",
	"MusicBrainz Release Group Id"  => "MUSICBRAINZ_RELEASEGROUPID",
	"MusicBrainz Release Track Id"  => "MUSICBRAINZ_RELEASETRACKID",
	"MusicBrainz Work Id"           => "MUSICBRAINZ_WORKID",
	"MusicBrainz Album Type"        => "RELEASETYPE",
	"MusicBrainz Album Status"      => "RELEASESTATUS",
	"MusicBrainz Album Release Country" => "RELEASECOUNTRY",
	"Acoustid Id"                   => "ACOUSTID_ID",
	"Acoustid Fingerprint"          => "ACOUSTID_FINGERPRINT",
	"MusicIP PUID"                  => "MUSICIP_PUID",
);

/// The canonical key for a user-defined description (`TXXX`, freeform atoms)
pub(crate) fn description_to_key(description: &str) -> String {
	match DESCRIPTION_MAP::canonical(description) {
		Some(key) => key.to_owned(),
		None => description.to_uppercase(),
	}
}

/// The description to write for a canonical key stored in a user-defined slot
pub(crate) fn key_to_description(key: &str) -> &str {
	DESCRIPTION_MAP::native(key).unwrap_or(key)
}
