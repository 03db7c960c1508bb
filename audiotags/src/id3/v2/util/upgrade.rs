//! Frame ID conversions between ID3v2 revisions

// ID3v2.2 IDs and their ID3v2.4 counterparts. iTunes' nonstandard frames are included.
#[rustfmt::skip]
const V2_TO_V4: [(&[u8; 3], &str); 71] = [
	(b"BUF", "RBUF"), (b"CNT", "PCNT"), (b"COM", "COMM"), (b"CRA", "AENC"),
	(b"ETC", "ETCO"), (b"GEO", "GEOB"), (b"IPL", "TIPL"), (b"MCI", "MCDI"),
	(b"MLL", "MLLT"), (b"PIC", "APIC"), (b"POP", "POPM"), (b"REV", "RVRB"),
	(b"SLT", "SYLT"), (b"STC", "SYTC"), (b"TAL", "TALB"), (b"TBP", "TBPM"),
	(b"TCM", "TCOM"), (b"TCO", "TCON"), (b"TCP", "TCMP"), (b"TCR", "TCOP"),
	(b"TDY", "TDLY"), (b"TEN", "TENC"), (b"TFT", "TFLT"), (b"TKE", "TKEY"),
	(b"TLA", "TLAN"), (b"TLE", "TLEN"), (b"TMT", "TMED"), (b"TOA", "TOPE"),
	(b"TOF", "TOFN"), (b"TOL", "TOLY"), (b"TOR", "TDOR"), (b"TOT", "TOAL"),
	(b"TP1", "TPE1"), (b"TP2", "TPE2"), (b"TP3", "TPE3"), (b"TP4", "TPE4"),
	(b"TPA", "TPOS"), (b"TPB", "TPUB"), (b"TRC", "TSRC"), (b"TRD", "TDRC"),
	(b"TRK", "TRCK"), (b"TS2", "TSO2"), (b"TSA", "TSOA"), (b"TSC", "TSOC"),
	(b"TSP", "TSOP"), (b"TSS", "TSSE"), (b"TST", "TSOT"), (b"TT1", "TIT1"),
	(b"TT2", "TIT2"), (b"TT3", "TIT3"), (b"TXT", "TEXT"), (b"TXX", "TXXX"),
	(b"TYE", "TDRC"), (b"UFI", "UFID"), (b"ULT", "USLT"), (b"WAF", "WOAF"),
	(b"WAR", "WOAR"), (b"WAS", "WOAS"), (b"WCM", "WCOM"), (b"WCP", "WCOP"),
	(b"WPB", "WPUB"), (b"WXX", "WXXX"), (b"PCS", "PCST"), (b"TCT", "TCAT"),
	(b"TDS", "TDES"), (b"TID", "TGID"), (b"WFD", "WFED"), (b"MVI", "MVIN"),
	(b"MVN", "MVNM"), (b"GP1", "GRP1"), (b"TDR", "TDRL"),
];

// Only frames that were renamed. Everything else kept its ID3v2.3 name.
#[rustfmt::skip]
const V3_TO_V4: [(&[u8; 4], &str); 3] = [
	(b"TORY", "TDOR"), (b"TYER", "TDRC"), (b"IPLS", "TIPL"),
];

/// Upgrade an ID3v2.2 frame ID to an ID3v2.4 frame ID
pub(crate) fn upgrade_v2(key: &str) -> Option<&'static str> {
	V2_TO_V4
		.iter()
		.find(|(old, _)| old.as_slice() == key.as_bytes())
		.map(|(_, new)| *new)
}

/// Upgrade an ID3v2.3 frame ID to an ID3v2.4 frame ID
pub(crate) fn upgrade_v3(key: &str) -> Option<&'static str> {
	V3_TO_V4
		.iter()
		.find(|(old, _)| old.as_slice() == key.as_bytes())
		.map(|(_, new)| *new)
}

/// The ID3v2.3 spelling of an ID3v2.4 frame ID, if it differs
pub(crate) fn downgrade_v4(key: &str) -> Option<&'static str> {
	V3_TO_V4.iter().find_map(|(old, new)| {
		if *new != key {
			return None;
		}

		std::str::from_utf8(old.as_slice()).ok()
	})
}
