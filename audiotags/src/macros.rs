macro_rules! try_vec {
	($elem:expr; $size:expr) => {{ $crate::util::alloc::fallible_vec_from_element($elem, $size)? }};
}

// `return Err(...)` with a bare `ErrorKind`, optionally carrying a value
//
// - err!(InvalidHandle)
// - err!(Id3v2(error))
macro_rules! err {
	($variant:ident $(($value:expr))?) => {
		return Err(crate::error::AudioTagsError::new(
			crate::error::ErrorKind::$variant$(($value))?,
		))
	};
}

// Builds a `FileDecodingError` wrapped in the given `ErrorKind`
macro_rules! block_err {
	($kind:ident, $file_ty:ident, $reason:literal) => {
		crate::error::AudioTagsError::new(crate::error::ErrorKind::$kind(
			crate::error::FileDecodingError::new(crate::file::FileType::$file_ty, $reason),
		))
	};
	($kind:ident, $reason:literal) => {
		crate::error::AudioTagsError::new(crate::error::ErrorKind::$kind(
			crate::error::FileDecodingError::from_description($reason),
		))
	};
}

// A structure that can't be decoded
//
// - decode_err!(Mp4, "Message") or decode_err!("Message")
// - decode_err!(@BAIL Mp4, "Message") to return it
macro_rules! decode_err {
	(@BAIL $($file_ty:ident,)? $reason:literal) => {
		return Err(crate::macros::block_err!(CorruptBlock, $($file_ty,)? $reason))
	};
	($($file_ty:ident,)? $reason:literal) => {
		crate::macros::block_err!(CorruptBlock, $($file_ty,)? $reason)
	};
}

// A declared length that runs past the end of the input, same forms as `decode_err!`
macro_rules! truncated_err {
	(@BAIL $($file_ty:ident,)? $reason:literal) => {
		return Err(crate::macros::block_err!(TruncatedInput, $($file_ty,)? $reason))
	};
	($($file_ty:ident,)? $reason:literal) => {
		crate::macros::block_err!(TruncatedInput, $($file_ty,)? $reason)
	};
}

// A model that can't be serialized, same forms as `decode_err!`
macro_rules! encode_err {
	(@BAIL $($file_ty:ident,)? $reason:literal) => {
		return Err(encode_err!($($file_ty,)? $reason))
	};
	($file_ty:ident, $reason:literal) => {
		crate::error::AudioTagsError::from(crate::error::FileEncodingError::new(
			crate::file::FileType::$file_ty,
			$reason,
		))
	};
	($reason:literal) => {
		crate::error::AudioTagsError::from(crate::error::FileEncodingError::from_description(
			$reason,
		))
	};
}

// Picks a branch by `ParsingMode`. Modes without a branch take `DEFAULT`.
//
// parse_mode_choice!(
// 	parse_mode,
// 	STRICT: return Err(e),
// 	DEFAULT: log::warn!("...")
// )
macro_rules! parse_mode_choice {
	(
		$parse_mode:ident,
		$(STRICT: $strict:expr,)?
		$(RELAXED: $relaxed:expr,)?
		DEFAULT: $default:expr
	) => {
		match $parse_mode {
			$(crate::config::ParsingMode::Strict => $strict,)?
			$(crate::config::ParsingMode::Relaxed => $relaxed,)?
			#[allow(unreachable_patterns)]
			_ => $default,
		}
	};
}

pub(crate) use {
	block_err, decode_err, encode_err, err, parse_mode_choice, truncated_err, try_vec,
};
