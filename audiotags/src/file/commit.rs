//! Persisting staged files
//!
//! Nothing reaches the source until the staged bytes are fully built and the audio region is
//! known to be untouched.

use crate::config::WriteOptions;
use crate::error::{FileEncodingError, Result};
use crate::macros::encode_err;
use crate::model::{AudioRegion, Staged};

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Where a handle's bytes came from, and where they go back to
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Source {
	Memory,
	Path(PathBuf),
}

/// Verify that staging left the audio stream bit-identical
pub(crate) fn verify_audio(original: &[u8], audio: AudioRegion, staged: &Staged) -> Result<()> {
	if audio.len != staged.audio.len {
		encode_err!(@BAIL "Staging changed the length of the audio region");
	}

	let before = original.get(audio.range());
	let after = staged.bytes.get(staged.audio.range());
	if before.is_none() || before != after {
		encode_err!(@BAIL "Staging modified the audio region");
	}

	Ok(())
}

/// Write `staged` back to `source`
///
/// Memory sources are handled by the caller, which swaps its buffer.
pub(crate) fn commit(source: &Source, staged: &Staged, options: WriteOptions) -> Result<()> {
	let Source::Path(path) = source else {
		log::debug!("Committing {} bytes to memory", staged.bytes.len());
		return Ok(());
	};

	match &staged.in_place {
		Some(range) if !options.atomic_save => {
			log::debug!(
				"Patching {} bytes at offset {} of `{}`",
				range.len(),
				range.start,
				path.display()
			);

			patch(path, range.start as u64, &staged.bytes[range.clone()])
		},
		_ => {
			log::debug!(
				"Replacing `{}` with {} staged bytes",
				path.display(),
				staged.bytes.len()
			);

			replace(path, &staged.bytes)
		},
	}
}

fn patch(path: &Path, offset: u64, content: &[u8]) -> Result<()> {
	if content.is_empty() {
		return Ok(());
	}

	let mut file = OpenOptions::new()
		.write(true)
		.open(path)
		.map_err(|e| FileEncodingError::from_io("Unable to open the file for writing", e))?;

	file.seek(SeekFrom::Start(offset))
		.and_then(|_| file.write_all(content))
		.and_then(|()| file.sync_data())
		.map_err(|e| FileEncodingError::from_io("Unable to patch the file in place", e))?;

	Ok(())
}

// The temporary file lives next to the original, so `persist` is a rename on the same filesystem
fn replace(path: &Path, content: &[u8]) -> Result<()> {
	let dir = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};

	let mut temp = NamedTempFile::new_in(dir)
		.map_err(|e| FileEncodingError::from_io("Unable to create a temporary file", e))?;

	temp.write_all(content)
		.and_then(|()| temp.as_file().sync_all())
		.map_err(|e| FileEncodingError::from_io("Unable to write the temporary file", e))?;

	match std::fs::metadata(path) {
		Ok(metadata) => {
			if let Err(e) = temp.as_file().set_permissions(metadata.permissions()) {
				log::warn!("Unable to copy the permissions of `{}`: {e}", path.display());
			}
		},
		Err(e) => log::warn!("Unable to read the metadata of `{}`: {e}", path.display()),
	}

	temp.persist(path)
		.map_err(|e| FileEncodingError::from_io("Unable to replace the original file", e.error))?;

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::{Source, commit, verify_audio};
	use crate::config::WriteOptions;
	use crate::error::ErrorKind;
	use crate::model::{AudioRegion, Staged};

	const ORIGINAL: &[u8] = b"meta-AUDIO-tail";
	const AUDIO: AudioRegion = AudioRegion { offset: 5, len: 5 };

	#[test_log::test]
	fn audio_must_be_untouched() {
		let staged = Staged::splice(ORIGINAL, 0..4, b"META", AUDIO);
		assert!(verify_audio(ORIGINAL, AUDIO, &staged).is_ok());

		let staged = Staged::splice(ORIGINAL, 5..10, b"VIDEO", AUDIO);
		let err = verify_audio(ORIGINAL, AUDIO, &staged).unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::WriteError(_)));
	}

	#[test_log::test]
	fn in_place_patch() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("file.bin");
		std::fs::write(&path, ORIGINAL).unwrap();

		let staged = Staged::splice(ORIGINAL, 0..4, b"META", AUDIO);
		commit(
			&Source::Path(path.clone()),
			&staged,
			WriteOptions::new().atomic_save(false),
		)
		.unwrap();

		assert_eq!(std::fs::read(&path).unwrap(), b"META-AUDIO-tail");
	}

	#[test_log::test]
	fn atomic_replace() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("file.bin");
		std::fs::write(&path, ORIGINAL).unwrap();

		let staged = Staged::splice(
			ORIGINAL,
			0..4,
			b"LONGER META",
			AudioRegion { offset: 12, len: 5 },
		);
		commit(&Source::Path(path.clone()), &staged, WriteOptions::default()).unwrap();

		assert_eq!(std::fs::read(&path).unwrap(), b"LONGER META-AUDIO-tail");

		// Nothing is left behind
		assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
	}

	#[test_log::test]
	fn missing_directory_is_a_write_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("gone").join("file.bin");

		let staged = Staged::splice(ORIGINAL, 0..4, b"META", AUDIO);
		let err = commit(&Source::Path(path), &staged, WriteOptions::default()).unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::WriteError(_)));
	}
}
