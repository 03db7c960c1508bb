#![allow(missing_docs)]

mod flac_bytes;
mod format_parsers;

/// A minimal image of each supported format, `width` x `height`
pub(crate) mod images {
	pub fn png(width: u32, height: u32, color_type: u8) -> Vec<u8> {
		let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
		data.extend(13_u32.to_be_bytes());
		data.extend(b"IHDR");
		data.extend(width.to_be_bytes());
		data.extend(height.to_be_bytes());
		data.extend([8, color_type, 0, 0, 0]);
		// CRC
		data.extend([0; 4]);
		data
	}

	pub fn jpeg(width: u16, height: u16) -> Vec<u8> {
		let mut data = vec![0xFF, 0xD8];

		// APP0, skipped
		data.extend([0xFF, 0xE0, 0x00, 0x10]);
		data.extend(b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0");

		// SOF0, 8 bit precision, 3 components
		data.extend([0xFF, 0xC0, 0x00, 0x11, 0x08]);
		data.extend(height.to_be_bytes());
		data.extend(width.to_be_bytes());
		data.push(3);
		data.extend([0; 9]);

		data.extend([0xFF, 0xD9]);
		data
	}

	pub fn gif(width: u16, height: u16) -> Vec<u8> {
		let mut data = b"GIF89a".to_vec();
		data.extend(width.to_le_bytes());
		data.extend(height.to_le_bytes());
		// Global color table, 8 bits per pixel
		data.extend([0x87, 0, 0]);
		data
	}

	pub fn bmp(width: i32, height: i32) -> Vec<u8> {
		let mut data = b"BM".to_vec();
		data.extend([0; 12]);
		data.extend(40_u32.to_le_bytes());
		data.extend(width.to_le_bytes());
		data.extend(height.to_le_bytes());
		// Planes, bits per pixel
		data.extend(1_u16.to_le_bytes());
		data.extend(24_u16.to_le_bytes());
		// Compression, image size, resolution
		data.extend([0; 16]);
		// Colors used, important colors
		data.extend([0; 8]);
		data
	}
}
