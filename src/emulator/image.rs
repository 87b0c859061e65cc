use crate::errors::ProgramLoadError;
use crate::hardware::MEMORY_SIZE;
use std::fs;
use std::path::Path;

/// A program ready to be placed into memory: an origin address followed by
/// the instruction and data words that go there.
///
/// The on-disk format is big-endian: a two byte origin header, then the
/// words of the program. [`Self::from_bytes`] converts each pair of bytes
/// with [`u16::from_be_bytes`]; a trailing odd byte is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    origin: u16,
    words: Vec<u16>,
}

impl ProgramImage {
    /// Builds an image from an origin and already decoded words.
    ///
    /// Words that would fall past the end of the address space are dropped,
    /// so loading an image can never write outside memory.
    #[must_use]
    pub fn new(origin: u16, mut words: Vec<u16>) -> Self {
        words.truncate(MEMORY_SIZE - usize::from(origin));
        Self { origin, words }
    }

    /// Decodes a big-endian image file held in memory.
    ///
    /// # Errors
    /// [`ProgramLoadError::MissingOriginHeader`] when `bytes` is too short
    /// to contain the two byte origin.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProgramLoadError> {
        let (header, body) = bytes
            .split_at_checked(2)
            .ok_or(ProgramLoadError::MissingOriginHeader)?;
        let origin = u16::from_be_bytes([header[0], header[1]]);
        let capacity = MEMORY_SIZE - usize::from(origin);
        let words = body
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .take(capacity)
            .collect();
        Ok(Self { origin, words })
    }

    /// Reads and decodes an image file from disk.
    ///
    /// # Errors
    /// [`ProgramLoadError::Io`] when the file cannot be read,
    /// [`ProgramLoadError::MissingOriginHeader`] when it is too short.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProgramLoadError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Address the first word loads at.
    #[must_use]
    pub const fn origin(&self) -> u16 {
        self.origin
    }

    /// The decoded program words in load order.
    #[must_use]
    pub fn words(&self) -> &[u16] {
        &self.words
    }

    /// Number of words the image occupies in memory.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.words.len()
    }

    /// True for a header-only image with nothing to load.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;

    #[gtest]
    pub fn test_from_bytes_decodes_big_endian_words() {
        let sut = ProgramImage::from_bytes(&[0x30, 0x00, 0xF0, 0x25, 0x12, 0x34]).unwrap();
        expect_that!(sut.origin(), eq(0x3000));
        expect_that!(sut.words(), eq(&[0xF025, 0x1234]));
    }

    #[gtest]
    pub fn test_from_bytes_ignores_trailing_odd_byte() {
        let sut = ProgramImage::from_bytes(&[0x30, 0x00, 0xF0, 0x25, 0xFF]).unwrap();
        expect_that!(sut.words(), eq(&[0xF025]));
    }

    #[gtest]
    pub fn test_from_bytes_accepts_header_only_image() {
        let sut = ProgramImage::from_bytes(&[0x30, 0x00]).unwrap();
        expect_that!(sut.origin(), eq(0x3000));
        expect_that!(sut.words().is_empty(), eq(true));
    }

    #[gtest]
    pub fn test_from_bytes_rejects_missing_header() {
        let error = ProgramImage::from_bytes(&[0x30]).unwrap_err();
        assert_that!(
            error.to_string(),
            eq("program image is missing the origin word")
        );
    }

    #[gtest]
    pub fn test_from_bytes_drops_words_past_end_of_memory() {
        // Origin one below the top leaves room for exactly one word.
        let sut = ProgramImage::from_bytes(&[0xFF, 0xFF, 0xAB, 0xCD, 0x12, 0x34]).unwrap();
        expect_that!(sut.origin(), eq(0xFFFF));
        expect_that!(sut.words(), eq(&[0xABCD]));
    }

    #[gtest]
    pub fn test_new_drops_words_past_end_of_memory() {
        let sut = ProgramImage::new(0xFFFE, vec![1, 2, 3, 4]);
        expect_that!(sut.words(), eq(&[1, 2]));
    }

    #[gtest]
    pub fn test_from_file_reports_unreadable_path() {
        let error = ProgramImage::from_file("/nonexistent/image.obj").unwrap_err();
        assert!(matches!(error, ProgramLoadError::Io(_)), "{error:?}");
    }
}
