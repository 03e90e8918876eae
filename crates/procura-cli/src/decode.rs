//! Character encoding detection for saved announcement pages.
//!
//! Pages come from many sites and many years, so the bytes on disk are
//! UTF-8, GBK/GB2312/GB18030, or occasionally something else. Detection
//! order:
//! 1. BOM (UTF-8, UTF-16 LE/BE)
//! 2. strict UTF-8
//! 3. strict GB18030 (covers GBK and GB2312)
//! 4. chardetng's guess, decoded strictly
//! 5. lossy UTF-8

use std::fs;
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, GB18030};
use procura_core::{ExtractError, Result};

/// How a buffer was decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedEncoding {
    /// Valid UTF-8 without BOM
    Utf8,
    /// Encoding announced by a byte order mark
    Bom(&'static Encoding),
    /// Decoded as GB18030 without a single replacement
    Gb18030,
    /// Statistical guess by chardetng
    Legacy(&'static Encoding),
    /// Nothing decoded cleanly; invalid sequences were replaced
    Lossy,
}

impl std::fmt::Display for DetectedEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Utf8 => write!(f, "UTF-8"),
            Self::Bom(enc) => write!(f, "{} with BOM", enc.name()),
            Self::Gb18030 => write!(f, "gb18030"),
            Self::Legacy(enc) => write!(f, "{}", enc.name()),
            Self::Lossy => write!(f, "UTF-8 (lossy)"),
        }
    }
}

/// Decode raw page bytes into text.
///
/// # Errors
///
/// Returns [`ExtractError::Decode`] for buffers that look binary (NUL bytes
/// without a UTF-16 BOM).
///
/// ```rust
/// use procura_cli::decode::{decode_html, DetectedEncoding};
///
/// // "采购" in GBK
/// let (text, encoding) = decode_html(&[0xB2, 0xC9, 0xB9, 0xBA]).unwrap();
/// assert_eq!(text, "采购");
/// assert_eq!(encoding, DetectedEncoding::Gb18030);
/// ```
pub fn decode_html(buffer: &[u8]) -> Result<(String, DetectedEncoding)> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(buffer) {
        let (text, _) = encoding.decode_without_bom_handling(&buffer[bom_len..]);
        return Ok((text.into_owned(), DetectedEncoding::Bom(encoding)));
    }

    if buffer.contains(&0) {
        return Err(ExtractError::Decode(
            "buffer contains NUL bytes and no byte order mark".to_string(),
        ));
    }

    if let Ok(text) = std::str::from_utf8(buffer) {
        return Ok((text.to_string(), DetectedEncoding::Utf8));
    }

    if let Some(text) = GB18030.decode_without_bom_handling_and_without_replacement(buffer) {
        return Ok((text.into_owned(), DetectedEncoding::Gb18030));
    }

    let mut detector = EncodingDetector::new();
    detector.feed(buffer, true);
    let guess = detector.guess(None, true);
    if let Some(text) = guess.decode_without_bom_handling_and_without_replacement(buffer) {
        return Ok((text.into_owned(), DetectedEncoding::Legacy(guess)));
    }

    Ok((
        String::from_utf8_lossy(buffer).into_owned(),
        DetectedEncoding::Lossy,
    ))
}

/// Read a page from disk and decode it.
///
/// # Errors
///
/// [`ExtractError::Io`] if the file cannot be read, [`ExtractError::Decode`]
/// as for [`decode_html`].
pub fn read_html_file(path: &Path) -> Result<(String, DetectedEncoding)> {
    let buffer = fs::read(path)?;
    let decoded = decode_html(&buffer)?;
    log::trace!("{}: {}", path.display(), decoded.1);
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_16LE, UTF_8};

    #[test]
    fn test_decode_utf8() {
        let (text, encoding) = decode_html("项目名称：测试".as_bytes()).unwrap();
        assert_eq!(text, "项目名称：测试");
        assert_eq!(encoding, DetectedEncoding::Utf8);
    }

    #[test]
    fn test_decode_utf8_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("<p>公告</p>".as_bytes());
        let (text, encoding) = decode_html(&bytes).unwrap();
        assert_eq!(text, "<p>公告</p>");
        assert_eq!(encoding, DetectedEncoding::Bom(UTF_8));
    }

    #[test]
    fn test_decode_utf16_le_bom() {
        let bytes = [0xFF, 0xFE, b'H', 0x00, b'i', 0x00];
        let (text, encoding) = decode_html(&bytes).unwrap();
        assert_eq!(text, "Hi");
        assert_eq!(encoding, DetectedEncoding::Bom(UTF_16LE));
    }

    #[test]
    fn test_decode_gbk_page() {
        let (bytes, _, had_errors) = GB18030.encode("<p>采购人名称：某市财政局</p>");
        assert!(!had_errors);
        let (text, encoding) = decode_html(&bytes).unwrap();
        assert_eq!(text, "<p>采购人名称：某市财政局</p>");
        assert_eq!(encoding, DetectedEncoding::Gb18030);
    }

    #[test]
    fn test_binary_is_decode_error() {
        let result = decode_html(&[b'<', 0x00, 0x01, 0x02, b'>']);
        assert!(matches!(result, Err(ExtractError::Decode(_))));
    }

    #[test]
    fn test_empty_buffer() {
        let (text, encoding) = decode_html(&[]).unwrap();
        assert_eq!(text, "");
        assert_eq!(encoding, DetectedEncoding::Utf8);
    }

    #[test]
    fn test_display() {
        assert_eq!(DetectedEncoding::Utf8.to_string(), "UTF-8");
        assert_eq!(DetectedEncoding::Gb18030.to_string(), "gb18030");
        assert_eq!(DetectedEncoding::Bom(UTF_8).to_string(), "UTF-8 with BOM");
        assert_eq!(DetectedEncoding::Lossy.to_string(), "UTF-8 (lossy)");
    }

    #[test]
    fn test_read_html_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        let (bytes, _, _) = GB18030.encode("<p>中标金额：50万元</p>");
        fs::write(&path, &bytes).unwrap();

        let (text, _) = read_html_file(&path).unwrap();
        assert_eq!(text, "<p>中标金额：50万元</p>");

        let missing = read_html_file(&dir.path().join("missing.html"));
        assert!(matches!(missing, Err(ExtractError::Io(_))));
    }
}
