//! UTF-8 validation, BOM handling and transcoding of legacy encodings.

use std::borrow::Cow;

use chardetng::EncodingDetector;
use simdutf8::compat::from_utf8;

use crate::error::{CsvError, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Check if the given bytes are valid UTF-8.
#[inline]
pub fn is_utf8(data: &[u8]) -> bool {
    simdutf8::basic::from_utf8(data).is_ok()
}

/// Length of the UTF-8 BOM at the very start of `data`, or 0.
#[inline]
pub fn bom_len(data: &[u8]) -> usize {
    if data.starts_with(UTF8_BOM) {
        UTF8_BOM.len()
    } else {
        0
    }
}

/// View bytes as `str`, reporting the first invalid byte relative to `base`.
#[inline]
pub(crate) fn as_str(bytes: &[u8], base: usize) -> Result<&str> {
    from_utf8(bytes).map_err(|e| CsvError::Utf8 {
        offset: base + e.valid_up_to(),
    })
}

/// Transcode data to UTF-8 if it is not already UTF-8.
///
/// UTF-16 is recognised by its BOM; anything else that fails UTF-8
/// validation goes through chardetng. Returns the data and whether it
/// was transcoded.
pub fn transcode_to_utf8(data: &[u8]) -> (Cow<'_, [u8]>, bool) {
    if data.starts_with(&[0xFF, 0xFE]) {
        let (decoded, _, _) = encoding_rs::UTF_16LE.decode(data);
        return (Cow::Owned(decoded.into_owned().into_bytes()), true);
    }
    if data.starts_with(&[0xFE, 0xFF]) {
        let (decoded, _, _) = encoding_rs::UTF_16BE.decode(data);
        return (Cow::Owned(decoded.into_owned().into_bytes()), true);
    }

    if is_utf8(data) {
        return (Cow::Borrowed(data), false);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(data, true);
    let encoding = detector.guess(None, true);

    if encoding == encoding_rs::UTF_8 {
        return (Cow::Borrowed(data), false);
    }

    tracing::debug!(encoding = encoding.name(), "transcoding source to UTF-8");
    let (decoded, _, _) = encoding.decode(data);
    (Cow::Owned(decoded.into_owned().into_bytes()), true)
}
