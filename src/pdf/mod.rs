pub mod document;
pub mod toc;

#[cfg(test)]
pub mod testing;

pub use document::PdfDocument;

/// Decode a PDF text string (UTF-16BE or UTF-8 with BOM, else PDFDocEncoding).
pub(crate) fn decode_pdf_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let u16_chars: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&u16_chars)
        }
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        // PDFDocEncoding / Latin-1 (simplified)
        _ => bytes.iter().map(|&b| b as char).collect(),
    }
}
