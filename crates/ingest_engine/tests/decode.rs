use ingest_engine::{decode_text, DecodeError};
use pretty_assertions::assert_eq;

#[test]
fn plain_utf8_is_decoded_as_is() {
    let decoded = decode_text("héllo wörld\n".as_bytes()).unwrap();
    assert_eq!(decoded.text, "héllo wörld\n");
    assert_eq!(decoded.encoding_label, "UTF-8");
}

#[test]
fn utf8_bom_is_stripped() {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(b"fn main() {}");
    let decoded = decode_text(&bytes).unwrap();
    assert_eq!(decoded.text, "fn main() {}");
}

#[test]
fn utf16_with_bom_is_not_mistaken_for_binary() {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in "notes".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let decoded = decode_text(&bytes).unwrap();
    assert_eq!(decoded.text, "notes");
    assert_eq!(decoded.encoding_label, "UTF-16LE");
}

#[test]
fn nul_bytes_mark_content_as_binary() {
    let bytes = [0x7F, b'E', b'L', b'F', 0x00, 0x01, 0x02];
    assert_eq!(decode_text(&bytes), Err(DecodeError::Binary));
}

#[test]
fn legacy_single_byte_text_falls_back_to_detection() {
    // "café crème" in windows-1252.
    let bytes = b"caf\xe9 cr\xe8me, d\xe9j\xe0 vu, tr\xe8s \xe9l\xe9gant";
    let decoded = decode_text(bytes).unwrap();
    assert!(decoded.text.starts_with("café crème"));
    assert_ne!(decoded.encoding_label, "UTF-8");
}

#[test]
fn empty_input_is_empty_text() {
    let decoded = decode_text(&[]).unwrap();
    assert_eq!(decoded.text, "");
}
