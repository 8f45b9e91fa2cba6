#![no_main]
use libfuzzer_sys::fuzz_target;
use rar_blocks::formats::RAR15_SIGNATURE;
use rar_blocks::ArchiveDecoder;

// Fuzz a complete archive behind a valid marker, then every derived property.
fuzz_target!(|data: &[u8]| {
    let mut input = RAR15_SIGNATURE.to_vec();
    input.extend_from_slice(data);

    let archive = match ArchiveDecoder::new().decode_bytes(&input) {
        Ok(a) => a,
        Err(_) => return,
    };
    let _ = archive.description();
    let _ = archive.mime_type();
    let _ = archive.filename_suffix();
    if let Some(size) = archive.content_size() {
        assert!(size <= input.len() as u64);
    }
});
