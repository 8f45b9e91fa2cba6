//! Whole-stream decoding scenarios.

use crate::archive::{ArchiveDecoder, DecodeOptions, DEFAULT_MIME_TYPE, FALLBACK_MIME_TYPE};
use crate::cursor::{ByteCursor, SliceCursor};
use crate::error::{RarError, StructuralFault};
use crate::formats::{BlockType, CompressionMethod, RAR15_SIGNATURE};
use crate::parsing::{Block, BlockBody, BlockDispatcher};

const STORE: u8 = 0x30;
const FASTEST: u8 = 0x31;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Archive bytes assembled block by block.
struct ArchiveBuilder {
    bytes: Vec<u8>,
}

impl ArchiveBuilder {
    fn new() -> Self {
        Self {
            bytes: RAR15_SIGNATURE.to_vec(),
        }
    }

    fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    fn archive_header(self, flags: u16) -> Self {
        let mut block = vec![0x00, 0x00, 0x73];
        block.extend_from_slice(&flags.to_le_bytes());
        block.extend_from_slice(&13u16.to_le_bytes());
        block.extend_from_slice(&[0u8; 6]);
        self.raw(&block)
    }

    fn comment(self, data: &[u8]) -> Self {
        let mut block = vec![0x00, 0x00, 0x75, 0x00, 0x00];
        block.extend_from_slice(&(13 + data.len() as u16).to_le_bytes());
        block.extend_from_slice(&(data.len() as u16).to_le_bytes());
        block.extend_from_slice(&[0x14, STORE, 0x00, 0x00]);
        block.extend_from_slice(data);
        self.raw(&block)
    }

    fn file(self, flags: u16, name: &str, method: u8, extra: &[u8], data: &[u8]) -> Self {
        let head_size = 32 + name.len() + extra.len();
        let mut block = vec![0x00, 0x00, 0x74];
        block.extend_from_slice(&flags.to_le_bytes());
        block.extend_from_slice(&(head_size as u16).to_le_bytes());
        block.extend_from_slice(&(data.len() as u32).to_le_bytes()); // packed
        block.extend_from_slice(&(data.len() as u32).to_le_bytes()); // unpacked
        block.push(2); // Win32
        block.extend_from_slice(&0xCAFEBABEu32.to_le_bytes());
        block.extend_from_slice(&0x5870_6EEFu32.to_le_bytes());
        block.push(29);
        block.push(method);
        block.extend_from_slice(&(name.len() as u16).to_le_bytes());
        block.extend_from_slice(&0x20u32.to_le_bytes()); // Archive
        block.extend_from_slice(name.as_bytes());
        block.extend_from_slice(extra);
        block.extend_from_slice(data);
        self.raw(&block)
    }

    fn opaque(self, tag: u8, added: Option<&[u8]>, body: &[u8]) -> Self {
        let mut block = vec![0x00, 0x00, tag];
        match added {
            Some(added) => {
                block.extend_from_slice(&0x0100u16.to_le_bytes());
                block.extend_from_slice(&(11 + body.len() as u16).to_le_bytes());
                block.extend_from_slice(&(added.len() as u32).to_le_bytes());
                block.extend_from_slice(body);
                block.extend_from_slice(added);
            }
            None => {
                block.extend_from_slice(&0u16.to_le_bytes());
                block.extend_from_slice(&(7 + body.len() as u16).to_le_bytes());
                block.extend_from_slice(body);
            }
        }
        self.raw(&block)
    }

    fn end(self) -> Self {
        self.raw(&[0x00, 0x00, 0x7B, 0x00, 0x40, 0x07, 0x00])
    }

    fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Every block, nested ones included, depth first.
fn walk<'a>(blocks: &'a [Block], out: &mut Vec<&'a Block>) {
    for block in blocks {
        out.push(block);
        if let Some(nested) = block.nested() {
            walk(std::slice::from_ref(nested), out);
        }
    }
}

#[test]
fn test_marker_only() {
    let data = ArchiveBuilder::new().build();
    let archive = ArchiveDecoder::new().decode_bytes(&data).unwrap();

    assert!(archive.is_complete());
    assert_eq!(archive.blocks().len(), 1);
    let marker = &archive.blocks()[0];
    assert_eq!(marker.block_type(), BlockType::Marker);
    assert_eq!(marker.header.crc16, 0x6152);
    assert!(!marker.has_extended_size);
    assert!(marker.is_ignorable);
    assert_eq!(marker.declared_size, 7);
    assert_eq!(marker.total_size, 7);
    match &marker.body {
        BlockBody::Marker(body) => {
            assert_eq!(body.flags.raw(), 0x1A21);
            assert!(body.extra.is_empty());
        }
        other => panic!("unexpected body {:?}", other),
    }
    assert_eq!(archive.content_size(), Some(7));
}

#[test]
fn test_not_an_archive() {
    let err = ArchiveDecoder::new()
        .decode_bytes(b"PK\x03\x04 not rar")
        .unwrap_err();
    assert!(matches!(err, RarError::InvalidSignature));
}

#[test]
fn test_file_entry_with_extra_and_payload() {
    let data = ArchiveBuilder::new()
        .file(0, "a.txt", FASTEST, &[1, 2, 3, 4, 5], b"0123456789")
        .build();
    let archive = ArchiveDecoder::new().decode_bytes(&data).unwrap();
    assert!(archive.is_complete());

    let block = &archive.blocks()[1];
    assert_eq!(block.offset(), 7);
    assert_eq!(block.declared_size, 42);
    assert_eq!(block.total_size, 52);
    assert_eq!(block.description(), "File entry: a.txt (10 bytes)");

    let file = block.as_file().unwrap();
    assert_eq!(file.head_size, 42);
    assert_eq!(file.filename(), "a.txt");
    assert_eq!(file.compressed_size(), 10);
    assert_eq!(file.method(), CompressionMethod::Fastest);
    assert_eq!(file.method().to_string(), "Fastest compression");
    assert_eq!(file.extra, vec![1, 2, 3, 4, 5]);
    assert_eq!(file.data.offset, 49);
    assert_eq!(file.data.bytes(), Some(&b"0123456789"[..]));
    assert_eq!(file.crc(), 0xCAFEBABE);
    assert_eq!(file.version.to_string(), "2.9");
    assert_eq!(file.attributes().to_string(), "Archive");
    assert_eq!(archive.content_size(), Some(59));
}

#[test]
fn test_unknown_tag_is_opaque() {
    init_logging();
    let body: Vec<u8> = (0..13).collect();
    let data = ArchiveBuilder::new().opaque(0x99, None, &body).build();
    let archive = ArchiveDecoder::new().decode_bytes(&data).unwrap();
    assert!(archive.is_complete());

    let block = &archive.blocks()[1];
    assert_eq!(block.block_type(), BlockType::Unknown(0x99));
    assert_eq!(block.total_size, 20);
    match &block.body {
        BlockBody::Unknown(opaque) => assert_eq!(opaque.data.bytes(), Some(&body[..])),
        other => panic!("unexpected body {:?}", other),
    }
}

#[test]
fn test_truncated_file_header() {
    init_logging();
    let full = ArchiveBuilder::new()
        .file(0, "a.txt", STORE, &[], b"payload")
        .build();
    let data = &full[..7 + 20];

    let mut cursor = SliceCursor::new(data);
    cursor.seek(7 * 8).unwrap();
    let err = BlockDispatcher::default().decode(&mut cursor).unwrap_err();
    assert!(matches!(
        err,
        RarError::Structural {
            fault: StructuralFault::UnexpectedEof { .. },
            ..
        }
    ));
    assert!(cursor.at_end());

    let archive = ArchiveDecoder::new().decode_bytes(data).unwrap();
    assert_eq!(archive.blocks().len(), 1);
    assert_eq!(archive.warnings().len(), 1);
    assert_eq!(archive.warnings()[0].offset, 7);
    assert!(!archive.is_complete());
}

#[test]
fn test_truncated_payload() {
    let full = ArchiveBuilder::new()
        .file(0, "a.txt", STORE, &[], b"0123456789")
        .build();
    let data = &full[..full.len() - 4];
    let archive = ArchiveDecoder::new().decode_bytes(data).unwrap();
    assert_eq!(archive.blocks().len(), 1);
    assert!(matches!(
        archive.warnings()[0].error,
        RarError::Structural { .. }
    ));
}

#[test]
fn test_block_extents_tile_the_stream() {
    let data = ArchiveBuilder::new()
        .archive_header(0x0002)
        .comment(b"hi!")
        .file(0x0008, "dir/b.bin", STORE, &[0xEE], &[7u8; 16])
        .comment(b"file note")
        .opaque(0x78, Some(&[0xAB; 6]), &[1, 2])
        .opaque(0x7A, None, b"CMT")
        .end()
        .build();
    let archive = ArchiveDecoder::new().decode_bytes(&data).unwrap();
    assert!(archive.is_complete());

    let blocks = archive.blocks();
    assert_eq!(blocks.len(), 6);
    let mut expected_offset = 0;
    for block in blocks {
        assert_eq!(block.offset(), expected_offset);
        expected_offset = block.end_offset();
    }
    assert_eq!(expected_offset, data.len() as u64);
    assert_eq!(archive.content_size(), Some(data.len() as u64));

    let header = archive.archive_header().unwrap();
    assert!(header.flags.has_comment);
    assert_eq!(blocks[1].total_size, 13 + 16);
    let comment = header.comment.as_ref().unwrap();
    assert_eq!(comment.offset(), 20);
    assert_eq!(comment.as_comment().unwrap().data.bytes(), Some(&b"hi!"[..]));

    let file = archive.files().next().unwrap();
    assert_eq!(file.filename(), "dir/b.bin");
    assert_eq!(blocks[2].total_size, 42 + 16 + 22);
    let note = file.comment.as_ref().unwrap();
    assert_eq!(note.offset(), blocks[2].offset() + 42 + 16);

    assert_eq!(blocks[3].block_type(), BlockType::Recovery);
    assert_eq!(blocks[3].declared_size, 19);
    assert_eq!(blocks[4].block_type(), BlockType::NewSubblock);
    assert_eq!(blocks[5].block_type(), BlockType::End);
}

#[test]
fn test_header_fields_account_for_declared_size() {
    let data = ArchiveBuilder::new()
        .archive_header(0)
        .file(0, "x", STORE, &[9, 9], b"abc")
        .file(0, "longer-name.txt", STORE, &[], &[])
        .comment(b"")
        .end()
        .build();
    let archive = ArchiveDecoder::new().decode_bytes(&data).unwrap();

    let mut all = Vec::new();
    walk(archive.blocks(), &mut all);
    for block in all {
        match &block.body {
            BlockBody::File(file) => {
                let fixed = 32 + file.filename_length as usize;
                assert_eq!(fixed + file.extra.len(), file.head_size as usize);
                assert_eq!(block.total_size, block.declared_size + file.compressed_size);
            }
            BlockBody::Comment(comment) => {
                assert_eq!(13 + comment.data.len, block.declared_size);
                assert_eq!(block.total_size, block.declared_size);
            }
            BlockBody::Archive(header) => {
                assert_eq!(13 + header.extra.len() as u64, block.declared_size);
            }
            _ => assert_eq!(block.total_size, block.declared_size),
        }
    }
}

#[test]
fn test_malformed_block_is_skipped() {
    init_logging();
    // Archive header declaring 9 bytes, below its 13-byte minimum.
    let data = ArchiveBuilder::new()
        .raw(&[0x00, 0x00, 0x73, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00])
        .file(0, "after", STORE, &[], b"ok")
        .end()
        .build();
    let archive = ArchiveDecoder::new().decode_bytes(&data).unwrap();

    assert_eq!(archive.warnings().len(), 1);
    assert!(matches!(
        archive.warnings()[0].error,
        RarError::Structural {
            offset: 7,
            fault: StructuralFault::HeaderTooSmall {
                declared: 9,
                minimum: 13
            }
        }
    ));
    let types: Vec<BlockType> = archive.blocks().iter().map(Block::block_type).collect();
    assert_eq!(
        types,
        vec![BlockType::Marker, BlockType::File, BlockType::End]
    );
    assert_eq!(archive.files().next().unwrap().filename(), "after");
}

#[test]
fn test_stop_at_end_block() {
    let data = ArchiveBuilder::new()
        .end()
        .opaque(0x78, None, b"trailing")
        .build();

    let archive = ArchiveDecoder::new().decode_bytes(&data).unwrap();
    assert_eq!(archive.blocks().len(), 3);

    let options = DecodeOptions::default().stop_at_end_block(true);
    let archive = ArchiveDecoder::with_options(options)
        .decode_bytes(&data)
        .unwrap();
    assert_eq!(archive.blocks().len(), 2);
    assert_eq!(archive.blocks()[1].block_type(), BlockType::End);
}

#[test]
fn test_max_blocks() {
    let data = ArchiveBuilder::new().archive_header(0).end().build();
    let options = DecodeOptions::default().max_blocks(2);
    let archive = ArchiveDecoder::with_options(options)
        .decode_bytes(&data)
        .unwrap();
    assert_eq!(archive.blocks().len(), 2);
    assert_eq!(archive.content_size(), Some(20));
}

#[test]
fn test_payloads_not_kept() {
    let data = ArchiveBuilder::new()
        .file(0, "a.txt", STORE, &[], b"0123456789")
        .opaque(0x76, None, b"info")
        .end()
        .build();
    let options = DecodeOptions::default().keep_payloads(false);
    let archive = ArchiveDecoder::with_options(options)
        .decode_bytes(&data)
        .unwrap();
    assert!(archive.is_complete());
    assert_eq!(archive.blocks().len(), 4);

    let file = archive.files().next().unwrap();
    assert_eq!(file.data.len, 10);
    assert_eq!(file.data.offset, 7 + 37);
    assert!(file.data.bytes().is_none());
    match &archive.blocks()[2].body {
        BlockBody::ExtraInfo(info) => {
            assert_eq!(info.data.len, 4);
            assert!(info.data.bytes().is_none());
        }
        other => panic!("unexpected body {:?}", other),
    }
}

#[test]
fn test_mimetype_entry() {
    let data = ArchiveBuilder::new()
        .archive_header(0)
        .file(0, "mimetype", STORE, &[], b"application/epub+zip")
        .file(0, "content.opf", STORE, &[], b"<package/>")
        .end()
        .build();
    let archive = ArchiveDecoder::new().decode_bytes(&data).unwrap();

    assert_eq!(archive.mime_type(), "application/epub+zip");
    assert_eq!(archive.filename_suffix(), Some(".epub"));
    // Memoised: the same allocation comes back.
    assert_eq!(
        archive.mime_type().as_ptr(),
        archive.mime_type().as_ptr()
    );
}

#[test]
fn test_unknown_mimetype_keeps_default_suffix() {
    let data = ArchiveBuilder::new()
        .file(0, "mimetype", STORE, &[], b"text/x-custom\n")
        .build();
    let archive = ArchiveDecoder::new().decode_bytes(&data).unwrap();
    assert_eq!(archive.mime_type(), "text/x-custom");
    assert_eq!(archive.filename_suffix(), Some(".rar"));
}

#[test]
fn test_plain_archive_properties() {
    let data = ArchiveBuilder::new()
        .archive_header(0x0009) // volume | solid
        .file(0, "a.txt", FASTEST, &[], b"xyz")
        .end()
        .build();
    let archive = ArchiveDecoder::new().decode_bytes(&data).unwrap();

    assert_eq!(archive.mime_type(), DEFAULT_MIME_TYPE);
    assert_eq!(DEFAULT_MIME_TYPE, "application/rar");
    assert_eq!(archive.filename_suffix(), Some(".rar"));
    assert_eq!(
        archive.description(),
        "Compressed archive in RAR (Roshal ARchive) format (volume, solid)"
    );
}

#[test]
fn test_properties_fall_back_on_failure() {
    init_logging();
    let data = ArchiveBuilder::new()
        .file(0, "mimetype", STORE, &[], b"application/epub+zip")
        .build();
    let options = DecodeOptions::default().keep_payloads(false);
    let archive = ArchiveDecoder::with_options(options)
        .decode_bytes(&data)
        .unwrap();

    assert_eq!(archive.mime_type(), FALLBACK_MIME_TYPE);
    assert_eq!(archive.filename_suffix(), None);
    assert_eq!(
        archive.description(),
        "Compressed archive in RAR (Roshal ARchive) format"
    );
    // Still the fallback on a second call.
    assert_eq!(archive.filename_suffix(), None);
}

#[test]
fn test_comment_flag_without_comment_block() {
    init_logging();
    let data = ArchiveBuilder::new()
        .archive_header(0x0002)
        .file(0, "mimetype", STORE, &[], b"application/epub+zip")
        .end()
        .build();
    let archive = ArchiveDecoder::new().decode_bytes(&data).unwrap();

    assert!(archive.is_complete());
    let types: Vec<BlockType> = archive.blocks().iter().map(Block::block_type).collect();
    assert_eq!(
        types,
        vec![
            BlockType::Marker,
            BlockType::Archive,
            BlockType::File,
            BlockType::End
        ]
    );
    let header = archive.archive_header().unwrap();
    assert!(header.flags.has_comment);
    assert!(header.comment.is_none());
    assert_eq!(archive.blocks()[1].total_size, 13);

    assert_eq!(archive.files().count(), 1);
    assert_eq!(archive.mime_type(), "application/epub+zip");
    assert_eq!(archive.filename_suffix(), Some(".epub"));
}

#[test]
fn test_file_comment_flag_without_comment_block() {
    let data = ArchiveBuilder::new()
        .file(0x0008, "first.txt", STORE, &[], b"abc")
        .file(0, "second.txt", STORE, &[], b"de")
        .build();
    let archive = ArchiveDecoder::new().decode_bytes(&data).unwrap();

    assert!(archive.is_complete());
    let names: Vec<&str> = archive.files().map(|f| f.filename()).collect();
    assert_eq!(names, vec!["first.txt", "second.txt"]);
    let first = archive.files().next().unwrap();
    assert!(first.flags.has_comment);
    assert!(first.comment.is_none());
}

#[test]
fn test_comment_flag_at_end_of_stream() {
    let data = ArchiveBuilder::new().archive_header(0x0002).build();
    let archive = ArchiveDecoder::new().decode_bytes(&data).unwrap();

    assert!(archive.is_complete());
    assert_eq!(archive.blocks().len(), 2);
    assert!(archive.archive_header().unwrap().comment.is_none());
}

#[test]
fn test_only_comment_blocks_nest() {
    let data = ArchiveBuilder::new()
        .archive_header(0x0002)
        .archive_header(0x0002)
        .comment(b"deep")
        .end()
        .build();
    let archive = ArchiveDecoder::new().decode_bytes(&data).unwrap();

    assert!(archive.is_complete());
    let blocks = archive.blocks();
    let types: Vec<BlockType> = blocks.iter().map(Block::block_type).collect();
    assert_eq!(
        types,
        vec![
            BlockType::Marker,
            BlockType::Archive,
            BlockType::Archive,
            BlockType::End
        ]
    );
    assert!(blocks[1].nested().is_none());
    let comment = blocks[2].nested().unwrap();
    assert_eq!(comment.block_type(), BlockType::Comment);
    assert_eq!(blocks[2].total_size, 13 + 17);
    assert_eq!(comment.as_comment().unwrap().data.bytes(), Some(&b"deep"[..]));
}

#[test]
fn test_properties_compute_once() {
    let data = ArchiveBuilder::new()
        .archive_header(0x0001)
        .file(0, "mimetype", STORE, &[], b"application/vnd.oasis.opendocument.text")
        .end()
        .build();
    let archive = ArchiveDecoder::new().decode_bytes(&data).unwrap();
    assert_eq!(archive.computations(), [0; 4]);

    let first = (
        archive.description().to_string(),
        archive.mime_type().to_string(),
        archive.filename_suffix().map(str::to_string),
        archive.content_size(),
    );
    let second = (
        archive.description().to_string(),
        archive.mime_type().to_string(),
        archive.filename_suffix().map(str::to_string),
        archive.content_size(),
    );
    assert_eq!(first, second);
    assert_eq!(first.1, "application/vnd.oasis.opendocument.text");
    assert_eq!(first.2.as_deref(), Some(".odt"));
    assert_eq!(first.3, Some(data.len() as u64));
    assert_eq!(archive.computations(), [1; 4]);
}

#[test]
fn test_fallbacks_compute_once() {
    init_logging();
    // No archive header, and the mimetype payload is not kept.
    let data = ArchiveBuilder::new()
        .file(0, "mimetype", STORE, &[], b"application/epub+zip")
        .build();
    let options = DecodeOptions::default().keep_payloads(false);
    let archive = ArchiveDecoder::with_options(options)
        .decode_bytes(&data)
        .unwrap();

    for _ in 0..2 {
        assert_eq!(
            archive.description(),
            "Compressed archive in RAR (Roshal ARchive) format"
        );
        assert_eq!(archive.mime_type(), FALLBACK_MIME_TYPE);
        assert_eq!(archive.filename_suffix(), None);
        assert_eq!(archive.content_size(), Some(data.len() as u64));
    }
    assert_eq!(archive.computations(), [1; 4]);
}
