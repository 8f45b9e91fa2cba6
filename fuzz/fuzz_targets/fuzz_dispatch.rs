#![no_main]
use libfuzzer_sys::fuzz_target;
use rar_blocks::{BlockDispatcher, ByteCursor, SliceCursor};

// Decode blocks back to back; a failed block must never stall the cursor.
fuzz_target!(|data: &[u8]| {
    let dispatcher = BlockDispatcher::new(false);
    let mut cursor = SliceCursor::new(data);
    while !cursor.at_end() {
        let before = cursor.position();
        if let Ok(block) = dispatcher.decode(&mut cursor) {
            assert_eq!(cursor.byte_position(), block.end_offset());
        }
        assert!(cursor.position() > before);
    }
});
