#![no_main]
use frontcode::{FrontCodedBigList, FrontCodedList};
use libfuzzer_sys::fuzz_target;

// Arbitrary bytes must either be rejected or load into a list whose every
// entry decodes.
fuzz_target!(|data: &[u8]| {
    if let Ok(list) = FrontCodedList::<u8>::from_bytes(data) {
        for entry in &list {
            entry.unwrap();
        }
        for i in (0..list.len()).rev() {
            let len = list.entry_len(i).unwrap();
            assert_eq!(list.get(i).unwrap().len(), len);
        }
    }
    if let Ok(list) = FrontCodedBigList::<u16>::from_bytes(data) {
        let mut cursor = list.cursor();
        while cursor.has_next() {
            cursor.next_entry().unwrap();
        }
    }
});
