use frontcode::{FrontCodedBigList, FrontCodedList, FrontCodedOptions};
use proptest::prelude::*;

fn entries_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    // A small alphabet keeps shared prefixes and duplicates common.
    proptest::collection::vec(proptest::collection::vec(0u8..4, 0..12), 0..200)
}

proptest! {
    #[test]
    fn prop_get_matches_source(entries in entries_strategy(), ratio in 1u32..20) {
        let list = FrontCodedList::<u8>::build(&entries, ratio).unwrap();
        prop_assert_eq!(list.len(), entries.len() as u64);
        for (i, e) in entries.iter().enumerate() {
            prop_assert_eq!(&list.get(i as u64).unwrap(), e);
            prop_assert_eq!(list.entry_len(i as u64).unwrap(), e.len());
        }
    }

    #[test]
    fn prop_persisted_reload_matches(entries in entries_strategy(), ratio in 1u32..20) {
        let list = FrontCodedList::<u8>::build(&entries, ratio).unwrap();
        let bytes = list.to_bytes().unwrap();
        prop_assert_eq!(bytes.len() as u64, list.stats().persisted_bytes);
        let back = FrontCodedList::<u8>::from_bytes(&bytes).unwrap();
        prop_assert_eq!(back.len(), list.len());
        prop_assert_eq!(back.to_vec().unwrap(), entries);
    }

    #[test]
    fn prop_big_matches_standard(
        entries in entries_strategy(),
        ratio in 1u32..10,
        segment_size in 1usize..32
    ) {
        let options = FrontCodedOptions::with_ratio(ratio).segment_size(segment_size);
        let big = FrontCodedBigList::<u8>::build_with(&entries, &options).unwrap();
        let standard = FrontCodedList::<u8>::build(&entries, ratio).unwrap();
        prop_assert_eq!(big.to_vec().unwrap(), standard.to_vec().unwrap());
    }

    #[test]
    fn prop_cursor_follows_moves(
        entries in entries_strategy(),
        ratio in 1u32..8,
        start in any::<prop::sample::Index>(),
        moves in proptest::collection::vec(any::<bool>(), 0..400)
    ) {
        let list = FrontCodedList::<u8>::build(&entries, ratio).unwrap();
        let n = entries.len();
        let mut pos = start.index(n + 1);
        let mut cursor = list.cursor_at(pos as u64).unwrap();
        for forward in moves {
            if forward {
                if pos < n {
                    prop_assert_eq!(cursor.next_entry().unwrap(), entries[pos].as_slice());
                    pos += 1;
                } else {
                    prop_assert!(cursor.next_entry().is_err());
                }
            } else if pos > 0 {
                pos -= 1;
                prop_assert_eq!(cursor.previous_entry().unwrap(), entries[pos].as_slice());
            } else {
                prop_assert!(cursor.previous_entry().is_err());
            }
            prop_assert_eq!(cursor.next_index(), pos as u64);
        }
    }

    #[test]
    fn prop_slice_lookup_fits_or_reports(
        entries in entries_strategy(),
        ratio in 1u32..8,
        cap in 0usize..12
    ) {
        let list = FrontCodedList::<u8>::build(&entries, ratio).unwrap();
        let mut dst = vec![0u8; cap];
        for (i, e) in entries.iter().enumerate() {
            match list.get_into_slice(i as u64, &mut dst) {
                Ok(n) => prop_assert_eq!(&dst[..n], e.as_slice()),
                Err(frontcode::Error::BufferTooSmall { needed }) => {
                    prop_assert!(needed > cap);
                    prop_assert_eq!(needed, e.len());
                }
                Err(other) => prop_assert!(false, "unexpected error {}", other),
            }
        }
    }

    #[test]
    fn prop_arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        if let Ok(list) = FrontCodedList::<u8>::from_bytes(&data) {
            for entry in &list {
                prop_assert!(entry.is_ok());
            }
        }
        let _ = FrontCodedBigList::<u32>::from_bytes(&data);
    }
}
