use frontcode::{DEFAULT_RATIO, Error, FrontCodedList, FrontCodedOptions};

#[test]
fn single_empty_entry_with_ratio_one() {
    let list = FrontCodedList::<u8>::build([Vec::<u8>::new()], 1).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list.get(0).unwrap(), Vec::<u8>::new());
}

#[test]
fn anchor_delta_anchor() {
    let list = FrontCodedList::<u8>::build([vec![1u8, 2, 3], vec![1, 2, 4], vec![9]], 2).unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list.get(0).unwrap(), [1, 2, 3]);
    assert_eq!(list.get(1).unwrap(), [1, 2, 4]);
    assert_eq!(list.get(2).unwrap(), [9]);
}

#[test]
fn zero_ratio_is_invalid() {
    let err = FrontCodedList::<u8>::build([b"a"], 0).unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration(_)), "{err}");
}

#[test]
fn default_options_use_default_ratio() {
    let list = FrontCodedList::<u8>::build_with([b"a", b"b"], &FrontCodedOptions::default()).unwrap();
    assert_eq!(list.ratio(), DEFAULT_RATIO);
}

#[test]
fn ratio_one_stores_every_entry_verbatim() {
    let entries: Vec<Vec<u8>> = (0..50u8).map(|i| vec![7; i as usize]).collect();
    let list = FrontCodedList::<u8>::build(&entries, 1).unwrap();
    let raw: u64 = entries.iter().map(|e| e.len() as u64 + 1).sum();
    assert_eq!(list.stats().stream_bytes, raw);
    assert_eq!(list.to_vec().unwrap(), entries);
}

#[test]
fn empties_and_duplicates_reconstruct() {
    let entries: [&[u8]; 9] = [b"", b"", b"dup", b"dup", b"dup", b"", b"dupe", b"dup", b""];
    for ratio in 1..=10 {
        let list = FrontCodedList::<u8>::build(&entries, ratio).unwrap();
        for (i, e) in entries.iter().enumerate() {
            assert_eq!(list.get(i as u64).unwrap(), *e, "ratio {ratio}, index {i}");
        }
    }
}

#[test]
fn shared_prefixes_compress() {
    let entries: Vec<String> = (0..1000).map(|i| format!("https://example.org/item/{i:06}")).collect();
    let list = FrontCodedList::<u8>::build(entries.iter().map(String::as_bytes), 16).unwrap();
    let raw: u64 = entries.iter().map(|e| e.len() as u64).sum();
    assert!(list.stats().stream_bytes < raw / 2);
    assert_eq!(list.get(517).unwrap(), b"https://example.org/item/000517");
}

#[test]
fn clone_is_identical_and_independent() {
    let entries: Vec<Vec<u8>> = (0..300u32).map(|i| i.to_be_bytes().to_vec()).collect();
    let list = FrontCodedList::<u8>::build(&entries, 7).unwrap();
    let copy = list.clone();
    let mut c1 = list.cursor_at(150).unwrap();
    let mut c2 = copy.cursor_at(150).unwrap();
    c1.next_entry().unwrap();
    assert_eq!(c2.next_index(), 150);
    drop(list);
    for (i, e) in entries.iter().enumerate() {
        assert_eq!(copy.get(i as u64).unwrap(), *e);
    }
    assert_eq!(c2.next_entry().unwrap(), entries[150].as_slice());
}

#[test]
fn get_into_reuses_buffer() {
    let entries: Vec<Vec<u8>> = (0..64u8).map(|i| vec![i; 32]).collect();
    let list = FrontCodedList::<u8>::build(&entries, 4).unwrap();
    let mut buf = Vec::with_capacity(32);
    let ptr = buf.as_ptr();
    for (i, e) in entries.iter().enumerate() {
        let n = list.get_into(i as u64, &mut buf).unwrap();
        assert_eq!(n, 32);
        assert_eq!(&buf, e);
    }
    assert_eq!(buf.as_ptr(), ptr);
}

#[test]
fn get_into_grows_small_buffer() {
    let list = FrontCodedList::<u8>::build([vec![5u8; 1000]], 1).unwrap();
    let mut buf = vec![0u8; 3];
    assert_eq!(list.get_into(0, &mut buf).unwrap(), 1000);
    assert_eq!(buf, vec![5u8; 1000]);
}

#[test]
fn wide_elements_roundtrip() {
    let words: Vec<Vec<u32>> = vec![
        vec![0xDEAD_BEEF, 1, 2],
        vec![0xDEAD_BEEF, 1, 3, u32::MAX],
        vec![],
        vec![0xDEAD_BEEF],
    ];
    let list = FrontCodedList::<u32>::build(&words, 2).unwrap();
    assert_eq!(list.to_vec().unwrap(), words);

    let signed: Vec<Vec<i64>> = vec![vec![-1, i64::MIN], vec![-1, i64::MAX], vec![0]];
    let list = FrontCodedList::<i64>::build(&signed, 3).unwrap();
    assert_eq!(list.to_vec().unwrap(), signed);

    let shorts: Vec<Vec<i16>> = (0..100i16).map(|i| vec![-i, i, i * 3]).collect();
    let list = FrontCodedList::<i16>::build(&shorts, 5).unwrap();
    for (i, e) in shorts.iter().enumerate() {
        assert_eq!(list.get(i as u64).unwrap(), *e);
        let mut dst = [0i16; 3];
        assert_eq!(list.get_into_slice(i as u64, &mut dst).unwrap(), 3);
        assert_eq!(dst.as_slice(), e.as_slice());
    }
}

#[test]
fn source_failure_returns_original_error() {
    let lines = std::io::Cursor::new(b"a\nb\n".to_vec());
    let ok = FrontCodedList::<u8>::try_build(
        std::io::BufRead::split(lines, b'\n'),
        &FrontCodedOptions::default(),
    )
    .unwrap();
    assert_eq!(ok.to_vec().unwrap(), [b"a".to_vec(), b"b".to_vec()]);

    let source = (0..10).map(|i| {
        if i == 5 {
            Err(std::io::Error::other("source went away"))
        } else {
            Ok(vec![i as u8])
        }
    });
    let err = FrontCodedList::<u8>::try_build(source, &FrontCodedOptions::default()).unwrap_err();
    assert!(matches!(err, Error::SourceFailure(_)));
    let inner = err.into_source_failure().unwrap();
    let io = inner.downcast::<std::io::Error>().unwrap();
    assert_eq!(io.to_string(), "source went away");
}

#[test]
fn concurrent_readers() {
    let entries: Vec<Vec<u8>> = (0..2000u32).map(|i| format!("key-{i}").into_bytes()).collect();
    let list = FrontCodedList::<u8>::build(&entries, 8).unwrap();
    std::thread::scope(|s| {
        for t in 0..4u64 {
            let list = &list;
            let entries = &entries;
            s.spawn(move || {
                let mut cursor = list.cursor_at(t * 500).unwrap();
                for i in t * 500..(t + 1) * 500 {
                    assert_eq!(cursor.next_entry().unwrap(), entries[i as usize].as_slice());
                    assert_eq!(list.get(i).unwrap(), entries[i as usize]);
                }
            });
        }
    });
}
