#![no_main]
use frontcode::FrontCodedList;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the ratio; the rest splits into entries on 0xFF.
    let ratio = u32::from(data[0] % 16) + 1;
    let entries: Vec<&[u8]> = data[1..].split(|&b| b == 0xFF).collect();

    let list = FrontCodedList::<u8>::build(&entries, ratio).unwrap();
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(list.get(i as u64).unwrap(), *entry);
    }

    let bytes = list.to_bytes().unwrap();
    let back = FrontCodedList::<u8>::from_bytes(&bytes).unwrap();
    let decoded: Vec<Vec<u8>> = back.iter().rev().map(|e| e.unwrap()).collect();
    assert_eq!(decoded.len(), entries.len());
    for (got, want) in decoded.iter().rev().zip(&entries) {
        assert_eq!(got.as_slice(), *want);
    }
});
