#![allow(missing_docs)]

use bijson::{ErrorKind, Reader, make_reader, make_reader_from_stream};

fn assert_json(bytes: &[u8]) {
    assert!(make_reader(bytes).unwrap().is_json(), "{bytes:?}");
}

fn assert_ubjson(bytes: &[u8]) {
    assert!(make_reader(bytes).unwrap().is_ubjson(), "{bytes:?}");
}

#[test]
fn sniffs_the_dialect() {
    assert_json(b"");
    assert_json(b"1");
    assert_json(b"[1]");
    assert_json(b"[{},{}]");
    assert_json(b"{\n}");
    assert_json(b"{// Start\n}");
    assert_json(b"null");
    assert_json(b"{\"1\":2}");
    assert_ubjson(b"[#\x01iA");
    assert_ubjson(b"IAA");
}

#[test]
fn unknown_content_is_an_error() {
    let error = make_reader(b"Pluto").unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::UnknownContent(_)));
}

#[test]
fn reads_through_the_unified_cursor() {
    let mut reader = make_reader(br#"{"a": [1, 2]}"#).unwrap();
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_key().unwrap());
    assert_eq!(reader.read_string().unwrap(), "a");
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_i64().unwrap(), 1);
    reader.leave().unwrap();
    assert!(!reader.next_key().unwrap());
    reader.leave().unwrap();
}

#[test]
fn the_same_walk_works_for_both_dialects() {
    fn sum_of_array(mut reader: Reader) -> i64 {
        let mut total = 0;
        assert!(reader.next_value().unwrap());
        reader.enter().unwrap();
        while reader.next_value().unwrap() {
            total += reader.read_i64().unwrap();
        }
        reader.leave().unwrap();
        total
    }

    assert_eq!(sum_of_array(make_reader(b"[1, 2, 3]").unwrap()), 6);
    assert_eq!(
        sum_of_array(make_reader(b"[i\x01i\x02i\x03]").unwrap()),
        6
    );
}

#[test]
fn streams_keep_their_sniffed_prefix() {
    let mut reader =
        make_reader_from_stream(std::io::Cursor::new(br#"{"a": 1}"#.to_vec())).unwrap();
    assert!(reader.is_json());
    assert!(reader.next_value().unwrap());
    let item = reader.read_item().unwrap();
    assert_eq!(item.at_key("a").unwrap().get::<i32>().unwrap(), 1);

    let mut binary = b"Si\x14".to_vec();
    binary.extend_from_slice(b"12345678901234567890");
    let mut reader = make_reader_from_stream(std::io::Cursor::new(binary)).unwrap();
    assert!(reader.is_ubjson());
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_string().unwrap(), "12345678901234567890");
}

#[test]
fn materializes_ubjson_binary_items() {
    let mut reader = make_reader(b"[$i#i\x04ABCD").unwrap();
    let ubjson = reader.as_ubjson().unwrap();
    ubjson.options_mut().expand_optimized_byte_arrays = false;
    let item = reader.read_item().unwrap();
    assert_eq!(item.get_binary().unwrap(), b"ABCD");
}
