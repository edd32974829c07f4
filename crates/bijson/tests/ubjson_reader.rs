#![allow(missing_docs)]

use bijson::{DetailedValueType, ErrorKind, UbjsonReader, ValueType};

#[test]
fn reads_a_nested_document() {
    let document = b"{i\x03KeySi\x0CHello world!i\x05Array[I\x10\x20U\xF0]}";
    let mut reader = UbjsonReader::new(document);
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.value_type(false).unwrap(), ValueType::Object);
    assert_eq!(
        reader.detailed_value_type(false).unwrap(),
        DetailedValueType::Object
    );
    reader.enter().unwrap();
    assert!(reader.next_key().unwrap());
    assert_eq!(reader.value_type(false).unwrap(), ValueType::String);
    assert_eq!(reader.read_string().unwrap(), "Key");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.value_type(true).unwrap(), ValueType::String);
    assert_eq!(
        reader.detailed_value_type(true).unwrap(),
        DetailedValueType::String
    );
    assert_eq!(reader.read_string().unwrap(), "Hello world!");
    assert!(reader.next_key().unwrap());
    assert_eq!(reader.read_string().unwrap(), "Array");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.value_type(true).unwrap(), ValueType::Array);
    reader.enter().unwrap();
    assert_eq!(reader.scope(), "{[");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.value_type(true).unwrap(), ValueType::Integer);
    assert_eq!(
        reader.detailed_value_type(true).unwrap(),
        DetailedValueType::UInt15
    );
    assert_eq!(reader.read_i16().unwrap(), 0x1020);
    assert!(reader.next_value().unwrap());
    assert_eq!(
        reader.detailed_value_type(true).unwrap(),
        DetailedValueType::UInt8
    );
    assert_eq!(reader.read_i64().unwrap(), 240);
    assert!(!reader.next_value().unwrap());
    assert!(!reader.next_value().unwrap());
    reader.leave().unwrap();
    assert!(!reader.next_key().unwrap());
    assert!(!reader.next_key().unwrap());
    reader.leave().unwrap();
    assert!(!reader.next_value().unwrap());
    assert!(!reader.next_value().unwrap());
}

#[test]
fn rejects_documents_that_do_not_start_with_a_value() {
    for document in [&b"]"[..], b"}", b"A", b"0"] {
        let mut reader = UbjsonReader::new(document);
        assert!(reader.next_value().is_err(), "{document:?}");
    }
}

#[test]
fn integer_reads_check_ranges() {
    fn read_value(document: &[u8]) -> UbjsonReader {
        let mut reader = UbjsonReader::new(document);
        assert!(reader.next_value().unwrap());
        reader
    }

    assert_eq!(read_value(b"i\x80").read_i8().unwrap(), -128);
    assert_eq!(read_value(b"i\x80").read_i16().unwrap(), -128);
    assert!(read_value(b"i\x80").read_u8().is_err());
    assert!(read_value(b"i\x80").read_u16().is_err());

    assert_eq!(read_value(b"U\x7F").read_u8().unwrap(), 127);
    assert_eq!(read_value(b"U\x7F").read_i8().unwrap(), 127);
    assert_eq!(read_value(b"U\x80").read_u8().unwrap(), 128);
    assert_eq!(read_value(b"U\x80").read_i16().unwrap(), 128);
    assert!(read_value(b"U\x80").read_i8().is_err());

    assert_eq!(read_value(b"i\xFF").read_i8().unwrap(), -1);
    assert!(read_value(b"i\xFF").read_u8().is_err());
    assert!(read_value(b"i\xFF").read_u64().is_err());

    assert_eq!(
        read_value(b"L\x7F\xFF\xFF\xFF\xFF\xFF\xFF\xFF").read_i64().unwrap(),
        i64::MAX
    );

    // Numbers read out of string payloads.
    assert_eq!(read_value(b"Si\x0532767").read_i16().unwrap(), 32767);
    assert!(read_value(b"Si\x0532768").read_i16().is_err());
}

#[test]
fn float_reads() {
    let mut reader = UbjsonReader::new(b"d\x41\x8c\x00\x00");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_f32().unwrap(), 17.5);
    assert_eq!(reader.read_f64().unwrap(), 17.5);

    let mut reader = UbjsonReader::new(b"D\x3F\xF0\x00\x00\x00\x00\x00\x00");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_f64().unwrap(), 1.0);

    // High-precision numbers parse from their decimal text.
    let mut reader = UbjsonReader::new(b"Hi\x067.5e10");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.value_type(false).unwrap(), ValueType::Float);
    assert_eq!(
        reader.detailed_value_type(false).unwrap(),
        DetailedValueType::HighPrecisionNumber
    );
    assert_eq!(reader.read_f64().unwrap(), 7.5e10);
}

#[test]
fn null_and_booleans() {
    let mut reader = UbjsonReader::new(b"[ZTF]");
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_value().unwrap());
    assert!(reader.read_null());
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_bool().unwrap(), true);
    assert!(!reader.read_null());
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_bool().unwrap(), false);
    assert!(!reader.next_value().unwrap());
    reader.leave().unwrap();
}

#[test]
fn no_ops_are_invisible() {
    let mut reader = UbjsonReader::new(b"[Ni\x01NNi\x02N]");
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_i8().unwrap(), 1);
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_i8().unwrap(), 2);
    assert!(!reader.next_value().unwrap());
    reader.leave().unwrap();
}

#[test]
fn optimized_array_honors_its_count() {
    let document = b"[$d#i\x03\x41\x8c\x00\x00\x41\x8a\x00\x00\x41\x89\x00\x00";
    let mut reader = UbjsonReader::new(document);
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_f32().unwrap(), 17.5);
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_f32().unwrap(), 17.25);
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_f32().unwrap(), 17.125);
    assert!(!reader.next_value().unwrap());
    assert!(!reader.next_value().unwrap());
    reader.leave().unwrap();
    assert!(!reader.next_value().unwrap());
    assert!(!reader.next_document().unwrap());
}

#[test]
fn optimized_object_pairs_keys_and_values() {
    let document =
        b"{$d#i\x03i\x03Key\x41\x8c\x00\x00i\x03Kay\x41\x8a\x00\x00i\x03Koy\x41\x89\x00\x00";
    let mut reader = UbjsonReader::new(document);
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_key().unwrap());
    assert_eq!(reader.read_string().unwrap(), "Key");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_f32().unwrap(), 17.5);
    assert!(reader.next_key().unwrap());
    assert!(reader.next_value().unwrap());
    assert!(reader.next_key().unwrap());
    assert_eq!(reader.read_string().unwrap(), "Koy");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_f32().unwrap(), 17.125);
    assert!(!reader.next_key().unwrap());
    assert!(!reader.next_key().unwrap());
    reader.leave().unwrap();
    assert!(!reader.next_value().unwrap());
    assert!(!reader.next_document().unwrap());
}

#[test]
fn expanded_byte_arrays_iterate_as_integers() {
    let mut reader = UbjsonReader::new(b"[$i#i\x04ABCD");
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    let mut values = Vec::new();
    while reader.next_value().unwrap() {
        values.push(reader.read_i64().unwrap());
    }
    assert_eq!(values, [65, 66, 67, 68]);
    reader.leave().unwrap();
}

#[test]
fn optimized_arrays_can_be_read_in_bulk() {
    let mut reader = UbjsonReader::new(b"[$i#i\x04ABCD");
    assert!(reader.next_value().unwrap());
    assert_eq!(
        reader.read_optimized_array::<i8>().unwrap(),
        Some(vec![65, 66, 67, 68])
    );
    assert!(!reader.next_value().unwrap());
}

#[test]
fn bulk_reads_require_a_matching_element_type() {
    let mut reader = UbjsonReader::new(b"[$i#i\x04ABCD");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_optimized_array::<i16>().unwrap(), None);
    assert_eq!(
        reader.read_binary().unwrap(),
        Some(b"ABCD".to_vec())
    );
}

#[test]
fn type_modifier_without_count_is_an_error() {
    let mut reader = UbjsonReader::new(b"[$iABCD]");
    assert!(reader.next_value().is_err());
}

#[test]
fn leave_unwinds_unread_values() {
    let document = b"{i\x03KeySi\x0CHello world!i\x05Array[I\x10\x20U\xF0]}";
    let mut reader = UbjsonReader::new(document);
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_key().unwrap());
    reader.leave().unwrap();
    assert!(!reader.next_value().unwrap());
}

#[test]
fn leave_at_document_level_is_an_error() {
    let mut reader = UbjsonReader::new(b"Z");
    assert!(reader.next_value().unwrap());
    let error = reader.leave().unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::Misuse(_)));
}

#[test]
fn truncated_documents_report_their_offset() {
    let mut reader = UbjsonReader::new(b"[i\x01");
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_value().unwrap());
    let error = reader.next_value().unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::TruncatedInput(_)));
    assert!(error.to_string().starts_with("At offset"));
}

#[test]
fn strings_survive_small_chunks() {
    let mut document = b"Si\x14".to_vec();
    document.extend_from_slice(b"12345678901234567890");
    let mut reader = UbjsonReader::from_stream(std::io::Cursor::new(document));
    reader.set_chunk_size(10).unwrap();
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_string().unwrap(), "12345678901234567890");
}

#[test]
fn base64_strings_decode_to_binary() {
    let mut reader = UbjsonReader::new(b"Si\x08Zm9vYmFy");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_base64().unwrap(), b"foobar");
}

#[test]
fn chars_read_as_integers_and_strings() {
    let mut reader = UbjsonReader::new(b"CA");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.value_type(false).unwrap(), ValueType::Integer);
    assert_eq!(
        reader.detailed_value_type(false).unwrap(),
        DetailedValueType::Char
    );
    assert_eq!(reader.read_char().unwrap(), 'A');
    assert_eq!(reader.read_i64().unwrap(), 65);
    assert_eq!(reader.read_string().unwrap(), "A");
}

#[test]
fn multiple_documents() {
    let mut reader = UbjsonReader::new(b"i\x01i\x02i\x03");
    let mut values = Vec::new();
    loop {
        while reader.next_value().unwrap() {
            values.push(reader.read_i8().unwrap());
        }
        if !reader.next_document().unwrap() {
            break;
        }
    }
    assert_eq!(values, [1, 2, 3]);
}
