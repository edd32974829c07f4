#![allow(missing_docs)]

use bijson::{ErrorKind, JsonReader, Position, ValueType};

#[test]
fn reads_a_nested_document() {
    let mut reader = JsonReader::new(br#"{"int": 1234, "array": [1, 2, {"float": 1.234}]}"#);
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.value_type(false).unwrap(), ValueType::Object);
    reader.enter().unwrap();

    assert!(reader.next_key().unwrap());
    assert_eq!(reader.read_string().unwrap(), "int");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.value_type(false).unwrap(), ValueType::Integer);
    assert_eq!(reader.read_i32().unwrap(), 1234);

    assert!(reader.next_key().unwrap());
    assert_eq!(reader.read_string().unwrap(), "array");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.value_type(false).unwrap(), ValueType::Array);
    reader.enter().unwrap();
    assert_eq!(reader.next_value().unwrap(), true);
    assert_eq!(reader.read_i64().unwrap(), 1);
    assert_eq!(reader.next_value().unwrap(), true);
    assert_eq!(reader.read_i64().unwrap(), 2);
    assert_eq!(reader.next_value().unwrap(), true);
    reader.enter().unwrap();
    assert!(reader.next_key().unwrap());
    assert_eq!(reader.read_string().unwrap(), "float");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_f64().unwrap(), 1.234);
    reader.leave().unwrap();
    assert!(!reader.next_value().unwrap());
    reader.leave().unwrap();

    assert!(!reader.next_key().unwrap());
    reader.leave().unwrap();
    assert!(!reader.next_value().unwrap());
}

#[test]
fn values_are_skipped_when_not_entered() {
    let mut reader = JsonReader::new(br#"{"a": {"b": [1, 2]}, "c": 3}"#);
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_key().unwrap());
    assert_eq!(reader.read_string().unwrap(), "a");
    assert!(reader.next_value().unwrap());
    // Not entering the nested object: the next key call drains it.
    assert!(reader.next_key().unwrap());
    assert_eq!(reader.read_string().unwrap(), "c");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_i64().unwrap(), 3);
    assert!(!reader.next_key().unwrap());
    reader.leave().unwrap();
}

#[test]
fn comments_and_trailing_commas_are_opt_in() {
    let document = b"{// key\n \"a\": 1, }";

    let mut reader = JsonReader::new(document);
    reader.options_mut().comments = true;
    reader.options_mut().end_element_after_comma = true;
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_key().unwrap());
    assert_eq!(reader.read_string().unwrap(), "a");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_i32().unwrap(), 1);
    assert!(!reader.next_key().unwrap());
    reader.leave().unwrap();

    let mut strict = JsonReader::new(document);
    assert!(strict.next_value().unwrap());
    strict.enter().unwrap();
    let error = strict.next_key().unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::UnexpectedToken(_)));
}

#[test]
fn trailing_comma_alone_is_rejected() {
    let mut reader = JsonReader::new(b"[1, ]");
    reader.options_mut().comments = true;
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_value().unwrap());
    let error = reader.next_value().unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::UnexpectedToken(_)));
}

#[test]
fn integer_overflow_is_reported() {
    let mut reader = JsonReader::new(b"2147483648");
    assert!(reader.next_value().unwrap());
    let error = reader.read_i32().unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::NumericOverflow(_)));
    // The reader stays usable after a recoverable error.
    assert!(error.is_recoverable());
    assert_eq!(reader.read_i64().unwrap(), 2_147_483_648);
}

#[test]
fn signed_values_do_not_read_as_unsigned() {
    let mut reader = JsonReader::new(b"-1");
    assert!(reader.next_value().unwrap());
    assert!(reader.read_u32().is_err());
    assert_eq!(reader.read_i32().unwrap(), -1);
}

#[test]
fn strings_survive_small_chunks() {
    let text = br#"{"key": "a string that is much longer than one chunk"}"#;
    let mut reader = JsonReader::from_stream(std::io::Cursor::new(text.to_vec()));
    reader.set_chunk_size(10).unwrap();
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_key().unwrap());
    assert!(reader.next_value().unwrap());
    assert_eq!(
        reader.read_string().unwrap(),
        "a string that is much longer than one chunk"
    );
    assert!(!reader.next_key().unwrap());
    reader.leave().unwrap();
}

#[test]
fn whitespace_delimited_documents() {
    let mut reader = JsonReader::new(b"1 2 3");
    let mut values = Vec::new();
    loop {
        while reader.next_value().unwrap() {
            values.push(reader.read_i64().unwrap());
        }
        if !reader.next_document().unwrap() {
            break;
        }
    }
    assert_eq!(values, [1, 2, 3]);
}

#[test]
fn escape_sequences_decode() {
    let mut reader =
        JsonReader::new(br#"["tab\there", "c:\\dir", "\u0041\u00e5", "\uD83D\uDE00"]"#);
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_string().unwrap(), "tab\there");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_string().unwrap(), "c:\\dir");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_string().unwrap(), "Aå");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_string().unwrap(), "\u{1F600}");
    assert!(!reader.next_value().unwrap());
    reader.leave().unwrap();
}

#[test]
fn single_quoted_strings() {
    let mut reader = JsonReader::new(b"['it\\'s']");
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_string().unwrap(), "it's");
}

#[test]
fn unquoted_keys_require_the_option() {
    let document = b"{key: 1}";
    let mut reader = JsonReader::new(document);
    reader.options_mut().values_as_keys = true;
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_key().unwrap());
    assert_eq!(reader.read_string().unwrap(), "key");
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_i32().unwrap(), 1);

    let mut strict = JsonReader::new(document);
    assert!(strict.next_value().unwrap());
    strict.enter().unwrap();
    assert!(strict.next_key().is_err());
}

#[test]
fn extended_integers_require_the_option() {
    let mut reader = JsonReader::new(b"[0x10, 0b101, 1_000]");
    reader.options_mut().extended_integers = true;
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.value_type(false).unwrap(), ValueType::Integer);
    assert_eq!(reader.read_i32().unwrap(), 16);
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_i32().unwrap(), 5);
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_i32().unwrap(), 1000);

    let mut strict = JsonReader::new(b"0x10");
    assert!(strict.next_value().unwrap());
    assert!(strict.value_type(false).is_err());
    assert!(strict.read_i32().is_err());
}

#[test]
fn extended_floats_require_the_option() {
    for (text, check) in [
        ("Infinity", f64::is_infinite as fn(f64) -> bool),
        ("-Infinity", |value| value.is_infinite() && value < 0.0),
        ("NaN", f64::is_nan),
    ] {
        let mut reader = JsonReader::new(text.as_bytes());
        reader.options_mut().extended_floats = true;
        assert!(reader.next_value().unwrap());
        assert!(check(reader.read_f64().unwrap()), "{text}");

        let mut strict = JsonReader::new(text.as_bytes());
        assert!(strict.next_value().unwrap());
        assert!(strict.read_f64().is_err(), "{text}");
    }
}

#[test]
fn strings_as_values_and_values_as_strings() {
    let mut reader = JsonReader::new(br#"["42", plain]"#);
    reader.options_mut().strings_as_values = true;
    reader.options_mut().values_as_strings = true;
    reader.options_mut().values_as_keys = true;
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_i32().unwrap(), 42);
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_string().unwrap(), "plain");

    let mut strict = JsonReader::new(br#""42""#);
    assert!(strict.next_value().unwrap());
    assert!(strict.read_i32().is_err());
    assert_eq!(strict.read_string().unwrap(), "42");
}

#[test]
fn block_strings_require_the_option() {
    let document = b"\"\"\"one\ntwo\"\"\"";
    let mut reader = JsonReader::new(document);
    reader.options_mut().block_strings = true;
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_string().unwrap(), "one\ntwo");
}

#[test]
fn enter_null_yields_an_empty_scope() {
    let mut reader = JsonReader::new(br#"{"a": null}"#);
    reader.options_mut().enter_null = true;
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_key().unwrap());
    assert!(reader.next_value().unwrap());
    assert!(reader.read_null());
    reader.enter().unwrap();
    assert!(!reader.next_value().unwrap());
    assert!(!reader.next_key().unwrap());
    reader.leave().unwrap();
    assert!(!reader.next_key().unwrap());
    reader.leave().unwrap();
}

#[test]
fn syntax_errors_latch_the_reader() {
    let mut reader = JsonReader::new(b"[1 2]");
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_value().unwrap());
    assert!(reader.next_value().is_err());
    let error = reader.next_value().unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::Misuse(_)));
}

#[test]
fn errors_carry_line_and_column() {
    let mut reader = JsonReader::new(b"{\n\"a\" 1}");
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_key().unwrap());
    let error = reader.next_value().unwrap_err();
    match error.position() {
        Position::Text { line, column } => {
            assert_eq!(line, 2);
            assert!(column > 1);
        }
        position => panic!("unexpected position: {position:?}"),
    }
    assert!(error.to_string().starts_with("On line 2, column"));
}

#[test]
fn base64_strings_decode_to_binary() {
    let mut reader = JsonReader::new(br#""Zm9vYmFy""#);
    assert!(reader.next_value().unwrap());
    assert_eq!(reader.read_binary().unwrap(), b"foobar");
}

#[test]
fn navigation_is_idempotent_at_container_end() {
    let mut reader = JsonReader::new(b"[1]");
    assert!(reader.next_value().unwrap());
    reader.enter().unwrap();
    assert!(reader.next_value().unwrap());
    assert!(!reader.next_value().unwrap());
    assert!(!reader.next_value().unwrap());
    assert!(!reader.next_value().unwrap());
    reader.leave().unwrap();
    assert!(!reader.next_value().unwrap());
}

#[test]
fn leave_without_enter_is_an_error() {
    let mut reader = JsonReader::new(b"[1]");
    assert!(reader.next_value().unwrap());
    let error = reader.leave().unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::Misuse(_)));
}
