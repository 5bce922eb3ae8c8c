//! End-to-end tests for the `ProtoFile` facade against schema files on disk.

use dynproto::{DecodeError, Error, MapperOptions, ProtoFile, SchemaError, SchemaSource};
use serde_json::{json, Value};
use std::thread;

const EXAMPLE_PROTO: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/example/v1/example.proto"
);
const CITY_PROTO: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/example/v1/city.proto"
);
const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");
const EXAMPLE_JSON: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/example.json");

fn country_list() -> ProtoFile {
    ProtoFile::load(EXAMPLE_PROTO, "CountryList").expect("Failed to load CountryList")
}

#[test]
fn test_country_list_wire_bytes() {
    let file = country_list();
    let value = json!({"countries": [{"name": "A", "code": 1}]});

    assert_eq!(
        file.encode(&value).unwrap(),
        vec![0x0a, 0x05, 0x0a, 0x01, 0x41, 0x10, 0x01]
    );
    assert_eq!(
        file.encode_delimited(&value).unwrap(),
        vec![0x07, 0x0a, 0x05, 0x0a, 0x01, 0x41, 0x10, 0x01]
    );
}

#[test]
fn test_example_json_round_trip() {
    let file = country_list();
    let input: Value =
        serde_json::from_str(&std::fs::read_to_string(EXAMPLE_JSON).unwrap()).unwrap();

    let bytes = file.encode(&input).unwrap();
    assert_eq!(file.decode(&bytes).unwrap(), input);

    let framed = file.encode_delimited(&input).unwrap();
    assert_eq!(file.decode_delimited(&framed).unwrap(), input);
}

#[test]
fn test_imported_enum_resolves() {
    let country = ProtoFile::load(EXAMPLE_PROTO, "example.v1.Country").unwrap();
    let bytes = country.encode(&json!({"region": "REGION_ASIA"})).unwrap();

    assert_eq!(bytes, vec![0x18, 0x02]);
    assert_eq!(country.decode(&bytes).unwrap(), json!({"region": "REGION_ASIA"}));
}

#[test]
fn test_proto3_defaults_not_encoded() {
    let file = country_list();
    let bytes = file
        .encode(&json!({"countries": [{"name": "", "code": 0, "cities": []}]}))
        .unwrap();

    // the element itself is present, its zero fields are not
    assert_eq!(bytes, vec![0x0a, 0x00]);
    assert_eq!(file.decode(&bytes).unwrap(), json!({"countries": [{}]}));
}

#[test]
fn test_root_relative_import_with_include_path() {
    let source = SchemaSource::file(CITY_PROTO).with_include_path(FIXTURES);
    let city = ProtoFile::from_source(&source, "City").unwrap();

    let value = json!({"name": "Lyon", "region": "REGION_EUROPE"});
    let bytes = city.encode(&value).unwrap();
    assert_eq!(bytes, vec![0x0a, 0x04, b'L', b'y', b'o', b'n', 0x10, 0x01]);
    assert_eq!(city.decode(&bytes).unwrap(), value);

    // without the root the import cannot be found from the crate directory
    assert!(matches!(
        ProtoFile::load(CITY_PROTO, "City"),
        Err(Error::Schema(SchemaError::Parse(_)))
    ));
}

#[test]
fn test_consecutive_frames() {
    let country = ProtoFile::load(EXAMPLE_PROTO, "Country").unwrap();
    let inputs = [
        json!({"name": "A", "code": 1}),
        json!({}),
        json!({"name": "B", "cities": ["x", "y"]}),
    ];

    let mut buffer = Vec::new();
    for input in &inputs {
        buffer.extend(country.encode_delimited(input).unwrap());
    }

    let mut offset = 0;
    let mut decoded = Vec::new();
    while offset < buffer.len() {
        let (value, consumed) = country.decode_delimited_prefix(&buffer[offset..]).unwrap();
        decoded.push(value);
        offset += consumed;
    }
    assert_eq!(decoded, inputs);
}

#[test]
fn test_truncated_payload() {
    let file = country_list();
    let result = file.decode(&[0x0a, 0x05, 0x0a, 0x01]);
    assert!(matches!(
        result,
        Err(Error::Decode(DecodeError::LengthOverrun { .. }))
    ));

    let result = file.decode_delimited(&[0x07, 0x0a, 0x05]);
    assert!(matches!(result, Err(Error::Decode(DecodeError::Truncated(_)))));
}

#[test]
fn test_unknown_message_type() {
    let result = ProtoFile::load(EXAMPLE_PROTO, "DoesNotExist");
    assert!(matches!(
        result,
        Err(Error::Schema(SchemaError::MessageNotFound(_)))
    ));
}

#[test]
fn test_invalid_schema_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.proto");
    std::fs::write(&path, "syntax = \"proto3\";\nmessage Broken { string = 1; }\n").unwrap();

    let result = ProtoFile::load(&path, "Broken");
    assert!(matches!(result, Err(Error::Schema(SchemaError::Parse(_)))));
}

#[test]
fn test_strict_mapping() {
    let file = country_list().with_options(MapperOptions::strict());
    assert!(file.encode(&json!({"countries": [{"nmae": "typo"}]})).is_err());

    let lenient = country_list();
    assert_eq!(
        lenient.encode(&json!({"countries": [{"nmae": "typo"}]})).unwrap(),
        vec![0x0a, 0x00]
    );
}

#[test]
fn test_text_source() {
    let source = SchemaSource::text(
        "inline.proto",
        r#"
            syntax = "proto2";
            message Ping {
                required uint64 id = 1;
                optional bool ack = 2;
            }
        "#,
    );
    let ping = ProtoFile::from_source(&source, "Ping").unwrap();

    let bytes = ping.encode(&json!({"id": "18446744073709551615", "ack": false})).unwrap();
    assert_eq!(
        bytes,
        vec![0x08, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01, 0x10, 0x00]
    );
    assert_eq!(
        ping.decode(&bytes).unwrap(),
        json!({"id": 18446744073709551615u64, "ack": false})
    );

    assert!(ping.encode(&json!({"ack": true})).is_err());
}

#[test]
fn test_concurrent_loads_share_schema() {
    let handles: Vec<_> = (0..8)
        .map(|_| thread::spawn(country_list))
        .collect();
    let files: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for file in &files[1..] {
        assert!(std::ptr::eq(files[0].schema(), file.schema()));
    }
}
