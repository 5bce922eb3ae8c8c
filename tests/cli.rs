//! Tests for the `dynproto` binary.

use std::io::Write;
use std::process::{Command, Output, Stdio};

const EXAMPLE_PROTO: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/example/v1/example.proto"
);

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn dynproto(args: &[&str], stdin: &[u8]) -> Output {
    dynproto_in(env!("CARGO_MANIFEST_DIR"), args, stdin)
}

fn dynproto_in(dir: &str, args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_dynproto"))
        .current_dir(dir)
        .args(args)
        .env_remove("DYNPROTO_PROTO")
        .env_remove("DYNPROTO_MESSAGE")
        .env_remove("DYNPROTO_STRICT")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start dynproto");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin)
        .expect("Failed to write stdin");
    child.wait_with_output().expect("Failed to wait for dynproto")
}

#[test]
fn test_encode_then_decode() {
    let encoded = dynproto(
        &["encode", "--proto", EXAMPLE_PROTO, "--message", "CountryList"],
        br#"{"countries": [{"name": "A", "code": 1}]}"#,
    );
    assert!(encoded.status.success(), "{}", String::from_utf8_lossy(&encoded.stderr));
    assert_eq!(encoded.stdout, vec![0x0a, 0x05, 0x0a, 0x01, 0x41, 0x10, 0x01]);

    let decoded = dynproto(
        &["decode", "--proto", EXAMPLE_PROTO, "--message", "CountryList"],
        &encoded.stdout,
    );
    assert!(decoded.status.success());
    assert_eq!(
        String::from_utf8(decoded.stdout).unwrap().trim(),
        r#"{"countries":[{"name":"A","code":1}]}"#
    );
}

#[test]
fn test_delimited_stream() {
    let encoded = dynproto(
        &[
            "encode",
            "--proto",
            EXAMPLE_PROTO,
            "--message",
            "Country",
            "--delimited",
        ],
        b"{\"name\": \"A\"}\n{\"code\": 2}\n",
    );
    assert!(encoded.status.success());
    assert_eq!(
        encoded.stdout,
        vec![0x03, 0x0a, 0x01, 0x41, 0x02, 0x10, 0x02]
    );

    let decoded = dynproto(
        &[
            "decode",
            "--proto",
            EXAMPLE_PROTO,
            "--message",
            "Country",
            "--delimited",
        ],
        &encoded.stdout,
    );
    assert!(decoded.status.success());
    let stdout = String::from_utf8(decoded.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec![r#"{"name":"A"}"#, r#"{"code":2}"#]);
}

#[test]
fn test_strict_flag_and_error_exit() {
    let output = dynproto(
        &[
            "encode",
            "--proto",
            EXAMPLE_PROTO,
            "--message",
            "Country",
            "--strict",
        ],
        br#"{"nmae": "typo"}"#,
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "{stderr}");
    assert!(stderr.contains("nmae"), "{stderr}");
}

#[test]
fn test_inspect() {
    let output = dynproto(
        &["inspect", "--proto", EXAMPLE_PROTO, "--message", "Country"],
        b"",
    );
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("message example.v1.Country"));
    assert!(stdout.contains("enum:example.v1.Region = 3 [region]"));
    assert!(stdout.contains("map message:example.v1.Country.PopulationEntry = 5 [population]"));
}

#[test]
fn test_root_relative_import_from_working_directory() {
    let output = dynproto_in(
        FIXTURES,
        &["encode", "--proto", "example/v1/city.proto", "--message", "City"],
        br#"{"region": "REGION_ASIA"}"#,
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(output.stdout, vec![0x10, 0x02]);
}

#[test]
fn test_include_flag() {
    let city = format!("{FIXTURES}/example/v1/city.proto");
    let output = dynproto(
        &["decode", "--proto", &city, "--message", "City", "-I", FIXTURES],
        &[0x10, 0x02],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8(output.stdout).unwrap().trim(),
        r#"{"region":"REGION_ASIA"}"#
    );
}
