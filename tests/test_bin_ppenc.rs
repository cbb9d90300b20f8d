mod utils;

use base64::prelude::{BASE64_STANDARD, Engine as _};

use utils::run;

#[test]
fn no_args_shows_short_help() {
    let output = run(&[]);
    dbg!(&output);

    assert_eq!(output.exit_code, 0);
    assert!(output.stdout.contains("Usage:"));
    assert!(output.stdout.contains("--help"));
}

#[test]
fn short_help() {
    let output = run(&["-h"]);
    dbg!(&output);

    assert_eq!(output.exit_code, 0);
    assert!(output.stdout.contains("Usage:"));
    assert!(output.stdout.contains("genkey"));
    assert!(output.stdout.contains("send"));
    assert!(output.stdout.contains("listen"));
}

#[test]
fn version() {
    let output = run(&["--version"]);
    dbg!(&output);

    assert_eq!(output.exit_code, 0);
    assert!(output.stdout.contains("ppenc"));
    assert!(output.stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_argument_is_fatal() {
    let output = run(&["frobnicate"]);
    dbg!(&output);

    assert_eq!(output.exit_code, 2);
    assert!(output.stderr.contains("'frobnicate'"));
}

#[test]
fn genkey_outputs_a_32_byte_base64_key() {
    let output = run(&["genkey"]);
    dbg!(&output);

    assert_eq!(output.exit_code, 0);

    let key = BASE64_STANDARD.decode(output.stdout.trim()).unwrap();
    assert_eq!(key.len(), 32);
}

#[test]
fn genkey_keys_are_not_repeated() {
    let first = run(&["genkey"]);
    let second = run(&["genkey"]);

    assert_ne!(first.stdout, second.stdout);
}

#[test]
fn send_requires_a_key() {
    let output = run(&["send"]);
    dbg!(&output);

    assert_eq!(output.exit_code, 2);
    assert!(output.stderr.contains("key"));
}

#[test]
fn send_rejects_a_key_of_the_wrong_size() {
    let output = run(&["send", "-k", "c2VjcmV0"]);
    dbg!(&output);

    assert_eq!(output.exit_code, 2);
    assert!(output.stderr.contains("32 bytes"));
}

#[test]
fn send_rejects_invalid_base64() {
    let output = run(&["send", "-k", "not base64!!"]);
    dbg!(&output);

    assert_eq!(output.exit_code, 2);
    assert!(output.stderr.contains("base64"));
}
