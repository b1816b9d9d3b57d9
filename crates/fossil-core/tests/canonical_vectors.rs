//! # Canonical Digest Vectors
//!
//! Fixed inputs with their expected canonical text and SHA-256 digest.
//! The expected digests were produced independently by hashing the
//! expected canonical text with a stock SHA-256 tool, so a failure here
//! means the canonical bytes changed, not just the hashing.

use fossil_core::{
    canonicalize, check_integer_literals, digest, sha256_digest, CanonicalValue,
    CanonicalizationError, Scope,
};

fn check_vector(input: &str, canonical: &str, hex: &str) {
    let value: CanonicalValue = serde_json::from_str(input).expect("vector input must parse");
    let bytes = canonicalize(&value).expect("vector must canonicalize");
    assert_eq!(bytes.as_str(), canonical, "canonical text for {input}");
    assert_eq!(
        sha256_digest(&bytes).to_string(),
        format!("sha256:{hex}"),
        "digest for {input}"
    );
}

#[test]
fn vector_round_trip_scenario() {
    let expected = "2aae3bfa906be39530e7d7a4aa90a7e6d4f29c33e3ac80e1c3b05598c5953c04";
    check_vector(r#"{"b":1,"a":[2,3]}"#, r#"{"a":[2,3],"b":1}"#, expected);
    check_vector(r#"{"a":[2,3],"b":1}"#, r#"{"a":[2,3],"b":1}"#, expected);
}

#[test]
fn vector_whitespace_is_insignificant() {
    check_vector(
        "{ \"c\" : \"hello\",\n  \"b\" : 2,\t\"a\" : 1 }",
        r#"{"a":1,"b":2,"c":"hello"}"#,
        "264be526dd59f5bed5c756e96e5a6a08f285ca424658f70b981f2554b4709121",
    );
}

#[test]
fn vector_empty_containers_and_null() {
    check_vector(
        "{}",
        "{}",
        "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a",
    );
    check_vector(
        "[ ]",
        "[]",
        "4f53cda18c2baa0c0354bb5f9a3ecbe5ed12ab4d8e11ba873c2f11161202b945",
    );
    check_vector(
        "null",
        "null",
        "74234e98afe7498fb5daf1f36ac2d78acc339464f950703b8c019892f982b90b",
    );
}

#[test]
fn vector_number_forms() {
    check_vector(
        r#"{"small":1E-7,"count":1.0,"big":1000000000000000000000.0,"amount":1.50}"#,
        r#"{"amount":1.5,"big":1e+21,"count":1,"small":1e-7}"#,
        "e2e9bd1c360f9fde22b80bb9b54259f09cab8b16f47f2c06f2e20790481dd544",
    );
}

#[test]
fn vector_integral_float_beyond_f64_mantissa() {
    let expected = "940721ea09245b6f5b5fe826698b0e5b2f1842932f040069f2a14e260c26ad20";
    check_vector("1152921504606846976", "1152921504606846976", expected);
    check_vector("1152921504606846976.0", "1152921504606846976", expected);
}

#[test]
fn vector_large_integral_floats() {
    check_vector(
        r#"{"exact":1152921504606846976,"big":100000000000000000000}"#,
        r#"{"big":100000000000000000000,"exact":1152921504606846976}"#,
        "9406b57a144e08d219a6ba57d6eddba5e81f498e64a86b37f3ddd751e4061876",
    );
}

#[test]
fn oversized_integer_literals_rejected() {
    for text in [
        "12345678901234567890123",
        r#"{"a":[1,-12345678901234567890124]}"#,
        "18446744073709551616",
    ] {
        assert!(
            matches!(
                check_integer_literals(text),
                Err(CanonicalizationError::IntegerOutOfRange(_))
            ),
            "{text}"
        );
    }
}

#[test]
fn representable_literals_accepted() {
    for text in [
        r#"{"a":-9223372036854775808,"b":18446744073709551615}"#,
        "100000000000000000000",
        "1.2345678901234567890123e22",
        r#"{"note":"12345678901234567890123","k":1e400}"#,
        r#"["escaped \" 99999999999999999999999"]"#,
    ] {
        assert!(check_integer_literals(text).is_ok(), "{text}");
    }
}

#[test]
fn vector_non_ascii_key_order() {
    check_vector(
        "{\"\u{00e9}\":2,\"z\":1}",
        "{\"z\":1,\"\u{00e9}\":2}",
        "e03c91203fb0d21445a742c5bc23d50431105a6e27c0690a2dd8a7be1a31a7e2",
    );
}

#[test]
fn text_and_serialize_paths_digest_identically() {
    let from_json: CanonicalValue =
        serde_json::from_str(r#"{"name":"sensor","ticks":[1,2,3],"gain":0.25}"#).unwrap();
    let from_struct = CanonicalValue::from_serialize(&serde_json::json!({
        "ticks": [1, 2, 3],
        "gain": 0.25,
        "name": "sensor",
    }))
    .unwrap();
    assert_eq!(
        digest(&Scope::custom("a", from_json)).unwrap(),
        digest(&Scope::custom("b", from_struct)).unwrap()
    );
}
