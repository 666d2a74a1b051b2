//! Test vector generator for the `_user` shared-secret token scheme.
//!
//! Any client that mints tokens must reproduce these outputs byte for byte.
//!
//! Usage:
//!   filereg-testvec              # Generate tests/fixtures/test_vectors.json
//!   filereg-testvec --verify     # Verify existing vectors against this build

use filereg_crypto::shared_secret::{self, ServerSecret};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const VECTORS_PATH: &str = "tests/fixtures/test_vectors.json";

#[derive(Serialize, Deserialize)]
struct TestVectors {
    version: String,
    generated_by: String,
    vectors: BTreeMap<String, TestVector>,
}

#[derive(Serialize, Deserialize)]
struct TestVector {
    description: String,
    inputs: BTreeMap<String, String>,
    outputs: BTreeMap<String, String>,
}

/// (name, description, secret, email, nonce)
const CASES: &[(&str, &str, &str, &str, &str)] = &[
    (
        "shared_secret_reference",
        "Reference token for secret \"gubbish\"",
        "gubbish",
        "cfinke@m.com",
        "165d631d3c3045458b4516242dad7ae",
    ),
    (
        "shared_secret_short_nonce",
        "Short nonce, plain address",
        "gubbish",
        "alice@example.com",
        "n0nce",
    ),
    (
        "shared_secret_empty_nonce",
        "Empty nonce: the HMAC key is the secret alone",
        "gubbish",
        "alice@example.com",
        "",
    ),
    (
        "shared_secret_unicode_email",
        "Non-ASCII email is hashed as UTF-8",
        "s3cr3t",
        "jos\u{e9}@example.org",
        "0123456789abcdef",
    ),
];

fn generate_shared_secret_vectors() -> BTreeMap<String, TestVector> {
    let mut vectors = BTreeMap::new();

    for &(name, description, secret, email, nonce) in CASES {
        let key = ServerSecret::new(secret).expect("non-empty secret");
        let consumer_id = shared_secret::consumer_id(email, &key);
        let signature = shared_secret::sign(email, nonce, &key).expect("sign");
        let token = shared_secret::build_token(email, nonce, &key).expect("token");

        vectors.insert(
            name.to_string(),
            TestVector {
                description: description.to_string(),
                inputs: BTreeMap::from([
                    ("secret".to_string(), secret.to_string()),
                    ("secret_hex".to_string(), hex::encode(secret)),
                    ("email".to_string(), email.to_string()),
                    ("nonce".to_string(), nonce.to_string()),
                ]),
                outputs: BTreeMap::from([
                    ("consumer_id".to_string(), consumer_id),
                    ("signature".to_string(), signature),
                    ("token".to_string(), token),
                ]),
            },
        );
    }

    vectors
}

fn generate_all_vectors() -> TestVectors {
    TestVectors {
        version: "1.0".to_string(),
        generated_by: "filereg-testvec".to_string(),
        vectors: generate_shared_secret_vectors(),
    }
}

fn verify_vectors(vectors: &TestVectors) -> bool {
    let regenerated = generate_all_vectors();
    let mut all_pass = true;

    for (name, expected) in &vectors.vectors {
        if let Some(actual) = regenerated.vectors.get(name) {
            if actual.outputs != expected.outputs {
                eprintln!("FAIL: {name}");
                eprintln!("  expected: {:?}", expected.outputs);
                eprintln!("  actual:   {:?}", actual.outputs);
                all_pass = false;
            } else {
                eprintln!("PASS: {name}");
            }
        } else {
            eprintln!("MISSING: {name}");
            all_pass = false;
        }
    }

    all_pass
}

fn write_vectors(vectors: &TestVectors) {
    let json = serde_json::to_string_pretty(vectors).expect("serialize");
    if let Some(parent) = std::path::Path::new(VECTORS_PATH).parent() {
        std::fs::create_dir_all(parent).expect("create dirs");
    }
    std::fs::write(VECTORS_PATH, &json).expect("write file");
    eprintln!(
        "Generated {} test vectors to {VECTORS_PATH}",
        vectors.vectors.len()
    );
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let vectors = if args.iter().any(|a| a == "--verify") {
        match std::fs::read_to_string(VECTORS_PATH) {
            Ok(content) => serde_json::from_str(&content).expect("valid JSON"),
            Err(_) => {
                eprintln!("No existing test vectors found at {VECTORS_PATH}. Generating...");
                let vectors = generate_all_vectors();
                write_vectors(&vectors);
                vectors
            }
        }
    } else {
        let vectors = generate_all_vectors();
        write_vectors(&vectors);
        vectors
    };

    if verify_vectors(&vectors) {
        eprintln!("All test vectors verified successfully.");
    } else {
        eprintln!("Test vector verification FAILED.");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_vector() {
        let vectors = generate_shared_secret_vectors();
        let v = &vectors["shared_secret_reference"];
        assert_eq!(
            v.outputs["consumer_id"],
            "14dd5c7806cc0ac6e8a61358993377a6e69ea36b"
        );
        assert_eq!(
            v.outputs["signature"],
            "56b6f1a3dd735d962c56ce7d8f46e02ec1d4748d2c00c407d75f0969d08bb9c6\
             8c31b3371aa8130317815c89e5072e31bb94b4121c5c165f3515838d4d6c60c4"
        );
        assert_eq!(
            v.outputs["token"],
            format!(
                "cfinke@m.com,{},165d631d3c3045458b4516242dad7ae",
                v.outputs["signature"]
            )
        );
    }

    #[test]
    fn test_regenerated_vectors_verify() {
        assert!(verify_vectors(&generate_all_vectors()));
    }
}
