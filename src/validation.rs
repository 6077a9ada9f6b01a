use std::sync::LazyLock;

use regex::Regex;

/// Largest object a single PUT may declare: 5 GiB.
pub const MAX_OBJECT_SIZE: i64 = 5 * (1 << 30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid bucket name")]
pub struct InvalidBucketName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid key name")]
pub struct InvalidKeyName;

static DOTTED_QUAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+$").unwrap());

const RESERVED_PREFIXES: &[&str] = &["xn--", "sthree-", "amzn-s3-demo-"];
const RESERVED_SUFFIXES: &[&str] = &["-s3alias", "--ol-s3", ".mrap", "--x-s3", "--table-s3"];

/// Validates an S3 general-purpose bucket name.
///
/// Names are 3-63 characters from `[a-z0-9.-]`, begin and end with a letter
/// or digit, contain no `..`, are not formatted like an IPv4 address, and
/// avoid the reserved prefixes and suffixes AWS claims for itself.
pub fn validate_bucket_name(name: &str) -> Result<(), InvalidBucketName> {
    let bytes = name.as_bytes();
    if bytes.len() < 3 || bytes.len() > 63 {
        return Err(InvalidBucketName);
    }

    if !bytes
        .iter()
        .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'.' | b'-'))
    {
        return Err(InvalidBucketName);
    }

    let first = bytes[0];
    let last = bytes[bytes.len() - 1];
    if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
        return Err(InvalidBucketName);
    }
    if !last.is_ascii_lowercase() && !last.is_ascii_digit() {
        return Err(InvalidBucketName);
    }

    if name.contains("..") {
        return Err(InvalidBucketName);
    }

    if DOTTED_QUAD.is_match(name)
        && name
            .split('.')
            .all(|octet| octet.parse::<u16>().is_ok_and(|v| v <= 255))
    {
        return Err(InvalidBucketName);
    }

    if RESERVED_PREFIXES.iter().any(|p| name.starts_with(p)) {
        return Err(InvalidBucketName);
    }
    if RESERVED_SUFFIXES.iter().any(|s| name.ends_with(s)) {
        return Err(InvalidBucketName);
    }

    Ok(())
}

/// Validates an object key: 1-1024 bytes of UTF-8 (guaranteed by `&str`)
/// with no control bytes below 0x20 other than tab and newline.
pub fn validate_key(key: &str) -> Result<(), InvalidKeyName> {
    if key.is_empty() || key.len() > 1024 {
        return Err(InvalidKeyName);
    }

    for b in key.bytes() {
        if b < 0x20 && b != b'\t' && b != b'\n' {
            return Err(InvalidKeyName);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Bucket name cases track the S3 general-purpose naming rules:
    // https://docs.aws.amazon.com/AmazonS3/latest/userguide/bucketnamingrules.html
    #[test]
    fn bucket_name_general_purpose_rules() {
        let long63 = "a".repeat(63);
        let long64 = "a".repeat(64);

        let cases: &[(&str, bool)] = &[
            // Valid
            ("abc", true),
            ("a1b2c3", true),
            ("a-b.c-d", true),
            ("a.b.c", true),
            ("a-.-a", true),
            (long63.as_str(), true),
            // Length
            ("ab", false),
            (long64.as_str(), false),
            // Characters
            ("Abc", false),
            ("a_b", false),
            // Must begin and end with a letter or digit
            ("-abc", false),
            ("abc-", false),
            (".abc", false),
            ("abc.", false),
            // Adjacent periods
            ("a..b", false),
            // IPv4 address form
            ("192.168.5.4", false),
            // An octet above 255 is not an address
            ("999.168.5.4", true),
            // Reserved prefixes
            ("xn--bucket", false),
            ("sthree-bucket", false),
            ("amzn-s3-demo-bucket", false),
            // Reserved suffixes
            ("my-logs-s3alias", false),
            ("images--ol-s3", false),
            ("data.mrap", false),
            ("foo--x-s3", false),
            ("bar--table-s3", false),
        ];

        for (input, want_ok) in cases {
            let got = validate_bucket_name(input);
            assert_eq!(
                got.is_ok(),
                *want_ok,
                "bucket name {input:?}: got {got:?}, want ok={want_ok}"
            );
        }
    }

    #[test]
    fn key_rules() {
        let long1024 = "k".repeat(1024);
        let long1025 = "k".repeat(1025);

        let cases: &[(&str, bool)] = &[
            ("vacation.jpg", true),
            ("photos/2024/beach.png", true),
            ("tab\tand\nnewline", true),
            (long1024.as_str(), true),
            ("", false),
            (long1025.as_str(), false),
            ("null\u{0}byte", false),
            ("escape\u{1b}char", false),
            ("carriage\rreturn", false),
        ];

        for (input, want_ok) in cases {
            let got = validate_key(input);
            assert_eq!(
                got.is_ok(),
                *want_ok,
                "key {input:?}: got {got:?}, want ok={want_ok}"
            );
        }
    }

    #[test]
    fn validators_are_pure() {
        for _ in 0..3 {
            assert!(validate_bucket_name("photos").is_ok());
            assert_eq!(validate_bucket_name("a..b"), Err(InvalidBucketName));
            assert!(validate_key("a/b/c").is_ok());
            assert_eq!(validate_key(""), Err(InvalidKeyName));
        }
    }
}
