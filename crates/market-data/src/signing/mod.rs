//! Request signing for marketplace gateways.
//!
//! Two stateless algorithms are provided:
//! - [`hmac_sha256_signature`]: canonical query string signed with HMAC-SHA256,
//!   base64 encoded (Amazon Product Advertising style).
//! - [`md5_digest_signature`]: secret-wrapped concatenation of sorted
//!   key/value pairs, MD5, uppercase hex (Taobao open platform style).
//!
//! Both sort parameters by key internally, so the result does not depend on
//! the order the caller inserted them in. Both skip their own signature
//! field; callers add it to the request only after signing.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::MarketDataError;

type HmacSha256 = Hmac<Sha256>;

/// Parameter name carrying the HMAC signature.
pub const HMAC_SIGNATURE_FIELD: &str = "Signature";

/// Parameter name carrying the MD5 digest signature.
pub const DIGEST_SIGNATURE_FIELD: &str = "sign";

fn sorted_without<I, K, V>(params: I, skip: &str) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    params
        .into_iter()
        .filter(|(k, _)| k.as_ref() != skip)
        .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
        .collect()
}

/// Percent-encode a query value. Unreserved characters and `/` pass through.
fn quote(value: &str) -> String {
    urlencoding::encode(value).replace("%2F", "/")
}

/// Build the canonical query string: sorted `key=quote(value)` joined by `&`.
pub fn canonical_query<I, K, V>(params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    sorted_without(params, HMAC_SIGNATURE_FIELD)
        .iter()
        .map(|(k, v)| format!("{}={}", k, quote(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Sign a request with HMAC-SHA256 over `METHOD\nHOST\nPATH\n<canonical query>`.
///
/// Returns the standard base64 encoding of the digest.
///
/// # Examples
///
/// ```
/// use crossprice_market_data::signing::hmac_sha256_signature;
///
/// let params = [("b", "2"), ("a", "1")];
/// let signature =
///     hmac_sha256_signature("secret", "GET", "webservices.amazon.com", "/onca/xml", params)
///         .unwrap();
/// assert_eq!(signature, "zR5M1JhHj9ZH35LjWW+uU3hnq3xuqrV1WIdgoaNqJdw=");
/// ```
pub fn hmac_sha256_signature<I, K, V>(
    secret: &str,
    method: &str,
    host: &str,
    path: &str,
    params: I,
) -> Result<String, MarketDataError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        method.to_ascii_uppercase(),
        host,
        path,
        canonical_query(params)
    );

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| MarketDataError::Signing(format!("Invalid HMAC key: {}", e)))?;
    mac.update(string_to_sign.as_bytes());

    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Sign a request with `MD5(secret + k1 + v1 + ... + kn + vn + secret)`,
/// keys in lexicographic order, uppercase hex.
///
/// # Examples
///
/// ```
/// use crossprice_market_data::signing::md5_digest_signature;
///
/// assert_eq!(
///     md5_digest_signature("secret", [("b", "2"), ("a", "1")]),
///     "EF16F26C937CF52AE6F85DF2FD08B24A"
/// );
/// ```
pub fn md5_digest_signature<I, K, V>(secret: &str, params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut payload = String::from(secret);
    for (k, v) in sorted_without(params, DIGEST_SIGNATURE_FIELD) {
        payload.push_str(&k);
        payload.push_str(&v);
    }
    payload.push_str(secret);

    format!("{:X}", md5::compute(payload.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taobao_params() -> Vec<(&'static str, &'static str)> {
        vec![
            ("method", "taobao.tbk.item.get"),
            ("app_key", "12345678"),
            ("timestamp", "1700000000"),
            ("format", "json"),
            ("v", "2.0"),
            ("sign_method", "md5"),
            ("q", "headphones"),
            ("page_size", "20"),
        ]
    }

    fn amazon_params() -> Vec<(&'static str, &'static str)> {
        vec![
            ("Service", "AWSECommerceService"),
            ("Operation", "ItemSearch"),
            ("AWSAccessKeyId", "AKID"),
            ("AssociateTag", "tag-20"),
            ("SearchIndex", "All"),
            ("Keywords", "noise cancelling/headphones"),
            ("Timestamp", "2024-01-01T00:00:00Z"),
            ("Version", "2013-08-01"),
        ]
    }

    #[test]
    fn test_md5_known_answer() {
        assert_eq!(
            md5_digest_signature("secret", taobao_params()),
            "94A1C25A41C4603A953944A6573CA984"
        );
    }

    #[test]
    fn test_md5_is_insertion_order_independent() {
        let mut reversed = taobao_params();
        reversed.reverse();
        assert_eq!(
            md5_digest_signature("secret", taobao_params()),
            md5_digest_signature("secret", reversed)
        );
    }

    #[test]
    fn test_md5_changes_with_any_value() {
        let baseline = md5_digest_signature("secret", taobao_params());
        for i in 0..taobao_params().len() {
            let mut params: Vec<(String, String)> = taobao_params()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            params[i].1.push('x');
            assert_ne!(baseline, md5_digest_signature("secret", params), "param {}", i);
        }
    }

    #[test]
    fn test_md5_ignores_existing_sign_field() {
        let mut params = taobao_params();
        params.push(("sign", "STALE"));
        assert_eq!(
            md5_digest_signature("secret", params),
            "94A1C25A41C4603A953944A6573CA984"
        );
    }

    #[test]
    fn test_md5_is_uppercase_hex() {
        let signature = md5_digest_signature("k", [("a", "b")]);
        assert_eq!(signature.len(), 32);
        assert!(signature
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn test_canonical_query_sorts_and_encodes() {
        assert_eq!(
            canonical_query(amazon_params()),
            "AWSAccessKeyId=AKID&AssociateTag=tag-20&Keywords=noise%20cancelling/headphones\
             &Operation=ItemSearch&SearchIndex=All&Service=AWSECommerceService\
             &Timestamp=2024-01-01T00%3A00%3A00Z&Version=2013-08-01"
        );
    }

    #[test]
    fn test_hmac_known_answer() {
        let signature = hmac_sha256_signature(
            "secret",
            "GET",
            "webservices.amazon.com",
            "/onca/xml",
            amazon_params(),
        )
        .unwrap();
        assert_eq!(signature, "cYJ34lokvVzQdXgD/u/lL3WC3YTPCDa63YJzofbaxS8=");
    }

    #[test]
    fn test_hmac_is_deterministic_and_order_independent() {
        let mut reversed = amazon_params();
        reversed.reverse();
        let a = hmac_sha256_signature("secret", "GET", "h", "/p", amazon_params()).unwrap();
        let b = hmac_sha256_signature("secret", "GET", "h", "/p", reversed).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hmac_excludes_signature_field() {
        let mut params = amazon_params();
        params.push(("Signature", "old"));
        let signature =
            hmac_sha256_signature("secret", "GET", "webservices.amazon.com", "/onca/xml", params)
                .unwrap();
        assert_eq!(signature, "cYJ34lokvVzQdXgD/u/lL3WC3YTPCDa63YJzofbaxS8=");
    }

    #[test]
    fn test_hmac_depends_on_secret() {
        let a = hmac_sha256_signature("one", "GET", "h", "/p", [("a", "1")]).unwrap();
        let b = hmac_sha256_signature("two", "GET", "h", "/p", [("a", "1")]).unwrap();
        assert_ne!(a, b);
    }
}
