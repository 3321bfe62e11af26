use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

pub const HTTP_METHOD: &str = "POST";
pub const HTTP_URI: &str = "/v1/identify";
pub const DATA_TYPE: &str = "audio";
pub const SIGNATURE_VERSION: &str = "1";

type HmacSha1 = Hmac<Sha1>;

/// 서명 대상 문자열을 만든다.
/// `POST\n/v1/identify\n{access_key}\naudio\n{signature_version}\n{timestamp}`
pub fn string_to_sign(access_key: &str, signature_version: &str, timestamp: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        HTTP_METHOD, HTTP_URI, access_key, DATA_TYPE, signature_version, timestamp
    )
}

/// HMAC-SHA1 서명을 base64로 인코딩해 반환한다.
pub fn create_signature(string_to_sign: &str, access_secret: &str) -> String {
    let mut mac = HmacSha1::new_from_slice(access_secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(string_to_sign.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}
