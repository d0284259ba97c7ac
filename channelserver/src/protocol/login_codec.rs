//! 로그인 방언 코덱
//!
//! 서버 송신: 끝에 공백을 붙이고 코드 페이지로 변환한 뒤 모든 바이트에 15를 더하고
//! 마지막 바이트를 25로 덮어씁니다.
//! 클라이언트 수신: 바이트마다 15를 빼고 0xC3과 XOR 합니다. 14 이하 값은 256을 기준으로
//! 되감아 계산합니다.

use encoding_rs::{Encoding, WINDOWS_1252};

use super::text_encoding::{decode_text, transcode};
use super::CodecError;

/// 로그인 응답 마지막 바이트
pub const LOGIN_SENTINEL: u8 = 25;

const LOGIN_OFFSET: u8 = 0x0F;
const LOGIN_XOR: u8 = 0xC3;

/// 로그인 방언이 쓰는 고정 코드 페이지
pub fn login_encoding() -> &'static Encoding {
    WINDOWS_1252
}

/// 서버 → 클라이언트 응답 인코딩
pub fn encode(text: &str, encoding: &'static Encoding) -> Vec<u8> {
    let mut bytes = transcode(&format!("{} ", text), encoding);

    for byte in bytes.iter_mut() {
        *byte = byte.wrapping_add(LOGIN_OFFSET);
    }

    if let Some(last) = bytes.last_mut() {
        *last = LOGIN_SENTINEL;
    }

    bytes
}

/// 클라이언트 → 서버 요청 디코딩
///
/// 결과 문자는 바이트 값을 그대로 코드 포인트로 사용합니다.
pub fn decode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&value| {
            let plain = if value > 14 {
                (value - LOGIN_OFFSET) ^ LOGIN_XOR
            } else {
                ((0x100u16 - (LOGIN_OFFSET - value) as u16) as u8) ^ LOGIN_XOR
            };
            char::from(plain)
        })
        .collect()
}

/// 클라이언트 측 요청 인코딩 (`decode`의 역변환)
pub fn encode_request(text: &str) -> Result<Vec<u8>, CodecError> {
    text.chars()
        .map(|ch| {
            let code = ch as u32;
            let byte = u8::try_from(code).map_err(|_| CodecError::CharOutOfRange(code))?;
            Ok((byte ^ LOGIN_XOR).wrapping_add(LOGIN_OFFSET))
        })
        .collect()
}

/// 클라이언트 측 응답 디코딩 (`encode`의 역변환)
///
/// 센티널로 덮인 마지막 바이트는 원래 붙였던 공백이므로 버립니다.
pub fn decode_response(bytes: &[u8], encoding: &'static Encoding) -> Result<String, CodecError> {
    let Some((&last, body)) = bytes.split_last() else {
        return Err(CodecError::MissingLoginSentinel);
    };

    if last != LOGIN_SENTINEL {
        return Err(CodecError::MissingLoginSentinel);
    }

    let plain: Vec<u8> = body.iter().map(|b| b.wrapping_sub(LOGIN_OFFSET)).collect();
    Ok(decode_text(&plain, encoding))
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{WINDOWS_1250, WINDOWS_1252};
    use proptest::prelude::*;

    #[test]
    fn test_encode_layout() {
        let encoded = encode("fail", WINDOWS_1252);
        assert_eq!(encoded, vec![b'f' + 15, b'a' + 15, b'i' + 15, b'l' + 15, 25]);
    }

    #[test]
    fn test_encode_wraps_high_bytes() {
        // 0xF5 + 15 = 0x104 → 0x04
        let encoded = encode("\u{f5}", WINDOWS_1252);
        assert_eq!(encoded, vec![0x04, 25]);
    }

    #[test]
    fn test_empty_response_is_single_sentinel() {
        assert_eq!(encode("", WINDOWS_1252), vec![25]);
        assert_eq!(decode_response(&[25], WINDOWS_1252).unwrap(), "");
    }

    #[test]
    fn test_decode_both_branches() {
        // value > 14
        assert_eq!(decode(&[15]), char::from(0xC3u8).to_string());
        assert_eq!(decode(&[0x50]), char::from((0x50 - 15) ^ 0xC3).to_string());
        // value <= 14
        assert_eq!(decode(&[0]), char::from(0xF1u8 ^ 0xC3).to_string());
        assert_eq!(decode(&[14]), char::from(0xFFu8 ^ 0xC3).to_string());
    }

    #[test]
    fn test_decode_every_byte_is_bijective() {
        let all: Vec<u8> = (0..=255u8).collect();
        let decoded = decode(&all);
        let mut seen: Vec<u32> = decoded.chars().map(|c| c as u32).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 256);
        assert_eq!(encode_request(&decoded).unwrap(), all);
    }

    #[test]
    fn test_missing_sentinel() {
        assert_eq!(decode_response(&[], WINDOWS_1252), Err(CodecError::MissingLoginSentinel));
        assert_eq!(
            decode_response(&[b'a' + 15], WINDOWS_1252),
            Err(CodecError::MissingLoginSentinel)
        );
    }

    #[test]
    fn test_request_rejects_wide_chars() {
        assert_eq!(encode_request("가"), Err(CodecError::CharOutOfRange(0xAC00)));
    }

    proptest! {
        #[test]
        fn prop_request_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 0..300)) {
            let decoded = decode(&bytes);
            prop_assert_eq!(encode_request(&decoded).unwrap(), bytes);
        }

        #[test]
        fn prop_response_roundtrip(text in "[ -~]{0,200}") {
            let encoded = encode(&text, WINDOWS_1250);
            prop_assert_eq!(decode_response(&encoded, WINDOWS_1250).unwrap(), text);
        }
    }
}
