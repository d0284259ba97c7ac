//! 세션 언어별 텍스트 인코딩
//!
//! 클라이언트는 지역 언어에 따라 서로 다른 8비트 코드 페이지를 사용합니다.

use encoding_rs::{Encoding, WINDOWS_1250, WINDOWS_1252, WINDOWS_1254};
use serde::{Deserialize, Serialize};

/// 클라이언트 지역 언어
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RegionLanguage {
    En,
    Fr,
    Es,
    De,
    Pl,
    It,
    Ru,
    #[default]
    Cz,
    Tr,
}

impl RegionLanguage {
    /// 언어에 대응하는 코드 페이지
    pub fn encoding(&self) -> &'static Encoding {
        match self {
            RegionLanguage::En | RegionLanguage::Fr | RegionLanguage::Es => WINDOWS_1252,
            RegionLanguage::De
            | RegionLanguage::Pl
            | RegionLanguage::It
            | RegionLanguage::Ru
            | RegionLanguage::Cz => WINDOWS_1250,
            RegionLanguage::Tr => WINDOWS_1254,
        }
    }

    /// 언어 코드 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionLanguage::En => "EN",
            RegionLanguage::Fr => "FR",
            RegionLanguage::Es => "ES",
            RegionLanguage::De => "DE",
            RegionLanguage::Pl => "PL",
            RegionLanguage::It => "IT",
            RegionLanguage::Ru => "RU",
            RegionLanguage::Cz => "CZ",
            RegionLanguage::Tr => "TR",
        }
    }

    /// 언어 코드 문자열 파싱 (대소문자 무시)
    pub fn from_code(code: &str) -> Option<Self> {
        let language = match code.trim().to_ascii_uppercase().as_str() {
            "EN" => RegionLanguage::En,
            "FR" => RegionLanguage::Fr,
            "ES" => RegionLanguage::Es,
            "DE" => RegionLanguage::De,
            "PL" => RegionLanguage::Pl,
            "IT" => RegionLanguage::It,
            "RU" => RegionLanguage::Ru,
            "CZ" => RegionLanguage::Cz,
            "TR" => RegionLanguage::Tr,
            _ => return None,
        };
        Some(language)
    }
}

/// 텍스트를 코드 페이지 바이트로 변환합니다.
///
/// 코드 페이지에 없는 문자는 `?`로 치환됩니다.
pub fn transcode(text: &str, encoding: &'static Encoding) -> Vec<u8> {
    let (bytes, _, had_errors) = encoding.encode(text);
    if !had_errors {
        return bytes.into_owned();
    }

    // encoding_rs는 매핑 불가 문자를 HTML 엔티티로 바꾸므로 문자 단위로 다시 변환
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        let (single, _, unmappable) = encoding.encode(ch.encode_utf8(&mut buf));
        if unmappable {
            out.push(b'?');
        } else {
            out.extend_from_slice(&single);
        }
    }
    out
}

/// 코드 페이지 바이트를 텍스트로 변환합니다.
pub fn decode_text(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    text.into_owned()
}
