//! 월드 방언 코덱
//!
//! 프레임 구조: `(길이 L, L바이트 페이로드)* 0xFF`
//!
//! - 원문은 세션 코드 페이지로 변환된 뒤 최대 126바이트 청크로 나뉩니다.
//! - 각 청크 앞에 `min(남은 길이, 126)` 길이 바이트가 붙습니다.
//! - 페이로드 바이트는 비트 반전 후 세션 키 마스크와 XOR 됩니다.
//!   키 0의 마스크는 0이므로 서버 송신 방향은 레거시 변환과 동일합니다.
//!
//! 디코더는 증분 방식입니다. 완성된 프레임만 소비하고 잘린 프레임은 버퍼에 남겨
//! 다음 수신 때 이어서 처리합니다.

use bytes::{Buf, BytesMut};
use encoding_rs::Encoding;

use super::text_encoding::{decode_text, transcode};
use super::{CodecError, PACKET_SENTINEL};

/// 청크 하나의 최대 페이로드 길이
pub const MAX_CHUNK_LEN: usize = 126;

/// 세션 키에서 페이로드 마스크를 계산합니다.
pub fn key_mask(key: i32) -> u8 {
    (key as u32 & 0xFF) as u8
}

/// 코드 페이지 바이트를 프레임 하나로 인코딩합니다.
pub fn encode_bytes(payload: &[u8], mask: u8) -> Vec<u8> {
    let chunk_count = payload.len().div_ceil(MAX_CHUNK_LEN);
    let mut out = Vec::with_capacity(payload.len() + chunk_count + 1);

    for chunk in payload.chunks(MAX_CHUNK_LEN) {
        out.push(chunk.len() as u8);
        out.extend(chunk.iter().map(|b| !b ^ mask));
    }

    out.push(PACKET_SENTINEL);
    out
}

/// 서버 → 클라이언트 인코딩 (키 없음)
pub fn encode(text: &str, encoding: &'static Encoding) -> Vec<u8> {
    encode_with_key(text, 0, encoding)
}

/// 세션 키를 적용한 인코딩 (클라이언트 → 서버 방향)
pub fn encode_with_key(text: &str, key: i32, encoding: &'static Encoding) -> Vec<u8> {
    encode_bytes(&transcode(text, encoding), key_mask(key))
}

/// 버퍼 맨 앞의 완성된 프레임 하나를 바이트로 디코딩합니다.
///
/// 프레임이 아직 다 도착하지 않았으면 버퍼를 건드리지 않고 `Ok(None)`을 반환합니다.
pub fn decode_frame_bytes(buf: &mut BytesMut, mask: u8) -> Result<Option<Vec<u8>>, CodecError> {
    let mut offset = 0;
    let mut payload_len = 0;

    // 1차: 프레임 경계만 확인
    loop {
        let Some(&length) = buf.get(offset) else {
            return Ok(None);
        };

        if length == PACKET_SENTINEL {
            break;
        }

        let len = length as usize;
        if len == 0 || len > MAX_CHUNK_LEN {
            return Err(CodecError::InvalidChunkLength { length, offset });
        }

        if buf.len() < offset + 1 + len {
            return Ok(None);
        }

        offset += 1 + len;
        payload_len += len;
    }

    // 2차: 페이로드 복원
    let mut payload = Vec::with_capacity(payload_len);
    let mut cursor = 0;
    while cursor < offset {
        let len = buf[cursor] as usize;
        payload.extend(buf[cursor + 1..cursor + 1 + len].iter().map(|b| !(b ^ mask)));
        cursor += 1 + len;
    }

    buf.advance(offset + 1);
    Ok(Some(payload))
}

/// 버퍼 맨 앞의 완성된 프레임 하나를 텍스트로 디코딩합니다.
///
/// 세션 키는 프레임마다 다시 읽으므로 핸드셰이크 도중 키가 바뀌어도
/// 다음 프레임부터 바로 적용됩니다.
pub fn decode_frame(
    buf: &mut BytesMut,
    key: i32,
    encoding: &'static Encoding,
) -> Result<Option<String>, CodecError> {
    Ok(decode_frame_bytes(buf, key_mask(key))?.map(|bytes| decode_text(&bytes, encoding)))
}

/// 완전한 바이트열을 프레임 단위 텍스트 목록으로 디코딩합니다.
pub fn decode(bytes: &[u8], key: i32, encoding: &'static Encoding) -> Result<Vec<String>, CodecError> {
    let mut buf = BytesMut::from(bytes);
    let mut frames = Vec::new();

    while let Some(frame) = decode_frame(&mut buf, key, encoding)? {
        frames.push(frame);
    }

    if !buf.is_empty() {
        return Err(CodecError::TruncatedFrame(bytes.len() - buf.len()));
    }

    Ok(frames)
}
