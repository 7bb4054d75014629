//! 지각 해시(dHash) 지문.
//!
//! 이미지를 (N+1)×N 그레이스케일로 축소한 뒤 가로로 이웃한 픽셀의
//! 밝기 비교 결과를 비트로 기록한다. 비트는 행 우선, MSB 먼저로 채운다.
//! 기본 N=8이면 64비트 지문.

use std::fmt;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};

/// 고정 폭 비트 벡터 지문
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// 64비트 워드, 각 워드는 MSB부터 채움
    words: Vec<u64>,
    /// 유효 비트 수 (N×N)
    bits: u32,
}

impl Fingerprint {
    /// 64비트 지문 생성 (N=8)
    pub fn from_u64(value: u64) -> Self {
        Self {
            words: vec![value],
            bits: 64,
        }
    }

    /// 유효 비트 수
    pub fn bit_len(&self) -> u32 {
        self.bits
    }

    /// 64비트 이하 지문을 정수로 (MSB 정렬)
    pub fn as_u64(&self) -> Option<u64> {
        (self.bits <= 64).then(|| self.words.first().copied().unwrap_or(0))
    }

    fn zeroed(bits: u32) -> Self {
        Self {
            words: vec![0; (bits as usize).div_ceil(64)],
            bits,
        }
    }

    fn set(&mut self, index: u32) {
        let word = (index / 64) as usize;
        let shift = 63 - (index % 64);
        self.words[word] |= 1u64 << shift;
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in &self.words {
            write!(f, "{word:016x}")?;
        }
        Ok(())
    }
}

/// 이미지 지문 계산 (`hash_size` = N)
pub fn fingerprint(image: &DynamicImage, hash_size: u32) -> Fingerprint {
    let n = hash_size.max(1);
    if image.width() == 0 || image.height() == 0 {
        return Fingerprint::zeroed(n * n);
    }

    let gray = image.to_luma8();
    let small = imageops::resize(&gray, n + 1, n, FilterType::Lanczos3);
    pack_bits(&small, n)
}

/// (N+1)×N 그레이스케일 → 비트 패킹
fn pack_bits(small: &GrayImage, n: u32) -> Fingerprint {
    let mut fp = Fingerprint::zeroed(n * n);
    let mut index = 0;
    for y in 0..n {
        for x in 0..n {
            let left = small.get_pixel(x, y)[0];
            let right = small.get_pixel(x + 1, y)[0];
            if left < right {
                fp.set(index);
            }
            index += 1;
        }
    }
    fp
}

/// 해밍 거리. 폭이 다른 지문끼리는 `u32::MAX`.
pub fn distance(a: &Fingerprint, b: &Fingerprint) -> u32 {
    if a.bits != b.bits {
        return u32::MAX;
    }
    a.words
        .iter()
        .zip(&b.words)
        .map(|(x, y)| (x ^ y).count_ones())
        .sum()
}

/// 변경 여부 — 이전 지문이 없으면 항상 변경, 있으면 거리 > 임계값
pub fn has_changed(previous: Option<&Fingerprint>, current: &Fingerprint, threshold: u32) -> bool {
    match previous {
        None => true,
        Some(prev) => distance(prev, current) > threshold,
    }
}
