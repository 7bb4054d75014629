//! 박스 그리기 색상.
//!
//! 네이티브 표면은 창 전체에 투명 색상 키 하나만 쓰므로 박스별 불투명도를
//! 알파로 줄 수 없다. 대신 배경 명도로 표현한다: 불투명도가 높을수록 배경이
//! 어두워 글자가 또렷하고, 낮을수록 회색에 가까워진다.

use lingo_core::models::overlay::OverlayBox;

/// 0xRRGGBB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// 창을 투명하게 비울 때 쓰는 색상 키 (박스 색으로는 나오지 않는다)
    pub const TRANSPARENT_KEY: Rgb = Rgb(255, 0, 255);

    const DARK: Rgb = Rgb(20, 20, 20);
    const NEUTRAL: Rgb = Rgb(110, 110, 110);

    /// "#RRGGBB" 파싱
    pub fn from_hex(hex: &str) -> Option<Rgb> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 {
            return None;
        }
        let v = u32::from_str_radix(digits, 16).ok()?;
        Some(Rgb((v >> 16) as u8, (v >> 8) as u8, v as u8))
    }

    /// Win32 COLORREF 값 (0x00BBGGRR)
    pub fn to_colorref(self) -> u32 {
        u32::from(self.0) | (u32::from(self.1) << 8) | (u32::from(self.2) << 16)
    }

    fn mix(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let ch = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb(ch(self.0, other.0), ch(self.1, other.1), ch(self.2, other.2))
    }

    fn scale(self, factor: f32) -> Rgb {
        Rgb::DARK.mix(self, factor)
    }
}

/// 박스 하나의 색
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxStyle {
    pub fill: Rgb,
    pub border: Rgb,
    pub text: Rgb,
}

pub fn box_style(b: &OverlayBox) -> BoxStyle {
    let fill = Rgb::DARK.mix(Rgb::NEUTRAL, 1.0 - b.opacity);
    let accent = Rgb::from_hex(b.band.accent_color()).unwrap_or(Rgb::NEUTRAL);
    if b.stale {
        BoxStyle {
            fill,
            border: accent.scale(0.5),
            text: Rgb(170, 170, 170),
        }
    } else {
        BoxStyle {
            fill,
            border: accent,
            text: Rgb(255, 255, 255),
        }
    }
}
