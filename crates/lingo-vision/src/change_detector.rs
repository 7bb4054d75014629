//! 영역별 변경 감지기.
//!
//! 직전 지문을 보관하고 새 프레임과 비교해 후속 작업(추출/번역)이
//! 필요한지 판정한다.

use image::DynamicImage;
use tracing::trace;

use crate::fingerprint::{self, Fingerprint};

/// 변경 판정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeDecision {
    /// 후속 작업 필요 여부
    pub changed: bool,
    /// 직전 지문과의 거리 (첫 폴링이면 None)
    pub distance: Option<u32>,
}

/// 변경 감지기 — 모니터링 영역당 하나
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    hash_size: u32,
    threshold: u32,
    previous: Option<Fingerprint>,
}

impl ChangeDetector {
    pub fn new(hash_size: u32, threshold: u32) -> Self {
        Self {
            hash_size,
            threshold,
            previous: None,
        }
    }

    /// 새 이미지 관찰
    ///
    /// 변경으로 판정되면 새 지문을 직전 지문으로 저장한다.
    /// 변경 없음이면 직전 지문은 그대로 유지된다.
    pub fn observe(&mut self, image: &DynamicImage) -> ChangeDecision {
        let current = fingerprint::fingerprint(image, self.hash_size);
        let distance = self
            .previous
            .as_ref()
            .map(|prev| fingerprint::distance(prev, &current));
        let changed = fingerprint::has_changed(self.previous.as_ref(), &current, self.threshold);

        trace!(?distance, changed, fp = %current, "지문 비교");

        if changed {
            self.previous = Some(current);
        }
        ChangeDecision { changed, distance }
    }

    /// 직전 지문 삭제 — 다음 폴링을 첫 폴링처럼 취급 (일시 실패 후 재시도)
    pub fn reset(&mut self) {
        self.previous = None;
    }

    pub fn previous(&self) -> Option<&Fingerprint> {
        self.previous.as_ref()
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn checker(size: u32, cell: u32, phase: u32) -> DynamicImage {
        let img = RgbaImage::from_fn(size, size, |x, y| {
            let on = ((x / cell) + (y / cell) + phase) % 2 == 0;
            let v = if on { 230 } else { 20 };
            image::Rgba([v, v, v, 255])
        });
        DynamicImage::ImageRgba8(img)
    }

    fn gradient(size: u32) -> DynamicImage {
        let img = RgbaImage::from_fn(size, size, |x, y| {
            let v = ((x * 255 / size) ^ (y * 97 / size)) as u8;
            image::Rgba([v, v, v, 255])
        });
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn first_observation_is_changed() {
        let mut detector = ChangeDetector::new(8, 5);
        let decision = detector.observe(&gradient(90));
        assert!(decision.changed);
        assert_eq!(decision.distance, None);
        assert!(detector.previous().is_some());
    }

    #[test]
    fn identical_frame_is_skipped() {
        let mut detector = ChangeDetector::new(8, 5);
        let img = gradient(90);
        detector.observe(&img);
        let decision = detector.observe(&img);
        assert!(!decision.changed);
        assert_eq!(decision.distance, Some(0));
    }

    #[test]
    fn reset_forces_next_observation() {
        let mut detector = ChangeDetector::new(8, 5);
        let img = gradient(90);
        detector.observe(&img);
        detector.reset();
        assert!(detector.previous().is_none());
        assert!(detector.observe(&img).changed);
    }

    #[test]
    fn previous_is_kept_on_skip() {
        let mut detector = ChangeDetector::new(8, u32::MAX - 1);
        let first = checker(90, 10, 0);
        detector.observe(&first);
        let before = detector.previous().cloned();

        // 임계값이 매우 크면 어떤 프레임도 변경이 아니다
        let decision = detector.observe(&checker(90, 10, 1));
        assert!(!decision.changed);
        assert_eq!(detector.previous().cloned(), before);
    }
}
