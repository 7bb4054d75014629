//! 좌표/영역 모델.

use serde::{Deserialize, Serialize};

/// 직사각형 영역 (x, y, w, h).
///
/// 맥락에 따라 캡처 원점 기준 상대 좌표 또는 화면 절대 좌표로 쓰인다.
/// 멀티 모니터에서 음수 좌표가 가능하므로 원점은 `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// 면적이 0인지 여부
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// 오른쪽 경계 (배타)
    pub fn right(&self) -> i64 {
        self.x as i64 + self.w as i64
    }

    /// 아래쪽 경계 (배타)
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.h as i64
    }

    /// 원점을 (dx, dy)만큼 이동
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..*self
        }
    }

    /// 다른 영역 기준 상대 좌표를 절대 좌표로 변환
    pub fn anchored_at(&self, origin: &Rect) -> Self {
        self.offset(origin.x, origin.y)
    }

    /// 교집합 (겹치지 않으면 None)
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let left = (self.x as i64).max(other.x as i64);
        let top = (self.y as i64).max(other.y as i64);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= left || bottom <= top {
            return None;
        }

        Some(Rect {
            x: left as i32,
            y: top as i32,
            w: (right - left) as u32,
            h: (bottom - top) as u32,
        })
    }

    /// IoU (Intersection over Union), 0.0 ~ 1.0
    pub fn iou(&self, other: &Rect) -> f32 {
        let Some(inter) = self.intersect(other) else {
            return 0.0;
        };
        let inter_area = inter.area() as f64;
        let union = self.area() as f64 + other.area() as f64 - inter_area;
        if union <= 0.0 {
            return 0.0;
        }
        (inter_area / union) as f32
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}@({},{})", self.w, self.h, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchored_rect_adds_origin() {
        let window = Rect::new(100, 200, 800, 600);
        let bbox = Rect::new(10, 20, 50, 15);
        assert_eq!(bbox.anchored_at(&window), Rect::new(110, 220, 50, 15));
    }

    #[test]
    fn intersect_and_iou() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert_eq!(a.intersect(&b), Some(Rect::new(5, 5, 5, 5)));
        assert!((a.iou(&a) - 1.0).abs() < f32::EPSILON);
        assert!(a.iou(&Rect::new(20, 20, 5, 5)).abs() < f32::EPSILON);
        // 25 / (100 + 100 - 25)
        assert!((a.iou(&b) - 25.0 / 175.0).abs() < 1e-6);
    }

    #[test]
    fn negative_origin_is_allowed() {
        let left_monitor = Rect::new(-1920, 0, 1920, 1080);
        let r = Rect::new(10, 10, 5, 5).anchored_at(&left_monitor);
        assert_eq!(r.x, -1910);
        assert!(left_monitor.intersect(&r).is_some());
    }
}
