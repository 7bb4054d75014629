//! # lingo-vision
//!
//! 화면 영역 이미지 처리 크레이트.
//! 대상 창 캡처(오버레이를 피하는 폴백 체인), 지각 해시 기반 변경 감지,
//! Tesseract 텍스트 추출을 담당한다.

pub mod capture;
pub mod change_detector;
pub mod fingerprint;
pub mod grabber;
pub mod ocr;
