//! 텍스트 추출기 포트.

use std::sync::Arc;

use async_trait::async_trait;
use image::DynamicImage;

use crate::error::ExtractionError;
use crate::models::text::TextRegion;

/// 이미지 → 텍스트 영역 추출기
///
/// 구현체: `TesseractExtractor` (leptess, `ocr` feature)
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// 이미지에서 텍스트 영역 추출. bbox는 이미지 원점 기준.
    async fn extract(&self, image: Arc<DynamicImage>) -> Result<Vec<TextRegion>, ExtractionError>;

    /// 추출기 이름 (로그용)
    fn name(&self) -> &str;
}
