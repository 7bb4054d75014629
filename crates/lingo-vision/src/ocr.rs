//! Tesseract 텍스트 추출기.
//!
//! `leptess` 기반. `ocr` feature가 꺼져 있으면 추출 요청마다
//! `ExtractionError::Unavailable`을 돌려준다. 워드 박스를 줄 단위로 묶어
//! 줄 하나를 텍스트 영역 하나로 만든다.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use image::DynamicImage;
use lingo_core::config::OcrConfig;
use lingo_core::error::ExtractionError;
use lingo_core::models::geometry::Rect;
use lingo_core::models::text::TextRegion;
use lingo_core::ports::text_extractor::TextExtractor;
use tracing::debug;

/// OCR 워드 + 바운딩 박스
#[derive(Debug, Clone, PartialEq)]
pub struct WordBox {
    pub text: String,
    pub bbox: Rect,
}

/// Tesseract 텍스트 추출기
pub struct TesseractExtractor {
    /// tessdata 경로 (None이면 시스템 기본값)
    tessdata_path: Option<PathBuf>,
    /// Tesseract 언어 코드
    language: String,
}

impl TesseractExtractor {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            tessdata_path: config.tessdata_path.clone(),
            language: config.language.clone(),
        }
    }

    /// `ocr` feature로 빌드되었는지
    pub fn is_available() -> bool {
        cfg!(feature = "ocr")
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

#[async_trait]
impl TextExtractor for TesseractExtractor {
    async fn extract(&self, image: Arc<DynamicImage>) -> Result<Vec<TextRegion>, ExtractionError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ExtractionError::EmptyImage);
        }

        #[cfg(feature = "ocr")]
        {
            let tessdata = self
                .tessdata_path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string());
            let language = self.language.clone();

            let (words, confidence) = tokio::task::spawn_blocking(move || {
                recognize_words(&image, tessdata.as_deref(), &language)
            })
            .await
            .map_err(|e| ExtractionError::Failed(format!("작업 조인 실패: {e}")))??;

            let lines = group_into_lines(words, confidence);
            debug!(lines = lines.len(), confidence, "OCR 완료");
            Ok(lines)
        }

        #[cfg(not(feature = "ocr"))]
        {
            debug!(path = ?self.tessdata_path, "OCR feature 비활성화");
            Err(ExtractionError::Unavailable(
                "ocr feature 없이 빌드됨".to_string(),
            ))
        }
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

#[cfg(feature = "ocr")]
fn recognize_words(
    image: &DynamicImage,
    tessdata: Option<&str>,
    language: &str,
) -> Result<(Vec<WordBox>, f32), ExtractionError> {
    let rgba = image.to_rgba8();
    let (w, h) = (rgba.width(), rgba.height());

    let mut lt = leptess::LepTess::new(tessdata, language)
        .map_err(|e| ExtractionError::Unavailable(format!("Tesseract 초기화 실패: {e}")))?;

    lt.set_image_from_mem(rgba.as_raw(), w as i32, h as i32, 4, (w * 4) as i32)
        .map_err(|_| ExtractionError::Failed("이미지 메모리 설정 실패".to_string()))?;

    let full_text = lt
        .get_utf8_text()
        .map_err(|e| ExtractionError::Failed(format!("{e}")))?;
    let confidence = (lt.mean_text_conf() as f32 / 100.0).clamp(0.0, 1.0);

    let Some(boxes) = lt.get_component_boxes(leptess::capi::TessPageIteratorLevel_RIL_WORD, true)
    else {
        return Ok((Vec::new(), confidence));
    };

    let words: Vec<&str> = full_text.split_whitespace().collect();
    let mut result = Vec::new();
    for (i, b) in boxes.iter().enumerate() {
        let Some(text) = words.get(i) else {
            break;
        };
        let geom = b.get_geometry();
        result.push(WordBox {
            text: text.to_string(),
            bbox: Rect::new(geom.x, geom.y, geom.w.max(0) as u32, geom.h.max(0) as u32),
        });
    }
    Ok((result, confidence))
}

/// 워드 박스를 줄 단위 텍스트 영역으로 묶기
///
/// 세로로 절반 이상 겹치고 가로 간격이 글자 높이의 2배 이하이면 같은 줄.
pub fn group_into_lines(mut words: Vec<WordBox>, confidence: f32) -> Vec<TextRegion> {
    words.retain(|w| !w.text.trim().is_empty() && !w.bbox.is_empty());
    words.sort_by_key(|w| (w.bbox.y, w.bbox.x));

    let mut lines: Vec<(Vec<String>, Rect)> = Vec::new();
    for word in words {
        let joined = lines
            .iter_mut()
            .rev()
            .find(|(_, line)| same_line(line, &word.bbox));
        match joined {
            Some((texts, line)) => {
                texts.push(word.text);
                *line = union(line, &word.bbox);
            }
            None => lines.push((vec![word.text], word.bbox)),
        }
    }

    lines
        .into_iter()
        .map(|(texts, bbox)| TextRegion::new(texts.join(" "), bbox, confidence))
        .collect()
}

fn same_line(line: &Rect, word: &Rect) -> bool {
    let top = line.y.max(word.y) as i64;
    let bottom = line.bottom().min(word.bottom());
    let overlap = bottom - top;
    let min_h = line.h.min(word.h) as i64;
    if overlap * 2 < min_h {
        return false;
    }
    let gap = word.x as i64 - line.right();
    gap <= 2 * word.h as i64 && word.right() > line.x as i64
}

fn union(a: &Rect, b: &Rect) -> Rect {
    let left = a.x.min(b.x);
    let top = a.y.min(b.y);
    let right = a.right().max(b.right());
    let bottom = a.bottom().max(b.bottom());
    Rect::new(left, top, (right - left as i64) as u32, (bottom - top as i64) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x: i32, y: i32, w: u32, h: u32) -> WordBox {
        WordBox {
            text: text.to_string(),
            bbox: Rect::new(x, y, w, h),
        }
    }

    #[test]
    fn words_on_same_row_form_one_line() {
        let words = vec![
            word("World", 70, 12, 50, 20),
            word("Hello", 10, 10, 50, 20),
        ];
        let lines = group_into_lines(words, 0.9);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Hello World");
        assert_eq!(lines[0].bbox, Rect::new(10, 10, 110, 22));
        assert_eq!(lines[0].confidence, 0.9);
    }

    #[test]
    fn rows_and_columns_are_split() {
        let words = vec![
            word("Start", 10, 10, 50, 20),
            word("Options", 10, 50, 70, 20),
            // 같은 높이지만 멀리 떨어진 다른 열
            word("Quit", 400, 10, 40, 20),
        ];
        let lines = group_into_lines(words, 0.8);
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(lines.len(), 3);
        assert!(texts.contains(&"Start"));
        assert!(texts.contains(&"Options"));
        assert!(texts.contains(&"Quit"));
    }

    #[test]
    fn blank_words_are_dropped() {
        let lines = group_into_lines(vec![word("  ", 0, 0, 10, 10), word("x", 0, 0, 0, 10)], 1.0);
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn empty_image_is_rejected() {
        let extractor = TesseractExtractor::new(&OcrConfig::default());
        let img = Arc::new(DynamicImage::ImageRgba8(image::RgbaImage::new(0, 0)));
        assert!(matches!(
            extractor.extract(img).await,
            Err(ExtractionError::EmptyImage)
        ));
    }

    #[cfg(not(feature = "ocr"))]
    #[tokio::test]
    async fn disabled_feature_reports_unavailable() {
        let extractor = TesseractExtractor::new(&OcrConfig::default());
        assert!(!TesseractExtractor::is_available());
        let img = Arc::new(DynamicImage::ImageRgba8(image::RgbaImage::new(8, 8)));
        assert!(matches!(
            extractor.extract(img).await,
            Err(ExtractionError::Unavailable(_))
        ));
    }
}
