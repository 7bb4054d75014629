//! 원문 언어 자동 감지 (whatlang).
//!
//! 신뢰할 수 있는 감지 결과만 ISO 639-1 코드로 돌려준다.
//! 짧은 UI 텍스트는 대개 신뢰도가 낮아 None이 된다.

use whatlang::Lang;

/// 텍스트 언어 감지 → ISO 639-1 코드
pub fn detect_language(text: &str) -> Option<&'static str> {
    let info = whatlang::detect(text)?;
    if !info.is_reliable() {
        return None;
    }
    iso_639_1(info.lang())
}

fn iso_639_1(lang: Lang) -> Option<&'static str> {
    let code = match lang {
        Lang::Eng => "en",
        Lang::Vie => "vi",
        Lang::Cmn => "zh",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Spa => "es",
        Lang::Por => "pt",
        Lang::Ita => "it",
        Lang::Rus => "ru",
        Lang::Tha => "th",
        Lang::Ind => "id",
        Lang::Nld => "nl",
        Lang::Pol => "pl",
        Lang::Tur => "tr",
        Lang::Ukr => "uk",
        _ => return None,
    };
    Some(code)
}
