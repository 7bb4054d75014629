//! # lingo
//!
//! 실시간 화면 영역 번역 오버레이 진입점.
//! 어댑터 조립(DI), 대상 창 선택, 라이프사이클 관리.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use lingo_app::cycle::{CycleRunner, CycleSettings};
use lingo_app::event_bus::{EventBus, PipelineEvent};
use lingo_app::history::{FanoutHistory, TracingHistorySink};
use lingo_app::lifecycle::LifecycleManager;
use lingo_app::orchestrator::{PipelineOrchestrator, PollSettings};
use lingo_app::state::RegionState;
use lingo_core::config::AppConfig;
use lingo_core::config_store::{ConfigOrigin, ConfigStore};
use lingo_core::models::capture::RegionHandle;
use lingo_core::models::geometry::Rect;
use lingo_core::ports::capture::{CaptureSource, WindowProvider};
use lingo_core::ports::overlay::OverlaySurface;
use lingo_overlay::{HeadlessSurface, OverlayRenderer};
use lingo_translate::backends::build_backends;
use lingo_translate::TranslationRouter;
use lingo_vision::capture::WindowCapture;
use lingo_vision::grabber::WindowInfo;
use lingo_vision::ocr::TesseractExtractor;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// lingo — 화면 영역 실시간 번역 오버레이
#[derive(Parser, Debug)]
#[command(name = "lingo")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 대상 창 제목 (부분 일치, 대소문자 무시)
    #[arg(long, short = 'w')]
    window: Option<String>,

    /// 대상 창 ID (--list-windows로 확인)
    #[arg(long)]
    window_id: Option<u32>,

    /// 창 안의 모니터링 영역 "x,y,w,h" (기본: 창 전체)
    #[arg(long, value_parser = parse_region)]
    region: Option<Rect>,

    /// 원문 언어 (예: en, auto)
    #[arg(long)]
    source: Option<String>,

    /// 대상 언어 (예: vi)
    #[arg(long)]
    target: Option<String>,

    /// 폴링 간격 (밀리초)
    #[arg(long)]
    poll_interval: Option<u64>,

    /// 캡처 가능한 창 목록 출력 후 종료
    #[arg(long)]
    list_windows: bool,

    /// 오버레이 창 없이 실행 (결과는 로그로 출력)
    #[arg(long)]
    headless: bool,
}

/// 그리기 표면 선택 — 네이티브 창을 못 쓰면 헤드리스
fn overlay_surface(headless: bool) -> Arc<dyn OverlaySurface> {
    if headless {
        return Arc::new(HeadlessSurface::new());
    }

    #[cfg(all(windows, feature = "native-overlay"))]
    {
        match lingo_overlay::NativeSurface::spawn() {
            Ok(surface) => return Arc::new(surface),
            Err(e) => warn!("네이티브 오버레이 생성 실패 — 헤드리스 표면으로 실행: {e}"),
        }
    }
    #[cfg(not(all(windows, feature = "native-overlay")))]
    {
        warn!("네이티브 오버레이가 빠진 빌드 (Windows + native-overlay 기능 필요) — 헤드리스 표면으로 실행");
    }
    Arc::new(HeadlessSurface::new())
}

/// "x,y,w,h" → Rect
fn parse_region(s: &str) -> Result<Rect, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, w, h] = parts.as_slice() else {
        return Err(format!("\"x,y,w,h\" 형식이어야 합니다: {s}"));
    };
    let x = x.parse::<i32>().map_err(|e| format!("x: {e}"))?;
    let y = y.parse::<i32>().map_err(|e| format!("y: {e}"))?;
    let w = w.parse::<u32>().map_err(|e| format!("w: {e}"))?;
    let h = h.parse::<u32>().map_err(|e| format!("h: {e}"))?;
    if w == 0 || h == 0 {
        return Err("너비와 높이는 0보다 커야 합니다".to_string());
    }
    Ok(Rect::new(x, y, w, h))
}

/// CLI 인자로 설정 덮어쓰기 (파일에는 저장하지 않음)
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(source) = &args.source {
        config.translation.source_lang = source.clone();
    }
    if let Some(target) = &args.target {
        config.translation.target_lang = target.clone();
    }
    if let Some(ms) = args.poll_interval {
        config.pipeline.poll_interval_ms = ms;
    }
}

/// 대상 창 선택 — ID 우선, 없으면 제목 부분 일치
fn select_window(windows: &[WindowInfo], args: &Args) -> Result<WindowInfo> {
    if let Some(id) = args.window_id {
        return windows
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("창 ID {id}를 찾을 수 없습니다 (--list-windows로 확인)"));
    }
    if let Some(title) = &args.window {
        let needle = title.to_lowercase();
        return windows
            .iter()
            .find(|w| w.title.to_lowercase().contains(&needle))
            .cloned()
            .ok_or_else(|| anyhow!("제목에 \"{title}\"이(가) 포함된 창이 없습니다"));
    }
    bail!("대상 창을 지정하세요: --window <제목> 또는 --window-id <ID>")
}

fn print_windows(windows: &[WindowInfo]) {
    println!("{:>10}  {:<24}  {:<20}  제목", "ID", "앱", "위치");
    for w in windows {
        println!(
            "{:>10}  {:<24}  {:<20}  {}",
            w.id,
            w.app_name,
            w.rect.to_string(),
            w.title
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "lingo={lvl},lingo_app={lvl},lingo_core={lvl},lingo_vision={lvl},lingo_translate={lvl},lingo_overlay={lvl}",
        lvl = args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    // 설정
    let store = match &args.config {
        Some(path) => ConfigStore::open(path.clone()),
        None => ConfigStore::open_default(),
    }
    .context("설정 로드 실패")?;
    info!(
        path = %store.path().display(),
        created = store.origin() == ConfigOrigin::Created,
        "설정 파일"
    );

    let mut config = store.snapshot();
    apply_overrides(&mut config, &args);
    config.validate().context("CLI 인자 적용 후 설정 검증 실패")?;

    // 캡처
    let capture = Arc::new(WindowCapture::from_config(&config.capture));
    let windows = capture.list_windows().context("창 목록 조회 실패")?;
    if args.list_windows {
        print_windows(&windows);
        return Ok(());
    }
    let target = select_window(&windows, &args)?;
    info!(
        window_id = target.id,
        app = %target.app_name,
        rect = %target.rect,
        "대상 창: {}",
        target.title
    );

    // 텍스트 추출
    let extractor = Arc::new(TesseractExtractor::new(&config.ocr));
    if !TesseractExtractor::is_available() {
        warn!("OCR 비활성화 빌드 (--features ocr 필요) — 텍스트 추출이 매 사이클 실패합니다");
    }

    // 번역
    let backends = build_backends(&config.translation);
    let history = FanoutHistory::new().with(Arc::new(TracingHistorySink));
    let router = Arc::new(
        TranslationRouter::from_config(&config.translation, backends)
            .with_observer(Arc::new(history)),
    );

    // 오버레이
    let surface = overlay_surface(args.headless);
    let renderer = Arc::new(OverlayRenderer::new(
        surface,
        capture.clone() as Arc<dyn WindowProvider>,
        config.overlay.clone(),
    ));

    // 오케스트레이터
    let events = EventBus::default();
    let runner = Arc::new(CycleRunner::new(
        extractor,
        router.clone(),
        renderer,
        events.clone(),
        CycleSettings::from_config(&config),
    ));
    let orchestrator = PipelineOrchestrator::new(
        capture as Arc<dyn CaptureSource>,
        runner,
        events.clone(),
        PollSettings::from_config(&config),
    );

    let mut event_rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            if let PipelineEvent::TranslationFailed { text, reason, .. } = event {
                warn!("번역 실패 보고: '{text}' — {reason}");
            }
        }
    });

    let handle = RegionHandle::new(target.id, args.region);
    let mut state = orchestrator.start_region(handle);
    info!(
        from = %config.translation.source_lang,
        to = %config.translation.target_lang,
        "번역 오버레이 실행 중 (Ctrl+C로 종료)"
    );

    let lifecycle = LifecycleManager::new();
    tokio::select! {
        _ = state.wait_for(|s| *s == RegionState::Stopped) => {}
        _ = lifecycle.wait_for_signal() => {
            orchestrator.stop_all();
        }
    }

    let result = orchestrator.join_region(handle.id).await;

    let stats = router.stats();
    info!(
        cache_hits = stats.cache_hits,
        cache_misses = stats.cache_misses,
        cached = stats.cache_len,
        "번역 통계"
    );
    for tier in &stats.tiers {
        info!(
            tier = %tier.tier,
            backend = %tier.backend,
            successes = tier.successes,
            failures = tier.failures,
            skipped = tier.skipped,
            "티어 통계"
        );
    }

    match result {
        Some(Err(e)) => {
            error!("영역 모니터링 비정상 종료: {e}");
            Err(e).context("캡처 실패로 종료")
        }
        _ => {
            info!("종료");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(id: u32, title: &str) -> WindowInfo {
        WindowInfo {
            id,
            title: title.to_string(),
            app_name: "app".to_string(),
            rect: Rect::new(0, 0, 800, 600),
            minimized: false,
        }
    }

    #[test]
    fn region_argument_parses() {
        assert_eq!(parse_region("10, 20,300,40").unwrap(), Rect::new(10, 20, 300, 40));
        assert!(parse_region("10,20,300").is_err());
        assert!(parse_region("10,20,0,40").is_err());
        assert!(parse_region("a,b,c,d").is_err());
    }

    #[test]
    fn window_selection_prefers_id() {
        let windows = vec![window(1, "Game Client"), window(2, "Terminal")];
        let args = Args::parse_from(["lingo", "--window-id", "2", "--window", "game"]);
        assert_eq!(select_window(&windows, &args).unwrap().id, 2);

        let args = Args::parse_from(["lingo", "--window", "GAME"]);
        assert_eq!(select_window(&windows, &args).unwrap().id, 1);

        let args = Args::parse_from(["lingo"]);
        assert!(select_window(&windows, &args).is_err());
    }

    #[test]
    fn overrides_apply_to_config() {
        let mut config = AppConfig::default_config();
        let args = Args::parse_from([
            "lingo",
            "--source",
            "ja",
            "--target",
            "en",
            "--poll-interval",
            "100",
        ]);
        apply_overrides(&mut config, &args);
        assert_eq!(config.translation.source_lang, "ja");
        assert_eq!(config.translation.target_lang, "en");
        assert_eq!(config.pipeline.poll_interval_ms, 100);
    }
}
