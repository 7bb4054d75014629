//! 파이프라인 종단 간 통합 테스트.
//!
//! 가짜 화면/추출기/번역기 + 실제 변경 감지기, 렌더러, 오케스트레이터.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{gradient, harness, reversed_gradient, wait_event, FakeExtractor, MAX_RETRIES};
use lingo_app::event_bus::PipelineEvent;
use lingo_app::state::RegionState;
use lingo_core::error::CaptureError;
use lingo_core::models::capture::RegionHandle;

#[tokio::test]
async fn changed_frame_renders_translated_box() {
    let h = harness(FakeExtractor::new(&["B"]));
    let mut rx = h.events.subscribe();
    let handle = RegionHandle::new(42, None);

    h.orchestrator.start_region(handle);
    let event = wait_event(&mut rx, |e| matches!(e, PipelineEvent::CycleCompleted { .. })).await;
    assert!(matches!(event, PipelineEvent::CycleCompleted { boxes: 1, carried: 0, .. }));

    let boxes = h.surface.boxes(handle.id);
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0].display_text, "B_translated");
    // 창 원점(100,100) + 상대 bbox(10,10)
    assert_eq!(boxes[0].absolute_bbox.x, 110);
    assert_eq!(boxes[0].absolute_bbox.y, 110);

    h.orchestrator.stop_all();
}

#[tokio::test]
async fn identical_frames_do_not_extract_again() {
    let h = harness(FakeExtractor::new(&["B"]));
    let mut rx = h.events.subscribe();
    let handle = RegionHandle::new(1, None);

    h.orchestrator.start_region(handle);
    wait_event(&mut rx, |e| matches!(e, PipelineEvent::CycleCompleted { .. })).await;

    // 같은 화면으로 여러 번 폴링
    let captures_before = h.screen.captures.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(h.screen.captures.load(Ordering::SeqCst) > captures_before + 3);
    assert_eq!(h.extractor.calls(), 1);
    assert_eq!(h.translator.calls.load(Ordering::SeqCst), 1);

    h.orchestrator.stop_all();
}

#[tokio::test]
async fn new_content_replaces_overlay() {
    let h = harness(FakeExtractor::new(&["B"]));
    let mut rx = h.events.subscribe();
    let handle = RegionHandle::new(1, None);

    h.orchestrator.start_region(handle);
    let first = wait_event(&mut rx, |e| matches!(e, PipelineEvent::CycleCompleted { .. })).await;
    let PipelineEvent::CycleCompleted { seq: first_seq, .. } = first else {
        unreachable!()
    };

    h.extractor.set_texts(&["C", "D"]);
    h.screen.show(reversed_gradient());

    let second = wait_event(&mut rx, |e| matches!(e, PipelineEvent::CycleCompleted { .. })).await;
    let PipelineEvent::CycleCompleted { seq, boxes, .. } = second else {
        unreachable!()
    };
    assert!(seq > first_seq);
    assert_eq!(boxes, 2);

    let texts: Vec<String> = h
        .surface
        .boxes(handle.id)
        .into_iter()
        .map(|b| b.display_text)
        .collect();
    assert_eq!(texts, vec!["C_translated", "D_translated"]);
    assert_eq!(h.extractor.calls(), 2);

    h.orchestrator.stop_all();
}

#[tokio::test]
async fn stop_clears_overlay() {
    let h = harness(FakeExtractor::new(&["B"]));
    let mut rx = h.events.subscribe();
    let handle = RegionHandle::new(1, None);

    let state = h.orchestrator.start_region(handle);
    wait_event(&mut rx, |e| matches!(e, PipelineEvent::CycleCompleted { .. })).await;
    assert!(h.surface.is_visible(handle.id));

    assert!(h.orchestrator.stop_region(handle.id));
    assert!(!h.surface.is_visible(handle.id));
    assert_eq!(*state.borrow(), RegionState::Stopped);

    let stopped = wait_event(&mut rx, |e| matches!(e, PipelineEvent::RegionStopped { .. })).await;
    assert_eq!(
        stopped,
        PipelineEvent::RegionStopped {
            region: handle.id,
            error: None
        }
    );

    let result = h.orchestrator.join_region(handle.id).await;
    assert!(matches!(result, Some(Ok(()))));
    assert!(h.orchestrator.active_regions().is_empty());
}

#[tokio::test]
async fn capture_error_stops_region() {
    let h = harness(FakeExtractor::new(&["B"]));
    let mut rx = h.events.subscribe();
    let handle = RegionHandle::new(9, None);

    let mut state = h.orchestrator.start_region(handle);
    wait_event(&mut rx, |e| matches!(e, PipelineEvent::CycleCompleted { .. })).await;

    h.screen.close_window();

    tokio::time::timeout(
        Duration::from_secs(2),
        state.wait_for(|s| *s == RegionState::Stopped),
    )
    .await
    .expect("영역이 중단되지 않음")
    .unwrap();

    assert!(!h.surface.is_visible(handle.id));
    assert!(!h.renderer.is_open(handle.id));

    let stopped = wait_event(&mut rx, |e| matches!(e, PipelineEvent::RegionStopped { .. })).await;
    let PipelineEvent::RegionStopped { error, .. } = stopped else {
        unreachable!()
    };
    assert!(error.is_some());

    let result = h.orchestrator.join_region(handle.id).await;
    assert!(matches!(
        result,
        Some(Err(CaptureError::WindowInvalid { window_id: 9 }))
    ));
}

#[tokio::test]
async fn extraction_failure_is_retried_on_same_screen() {
    let h = harness(FakeExtractor::new(&["B"]).failing_first(1));
    let mut rx = h.events.subscribe();
    let handle = RegionHandle::new(1, None);

    h.orchestrator.start_region(handle);
    wait_event(&mut rx, |e| matches!(e, PipelineEvent::ExtractionFailed { .. })).await;

    // 화면은 그대로지만 대기 후 감지기가 초기화되어 다시 처리된다
    wait_event(&mut rx, |e| matches!(e, PipelineEvent::CycleCompleted { .. })).await;
    assert_eq!(h.extractor.calls(), 2);
    assert_eq!(h.surface.boxes(handle.id)[0].display_text, "B_translated");

    h.orchestrator.stop_all();
}

#[tokio::test]
async fn translation_failure_is_reported_once() {
    let h = harness(FakeExtractor::new(&["B", "Menu"]));
    h.translator.fail_on("Menu");
    let mut rx = h.events.subscribe();
    let handle = RegionHandle::new(1, None);

    h.orchestrator.start_region(handle);
    let failed = wait_event(&mut rx, |e| matches!(e, PipelineEvent::TranslationFailed { .. })).await;
    assert!(matches!(failed, PipelineEvent::TranslationFailed { ref text, .. } if text == "Menu"));

    // 같은 화면은 재시도 한도까지만 다시 처리되고 보고는 한 번뿐
    tokio::time::sleep(Duration::from_millis(400)).await;
    let expected = 1 + MAX_RETRIES as usize;
    assert_eq!(h.extractor.calls(), expected);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(h.extractor.calls(), expected);

    let mut reports = 0;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, PipelineEvent::TranslationFailed { .. }) {
            reports += 1;
        }
    }
    assert_eq!(reports, 0);

    // 성공한 텍스트는 계속 표시된다
    let texts: Vec<String> = h
        .surface
        .boxes(handle.id)
        .into_iter()
        .filter(|b| !b.stale)
        .map(|b| b.display_text)
        .collect();
    assert_eq!(texts, vec!["B_translated"]);

    h.orchestrator.stop_all();
}

#[tokio::test]
async fn transient_translation_failure_recovers_on_retry() {
    let h = harness(FakeExtractor::new(&["B", "Menu"]));
    h.translator.fail_on("Menu");
    let mut rx = h.events.subscribe();
    let handle = RegionHandle::new(1, None);

    h.orchestrator.start_region(handle);
    wait_event(&mut rx, |e| matches!(e, PipelineEvent::TranslationFailed { .. })).await;
    h.translator.heal("Menu");

    wait_event(&mut rx, |e| {
        matches!(e, PipelineEvent::CycleCompleted { boxes: 2, carried: 0, .. })
    })
    .await;
    let texts: Vec<String> = h
        .surface
        .boxes(handle.id)
        .into_iter()
        .map(|b| b.display_text)
        .collect();
    assert_eq!(texts, vec!["B_translated", "Menu_translated"]);

    h.orchestrator.stop_all();
}

#[tokio::test]
async fn stale_box_survives_repeated_failures() {
    let h = harness(FakeExtractor::new(&["Menu"]));
    let mut rx = h.events.subscribe();
    let handle = RegionHandle::new(1, None);

    h.orchestrator.start_region(handle);
    wait_event(&mut rx, |e| matches!(e, PipelineEvent::CycleCompleted { .. })).await;

    // 새 화면에서 같은 자리 번역이 계속 실패
    h.translator.fail_on("Menu");
    h.screen.show(reversed_gradient());
    wait_event(&mut rx, |e| matches!(e, PipelineEvent::CycleCompleted { carried: 1, .. })).await;

    tokio::time::sleep(Duration::from_millis(300)).await;
    let boxes = h.surface.boxes(handle.id);
    assert_eq!(boxes.len(), 1);
    assert!(boxes[0].stale);
    assert_eq!(boxes[0].display_text, "Menu_translated");

    // 화면이 바뀌고 번역되면 새 박스로 교체
    h.translator.heal("Menu");
    h.screen.show(gradient());
    wait_event(&mut rx, |e| matches!(e, PipelineEvent::CycleCompleted { carried: 0, .. })).await;
    let boxes = h.surface.boxes(handle.id);
    assert_eq!(boxes.len(), 1);
    assert!(!boxes[0].stale);

    h.orchestrator.stop_all();
}

#[tokio::test]
async fn in_flight_cycle_after_stop_is_not_applied() {
    let h = harness(FakeExtractor::new(&["B"]).with_delay(Duration::from_millis(200)));
    let mut rx = h.events.subscribe();
    let handle = RegionHandle::new(1, None);

    let mut state = h.orchestrator.start_region(handle);
    tokio::time::timeout(
        Duration::from_secs(2),
        state.wait_for(|s| *s == RegionState::Extracting),
    )
    .await
    .expect("추출이 시작되지 않음")
    .unwrap();

    h.orchestrator.stop_region(handle.id);

    let discarded = wait_event(&mut rx, |e| {
        matches!(
            e,
            PipelineEvent::CycleDiscarded { .. } | PipelineEvent::CycleCompleted { .. }
        )
    })
    .await;
    assert!(matches!(discarded, PipelineEvent::CycleDiscarded { .. }));
    assert!(!h.surface.is_visible(handle.id));
    assert_eq!(h.surface.replace_count(), 0);
}
