//! Display Loop Integration Tests
//!
//! Drives the full display loop on a paused clock against fake
//! collaborators.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use callboard::core::{
    DisplayBoard, DisplaySettings, QueueDisplay, QueuePoller, Teardown, CONNECTION_ERROR_BANNER,
};
use callboard::domain::{EpisodePhase, QueueListResponse, Turn};
use common::{ana, orchestrator, FakeAudio, FakeQueueApi, FakeSpeech};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;

fn busy_queue() -> QueueListResponse {
    QueueListResponse {
        pending_turns: (1..=12)
            .map(|n| Turn::new(100 + n as i64, format!("Paciente {}", n), n))
            .collect(),
        in_calling_turns: vec![ana()],
        ..Default::default()
    }
}

struct Harness {
    api: Arc<FakeQueueApi>,
    board: watch::Receiver<DisplayBoard>,
    teardown: Teardown,
    task: JoinHandle<()>,
}

impl Harness {
    fn start(api: FakeQueueApi) -> Self {
        let api = Arc::new(api);
        let orch = orchestrator(
            Arc::new(FakeSpeech::spanish()),
            Arc::new(FakeAudio::default()),
            api.clone(),
        );
        let poller = Arc::new(QueuePoller::new(api.clone()));
        let display = QueueDisplay::new(poller, orch, DisplaySettings::default());
        let board = display.board();

        let teardown = Teardown::new();
        let task = tokio::spawn(display.run(teardown.signal()));

        Self {
            api,
            board,
            teardown,
            task,
        }
    }

    fn board(&self) -> DisplayBoard {
        self.board.borrow().clone()
    }

    async fn stop(self) -> (Arc<FakeQueueApi>, DisplayBoard) {
        self.teardown.fire();
        self.task.await.unwrap();
        let board = self.board.borrow().clone();
        (self.api, board)
    }
}

fn first_waiting(board: &DisplayBoard) -> u32 {
    board.waiting[0].assigned_turn
}

#[tokio::test(start_paused = true)]
async fn test_display_announces_and_rotates_around_episode() {
    let harness = Harness::start(FakeQueueApi::serving(busy_queue()));

    sleep(Duration::from_secs(4)).await;
    let board = harness.board();
    assert_eq!(board.calling.as_ref().map(|t| t.id), Some(1));
    assert!(board.phase.is_active());
    assert_eq!(board.waiting.len(), 5);
    assert_eq!(board.waiting_total, 12);

    // The 8s rotation tick lands mid-announcement and is skipped
    sleep(Duration::from_millis(4200)).await;
    let board = harness.board();
    assert!(board.phase.is_active());
    assert_eq!(first_waiting(&board), 1);

    // Episode over: acknowledged, moved to attending
    sleep(Duration::from_secs(2)).await;
    let board = harness.board();
    assert_eq!(board.phase, EpisodePhase::Idle);
    assert!(board.calling.is_none());
    assert_eq!(board.attending.len(), 1);
    assert_eq!(board.attending[0].status, callboard::TurnStatus::Attending);

    // Next rotation tick moves the waiting window
    sleep(Duration::from_secs(6)).await;
    assert_eq!(first_waiting(&harness.board()), 2);

    let (api, board) = harness.stop().await;
    assert_eq!(api.acks(), vec![1]);
    assert_eq!(board.phase, EpisodePhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_mid_announcement_writes_nothing() {
    let harness = Harness::start(FakeQueueApi::serving(busy_queue()));

    sleep(Duration::from_secs(3)).await;
    assert!(harness.board().phase.is_active());

    let (api, board) = harness.stop().await;
    assert_eq!(board.phase, EpisodePhase::Idle);
    assert!(board.calling.is_none());

    sleep(Duration::from_secs(60)).await;
    assert!(api.acks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_error_banner_after_repeated_failures() {
    let api = FakeQueueApi::default();
    api.fail_fetch.store(true, Ordering::SeqCst);
    let harness = Harness::start(api);

    // Idle cadence: polls at 0s, 8s, 16s
    sleep(Duration::from_secs(9)).await;
    assert!(harness.board().error.is_none());

    sleep(Duration::from_secs(8)).await;
    assert_eq!(
        harness.board().error.as_deref(),
        Some(CONNECTION_ERROR_BANNER)
    );

    // Recovery clears it on the next poll
    harness.api.fail_fetch.store(false, Ordering::SeqCst);
    sleep(Duration::from_secs(8)).await;
    assert!(harness.board().error.is_none());

    let (api, _) = harness.stop().await;
    assert!(api.fetches.load(Ordering::SeqCst) >= 4);
}

#[tokio::test(start_paused = true)]
async fn test_short_lists_do_not_rotate() {
    let api = FakeQueueApi::serving(QueueListResponse {
        pending_turns: (1..=3).map(|n| Turn::new(n as i64, "Paciente", n)).collect(),
        ..Default::default()
    });
    let harness = Harness::start(api);

    sleep(Duration::from_secs(1)).await;
    let before = harness.board();
    assert_eq!(before.waiting.len(), 3);

    sleep(Duration::from_secs(30)).await;
    assert_eq!(harness.board().waiting, before.waiting);

    harness.stop().await;
}
