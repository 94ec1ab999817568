use super::*;

use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn commits_once_after_typing_pauses() {
    let (mut debouncer, mut commits) = SearchDebouncer::new(Duration::from_millis(300));

    for text in ["a", "al", "ali "] {
        debouncer.input(text);
        sleep(Duration::from_millis(100)).await;
    }
    assert!(commits.try_recv().is_err(), "no commit while typing");
    assert!(debouncer.is_pending());

    sleep(Duration::from_millis(250)).await;
    assert_eq!(commits.try_recv().ok().as_deref(), Some("ali"));

    sleep(Duration::from_secs(5)).await;
    assert!(commits.try_recv().is_err(), "exactly one commit per pause");
    assert_eq!(debouncer.draft(), "ali ");
}

#[tokio::test(start_paused = true)]
async fn each_pause_commits_separately() {
    let (mut debouncer, mut commits) = SearchDebouncer::new(DEFAULT_QUIET_PERIOD);

    debouncer.input("al");
    sleep(Duration::from_millis(400)).await;
    debouncer.input("ali");
    sleep(Duration::from_millis(400)).await;

    assert_eq!(commits.try_recv().ok().as_deref(), Some("al"));
    assert_eq!(commits.try_recv().ok().as_deref(), Some("ali"));
    assert!(commits.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn commit_now_cancels_pending_timer() {
    let (mut debouncer, mut commits) = SearchDebouncer::new(Duration::from_millis(300));

    debouncer.input("  vali ");
    assert_eq!(debouncer.commit_now(), "vali");

    sleep(Duration::from_secs(1)).await;
    assert!(commits.try_recv().is_err());
    assert!(!debouncer.is_pending());
}

#[tokio::test(start_paused = true)]
async fn clear_discards_draft_and_timer() {
    let (mut debouncer, mut commits) = SearchDebouncer::new(Duration::from_millis(300));

    debouncer.input("ali");
    debouncer.clear();
    sleep(Duration::from_secs(1)).await;

    assert!(commits.try_recv().is_err());
    assert_eq!(debouncer.draft(), "");
}
