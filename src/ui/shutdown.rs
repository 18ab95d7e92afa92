use log::info;
use std::sync::LazyLock;
use tokio::spawn;
use tokio_util::task::TaskTracker;

/// Every background task of the app: recognition, translation, updates.
pub static TASK_TRACKER: LazyLock<TaskTracker> = LazyLock::new(TaskTracker::new);

pub fn shutdown_tasks() {
    let tracker = TASK_TRACKER.clone();
    if tracker.is_closed() {
        return;
    }
    info!("start shutdown of {:?} tasks", tracker.len());
    tracker.close();

    spawn(async move {
        tracker.wait().await;
        info!("shutdown done");
    });
}
