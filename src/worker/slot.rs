// Lifecycle of one background worker kind

use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Done,
}

/// Holds at most one in-flight worker of a kind.
#[derive(Debug)]
pub struct WorkerSlot {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
    finished: bool,
}

impl WorkerSlot {
    pub fn new(name: &'static str) -> Self {
        WorkerSlot {
            name,
            handle: None,
            finished: false,
        }
    }

    pub fn state(&self) -> WorkerState {
        match &self.handle {
            Some(handle) if !handle.is_finished() => WorkerState::Running,
            Some(_) => WorkerState::Done,
            None if self.finished => WorkerState::Done,
            None => WorkerState::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == WorkerState::Running
    }

    /// Runs `job` on the blocking pool unless a worker of this kind is still
    /// running. Returns whether a worker was started.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn try_spawn<F>(&mut self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_active() {
            tracing::debug!(worker = self.name, "already running, ignoring request");
            return false;
        }

        let name = self.name;
        tracing::info!(worker = name, "starting worker");
        self.handle = Some(tokio::task::spawn_blocking(move || {
            job();
            tracing::info!(worker = name, "worker finished");
        }));
        self.finished = false;
        true
    }

    /// Waits up to `grace` for a running worker. Returns `false` if it is
    /// still running afterwards.
    pub async fn wait(&mut self, grace: Duration) -> bool {
        let Some(handle) = self.handle.as_mut() else {
            return true;
        };

        match tokio::time::timeout(grace, handle).await {
            Ok(result) => {
                if let Err(e) = result {
                    tracing::error!(worker = self.name, error = %e, "worker panicked");
                }
                self.handle = None;
                self.finished = true;
                true
            }
            Err(_) => {
                tracing::warn!(worker = self.name, ?grace, "worker did not stop in time");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[tokio::test]
    async fn refuses_second_spawn_while_running() {
        let mut slot = WorkerSlot::new("test");
        assert_eq!(slot.state(), WorkerState::Idle);

        let (release_tx, release_rx) = mpsc::channel::<()>();
        assert!(slot.try_spawn(move || {
            let _ = release_rx.recv();
        }));
        assert_eq!(slot.state(), WorkerState::Running);
        assert!(!slot.try_spawn(|| {}));

        release_tx.send(()).unwrap();
        assert!(slot.wait(Duration::from_secs(5)).await);
        assert_eq!(slot.state(), WorkerState::Done);

        assert!(slot.try_spawn(|| {}));
        assert!(slot.wait(Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn wait_times_out_on_stuck_worker() {
        let mut slot = WorkerSlot::new("stuck");
        let (release_tx, release_rx) = mpsc::channel::<()>();
        slot.try_spawn(move || {
            let _ = release_rx.recv();
        });

        assert!(!slot.wait(Duration::from_millis(20)).await);
        assert!(slot.is_active());

        drop(release_tx);
        assert!(slot.wait(Duration::from_secs(5)).await);
        assert!(!slot.is_active());
    }

    #[tokio::test]
    async fn waiting_on_idle_slot_is_immediate() {
        let mut slot = WorkerSlot::new("idle");
        assert!(slot.wait(Duration::from_millis(1)).await);
        assert_eq!(slot.state(), WorkerState::Idle);
    }
}
