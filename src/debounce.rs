use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Turns a stream of input values into committed values once input has been quiet for
/// the full window. Only the latest pending value is kept.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Option<(String, Instant)>,
    last_committed: Option<String>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            last_committed: None,
        }
    }

    /// Records a keystroke, replacing any pending value and restarting the timer.
    pub fn input(&mut self, term: String, now: Instant) {
        self.pending = Some((term, now + self.window));
    }

    /// When the pending value becomes due, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, due)| *due)
    }

    /// Releases the pending value once its deadline has passed. A value equal to the
    /// previous commit is swallowed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, due)) if *due <= now => {}
            _ => return None,
        }
        let (term, _) = self.pending.take()?;
        if self.last_committed.as_deref() == Some(term.as_str()) {
            return None;
        }
        self.last_committed = Some(term.clone());
        Some(term)
    }

    /// Marks a value as already committed without waiting, used for the startup query.
    pub fn prime(&mut self, term: &str) {
        self.last_committed = Some(term.to_string());
    }
}

/// Drives a [`Debouncer`] from a keystroke channel. Returns the receiver of committed
/// terms, seeded with the current input value so the startup query runs immediately.
pub fn spawn_debouncer(
    window: Duration,
    mut input: watch::Receiver<String>,
) -> (watch::Receiver<String>, JoinHandle<()>) {
    let initial = input.borrow_and_update().clone();
    let (committed_tx, committed_rx) = watch::channel(initial.clone());

    let handle = tokio::spawn(async move {
        let mut debouncer = Debouncer::new(window);
        debouncer.prime(&initial);
        loop {
            let deadline = debouncer.deadline();
            tokio::select! {
                changed = input.changed() => {
                    if changed.is_err() {
                        debug!("Search input closed, stopping debouncer");
                        return;
                    }
                    let term = input.borrow_and_update().clone();
                    debouncer.input(term, Instant::now());
                }
                _ = sleep_until_opt(deadline) => {
                    if let Some(term) = debouncer.poll(Instant::now()) {
                        debug!(term = %term, "Committed search term");
                        if committed_tx.send(term).is_err() {
                            return;
                        }
                    }
                }
            }
        }
    });

    (committed_rx, handle)
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
