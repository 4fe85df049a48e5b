use tokio::sync::watch;
use tokio::sync::watch::error::SendError;

/// Sending half of the cancellation channel handed to reconciliation runs.
///
/// Cloning is cheap; all clones signal the same set of receivers.
#[derive(Debug, Clone)]
pub struct ShutdownTx(watch::Sender<()>);

impl ShutdownTx {
    /// Signals cancellation to every subscribed run.
    pub fn shutdown(&self) -> Result<(), SendError<()>> {
        self.0.send(())
    }

    /// Creates a new receiver watching this sender.
    pub fn subscribe(&self) -> ShutdownRx {
        self.0.subscribe()
    }
}

/// Receiving half polled between resources.
pub type ShutdownRx = watch::Receiver<()>;

/// Creates a connected cancellation channel pair.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = watch::channel(());
    (ShutdownTx(tx), rx)
}

/// Whether cancellation was signalled on `shutdown`.
///
/// A dropped sender can no longer signal anything, so it reads as not
/// cancelled.
pub fn is_cancelled(shutdown: &ShutdownRx) -> bool {
    shutdown.has_changed().unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_channel_is_not_cancelled() {
        let (_tx, rx) = create_shutdown_channel();
        assert!(!is_cancelled(&rx));
    }

    #[test]
    fn signalled_channel_reads_as_cancelled() {
        let (tx, rx) = create_shutdown_channel();
        tx.shutdown().unwrap();
        assert!(is_cancelled(&rx));
    }

    #[test]
    fn dropped_sender_reads_as_not_cancelled() {
        let (tx, rx) = create_shutdown_channel();
        drop(tx);
        assert!(!is_cancelled(&rx));
    }
}
