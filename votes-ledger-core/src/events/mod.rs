//! Post-commit vote notifications.
//!
//! The writer hands each `VoteEvent` to a single `VoteEventSink` synchronously,
//! after the store has committed the change. Delivery is fire-and-forget: a
//! sink cannot fail the write that produced the event.
use tokio::sync::mpsc;
use tracing::info;
use votes_ledger_shared::types::VoteEvent;

/// Receives ledger notifications.
pub trait VoteEventSink: Send + Sync {
    fn notify(&self, event: &VoteEvent);
}

/// Plain callbacks are sinks.
impl<F> VoteEventSink for F
where
    F: Fn(&VoteEvent) + Send + Sync,
{
    fn notify(&self, event: &VoteEvent) {
        self(event)
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl VoteEventSink for NoopSink {
    fn notify(&self, _event: &VoteEvent) {}
}

/// Writes one structured log line per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl VoteEventSink for TracingSink {
    fn notify(&self, event: &VoteEvent) {
        match event {
            VoteEvent::Voted { vote, is_update } => info!(
                voter = %vote.voter,
                votable = %vote.votable,
                direction = vote.direction.value(),
                is_update,
                "Voted"
            ),
            VoteEvent::VoteCancelled { voter, votable } => {
                info!(voter = %voter, votable = %votable, "Vote cancelled")
            }
        }
    }
}

/// Forwards events into an unbounded channel.
///
/// Events sent after the receiver is dropped are silently discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<VoteEvent>,
}

impl ChannelSink {
    /// Creates a sink together with the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<VoteEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn from_sender(sender: mpsc::UnboundedSender<VoteEvent>) -> Self {
        Self { sender }
    }
}

impl VoteEventSink for ChannelSink {
    fn notify(&self, event: &VoteEvent) {
        let _ = self.sender.send(event.clone());
    }
}
