use headscale_dns::Ticker;
use tokio::sync::{mpsc, oneshot};

/// A [`Ticker`] that only ticks when the test asks for a pass.
///
/// Dropping the paired [`PassTrigger`] ends the sync loop.
pub struct ManualTicker {
    triggers: mpsc::UnboundedReceiver<oneshot::Sender<()>>,
    in_flight: Option<oneshot::Sender<()>>,
}

/// Requests passes from a [`ManualTicker`].
pub struct PassTrigger {
    triggers: mpsc::UnboundedSender<oneshot::Sender<()>>,
}

impl ManualTicker {
    pub fn new() -> (Self, PassTrigger) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                triggers: receiver,
                in_flight: None,
            },
            PassTrigger { triggers: sender },
        )
    }
}

impl PassTrigger {
    /// Run one pass and wait until it has finished, successfully or not.
    pub async fn pass(&self) {
        let (done, finished) = oneshot::channel();
        self.triggers
            .send(done)
            .expect("sync loop is no longer running");
        // An error means the loop stopped during the pass.
        let _ = finished.await;
    }
}

#[async_trait::async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) -> bool {
        // Asked for the next tick: the previous pass is over.
        if let Some(done) = self.in_flight.take() {
            let _ = done.send(());
        }

        match self.triggers.recv().await {
            Some(done) => {
                self.in_flight = Some(done);
                true
            }
            None => false,
        }
    }
}

/// A [`Ticker`] that ticks immediately a fixed number of times.
pub struct CountingTicker {
    remaining: usize,
}

impl CountingTicker {
    pub fn new(ticks: usize) -> Self {
        Self { remaining: ticks }
    }
}

#[async_trait::async_trait]
impl Ticker for CountingTicker {
    async fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}
