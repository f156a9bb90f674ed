use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sentiment_core::{CacheEntry, SentimentError, SentimentResult, Symbol};
use std::sync::Arc;
use tokio::sync::watch;

pub(crate) type Outcome = SentimentResult<Arc<CacheEntry>>;

/// `None` while the cycle runs, then the published outcome.
type FlightState = Option<Outcome>;

/// One running cycle per symbol; later callers subscribe to its outcome.
pub(crate) struct InFlight {
    flights: DashMap<Symbol, watch::Receiver<FlightState>>,
}

pub(crate) enum Role<'a> {
    Leader(FlightGuard<'a>),
    Follower(watch::Receiver<FlightState>),
}

impl InFlight {
    pub fn new() -> Self {
        Self {
            flights: DashMap::new(),
        }
    }

    /// Become the leader for `symbol` or subscribe to the cycle already running.
    /// Registration happens under the map's shard lock, so two callers can
    /// never both lead the same symbol.
    pub fn join(&self, symbol: &Symbol) -> Role<'_> {
        match self.flights.entry(symbol.clone()) {
            Entry::Occupied(slot) => Role::Follower(slot.get().clone()),
            Entry::Vacant(slot) => {
                let (tx, rx) = watch::channel(None);
                slot.insert(rx);
                Role::Leader(FlightGuard {
                    registry: self,
                    symbol: symbol.clone(),
                    tx: Some(tx),
                })
            }
        }
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }
}

/// Held by the leader for the lifetime of its cycle.
///
/// Dropping the guard without calling [`FlightGuard::complete`] (the leader's
/// future was cancelled) releases the slot and wakes followers with
/// [`SentimentError::Cancelled`].
pub(crate) struct FlightGuard<'a> {
    registry: &'a InFlight,
    symbol: Symbol,
    tx: Option<watch::Sender<FlightState>>,
}

impl FlightGuard<'_> {
    pub fn complete(mut self, outcome: Outcome) {
        self.release(outcome);
    }

    fn release(&mut self, outcome: Outcome) {
        let Some(tx) = self.tx.take() else {
            return;
        };

        // Slot goes first: anyone arriving after this starts a new cycle
        // instead of subscribing to one that is already over.
        self.registry.flights.remove(&self.symbol);
        tx.send_replace(Some(outcome));
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.tx.is_some() {
            tracing::warn!("Cycle for {} abandoned before completion", self.symbol);
            self.release(Err(SentimentError::Cancelled));
        }
    }
}

/// Wait for the leader's outcome. A leader that vanished without publishing
/// reads as [`SentimentError::Cancelled`].
pub(crate) async fn follow(mut rx: watch::Receiver<FlightState>) -> Outcome {
    match rx.wait_for(Option::is_some).await {
        Ok(state) => state.clone().unwrap_or(Err(SentimentError::Cancelled)),
        Err(_) => Err(SentimentError::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sentiment_core::Sentiment;

    fn sym(s: &str) -> Symbol {
        Symbol::parse(s).unwrap()
    }

    fn done(symbol: &str) -> Outcome {
        Ok(Arc::new(CacheEntry::new(sym(symbol), Vec::new(), Sentiment::Neutral, Utc::now())))
    }

    #[tokio::test]
    async fn test_second_caller_follows() {
        let registry = InFlight::new();
        let leader = match registry.join(&sym("TCS")) {
            Role::Leader(guard) => guard,
            Role::Follower(_) => panic!("first caller must lead"),
        };
        let rx = match registry.join(&sym("TCS")) {
            Role::Follower(rx) => rx,
            Role::Leader(_) => panic!("second caller must follow"),
        };
        assert_eq!(registry.len(), 1);

        // Other symbols are independent
        assert!(matches!(registry.join(&sym("INFY")), Role::Leader(_)));

        leader.complete(done("TCS"));
        assert_eq!(registry.len(), 0);

        let outcome = follow(rx).await.unwrap();
        assert_eq!(outcome.symbol, sym("TCS"));
    }

    #[tokio::test]
    async fn test_dropped_leader_releases_followers() {
        let registry = InFlight::new();
        let leader = registry.join(&sym("TCS"));
        let rx = match registry.join(&sym("TCS")) {
            Role::Follower(rx) => rx,
            Role::Leader(_) => panic!("second caller must follow"),
        };

        drop(leader);

        assert_eq!(follow(rx).await, Err(SentimentError::Cancelled));
        assert_eq!(registry.len(), 0);
        assert!(matches!(registry.join(&sym("TCS")), Role::Leader(_)));
    }

    #[tokio::test]
    async fn test_failure_is_shared() {
        let registry = InFlight::new();
        let Role::Leader(leader) = registry.join(&sym("TCS")) else {
            panic!("first caller must lead");
        };
        let Role::Follower(rx) = registry.join(&sym("TCS")) else {
            panic!("second caller must follow");
        };

        let err = SentimentError::RateLimited("slow down".into());
        leader.complete(Err(err.clone()));
        assert_eq!(follow(rx).await, Err(err));
    }
}
