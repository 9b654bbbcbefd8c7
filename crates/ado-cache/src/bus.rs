//! Design note §9: "Replace multicast delegates with a typed bus exposing
//! `subscribe(handler) -> unsubscribe`." Strong-reference subscriptions with
//! an explicit lifetime (the returned `Subscription` itself) are what the
//! note says suffice — no weak-reference bookkeeping.

use tokio::sync::broadcast;

/// A typed, multi-subscriber event bus. `T` is cloned once per subscriber on
/// publish, so keep it small (the core's events are tagged enums, not
/// payload-bearing blobs).
pub struct EventBus<T: Clone + Send + 'static> {
  sender: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> EventBus<T> {
  pub fn new(capacity: usize) -> Self {
    let (sender, _) = broadcast::channel(capacity);
    Self { sender }
  }

  /// Returns a subscription handle; dropping it unsubscribes.
  pub fn subscribe(&self) -> Subscription<T> {
    Subscription { receiver: self.sender.subscribe() }
  }

  /// Best-effort: publishing with no subscribers is not an error — the UI
  /// may not be listening yet, and that must never fail a sync cycle.
  pub fn publish(&self, event: T) {
    let _ = self.sender.send(event);
  }
}

pub struct Subscription<T: Clone + Send + 'static> {
  receiver: broadcast::Receiver<T>,
}

impl<T: Clone + Send + 'static> Subscription<T> {
  pub async fn recv(&mut self) -> Option<T> {
    loop {
      match self.receiver.recv().await {
        Ok(event) => return Some(event),
        Err(broadcast::error::RecvError::Lagged(_)) => continue,
        Err(broadcast::error::RecvError::Closed) => return None,
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn subscriber_receives_published_event() {
    let bus: EventBus<u32> = EventBus::new(8);
    let mut sub = bus.subscribe();
    bus.publish(42);
    assert_eq!(sub.recv().await, Some(42));
  }

  #[tokio::test]
  async fn publish_with_no_subscribers_does_not_panic() {
    let bus: EventBus<u32> = EventBus::new(8);
    bus.publish(1);
  }

  #[tokio::test]
  async fn multiple_subscribers_each_see_the_event() {
    let bus: EventBus<&'static str> = EventBus::new(8);
    let mut a = bus.subscribe();
    let mut b = bus.subscribe();
    bus.publish("hello");
    assert_eq!(a.recv().await, Some("hello"));
    assert_eq!(b.recv().await, Some("hello"));
  }
}
