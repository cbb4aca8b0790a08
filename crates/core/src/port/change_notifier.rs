// Change Notifier Port (Interface)

use crate::domain::QueueChangeEvent;

/// Fire-and-forget publication of queue changes
///
/// Implementations must not block and must not fail the caller: delivery is
/// best-effort.
pub trait ChangeNotifier: Send + Sync {
    fn publish(&self, event: QueueChangeEvent);
}
