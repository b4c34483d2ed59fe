use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::trace;

use crate::HolderError;

/// A transition of an instance's authoritative view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeNotification<T> {
    /// The instance gained its first copy.
    Add(T),
    /// The snapshot moved to another source or its data changed.
    Modify(T),
    /// The last copy was removed. Carries the last authoritative data.
    Delete(T),
}

impl <T> ChangeNotification<T> {

    pub fn data(&self) -> &T {
        match *self {
            ChangeNotification::Add(ref data)
            | ChangeNotification::Modify(ref data)
            | ChangeNotification::Delete(ref data) => data,
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(*self, ChangeNotification::Delete(_))
    }
}

/// Receives the notifications emitted by holders.
///
/// `publish` is called with the holder's lock held, once per transition and
/// in transition order. Implementations must not block on delivery.
pub trait NotificationSink<T> {
    fn publish(&self, notification: ChangeNotification<T>);
}

impl <T, S> NotificationSink<T> for Arc<S> where S: NotificationSink<T> + ?Sized {
    fn publish(&self, notification: ChangeNotification<T>) {
        (**self).publish(notification)
    }
}

impl <T, S> NotificationSink<T> for &S where S: NotificationSink<T> + ?Sized {
    fn publish(&self, notification: ChangeNotification<T>) {
        (**self).publish(notification)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Notifications retained per subscriber before the oldest are dropped.
    pub capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> ChannelConfig {
        ChannelConfig { capacity: 1024 }
    }
}

/// A multicast notification sink.
///
/// Every subscriber sees notifications in publish order. Publishing never
/// waits for subscribers: a subscriber that falls more than `capacity`
/// notifications behind loses the oldest ones and observes
/// [`broadcast::error::RecvError::Lagged`].
#[derive(Debug)]
pub struct NotificationChannel<T> {
    sender: broadcast::Sender<ChangeNotification<T>>,
}

impl <T> NotificationChannel<T> where T: Clone {

    /// Create a channel with the provided configuration.
    ///
    /// ##### Example
    ///
    /// ```
    /// use instance_holder::{ChangeNotification, ChannelConfig, NotificationChannel, NotificationSink};
    ///
    /// let channel = NotificationChannel::new(ChannelConfig::default()).unwrap();
    /// let mut subscriber = channel.subscribe();
    ///
    /// channel.publish(ChangeNotification::Add("up"));
    /// assert_eq!(ChangeNotification::Add("up"), subscriber.try_recv().unwrap());
    /// ```
    pub fn new(config: ChannelConfig) -> Result<NotificationChannel<T>, HolderError> {
        if config.capacity == 0 {
            return Err(HolderError::InvalidInput {
                reason: "notification channel capacity must be > 0".to_string(),
            });
        }
        let (sender, _) = broadcast::channel(config.capacity);
        Ok(NotificationChannel { sender })
    }

    /// Subscribe to notifications published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeNotification<T>> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl <T> NotificationSink<T> for NotificationChannel<T> where T: Clone {
    fn publish(&self, notification: ChangeNotification<T>) {
        if self.sender.send(notification).is_err() {
            trace!("notification published with no subscribers");
        }
    }
}

#[cfg(test)]
mod test {

    use tokio::sync::broadcast::error::TryRecvError;

    use super::{ChangeNotification, ChannelConfig, NotificationChannel, NotificationSink};
    use crate::HolderError;

    #[test]
    fn check_zero_capacity_is_rejected() {
        let result = NotificationChannel::<u8>::new(ChannelConfig { capacity: 0 });
        assert!(matches!(result, Err(HolderError::InvalidInput { .. })));
    }

    #[test]
    fn check_publish_without_subscribers() {
        let channel = NotificationChannel::new(ChannelConfig::default()).unwrap();
        assert_eq!(0, channel.subscriber_count());
        channel.publish(ChangeNotification::Add(1u8));
    }

    #[test]
    fn check_multicast_order() {
        let channel = NotificationChannel::new(ChannelConfig::default()).unwrap();
        let mut first = channel.subscribe();
        let mut second = channel.subscribe();

        channel.publish(ChangeNotification::Add(1u8));
        channel.publish(ChangeNotification::Modify(2));
        channel.publish(ChangeNotification::Delete(2));

        for subscriber in [&mut first, &mut second] {
            assert_eq!(Ok(ChangeNotification::Add(1)), subscriber.try_recv());
            assert_eq!(Ok(ChangeNotification::Modify(2)), subscriber.try_recv());
            assert_eq!(Ok(ChangeNotification::Delete(2)), subscriber.try_recv());
            assert_eq!(Err(TryRecvError::Empty), subscriber.try_recv());
        }
    }

    #[test]
    fn check_lagging_subscriber_drops_oldest() {
        let channel = NotificationChannel::new(ChannelConfig { capacity: 2 }).unwrap();
        let mut subscriber = channel.subscribe();

        channel.publish(ChangeNotification::Add(1u8));
        channel.publish(ChangeNotification::Modify(2));
        channel.publish(ChangeNotification::Modify(3));

        assert_eq!(Err(TryRecvError::Lagged(1)), subscriber.try_recv());
        assert_eq!(Ok(ChangeNotification::Modify(2)), subscriber.try_recv());
        assert_eq!(Ok(ChangeNotification::Modify(3)), subscriber.try_recv());
    }

    #[test]
    fn check_notification_data() {
        assert_eq!(&7, ChangeNotification::Delete(7u8).data());
        assert!(ChangeNotification::Delete(7u8).is_delete());
        assert!(!ChangeNotification::Modify(7u8).is_delete());
    }
}
