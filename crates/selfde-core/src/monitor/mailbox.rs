//! Single-slot handoff from the listener thread to the controller.
//!
//! The mailbox holds at most one undelivered value. A second delivery blocks
//! until the controller has taken the first, so exceptions are never queued
//! behind each other and never overwritten.

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};

use crate::error::{SelfdeError, SelfdeResult};

/// Listener side of the mailbox.
#[derive(Debug)]
pub struct MailboxSender<T>
{
    slot: SyncSender<T>,
}

/// Controller side of the mailbox.
#[derive(Debug)]
pub struct MailboxReceiver<T>
{
    slot: Receiver<T>,
}

/// Create an empty mailbox.
#[must_use]
pub fn channel<T>() -> (MailboxSender<T>, MailboxReceiver<T>)
{
    let (sender, receiver) = mpsc::sync_channel(1);
    (MailboxSender { slot: sender }, MailboxReceiver { slot: receiver })
}

impl<T> MailboxSender<T>
{
    /// Place `value` in the mailbox, waiting while it is full.
    ///
    /// ## Errors
    ///
    /// Gives `value` back if the receiver has been dropped.
    pub fn deliver(&self, value: T) -> Result<(), T>
    {
        self.slot.send(value).map_err(|mpsc::SendError(value)| value)
    }
}

impl<T> MailboxReceiver<T>
{
    /// Block until a value is present, then take it.
    ///
    /// ## Errors
    ///
    /// [`SelfdeError::MailboxClosed`] if the sender is gone and the slot is empty.
    pub fn wait(&self) -> SelfdeResult<T>
    {
        self.slot.recv().map_err(|_| SelfdeError::MailboxClosed)
    }

    /// Take the value if one is present.
    ///
    /// ## Errors
    ///
    /// [`SelfdeError::MailboxClosed`] if the sender is gone and the slot is empty.
    pub fn try_take(&self) -> SelfdeResult<Option<T>>
    {
        match self.slot.try_recv() {
            Ok(value) => Ok(Some(value)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(SelfdeError::MailboxClosed),
        }
    }
}

#[cfg(test)]
mod tests
{
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn second_delivery_waits_for_take()
    {
        let (sender, receiver) = channel();
        sender.deliver(1).unwrap();

        let handle = thread::spawn(move || {
            sender.deliver(2).unwrap();
        });
        thread::sleep(Duration::from_millis(20));
        assert_eq!(receiver.try_take().unwrap(), Some(1));

        handle.join().unwrap();
        assert_eq!(receiver.wait().unwrap(), 2);
        assert!(matches!(receiver.wait(), Err(SelfdeError::MailboxClosed)));
    }

    #[test]
    fn delivery_to_dropped_receiver_returns_value()
    {
        let (sender, receiver) = channel();
        drop(receiver);
        assert_eq!(sender.deliver("record"), Err("record"));
    }
}
