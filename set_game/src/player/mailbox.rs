//! Per-agent mailbox: slot clicks, claim notifications and control requests.
//!
//! Every queue is unbounded and every push wakes the owner, so nothing sent
//! to an agent can be lost while it is parked. Termination is a sticky flag
//! rather than a queued message and wins over everything else.

use parking_lot::{Condvar, Mutex};
use std::{collections::VecDeque, time::Instant};

use crate::game::entities::{Claim, Slot};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Control {
    Resume,
    Pause(u64),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum MailEvent {
    Terminate,
    Notification(Claim),
    Control(Control),
    Click(Slot),
}

#[derive(Debug, Default)]
struct Inbox {
    clicks: VecDeque<Slot>,
    notifications: VecDeque<Claim>,
    control: VecDeque<Control>,
    terminated: bool,
}

#[derive(Debug, Default)]
pub(crate) struct Mailbox {
    inbox: Mutex<Inbox>,
    signal: Condvar,
}

impl Mailbox {
    pub fn push_click(&self, slot: Slot) {
        self.inbox.lock().clicks.push_back(slot);
        self.signal.notify_all();
    }

    pub fn push_notification(&self, claim: Claim) {
        self.inbox.lock().notifications.push_back(claim);
        self.signal.notify_all();
    }

    pub fn push_control(&self, control: Control) {
        self.inbox.lock().control.push_back(control);
        self.signal.notify_all();
    }

    pub fn terminate(&self) {
        self.inbox.lock().terminated = true;
        self.signal.notify_all();
    }

    pub fn is_terminated(&self) -> bool {
        self.inbox.lock().terminated
    }

    pub fn clear_clicks(&self) {
        self.inbox.lock().clicks.clear();
    }

    pub fn pending_clicks(&self) -> usize {
        self.inbox.lock().clicks.len()
    }

    pub fn pending_notifications(&self) -> usize {
        self.inbox.lock().notifications.len()
    }

    /// Next event without blocking. Clicks are only handed out when
    /// `accept_clicks` is set; otherwise they stay queued.
    pub fn try_next(&self, accept_clicks: bool) -> Option<MailEvent> {
        Self::pop(&mut self.inbox.lock(), accept_clicks)
    }

    /// Block until an event is available or `deadline` passes.
    pub fn next(&self, accept_clicks: bool, deadline: Option<Instant>) -> Option<MailEvent> {
        let mut inbox = self.inbox.lock();
        loop {
            if let Some(event) = Self::pop(&mut inbox, accept_clicks) {
                return Some(event);
            }
            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return None;
                    }
                    self.signal.wait_until(&mut inbox, deadline);
                }
                None => self.signal.wait(&mut inbox),
            }
        }
    }

    /// Park until termination or `deadline`. Returns true once terminated.
    pub fn wait_terminated(&self, deadline: Instant) -> bool {
        let mut inbox = self.inbox.lock();
        while !inbox.terminated {
            if self.signal.wait_until(&mut inbox, deadline).timed_out() {
                break;
            }
        }
        inbox.terminated
    }

    fn pop(inbox: &mut Inbox, accept_clicks: bool) -> Option<MailEvent> {
        if inbox.terminated {
            return Some(MailEvent::Terminate);
        }
        if let Some(claim) = inbox.notifications.pop_front() {
            return Some(MailEvent::Notification(claim));
        }
        if let Some(control) = inbox.control.pop_front() {
            return Some(MailEvent::Control(control));
        }
        if accept_clicks {
            return inbox.clicks.pop_front().map(MailEvent::Click);
        }
        None
    }
}
