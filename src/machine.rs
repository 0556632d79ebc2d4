//! Run-to-completion actor kernel.
//!
//! Each actor owns one FIFO mailbox and one current-state slot, and
//! processes events strictly one at a time on its own task. Entering a
//! state runs its entry action to a fixpoint, since an entry action may
//! itself transition. A final state stops the task and closes the mailbox
//! for good.
//!
//! Cross-actor communication goes through [`Mailbox::post`], which always
//! enqueues. An actor's own logic holds `&mut Machine` and calls
//! [`Machine::feed`] instead, which applies the event in place: a
//! self-addressed event never waits behind the actor's own busy mailbox,
//! so self-calls cannot deadlock. Only the actor's own entry and
//! transition code can ever reach its `Machine`, which is what keeps the
//! shortcut sound.

use std::fmt;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Behavior of one actor: plain-data states plus the logic that moves
/// between them. Entry actions and transitions receive the running
/// [`Machine`] so they can reach the actor's resources and feed
/// themselves follow-up events inline.
#[async_trait::async_trait]
pub trait Actor: Send + Sized + 'static {
    type Event: Send + fmt::Debug + 'static;
    type State: Clone + PartialEq + Send + fmt::Debug + 'static;

    /// State the machine settles into right after start.
    fn initial(&self) -> Self::State;

    /// True for states that end processing permanently.
    fn is_final(state: &Self::State) -> bool;

    /// Entry action. Returning a different state is a transition in its
    /// own right; entry actions are reapplied until the state stops
    /// changing, where "changing" is decided by `PartialEq`, never by
    /// instance identity.
    async fn enter(machine: &mut Machine<Self>, state: Self::State) -> Self::State {
        let _ = machine;
        state
    }

    /// Transition function, applied to every delivered event.
    async fn next(
        machine: &mut Machine<Self>,
        state: Self::State,
        event: Self::Event,
    ) -> Self::State;
}

/// Cloneable posting handle to one actor's event queue.
///
/// A mailbox is created detached and comes alive when a machine starts on
/// it. Posting before that is a wiring error and panics; posting after
/// the actor reached a final state is routine and drops the event with a
/// debug line.
pub struct Mailbox<E> {
    inner: Arc<Inner<E>>,
}

struct Inner<E> {
    seq: u64,
    tx: OnceLock<UnboundedSender<E>>,
}

impl<E> Mailbox<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                seq: SEQUENCE.fetch_add(1, Ordering::Relaxed),
                tx: OnceLock::new(),
            }),
        }
    }

    /// Enqueues an event for the actor behind this mailbox.
    ///
    /// # Panics
    /// If no machine was ever started on this mailbox.
    pub fn post(&self, event: E) {
        let tx = self
            .inner
            .tx
            .get()
            .unwrap_or_else(|| panic!("[machine {}] posted before start", self.inner.seq));
        if tx.send(event).is_err() {
            log::debug!("[machine {}] closed, event dropped", self.inner.seq);
        }
    }

    /// False both before a machine starts on this mailbox and after the
    /// actor behind it stops.
    pub fn is_open(&self) -> bool {
        self.inner
            .tx
            .get()
            .map(|tx| !tx.is_closed())
            .unwrap_or(false)
    }

    fn bind(&self, tx: UnboundedSender<E>) {
        if self.inner.tx.set(tx).is_err() {
            panic!("[machine {}] started twice", self.inner.seq);
        }
    }

    fn seq(&self) -> u64 {
        self.inner.seq
    }
}

impl<E> Clone for Mailbox<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> Default for Mailbox<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Mailbox<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mailbox#{}", self.inner.seq)
    }
}

/// One running actor: its resources, its current state, and the latch
/// that makes final states sticky.
pub struct Machine<A: Actor> {
    pub actor: A,
    seq: u64,
    state: A::State,
    done: bool,
}

impl<A: Actor> Machine<A> {
    /// Binds the mailbox and spawns the actor's processing loop on the
    /// given runtime. The initial state settles before the first event
    /// is taken, so no event can observe a half-entered actor.
    ///
    /// # Panics
    /// If a machine was already started on this mailbox.
    pub fn start(actor: A, mailbox: &Mailbox<A::Event>, rt: &tokio::runtime::Handle) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        mailbox.bind(tx);
        let machine = Machine {
            seq: mailbox.seq(),
            state: actor.initial(),
            actor,
            done: false,
        };
        rt.spawn(machine.run(rx));
    }

    async fn run(mut self, mut rx: UnboundedReceiver<A::Event>) {
        log::debug!("[machine {}] starting in {:?}", self.seq, self.state);
        self.settle().await;
        while !self.done {
            match rx.recv().await {
                Some(event) => self.feed(event).await,
                None => break,
            }
        }
        log::debug!("[machine {}] stopped in {:?}", self.seq, self.state);
    }

    /// Applies one event to the current state, then settles whatever
    /// transition it produced. This is the reentrant path: actor logic
    /// that feeds its own machine has the event handled here and now,
    /// ahead of everything queued in the mailbox.
    pub async fn feed(&mut self, event: A::Event) {
        if self.done {
            log::debug!("[machine {}] {:?} after final state, dropped", self.seq, event);
            return;
        }
        log::debug!("[machine {}] {:?} in {:?}", self.seq, event, self.state);
        let state = self.state.clone();
        let state = A::next(self, state, event).await;
        // a nested feed may have reached a final state while this frame
        // was still running; its verdict wins over our stale result
        if self.done {
            return;
        }
        if state != self.state {
            self.state = state;
            self.settle().await;
        }
    }

    /// Runs entry actions until the state stops changing, then latches
    /// `done` if the settled state is final.
    async fn settle(&mut self) {
        loop {
            let prev = self.state.clone();
            let state = A::enter(self, prev.clone()).await;
            if self.done {
                return;
            }
            if state == prev {
                break;
            }
            log::debug!("[machine {}] {:?} -> {:?}", self.seq, prev, state);
            self.state = state;
        }
        if A::is_final(&self.state) {
            self.done = true;
            log::debug!("[machine {}] settled final in {:?}", self.seq, self.state);
        }
    }
}
