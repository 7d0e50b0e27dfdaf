//! # Unit of Work
//!
//! All-or-nothing application of a group of mutations.
//!
//! A unit of work starts from a clone of the committed store, collects the
//! events produced by each step, and only replaces the committed store when
//! every step succeeded. Dropping the unit of work (or returning an error
//! from [`transact`]) discards both the working copy and its events.
//!
//! ```text
//! committed ──clone──► working ──step──► working' ──step──► working''
//!     ▲                                                       │
//!     └──────────────── commit (swap) ◄───── Ok ──────────────┘
//!                                      Err ──► dropped, committed untouched
//! ```
//!
//! [`apply`] is the cheap variant for a single domain call that validates
//! everything before it mutates. It works on the committed store directly
//! through a [`Step`] and takes no snapshot, so the store need not be `Clone`.

/// Working copy of a store plus the events it will publish on commit.
#[derive(Debug)]
pub struct UnitOfWork<S, E> {
    working: S,
    events: Vec<E>,
}

impl<S: Clone, E> UnitOfWork<S, E> {
    /// Begins a unit of work from the committed store.
    #[must_use]
    pub fn begin(committed: &S) -> Self {
        Self {
            working: committed.clone(),
            events: Vec::new(),
        }
    }

    /// Read access to the working copy.
    #[must_use]
    pub fn state(&self) -> &S {
        &self.working
    }

    /// Write access to the working copy.
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.working
    }

    /// Records an event to publish once committed.
    pub fn emit(&mut self, event: E) {
        self.events.push(event);
    }

    /// Events recorded so far.
    #[must_use]
    pub fn events(&self) -> &[E] {
        &self.events
    }

    /// Replaces `target` with the working copy and returns the events.
    pub fn commit(self, target: &mut S) -> Vec<E> {
        *target = self.working;
        self.events
    }
}

/// Runs `f` inside a unit of work over `committed`.
///
/// On `Ok` the working copy replaces `committed` and the collected events are
/// returned alongside the value. On `Err` nothing changes.
///
/// # Errors
///
/// Returns whatever error `f` returns; `committed` is left untouched.
pub fn transact<S, E, T, Err>(
    committed: &mut S,
    f: impl FnOnce(&mut UnitOfWork<S, E>) -> Result<T, Err>,
) -> Result<(T, Vec<E>), Err>
where
    S: Clone,
{
    let mut uow = UnitOfWork::begin(committed);
    let value = f(&mut uow)?;
    let events = uow.commit(committed);
    Ok((value, events))
}

/// One in-place mutation of a committed store plus the events it produced.
#[derive(Debug)]
pub struct Step<'a, S, E> {
    state: &'a mut S,
    events: Vec<E>,
}

impl<S, E> Step<'_, S, E> {
    /// Read access to the store.
    #[must_use]
    pub fn state(&self) -> &S {
        &*self.state
    }

    /// Write access to the store. Any error returned after this point must
    /// come from a call that failed before changing anything.
    pub fn state_mut(&mut self) -> &mut S {
        &mut *self.state
    }

    /// Records an event to publish once the step succeeds.
    pub fn emit(&mut self, event: E) {
        self.events.push(event);
    }
}

/// Runs `f` directly against `committed`.
///
/// Events are returned only on `Ok`. Unlike [`transact`] there is no
/// rollback, so `f` must fail only before its first mutation.
///
/// # Errors
///
/// Returns whatever error `f` returns.
pub fn apply<S, E, T, Err>(
    committed: &mut S,
    f: impl FnOnce(&mut Step<'_, S, E>) -> Result<T, Err>,
) -> Result<(T, Vec<E>), Err> {
    let mut step = Step {
        state: committed,
        events: Vec::new(),
    };
    let value = f(&mut step)?;
    Ok((value, step.events))
}
