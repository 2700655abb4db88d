//! Callback registry
//!
//! An ordered, concurrently editable collection of (event mask, handler)
//! subscriptions. Dispatch order is insertion order. A handler may be
//! registered multiple times with different masks; each registration is
//! tracked on its own, but removal subtracts event bits from every
//! subscription matching the handler's identity.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cec_protocol::{CecEvent, EventSet};

use crate::error::{CecError, DispatchError, HandlerError};

/// Result type subscriber callables return
pub type HandlerResult = Result<(), HandlerError>;

type HandlerFn = dyn Fn(&CecEvent) -> HandlerResult + Send + Sync;

/// A subscriber callable
///
/// Either a plain callable or a receiver/method pair; for the latter the
/// receiver is passed as the implicit first argument at call time and
/// kept alive for the registered lifetime. Cloning preserves identity:
/// the clone removes what the original registered. Two
/// [`bound`](Handler::bound) values over the same receiver and method
/// also share identity.
#[derive(Clone)]
pub struct Handler {
    kind: HandlerKind,
}

#[derive(Clone)]
enum HandlerKind {
    Plain(Arc<HandlerFn>),
    Bound {
        // the stored closure prepends the receiver as the first argument
        call: Arc<HandlerFn>,
        receiver: usize,
        method: usize,
    },
}

impl Handler {
    /// Wrap a free function or closure
    pub fn from_fn(f: impl Fn(&CecEvent) -> HandlerResult + Send + Sync + 'static) -> Self {
        Handler {
            kind: HandlerKind::Plain(Arc::new(f)),
        }
    }

    /// Bind `method` to `receiver`
    ///
    /// At dispatch the receiver rides along as the method's first
    /// argument. The subscription holds a strong reference to the
    /// receiver until it is removed.
    pub fn bound<R>(receiver: Arc<R>, method: fn(&R, &CecEvent) -> HandlerResult) -> Self
    where
        R: Send + Sync + 'static,
    {
        let receiver_id = Arc::as_ptr(&receiver) as usize;
        let method_id = method as usize;
        let call = move |event: &CecEvent| method(receiver.as_ref(), event);
        Handler {
            kind: HandlerKind::Bound {
                call: Arc::new(call),
                receiver: receiver_id,
                method: method_id,
            },
        }
    }

    /// Invoke the callable, containing panics at this boundary
    pub(crate) fn invoke(&self, event: &CecEvent) -> Result<(), DispatchError> {
        let call: &HandlerFn = match &self.kind {
            HandlerKind::Plain(f) => f.as_ref(),
            HandlerKind::Bound { call, .. } => call.as_ref(),
        };
        match catch_unwind(AssertUnwindSafe(|| call(event))) {
            Ok(result) => result.map_err(DispatchError::Handler),
            Err(_) => Err(DispatchError::HandlerPanicked),
        }
    }

    fn same_identity(&self, other: &Handler) -> bool {
        match (&self.kind, &other.kind) {
            (HandlerKind::Plain(a), HandlerKind::Plain(b)) => Arc::ptr_eq(a, b),
            (
                HandlerKind::Bound {
                    receiver: ra,
                    method: ma,
                    ..
                },
                HandlerKind::Bound {
                    receiver: rb,
                    method: mb,
                    ..
                },
            ) => ra == rb && ma == mb,
            _ => false,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            HandlerKind::Plain(call) => f
                .debug_tuple("Handler::Plain")
                .field(&Arc::as_ptr(call))
                .finish(),
            HandlerKind::Bound {
                receiver, method, ..
            } => f
                .debug_struct("Handler::Bound")
                .field("receiver", &(*receiver as *const ()))
                .field("method", &(*method as *const ()))
                .finish(),
        }
    }
}

struct Subscription {
    mask: EventSet,
    handler: Handler,
}

/// Ordered multi-subscriber registry
///
/// Mutation and dispatch may run from different threads: writers
/// serialize against each other, and dispatch snapshots the matching
/// handlers under the read lock so an add or remove landing mid-pass
/// never corrupts iteration.
#[derive(Default)]
pub struct CallbackRegistry {
    subscriptions: RwLock<Vec<Subscription>>,
}

impl CallbackRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subscription
    ///
    /// Masks with bits outside [`EventSet::VALID`] are rejected and the
    /// registry is left unchanged.
    pub fn add(&self, mask: EventSet, handler: Handler) -> Result<(), CecError> {
        if mask.bits() & !EventSet::VALID.bits() != 0 {
            return Err(CecError::InvalidEventMask { bits: mask.bits() });
        }
        self.write().push(Subscription { mask, handler });
        Ok(())
    }

    /// Clear `mask` bits from every subscription whose handler matches
    /// `handler` by identity
    ///
    /// Subscriptions whose mask empties are dropped, releasing their
    /// handler reference. A handler that was never registered is a no-op.
    pub fn remove(&self, handler: &Handler, mask: EventSet) {
        self.write().retain_mut(|sub| {
            if sub.handler.same_identity(handler) {
                sub.mask &= !mask;
                !sub.mask.is_empty()
            } else {
                true
            }
        });
    }

    /// Snapshot the handlers subscribed to any bit of `kind`, in
    /// registration order
    pub fn matching(&self, kind: EventSet) -> Vec<Handler> {
        self.read()
            .iter()
            .filter(|sub| sub.mask.intersects(kind))
            .map(|sub| sub.handler.clone())
            .collect()
    }

    /// Number of live subscriptions
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the registry has no subscriptions
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Subscription>> {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Subscription>> {
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
