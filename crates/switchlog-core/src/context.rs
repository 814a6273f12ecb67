//! Scoped diagnostic context.
//!
//! Two kinds of ambient entries can be attached to log records:
//!
//! - **nested**: an ordered stack of messages ([`push_nested`])
//! - **mapped**: a key/value map ([`push_mapped`])
//!
//! Each push returns a [`ScopeToken`]; releasing or dropping the token undoes
//! exactly that push. Nested tokens must be released in reverse order of
//! acquisition. Out-of-order release is not detected.
//!
//! Storage follows the logical flow. Inside [`scope`], [`scope_fresh`] or
//! [`sync_scope`] entries live in a tokio task-local slot and survive `.await`
//! points on whichever worker thread resumes the task. Outside any flow scope,
//! a thread-local slot is used.
//!
//! A token only ever releases into the storage it was pushed to. Released on
//! another thread, or from inside a different flow scope, it does nothing.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

/// Snapshot of the nested and mapped entries visible to the current flow.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiagnosticContext {
    nested: Vec<String>,
    mapped: BTreeMap<String, String>,
}

impl DiagnosticContext {
    /// Nested messages, outermost first.
    pub fn nested(&self) -> &[String] {
        &self.nested
    }

    /// Mapped entries, sorted by key.
    pub fn mapped(&self) -> &BTreeMap<String, String> {
        &self.mapped
    }

    /// Value stored for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.mapped.get(key).map(String::as_str)
    }

    /// True when there are no entries of either kind.
    pub fn is_empty(&self) -> bool {
        self.nested.is_empty() && self.mapped.is_empty()
    }

    /// Nested messages joined with a space, if any.
    pub fn nested_text(&self) -> Option<String> {
        (!self.nested.is_empty()).then(|| self.nested.join(" "))
    }
}

tokio::task_local! {
    static FLOW_CONTEXT: FlowSlot;
}

thread_local! {
    static THREAD_CONTEXT: RefCell<DiagnosticContext> = RefCell::new(DiagnosticContext::default());
}

static NEXT_FLOW_ID: AtomicU64 = AtomicU64::new(1);

/// Context of one flow scope, tagged so tokens can tell scopes apart.
struct FlowSlot {
    id: u64,
    context: RefCell<DiagnosticContext>,
}

impl FlowSlot {
    fn new(context: DiagnosticContext) -> Self {
        Self {
            id: NEXT_FLOW_ID.fetch_add(1, Ordering::Relaxed),
            context: RefCell::new(context),
        }
    }
}

/// Where an entry was pushed. Tokens only release into the same storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Storage {
    Flow(u64),
    Thread(ThreadId),
}

fn current_storage() -> Storage {
    FLOW_CONTEXT
        .try_with(|slot| Storage::Flow(slot.id))
        .unwrap_or_else(|_| Storage::Thread(thread::current().id()))
}

/// Run `f` against the given storage.
///
/// Returns `None` when that storage is not reachable from here: the flow scope
/// has ended or is not the current one, or this is a different thread.
fn with_storage<R>(storage: Storage, f: impl FnOnce(&mut DiagnosticContext) -> R) -> Option<R> {
    match storage {
        Storage::Flow(id) => FLOW_CONTEXT
            .try_with(|slot| (slot.id == id).then(|| f(&mut slot.context.borrow_mut())))
            .ok()
            .flatten(),
        Storage::Thread(owner) if owner == thread::current().id() => THREAD_CONTEXT
            .try_with(|cell| f(&mut cell.borrow_mut()))
            .ok(),
        Storage::Thread(_) => None,
    }
}

fn read_current<R>(f: impl FnOnce(&DiagnosticContext) -> R) -> Option<R> {
    with_storage(current_storage(), |ctx| f(ctx))
}

/// Push a nested message onto the current flow's stack.
pub fn push_nested(message: impl Into<String>) -> ScopeToken {
    let message = message.into();
    let storage = current_storage();
    let Some(depth) = with_storage(storage, |ctx| {
        ctx.nested.push(message);
        ctx.nested.len()
    }) else {
        return ScopeToken::noop();
    };

    ScopeToken::new(move || {
        let _ = with_storage(storage, |ctx| {
            if ctx.nested.len() == depth {
                let _ = ctx.nested.pop();
            }
        });
    })
}

/// Set `key` to `value` in the current flow's map, remembering the old value.
pub fn push_mapped(key: impl Into<String>, value: impl Into<String>) -> ScopeToken {
    let key = key.into();
    let value = value.into();
    let storage = current_storage();
    let Some(previous) = with_storage(storage, |ctx| ctx.mapped.insert(key.clone(), value)) else {
        return ScopeToken::noop();
    };

    ScopeToken::new(move || {
        let _ = with_storage(storage, |ctx| match previous {
            Some(old) => {
                let _ = ctx.mapped.insert(key, old);
            }
            None => {
                let _ = ctx.mapped.remove(&key);
            }
        });
    })
}

/// Copy of the entries visible to the current flow.
pub fn snapshot() -> DiagnosticContext {
    read_current(DiagnosticContext::clone).unwrap_or_default()
}

/// Current value of a mapped entry.
pub fn mapped_value(key: &str) -> Option<String> {
    read_current(|ctx| ctx.get(key).map(str::to_owned)).flatten()
}

/// Current nested messages, outermost first.
pub fn nested_messages() -> Vec<String> {
    read_current(|ctx| ctx.nested.clone()).unwrap_or_default()
}

/// True when the caller is inside a flow scope.
pub fn in_flow_scope() -> bool {
    matches!(current_storage(), Storage::Flow(_))
}

/// Run `fut` in its own flow scope, starting from a copy of the caller's context.
///
/// The copy is taken when `scope` is called, so entries pushed by the caller
/// afterwards are not seen by `fut`, and nothing `fut` pushes leaks back.
pub fn scope<F: Future>(fut: F) -> impl Future<Output = F::Output> {
    FLOW_CONTEXT.scope(FlowSlot::new(snapshot()), fut)
}

/// Run `fut` in its own flow scope with an empty context.
pub fn scope_fresh<F: Future>(fut: F) -> impl Future<Output = F::Output> {
    FLOW_CONTEXT.scope(FlowSlot::new(DiagnosticContext::default()), fut)
}

/// Synchronous counterpart of [`scope`].
pub fn sync_scope<R>(f: impl FnOnce() -> R) -> R {
    FLOW_CONTEXT.sync_scope(FlowSlot::new(snapshot()), f)
}

/// Releases one context entry when consumed or dropped.
#[must_use = "dropping a scope token releases its context entry immediately"]
pub struct ScopeToken {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ScopeToken {
    /// A token whose release does nothing.
    pub fn noop() -> Self {
        Self { release: None }
    }

    /// A token that runs `release` exactly once.
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// True for tokens that have nothing to release.
    pub fn is_noop(&self) -> bool {
        self.release.is_none()
    }

    /// Release the entry now.
    pub fn release(mut self) {
        self.run_release();
    }

    fn run_release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for ScopeToken {
    fn drop(&mut self) {
        self.run_release();
    }
}

impl fmt::Debug for ScopeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeToken")
            .field("noop", &self.is_noop())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
