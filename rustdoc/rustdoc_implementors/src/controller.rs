//! The owner of the implementors registry for a trait page.
//!
//! Data loaders for a page run at an unpredictable time relative to the
//! readiness of the [`PageController`]. The controller exposes its
//! [`Registration`] capability only once it is [`Readiness::Ready`]: data
//! loaders that run earlier park their batch in the controller's pending queue,
//! which is drained when the controller initializes.
//!
//! The initialization sequence is:
//!
//! 1. Transition to [`Readiness::Ready`], installing the registration capability.
//! 2. Drain the pending batches, in arrival order, through the same merge
//!    operation used by ready-time loaders.
//! 3. Run the callbacks queued via [`PageController::on_ready`].
//!
//! No batch can be published between the transition and the drain.
use std::fmt::{Debug, Formatter};

use crate::registry::Registry;
use crate::types::ImplementorBatch;

/// The lifecycle of a [`PageController`].
///
/// `Uninitialized -> Ready` happens exactly once. `Ready` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Readiness {
    #[default]
    Uninitialized,
    Ready,
}

/// What to do with a batch published while the controller is not ready yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingPolicy {
    /// Queue every early batch and drain all of them on initialization.
    #[default]
    Accumulate,
    /// Keep a single pending slot: a later batch overwrites the one already parked.
    ///
    /// Every batch but the last one published before initialization is lost.
    LastWriteWins,
}

/// The state shared between a [`PageController`] and the data loaders of its page.
#[derive(Debug, Clone, Default)]
pub struct ImplementorContext {
    /// Batches published before the controller became ready, in arrival order.
    pub pending: Vec<ImplementorBatch>,
    pub registry: Registry,
}

/// The outcome of [`PageController::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initialization {
    /// The controller transitioned to [`Readiness::Ready`].
    Initialized {
        /// The number of pending batches merged into the registry.
        drained_batches: usize,
    },
    /// The controller was already ready. Nothing changed.
    AlreadyReady,
}

type OnReadyCallback = Box<dyn FnOnce(&Registry)>;
type RenderHook = Box<dyn FnMut(&ImplementorBatch, &Registry)>;

/// Owns the implementors [`Registry`] of a trait page and decides when
/// contributed batches become visible.
#[derive(Default)]
pub struct PageController {
    readiness: Readiness,
    policy: PendingPolicy,
    context: ImplementorContext,
    on_ready: Vec<OnReadyCallback>,
    render_hooks: Vec<RenderHook>,
}

impl PageController {
    pub fn new(policy: PendingPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    pub fn policy(&self) -> PendingPolicy {
        self.policy
    }

    pub fn registry(&self) -> &Registry {
        &self.context.registry
    }

    /// The batches waiting for the controller to become ready.
    pub fn pending(&self) -> &[ImplementorBatch] {
        &self.context.pending
    }

    pub fn context(&self) -> &ImplementorContext {
        &self.context
    }

    /// The registration capability.
    ///
    /// It is only available once the controller is [`Readiness::Ready`].
    pub fn registration(&mut self) -> Option<Registration<'_>> {
        match self.readiness {
            Readiness::Ready => Some(Registration { controller: self }),
            Readiness::Uninitialized => None,
        }
    }

    /// Transition to [`Readiness::Ready`], drain the pending batches and run the
    /// queued readiness callbacks.
    ///
    /// Only the first invocation has an effect.
    #[tracing::instrument(name = "Initialize page controller", skip_all, level = tracing::Level::DEBUG)]
    pub fn initialize(&mut self) -> Initialization {
        if self.is_ready() {
            tracing::debug!("The page controller is already ready");
            return Initialization::AlreadyReady;
        }
        self.readiness = Readiness::Ready;

        let pending = std::mem::take(&mut self.context.pending);
        let drained_batches = pending.len();
        for batch in pending {
            self.merge(batch);
        }
        tracing::debug!(drained_batches, "Drained pending implementor batches");

        for callback in std::mem::take(&mut self.on_ready) {
            callback(&self.context.registry);
        }
        Initialization::Initialized { drained_batches }
    }

    /// Run `callback` when the controller becomes ready.
    ///
    /// If the controller is already ready, `callback` runs immediately.
    pub fn on_ready<F>(&mut self, callback: F)
    where
        F: FnOnce(&Registry) + 'static,
    {
        match self.readiness {
            Readiness::Ready => callback(&self.context.registry),
            Readiness::Uninitialized => self.on_ready.push(Box::new(callback)),
        }
    }

    /// Register a callback that's notified every time new implementors are merged
    /// into the registry, e.g. to render them.
    pub fn add_render_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&ImplementorBatch, &Registry) + 'static,
    {
        self.render_hooks.push(Box::new(hook));
    }

    /// Store a batch that was published before the controller became ready.
    pub(crate) fn park(&mut self, batch: ImplementorBatch) {
        match self.policy {
            PendingPolicy::Accumulate => {
                self.context.pending.push(batch);
            }
            PendingPolicy::LastWriteWins => {
                if let Some(discarded) = self.context.pending.pop() {
                    tracing::warn!(
                        lost_subjects = ?discarded.subjects().collect::<Vec<_>>(),
                        "A pending implementor batch was overwritten before the page controller \
                        became ready. Its implementors will not be displayed."
                    );
                }
                self.context.pending.push(batch);
            }
        }
        tracing::trace!(
            pending_batches = self.context.pending.len(),
            "Parked an implementor batch"
        );
    }

    fn merge(&mut self, batch: ImplementorBatch) {
        if batch.is_empty() {
            return;
        }
        let outcome = self.context.registry.merge(batch.clone());
        tracing::trace!(
            inserted = outcome.inserted.len(),
            replaced = outcome.replaced.len(),
            "Merged an implementor batch"
        );
        for hook in &mut self.render_hooks {
            hook(&batch, &self.context.registry);
        }
    }
}

impl Debug for PageController {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageController")
            .field("readiness", &self.readiness)
            .field("policy", &self.policy)
            .field("context", &self.context)
            .field("on_ready", &self.on_ready.len())
            .field("render_hooks", &self.render_hooks.len())
            .finish()
    }
}

/// The capability to merge implementors into a ready [`PageController`].
///
/// Obtained via [`PageController::registration`].
pub struct Registration<'a> {
    controller: &'a mut PageController,
}

impl Registration<'_> {
    /// Merge `batch` into the registry, then notify the render hooks.
    ///
    /// Registering an empty batch does nothing.
    pub fn register_implementors(&mut self, batch: ImplementorBatch) {
        self.controller.merge(batch);
    }
}
