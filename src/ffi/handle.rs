//! Opaque handle registry and validator.
//!
//! An opaque reference crossing a memory-unsafe boundary carries no type or
//! lifetime information, so the registry closes the three realistic misuse
//! classes — use-after-free, double-free, type confusion — without any
//! cooperation from the caller's runtime.
//!
//! Handles are `u64` tokens, never raw addresses: a tag byte (corruption
//! check), a 24-bit generation (liveness check), and a 32-bit slot index.
//! Slots hold `Arc`s, so an operation that validated its token keeps its
//! target alive even if another thread destroys the handle mid-call; the
//! token itself goes stale the moment the slot's generation is bumped.
//!
//! The registry lock is independent of every client's callback lock:
//! validating one handle is never blocked by another object's streaming I/O.

use crate::client::{LiveClient, PullClient};
use crate::error::HandleError;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

const TOKEN_TAG: u64 = 0xB7;
const TAG_SHIFT: u32 = 56;
const GEN_SHIFT: u32 = 32;
const GEN_MASK: u64 = 0x00FF_FFFF;
const INDEX_MASK: u64 = 0xFFFF_FFFF;

/// Kind tag distinguishing wrapper types behind one token namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum HandleKind {
    Live = 1,
    Pull = 2,
}

/// A registered wrapper object.
pub enum HandleObject {
    Live(Arc<LiveClient>),
    Pull(Arc<PullClient>),
}

impl HandleObject {
    pub fn kind(&self) -> HandleKind {
        match self {
            HandleObject::Live(_) => HandleKind::Live,
            HandleObject::Pull(_) => HandleKind::Pull,
        }
    }
}

impl std::fmt::Debug for HandleObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandleObject::Live(client) => f.debug_tuple("Live").field(client).finish(),
            HandleObject::Pull(client) => f.debug_tuple("Pull").field(client).finish(),
        }
    }
}

struct SlotEntry {
    kind: HandleKind,
    /// `None` while a destroy is in progress: the slot is still live (the
    /// generation matches) but the target has been taken.
    object: Option<HandleObject>,
}

struct Slot {
    generation: u32,
    entry: Option<SlotEntry>,
}

struct RegistryInner {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

/// Process-wide set of live handles, one lock.
pub struct HandleRegistry {
    inner: Mutex<RegistryInner>,
}

static GLOBAL: OnceLock<HandleRegistry> = OnceLock::new();

fn pack(generation: u32, index: u32) -> u64 {
    (TOKEN_TAG << TAG_SHIFT) | ((generation as u64 & GEN_MASK) << GEN_SHIFT) | index as u64
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                slots: Vec::new(),
                free: Vec::new(),
            }),
        }
    }

    /// The registry every FFI entry point validates against.
    pub fn global() -> &'static HandleRegistry {
        GLOBAL.get_or_init(HandleRegistry::new)
    }

    /// Register an object and mint its token. Tokens are never zero.
    pub fn register(&self, object: HandleObject) -> u64 {
        let kind = object.kind();
        let mut inner = self.inner.lock();
        let index = match inner.free.pop() {
            Some(index) => index,
            None => {
                inner.slots.push(Slot {
                    generation: 1,
                    entry: None,
                });
                (inner.slots.len() - 1) as u32
            }
        };
        let slot = &mut inner.slots[index as usize];
        slot.entry = Some(SlotEntry {
            kind,
            object: Some(object),
        });
        pack(slot.generation, index)
    }

    /// Validate a token and clone out its target.
    ///
    /// Checks run in order and short-circuit: non-null token, tag byte,
    /// registered (bounds, generation, occupancy), kind, target present.
    pub fn resolve(&self, token: u64, expected: HandleKind) -> Result<HandleObject, HandleError> {
        if token == 0 {
            return Err(HandleError::Null);
        }
        let generation = (token >> GEN_SHIFT) & GEN_MASK;
        if (token >> TAG_SHIFT) != TOKEN_TAG || generation == 0 {
            return Err(HandleError::BadToken);
        }
        let index = (token & INDEX_MASK) as usize;

        let inner = self.inner.lock();
        let slot = inner.slots.get(index).ok_or(HandleError::NotRegistered)?;
        if slot.generation as u64 != generation {
            return Err(HandleError::NotRegistered);
        }
        let entry = slot.entry.as_ref().ok_or(HandleError::NotRegistered)?;
        if entry.kind != expected {
            return Err(HandleError::WrongKind);
        }
        match &entry.object {
            Some(HandleObject::Live(client)) => Ok(HandleObject::Live(Arc::clone(client))),
            Some(HandleObject::Pull(client)) => Ok(HandleObject::Pull(Arc::clone(client))),
            None => Err(HandleError::Detached),
        }
    }

    pub fn resolve_live(&self, token: u64) -> Result<Arc<LiveClient>, HandleError> {
        match self.resolve(token, HandleKind::Live)? {
            HandleObject::Live(client) => Ok(client),
            // resolve() already checked the kind tag.
            HandleObject::Pull(_) => Err(HandleError::WrongKind),
        }
    }

    pub fn resolve_pull(&self, token: u64) -> Result<Arc<PullClient>, HandleError> {
        match self.resolve(token, HandleKind::Pull)? {
            HandleObject::Pull(client) => Ok(client),
            HandleObject::Live(_) => Err(HandleError::WrongKind),
        }
    }

    /// First half of destroy: take the target out of a live slot. Later
    /// validations of the same token report `Detached` until [`Self::remove`]
    /// retires the slot.
    pub fn detach(&self, token: u64, expected: HandleKind) -> Result<HandleObject, HandleError> {
        if token == 0 {
            return Err(HandleError::Null);
        }
        let generation = (token >> GEN_SHIFT) & GEN_MASK;
        if (token >> TAG_SHIFT) != TOKEN_TAG || generation == 0 {
            return Err(HandleError::BadToken);
        }
        let index = (token & INDEX_MASK) as usize;

        let mut inner = self.inner.lock();
        let slot = inner
            .slots
            .get_mut(index)
            .ok_or(HandleError::NotRegistered)?;
        if slot.generation as u64 != generation {
            return Err(HandleError::NotRegistered);
        }
        let entry = slot.entry.as_mut().ok_or(HandleError::NotRegistered)?;
        if entry.kind != expected {
            return Err(HandleError::WrongKind);
        }
        entry.object.take().ok_or(HandleError::Detached)
    }

    /// Second half of destroy: vacate the slot and bump its generation so
    /// every future validation of the token reports `NotRegistered`.
    /// Idempotent; removing an unknown or already-removed token is a no-op.
    pub fn remove(&self, token: u64) {
        if token == 0 || (token >> TAG_SHIFT) != TOKEN_TAG {
            return;
        }
        let generation = (token >> GEN_SHIFT) & GEN_MASK;
        let index = (token & INDEX_MASK) as usize;

        let mut inner = self.inner.lock();
        let Some(slot) = inner.slots.get_mut(index) else {
            return;
        };
        if slot.generation as u64 != generation || slot.entry.is_none() {
            return;
        }
        slot.entry = None;
        // Generation 0 is reserved for never-issued tokens.
        slot.generation = if slot.generation as u64 >= GEN_MASK {
            1
        } else {
            slot.generation + 1
        };
        inner.free.push(index as u32);
    }

    /// Number of currently registered handles, for diagnostics.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .slots
            .iter()
            .filter(|s| s.entry.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
