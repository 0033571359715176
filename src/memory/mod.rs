use bumpalo::Bump;
use log::debug;

static LOGGING_TARGET: &str = "plparam::memory";

/// An allocation scope. Everything allocated through it lives exactly as long
/// as the context and is released in one go when the context is dropped or
/// reset, so borrowed results can never outlive it:
///
/// ```compile_fail
/// use plparam::memory::MemoryContext;
///
/// let mut ctx = MemoryContext::new("scratch");
/// let s = ctx.alloc_str("hello");
/// ctx.reset();
/// println!("{}", s);
/// ```
///
/// Allocation failure aborts the process, there is no local recovery.
pub struct MemoryContext {
    name: String,
    arena: Bump,
}

impl MemoryContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arena: Bump::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alloc_str(&self, s: &str) -> &str {
        self.arena.alloc_str(s)
    }

    /// Bytes reserved by the arena, including unused chunk capacity.
    pub fn allocated_bytes(&self) -> usize {
        self.arena.allocated_bytes()
    }

    /// Release every allocation at once and keep the context for reuse.
    pub fn reset(&mut self) {
        debug!(
            target: LOGGING_TARGET,
            "reset memory context {}: {} bytes released",
            self.name,
            self.arena.allocated_bytes()
        );
        self.arena.reset();
    }

    pub(crate) fn arena(&self) -> &Bump {
        &self.arena
    }
}

impl std::fmt::Debug for MemoryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryContext")
            .field("name", &self.name)
            .field("allocated_bytes", &self.arena.allocated_bytes())
            .finish()
    }
}

impl Drop for MemoryContext {
    fn drop(&mut self) {
        debug!(
            target: LOGGING_TARGET,
            "drop memory context {}: {} bytes released",
            self.name,
            self.arena.allocated_bytes()
        );
    }
}
