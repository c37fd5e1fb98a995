/// Management operations that must not overlap each other or a live reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Import,
    Edit,
    Delete,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

/// Single-slot "operation in progress" token.
///
/// Shared by the management flows and the live-reload consumer: a reload
/// arriving while the slot is taken is skipped.
#[derive(Debug, Default)]
pub struct BusySlot {
    current: Option<Operation>,
}

impl BusySlot {
    /// Takes the slot, or reports what already holds it.
    pub fn try_acquire(&mut self, op: Operation) -> Result<(), Operation> {
        match self.current {
            Some(held) => Err(held),
            None => {
                self.current = Some(op);
                Ok(())
            }
        }
    }

    pub fn release(&mut self, op: Operation) {
        if self.current == Some(op) {
            self.current = None;
        } else {
            tracing::warn!(
                ?op,
                held = ?self.current,
                "release of an operation that does not hold the slot"
            );
        }
    }

    pub fn current(&self) -> Option<Operation> {
        self.current
    }

    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }
}
