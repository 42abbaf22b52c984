/// A slot that accepts a value once.
///
/// Later resolutions are rejected and leave the stored value untouched, even
/// after it has been taken out.
#[derive(Debug)]
pub struct Latch<T> {
    value: Option<T>,
    resolved: bool,
}

impl<T> Latch<T> {
    pub fn new() -> Self {
        Self {
            value: None,
            resolved: false,
        }
    }

    /// Stores `value` if the latch is still open. Returns whether it was accepted.
    pub fn resolve(&mut self, value: T) -> bool {
        if self.resolved {
            return false;
        }
        self.value = Some(value);
        self.resolved = true;
        true
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }
}

impl<T> Default for Latch<T> {
    fn default() -> Self {
        Self::new()
    }
}
