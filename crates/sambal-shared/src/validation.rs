//! Field-level validation for request bodies.

/// Collects every failed check so a form gets all of its messages at once.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` unless `ok`.
    pub fn check(&mut self, ok: bool, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.push(message.into());
        }
        self
    }

    /// Non-blank after trimming.
    pub fn require(&mut self, value: &str, field: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), format!("{} is required", field))
    }

    /// At least `min` characters after trimming.
    pub fn min_chars(&mut self, value: &str, min: usize, field: &str) -> &mut Self {
        self.check(
            value.trim().chars().count() >= min,
            format!("{} must be at least {} characters", field, min),
        )
    }

    /// At most `max` characters after trimming.
    pub fn max_chars(&mut self, value: &str, max: usize, field: &str) -> &mut Self {
        self.check(
            value.trim().chars().count() <= max,
            format!("{} must be at most {} characters", field, max),
        )
    }

    /// Inclusive range.
    pub fn in_range<T: PartialOrd + std::fmt::Display>(
        &mut self,
        value: T,
        min: T,
        max: T,
        field: &str,
    ) -> &mut Self {
        let ok = value >= min && value <= max;
        self.check(ok, format!("{} must be between {} and {}", field, min, max))
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), Vec<String>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}
