//! Accumulating validation results.
//!
//! Business-rule checks never short-circuit: every violated rule lands in the
//! same [`ValidationResult`] so a caller can render the full itemized list.
//! Errors carry a `blocking` flag separating hard failures from soft
//! advisories; approval gating is a third, independent signal.

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// A single violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// The field or rule group the violation belongs to.
    pub field: String,
    /// Stable machine-readable code (e.g. `INVALID_TRANSITION`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Hard failure when true; soft advisory when false.
    pub blocking: bool,
}

/// A non-fatal advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub field: String,
    pub code: String,
    pub message: String,
}

/// Outcome of running a validation pipeline to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    /// The operation may proceed only once one of `required_roles` signs off.
    pub requires_approval: bool,
    /// Roles that may grant the approval above.
    pub required_roles: Vec<Role>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a blocking error.
    pub fn block(
        &mut self,
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.errors.push(ValidationError {
            field: field.into(),
            code: code.into(),
            message: message.into(),
            blocking: true,
        });
    }

    /// Record a non-blocking (advisory) error.
    pub fn advise(
        &mut self,
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.errors.push(ValidationError {
            field: field.into(),
            code: code.into(),
            message: message.into(),
            blocking: false,
        });
    }

    /// Record a warning.
    pub fn warn(
        &mut self,
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.warnings.push(ValidationWarning {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        });
    }

    /// Flag the result as requiring sign-off from one of `roles`.
    pub fn require_approval<I>(&mut self, roles: I)
    where
        I: IntoIterator<Item = Role>,
    {
        self.requires_approval = true;
        for role in roles {
            if !self.required_roles.contains(&role) {
                self.required_roles.push(role);
            }
        }
    }

    /// Fold another result into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        if other.requires_approval {
            self.require_approval(other.required_roles);
        }
    }

    /// False iff any error is blocking.
    pub fn is_valid(&self) -> bool {
        !self.errors.iter().any(|e| e.blocking)
    }

    /// True whenever no blocking error exists, even if approval is still
    /// required; approval gating is consumed separately by the caller.
    pub fn can_proceed(&self) -> bool {
        self.is_valid()
    }

    /// True if a given code appears among the errors.
    pub fn has_error(&self, code: &str) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    /// True if a given code appears among the warnings.
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advisory_errors_do_not_block() {
        let mut result = ValidationResult::new();
        result.advise("quantity", "UNDER_RECEIPT", "short delivery");
        assert!(result.is_valid());
        assert!(result.can_proceed());
        assert!(result.has_error("UNDER_RECEIPT"));
    }

    #[test]
    fn blocking_error_invalidates() {
        let mut result = ValidationResult::new();
        result.warn("expiry", "EXPIRY_WARNING", "expires soon");
        result.block("items", "NO_ITEMS_RECEIVED", "receipt is empty");
        assert!(!result.is_valid());
        assert!(!result.can_proceed());
    }

    #[test]
    fn approval_required_still_proceeds() {
        let mut result = ValidationResult::new();
        result.require_approval([Role::manager()]);
        assert!(result.can_proceed());
        assert!(result.requires_approval);
        assert_eq!(result.required_roles, vec![Role::manager()]);
    }

    #[test]
    fn merge_accumulates_and_dedupes_roles() {
        let mut a = ValidationResult::new();
        a.require_approval([Role::manager()]);
        let mut b = ValidationResult::new();
        b.block("x", "X", "x");
        b.require_approval([Role::manager(), Role::admin()]);
        a.merge(b);
        assert!(!a.is_valid());
        assert_eq!(a.required_roles, vec![Role::manager(), Role::admin()]);
    }
}
