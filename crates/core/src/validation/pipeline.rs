use std::fmt;

use thiserror::Error;

use staffdesk_shared::AppError;

/// First failing rule of a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Request field the error refers to, if any.
    pub field: Option<String>,
    /// Human-readable message.
    pub message: String,
}

impl ValidationError {
    /// Creates an error attached to a field.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Creates an error not tied to a single field.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.message)
    }
}

type Step<'a, I, C, E> = Box<dyn Fn(&I, C) -> Result<C, E> + Send + Sync + 'a>;

/// Ordered list of validation steps threading a context value.
///
/// Steps fail with `E`, a [`ValidationError`] unless a caller needs to keep
/// domain error kinds (for example [`crate::CoreError`]).
pub struct Pipeline<'a, I, C, E = ValidationError> {
    steps: Vec<(&'static str, Step<'a, I, C, E>)>,
}

impl<I, C, E> fmt::Debug for Pipeline<'_, I, C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.step_names())
            .finish()
    }
}

impl<I, C, E> Default for Pipeline<'_, I, C, E> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<'a, I, C, E> Pipeline<'a, I, C, E> {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step that may transform the context.
    #[must_use]
    pub fn step<F>(mut self, name: &'static str, f: F) -> Self
    where
        F: Fn(&I, C) -> Result<C, E> + Send + Sync + 'a,
    {
        self.steps.push((name, Box::new(f)));
        self
    }

    /// Appends a step that only checks the input.
    #[must_use]
    pub fn check<F>(self, name: &'static str, f: F) -> Self
    where
        F: Fn(&I) -> Result<(), E> + Send + Sync + 'a,
    {
        self.step(name, move |input, ctx| f(input).map(|()| ctx))
    }

    /// Names of the registered steps, in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|(name, _)| *name).collect()
    }

    /// Runs every step in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing step.
    pub fn run(&self, input: &I, initial: C) -> Result<C, E> {
        self.steps
            .iter()
            .try_fold(initial, |ctx, (_, step)| step(input, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default, PartialEq)]
    struct Ctx {
        trimmed: Option<String>,
        length: usize,
    }

    fn pipeline<'a>() -> Pipeline<'a, String, Ctx> {
        Pipeline::new()
            .check("required", |input: &String| {
                if input.trim().is_empty() {
                    Err(ValidationError::field("name", "name is required"))
                } else {
                    Ok(())
                }
            })
            .step("trim", |input, ctx| {
                Ok(Ctx {
                    trimmed: Some(input.trim().to_string()),
                    ..ctx
                })
            })
            .step("length", |_, ctx| {
                let length = ctx.trimmed.as_deref().map_or(0, str::len);
                if length > 10 {
                    return Err(ValidationError::field("name", "name is too long"));
                }
                Ok(Ctx { length, ..ctx })
            })
    }

    #[test]
    fn test_context_is_threaded_through_steps() {
        let ctx = pipeline().run(&"  Acme  ".to_string(), Ctx::default()).unwrap();
        assert_eq!(
            ctx,
            Ctx {
                trimmed: Some("Acme".into()),
                length: 4,
            }
        );
    }

    #[test]
    fn test_first_error_wins() {
        let err = pipeline().run(&"   ".to_string(), Ctx::default()).unwrap_err();
        assert_eq!(err.message, "name is required");
        assert_eq!(err.field.as_deref(), Some("name"));
    }

    #[test]
    fn test_later_steps_do_not_run_after_failure() {
        let calls = AtomicUsize::new(0);
        let pipeline: Pipeline<'_, u32, ()> = Pipeline::new()
            .check("fails", |_| Err(ValidationError::new("nope")))
            .check("counted", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });

        assert!(pipeline.run(&1, ()).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_step_names_in_order() {
        assert_eq!(pipeline().step_names(), vec!["required", "trim", "length"]);
    }

    #[test]
    fn test_into_app_error_is_unprocessable() {
        let err: AppError = ValidationError::new("bad").into();
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn test_domain_error_kinds_are_kept() {
        use crate::CoreError;
        use crate::approval::{ApprovalError, check_rank_order};

        let pipeline: Pipeline<'_, Vec<u32>, (), CoreError> = Pipeline::new()
            .check("required", |ranks: &Vec<u32>| {
                if ranks.is_empty() {
                    return Err(ValidationError::field("approvals", "approvals are required").into());
                }
                Ok(())
            })
            .check("rank_order", |ranks| Ok(check_rank_order(ranks)?));

        let err = pipeline.run(&vec![1, 1], ()).unwrap_err();
        assert_eq!(err, CoreError::Approval(ApprovalError::DuplicateRank(1)));
        assert_eq!(err.error_code(), "DUPLICATE_RANK");
        assert_eq!(
            pipeline.run(&vec![], ()).unwrap_err().field(),
            Some("approvals")
        );
    }
}
