//! Error types for Khazna container operations.
//!
//! Every failure carries the identifier it concerns, and construction
//! failures carry the build chain that led to them. Callers that only
//! need to branch use [`KhaznaError::kind`].

use std::fmt;

use khazna_support::rendering::render_chain;

/// Coarse classification of a [`KhaznaError`].
///
/// "Nothing registered under this name" and "registered but could not be
/// built" usually call for different handling (fallback vs. fatal
/// misconfiguration), so they are kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No binding and no constructible class for the identifier.
    NotFound,
    /// The identifier is known but could not be built.
    Container,
    /// A constructor or factory parameter could not be determined.
    UnresolvableDependency,
}

/// Main error type for all Khazna operations.
#[derive(Debug, thiserror::Error)]
pub enum KhaznaError {
    /// Requested identifier has no binding and no class of that name.
    #[error("{}", .0)]
    NotFound(NotFoundError),

    /// Target is abstract or an interface and has nothing bound to it.
    #[error("{}", .0)]
    NotInstantiable(NotInstantiableError),

    /// Circular dependency detected during resolve.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// A parameter has no override, no usable type hint and no default.
    #[error("{}", .0)]
    UnresolvableDependency(UnresolvableDependencyError),

    /// Alias chain loops back on itself.
    #[error("Alias cycle detected: {}", render_chain(.chain))]
    AliasCycle { chain: Vec<String> },

    /// The stored binding cannot be dispatched.
    #[error("Invalid binding for [{id}]: {reason}")]
    InvalidBinding { id: String, reason: String },

    /// A method binding names a method the target does not expose.
    #[error("Method [{class}::{method}] does not exist")]
    MethodNotFound { class: String, method: String },

    /// A resolved value did not have the type its consumer asked for.
    #[error("Type mismatch for [{target}]: expected {expected}, got {actual}")]
    TypeMismatch {
        target: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Nested construction went deeper than the configured limit.
    #[error("Maximum build depth of {limit} exceeded while building [{}]", render_chain(.chain))]
    DepthExceeded { limit: usize, chain: Vec<String> },

    /// Factory or constructor returned an error of its own.
    #[error("Failed to construct [{id}]: {source}")]
    ConstructionFailed {
        id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl KhaznaError {
    /// Returns the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            KhaznaError::NotFound(_) => ErrorKind::NotFound,
            KhaznaError::UnresolvableDependency(_) => ErrorKind::UnresolvableDependency,
            KhaznaError::NotInstantiable(_)
            | KhaznaError::CircularDependency(_)
            | KhaznaError::AliasCycle { .. }
            | KhaznaError::InvalidBinding { .. }
            | KhaznaError::MethodNotFound { .. }
            | KhaznaError::TypeMismatch { .. }
            | KhaznaError::DepthExceeded { .. }
            | KhaznaError::ConstructionFailed { .. } => ErrorKind::Container,
        }
    }

    /// Wraps an error raised by user code while constructing `id`.
    pub fn construction(
        id: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        KhaznaError::ConstructionFailed {
            id: id.into(),
            source: source.into(),
        }
    }

    /// `true` for failures a parameter default may stand in for.
    pub(crate) fn allows_default_fallback(&self) -> bool {
        matches!(self, KhaznaError::NotFound(_) | KhaznaError::NotInstantiable(_))
    }
}

/// Error when nothing can produce the requested identifier.
#[derive(Debug)]
pub struct NotFoundError {
    /// The identifier that was requested
    pub requested: String,
    /// What was being built when it was requested (if anything)
    pub required_by: Option<String>,
    /// Similar identifiers that ARE known
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target [{}] not found", self.requested)?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        Ok(())
    }
}

/// Error when an abstract class or interface is built directly.
#[derive(Debug)]
pub struct NotInstantiableError {
    /// The class that cannot be constructed
    pub target: String,
    /// Identifiers under construction when it was requested, outermost first
    pub build_stack: Vec<String>,
}

impl fmt::Display for NotInstantiableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.build_stack.is_empty() {
            write!(f, "Target [{}] is not instantiable.", self.target)
        } else {
            write!(
                f,
                "Target [{}] is not instantiable while building [{}].",
                self.target,
                render_chain(&self.build_stack)
            )
        }
    }
}

/// Error when an identifier is requested while it is already being built.
///
/// Shows the full chain so you can see WHERE the cycle is.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// Example: `["A", "B", "A"]`
    pub chain: Vec<String>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circular dependency detected: {}", render_chain(&self.chain))?;
        write!(
            f,
            "\n  Hint: break the cycle with a factory that resolves one side lazily"
        )
    }
}

/// Error when a parameter cannot be satisfied.
#[derive(Debug)]
pub struct UnresolvableDependencyError {
    /// Parameter name
    pub parameter: String,
    /// Position in the declaration
    pub position: usize,
    /// The class (or factory identifier) declaring the parameter
    pub declaring: String,
}

impl fmt::Display for UnresolvableDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unresolvable dependency resolving [Parameter #{} <required> ${}] in class {}",
            self.position, self.parameter, self.declaring
        )
    }
}

/// Convenient Result type for Khazna operations.
pub type Result<T> = std::result::Result<T, KhaznaError>;
