//! Environment configuration shared by connections, cursors, and variables.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::native::{Handle, HandleAllocator, HandleKind};
use crate::types::DataType;

/// Thresholds used when narrowing server NUMBER columns at define time.
///
/// Scale 0 with a precision in `1..=max_integer_precision` defines as an
/// integer; scale 0 otherwise, or `unbounded_scale` with precision 0, defines
/// as an arbitrary-precision integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberNarrowing {
    pub max_integer_precision: i16,
    pub unbounded_scale: i8,
}

impl Default for NumberNarrowing {
    fn default() -> Self {
        Self {
            max_integer_precision: 9,
            unbounded_scale: -127,
        }
    }
}

impl NumberNarrowing {
    /// Data type a NUMBER column narrows to, if any.
    pub fn narrow(&self, precision: i16, scale: i8) -> Option<DataType> {
        if scale == 0 && precision > 0 && precision <= self.max_integer_precision {
            Some(DataType::Integer)
        } else if scale == 0 || (scale == self.unbounded_scale && precision == 0) {
            Some(DataType::LongInteger)
        } else {
            None
        }
    }
}

/// Buffer sizing configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentConfig {
    /// Maximum bytes per character of the client character set.
    pub max_bytes_per_character: u32,
    /// Whether the client character set is fixed width.
    pub fixed_width: bool,
    /// Largest string, in bytes, bound as an ordinary string.
    pub max_string_bytes: u32,
    /// NUMBER narrowing policy.
    pub number_narrowing: NumberNarrowing,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            max_bytes_per_character: 4,
            fixed_width: false,
            max_string_bytes: 4000,
            number_narrowing: NumberNarrowing::default(),
        }
    }
}

impl EnvironmentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum bytes per character (at least 1).
    pub fn with_max_bytes_per_character(mut self, bytes: u32) -> Self {
        self.max_bytes_per_character = bytes.max(1);
        self
    }

    pub fn with_fixed_width(mut self, fixed_width: bool) -> Self {
        self.fixed_width = fixed_width;
        self
    }

    pub fn with_max_string_bytes(mut self, bytes: u32) -> Self {
        self.max_string_bytes = bytes;
        self
    }

    pub fn with_number_narrowing(mut self, narrowing: NumberNarrowing) -> Self {
        self.number_narrowing = narrowing;
        self
    }
}

/// Configuration plus the native descriptor allocator.
pub struct Environment {
    config: EnvironmentConfig,
    handles: Arc<dyn HandleAllocator>,
}

impl Environment {
    pub fn new(config: EnvironmentConfig, handles: Arc<dyn HandleAllocator>) -> Arc<Self> {
        Arc::new(Self { config, handles })
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    pub fn max_bytes_per_character(&self) -> u32 {
        self.config.max_bytes_per_character
    }

    pub fn fixed_width(&self) -> bool {
        self.config.fixed_width
    }

    pub fn max_string_bytes(&self) -> u32 {
        self.config.max_string_bytes
    }

    pub fn number_narrowing(&self) -> &NumberNarrowing {
        &self.config.number_narrowing
    }

    pub(crate) fn alloc_handle(&self, kind: HandleKind) -> Result<Handle> {
        self.handles.alloc_handle(kind)
    }

    pub(crate) fn free_handle(&self, kind: HandleKind, handle: Handle) {
        self.handles.free_handle(kind, handle)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
