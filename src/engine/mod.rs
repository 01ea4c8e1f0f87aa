//! The seam between the host runtime and a compiled model engine.
//!
//! An engine is an opaque module with one linear memory and a table of named entry points.
//! It performs no data movement itself: the host places encoded buffers at the offsets the
//! engine reports, then calls an entry point to consume them.

mod export;
pub mod imports;
mod manifest;

pub use export::{Export, Mode};
pub use imports::HostImports;
pub use manifest::{BACKWARD_STEPS, DiagnosticHook, FORWARD_STEPS, Manifest, Phase};

use crate::Result;

/// A scalar crossing the host/engine boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Value {
    /// Interprets the value as an unsigned 32 bit quantity.
    ///
    /// `I32` is reinterpreted bit for bit, the way a linear-memory engine returns offsets.
    pub fn as_u32(self) -> Option<u32> {
        match self {
            Value::I32(v) => Some(v as u32),
            Value::I64(v) => u32::try_from(v).ok(),
            Value::F32(_) | Value::F64(_) => None,
        }
    }

    /// Interprets the value as a byte offset or a byte size.
    pub fn as_usize(self) -> Option<usize> {
        match self {
            Value::I32(v) => Some(v as u32 as usize),
            Value::I64(v) => usize::try_from(v).ok(),
            Value::F32(_) | Value::F64(_) => None,
        }
    }

    /// Widens any numeric value to `f64`.
    pub fn as_f64(self) -> f64 {
        match self {
            Value::I32(v) => v as f64,
            Value::I64(v) => v as f64,
            Value::F32(v) => v as f64,
            Value::F64(v) => v,
        }
    }

    pub fn kind(self) -> &'static str {
        match self {
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
        }
    }
}

/// An instantiated compute engine.
///
/// The host and the engine take turns over the memory region: the host writes a chunk,
/// hands control over through `invoke`, and only touches the memory again once the call
/// returned.
pub trait Engine {
    /// Returns the optional capabilities the engine implements.
    ///
    /// Called once, when the engine is wrapped in a `Context`.
    fn manifest(&self) -> Manifest;

    /// Whether the engine exports the given entry point.
    fn has_export(&self, export: &Export) -> bool;

    /// Runs an entry point.
    ///
    /// # Arguments
    /// * `export` - The entry point to run.
    /// * `args` - The entry point's arguments.
    ///
    /// # Returns
    /// The returned value, if the entry point returns one.
    ///
    /// # Errors
    /// `RuntimeErr::MissingExport` if the entry point doesn't exist, or
    /// `RuntimeErr::Trap` if the engine failed while running it.
    fn invoke(&mut self, export: &Export, args: &[Value]) -> Result<Option<Value>>;

    /// The engine's linear memory.
    fn memory(&self) -> &[u8];

    /// The engine's linear memory, writable.
    fn memory_mut(&mut self) -> &mut [u8];

    /// The host functions the engine was instantiated with.
    fn imports(&self) -> &HostImports;
}
