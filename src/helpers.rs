//! Caller-owned buffers for timed operations.
//!
//! The most common mistake when benchmarking is generating inputs or
//! allocating inside the measured closure. That work lands in the timing and
//! can swamp the difference between candidates.
//!
//! [`MeasurementContext`] holds pre-generated inputs and a pre-sized output
//! buffer. Candidates read the inputs and write the outputs through
//! [`run`](MeasurementContext::run), so the timed region does only the work
//! under test, and the outputs stay observable afterwards for correctness
//! checks.
//!
//! # Example
//!
//! ```
//! use speedup_oracle::helpers::MeasurementContext;
//!
//! let inputs: Vec<String> = (0..64).map(|i| (i * 7919).to_string()).collect();
//! let ctx = MeasurementContext::new(inputs, 0u32).unwrap();
//!
//! let parse = || {
//!     ctx.run(|inputs, outputs| {
//!         for (s, out) in inputs.iter().zip(outputs.iter_mut()) {
//!             *out = s.parse().unwrap_or(0);
//!         }
//!     })
//! };
//! parse();
//!
//! assert_eq!(ctx.first_mismatch(|s, &v| s.parse::<u32>() == Ok(v)), None);
//! ```
//!
//! # Sharing Between Candidates
//!
//! `run` takes `&self`, so the closures of both candidates in a paired
//! comparison can borrow the same context. The output buffer is behind a
//! `RefCell`; `run` must not be re-entered from inside its own callback.

use std::cell::RefCell;
use std::hash::{DefaultHasher, Hash, Hasher};

use crate::error::{ConfigError, Result};

/// Pre-generated inputs and an output buffer of the same length.
#[derive(Debug)]
pub struct MeasurementContext<I, O> {
    inputs: Vec<I>,
    outputs: RefCell<Vec<O>>,
    fill: O,
}

impl<I, O: Clone> MeasurementContext<I, O> {
    /// Wrap `inputs`, with one output slot per input initialised to `fill`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::BufferSize`] if `inputs` is empty.
    pub fn new(inputs: Vec<I>, fill: O) -> Result<Self> {
        if inputs.is_empty() {
            return Err(ConfigError::BufferSize.into());
        }
        let outputs = vec![fill.clone(); inputs.len()];
        Ok(Self {
            inputs,
            outputs: RefCell::new(outputs),
            fill,
        })
    }

    /// Generate `size` inputs from their index.
    ///
    /// # Errors
    ///
    /// [`ConfigError::BufferSize`] if `size` is zero.
    pub fn from_fn(size: usize, generate: impl FnMut(usize) -> I, fill: O) -> Result<Self> {
        Self::new((0..size).map(generate).collect(), fill)
    }

    /// Run `f` over the inputs and the output buffer.
    #[inline]
    pub fn run<R>(&self, f: impl FnOnce(&[I], &mut [O]) -> R) -> R {
        let mut outputs = self.outputs.borrow_mut();
        f(self.inputs.as_slice(), outputs.as_mut_slice())
    }

    /// Reset every output slot to the fill value.
    pub fn reset(&self) {
        let mut outputs = self.outputs.borrow_mut();
        for slot in outputs.iter_mut() {
            *slot = self.fill.clone();
        }
    }

    /// Snapshot of the output buffer.
    pub fn outputs(&self) -> Vec<O> {
        self.outputs.borrow().clone()
    }

    /// The inputs.
    pub fn inputs(&self) -> &[I] {
        &self.inputs
    }

    /// Number of input/output slots.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Always false; a context has at least one slot.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Index of the first slot whose output fails `check`, if any.
    pub fn first_mismatch(&self, mut check: impl FnMut(&I, &O) -> bool) -> Option<usize> {
        let outputs = self.outputs.borrow();
        self.inputs
            .iter()
            .zip(outputs.iter())
            .position(|(input, output)| !check(input, output))
    }
}

impl<I, O: Hash> MeasurementContext<I, O> {
    /// Hash of the output buffer.
    ///
    /// Two candidates that compute the same function leave the same
    /// checksum behind.
    pub fn checksum(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.outputs.borrow().hash(&mut hasher);
        hasher.finish()
    }
}
