//! Call-frame tracking.
//!
//! `CallStack` records one frame per active subroutine call on a thread.
//! The depth check is part of [`CallStack::push`]; a frame also holds the
//! value stored by `return expr;` until the call completes.

use zmk_ir::SourcePos;

use crate::errors::{call_depth_exceeded, RuntimeError};
use crate::value::Value;

/// One active subroutine call.
#[derive(Clone, Debug)]
pub struct CallFrame {
    /// Qualified subroutine name.
    pub name: String,
    /// Where the call was made.
    pub call_pos: SourcePos,
    /// Owning class, if the subroutine is a class member.
    pub class: Option<String>,
    /// Value of the last executed `return expr;`.
    pub ret: Option<Value>,
}

impl CallFrame {
    pub fn new(name: impl Into<String>, call_pos: SourcePos) -> Self {
        CallFrame {
            name: name.into(),
            call_pos,
            class: None,
            ret: None,
        }
    }

    #[must_use]
    pub fn in_class(mut self, class: Option<String>) -> Self {
        self.class = class;
        self
    }
}

/// Live call stack of one thread.
#[derive(Clone, Debug, Default)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: Option<usize>,
}

impl CallStack {
    /// `None` means unlimited.
    pub fn new(max_depth: Option<usize>) -> Self {
        CallStack {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a frame. The frame is not pushed when the limit is reached.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), RuntimeError> {
        if let Some(max) = self.max_depth {
            if self.frames.len() >= max {
                return Err(call_depth_exceeded(max));
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<CallFrame> {
        debug_assert!(!self.frames.is_empty(), "CallStack::pop on empty stack");
        self.frames.pop()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Store a return value in the innermost frame. Returns `false` outside any call.
    pub fn set_return(&mut self, value: Value) -> bool {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.ret = Some(value);
                true
            }
            None => false,
        }
    }

    /// Class of the innermost frame.
    pub fn current_class(&self) -> Option<&str> {
        self.frames.last().and_then(|f| f.class.as_deref())
    }
}
