//! A call frame: one activation of a [Closure] on the VM's frame stack.

use std::rc::Rc;

use crate::code::Instructions;
use crate::object::Closure;

pub struct Frame {
    closure: Rc<Closure>,
    /// Instruction pointer: byte offset into `closure.function.instructions`.
    pub ip: usize,
    /// Index into the VM's value stack where this frame's locals begin.
    pub base_pointer: usize,
}

impl Frame {
    pub fn new(closure: Rc<Closure>, base_pointer: usize) -> Self {
        Frame {
            closure,
            ip: 0,
            base_pointer,
        }
    }

    pub fn instructions(&self) -> &Instructions {
        &self.closure.function.instructions
    }

    pub fn closure(&self) -> &Rc<Closure> {
        &self.closure
    }
}
