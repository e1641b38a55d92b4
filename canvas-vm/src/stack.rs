//! # Stack machine
//!
//! Bounded LIFO used by the interpreter. Capacity is fixed at construction;
//! overflow and underflow are reported as errors and leave the stack as it
//! was.

use crate::error::{self, Result};

/// Default capacity used by the interpreter
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct Stack<T> {
    data: Vec<T>,
    capacity: usize,
}

impl<T> Stack<T> {
    pub fn new(capacity: usize) -> Self {
        Stack {
            data: Vec::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.data.len() >= self.capacity
    }

    pub fn push(&mut self, value: T) -> Result<()> {
        if self.is_full() {
            return Err(error::stack_overflow(self.capacity));
        }
        self.data.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<T> {
        self.data.pop().ok_or_else(error::stack_underflow)
    }

    pub fn peek(&self) -> Result<&T> {
        self.data.last().ok_or_else(error::stack_underflow)
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Values bottom to top
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Values top to bottom
    pub fn iter_top_down(&self) -> impl Iterator<Item = &T> {
        self.data.iter().rev()
    }
}

impl<T: Clone> Stack<T> {
    /// Push a copy of the top value
    pub fn dup(&mut self) -> Result<()> {
        let value = self.peek()?.clone();
        self.push(value)
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Stack::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::value::Value;
    use proptest::prelude::*;

    #[test]
    fn test_push_pop() {
        let mut stack = Stack::new(4);
        stack.push(Value::Integer(1)).unwrap();
        stack.push(Value::string("hello")).unwrap();

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop().unwrap(), Value::string("hello"));
        assert_eq!(stack.pop().unwrap(), Value::Integer(1));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_peek_and_dup() {
        let mut stack = Stack::new(4);
        stack.push(42).unwrap();
        assert_eq!(stack.peek().unwrap(), &42);

        stack.dup().unwrap();
        assert_eq!(stack.as_slice(), &[42, 42]);
    }

    #[test]
    fn test_underflow() {
        let mut stack: Stack<i32> = Stack::new(4);
        assert!(stack.pop().is_err_and(|e| e.kind() == ErrorKind::StackUnderflow));
        assert!(stack.peek().is_err_and(|e| e.kind() == ErrorKind::StackUnderflow));
        assert!(stack.dup().is_err_and(|e| e.kind() == ErrorKind::StackUnderflow));
        assert_eq!(stack.len(), 0);
    }

    #[test]
    fn test_overflow() {
        let mut stack = Stack::default();
        for i in 0..DEFAULT_CAPACITY {
            stack.push(i).unwrap();
        }
        assert!(stack.is_full());
        assert!(stack.push(999).is_err_and(|e| e.kind() == ErrorKind::StackOverflow));
        assert!(stack.dup().is_err_and(|e| e.kind() == ErrorKind::StackOverflow));
        assert_eq!(stack.len(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_large_capacity_grows_on_demand() {
        let mut stack = Stack::new(usize::MAX);
        assert_eq!(stack.capacity(), usize::MAX);
        stack.push(1u8).unwrap();
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_zero_capacity() {
        let mut stack = Stack::new(0);
        assert!(stack.push(1).is_err_and(|e| e.kind() == ErrorKind::StackOverflow));
    }

    #[test]
    fn test_top_down_order() {
        let mut stack = Stack::new(3);
        for i in 1..=3 {
            stack.push(i).unwrap();
        }
        assert_eq!(stack.iter_top_down().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    proptest! {
        #[test]
        fn prop_failed_ops_leave_size_unchanged(capacity in 0usize..16, pushes in 0usize..32) {
            let mut stack = Stack::new(capacity);
            for i in 0..pushes {
                let before = stack.len();
                match stack.push(i) {
                    Ok(()) => prop_assert_eq!(stack.len(), before + 1),
                    Err(e) => {
                        prop_assert_eq!(e.kind(), ErrorKind::StackOverflow);
                        prop_assert_eq!(stack.len(), before);
                    }
                }
            }
            prop_assert_eq!(stack.len(), pushes.min(capacity));

            while stack.pop().is_ok() {}
            prop_assert!(stack.pop().is_err());
            prop_assert!(stack.peek().is_err());
            prop_assert_eq!(stack.len(), 0);
        }
    }
}
