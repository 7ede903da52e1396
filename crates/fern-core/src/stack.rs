use crate::value::Value;

const INIT_CAPACITY: usize = 20;
const GROWTH_FACTOR: usize = 2;

/// One call frame: the argument array of an active invocation.
pub type Frame = Vec<Value>;

/// Growable stack of call frames.
///
/// Frames are strictly per-thread (each thread owns its own stack per
/// function body), so no synchronization happens here; entry and exit are
/// paired by the invocation driver.
pub struct FrameStack {
    frames: Vec<Frame>,
}

impl FrameStack {
    pub fn new() -> Self {
        FrameStack {
            frames: Vec::with_capacity(INIT_CAPACITY),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn capacity(&self) -> usize {
        self.frames.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn push(&mut self, frame: Frame) {
        if self.frames.len() == self.frames.capacity() {
            self.frames
                .reserve_exact(self.frames.capacity() * (GROWTH_FACTOR - 1));
        }
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Swap the top frame for `frame`, returning the previous one.
    pub fn replace_top(&mut self, frame: Frame) -> Option<Frame> {
        match self.frames.last_mut() {
            Some(top) => Some(std::mem::replace(top, frame)),
            None => None,
        }
    }
}

impl Default for FrameStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(n: i64) -> Frame {
        vec![Value::Int(n)]
    }

    #[test]
    fn push_peek_pop_pair_up() {
        let mut stack = FrameStack::new();
        assert!(stack.top().is_none());
        for i in 0..25 {
            stack.push(frame(i));
            assert_eq!(stack.top(), Some(&frame(i)));
            assert_eq!(stack.depth(), (i + 1) as usize);
        }
        assert!(stack.capacity() >= 25);
        for i in (0..25).rev() {
            assert_eq!(stack.pop(), Some(frame(i)));
        }
        assert!(stack.is_empty());
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn replace_top_returns_previous_frame() {
        let mut stack = FrameStack::new();
        assert_eq!(stack.replace_top(frame(1)), None);
        stack.push(frame(1));
        let prev = stack.replace_top(frame(2));
        assert_eq!(prev, Some(frame(1)));
        assert_eq!(stack.top(), Some(&frame(2)));
        assert_eq!(stack.depth(), 1);
    }
}
