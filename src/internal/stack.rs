/// Minimal LIFO interface over the storage backing a [`FrameStack`].
///
/// [`FrameStack`]: super::offset::FrameStack
pub(crate) trait Stack {
    /// Type of the values that are pushed onto the stack.
    type Item: Copy;

    /// Return the topmost value of the Stack, or `None` if it is empty
    fn peek(&self) -> Option<Self::Item>;

    /// Return the topmost value of the Stack, or `default` if it is empty
    fn peek_or(&self, default: Self::Item) -> Self::Item {
        self.peek().unwrap_or(default)
    }

    /// Like `peek`, but the topmost value of the stack is removed if it exists.
    fn pop(&mut self) -> Option<Self::Item>;

    /// Push `item` onto the top of the stack.
    fn push(&mut self, item: Self::Item);

    /// Number of items currently on the stack
    fn depth(&self) -> usize;

    /// Pushes `item` unless `validate` (given the current top and the new item)
    /// returns `Some(err)`, in which case the stack is left unmodified.
    fn push_validated<Error, F: Fn(Option<Self::Item>, Self::Item) -> Option<Error>>(
        &mut self,
        item: Self::Item,
        validate: F,
    ) -> Result<(), Error> {
        match validate(self.peek(), item) {
            None => {
                self.push(item);
                Ok(())
            }
            Some(err) => Err(err),
        }
    }
}

impl<T: Copy> Stack for Vec<T> {
    type Item = T;

    fn peek(&self) -> Option<Self::Item> {
        self.last().copied()
    }

    fn pop(&mut self) -> Option<Self::Item> {
        Vec::pop(self)
    }

    fn push(&mut self, item: Self::Item) {
        Vec::push(self, item)
    }

    fn depth(&self) -> usize {
        self.len()
    }
}

#[cfg(feature = "smallvec_framestack")]
impl<A> Stack for smallvec::SmallVec<A>
where
    A: smallvec::Array,
    A::Item: Copy,
{
    type Item = A::Item;

    fn peek(&self) -> Option<Self::Item> {
        self.last().copied()
    }

    fn pop(&mut self) -> Option<Self::Item> {
        smallvec::SmallVec::pop(self)
    }

    fn push(&mut self, item: Self::Item) {
        smallvec::SmallVec::push(self, item)
    }

    fn depth(&self) -> usize {
        self.len()
    }
}
