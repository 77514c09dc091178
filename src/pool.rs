//! Free-list pooling for reusable layout state.

/// Returns an object to its freshly constructed state without releasing its
/// allocations.
pub trait Reset {
    fn reset(&mut self);

    /// `true` when the object carries no state from a previous use.
    fn is_reset(&self) -> bool;
}

impl<T: Reset + ?Sized> Reset for Box<T> {
    fn reset(&mut self) {
        (**self).reset();
    }

    fn is_reset(&self) -> bool {
        (**self).is_reset()
    }
}

/// LIFO free list of [`Reset`] objects.
///
/// Items are reset when given back, so a rented item never observes state
/// left by its previous user.
#[derive(Debug)]
pub struct Pool<T: Reset> {
    free: Vec<T>,
    max_free: usize,
}

impl<T: Reset> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Reset> Pool<T> {
    pub fn new() -> Self {
        Self::with_max_free(usize::MAX)
    }

    /// A pool that keeps at most `max_free` idle items and drops the rest.
    pub fn with_max_free(max_free: usize) -> Self {
        Self {
            free: Vec::new(),
            max_free,
        }
    }

    /// Takes an idle item, or builds a new one with `make`.
    pub fn rent_or_else(&mut self, make: impl FnOnce() -> T) -> T {
        match self.free.pop() {
            Some(item) => {
                debug_assert!(item.is_reset(), "pooled item was not reset");
                item
            }
            None => make(),
        }
    }

    pub fn give_back(&mut self, mut item: T) {
        item.reset();
        if self.free.len() < self.max_free {
            self.free.push(item);
        }
    }

    /// Number of idle items.
    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    pub fn clear(&mut self) {
        self.free.clear();
    }
}

impl<T: Reset + Default> Pool<T> {
    pub fn rent(&mut self) -> T {
        self.rent_or_else(T::default)
    }
}
