//! Least-recently-used ordering of voice slots.

/// A permutation of the voice slot indices `0..V`, least recently used first.
///
/// "Using" a slot moves its index to the most-recently-used end while the relative order of
/// all other slots is preserved. With so few voices an O(V) shift is both correct and
/// clearer than any linked structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LruOrder<const V: usize = 4> {
    order: [u8; V],
}

impl<const V: usize> LruOrder<V> {
    /// Construct the identity order: slot 0 is least recently used.
    pub fn new() -> Self {
        let mut order = [0; V];
        for (position, slot) in order.iter_mut().enumerate() {
            *slot = position as u8;
        }
        Self { order }
    }

    /// Visit the slot indices from least to most recently used.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().map(|&slot| slot as usize)
    }

    /// Mark `slot` as just used, moving it to the most-recently-used end.
    pub fn touch(&mut self, slot: usize) {
        let Some(position) = self.order.iter().position(|&s| s as usize == slot) else {
            return;
        };
        for i in position..V - 1 {
            self.order[i] = self.order[i + 1];
        }
        self.order[V - 1] = slot as u8;
    }
}

impl<const V: usize> Default for LruOrder<V> {
    fn default() -> Self {
        Self::new()
    }
}
