use crate::asset::MediaAsset;

/// Round-robin ad selector. Selection i returns `pool[i mod len]`; the
/// counter only moves when the sequential assembly stage draws from it, so
/// rotation order is independent of upstream completion order.
#[derive(Debug, Clone, Default)]
pub struct AdCycler {
    pool: Vec<MediaAsset>,
    next_index: usize,
}

impl AdCycler {
    pub fn new(pool: Vec<MediaAsset>) -> Self {
        Self {
            pool,
            next_index: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Number of selections made so far.
    pub fn selections(&self) -> usize {
        self.next_index
    }

    pub fn select_next(&mut self) -> Option<&MediaAsset> {
        if self.pool.is_empty() {
            return None;
        }
        let selected = &self.pool[self.next_index % self.pool.len()];
        self.next_index += 1;
        Some(selected)
    }
}
