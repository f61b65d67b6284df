use crate::frame_store::FrameStore;

/// Sizes of the recorded task streams, for plotting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SerializedSizeStats {
    pub min: usize,
    pub max: usize,
    /// One entry per recorded frame, in frame order
    pub sizes: Vec<usize>,
}

impl SerializedSizeStats {
    /// Collects statistics over every frame of `store` in a single pass. Returns `None` for an
    /// empty store.
    pub fn from_store(store: &FrameStore) -> Option<Self> {
        let mut sizes = Vec::with_capacity(store.count());
        let mut min = usize::MAX;
        let mut max = 0;

        for size in store.serialized_task_sizes() {
            min = min.min(size);
            max = max.max(size);
            sizes.push(size);
        }

        if sizes.is_empty() {
            return None;
        }

        Some(Self { min, max, sizes })
    }
}
