//! Task expansion: input elements to positioned work items, and work items to chunks

/// One element of the caller's input together with its zero-based position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem<P> {
    pub index: usize,
    pub payload: P,
}

impl<P> WorkItem<P> {
    pub fn new(index: usize, payload: P) -> Self {
        Self { index, payload }
    }
}

/// Expand input elements into work items carrying the element unchanged
pub fn expand<T>(items: impl IntoIterator<Item = T>) -> Vec<WorkItem<T>> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, payload)| WorkItem { index, payload })
        .collect()
}

/// Expand input elements into work items whose payload is `(element, position)`
pub fn expand_indexed<T>(items: impl IntoIterator<Item = T>) -> Vec<WorkItem<(T, usize)>> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, element)| WorkItem {
            index,
            payload: (element, index),
        })
        .collect()
}

/// A contiguous run of work items handed to a single worker
#[derive(Debug)]
pub struct Chunk<P> {
    pub seq: usize,
    pub items: Vec<WorkItem<P>>,
}

impl<P> Chunk<P> {
    /// Position of the first work item in the chunk
    pub fn first_index(&self) -> Option<usize> {
        self.items.first().map(|item| item.index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Partition work items into contiguous chunks of at most `chunk_size` items.
///
/// Chunk sequence numbers follow input order, so chunk `n` holds the `n`th run.
pub fn into_chunks<P>(items: Vec<WorkItem<P>>, chunk_size: usize) -> Vec<Chunk<P>> {
    debug_assert!(chunk_size > 0, "chunk size is validated before chunking");
    let chunk_size = chunk_size.max(1);

    let mut chunks = Vec::with_capacity(items.len().div_ceil(chunk_size));
    let mut remaining = items.into_iter().peekable();
    while remaining.peek().is_some() {
        let items: Vec<_> = remaining.by_ref().take(chunk_size).collect();
        chunks.push(Chunk {
            seq: chunks.len(),
            items,
        });
    }
    chunks
}
