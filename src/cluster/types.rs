use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

/// Extracts the stable identity of a record.
pub type IdExtractor<T, I> = Arc<dyn Fn(&T) -> I + Send + Sync>;

/// Mints a cluster id from the ids of the cluster's members.
///
/// Must not collide for logically distinct groups within the lifetime of an index.
/// See [`crate::cluster::ids`] for stock generators.
pub type ClusterIdGenerator<I, C> = Arc<dyn Fn(&[I]) -> C + Send + Sync>;

/// A group of records believed to be mutual duplicates.
///
/// Equality is order-sensitive over the elements and includes the id. Use
/// [`Cluster::same_members`] to compare the logical group only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cluster<C, T> {
    id: C,
    elements: Vec<T>,
}

impl<C, T> Cluster<C, T> {
    /// Create a cluster.
    pub fn new(id: C, elements: Vec<T>) -> Self {
        Self { id, elements }
    }

    /// Cluster id.
    pub fn id(&self) -> &C {
        &self.id
    }

    /// Members in insertion order.
    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    /// Consume the cluster, returning its members.
    pub fn into_elements(self) -> Vec<T> {
        self.elements
    }

    /// Member at `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True if the cluster has no members.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate over the members.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }

    pub(crate) fn push(&mut self, record: T) {
        self.elements.push(record);
    }

    /// Ids of the members, in member order.
    pub fn member_ids<I>(&self, id_extractor: &IdExtractor<T, I>) -> Vec<I> {
        self.elements.iter().map(|e| id_extractor(e)).collect()
    }

    /// True if both clusters hold the same set of record ids.
    pub fn same_members<I>(&self, other: &Cluster<C, T>, id_extractor: &IdExtractor<T, I>) -> bool
    where
        I: Eq + Hash,
    {
        let ours: HashSet<I> = self.elements.iter().map(|e| id_extractor(e)).collect();
        let theirs: HashSet<I> = other.elements.iter().map(|e| id_extractor(e)).collect();
        ours == theirs
    }

    /// True if a member has the given id.
    pub fn contains_id<I>(&self, id: &I, id_extractor: &IdExtractor<T, I>) -> bool
    where
        I: PartialEq,
    {
        self.elements.iter().any(|e| id_extractor(e) == *id)
    }
}

impl<'a, C, T> IntoIterator for &'a Cluster<C, T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
