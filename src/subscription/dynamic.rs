use smallvec::SmallVec;

/// Entries keyed by a monotonically increasing id.
///
/// Subjects keep their live outlets here so a subscription can remove itself
/// on cancel without touching its siblings. Inline storage covers the usual
/// one or two subscribers.
pub(crate) struct Registry<T> {
  next_id: usize,
  entries: SmallVec<[(usize, T); 2]>,
}

impl<T> Default for Registry<T> {
  fn default() -> Self { Registry { next_id: 0, entries: SmallVec::new() } }
}

impl<T> Registry<T> {
  pub(crate) fn insert(&mut self, entry: T) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.entries.push((id, entry));
    id
  }

  pub(crate) fn remove(&mut self, id: usize) -> Option<T> {
    let pos = self.entries.iter().position(|(key, _)| *key == id)?;
    Some(self.entries.remove(pos).1)
  }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.entries.len() }

  /// Take every entry out, leaving the registry empty. Ids keep counting.
  pub(crate) fn take_all(&mut self) -> SmallVec<[T; 2]> {
    self.entries.drain(..).map(|(_, entry)| entry).collect()
  }
}

impl<T: Clone> Registry<T> {
  /// Copy the entries so they can be used after the owning lock is released.
  pub(crate) fn snapshot(&self) -> SmallVec<[T; 2]> {
    self.entries.iter().map(|(_, entry)| entry.clone()).collect()
  }
}
