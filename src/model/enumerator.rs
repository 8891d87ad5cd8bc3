use std::{iter::FusedIterator, marker::PhantomData};

use crate::{catalog::TableKind, Catalog};

/// An element of a count-prefixed inline array.
///
/// Implementors know their encoded width and how to materialize themselves from the element
/// position. `owner` is the row offset of the entity embedding the array, for elements that are
/// views of the owner itself (declarations and usages of an API).
pub trait ArrayElement<'a>: Sized {
    /// Encoded width of one element in bytes.
    const SIZE: usize;

    /// Reads the element at `position` of the `source` table.
    fn read(catalog: &'a Catalog, source: TableKind, owner: u32, position: usize) -> Self;
}

/// Lazy, finite sequence over a count-prefixed array stored in a catalog table.
///
/// The array starts with an `i32` element count followed by fixed-width elements. Nothing is
/// read until an element is requested; cloning an enumerator, or asking the owning view again,
/// restarts the sequence.
///
/// # Examples
///
/// ```rust,no_run
/// # fn example(catalog: &apicatalog::Catalog) {
/// let frameworks = catalog.frameworks();
/// println!("{} frameworks", frameworks.len());
///
/// for framework in frameworks.clone() {
///     println!("{} ({} assemblies)", framework.name(), framework.assemblies().len());
/// }
/// # }
/// ```
pub struct Enumerator<'a, T> {
    catalog: &'a Catalog,
    source: TableKind,
    owner: u32,
    start: usize,
    count: usize,
    front: usize,
    back: usize,
    _phantom: PhantomData<fn() -> T>,
}

impl<'a, T: ArrayElement<'a>> Enumerator<'a, T> {
    /// Creates an enumerator over the array whose count sits at `position` of `source`.
    pub(crate) fn new(catalog: &'a Catalog, source: TableKind, owner: u32, position: usize) -> Self {
        let count = super::array_len(catalog.table(source), position);
        Enumerator {
            catalog,
            source,
            owner,
            start: position + 4,
            count,
            front: 0,
            back: count,
            _phantom: PhantomData,
        }
    }

    /// Creates an enumerator yielding nothing.
    pub(crate) fn empty(catalog: &'a Catalog, source: TableKind) -> Self {
        Enumerator {
            catalog,
            source,
            owner: 0,
            start: 0,
            count: 0,
            front: 0,
            back: 0,
            _phantom: PhantomData,
        }
    }

    /// Returns the element at `index` of the whole array, regardless of iteration progress.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.count {
            return None;
        }
        Some(self.read(index))
    }

    /// Returns `true` if no elements remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.front >= self.back
    }

    fn read(&self, index: usize) -> T {
        T::read(
            self.catalog,
            self.source,
            self.owner,
            self.start + index * T::SIZE,
        )
    }
}

impl<T> Clone for Enumerator<'_, T> {
    fn clone(&self) -> Self {
        Enumerator {
            catalog: self.catalog,
            source: self.source,
            owner: self.owner,
            start: self.start,
            count: self.count,
            front: self.front,
            back: self.back,
            _phantom: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Enumerator<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enumerator")
            .field("source", &self.source)
            .field("start", &self.start)
            .field("count", &self.count)
            .field("remaining", &self.back.saturating_sub(self.front))
            .finish()
    }
}

impl<'a, T: ArrayElement<'a>> Iterator for Enumerator<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }

        let item = self.read(self.front);
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back.saturating_sub(self.front);
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl<'a, T: ArrayElement<'a>> DoubleEndedIterator for Enumerator<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }

        self.back -= 1;
        Some(self.read(self.back))
    }
}

impl<'a, T: ArrayElement<'a>> ExactSizeIterator for Enumerator<'a, T> {}

impl<'a, T: ArrayElement<'a>> FusedIterator for Enumerator<'a, T> {}

/// Pairs of references, such as the `(framework, assembly)` folders of a package.
impl<'a, A: ArrayElement<'a>, B: ArrayElement<'a>> ArrayElement<'a> for (A, B) {
    const SIZE: usize = A::SIZE + B::SIZE;

    fn read(catalog: &'a Catalog, source: TableKind, owner: u32, position: usize) -> Self {
        (
            A::read(catalog, source, owner, position),
            B::read(catalog, source, owner, position + A::SIZE),
        )
    }
}
