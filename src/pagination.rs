/// Reveals a filtered sequence one page at a time.
///
/// Advancing past the end is a no-op. The cursor only starts over when
/// `replace` installs a fresh result.
#[derive(Debug, Clone)]
pub struct PageCursor<T> {
    items: Vec<T>,
    page_size: usize,
    revealed: usize,
}

impl<T> PageCursor<T> {
    pub fn new(items: Vec<T>, page_size: usize) -> Self {
        Self {
            items,
            page_size: page_size.max(1),
            revealed: 0,
        }
    }

    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
        self.revealed = 0;
    }

    /// The next unrevealed page; empty once everything has been handed out.
    pub fn next_page(&mut self) -> &[T] {
        let start = self.revealed;
        let end = (start + self.page_size).min(self.items.len());
        self.revealed = end;
        &self.items[start..end]
    }

    pub fn has_more(&self) -> bool {
        self.revealed < self.items.len()
    }

    pub fn revealed(&self) -> &[T] {
        &self.items[..self.revealed]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }
}
