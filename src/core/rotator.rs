//! Rotating display windows.
//!
//! Lists longer than the window are shown as a fixed-size circular slice
//! that advances one entry per tick, so every entry is eventually visible.
//! Ticks are suppressed while an announcement is active.

/// Number of rows shown per list
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Advance a cursor by one tick.
///
/// Inert when the whole list fits in the window.
pub fn tick(cursor: usize, len: usize, window_size: usize) -> usize {
    if len > window_size {
        (cursor + 1) % len
    } else {
        cursor
    }
}

/// The visible slice of `list` starting at `cursor`, wrapping around
pub fn window<T>(list: &[T], cursor: usize, window_size: usize) -> Vec<&T> {
    if list.len() <= window_size {
        return list.iter().collect();
    }
    let start = cursor % list.len();
    list.iter().cycle().skip(start).take(window_size).collect()
}

/// Which displayed list a cursor belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayList {
    Waiting,
    Attending,
}

/// Rotation state for one list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationCursor {
    /// Index of the first visible entry
    pub offset: usize,

    /// List length at the last tick or resize
    pub len: usize,
}

impl RotationCursor {
    /// Record a new list length, keeping `offset < len`
    fn resize(&mut self, len: usize) {
        self.len = len;
        self.offset = if len == 0 { 0 } else { self.offset % len };
    }
}

/// Owns the rotation cursors for the waiting and attending lists
#[derive(Debug, Clone)]
pub struct DisplayRotator {
    window_size: usize,
    waiting: RotationCursor,
    attending: RotationCursor,
}

impl Default for DisplayRotator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl DisplayRotator {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
            waiting: RotationCursor::default(),
            attending: RotationCursor::default(),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn cursor(&self, list: DisplayList) -> RotationCursor {
        match list {
            DisplayList::Waiting => self.waiting,
            DisplayList::Attending => self.attending,
        }
    }

    fn cursor_mut(&mut self, list: DisplayList) -> &mut RotationCursor {
        match list {
            DisplayList::Waiting => &mut self.waiting,
            DisplayList::Attending => &mut self.attending,
        }
    }

    /// A new snapshot arrived with `len` entries in `list`
    pub fn resize(&mut self, list: DisplayList, len: usize) {
        self.cursor_mut(list).resize(len);
    }

    /// Advance `list` by one tick unless an announcement is active.
    ///
    /// Returns whether the cursor moved.
    pub fn tick(&mut self, list: DisplayList, len: usize, announcing: bool) -> bool {
        let window_size = self.window_size;
        let cursor = self.cursor_mut(list);
        cursor.resize(len);

        if announcing {
            return false;
        }

        let next = tick(cursor.offset, len, window_size);
        let moved = next != cursor.offset;
        cursor.offset = next;
        moved
    }

    /// Visible entries of `items` for `list`
    pub fn visible<'a, T>(&self, list: DisplayList, items: &'a [T]) -> Vec<&'a T> {
        window(items, self.cursor(list).offset, self.window_size)
    }
}
