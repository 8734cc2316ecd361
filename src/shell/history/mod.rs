//! Bounded list of recently entered lines.

use std::collections::vec_deque;
use std::collections::VecDeque;

#[derive(Debug, Clone, Default)]
pub struct History {
    entries: VecDeque<String>,
    max_len: usize,
}

impl History {
    pub fn new(max_len: usize) -> History {
        History {
            entries: VecDeque::with_capacity(max_len),
            max_len,
        }
    }

    /// Return the history entry at position `index`, starting from 0 (oldest).
    pub fn get(&self, index: usize) -> Option<&String> {
        self.entries.get(index)
    }

    /// Return the last history entry (i.e. previous command)
    pub fn last(&self) -> Option<&String> {
        self.entries.back()
    }

    /// Add a new entry, evicting the oldest one when full. Blank lines and
    /// repeats of the previous entry are not recorded.
    pub fn add<S: AsRef<str> + Into<String>>(&mut self, line: S) -> bool {
        if self.max_len == 0 || line.as_ref().trim().is_empty() {
            return false;
        }
        if let Some(s) = self.entries.back() {
            if s == line.as_ref() {
                return false;
            }
        }
        if self.entries.len() == self.max_len {
            self.entries.pop_front();
        }
        self.entries.push_back(line.into());
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear()
    }

    /// Oldest first.
    pub fn iter(&self) -> vec_deque::Iter<'_, String> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a String;
    type IntoIter = vec_deque::Iter<'a, String>;

    fn into_iter(self) -> vec_deque::Iter<'a, String> {
        self.iter()
    }
}

/// Position while stepping through the history from the line editor.
/// Starts past the newest entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryCursor {
    position: Option<usize>,
}

impl HistoryCursor {
    pub fn new() -> HistoryCursor {
        HistoryCursor { position: None }
    }

    /// Step to the next older entry. `None` once the oldest is reached.
    pub fn older<'h>(&mut self, history: &'h History) -> Option<&'h str> {
        let next = match self.position {
            None => history.len().checked_sub(1)?,
            Some(0) => return None,
            Some(index) => index - 1,
        };
        self.position = Some(next);
        history.get(next).map(String::as_str)
    }

    /// Step to the next newer entry. `None` if not browsing or already at
    /// the newest.
    pub fn newer<'h>(&mut self, history: &'h History) -> Option<&'h str> {
        let next = self.position? + 1;
        if next >= history.len() {
            return None;
        }
        self.position = Some(next);
        history.get(next).map(String::as_str)
    }

    pub fn reset(&mut self) {
        self.position = None;
    }
}
