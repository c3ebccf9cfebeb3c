use std::fmt;

use prettytable::{row, Row};

use crate::ipfs::PinItem;

/// A single rendered pin entry. Its remove action targets [`PinItemView::url`].
#[derive(Debug, Clone, Copy)]
pub struct PinItemView<'a> {
    item: &'a PinItem,
}

impl<'a> PinItemView<'a> {
    pub fn new(item: &'a PinItem) -> Self {
        Self { item }
    }

    pub fn url(&self) -> &'a str {
        &self.item.url
    }

    pub fn row(&self, index: usize) -> Row {
        row![
            index,
            self.item.url,
            self.item.name.as_deref().unwrap_or("-"),
            self.item.id
        ]
    }
}

impl fmt::Display for PinItemView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.item.name.as_deref() {
            Some(name) if name != self.item.url => write!(f, "{} ({})", self.item.url, name),
            _ => f.write_str(&self.item.url),
        }
    }
}
