use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// List entry with a stable id for drag and drop reordering.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct IdItem<T> {
    id: usize,
    pub item: T,
    pub active: bool,
}

impl<T> IdItem<T> {
    pub fn enabled_list(items: impl IntoIterator<Item = T>) -> Vec<IdItem<T>> {
        let mut list = vec![];
        for item in items {
            list.push_item(item, true);
        }
        list
    }
}

impl<T> Hash for IdItem<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

pub trait ItemList<T> {
    fn push_item(&mut self, item: T, active: bool);

    /// Appends missing items as disabled, keeping the stored order.
    fn merge_missing(&mut self, all: impl IntoIterator<Item = T>)
    where
        T: PartialEq;

    /// Enabled items in their current order.
    fn enabled(&self) -> Vec<T>
    where
        T: Clone;
}

impl<T> ItemList<T> for Vec<IdItem<T>> {
    fn push_item(&mut self, item: T, active: bool) {
        let id = self.iter().map(|x| x.id + 1).max().unwrap_or(0);
        self.push(IdItem { id, item, active });
    }

    fn merge_missing(&mut self, all: impl IntoIterator<Item = T>)
    where
        T: PartialEq,
    {
        for item in all {
            if !self.iter().any(|x| x.item == item) {
                self.push_item(item, false);
            }
        }
    }

    fn enabled(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter()
            .filter_map(|x| x.active.then(|| x.item.clone()))
            .collect()
    }
}
