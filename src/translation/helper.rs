use crate::translation::TranslatorKind;

/// Chooses which translator to try for the current item.
///
/// Every item may try each enabled translator once. With forced rotation
/// consecutive items start on different translators.
#[derive(Debug, Default, Clone)]
pub struct TranslatorHelper {
    translators: Vec<TranslatorKind>,
    start_index: usize,
    current_index: usize,
    tries_left: usize,
}

impl TranslatorHelper {
    pub fn new(translators: Vec<TranslatorKind>) -> Self {
        let mut helper = Self::default();
        helper.load(translators);
        helper
    }

    pub fn load(&mut self, translators: Vec<TranslatorKind>) {
        self.translators = translators;
        self.start_index = 0;
        self.current_index = 0;
        self.tries_left = 0;
    }

    pub fn got_translators(&self) -> bool {
        !self.translators.is_empty()
    }

    pub fn new_item(&mut self, force_rotate: bool) {
        if self.translators.is_empty() {
            self.tries_left = 0;
            return;
        }

        self.start_index = if force_rotate {
            (self.start_index + 1) % self.translators.len()
        } else {
            0
        };
        self.current_index = self.start_index;
        self.tries_left = self.translators.len();
    }

    pub fn current(&self) -> Option<TranslatorKind> {
        if self.tries_left == 0 {
            return None;
        }
        self.translators.get(self.current_index).copied()
    }

    pub fn next(&mut self) -> Option<TranslatorKind> {
        if self.tries_left == 0 {
            return None;
        }
        self.tries_left -= 1;
        self.current_index = (self.current_index + 1) % self.translators.len();
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TranslatorKind::{Bing, Google};

    #[test]
    fn tries_every_translator_once() {
        let mut helper = TranslatorHelper::new(vec![Google, Bing]);
        assert_eq!(helper.current(), None);

        helper.new_item(false);
        assert_eq!(helper.current(), Some(Google));
        assert_eq!(helper.next(), Some(Bing));
        assert_eq!(helper.next(), None);
        assert_eq!(helper.next(), None);
        assert_eq!(helper.current(), None);
    }

    #[test]
    fn new_item_restarts_from_first() {
        let mut helper = TranslatorHelper::new(vec![Google, Bing]);
        helper.new_item(false);
        helper.next();

        helper.new_item(false);
        assert_eq!(helper.current(), Some(Google));
    }

    #[test]
    fn forced_rotation_advances_start() {
        let mut helper = TranslatorHelper::new(vec![Google, Bing]);

        helper.new_item(true);
        assert_eq!(helper.current(), Some(Bing));
        assert_eq!(helper.next(), Some(Google));
        assert_eq!(helper.next(), None);

        helper.new_item(true);
        assert_eq!(helper.current(), Some(Google));

        helper.new_item(true);
        assert_eq!(helper.current(), Some(Bing));
    }

    #[test]
    fn empty_helper_has_nothing_to_try() {
        let mut helper = TranslatorHelper::new(vec![]);
        assert!(!helper.got_translators());
        helper.new_item(true);
        assert_eq!(helper.current(), None);
        assert_eq!(helper.next(), None);
    }
}
