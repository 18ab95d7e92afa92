use imageproc::rect::Rect;

/// Selections thinner than this are treated as a click.
pub const MIN_SELECTION_SIZE: u32 = 3;
const HELP_MARGIN: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Process with the default languages.
    #[default]
    Default,
    /// Ask for languages before processing.
    Customize,
}

/// Placement of the help text on one screen.
#[derive(Debug, Clone, PartialEq)]
pub struct HelpRect {
    pub current: Rect,
    pub possible: Vec<Rect>,
}

impl HelpRect {
    fn new(screen: &Rect, help_size: (u32, u32)) -> Self {
        let width = help_size.0.clamp(1, screen.width());
        let height = help_size.1.clamp(1, screen.height());
        let margin_x = HELP_MARGIN.min((screen.width() - width) as i32 / 2);
        let margin_y = HELP_MARGIN.min((screen.height() - height) as i32 / 2);

        let left = screen.left() + margin_x;
        let right = screen.right() + 1 - margin_x - width as i32;
        let top = screen.top() + margin_y;
        let bottom = screen.bottom() + 1 - margin_y - height as i32;

        let possible: Vec<Rect> = [(left, top), (right, top), (left, bottom), (right, bottom)]
            .into_iter()
            .map(|(x, y)| Rect::at(x, y).of_size(width, height))
            .collect();

        Self {
            current: possible[0],
            possible,
        }
    }
}

/// Drag state of the capture overlay.
#[derive(Debug, Default)]
pub struct AreaSelector {
    screens: Vec<Rect>,
    help_size: (u32, u32),
    start: Option<(i32, i32)>,
    current: (i32, i32),
    mode: SelectionMode,
    help_rects: Vec<HelpRect>,
}

impl AreaSelector {
    pub fn new(screens: &[Rect], help_size: (u32, u32)) -> Self {
        let mut selector = Self::default();
        selector.set_screen_rects(screens, help_size);
        selector
    }

    pub fn set_screen_rects(&mut self, screens: &[Rect], help_size: (u32, u32)) {
        self.screens = screens.to_vec();
        self.help_size = help_size;
        self.help_rects = screens
            .iter()
            .map(|screen| HelpRect::new(screen, help_size))
            .collect();
        self.update_current_help_rects();
    }

    /// Starts a fresh selection with the cursor at `cursor`.
    pub fn activate(&mut self, cursor: (i32, i32)) {
        self.start = None;
        self.current = cursor;
        self.mode = SelectionMode::Default;
        self.update_current_help_rects();
    }

    pub fn press(&mut self, pos: (i32, i32), mode: SelectionMode) {
        self.start = Some(pos);
        self.current = pos;
        self.mode = mode;
        self.update_current_help_rects();
    }

    /// Returns whether the help rects moved.
    pub fn move_to(&mut self, pos: (i32, i32)) -> bool {
        self.current = pos;
        self.update_current_help_rects()
    }

    pub fn release(&mut self, pos: (i32, i32)) -> Option<(Rect, SelectionMode)> {
        self.current = pos;
        let selection = self.selection();
        self.start = None;
        self.update_current_help_rects();

        selection
            .filter(|x| x.width() >= MIN_SELECTION_SIZE && x.height() >= MIN_SELECTION_SIZE)
            .map(|x| (x, self.mode))
    }

    pub fn cancel(&mut self) {
        self.start = None;
    }

    pub fn is_selecting(&self) -> bool {
        self.start.is_some()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn help_rects(&self) -> &[HelpRect] {
        &self.help_rects
    }

    /// Current drag rectangle, normalized and clamped to the screen it started on.
    pub fn selection(&self) -> Option<Rect> {
        let start = self.start?;
        let rect = rect_from_points(start, self.current)?;

        match self.screens.iter().find(|x| contains_point(x, start)) {
            Some(screen) => rect.intersect(*screen),
            None => Some(rect),
        }
    }

    fn update_current_help_rects(&mut self) -> bool {
        let selection = self.selection();
        let cursor = self.current;
        let mut changed = false;

        for help in &mut self.help_rects {
            let free = help
                .possible
                .iter()
                .find(|x| {
                    !contains_point(x, cursor)
                        && selection.is_none_or(|selection| x.intersect(selection).is_none())
                })
                .unwrap_or(&help.possible[0]);

            if *free != help.current {
                help.current = *free;
                changed = true;
            }
        }

        changed
    }
}

/// Normalized rectangle from `a` to `b`, the far edge pixel excluded.
pub fn rect_from_points(a: (i32, i32), b: (i32, i32)) -> Option<Rect> {
    let left = a.0.min(b.0);
    let top = a.1.min(b.1);
    let width = a.0.abs_diff(b.0);
    let height = a.1.abs_diff(b.1);
    if width == 0 || height == 0 {
        return None;
    }
    Some(Rect::at(left, top).of_size(width, height))
}

pub fn contains_point(rect: &Rect, (x, y): (i32, i32)) -> bool {
    x >= rect.left() && x <= rect.right() && y >= rect.top() && y <= rect.bottom()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Rect {
        Rect::at(0, 0).of_size(1000, 800)
    }

    #[test]
    fn help_rects_fill_screen_corners() {
        let selector = AreaSelector::new(&[screen()], (200, 50));
        let help = &selector.help_rects()[0];

        assert_eq!(help.possible.len(), 4);
        assert_eq!(help.possible[0], Rect::at(20, 20).of_size(200, 50));
        assert_eq!(help.possible[3], Rect::at(780, 730).of_size(200, 50));
        assert_eq!(help.current, help.possible[0]);
    }

    #[test]
    fn help_rect_larger_than_screen_is_clamped() {
        let small = Rect::at(0, 0).of_size(100, 40);
        let selector = AreaSelector::new(&[small], (300, 60));
        let help = &selector.help_rects()[0];
        assert_eq!(help.current, Rect::at(0, 0).of_size(100, 40));
    }

    #[test]
    fn help_rect_moves_away_from_cursor() {
        let mut selector = AreaSelector::new(&[screen()], (200, 50));

        assert!(selector.move_to((50, 40)));
        assert_eq!(selector.help_rects()[0].current, Rect::at(780, 20).of_size(200, 50));

        assert!(!selector.move_to((60, 40)));

        assert!(selector.move_to((500, 400)));
        assert_eq!(selector.help_rects()[0].current, Rect::at(20, 20).of_size(200, 50));
    }

    #[test]
    fn help_rect_avoids_selection() {
        let mut selector = AreaSelector::new(&[screen()], (200, 50));
        selector.press((10, 10), SelectionMode::Default);
        selector.move_to((990, 100));

        // both top corners intersect the selection
        assert_eq!(selector.help_rects()[0].current, Rect::at(20, 730).of_size(200, 50));
    }

    #[test]
    fn help_rect_falls_back_to_first() {
        let mut selector = AreaSelector::new(&[screen()], (200, 50));
        selector.press((0, 0), SelectionMode::Default);
        selector.move_to((999, 799));

        assert_eq!(selector.help_rects()[0].current, Rect::at(20, 20).of_size(200, 50));
    }

    #[test]
    fn selection_is_normalized() {
        let mut selector = AreaSelector::new(&[screen()], (200, 50));
        selector.press((300, 200), SelectionMode::Customize);
        selector.move_to((100, 50));

        assert_eq!(selector.selection(), Some(Rect::at(100, 50).of_size(200, 150)));

        let released = selector.release((100, 50));
        assert_eq!(
            released,
            Some((Rect::at(100, 50).of_size(200, 150), SelectionMode::Customize))
        );
        assert!(!selector.is_selecting());
    }

    #[test]
    fn far_edge_is_excluded() {
        let rect = rect_from_points((20, 15), (10, 10)).unwrap();
        assert_eq!((rect.left(), rect.top()), (10, 10));
        assert_eq!((rect.width(), rect.height()), (10, 5));
        assert_eq!(rect.right(), 19);
        assert_eq!(rect_from_points((10, 10), (10, 20)), None);
    }

    #[test]
    fn selection_is_clamped_to_screen() {
        let mut selector = AreaSelector::new(&[screen()], (200, 50));
        selector.press((900, 700), SelectionMode::Default);

        let released = selector.release((1200, 900));
        assert_eq!(
            released,
            Some((Rect::at(900, 700).of_size(100, 100), SelectionMode::Default))
        );
    }

    #[test]
    fn click_is_not_a_selection() {
        let mut selector = AreaSelector::new(&[screen()], (200, 50));
        selector.press((100, 100), SelectionMode::Default);
        assert_eq!(selector.release((100, 100)), None);

        selector.press((100, 100), SelectionMode::Default);
        assert_eq!(selector.release((102, 300)), None);
    }

    #[test]
    fn cancel_drops_selection() {
        let mut selector = AreaSelector::new(&[screen()], (200, 50));
        selector.press((100, 100), SelectionMode::Default);
        selector.move_to((200, 200));
        selector.cancel();

        assert_eq!(selector.selection(), None);
        assert_eq!(selector.release((300, 300)), None);
    }

    #[test]
    fn activate_resets_state() {
        let mut selector = AreaSelector::new(&[screen()], (200, 50));
        selector.press((100, 100), SelectionMode::Customize);
        selector.activate((500, 500));

        assert!(!selector.is_selecting());
        assert_eq!(selector.mode(), SelectionMode::Default);
    }
}
