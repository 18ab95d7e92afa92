use chrono::{DateTime, Duration, Utc};

/// Decides when the next automatic update check is due.
#[derive(Debug, Clone, Default)]
pub struct AutoChecker {
    check_interval_days: u32,
    last_check_date: Option<DateTime<Utc>>,
    is_last_check_date_changed: bool,
}

impl AutoChecker {
    pub fn new(check_interval_days: u32, last_check_date: Option<DateTime<Utc>>) -> Self {
        Self {
            check_interval_days,
            last_check_date,
            is_last_check_date_changed: false,
        }
    }

    /// Zero disables automatic checks.
    pub fn set_check_interval_days(&mut self, days: u32) {
        self.check_interval_days = days;
    }

    pub fn set_last_check_date(&mut self, date: Option<DateTime<Utc>>) {
        self.last_check_date = date;
    }

    pub fn last_check_date(&self) -> Option<DateTime<Utc>> {
        self.last_check_date
    }

    pub fn is_last_check_date_changed(&self) -> bool {
        self.is_last_check_date_changed
    }

    pub fn reset_changed_flag(&mut self) {
        self.is_last_check_date_changed = false;
    }

    pub fn next_check_at(&self) -> Option<DateTime<Utc>> {
        if self.check_interval_days == 0 {
            return None;
        }

        let interval = Duration::days(i64::from(self.check_interval_days));
        Some(
            self.last_check_date
                .map_or(DateTime::<Utc>::MIN_UTC, |x| x + interval),
        )
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_check_at().is_some_and(|x| x <= now)
    }

    pub fn handle_check_finished(&mut self, now: DateTime<Utc>) {
        self.last_check_date = Some(now);
        self.is_last_check_date_changed = true;
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn date(day: u32) -> DateTime<Utc> {
        format!("2024-03-{day:02}T12:00:00Z").parse().unwrap()
    }

    #[rstest]
    #[case(0, None, 30, false)]
    #[case(1, None, 1, true)]
    #[case(7, Some(1), 7, false)]
    #[case(7, Some(1), 8, true)]
    #[case(7, Some(1), 20, true)]
    fn due_after_interval(
        #[case] days: u32,
        #[case] last: Option<u32>,
        #[case] now: u32,
        #[case] expected: bool,
    ) {
        let checker = AutoChecker::new(days, last.map(date));
        assert_eq!(checker.is_due(date(now)), expected);
    }

    #[test]
    fn finished_check_moves_schedule() {
        let mut checker = AutoChecker::new(2, None);
        assert!(!checker.is_last_check_date_changed());

        checker.handle_check_finished(date(10));

        assert!(checker.is_last_check_date_changed());
        assert_eq!(checker.last_check_date(), Some(date(10)));
        assert_eq!(checker.next_check_at(), Some(date(12)));
        assert!(!checker.is_due(date(11)));

        checker.reset_changed_flag();
        assert!(!checker.is_last_check_date_changed());

        checker.set_check_interval_days(0);
        assert_eq!(checker.next_check_at(), None);
    }

    #[test]
    fn reloaded_date_does_not_raise_flag() {
        let mut checker = AutoChecker::new(3, None);
        assert!(checker.is_due(date(1)));

        checker.set_last_check_date(Some(date(5)));

        assert!(!checker.is_last_check_date_changed());
        assert_eq!(checker.next_check_at(), Some(date(8)));
        assert!(!checker.is_due(date(7)));
    }
}
