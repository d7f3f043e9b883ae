//! Day focus operations.

use super::{Outcome, PlanningService};
use crate::models::DayFocus;
use crate::workflow::{Category, Validation, Violation};
use crate::Result;
use chrono::NaiveDate;

impl PlanningService {
    /// Every focus entry of a year, ordered by date.
    pub fn get_year_focus(&self, year: i32) -> Result<Vec<DayFocus>> {
        self.storage.load_year_focus(year)
    }

    /// Set the focus of one day, replacing any previous entry.
    pub fn save_day_focus(&mut self, entry: DayFocus) -> Result<Outcome<DayFocus>> {
        if let Some(theme_id) = &entry.theme_id {
            let themes = self.storage.load_themes()?;
            if !themes.iter().any(|t| &t.id == theme_id) {
                return Ok(Outcome::rejected(Validation::rejected(Violation::error(
                    "theme-not-found",
                    Category::Hierarchy,
                    format!("Theme '{}' does not exist", theme_id),
                ))));
            }
        }
        self.storage.save_day_focus(&entry)?;
        Ok(Outcome::accepted(entry))
    }

    /// Remove the focus entry of one day. Fails with `NotFound` if the day
    /// has none.
    pub fn clear_day_focus(&mut self, date: NaiveDate) -> Result<Outcome<NaiveDate>> {
        self.storage.clear_day_focus(date)?;
        Ok(Outcome::accepted(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    #[test]
    fn test_day_focus_lifecycle() {
        let env = TestEnv::new();
        let mut service = env.service();
        service.create_theme("Career", "#6366f1").unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        let mut entry = DayFocus::new(date);
        entry.theme_id = Some("C".to_string());
        entry.text = "Write the design doc".to_string();
        assert!(service.save_day_focus(entry.clone()).unwrap().success);
        assert_eq!(service.get_year_focus(2026).unwrap(), vec![entry]);

        service.clear_day_focus(date).unwrap();
        assert!(service.get_year_focus(2026).unwrap().is_empty());
        assert!(service.clear_day_focus(date).unwrap_err().is_not_found());
    }

    #[test]
    fn test_day_focus_with_unknown_theme() {
        let env = TestEnv::new();
        let mut service = env.service();
        let mut entry = DayFocus::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        entry.theme_id = Some("XX".to_string());
        let outcome = service.save_day_focus(entry).unwrap();
        assert_eq!(outcome.rule_ids(), vec!["theme-not-found"]);
        assert!(service.get_year_focus(2026).unwrap().is_empty());
    }
}
