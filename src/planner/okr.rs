//! Theme, objective and key result operations.
//!
//! Themes are stored together in one document, so every operation here
//! loads all themes, changes one of them and saves it back as one commit.

use super::{Outcome, PlanningService};
use crate::models::{KeyResult, LifeTheme, Objective, OkrStatus};
use crate::storage::ids;
use crate::workflow::okr as okr_rules;
use crate::workflow::Validation;
use crate::{Error, Result};
use serde::Deserialize;

/// Editable fields of a key result. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResultUpdate {
    pub description: Option<String>,
    pub start_value: Option<f64>,
    pub current_value: Option<f64>,
    pub target_value: Option<f64>,
}

impl PlanningService {
    /// All themes with their objective trees.
    pub fn list_themes(&self) -> Result<Vec<LifeTheme>> {
        self.storage.load_themes()
    }

    /// Create a theme; its id is derived from the name.
    pub fn create_theme(&mut self, name: &str, color: &str) -> Result<Outcome<LifeTheme>> {
        let mut theme = LifeTheme::new(String::new(), name.trim(), color);
        let validation = okr_rules::validate_theme(&theme);
        if !validation.is_accepted() {
            return Ok(Outcome::rejected(validation));
        }
        theme.id = self.storage.next_theme_id(&theme.name)?;
        self.storage
            .save_theme_with_message(&theme, &format!("Create theme {}", theme.id))?;
        tracing::info!(id = %theme.id, "theme created");
        Ok(Outcome::accepted(theme))
    }

    /// Rename or recolor a theme.
    pub fn update_theme(
        &mut self,
        id: &str,
        name: Option<&str>,
        color: Option<&str>,
    ) -> Result<Outcome<LifeTheme>> {
        let mut theme = self.theme(id)?;
        if let Some(name) = name {
            theme.name = name.trim().to_string();
        }
        if let Some(color) = color {
            theme.color = color.to_string();
        }
        let validation = okr_rules::validate_theme(&theme);
        if !validation.is_accepted() {
            return Ok(Outcome::rejected(validation));
        }
        self.storage
            .save_theme_with_message(&theme, &format!("Update theme {}", id))?;
        Ok(Outcome::accepted(theme))
    }

    /// Delete a theme and its objective tree. Refused while tasks use it.
    pub fn delete_theme(&mut self, id: &str) -> Result<Outcome<String>> {
        self.theme(id)?;
        let tasks = self.storage.load_all_tasks()?;
        let validation = okr_rules::validate_theme_deletion(id, &tasks);
        if !validation.is_accepted() {
            return Ok(Outcome::rejected(validation));
        }
        self.storage.delete_theme(id)?;
        tracing::info!(%id, "theme deleted");
        Ok(Outcome::accepted(id.to_string()))
    }

    /// Add an objective under a theme or another objective.
    pub fn create_objective(&mut self, parent_id: &str, title: &str) -> Result<Outcome<Objective>> {
        let validation = okr_rules::validate_okr_text("objective", title);
        if !validation.is_accepted() {
            return Ok(Outcome::rejected(validation));
        }

        let mut theme = self.theme(ids::theme_of(parent_id))?;
        let id = self.storage.next_objective_id(parent_id)?;
        let objective = Objective::new(id.as_str(), parent_id, title.trim());
        if theme.id == parent_id {
            theme.objectives.push(objective.clone());
        } else {
            theme
                .find_objective_mut(parent_id)
                .ok_or_else(|| Error::NotFound(format!("Objective not found: {}", parent_id)))?
                .objectives
                .push(objective.clone());
        }

        self.storage
            .save_theme_with_message(&theme, &format!("Create objective {}", id))?;
        Ok(Outcome::accepted(objective))
    }

    /// Change an objective's title.
    pub fn update_objective(&mut self, id: &str, title: &str) -> Result<Outcome<Objective>> {
        let validation = okr_rules::validate_okr_text("objective", title);
        if !validation.is_accepted() {
            return Ok(Outcome::rejected(validation));
        }
        let mut theme = self.theme(ids::theme_of(id))?;
        let objective = objective_mut(&mut theme, id)?;
        objective.title = title.trim().to_string();
        let updated = objective.clone();
        self.storage
            .save_theme_with_message(&theme, &format!("Update objective {}", id))?;
        Ok(Outcome::accepted(updated))
    }

    /// Remove an objective together with everything below it.
    pub fn delete_objective(&mut self, id: &str) -> Result<Outcome<String>> {
        let mut theme = self.theme(ids::theme_of(id))?;
        theme
            .remove_objective(id)
            .ok_or_else(|| Error::NotFound(format!("Objective not found: {}", id)))?;
        self.storage
            .save_theme_with_message(&theme, &format!("Delete objective {}", id))?;
        Ok(Outcome::accepted(id.to_string()))
    }

    /// Change an objective's status.
    ///
    /// Completing requires every nested objective and key result to be
    /// closed; the rejection lists each one still active.
    pub fn set_objective_status(&mut self, id: &str, status: OkrStatus) -> Result<Outcome<Objective>> {
        let mut theme = self.theme(ids::theme_of(id))?;
        let objective = objective_mut(&mut theme, id)?;
        let validation = okr_rules::validate_objective_status(objective, status);
        if !validation.is_accepted() {
            return Ok(Outcome::rejected(validation));
        }
        if objective.status == status {
            return Ok(Outcome::accepted(objective.clone()));
        }
        objective.status = status;
        let updated = objective.clone();
        self.storage
            .save_theme_with_message(&theme, &format!("Set objective {} {}", id, status))?;
        Ok(Outcome::accepted(updated))
    }

    /// Add a key result to an objective.
    pub fn create_key_result(
        &mut self,
        objective_id: &str,
        description: &str,
        start_value: f64,
        target_value: f64,
    ) -> Result<Outcome<KeyResult>> {
        let mut theme = self.theme(ids::theme_of(objective_id))?;
        let id = self.storage.next_key_result_id(objective_id)?;
        let mut key_result = KeyResult::new(id.as_str(), objective_id, description.trim());
        key_result.start_value = start_value;
        key_result.current_value = start_value;
        key_result.target_value = target_value;

        let mut validation = okr_rules::validate_okr_text("key result", description);
        validation.merge(okr_rules::validate_key_result_values(&key_result));
        if !validation.is_accepted() {
            return Ok(Outcome::rejected(validation));
        }

        objective_mut(&mut theme, objective_id)?
            .key_results
            .push(key_result.clone());
        self.storage
            .save_theme_with_message(&theme, &format!("Create key result {}", id))?;
        Ok(Outcome::accepted(key_result))
    }

    /// Change a key result's description or progress values.
    pub fn update_key_result(&mut self, id: &str, update: KeyResultUpdate) -> Result<Outcome<KeyResult>> {
        let mut theme = self.theme(ids::theme_of(id))?;
        let key_result = key_result_mut(&mut theme, id)?;

        let mut validation = Validation::accepted();
        if let Some(description) = &update.description {
            validation.merge(okr_rules::validate_okr_text("key result", description));
            key_result.description = description.trim().to_string();
        }
        if let Some(v) = update.start_value {
            key_result.start_value = v;
        }
        if let Some(v) = update.current_value {
            key_result.current_value = v;
        }
        if let Some(v) = update.target_value {
            key_result.target_value = v;
        }
        validation.merge(okr_rules::validate_key_result_values(key_result));
        if !validation.is_accepted() {
            return Ok(Outcome::rejected(validation));
        }

        let updated = key_result.clone();
        self.storage
            .save_theme_with_message(&theme, &format!("Update key result {}", id))?;
        Ok(Outcome::accepted(updated))
    }

    /// Remove a key result.
    pub fn delete_key_result(&mut self, id: &str) -> Result<Outcome<String>> {
        let mut theme = self.theme(ids::theme_of(id))?;
        theme
            .remove_key_result(id)
            .ok_or_else(|| Error::NotFound(format!("Key result not found: {}", id)))?;
        self.storage
            .save_theme_with_message(&theme, &format!("Delete key result {}", id))?;
        Ok(Outcome::accepted(id.to_string()))
    }

    /// Change a key result's status.
    pub fn set_key_result_status(&mut self, id: &str, status: OkrStatus) -> Result<Outcome<KeyResult>> {
        let mut theme = self.theme(ids::theme_of(id))?;
        let key_result = key_result_mut(&mut theme, id)?;
        let validation = okr_rules::validate_key_result_status(key_result, status);
        if !validation.is_accepted() {
            return Ok(Outcome::rejected(validation));
        }
        if key_result.status == status {
            return Ok(Outcome::accepted(key_result.clone()));
        }
        key_result.status = status;
        let updated = key_result.clone();
        self.storage
            .save_theme_with_message(&theme, &format!("Set key result {} {}", id, status))?;
        Ok(Outcome::accepted(updated))
    }

    fn theme(&self, id: &str) -> Result<LifeTheme> {
        self.storage
            .load_themes()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::NotFound(format!("Theme not found: {}", id)))
    }
}

fn objective_mut<'a>(theme: &'a mut LifeTheme, id: &str) -> Result<&'a mut Objective> {
    theme
        .find_objective_mut(id)
        .ok_or_else(|| Error::NotFound(format!("Objective not found: {}", id)))
}

fn key_result_mut<'a>(theme: &'a mut LifeTheme, id: &str) -> Result<&'a mut KeyResult> {
    theme
        .find_key_result_mut(id)
        .ok_or_else(|| Error::NotFound(format!("Key result not found: {}", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::NewTask;
    use crate::test_utils::TestEnv;
    use crate::workflow::Category;

    fn service_with_objective(env: &TestEnv) -> PlanningService {
        let mut service = env.service();
        service.create_theme("Health & Fitness", "#22c55e").unwrap();
        let outcome = service.create_objective("HF", "Get fit").unwrap();
        assert_eq!(outcome.value.unwrap().id, "HF.O1");
        service
    }

    #[test]
    fn test_theme_ids_from_names() {
        let env = TestEnv::new();
        let mut service = env.service();
        let hf = service.create_theme("Health & Fitness", "").unwrap().value.unwrap();
        let hf2 = service.create_theme("Home Finance", "").unwrap().value.unwrap();
        assert_eq!(hf.id, "HF");
        assert_eq!(hf2.id, "HF2");
        assert_eq!(service.list_themes().unwrap().len(), 2);
        assert_eq!(service.history(1).unwrap()[0].message, "Create theme HF2");
    }

    #[test]
    fn test_blank_theme_name_rejected() {
        let env = TestEnv::new();
        let mut service = env.service();
        let outcome = service.create_theme("  ", "").unwrap();
        assert_eq!(outcome.rule_ids(), vec!["title-required"]);
        assert!(service.list_themes().unwrap().is_empty());
    }

    #[test]
    fn test_update_theme() {
        let env = TestEnv::new();
        let mut service = service_with_objective(&env);
        let outcome = service.update_theme("HF", Some("Health"), Some("#000")).unwrap();
        let theme = outcome.value.unwrap();
        assert_eq!(theme.name, "Health");
        assert_eq!(theme.id, "HF");
        assert_eq!(theme.objectives.len(), 1);
        assert!(service.update_theme("XX", None, None).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_theme_with_tasks_rejected() {
        let env = TestEnv::new();
        let mut service = service_with_objective(&env);
        service
            .create_task(NewTask {
                theme_id: "HF".to_string(),
                title: "Run".to_string(),
                ..Default::default()
            })
            .unwrap();

        let outcome = service.delete_theme("HF").unwrap();
        assert_eq!(outcome.rule_ids(), vec!["theme-has-tasks"]);

        service.delete_task("HF-T1", None).unwrap();
        assert!(service.delete_theme("HF").unwrap().success);
        assert!(service.list_themes().unwrap().is_empty());
    }

    #[test]
    fn test_nested_objectives_and_key_results() {
        let env = TestEnv::new();
        let mut service = service_with_objective(&env);
        let nested = service.create_objective("HF.O1", "Run a marathon").unwrap();
        assert_eq!(nested.value.unwrap().id, "HF.O1.O1");
        let kr = service
            .create_key_result("HF.O1.O1", "Weekly km", 0.0, 40.0)
            .unwrap()
            .value
            .unwrap();
        assert_eq!(kr.id, "HF.O1.O1.KR1");

        let themes = service.list_themes().unwrap();
        let found = themes[0].find_key_result("HF.O1.O1.KR1").unwrap();
        assert_eq!(found.target_value, 40.0);
        assert!(service.create_objective("HF.O7", "Nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_key_result_progress_update() {
        let env = TestEnv::new();
        let mut service = service_with_objective(&env);
        service.create_key_result("HF.O1", "Weekly km", 0.0, 40.0).unwrap();
        let outcome = service
            .update_key_result(
                "HF.O1.KR1",
                KeyResultUpdate {
                    current_value: Some(10.0),
                    ..Default::default()
                },
            )
            .unwrap();
        let kr = outcome.value.unwrap();
        assert_eq!(kr.progress(), Some(25.0));
        assert_eq!(kr.description, "Weekly km");
    }

    #[test]
    fn test_complete_objective_with_active_key_result() {
        let env = TestEnv::new();
        let mut service = service_with_objective(&env);
        service.create_key_result("HF.O1", "Run 100km", 0.0, 100.0).unwrap();
        service.create_key_result("HF.O1", "Swim 10km", 0.0, 10.0).unwrap();
        service
            .set_key_result_status("HF.O1.KR1", OkrStatus::Completed)
            .unwrap();

        let outcome = service
            .set_objective_status("HF.O1", OkrStatus::Completed)
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].category, Category::Okr);
        assert!(outcome.violations[0].message.contains("HF.O1.KR2"));

        let themes = service.list_themes().unwrap();
        assert_eq!(
            themes[0].find_objective("HF.O1").unwrap().status,
            OkrStatus::Active
        );
    }

    #[test]
    fn test_objective_lifecycle() {
        let env = TestEnv::new();
        let mut service = service_with_objective(&env);

        let outcome = service.set_objective_status("HF.O1", OkrStatus::Archived).unwrap();
        assert_eq!(outcome.rule_ids(), vec!["invalid-transition"]);

        for status in [OkrStatus::Completed, OkrStatus::Archived, OkrStatus::Active] {
            let outcome = service.set_objective_status("HF.O1", status).unwrap();
            assert!(outcome.success, "{:?}", outcome.violations);
            assert_eq!(outcome.value.unwrap().status, status);
        }
    }

    #[test]
    fn test_delete_objective_and_key_result() {
        let env = TestEnv::new();
        let mut service = service_with_objective(&env);
        service.create_key_result("HF.O1", "km", 0.0, 10.0).unwrap();
        service.create_objective("HF.O1", "Nested").unwrap();

        service.delete_key_result("HF.O1.KR1").unwrap();
        assert!(service.delete_key_result("HF.O1.KR1").unwrap_err().is_not_found());

        service.delete_objective("HF.O1").unwrap();
        let themes = service.list_themes().unwrap();
        assert!(themes[0].objectives.is_empty());
        assert!(service.update_objective("HF.O1.O1", "x").unwrap_err().is_not_found());
    }
}
