use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    model::{validate_log, LoggingTypes, NewExerciseLog, Sets},
    types::{ExerciseId, UserId},
    validation::ValidationError,
};

/// Body of a log request. `performedAt` defaults to the time of the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogExerciseRequest {
    pub performed_at: Option<DateTime<Utc>>,
    pub sets: Sets,
}

impl LogExerciseRequest {
    pub fn into_new_log(
        self,
        user_id: UserId,
        exercise_id: ExerciseId,
        logging_types: &LoggingTypes,
    ) -> Result<NewExerciseLog, ValidationError> {
        let performed_at = self.performed_at.unwrap_or_else(Utc::now);
        validate_log(performed_at, &self.sets, logging_types)?;
        Ok(NewExerciseLog::new(user_id, exercise_id, performed_at, self.sets))
    }
}
