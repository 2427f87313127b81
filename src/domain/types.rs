//! Shared enums mirrored from persistent storage.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Difficulty tier shown on catalog cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for CourseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CourseLevel::Beginner => "beginner",
            CourseLevel::Intermediate => "intermediate",
            CourseLevel::Advanced => "advanced",
        };
        f.write_str(label)
    }
}

/// Account role as issued by the authentication collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Learner,
    Instructor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_level_display() {
        assert_eq!(CourseLevel::Beginner.to_string(), "beginner");
        assert_eq!(CourseLevel::Advanced.to_string(), "advanced");
    }

    #[test]
    fn course_level_serde_round_trip() {
        let json = serde_json::to_string(&CourseLevel::Intermediate).expect("serialize");
        assert_eq!(json, "\"intermediate\"");
        let back: CourseLevel = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, CourseLevel::Intermediate);
    }
}
