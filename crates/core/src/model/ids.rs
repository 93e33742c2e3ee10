use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a learner, resolved upstream by authentication.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LearnerId(String);

/// Identifier of a lesson question.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

/// Identifier of the skill a question exercises.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            /// Creates a new identifier from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the underlying string value
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(LearnerId);
string_id!(QuestionId);
string_id!(SkillId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_debug_formats() {
        let id = QuestionId::new("q-1");
        assert_eq!(id.to_string(), "q-1");
        assert_eq!(format!("{id:?}"), "QuestionId(\"q-1\")");
        assert_eq!(SkillId::from("fractions").as_str(), "fractions");
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&LearnerId::new("user-7")).unwrap();
        assert_eq!(json, "\"user-7\"");
        let back: LearnerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, LearnerId::new("user-7"));
    }
}
