//! Request-body validation for the review and progress operations.
//!
//! Bodies arrive as JSON from the transport layer. Everything here runs before
//! the scheduler is involved: missing fields, wrong types and out-of-range
//! numbers become `RequestError`, and accepted values are normalized (for
//! example negative durations clamp to zero).

use serde::Deserialize;

use lesson_core::model::{AttemptInput, AvailableQuestion, LessonCompletion};

use crate::error::RequestError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttemptBody {
    question_id: Option<String>,
    skill_id: Option<String>,
    correct: Option<serde_json::Value>,
    time_to_complete_ms: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueueBody {
    available_questions: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LessonCompleteBody {
    xp_earned: Option<f64>,
    hearts_change: Option<i32>,
    badges_earned: Option<Vec<String>>,
}

fn required_id(value: Option<String>, field: &'static str) -> Result<String, RequestError> {
    match value {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(RequestError::MissingField(field)),
    }
}

/// Largest count every store can hold; `SQLite` integers are signed 64-bit.
pub const MAX_STORED_COUNT: u64 = i64::MAX as u64;

/// Clamp a JSON number to a whole count in `0..=MAX_STORED_COUNT`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn non_negative(value: f64, field: &'static str) -> Result<u64, RequestError> {
    if !value.is_finite() {
        return Err(RequestError::InvalidField {
            field,
            reason: "must be a finite number",
        });
    }
    // `as` saturates at u64::MAX.
    Ok((value.max(0.0).round() as u64).min(MAX_STORED_COUNT))
}

/// Parse a `review/attempt` body.
///
/// `questionId` and `skillId` must be non-empty strings and `correct` a
/// boolean; `timeToCompleteMs` defaults to 0 and is clamped to non-negative.
///
/// # Errors
///
/// Returns `RequestError` if the body is not JSON or a field is missing or invalid.
pub fn parse_attempt(body: &str) -> Result<AttemptInput, RequestError> {
    let body: AttemptBody = serde_json::from_str(body)?;

    let question_id = required_id(body.question_id, "questionId")?;
    let skill_id = required_id(body.skill_id, "skillId")?;
    let correct = match body.correct {
        Some(serde_json::Value::Bool(correct)) => correct,
        Some(_) => {
            return Err(RequestError::InvalidField {
                field: "correct",
                reason: "must be a boolean",
            });
        }
        None => return Err(RequestError::MissingField("correct")),
    };
    let time_to_complete_ms = non_negative(body.time_to_complete_ms.unwrap_or(0.0), "timeToCompleteMs")?;

    Ok(AttemptInput::new(
        question_id,
        skill_id,
        correct,
        time_to_complete_ms,
    ))
}

/// Parse a `review/queue` body into the caller's available questions.
///
/// # Errors
///
/// Returns `RequestError` if `availableQuestions` is missing, not an array, or
/// holds entries without `questionId`/`skillId`.
pub fn parse_queue(body: &str) -> Result<Vec<AvailableQuestion>, RequestError> {
    let body: QueueBody = serde_json::from_str(body)?;

    let value = match body.available_questions {
        Some(value @ serde_json::Value::Array(_)) => value,
        _ => return Err(RequestError::MissingField("availableQuestions")),
    };
    let questions: Vec<AvailableQuestion> = serde_json::from_value(value)?;

    if questions
        .iter()
        .any(|q| q.question_id.as_str().trim().is_empty() || q.skill_id.as_str().trim().is_empty())
    {
        return Err(RequestError::InvalidField {
            field: "availableQuestions",
            reason: "entries need a questionId and skillId",
        });
    }

    Ok(questions)
}

/// Parse a `progress/lesson-complete` body.
///
/// # Errors
///
/// Returns `RequestError` if `xpEarned` is missing or not a finite number.
pub fn parse_lesson_complete(body: &str) -> Result<LessonCompletion, RequestError> {
    let body: LessonCompleteBody = serde_json::from_str(body)?;

    let xp = body
        .xp_earned
        .ok_or(RequestError::MissingField("xpEarned"))?;
    let xp_earned = u32::try_from(non_negative(xp, "xpEarned")?).unwrap_or(u32::MAX);

    Ok(LessonCompletion {
        xp_earned,
        hearts_change: body.hearts_change.unwrap_or(0),
        badges_earned: body.badges_earned.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::model::{QuestionId, SkillId};

    #[test]
    fn attempt_body_is_validated_and_clamped() {
        let input = parse_attempt(
            r#"{"questionId":"q1","skillId":"add","correct":false,"timeToCompleteMs":-250}"#,
        )
        .unwrap();
        assert_eq!(input.question_id, QuestionId::new("q1"));
        assert_eq!(input.skill_id, SkillId::new("add"));
        assert!(!input.correct);
        assert_eq!(input.time_to_complete_ms, 0);

        let input = parse_attempt(r#"{"questionId":"q1","skillId":"add","correct":true}"#).unwrap();
        assert_eq!(input.time_to_complete_ms, 0);

        let input =
            parse_attempt(r#"{"questionId":"q1","skillId":"add","correct":true,"timeToCompleteMs":1234.6}"#)
                .unwrap();
        assert_eq!(input.time_to_complete_ms, 1235);
    }

    #[test]
    fn huge_durations_are_capped_to_storable_range() {
        let input =
            parse_attempt(r#"{"questionId":"q1","skillId":"add","correct":true,"timeToCompleteMs":1e19}"#)
                .unwrap();
        assert_eq!(input.time_to_complete_ms, MAX_STORED_COUNT);
        assert!(i64::try_from(input.time_to_complete_ms).is_ok());

        let err = parse_attempt(r#"{"questionId":"q1","skillId":"add","correct":true,"timeToCompleteMs":"slow"}"#)
            .unwrap_err();
        assert!(matches!(err, RequestError::Malformed(_)));
    }

    #[test]
    fn attempt_body_rejects_missing_or_mistyped_fields() {
        let err = parse_attempt(r#"{"skillId":"add","correct":true}"#).unwrap_err();
        assert!(matches!(err, RequestError::MissingField("questionId")));

        let err = parse_attempt(r#"{"questionId":"q","skillId":"","correct":true}"#).unwrap_err();
        assert!(matches!(err, RequestError::MissingField("skillId")));

        let err = parse_attempt(r#"{"questionId":"q","skillId":"s","correct":"yes"}"#).unwrap_err();
        assert!(matches!(
            err,
            RequestError::InvalidField {
                field: "correct",
                ..
            }
        ));

        let err = parse_attempt(r#"{"questionId":"q","skillId":"s"}"#).unwrap_err();
        assert!(matches!(err, RequestError::MissingField("correct")));

        assert!(matches!(
            parse_attempt("not json").unwrap_err(),
            RequestError::Malformed(_)
        ));
    }

    #[test]
    fn queue_body_requires_array() {
        let questions = parse_queue(
            r#"{"availableQuestions":[{"questionId":"q1","skillId":"a"},{"questionId":"q2","skillId":"b"}]}"#,
        )
        .unwrap();
        assert_eq!(
            questions,
            vec![AvailableQuestion::new("q1", "a"), AvailableQuestion::new("q2", "b")]
        );

        assert!(parse_queue(r#"{"availableQuestions":[]}"#).unwrap().is_empty());

        let err = parse_queue(r#"{"availableQuestions":"q1"}"#).unwrap_err();
        assert!(matches!(err, RequestError::MissingField("availableQuestions")));

        let err = parse_queue("{}").unwrap_err();
        assert!(matches!(err, RequestError::MissingField("availableQuestions")));

        let err = parse_queue(r#"{"availableQuestions":[{"questionId":"q1"}]}"#).unwrap_err();
        assert!(matches!(err, RequestError::Malformed(_)));
    }

    #[test]
    fn lesson_complete_body() {
        let completion = parse_lesson_complete(
            r#"{"xpEarned":-5,"heartsChange":-1,"badgesEarned":["first-lesson"]}"#,
        )
        .unwrap();
        assert_eq!(completion.xp_earned, 0);
        assert_eq!(completion.hearts_change, -1);
        assert_eq!(completion.badges_earned, vec!["first-lesson"]);

        let completion = parse_lesson_complete(r#"{"xpEarned":30}"#).unwrap();
        assert_eq!(completion.hearts_change, 0);
        assert!(completion.badges_earned.is_empty());

        let err = parse_lesson_complete(r#"{"heartsChange":1}"#).unwrap_err();
        assert!(matches!(err, RequestError::MissingField("xpEarned")));
    }
}
