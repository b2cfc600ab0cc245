//! Parsers for model replies.
//!
//! All three are total: malformed output degrades to an empty list, an
//! absent score, or a fallback result. None of them returns an error.

use crate::model::Rubric;
use crate::results::{CriterionEvaluation, GeneratedQuestionSet};

/// Upper bound on generated questions kept per request.
pub const MAX_QUESTIONS: usize = 5;

// ---------------------------------------------------------------------------
// Question list
// ---------------------------------------------------------------------------

/// Turn a free-text block into at most [`MAX_QUESTIONS`] questions.
///
/// Lines that still start with an enumeration marker (`1.`, `2)`) are
/// dropped rather than stripped. The prompt asks for unnumbered output, so a
/// numbered line is treated as noise.
pub fn parse_question_list(raw: &str) -> GeneratedQuestionSet {
    let questions = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !starts_with_enumeration(line))
        .take(MAX_QUESTIONS)
        .map(String::from)
        .collect();

    GeneratedQuestionSet { questions }
}

/// `true` if the line begins with one or more digits followed by `.` or `)`.
fn starts_with_enumeration(line: &str) -> bool {
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    rest.len() < line.len() && (rest.starts_with('.') || rest.starts_with(')'))
}

// ---------------------------------------------------------------------------
// Percentage score
// ---------------------------------------------------------------------------

/// Find the first `<digits>%` in free-text feedback.
///
/// Only the first match counts. A match that overflows or exceeds 100 is
/// reported as absent rather than clamped.
pub fn parse_percentage(feedback: &str) -> Option<u32> {
    let bytes = feedback.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }

        if bytes.get(i) == Some(&b'%') {
            return feedback[start..i]
                .parse::<u32>()
                .ok()
                .filter(|score| *score <= 100);
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Structured result
// ---------------------------------------------------------------------------

/// Result of parsing a reply that was asked to be JSON.
///
/// Both arms carry a schema-conformant value; callers match to learn whether
/// the model complied.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    /// The reply parsed as requested and is passed through untouched.
    Parsed(T),
    /// The reply could not be parsed; the value was synthesized from it.
    Fallback(T),
}

impl<T> ParseOutcome<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, ParseOutcome::Fallback(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            ParseOutcome::Parsed(value) | ParseOutcome::Fallback(value) => value,
        }
    }
}

/// Parse a band-scored reply, falling back to neutral bands on failure.
///
/// A JSON object needs a numeric `score` and a `criteria` object of numeric
/// bands to parse. `null` feedback or suggestions read as empty, and any
/// other keys are carried along. A reply that parses is not range- or
/// key-checked here; see [`CriterionEvaluation::conforms_to`].
pub fn parse_criterion_result(raw: &str, rubric: Rubric) -> ParseOutcome<CriterionEvaluation> {
    match serde_json::from_str::<CriterionEvaluation>(raw) {
        Ok(result) => ParseOutcome::Parsed(result),
        Err(e) => {
            tracing::debug!("reply is not a {rubric:?} result: {e}");
            ParseOutcome::Fallback(CriterionEvaluation::fallback(rubric, raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FALLBACK_BAND;
    use crate::results::BandScore;

    #[test]
    fn questions_are_trimmed_and_blank_lines_dropped() {
        let raw = "\n  What is the main idea?  \n\n\tWhy did the author move?\r\n";
        let set = parse_question_list(raw);
        assert_eq!(
            set.questions,
            vec!["What is the main idea?", "Why did the author move?"]
        );
    }

    #[test]
    fn numbered_lines_are_dropped() {
        let raw = "1. What is the capital?\n2) Where is it?\nWhich river runs through it?\n10. Who?";
        let set = parse_question_list(raw);
        assert_eq!(set.questions, vec!["Which river runs through it?"]);
    }

    #[test]
    fn numbers_without_marker_are_kept() {
        let raw = "1990 was a big year. What happened?\n3 people attended. Who were they?";
        let set = parse_question_list(raw);
        assert_eq!(set.questions.len(), 2);
    }

    #[test]
    fn at_most_five_questions_in_order() {
        let raw = (1..=8)
            .map(|i| format!("Question number {i}?"))
            .collect::<Vec<_>>()
            .join("\n");
        let set = parse_question_list(&raw);
        assert_eq!(set.questions.len(), MAX_QUESTIONS);
        assert_eq!(set.questions[0], "Question number 1?");
        assert_eq!(set.questions[4], "Question number 5?");
    }

    #[test]
    fn duplicates_are_kept() {
        let set = parse_question_list("Why?\nWhy?");
        assert_eq!(set.questions, vec!["Why?", "Why?"]);
    }

    #[test]
    fn no_usable_lines_yields_empty_set() {
        assert!(parse_question_list("").is_empty());
        assert!(parse_question_list("1. a\n2. b\n   \n").is_empty());
    }

    #[test]
    fn no_question_starts_with_enumeration() {
        let raw = "1.One\nTwo\n3)Three\n  4. Four\nFive\n6 Six\nSeven\nEight";
        let set = parse_question_list(raw);
        assert!(set.questions.len() <= MAX_QUESTIONS);
        assert!(set
            .questions
            .iter()
            .all(|q| !q.is_empty() && !starts_with_enumeration(q)));
    }

    #[test]
    fn percentage_found_anywhere() {
        assert_eq!(parse_percentage("You scored 73%."), Some(73));
        assert_eq!(parse_percentage("73%"), Some(73));
        assert_eq!(parse_percentage("Overall (73%) is decent"), Some(73));
    }

    #[test]
    fn only_first_percentage_counts() {
        assert_eq!(
            parse_percentage("Q1 was 40% right, overall 80%"),
            Some(40)
        );
    }

    #[test]
    fn digits_not_followed_by_percent_are_skipped() {
        assert_eq!(parse_percentage("Answered 3 of 5 questions: 60%"), Some(60));
    }

    #[test]
    fn percentage_absent() {
        assert_eq!(parse_percentage("Good work overall."), None);
        assert_eq!(parse_percentage("100 percent"), None);
        assert_eq!(parse_percentage("% 50"), None);
        assert_eq!(parse_percentage(""), None);
    }

    #[test]
    fn zero_percent_is_a_score() {
        assert_eq!(parse_percentage("0% correct"), Some(0));
    }

    #[test]
    fn out_of_range_percentage_is_absent() {
        assert_eq!(parse_percentage("150% effort"), None);
        assert_eq!(parse_percentage("99999999999999999999%"), None);
    }

    #[test]
    fn percentage_after_multibyte_text() {
        assert_eq!(parse_percentage("Très bien — 85% correct"), Some(85));
    }

    #[test]
    fn malformed_writing_reply_falls_back() {
        let raw = "Here is my evaluation: {\"score\": 7, \"criteria\"";
        let outcome = parse_criterion_result(raw, Rubric::Writing);
        assert!(outcome.is_fallback());

        let result = outcome.into_inner();
        assert_eq!(result.overall_score, BandScore::new(FALLBACK_BAND));
        assert_eq!(result.criteria.len(), 4);
        for key in Rubric::Writing.criteria() {
            assert_eq!(result.criteria[*key], BandScore::new(6));
        }
        assert_eq!(result.feedback, raw);
        assert!(result.suggestions.is_empty());
    }

    #[test]
    fn wrong_structure_falls_back() {
        let outcome = parse_criterion_result("{}", Rubric::Speaking);
        assert!(outcome.is_fallback());
        assert_eq!(outcome.into_inner().feedback, "{}");

        let outcome = parse_criterion_result(r#"{"score": "seven"}"#, Rubric::Speaking);
        assert!(outcome.is_fallback());
    }

    #[test]
    fn fenced_json_falls_back() {
        let raw = "```json\n{\"score\": 7, \"criteria\": {}, \"feedback\": \"ok\"}\n```";
        assert!(parse_criterion_result(raw, Rubric::Writing).is_fallback());
    }

    #[test]
    fn valid_speaking_reply_round_trips() {
        let raw = r#"{
            "score": 7,
            "criteria": {
                "fluency_coherence": 7,
                "lexical_resource": 6,
                "grammatical_range_accuracy": 7,
                "pronunciation": 8
            },
            "feedback": "Clear and well organised.",
            "suggestions": ["Vary sentence openings", "Slow down slightly"],
            "band_explanation": "solid 7"
        }"#;
        let outcome = parse_criterion_result(raw, Rubric::Speaking);
        let ParseOutcome::Parsed(result) = outcome else {
            panic!("expected parsed result");
        };
        assert!(result.conforms_to(Rubric::Speaking));
        assert_eq!(result.suggestions.len(), 2);
        assert_eq!(result.extra["band_explanation"], "solid 7");

        let reserialized = serde_json::to_string(&result).unwrap();
        let again = parse_criterion_result(&reserialized, Rubric::Speaking);
        assert_eq!(again, ParseOutcome::Parsed(result));

        let original: serde_json::Value = serde_json::from_str(raw).unwrap();
        let echoed: serde_json::Value = serde_json::from_str(&reserialized).unwrap();
        assert_eq!(original, echoed);
    }

    #[test]
    fn parsed_values_are_not_corrected() {
        let raw = r#"{"score": 12, "criteria": {"made_up": 0}, "feedback": "odd"}"#;
        let outcome = parse_criterion_result(raw, Rubric::Writing);
        assert!(!outcome.is_fallback());

        let result = outcome.into_inner();
        assert_eq!(result.overall_score, BandScore::new(12));
        assert!(result.criteria.contains_key("made_up"));
        assert!(!result.conforms_to(Rubric::Writing));
        assert!(result.suggestions.is_empty());
    }

    #[test]
    fn null_suggestions_keep_model_bands() {
        let raw = r#"{
            "score": 7,
            "criteria": {
                "fluency_coherence": 7,
                "lexical_resource": 7,
                "grammatical_range_accuracy": 7,
                "pronunciation": 7
            },
            "feedback": "Good.",
            "suggestions": null
        }"#;
        let outcome = parse_criterion_result(raw, Rubric::Speaking);
        assert!(!outcome.is_fallback());

        let result = outcome.into_inner();
        assert_eq!(result.overall_score, BandScore::new(7));
        for key in Rubric::Speaking.criteria() {
            assert_eq!(result.criteria[*key], BandScore::new(7));
        }
        assert_eq!(result.feedback, "Good.");
        assert!(result.suggestions.is_empty());
    }

    #[test]
    fn string_bands_keep_model_values() {
        let raw = r#"{"score": "7", "criteria": {"task_achievement": "6.5"}, "feedback": "ok"}"#;
        let result = parse_criterion_result(raw, Rubric::Writing).into_inner();
        assert_eq!(result.overall_score, BandScore::new(7));
        assert_eq!(result.criteria["task_achievement"].as_f64(), Some(6.5));
        assert_eq!(result.feedback, "ok");
    }
}
