//! Prompt composition for the four prompted task kinds.
//!
//! Composition is pure string templating: the same task always yields the
//! same prompt. Learner-supplied text is embedded verbatim between section
//! markers so the model can tell instructions from subject matter.

use serde::{Deserialize, Serialize};

use crate::model::{Comprehension, EvaluationRequest, Rubric};
use crate::parser::MAX_QUESTIONS;
use crate::traits::ResponseFormat;

/// Temperature for question generation, where varied phrasing is welcome.
pub const GENERATION_TEMPERATURE: f64 = 0.7;

/// Temperature for evaluations, kept low for reproducible scoring.
pub const EVALUATION_TEMPERATURE: f64 = 0.3;

/// Shown in place of a blank or missing answer.
const NO_ANSWER: &str = "No answer";

/// A task that needs a prompt, borrowing the learner's input.
#[derive(Debug, Clone, Copy)]
pub enum PromptTask<'a> {
    QuestionGeneration {
        skill: Comprehension,
        text: &'a str,
    },
    AnswerEvaluation {
        skill: Comprehension,
        text: &'a str,
        questions: &'a [String],
        answers: &'a [String],
    },
    EssayEvaluation {
        topic: &'a str,
        essay: &'a str,
    },
    SpeechEvaluation {
        topic: &'a str,
        transcript: &'a str,
    },
}

impl<'a> PromptTask<'a> {
    /// The prompt task for a request, or `None` for transcription, which
    /// sends audio rather than a prompt.
    pub fn from_request(request: &'a EvaluationRequest) -> Option<Self> {
        match request {
            EvaluationRequest::GenerateQuestions { skill, text } => {
                Some(PromptTask::QuestionGeneration { skill: *skill, text })
            }
            EvaluationRequest::EvaluateAnswers {
                skill,
                text,
                questions,
                answers,
            } => Some(PromptTask::AnswerEvaluation {
                skill: *skill,
                text,
                questions,
                answers,
            }),
            EvaluationRequest::EvaluateWriting { topic, essay } => {
                Some(PromptTask::EssayEvaluation { topic, essay })
            }
            EvaluationRequest::EvaluateSpeaking { topic, transcript } => {
                Some(PromptTask::SpeechEvaluation { topic, transcript })
            }
            EvaluationRequest::TranscribeSpeech { .. } => None,
        }
    }
}

/// A ready-to-send prompt plus its sampling policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedPrompt {
    pub system: String,
    pub user: String,
    pub temperature: f64,
    pub response_format: ResponseFormat,
}

/// Build the prompt for a task.
pub fn compose(task: &PromptTask<'_>) -> ComposedPrompt {
    match *task {
        PromptTask::QuestionGeneration { skill, text } => compose_question_generation(skill, text),
        PromptTask::AnswerEvaluation {
            skill,
            text,
            questions,
            answers,
        } => compose_answer_evaluation(skill, text, questions, answers),
        PromptTask::EssayEvaluation { topic, essay } => compose_criterion_evaluation(
            Rubric::Writing,
            "You are an IELTS writing examiner. Evaluate essays according to official IELTS criteria. Always respond with valid JSON.",
            "Evaluate this IELTS writing task.",
            topic,
            ("ESSAY", essay),
        ),
        PromptTask::SpeechEvaluation { topic, transcript } => compose_criterion_evaluation(
            Rubric::Speaking,
            "You are an IELTS speaking examiner. Evaluate responses according to official IELTS criteria. Always respond with valid JSON.",
            "Evaluate this IELTS speaking response.",
            topic,
            ("TRANSCRIPT", transcript),
        ),
    }
}

/// Wrap learner text in begin/end markers without altering it.
fn section(name: &str, body: &str) -> String {
    format!("<<<{name}>>>\n{body}\n<<<END {name}>>>")
}

fn compose_question_generation(skill: Comprehension, text: &str) -> ComposedPrompt {
    let (focus, marker) = match skill {
        Comprehension::Reading => ("main ideas, details, inference, and vocabulary", "PASSAGE"),
        Comprehension::Listening => ("main ideas, specific details, and inference", "TRANSCRIPT"),
    };

    let mut user = format!(
        "Based on the following {skill} {label}, generate {MAX_QUESTIONS} comprehension questions in IELTS style. \
         The questions should test understanding of {focus}. \
         Return only the questions, one per line, without numbering.\n\n",
        label = skill.source_label(),
    );
    user.push_str(&section(marker, text));
    user.push_str("\n\nQuestions:");

    ComposedPrompt {
        system: format!(
            "You are an IELTS {skill} test expert. Generate clear, well-structured comprehension questions."
        ),
        user,
        temperature: GENERATION_TEMPERATURE,
        response_format: ResponseFormat::Text,
    }
}

fn compose_answer_evaluation(
    skill: Comprehension,
    text: &str,
    questions: &[String],
    answers: &[String],
) -> ComposedPrompt {
    let marker = match skill {
        Comprehension::Reading => "PASSAGE",
        Comprehension::Listening => "TRANSCRIPT",
    };

    let pairs = questions
        .iter()
        .enumerate()
        .map(|(i, question)| {
            let answer = answers
                .get(i)
                .map(String::as_str)
                .filter(|a| !a.trim().is_empty())
                .unwrap_or(NO_ANSWER);
            format!("Q{}: {question}\nAnswer: {answer}", i + 1)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut user = format!(
        "Evaluate the following {skill} comprehension answers based on the {label}. Provide:\n\
         1. A score out of 100 (percentage)\n\
         2. Detailed feedback on each answer\n\
         3. Overall assessment\n\n",
        label = skill.source_label(),
    );
    user.push_str(&section(marker, text));
    user.push_str("\n\n");
    user.push_str(&section("QUESTIONS AND ANSWERS", &pairs));
    user.push_str("\n\nProvide your evaluation in a structured format.");

    ComposedPrompt {
        system: format!(
            "You are an IELTS {skill} test evaluator. Provide fair, constructive feedback and accurate scoring."
        ),
        user,
        temperature: EVALUATION_TEMPERATURE,
        response_format: ResponseFormat::Text,
    }
}

fn compose_criterion_evaluation(
    rubric: Rubric,
    system: &str,
    opening: &str,
    topic: &str,
    (marker, body): (&str, &str),
) -> ComposedPrompt {
    let mut user = format!("{opening} Provide:\n1. Overall band score (1-9)\n2. Scores for each criterion:\n");
    for title in rubric.criterion_titles() {
        user.push_str(&format!("   - {title} (1-9)\n"));
    }
    user.push_str("3. Detailed feedback explaining the scores\n");
    user.push_str("4. Specific suggestions for improvement\n\n");
    user.push_str(&section("TOPIC", topic));
    user.push_str("\n\n");
    user.push_str(&section(marker, body));
    user.push_str("\n\nFormat your response as JSON with the following structure:\n");
    user.push_str(&json_template(rubric));

    ComposedPrompt {
        system: system.to_string(),
        user,
        temperature: EVALUATION_TEMPERATURE,
        response_format: ResponseFormat::JsonObject,
    }
}

fn json_template(rubric: Rubric) -> String {
    let criteria = rubric
        .criteria()
        .iter()
        .map(|name| format!("    \"{name}\": <score 1-9>"))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "{{\n  \"score\": <overall score 1-9>,\n  \"criteria\": {{\n{criteria}\n  }},\n  \
         \"feedback\": \"<detailed feedback>\",\n  \
         \"suggestions\": [\"<suggestion 1>\", \"<suggestion 2>\", ...]\n}}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_generation_uses_high_temperature() {
        let prompt = compose(&PromptTask::QuestionGeneration {
            skill: Comprehension::Reading,
            text: "Paris is the capital of France.",
        });
        assert_eq!(prompt.temperature, GENERATION_TEMPERATURE);
        assert_eq!(prompt.response_format, ResponseFormat::Text);
        assert!(prompt.system.contains("IELTS reading test expert"));
        assert!(prompt
            .user
            .contains("<<<PASSAGE>>>\nParis is the capital of France.\n<<<END PASSAGE>>>"));
    }

    #[test]
    fn listening_generation_marks_transcript() {
        let prompt = compose(&PromptTask::QuestionGeneration {
            skill: Comprehension::Listening,
            text: "Welcome to the museum tour.",
        });
        assert!(prompt.system.contains("listening"));
        assert!(prompt.user.contains("<<<TRANSCRIPT>>>"));
        assert!(prompt.user.contains("listening transcript"));
    }

    #[test]
    fn learner_text_is_embedded_verbatim() {
        let essay = "  Line one with \"quotes\" and {braces}\n\tindented <<<END ESSAY>>>  ";
        let prompt = compose(&PromptTask::EssayEvaluation {
            topic: "Technology",
            essay,
        });
        assert!(prompt.user.contains(essay));
    }

    #[test]
    fn blank_and_missing_answers_become_no_answer() {
        let questions = vec!["Who?".to_string(), "Where?".to_string(), "When?".to_string()];
        let answers = vec!["Alice".to_string(), "  ".to_string()];
        let prompt = compose(&PromptTask::AnswerEvaluation {
            skill: Comprehension::Reading,
            text: "passage",
            questions: &questions,
            answers: &answers,
        });
        assert!(prompt.user.contains("Q1: Who?\nAnswer: Alice"));
        assert!(prompt.user.contains("Q2: Where?\nAnswer: No answer"));
        assert!(prompt.user.contains("Q3: When?\nAnswer: No answer"));
        assert_eq!(prompt.temperature, EVALUATION_TEMPERATURE);
    }

    #[test]
    fn essay_prompt_requests_json_with_writing_keys() {
        let prompt = compose(&PromptTask::EssayEvaluation {
            topic: "Cities",
            essay: "Cities are growing.",
        });
        assert_eq!(prompt.response_format, ResponseFormat::JsonObject);
        for key in Rubric::Writing.criteria() {
            assert!(prompt.user.contains(key), "missing {key}");
        }
        assert!(!prompt.user.contains("pronunciation"));
        assert!(prompt.system.contains("valid JSON"));
    }

    #[test]
    fn speech_prompt_requests_json_with_speaking_keys() {
        let prompt = compose(&PromptTask::SpeechEvaluation {
            topic: "Hometown",
            transcript: "I grew up near the sea.",
        });
        assert_eq!(prompt.response_format, ResponseFormat::JsonObject);
        assert!(prompt.user.contains("\"fluency_coherence\": <score 1-9>"));
        assert!(prompt.user.contains("<<<TOPIC>>>\nHometown\n<<<END TOPIC>>>"));
    }

    #[test]
    fn composition_is_deterministic() {
        let task = PromptTask::SpeechEvaluation {
            topic: "Travel",
            transcript: "I like trains.",
        };
        assert_eq!(compose(&task), compose(&task));
    }

    #[test]
    fn transcription_has_no_prompt() {
        let request = EvaluationRequest::TranscribeSpeech {
            audio: Default::default(),
        };
        assert!(PromptTask::from_request(&request).is_none());
    }
}
