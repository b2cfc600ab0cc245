//! Request-side data model.
//!
//! These types describe what a learner submits for each practice task and
//! which criterion set applies when a submission is band-scored.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PipelineError;

/// Every operation the pipeline can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    GenerateReadingQuestions,
    GenerateListeningQuestions,
    EvaluateReading,
    EvaluateListening,
    EvaluateWriting,
    EvaluateSpeaking,
    TranscribeSpeech,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::GenerateReadingQuestions => "generate_reading_questions",
            TaskKind::GenerateListeningQuestions => "generate_listening_questions",
            TaskKind::EvaluateReading => "evaluate_reading",
            TaskKind::EvaluateListening => "evaluate_listening",
            TaskKind::EvaluateWriting => "evaluate_writing",
            TaskKind::EvaluateSpeaking => "evaluate_speaking",
            TaskKind::TranscribeSpeech => "transcribe_speech",
        }
    }

    /// User-facing message when required input is missing.
    pub fn required_fields_message(&self) -> &'static str {
        match self {
            TaskKind::GenerateReadingQuestions => "Passage is required",
            TaskKind::GenerateListeningQuestions => "Transcript is required",
            TaskKind::EvaluateReading => "Passage, questions, and answers are required",
            TaskKind::EvaluateListening => "Transcript, questions, and answers are required",
            TaskKind::EvaluateWriting => "Topic and essay are required",
            TaskKind::EvaluateSpeaking => "Topic and transcript are required",
            TaskKind::TranscribeSpeech => "Audio file is required",
        }
    }

    /// User-facing message when the model service fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            TaskKind::GenerateReadingQuestions | TaskKind::GenerateListeningQuestions => {
                "Failed to generate questions"
            }
            TaskKind::EvaluateReading | TaskKind::EvaluateListening => "Failed to evaluate answers",
            TaskKind::EvaluateWriting => "Failed to evaluate essay",
            TaskKind::EvaluateSpeaking => "Failed to evaluate speech",
            TaskKind::TranscribeSpeech => "Failed to transcribe audio",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two comprehension skills that share question generation and
/// open-answer evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comprehension {
    Reading,
    Listening,
}

impl Comprehension {
    /// What the source text is called in prompts.
    pub fn source_label(&self) -> &'static str {
        match self {
            Comprehension::Reading => "passage",
            Comprehension::Listening => "transcript",
        }
    }
}

impl fmt::Display for Comprehension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comprehension::Reading => write!(f, "reading"),
            Comprehension::Listening => write!(f, "listening"),
        }
    }
}

/// The fixed criterion key set for a band-scored task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rubric {
    Writing,
    Speaking,
}

/// Band assigned to every criterion when a reply cannot be parsed.
pub const FALLBACK_BAND: u8 = 6;

const WRITING_CRITERIA: [&str; 4] = [
    "task_achievement",
    "coherence_cohesion",
    "lexical_resource",
    "grammatical_range_accuracy",
];

const SPEAKING_CRITERIA: [&str; 4] = [
    "fluency_coherence",
    "lexical_resource",
    "grammatical_range_accuracy",
    "pronunciation",
];

impl Rubric {
    pub fn criteria(&self) -> &'static [&'static str] {
        match self {
            Rubric::Writing => &WRITING_CRITERIA,
            Rubric::Speaking => &SPEAKING_CRITERIA,
        }
    }

    /// Human-readable criterion names, in the same order as [`Rubric::criteria`].
    pub fn criterion_titles(&self) -> &'static [&'static str] {
        match self {
            Rubric::Writing => &[
                "Task Achievement / Task Response",
                "Coherence and Cohesion",
                "Lexical Resource",
                "Grammatical Range and Accuracy",
            ],
            Rubric::Speaking => &[
                "Fluency and Coherence",
                "Lexical Resource",
                "Grammatical Range and Accuracy",
                "Pronunciation",
            ],
        }
    }
}

/// An uploaded audio recording.
#[derive(Clone, Default)]
pub struct AudioClip {
    pub data: Vec<u8>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioClip")
            .field("bytes", &self.data.len())
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// A single learner request, tagged by operation.
#[derive(Debug, Clone)]
pub enum EvaluationRequest {
    /// Generate comprehension questions from a passage or transcript.
    GenerateQuestions { skill: Comprehension, text: String },
    /// Evaluate free-text answers to comprehension questions.
    EvaluateAnswers {
        skill: Comprehension,
        text: String,
        questions: Vec<String>,
        answers: Vec<String>,
    },
    /// Band-score an essay.
    EvaluateWriting { topic: String, essay: String },
    /// Band-score a spoken response from its transcript.
    EvaluateSpeaking { topic: String, transcript: String },
    /// Turn a recording into text.
    TranscribeSpeech { audio: AudioClip },
}

impl EvaluationRequest {
    pub fn kind(&self) -> TaskKind {
        match self {
            EvaluationRequest::GenerateQuestions { skill, .. } => match skill {
                Comprehension::Reading => TaskKind::GenerateReadingQuestions,
                Comprehension::Listening => TaskKind::GenerateListeningQuestions,
            },
            EvaluationRequest::EvaluateAnswers { skill, .. } => match skill {
                Comprehension::Reading => TaskKind::EvaluateReading,
                Comprehension::Listening => TaskKind::EvaluateListening,
            },
            EvaluationRequest::EvaluateWriting { .. } => TaskKind::EvaluateWriting,
            EvaluationRequest::EvaluateSpeaking { .. } => TaskKind::EvaluateSpeaking,
            EvaluationRequest::TranscribeSpeech { .. } => TaskKind::TranscribeSpeech,
        }
    }

    /// Check that every required field is present and non-blank.
    ///
    /// Every question must be non-blank. Individual answers may be blank;
    /// they are rendered as "No answer".
    pub fn validate(&self) -> Result<(), PipelineError> {
        let complete = match self {
            EvaluationRequest::GenerateQuestions { text, .. } => is_present(text),
            EvaluationRequest::EvaluateAnswers {
                text,
                questions,
                answers,
                ..
            } => {
                is_present(text)
                    && !questions.is_empty()
                    && questions.iter().all(|q| is_present(q))
                    && !answers.is_empty()
            }
            EvaluationRequest::EvaluateWriting { topic, essay } => {
                is_present(topic) && is_present(essay)
            }
            EvaluationRequest::EvaluateSpeaking { topic, transcript } => {
                is_present(topic) && is_present(transcript)
            }
            EvaluationRequest::TranscribeSpeech { audio } => !audio.data.is_empty(),
        };

        if complete {
            Ok(())
        } else {
            Err(PipelineError::missing_fields(self.kind()))
        }
    }
}

fn is_present(s: &str) -> bool {
    !s.trim().is_empty()
}
