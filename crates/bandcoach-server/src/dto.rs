//! Request bodies, one per JSON route.
//!
//! Every field is optional on the wire so that a missing field reaches the
//! pipeline's validation and yields the operation's own message.

use serde::Deserialize;

use bandcoach_core::model::{Comprehension, EvaluationRequest};

#[derive(Debug, Default, Deserialize)]
pub struct GenerateReadingBody {
    pub passage: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateListeningBody {
    pub transcript: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReadingAnswersBody {
    pub passage: Option<String>,
    pub questions: Option<Vec<String>>,
    pub answers: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListeningAnswersBody {
    pub transcript: Option<String>,
    pub questions: Option<Vec<String>>,
    pub answers: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WritingBody {
    pub topic: Option<String>,
    pub essay: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SpeakingBody {
    pub topic: Option<String>,
    pub transcript: Option<String>,
}

impl From<GenerateReadingBody> for EvaluationRequest {
    fn from(body: GenerateReadingBody) -> Self {
        EvaluationRequest::GenerateQuestions {
            skill: Comprehension::Reading,
            text: body.passage.unwrap_or_default(),
        }
    }
}

impl From<GenerateListeningBody> for EvaluationRequest {
    fn from(body: GenerateListeningBody) -> Self {
        EvaluationRequest::GenerateQuestions {
            skill: Comprehension::Listening,
            text: body.transcript.unwrap_or_default(),
        }
    }
}

impl From<ReadingAnswersBody> for EvaluationRequest {
    fn from(body: ReadingAnswersBody) -> Self {
        EvaluationRequest::EvaluateAnswers {
            skill: Comprehension::Reading,
            text: body.passage.unwrap_or_default(),
            questions: body.questions.unwrap_or_default(),
            answers: body.answers.unwrap_or_default(),
        }
    }
}

impl From<ListeningAnswersBody> for EvaluationRequest {
    fn from(body: ListeningAnswersBody) -> Self {
        EvaluationRequest::EvaluateAnswers {
            skill: Comprehension::Listening,
            text: body.transcript.unwrap_or_default(),
            questions: body.questions.unwrap_or_default(),
            answers: body.answers.unwrap_or_default(),
        }
    }
}

impl From<WritingBody> for EvaluationRequest {
    fn from(body: WritingBody) -> Self {
        EvaluationRequest::EvaluateWriting {
            topic: body.topic.unwrap_or_default(),
            essay: body.essay.unwrap_or_default(),
        }
    }
}

impl From<SpeakingBody> for EvaluationRequest {
    fn from(body: SpeakingBody) -> Self {
        EvaluationRequest::EvaluateSpeaking {
            topic: body.topic.unwrap_or_default(),
            transcript: body.transcript.unwrap_or_default(),
        }
    }
}
