//! Result shapes returned to callers.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::model::{Rubric, FALLBACK_BAND};

/// Questions generated from a passage or transcript, in presentation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestionSet {
    pub questions: Vec<String>,
}

impl GeneratedQuestionSet {
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Free-text feedback on open answers, with a percentage when the model
/// mentioned one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeEvaluation {
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

/// A band value exactly as the model wrote it.
///
/// Stored as a JSON number so out-of-range or half-band values survive
/// untouched. A numeric string such as `"6.5"` is read as the number it
/// spells.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BandScore(serde_json::Number);

impl<'de> Deserialize<'de> for BandScore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawBand {
            Number(serde_json::Number),
            Text(String),
        }

        match RawBand::deserialize(deserializer)? {
            RawBand::Number(n) => Ok(BandScore(n)),
            RawBand::Text(s) => s
                .trim()
                .parse::<serde_json::Number>()
                .map(BandScore)
                .map_err(|_| D::Error::custom(format!("band is not a number: {s:?}"))),
        }
    }
}

impl BandScore {
    pub fn new(band: u8) -> Self {
        BandScore(serde_json::Number::from(band))
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.0.as_f64()
    }

    /// Whether the value lies on the 1–9 band scale.
    pub fn is_valid_band(&self) -> bool {
        self.as_f64().is_some_and(|v| (1.0..=9.0).contains(&v))
    }
}

impl From<u8> for BandScore {
    fn from(band: u8) -> Self {
        BandScore::new(band)
    }
}

/// A band-scored evaluation broken down by criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionEvaluation {
    /// Overall band. Travels under the `score` key the model is asked for.
    #[serde(rename = "score", alias = "overallScore", alias = "overall_score")]
    pub overall_score: BandScore,
    pub criteria: BTreeMap<String, BandScore>,
    #[serde(deserialize_with = "null_as_default")]
    pub feedback: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggestions: Vec<String>,
    /// Keys the model added beyond the rubric shape, echoed back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl CriterionEvaluation {
    /// Schema-conformant stand-in for a reply that could not be parsed.
    ///
    /// The raw reply becomes the feedback so nothing the model wrote is lost.
    pub fn fallback(rubric: Rubric, raw: &str) -> Self {
        let criteria = rubric
            .criteria()
            .iter()
            .map(|name| (name.to_string(), BandScore::new(FALLBACK_BAND)))
            .collect();

        Self {
            overall_score: BandScore::new(FALLBACK_BAND),
            criteria,
            feedback: raw.to_string(),
            suggestions: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Whether the result carries exactly the rubric's keys with every band
    /// on the 1–9 scale.
    pub fn conforms_to(&self, rubric: Rubric) -> bool {
        let expected = rubric.criteria();
        self.overall_score.is_valid_band()
            && self.criteria.len() == expected.len()
            && expected.iter().all(|name| {
                self.criteria
                    .get(*name)
                    .is_some_and(BandScore::is_valid_band)
            })
    }
}

/// Text recognised from an audio recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcription {
    pub transcript: String,
}

/// Whatever a pipeline run produced; serializes to the bare success body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EvaluationOutcome {
    Questions(GeneratedQuestionSet),
    Narrative(NarrativeEvaluation),
    Criterion(CriterionEvaluation),
    Transcript(Transcription),
}
