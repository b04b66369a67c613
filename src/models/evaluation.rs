use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const SCALE_MIN: u8 = 1;
pub const SCALE_MAX: u8 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SectionKey {
    #[serde(rename = "self")]
    SelfReview,
    Peer,
    Leader,
    Reference,
}

impl SectionKey {
    pub const ORDER: [SectionKey; 4] = [
        SectionKey::SelfReview,
        SectionKey::Peer,
        SectionKey::Leader,
        SectionKey::Reference,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionKey::SelfReview => "self",
            SectionKey::Peer => "peer",
            SectionKey::Leader => "leader",
            SectionKey::Reference => "reference",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ORDER
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(value.trim()))
    }

    pub fn has_colleagues(self) -> bool {
        matches!(self, SectionKey::Peer | SectionKey::Leader)
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Scale,
    Text,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub text: String,
    #[serde(default = "default_required")]
    pub required: bool,
}

impl Question {
    pub fn scale(id: &str, text: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: QuestionType::Scale,
            text: text.to_string(),
            required: true,
        }
    }

    pub fn text(id: &str, text: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: QuestionType::Text,
            text: text.to_string(),
            required: true,
        }
    }

    pub fn accepts(&self, value: &AnswerValue) -> bool {
        match (self.kind, value) {
            (QuestionType::Scale, AnswerValue::Scale(score)) => {
                (SCALE_MIN..=SCALE_MAX).contains(score)
            }
            (QuestionType::Text, AnswerValue::Text(_)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub key: SectionKey,
    pub title: String,
    pub icon: String,
    pub questions: Vec<Question>,
}

impl Section {
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn required_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|question| question.required)
    }
}

/// The fixed, ordered list of wizard sections.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SectionCatalog {
    sections: Vec<Section>,
}

impl Default for SectionCatalog {
    fn default() -> Self {
        Self {
            sections: vec![
                Section {
                    key: SectionKey::SelfReview,
                    title: "Autoavaliação".to_string(),
                    icon: "user".to_string(),
                    questions: vec![
                        Question::scale("ownership", "Senso de dono e responsabilidade"),
                        Question::scale("resilience", "Resiliência diante de adversidades"),
                        Question::scale("teamwork", "Organização e trabalho em equipe"),
                        Question::scale("learning", "Capacidade de aprender"),
                        Question::text("selfJustification", "Justifique sua autoavaliação"),
                    ],
                },
                Section {
                    key: SectionKey::Peer,
                    title: "Avaliação de Pares".to_string(),
                    icon: "users".to_string(),
                    questions: vec![
                        Question::scale("deliveryScore", "Qualidade e pontualidade das entregas"),
                        Question::scale(
                            "collaborationScore",
                            "Colaboração e trabalho em equipe",
                        ),
                        Question::text("strengths", "Pontos fortes"),
                        Question::text("improvements", "Pontos de melhoria"),
                    ],
                },
                Section {
                    key: SectionKey::Leader,
                    title: "Avaliação de Líderes".to_string(),
                    icon: "crown".to_string(),
                    questions: vec![
                        Question::scale("deliveryScore", "Qualidade e pontualidade das entregas"),
                        Question::scale(
                            "proactivityScore",
                            "Proatividade e iniciativa na resolução de problemas",
                        ),
                        Question::scale(
                            "collaborationScore",
                            "Colaboração e trabalho em equipe",
                        ),
                        Question::scale("skillScore", "Habilidades técnicas e de negócio"),
                        Question::text(
                            "justification",
                            "Justificativa ou observações gerais sobre o desempenho",
                        ),
                    ],
                },
                Section {
                    key: SectionKey::Reference,
                    title: "Indicação de Referências".to_string(),
                    icon: "star".to_string(),
                    questions: Vec::new(),
                },
            ],
        }
    }
}

impl SectionCatalog {
    /// Replaces the self-evaluation questions with criteria loaded from the backend.
    pub fn with_self_criteria(mut self, criteria: &[Criterion]) -> Self {
        if criteria.is_empty() {
            return self;
        }
        if let Some(section) = self.section_mut(SectionKey::SelfReview) {
            section.questions = criteria.iter().map(Criterion::to_question).collect();
        }
        self
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    pub fn section(&self, key: SectionKey) -> Option<&Section> {
        self.sections.iter().find(|section| section.key == key)
    }

    pub fn index_of(&self, key: SectionKey) -> Option<usize> {
        self.sections.iter().position(|section| section.key == key)
    }

    fn section_mut(&mut self, key: SectionKey) -> Option<&mut Section> {
        self.sections.iter_mut().find(|section| section.key == key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Criterion {
    fn to_question(&self) -> Question {
        let text = match self.description.as_deref().map(str::trim) {
            Some(description) if !description.is_empty() => {
                format!("{}: {}", self.name, description)
            }
            _ => self.name.clone(),
        };
        Question {
            id: self.id.clone(),
            kind: QuestionType::Scale,
            text,
            required: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AnswerValue {
    Scale(u8),
    Text(String),
}

impl AnswerValue {
    pub fn is_answered(&self) -> bool {
        match self {
            AnswerValue::Scale(score) => (SCALE_MIN..=SCALE_MAX).contains(score),
            AnswerValue::Text(text) => !text.trim().is_empty(),
        }
    }
}

pub type AnswerSet = BTreeMap<String, AnswerValue>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceIndication {
    pub colleague_id: String,
    pub justification: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Colleague {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub working_together_since: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeamRoster {
    #[serde(default)]
    pub peers: Vec<Colleague>,
    #[serde(default)]
    pub leaders: Vec<Colleague>,
    /// How many wizard sections the backend has opened for this cycle.
    #[serde(default)]
    pub available_sections: Option<usize>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SectionStatus {
    NotStarted,
    InProgress,
    Complete,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerItem {
    pub question_id: String,
    pub value: AnswerValue,
}

impl AnswerItem {
    pub fn from_set(answers: &AnswerSet) -> Vec<AnswerItem> {
        answers
            .iter()
            .map(|(question_id, value)| AnswerItem {
                question_id: question_id.clone(),
                value: value.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelfEvaluationPayload {
    pub cycle_id: String,
    pub evaluator_id: String,
    pub answers: Vec<AnswerItem>,
}

/// Shared by the peer and leader endpoints; one payload per rated colleague.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ColleagueEvaluationPayload {
    pub cycle_id: String,
    pub evaluator_id: String,
    pub evaluated_user_id: String,
    pub answers: Vec<AnswerItem>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReferencesPayload {
    pub cycle_id: String,
    pub indicator_id: String,
    pub references: Vec<ReferenceIndication>,
}
