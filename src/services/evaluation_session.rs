//! In-progress evaluation wizard for one user in one cycle.
//!
//! Section completeness is derived from the current answers on every query,
//! so editing an answer can move a finished section back to in-progress.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use futures::future::join_all;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::evaluation::{
    AnswerItem, AnswerSet, AnswerValue, Colleague, ColleagueEvaluationPayload,
    ReferenceIndication, ReferencesPayload, Section, SectionCatalog, SectionKey, SectionStatus,
    SelfEvaluationPayload,
};
use crate::models::route::Route;
use crate::models::session::Session;
use crate::services::evaluation_service::EvaluationGateway;

/// One request of the final submission; acknowledged parts are not resent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubmissionPart {
    SelfReview,
    Peer(String),
    Leader(String),
    References,
}

impl fmt::Display for SubmissionPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionPart::SelfReview => f.write_str("self"),
            SubmissionPart::Peer(id) => write!(f, "peer:{id}"),
            SubmissionPart::Leader(id) => write!(f, "leader:{id}"),
            SubmissionPart::References => f.write_str("reference"),
        }
    }
}

enum PartPayload {
    SelfReview(SelfEvaluationPayload),
    Peer(ColleagueEvaluationPayload),
    Leader(ColleagueEvaluationPayload),
    References(ReferencesPayload),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SectionOverview {
    pub key: SectionKey,
    pub title: String,
    pub icon: String,
    pub status: SectionStatus,
    pub progress: u8,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ColleagueProgress {
    pub colleague: Colleague,
    pub progress: u8,
}

/// Serializable view of the wizard for the rendering layer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSnapshot {
    pub cycle_id: String,
    pub current_index: usize,
    pub current_section: Option<SectionKey>,
    pub sections: Vec<SectionOverview>,
    pub roster: Vec<ColleagueProgress>,
    pub selected_colleague: Option<Colleague>,
    pub overall_progress: u8,
    pub can_submit: bool,
    pub finished: bool,
}

#[derive(Debug, Clone)]
pub struct EvaluationSessionState {
    cycle_id: String,
    catalog: SectionCatalog,
    available_sections: usize,
    current_index: usize,
    peers: Vec<Colleague>,
    leaders: Vec<Colleague>,
    self_answers: AnswerSet,
    peer_answers: BTreeMap<String, AnswerSet>,
    leader_answers: BTreeMap<String, AnswerSet>,
    references: Vec<ReferenceIndication>,
    selected_colleague: Option<String>,
    acknowledged: BTreeSet<SubmissionPart>,
    finished: bool,
}

impl EvaluationSessionState {
    pub fn new(
        cycle_id: impl Into<String>,
        catalog: SectionCatalog,
        peers: Vec<Colleague>,
        leaders: Vec<Colleague>,
    ) -> Self {
        let available_sections = catalog.len();
        Self {
            cycle_id: cycle_id.into(),
            catalog,
            available_sections,
            current_index: 0,
            peers,
            leaders,
            self_answers: AnswerSet::new(),
            peer_answers: BTreeMap::new(),
            leader_answers: BTreeMap::new(),
            references: Vec::new(),
            selected_colleague: None,
            acknowledged: BTreeSet::new(),
            finished: false,
        }
    }

    pub fn cycle_id(&self) -> &str {
        &self.cycle_id
    }

    pub fn sections(&self) -> &[Section] {
        self.catalog.sections()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_section(&self) -> Option<&Section> {
        self.catalog.get(self.current_index)
    }

    /// Limits navigation to the first `count` sections, as reported by the backend.
    pub fn set_section_availability(&mut self, count: usize) {
        self.available_sections = count.min(self.catalog.len());
    }

    pub fn available_sections(&self) -> usize {
        self.available_sections
    }

    /// Moves to `index` and returns the route to reflect in the URL. Out of
    /// range, unavailable or unchanged indices are ignored.
    pub fn select_section(&mut self, index: usize) -> Option<Route> {
        if index >= self.catalog.len()
            || index >= self.available_sections
            || index == self.current_index
        {
            return None;
        }
        let key = self.catalog.get(index)?.key;
        self.current_index = index;
        self.selected_colleague = None;
        debug!(target: "app::evaluation", section = %key, "section selected");
        Some(Route::Evaluation(key))
    }

    pub fn select_section_by_key(&mut self, key: SectionKey) -> Option<Route> {
        let index = self.catalog.index_of(key)?;
        self.select_section(index)
    }

    pub fn next_section(&mut self) -> Option<Route> {
        self.select_section(self.current_index + 1)
    }

    pub fn previous_section(&mut self) -> Option<Route> {
        let index = self.current_index.checked_sub(1)?;
        self.select_section(index)
    }

    pub fn roster(&self, key: SectionKey) -> &[Colleague] {
        match key {
            SectionKey::Peer => &self.peers,
            SectionKey::Leader => &self.leaders,
            _ => &[],
        }
    }

    /// Focuses a colleague of the current peer/leader roster; `None` goes
    /// back to the roster view. Returns whether the selection changed.
    pub fn select_colleague(&mut self, colleague_id: Option<&str>) -> bool {
        let Some(section) = self.current_section().map(|section| section.key) else {
            return false;
        };
        if !section.has_colleagues() {
            return false;
        }
        match colleague_id {
            None => self.selected_colleague.take().is_some(),
            Some(id) => {
                if !self.roster(section).iter().any(|colleague| colleague.id == id) {
                    return false;
                }
                let changed = self.selected_colleague.as_deref() != Some(id);
                self.selected_colleague = Some(id.to_string());
                changed
            }
        }
    }

    pub fn selected_colleague(&self) -> Option<&Colleague> {
        let id = self.selected_colleague.as_deref()?;
        let section = self.current_section()?.key;
        self.roster(section)
            .iter()
            .find(|colleague| colleague.id == id)
    }

    pub fn set_answer(
        &mut self,
        section: SectionKey,
        question_id: &str,
        value: AnswerValue,
        target_colleague_id: Option<&str>,
    ) -> AppResult<()> {
        if self.finished {
            return Err(AppError::validation("A avaliação já foi enviada."));
        }
        if section == SectionKey::Reference {
            return Err(AppError::validation(
                "Referências são registradas pelo formulário de indicação.",
            ));
        }

        let definition = self
            .catalog
            .section(section)
            .ok_or_else(|| AppError::validation(format!("Seção indisponível: {section}")))?;
        let question = definition.question(question_id).ok_or_else(|| {
            AppError::validation_with_details(
                "Pergunta desconhecida.",
                json!({ "section": section.as_str(), "questionId": question_id }),
            )
        })?;
        if !question.accepts(&value) {
            return Err(AppError::validation_with_details(
                "Resposta incompatível com o tipo da pergunta.",
                json!({ "section": section.as_str(), "questionId": question_id }),
            ));
        }

        match section {
            SectionKey::SelfReview => {
                self.self_answers.insert(question_id.to_string(), value);
                self.acknowledged.remove(&SubmissionPart::SelfReview);
            }
            SectionKey::Peer | SectionKey::Leader => {
                let target = target_colleague_id
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| AppError::validation("Selecione o colaborador avaliado."))?;
                if !self.roster(section).iter().any(|colleague| colleague.id == target) {
                    return Err(AppError::validation_with_details(
                        "Colaborador fora da lista desta seção.",
                        json!({ "section": section.as_str(), "colleagueId": target }),
                    ));
                }
                let (answers, part) = if section == SectionKey::Peer {
                    (&mut self.peer_answers, SubmissionPart::Peer(target.to_string()))
                } else {
                    (&mut self.leader_answers, SubmissionPart::Leader(target.to_string()))
                };
                answers
                    .entry(target.to_string())
                    .or_default()
                    .insert(question_id.to_string(), value);
                self.acknowledged.remove(&part);
            }
            SectionKey::Reference => {}
        }
        Ok(())
    }

    pub fn self_answers(&self) -> &AnswerSet {
        &self.self_answers
    }

    pub fn colleague_answers(&self, section: SectionKey, colleague_id: &str) -> Option<&AnswerSet> {
        match section {
            SectionKey::Peer => self.peer_answers.get(colleague_id),
            SectionKey::Leader => self.leader_answers.get(colleague_id),
            _ => None,
        }
    }

    pub fn references(&self) -> &[ReferenceIndication] {
        &self.references
    }

    /// Percentage (rounded down) of required questions answered, for the self
    /// section or for one colleague. Without a colleague, peer/leader report
    /// the mean over their roster.
    pub fn section_progress(&self, section: SectionKey, colleague_id: Option<&str>) -> u8 {
        let Some(definition) = self.catalog.section(section) else {
            return 100;
        };
        match section {
            SectionKey::SelfReview => answer_set_progress(definition, Some(&self.self_answers)),
            SectionKey::Peer | SectionKey::Leader => match colleague_id {
                Some(id) => answer_set_progress(definition, self.colleague_answers(section, id)),
                None => {
                    let roster = self.roster(section);
                    if roster.is_empty() {
                        return 100;
                    }
                    let total: u32 = roster
                        .iter()
                        .map(|colleague| {
                            u32::from(answer_set_progress(
                                definition,
                                self.colleague_answers(section, &colleague.id),
                            ))
                        })
                        .sum();
                    (total / roster.len() as u32) as u8
                }
            },
            SectionKey::Reference => {
                if self.is_reference_complete() {
                    100
                } else {
                    0
                }
            }
        }
    }

    /// Mean of the self section, every rated colleague and the reference section.
    pub fn overall_progress(&self) -> u8 {
        let mut values = vec![u32::from(self.section_progress(SectionKey::SelfReview, None))];
        for key in [SectionKey::Peer, SectionKey::Leader] {
            values.extend(
                self.roster(key)
                    .iter()
                    .map(|colleague| u32::from(self.section_progress(key, Some(&colleague.id)))),
            );
        }
        values.push(u32::from(self.section_progress(SectionKey::Reference, None)));

        let total: u32 = values.iter().sum();
        (total / values.len() as u32) as u8
    }

    pub fn is_section_complete(&self, section: SectionKey) -> bool {
        match section {
            SectionKey::SelfReview => self.section_progress(section, None) == 100,
            SectionKey::Peer | SectionKey::Leader => self
                .roster(section)
                .iter()
                .all(|colleague| self.section_progress(section, Some(&colleague.id)) == 100),
            SectionKey::Reference => self.is_reference_complete(),
        }
    }

    pub fn section_status(&self, section: SectionKey) -> SectionStatus {
        if self.is_section_complete(section) {
            return SectionStatus::Complete;
        }
        let started = match section {
            SectionKey::SelfReview => !self.self_answers.is_empty(),
            SectionKey::Peer => self.peer_answers.values().any(|set| !set.is_empty()),
            SectionKey::Leader => self.leader_answers.values().any(|set| !set.is_empty()),
            SectionKey::Reference => !self.references.is_empty(),
        };
        if started {
            SectionStatus::InProgress
        } else {
            SectionStatus::NotStarted
        }
    }

    fn is_reference_complete(&self) -> bool {
        validate_references(&self.references).is_ok()
    }

    pub fn can_submit(&self) -> bool {
        !self.finished
            && self
                .catalog
                .sections()
                .iter()
                .all(|section| self.is_section_complete(section.key))
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_acknowledged(&self, part: &SubmissionPart) -> bool {
        self.acknowledged.contains(part)
    }

    /// Validates and persists the reference indications. Local state only
    /// changes once the backend accepted the list.
    pub async fn submit_references(
        &mut self,
        gateway: &dyn EvaluationGateway,
        session: &Session,
        references: Vec<ReferenceIndication>,
    ) -> AppResult<()> {
        if self.finished {
            return Err(AppError::validation("A avaliação já foi enviada."));
        }
        validate_references(&references)?;

        let payload = ReferencesPayload {
            cycle_id: self.cycle_id.clone(),
            indicator_id: session.user.id.clone(),
            references: normalize_references(references),
        };
        gateway.submit_references(session, &payload).await?;

        info!(
            target: "app::evaluation",
            count = payload.references.len(),
            "references saved"
        );
        self.references = payload.references;
        self.acknowledged.insert(SubmissionPart::References);
        Ok(())
    }

    /// Sends every part that the backend has not acknowledged yet. Failed
    /// parts are reported together and keep their answers for a retry.
    pub async fn submit_all(
        &mut self,
        gateway: &dyn EvaluationGateway,
        session: &Session,
    ) -> AppResult<Route> {
        if self.finished {
            return Err(AppError::validation("A avaliação já foi enviada."));
        }
        let incomplete: Vec<&str> = self
            .catalog
            .sections()
            .iter()
            .filter(|section| !self.is_section_complete(section.key))
            .map(|section| section.key.as_str())
            .collect();
        if !incomplete.is_empty() {
            return Err(AppError::validation_with_details(
                "Conclua todas as seções antes de enviar.",
                json!({ "incompleteSections": incomplete }),
            ));
        }

        let parts = self.pending_parts(session);
        debug!(target: "app::evaluation", pending = parts.len(), "submitting evaluation");

        let results = join_all(parts.iter().map(|(_, payload)| async move {
            match payload {
                PartPayload::SelfReview(body) => gateway.submit_self(session, body).await,
                PartPayload::Peer(body) => gateway.submit_peer(session, body).await,
                PartPayload::Leader(body) => gateway.submit_leader(session, body).await,
                PartPayload::References(body) => gateway.submit_references(session, body).await,
            }
        }))
        .await;

        let mut failed_parts = Vec::new();
        let mut messages = Vec::new();
        for ((part, _), result) in parts.into_iter().zip(results) {
            match result {
                Ok(()) => {
                    self.acknowledged.insert(part);
                }
                Err(err) => {
                    failed_parts.push(part.to_string());
                    messages.push(err.to_string());
                }
            }
        }

        if !failed_parts.is_empty() {
            return Err(AppError::partial_submission(failed_parts, messages));
        }

        self.finished = true;
        info!(target: "app::evaluation", cycle_id = %self.cycle_id, "evaluation submitted");
        Ok(Route::Home)
    }

    fn pending_parts(&self, session: &Session) -> Vec<(SubmissionPart, PartPayload)> {
        let evaluator_id = session.user.id.clone();
        let mut parts = Vec::new();

        if !self.is_acknowledged(&SubmissionPart::SelfReview) {
            parts.push((
                SubmissionPart::SelfReview,
                PartPayload::SelfReview(SelfEvaluationPayload {
                    cycle_id: self.cycle_id.clone(),
                    evaluator_id: evaluator_id.clone(),
                    answers: AnswerItem::from_set(&self.self_answers),
                }),
            ));
        }

        for colleague in &self.peers {
            let part = SubmissionPart::Peer(colleague.id.clone());
            if self.is_acknowledged(&part) {
                continue;
            }
            let payload = self.colleague_payload(SectionKey::Peer, &evaluator_id, &colleague.id);
            parts.push((part, PartPayload::Peer(payload)));
        }

        for colleague in &self.leaders {
            let part = SubmissionPart::Leader(colleague.id.clone());
            if self.is_acknowledged(&part) {
                continue;
            }
            let payload = self.colleague_payload(SectionKey::Leader, &evaluator_id, &colleague.id);
            parts.push((part, PartPayload::Leader(payload)));
        }

        if !self.is_acknowledged(&SubmissionPart::References) {
            parts.push((
                SubmissionPart::References,
                PartPayload::References(ReferencesPayload {
                    cycle_id: self.cycle_id.clone(),
                    indicator_id: evaluator_id,
                    references: self.references.clone(),
                }),
            ));
        }

        parts
    }

    fn colleague_payload(
        &self,
        section: SectionKey,
        evaluator_id: &str,
        colleague_id: &str,
    ) -> ColleagueEvaluationPayload {
        ColleagueEvaluationPayload {
            cycle_id: self.cycle_id.clone(),
            evaluator_id: evaluator_id.to_string(),
            evaluated_user_id: colleague_id.to_string(),
            answers: self
                .colleague_answers(section, colleague_id)
                .map(AnswerItem::from_set)
                .unwrap_or_default(),
        }
    }

    pub fn snapshot(&self) -> EvaluationSnapshot {
        let current = self.current_section().map(|section| section.key);
        let sections = self
            .catalog
            .sections()
            .iter()
            .enumerate()
            .map(|(index, section)| SectionOverview {
                key: section.key,
                title: section.title.clone(),
                icon: section.icon.clone(),
                status: self.section_status(section.key),
                progress: self.section_progress(section.key, None),
                available: index < self.available_sections,
            })
            .collect();
        let roster = current
            .map(|key| {
                self.roster(key)
                    .iter()
                    .map(|colleague| ColleagueProgress {
                        colleague: colleague.clone(),
                        progress: self.section_progress(key, Some(&colleague.id)),
                    })
                    .collect()
            })
            .unwrap_or_default();

        EvaluationSnapshot {
            cycle_id: self.cycle_id.clone(),
            current_index: self.current_index,
            current_section: current,
            sections,
            roster,
            selected_colleague: self.selected_colleague().cloned(),
            overall_progress: self.overall_progress(),
            can_submit: self.can_submit(),
            finished: self.finished,
        }
    }
}

fn answer_set_progress(section: &Section, answers: Option<&AnswerSet>) -> u8 {
    let required: Vec<_> = section.required_questions().collect();
    if required.is_empty() {
        return 100;
    }
    let answered = required
        .iter()
        .filter(|question| {
            answers
                .and_then(|set| set.get(&question.id))
                .map(AnswerValue::is_answered)
                .unwrap_or(false)
        })
        .count();
    (answered * 100 / required.len()) as u8
}

pub fn validate_references(references: &[ReferenceIndication]) -> AppResult<()> {
    if references.is_empty() {
        return Err(AppError::validation("Indique ao menos uma referência."));
    }
    let invalid: Vec<usize> = references
        .iter()
        .enumerate()
        .filter(|(_, reference)| {
            reference.colleague_id.trim().is_empty() || reference.justification.trim().is_empty()
        })
        .map(|(index, _)| index)
        .collect();
    if !invalid.is_empty() {
        return Err(AppError::validation_with_details(
            "Cada referência precisa de um colaborador e de uma justificativa.",
            json!({ "invalidIndexes": invalid }),
        ));
    }
    Ok(())
}

fn normalize_references(references: Vec<ReferenceIndication>) -> Vec<ReferenceIndication> {
    references
        .into_iter()
        .map(|reference| ReferenceIndication {
            colleague_id: reference.colleague_id.trim().to_string(),
            justification: reference.justification.trim().to_string(),
        })
        .collect()
}
