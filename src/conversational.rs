//! Conversation turn processing
//!
//! One turn runs strictly in order:
//! CLASSIFY → EXTRACT → MERGE → REGION GATE → MATCH → GENERATE
//!
//! `Compass::process_turn` reads the previous context and returns a new
//! one. Nothing is written back until the whole turn has completed, so an
//! aborted turn leaves the previous context untouched.

use crate::catalog::CatalogCache;
use crate::classifier::IntentClassifier;
use crate::extractor::{MockExtractor, ProfileExtractor, EXTRACTION_HISTORY_TURNS};
use crate::matching::{match_programs, MatchOptions};
use crate::memory::{ConversationHistory, ConversationMessage};
use crate::models::{Intent, MatchedProgram, ProfileUpdate, TurnOutcome, UserProfile};
use crate::region::{RegionGate, OUT_OF_AREA_REPLY};
use crate::responder::{fallback_reply, MockResponder, ReplyGenerator, ReplyRequest, GENERATION_HISTORY_TURNS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const WELCOME_MESSAGE: &str = "안녕하세요! 저는 복지나침반이에요 🧭

서울시에서 받을 수 있는 복지 혜택을 찾아드릴게요.
복잡한 조건? 걱정 마세요. 대화만 하면 제가 알아서 찾아드려요!

**간단히 상황을 말씀해주세요.** 예를 들면:
- \"27살이고 월세 살고 있어요\"
- \"취준생인데 지원받을 수 있는 게 있을까요?\"
- \"소득이 적어서 생활이 어려워요\"

어떤 상황이신가요? 😊";

pub const CATALOG_UNAVAILABLE_REPLY: &str =
    "복지 데이터를 불러올 수 없습니다. 잠시 후 다시 시도해 주세요.";

/// Everything one conversation remembers between turns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    pub session_id: Uuid,
    pub profile: UserProfile,
    /// Programs from the most recent matching turn
    pub last_matched: Vec<MatchedProgram>,
    pub last_intent: Option<Intent>,
    pub history: ConversationHistory,
}

impl ConversationContext {
    /// Fresh conversation seeded with the welcome message
    pub fn new(session_id: Uuid) -> Self {
        let mut history = ConversationHistory::new(session_id);
        history.add_message(ConversationMessage::assistant(WELCOME_MESSAGE));

        Self {
            session_id,
            profile: UserProfile::default(),
            last_matched: Vec::new(),
            last_intent: None,
            history,
        }
    }

    fn recent_history(&self, count: usize) -> Vec<&ConversationMessage> {
        self.history.recent_messages(count).collect()
    }

    fn last_matched_names(&self) -> HashSet<String> {
        self.last_matched
            .iter()
            .map(|m| m.program.program_name.clone())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

/// The welfare matching conversation engine
pub struct Compass {
    catalog: Arc<CatalogCache>,
    extractor: Arc<dyn ProfileExtractor>,
    responder: Arc<dyn ReplyGenerator>,
}

impl Compass {
    pub fn new(
        catalog: Arc<CatalogCache>,
        extractor: Arc<dyn ProfileExtractor>,
        responder: Arc<dyn ReplyGenerator>,
    ) -> Self {
        Self {
            catalog,
            extractor,
            responder,
        }
    }

    /// Engine backed by the rule-based collaborators
    pub fn offline(catalog: Arc<CatalogCache>) -> Self {
        Self::new(catalog, Arc::new(MockExtractor), Arc::new(MockResponder))
    }

    pub fn catalog(&self) -> &Arc<CatalogCache> {
        &self.catalog
    }

    /// Run one turn; never fails, every stage degrades instead
    pub async fn process_turn(
        &self,
        context: &ConversationContext,
        message: &str,
    ) -> (ConversationContext, TurnOutcome) {
        let mut next = context.clone();
        let intent = IntentClassifier::classify(message, context.last_intent);

        let catalog = self.catalog.get().await;
        if catalog.is_empty() {
            warn!(session_id = %context.session_id, "Turn answered without program data");
            next.history.add_message(ConversationMessage::user(message));
            next.history
                .add_message(ConversationMessage::assistant(CATALOG_UNAVAILABLE_REPLY));

            let outcome = TurnOutcome {
                intent,
                reply: CATALOG_UNAVAILABLE_REPLY.to_string(),
                profile_field_count: next.profile.core_field_count(),
                matched_programs: Vec::new(),
                show_cards: false,
                out_of_region: false,
                catalog_unavailable: true,
            };
            return (next, outcome);
        }

        let is_other_request = IntentClassifier::is_other_request(message);
        let requested_category = IntentClassifier::requested_category(message);
        info!(
            session_id = %context.session_id,
            intent = %intent,
            is_other_request,
            requested_category,
            "Processing turn"
        );

        let update = self.extract(message, context).await;
        next.profile.merge(update);
        next.last_intent = Some(intent);

        let field_count = next.profile.core_field_count();

        if RegionGate::is_out_of_area(&next.profile) {
            info!(
                session_id = %context.session_id,
                residence = ?next.profile.residence,
                "Residence outside service area"
            );
            next.history.add_message(ConversationMessage::user(message));
            next.history.add_message(ConversationMessage::assistant(OUT_OF_AREA_REPLY));

            let outcome = TurnOutcome {
                intent,
                reply: OUT_OF_AREA_REPLY.to_string(),
                profile_field_count: field_count,
                matched_programs: Vec::new(),
                show_cards: false,
                out_of_region: true,
                catalog_unavailable: false,
            };
            return (next, outcome);
        }

        let fresh_match = intent == Intent::Match && next.profile.is_ready_for_matching();
        if fresh_match {
            let options = MatchOptions {
                exclude_names: if is_other_request {
                    context.last_matched_names()
                } else {
                    HashSet::new()
                },
                requested_category: requested_category.map(str::to_string),
            };
            next.last_matched = match_programs(&next.profile, &catalog.programs, &options);
        } else {
            debug!(field_count, "Reusing previous matches for this turn");
        }

        let programs = next.last_matched.clone();
        let reply = self.generate(message, intent, &next.profile, &programs, context).await;

        let show_cards = fresh_match && !programs.is_empty();
        let cards = if show_cards { programs.clone() } else { Vec::new() };

        next.history.add_message(ConversationMessage::user(message));
        next.history
            .add_message(ConversationMessage::assistant_with_cards(reply.clone(), cards));

        let outcome = TurnOutcome {
            intent,
            reply,
            profile_field_count: field_count,
            matched_programs: programs,
            show_cards,
            out_of_region: false,
            catalog_unavailable: false,
        };

        (next, outcome)
    }

    async fn extract(&self, message: &str, context: &ConversationContext) -> ProfileUpdate {
        let history = context.recent_history(EXTRACTION_HISTORY_TURNS);

        match self.extractor.extract(message, &history).await {
            Ok(update) => {
                debug!(?update, "Profile update extracted");
                update
            }
            Err(e) => {
                warn!("Profile extraction failed, treating as no new information: {}", e);
                ProfileUpdate::default()
            }
        }
    }

    async fn generate(
        &self,
        message: &str,
        intent: Intent,
        profile: &UserProfile,
        programs: &[MatchedProgram],
        context: &ConversationContext,
    ) -> String {
        let history = context.recent_history(GENERATION_HISTORY_TURNS);
        let request = ReplyRequest {
            message,
            intent,
            profile,
            programs,
            history: &history,
        };

        match self.responder.generate(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Reply generation failed: {}", e);
                fallback_reply(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProgramCatalog;
    use crate::error::CompassError;
    use crate::models::Program;
    use async_trait::async_trait;

    struct FailingExtractor;

    #[async_trait]
    impl ProfileExtractor for FailingExtractor {
        async fn extract(
            &self,
            _message: &str,
            _history: &[&ConversationMessage],
        ) -> crate::Result<ProfileUpdate> {
            Err(CompassError::ExtractionError("not json".to_string()))
        }
    }

    struct FailingResponder;

    #[async_trait]
    impl ReplyGenerator for FailingResponder {
        async fn generate(&self, _request: &ReplyRequest<'_>) -> crate::Result<String> {
            Err(CompassError::LlmError("quota exceeded".to_string()))
        }
    }

    fn program(name: &str, category: &str) -> Program {
        Program {
            program_name: name.to_string(),
            category_primary: Some(category.to_string()),
            how_to_apply: Some("온라인 신청".to_string()),
            ..Default::default()
        }
    }

    fn catalog() -> Arc<CatalogCache> {
        let mut rent = program("청년 월세 지원", "주거");
        rent.category_secondary = Some("월세".to_string());
        rent.support_amount = Some("월 20만원".to_string());
        rent.age_min = Some(19.0);
        rent.age_max = Some(39.0);

        let mut seoul_only = program("서울 청년수당", "생활");
        seoul_only.residence_required = Some("서울".to_string());

        // the third housing program is held back by the per-category cap
        let programs = vec![
            rent,
            program("청년 전세 대출", "주거"),
            program("청년 임차보증금 이자지원", "주거"),
            seoul_only,
            program("청년 일자리 도약", "일자리"),
            program("희망두배 청년통장", "금융"),
        ];

        Arc::new(CatalogCache::with_catalog(ProgramCatalog {
            programs,
            source: None,
        }))
    }

    fn context() -> ConversationContext {
        ConversationContext::new(Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_new_context_has_welcome() {
        let context = context();
        assert_eq!(context.history.message_count(), 1);
        assert_eq!(context.history.messages().next().unwrap().content, WELCOME_MESSAGE);
    }

    #[tokio::test]
    async fn test_sparse_profile_does_not_match() {
        let compass = Compass::offline(catalog());
        let (next, outcome) = compass.process_turn(&context(), "27살이에요").await;

        assert_eq!(outcome.intent, Intent::Match);
        assert_eq!(outcome.profile_field_count, 1);
        assert!(outcome.matched_programs.is_empty());
        assert!(!outcome.show_cards);
        assert_eq!(next.profile.age, Some(27));
        assert_eq!(next.history.message_count(), 3);
    }

    #[tokio::test]
    async fn test_complete_profile_matches_and_shows_cards() {
        let compass = Compass::offline(catalog());
        let (_, outcome) = compass
            .process_turn(&context(), "27살 취준생이고 강남에서 월세 살아요")
            .await;

        assert_eq!(outcome.profile_field_count, 4);
        assert!(outcome.show_cards);
        assert_eq!(outcome.matched_programs[0].program.program_name, "청년 월세 지원");
        assert!(outcome.reply.contains("아래 카드"));
    }

    #[tokio::test]
    async fn test_follow_up_keeps_matches_without_cards() {
        let compass = Compass::offline(catalog());
        let (after_match, first) = compass
            .process_turn(&context(), "27살 취준생이고 강남에서 월세 살아요")
            .await;
        assert!(first.show_cards);

        let (after_apply, apply) = compass
            .process_turn(&after_match, "청년 월세 지원 신청 방법 알려줘")
            .await;
        assert_eq!(apply.intent, Intent::Apply);
        assert!(!apply.show_cards);
        assert_eq!(apply.matched_programs, first.matched_programs);
        assert!(apply.reply.starts_with("청년 월세 지원 신청 방법"));

        let (_, sticky) = compass.process_turn(&after_apply, "서류는요?").await;
        assert_eq!(sticky.intent, Intent::Apply);
    }

    #[tokio::test]
    async fn test_other_request_excludes_previous_matches() {
        let compass = Compass::offline(catalog());
        let (after_match, first) = compass
            .process_turn(&context(), "27살 취준생이고 강남에서 월세 살아요")
            .await;

        let (_, other) = compass
            .process_turn(&after_match, "다른 복지도 알려줘")
            .await;

        assert_eq!(other.intent, Intent::Match);
        assert!(other.show_cards);
        assert_eq!(other.matched_programs[0].program.program_name, "청년 임차보증금 이자지원");
        let previous: HashSet<_> = first
            .matched_programs
            .iter()
            .map(|m| m.program.program_name.clone())
            .collect();
        assert!(other
            .matched_programs
            .iter()
            .all(|m| !previous.contains(&m.program.program_name)));
    }

    #[tokio::test]
    async fn test_out_of_area_short_circuits() {
        let compass = Compass::offline(catalog());
        let (next, outcome) = compass
            .process_turn(&context(), "부산에 사는 27살 취준생이에요")
            .await;

        assert!(outcome.out_of_region);
        assert!(!outcome.show_cards);
        assert_eq!(outcome.reply, OUT_OF_AREA_REPLY);
        assert!(next.last_matched.is_empty());
        assert_eq!(next.profile.residence.as_deref(), Some("부산"));
    }

    #[tokio::test]
    async fn test_extraction_failure_is_no_new_information() {
        let compass = Compass::new(catalog(), Arc::new(FailingExtractor), Arc::new(MockResponder));
        let mut start = context();
        start.profile.age = Some(30);

        let (next, outcome) = compass.process_turn(&start, "월세 살아요").await;
        assert_eq!(next.profile.age, Some(30));
        assert_eq!(next.profile.housing_type, None);
        assert_eq!(outcome.profile_field_count, 1);
    }

    #[tokio::test]
    async fn test_generation_failure_uses_fallback() {
        let compass = Compass::new(catalog(), Arc::new(MockExtractor), Arc::new(FailingResponder));
        let (next, outcome) = compass.process_turn(&context(), "27살이에요").await;

        assert!(outcome.reply.starts_with("죄송해요, 응답 생성 중 오류가 발생했어요"));
        assert!(outcome.reply.contains("quota exceeded"));
        assert_eq!(next.profile.age, Some(27));
    }

    #[tokio::test]
    async fn test_empty_catalog_is_terminal() {
        let empty = Arc::new(CatalogCache::with_catalog(ProgramCatalog::empty()));
        let compass = Compass::offline(empty);

        let (next, outcome) = compass.process_turn(&context(), "27살이에요").await;
        assert!(outcome.catalog_unavailable);
        assert_eq!(outcome.reply, CATALOG_UNAVAILABLE_REPLY);
        assert_eq!(next.profile, UserProfile::default());
    }

    #[tokio::test]
    async fn test_previous_context_is_untouched() {
        let compass = Compass::offline(catalog());
        let start = context();

        let (next, _) = compass.process_turn(&start, "27살 직장인이에요").await;
        assert_eq!(start.profile, UserProfile::default());
        assert_eq!(start.history.message_count(), 1);
        assert_eq!(next.last_intent, Some(Intent::Match));
    }
}
