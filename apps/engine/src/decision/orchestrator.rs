//! Decision orchestration — composes filtering, a selection strategy, and
//! (optionally) the AI-assisted path into one boundary result.
//!
//! Every path terminates in either a winning selection or an explained null;
//! only catalog I/O can surface as `Err`.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::{CardCatalog, CatalogFilter};
use crate::config::AiSettings;
use crate::decision::heuristic::HeuristicScore;
use crate::decision::prompts::build_prompt;
use crate::decision::value::ValueBreakdown;
use crate::decision::{PickContext, Selection, SelectionStrategy};
use crate::errors::EngineError;
use crate::llm_client::recovery::recover;
use crate::llm_client::CompletionClient;
use crate::models::{Card, SpendProfile};

const NO_MATCH_REASON: &str = "No cards match that category or partner yet.";
const NO_ELIGIBLE_REASON: &str = "No cards match your income or annual fee preference.";
const AI_UNCONFIGURED_REASON: &str =
    "AI recommendations are not configured. Set an API key and model name in settings first.";

fn default_true() -> bool {
    true
}

/// One recommendation request as received from the boundary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub program: String,
    /// Monthly income in AED. Zero means "not stated" and skips the check.
    #[serde(default)]
    pub income: f64,
    #[serde(default = "default_true")]
    pub annual_fee_ok: bool,
    #[serde(default)]
    pub spend: SpendProfile,
    #[serde(default)]
    pub features: Vec<String>,
}

impl RecommendRequest {
    fn catalog_filter(&self) -> CatalogFilter {
        CatalogFilter {
            category: self.category.trim().to_string(),
            sub_category: self.sub_category.trim().to_string(),
            program: self.program.trim().to_string(),
        }
    }
}

/// Boundary result. Field names are a stable contract with callers.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Recommendation {
    Ranked {
        card: Card,
        #[serde(skip_serializing_if = "Option::is_none")]
        breakdown: Option<ValueBreakdown>,
        explanation: String,
        /// Heuristic winners carry `score`, `cashback_value`,
        /// `matched_features`, and `available_features` at the top level.
        #[serde(flatten)]
        heuristics: Option<HeuristicScore>,
    },
    Ai {
        card: Card,
        ai_reason: String,
    },
    None {
        card: Option<Card>,
        reason: String,
    },
}

impl Recommendation {
    fn none(reason: impl Into<String>) -> Self {
        Recommendation::None {
            card: None,
            reason: reason.into(),
        }
    }
}

/// Drops cards the user cannot hold: income below the card's minimum salary
/// (when both are stated), or any annual fee when the user declined fees.
pub fn filter_eligible(cards: Vec<Card>, income: f64, annual_fee_ok: bool) -> Vec<Card> {
    cards
        .into_iter()
        .filter(|card| {
            if income > 0.0 && card.minimum_salary > 0.0 && income < card.minimum_salary {
                return false;
            }
            if !annual_fee_ok && card.annual_fee > 0.0 {
                return false;
            }
            true
        })
        .collect()
}

async fn eligible_candidates(
    catalog: &dyn CardCatalog,
    request: &RecommendRequest,
) -> Result<Result<Vec<Card>, Recommendation>, EngineError> {
    let cards = catalog.fetch_cards(&request.catalog_filter()).await?;
    if cards.is_empty() {
        return Ok(Err(Recommendation::none(NO_MATCH_REASON)));
    }
    let eligible = filter_eligible(cards, request.income, request.annual_fee_ok);
    if eligible.is_empty() {
        return Ok(Err(Recommendation::none(NO_ELIGIBLE_REASON)));
    }
    Ok(Ok(eligible))
}

/// The engine-computed path: filter the catalog, then let `strategy` pick.
pub async fn recommend(
    catalog: &dyn CardCatalog,
    strategy: &dyn SelectionStrategy,
    request: &RecommendRequest,
) -> Result<Recommendation, EngineError> {
    let eligible = match eligible_candidates(catalog, request).await? {
        Ok(cards) => cards,
        Err(no_pick) => return Ok(no_pick),
    };

    let context = PickContext {
        category: &request.category,
        spend: &request.spend,
        requested_features: &request.features,
    };
    info!(
        strategy = strategy.name(),
        candidates = eligible.len(),
        "picking a card"
    );

    Ok(match strategy.pick(&eligible, &context) {
        Selection::Winner(pick) => Recommendation::Ranked {
            card: pick.card,
            breakdown: pick.breakdown,
            explanation: pick.explanation,
            heuristics: pick.heuristics,
        },
        Selection::NoPick { reason } => Recommendation::none(reason),
    })
}

/// The AI-assisted path: one completion request, recovered defensively, with
/// the returned id mapped back onto the eligible candidate list.
pub async fn recommend_with_ai(
    catalog: &dyn CardCatalog,
    settings: &AiSettings,
    request: &RecommendRequest,
) -> Result<Recommendation, EngineError> {
    let Some((api_key, model)) = settings.credentials() else {
        return Ok(Recommendation::none(AI_UNCONFIGURED_REASON));
    };
    let client = CompletionClient::new(api_key.to_string(), model.to_string());
    recommend_with_ai_client(catalog, &client, request).await
}

/// Same as [`recommend_with_ai`] with a pre-built client (tests point it at
/// a mock server).
pub async fn recommend_with_ai_client(
    catalog: &dyn CardCatalog,
    client: &CompletionClient,
    request: &RecommendRequest,
) -> Result<Recommendation, EngineError> {
    let eligible = match eligible_candidates(catalog, request).await? {
        Ok(cards) => cards,
        Err(no_pick) => return Ok(no_pick),
    };

    let prompt = build_prompt(
        &request.category,
        request.income,
        request.annual_fee_ok,
        &request.spend,
        &request.features,
        &eligible,
    );

    let raw = match client.complete(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!(model = client.model(), error = %e, "completion request failed");
            return Ok(Recommendation::none(format!(
                "The AI service request failed: {e}"
            )));
        }
    };

    let (pick, tier) = match recover(&raw) {
        Ok(recovered) => recovered,
        Err(e) => {
            warn!(error = %e, "AI response was unrecoverable");
            return Ok(Recommendation::none(format!(
                "Could not parse the AI response: {e}"
            )));
        }
    };
    info!(tier = tier.as_str(), card_id = ?pick.card_id, "AI pick recovered");

    let Some(card_id) = pick.card_id else {
        let reason = if pick.reason.is_empty() {
            "The AI could not pick a suitable card.".to_string()
        } else {
            format!("The AI could not pick a suitable card: {}", pick.reason)
        };
        return Ok(Recommendation::none(reason));
    };

    // Never substitute a nearby id: an unknown pick is an explicit mismatch.
    match eligible.iter().find(|card| card.id == card_id) {
        Some(card) => Ok(Recommendation::Ai {
            card: card.clone(),
            ai_reason: pick.reason,
        }),
        None => {
            warn!(card_id, "AI selected a card outside the eligible set");
            Ok(Recommendation::none(format!(
                "The AI selected card {card_id}, which is not among the eligible cards."
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::decision::ranking::DeterministicStrategy;
    use crate::models::EarnRuleSpec;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn travel_card(id: i64, default_rate: f64, annual_fee: f64, minimum_salary: f64) -> Card {
        Card {
            id,
            card_category: "Travel".to_string(),
            product: format!("Card {id}"),
            minimum_salary,
            annual_fee,
            unit_value: Some(1.0),
            earn_rules: Some(vec![EarnRuleSpec {
                bucket: "default".to_string(),
                units_per_aed: Some(default_rate),
                ..EarnRuleSpec::default()
            }]),
            ..Card::default()
        }
    }

    fn travel_request() -> RecommendRequest {
        RecommendRequest {
            category: "Travel".to_string(),
            income: 15000.0,
            annual_fee_ok: true,
            spend: SpendProfile {
                travel: 2000.0,
                retail: 1000.0,
                ..SpendProfile::default()
            },
            ..RecommendRequest::default()
        }
    }

    fn completion_body(text: &str) -> serde_json::Value {
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
    }

    fn mock_client(server: &MockServer) -> CompletionClient {
        CompletionClient::new("k".to_string(), "gemini-pro".to_string())
            .with_base_url(server.uri())
    }

    #[test]
    fn test_filter_eligible_by_income_and_fee() {
        let cards = vec![
            travel_card(1, 0.01, 0.0, 30000.0),
            travel_card(2, 0.01, 500.0, 10000.0),
            travel_card(3, 0.01, 0.0, 0.0),
        ];
        let by_income = filter_eligible(cards.clone(), 15000.0, true);
        assert_eq!(
            by_income.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![2, 3]
        );

        let no_fees = filter_eligible(cards.clone(), 0.0, false);
        assert_eq!(no_fees.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 3]);

        // Zero income means "not stated" and skips the salary check.
        let unstated = filter_eligible(cards, 0.0, true);
        assert_eq!(unstated.len(), 3);
    }

    #[tokio::test]
    async fn test_recommend_deterministic_end_to_end() {
        let catalog = InMemoryCatalog::new(vec![
            travel_card(1, 0.01, 0.0, 0.0),
            travel_card(2, 0.05, 0.0, 0.0),
        ]);
        let strategy = DeterministicStrategy::default();
        let result = recommend(&catalog, &strategy, &travel_request())
            .await
            .unwrap();
        match result {
            Recommendation::Ranked {
                card, breakdown, ..
            } => {
                assert_eq!(card.id, 2);
                // 3000 * 0.05 * 12 = 1800.
                assert_eq!(breakdown.unwrap().net_annual_value_aed, 1800.0);
            }
            other => panic!("expected ranked winner, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_catalog_reports_no_match() {
        let catalog = InMemoryCatalog::new(vec![]);
        let strategy = DeterministicStrategy::default();
        let result = recommend(&catalog, &strategy, &travel_request())
            .await
            .unwrap();
        match result {
            Recommendation::None { card, reason } => {
                assert!(card.is_none());
                assert_eq!(reason, NO_MATCH_REASON);
            }
            other => panic!("expected no-pick, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_all_filtered_out_reports_no_eligible() {
        let catalog = InMemoryCatalog::new(vec![travel_card(1, 0.02, 0.0, 99000.0)]);
        let strategy = DeterministicStrategy::default();
        let result = recommend(&catalog, &strategy, &travel_request())
            .await
            .unwrap();
        match result {
            Recommendation::None { reason, .. } => assert_eq!(reason, NO_ELIGIBLE_REASON),
            other => panic!("expected no-pick, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ai_path_unconfigured_never_calls_out() {
        let catalog = InMemoryCatalog::new(vec![travel_card(1, 0.02, 0.0, 0.0)]);
        let settings = AiSettings::default();
        let result = recommend_with_ai(&catalog, &settings, &travel_request())
            .await
            .unwrap();
        match result {
            Recommendation::None { reason, .. } => assert_eq!(reason, AI_UNCONFIGURED_REASON),
            other => panic!("expected no-pick, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ai_path_maps_recovered_id_to_eligible_card() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
                "```json\n{\"card_id\": 2, \"reason\": \"Best travel earn rate\"}\n```",
            )))
            .mount(&server)
            .await;

        let catalog = InMemoryCatalog::new(vec![
            travel_card(1, 0.01, 0.0, 0.0),
            travel_card(2, 0.05, 0.0, 0.0),
        ]);
        let client = mock_client(&server);
        let result = recommend_with_ai_client(&catalog, &client, &travel_request())
            .await
            .unwrap();
        match result {
            Recommendation::Ai { card, ai_reason } => {
                assert_eq!(card.id, 2);
                assert_eq!(ai_reason, "Best travel earn rate");
            }
            other => panic!("expected AI winner, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ai_id_outside_eligible_set_is_explicit_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
                "{\"card_id\": 404, \"reason\": \"hallucinated\"}",
            )))
            .mount(&server)
            .await;

        let catalog = InMemoryCatalog::new(vec![travel_card(1, 0.01, 0.0, 0.0)]);
        let client = mock_client(&server);
        let result = recommend_with_ai_client(&catalog, &client, &travel_request())
            .await
            .unwrap();
        match result {
            Recommendation::None { reason, .. } => {
                assert!(reason.contains("404"));
                assert!(reason.contains("not among the eligible cards"));
            }
            other => panic!("expected mismatch no-pick, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ai_null_pick_reports_its_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
                "{\"card_id\": null, \"reason\": \"No card fits this profile\"}",
            )))
            .mount(&server)
            .await;

        let catalog = InMemoryCatalog::new(vec![travel_card(1, 0.01, 0.0, 0.0)]);
        let client = mock_client(&server);
        let result = recommend_with_ai_client(&catalog, &client, &travel_request())
            .await
            .unwrap();
        match result {
            Recommendation::None { reason, .. } => {
                assert!(reason.contains("No card fits this profile"));
            }
            other => panic!("expected no-pick, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ai_unparseable_output_reports_parse_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body("I would recommend thinking about it.")),
            )
            .mount(&server)
            .await;

        let catalog = InMemoryCatalog::new(vec![travel_card(1, 0.01, 0.0, 0.0)]);
        let client = mock_client(&server);
        let result = recommend_with_ai_client(&catalog, &client, &travel_request())
            .await
            .unwrap();
        match result {
            Recommendation::None { reason, .. } => {
                assert!(reason.contains("Could not parse the AI response"));
            }
            other => panic!("expected no-pick, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ai_transport_failure_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let catalog = InMemoryCatalog::new(vec![travel_card(1, 0.01, 0.0, 0.0)]);
        let client = mock_client(&server);
        let result = recommend_with_ai_client(&catalog, &client, &travel_request())
            .await
            .unwrap();
        match result {
            Recommendation::None { reason, .. } => {
                assert!(reason.contains("request failed"));
                assert!(reason.contains("500"));
                assert!(reason.contains("upstream exploded"));
            }
            other => panic!("expected no-pick, got {other:?}"),
        }
    }

    #[test]
    fn test_no_pick_serializes_with_null_card() {
        let value = serde_json::to_value(Recommendation::none("nope")).unwrap();
        assert_eq!(value, json!({"card": null, "reason": "nope"}));
    }

    #[test]
    fn test_ranked_serializes_breakdown_fields() {
        let card = travel_card(5, 0.02, 100.0, 0.0);
        let breakdown = crate::decision::value::compute_card_value(
            &card,
            &SpendProfile {
                retail: 1000.0,
                ..SpendProfile::default()
            },
        )
        .unwrap();
        let value = serde_json::to_value(Recommendation::Ranked {
            card,
            breakdown: Some(breakdown),
            explanation: "why".to_string(),
            heuristics: None,
        })
        .unwrap();
        let breakdown = &value["breakdown"];
        assert_eq!(breakdown["annual_units"], json!(240.0));
        assert_eq!(breakdown["net_annual_value_aed"], json!(140.0));
        assert_eq!(breakdown["net_first_year_value_aed"], json!(140.0));
        assert_eq!(value["explanation"], json!("why"));
    }

    #[tokio::test]
    async fn test_heuristic_winner_serializes_score_fields() {
        let mut card = travel_card(7, 0.0, 0.0, 12000.0);
        card.earn_rules = None;
        card.core_perks =
            "3% cashback on travel bookings\nunlimited airport lounge access".to_string();
        let catalog = InMemoryCatalog::new(vec![card]);
        let strategy = crate::decision::heuristic::HeuristicStrategy::default();

        let mut request = travel_request();
        request.features = vec!["Airport Lounge Access".to_string()];
        let result = recommend(&catalog, &strategy, &request).await.unwrap();
        let value = serde_json::to_value(result).unwrap();

        // travel+foreign 2000 * 3% = 60, plus one matched feature.
        assert_eq!(value["cashback_value"], json!(60.0));
        assert_eq!(value["score"], json!(75.0));
        assert_eq!(value["matched_features"], json!(["Airport Lounge Access"]));
        assert_eq!(
            value["available_features"],
            json!(["Airport Lounge Access"])
        );
        assert_eq!(value["card"]["id"], json!(7));
        assert!(value.get("breakdown").is_none());
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: RecommendRequest = serde_json::from_str(
            r#"{"category": "Travel", "spend": {"travel": 900}}"#,
        )
        .unwrap();
        assert!(request.annual_fee_ok);
        assert_eq!(request.income, 0.0);
        assert_eq!(request.spend.travel, 900.0);
        assert!(request.features.is_empty());
    }
}
