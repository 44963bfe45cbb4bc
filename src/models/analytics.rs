use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsEventType {
    LandingView,
    ReviewClick,
    SpinAttempt,
    Win,
    ClaimCompleted,
    DailyCapHit,
}

impl AnalyticsEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsEventType::LandingView => "landing_view",
            AnalyticsEventType::ReviewClick => "review_click",
            AnalyticsEventType::SpinAttempt => "spin_attempt",
            AnalyticsEventType::Win => "win",
            AnalyticsEventType::ClaimCompleted => "claim_completed",
            AnalyticsEventType::DailyCapHit => "daily_cap_hit",
        }
    }

    /// 前端允许上报的事件
    pub fn is_client_event(&self) -> bool {
        matches!(
            self,
            AnalyticsEventType::LandingView | AnalyticsEventType::ReviewClick
        )
    }
}

impl fmt::Display for AnalyticsEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct AnalyticsEvent {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub event_type: AnalyticsEventType,
    pub prize_id: Option<Uuid>,
    pub spin_id: Option<Uuid>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(restaurant_id: Uuid, event_type: AnalyticsEventType) -> Self {
        Self {
            id: Uuid::new_v4(),
            restaurant_id,
            event_type,
            prize_id: None,
            spin_id: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_spin(mut self, spin_id: Uuid) -> Self {
        self.spin_id = Some(spin_id);
        self
    }

    pub fn with_prize(mut self, prize_id: Option<Uuid>) -> Self {
        self.prize_id = prize_id;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// 前端事件上报请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClientEventRequest {
    /// landing_view / review_click
    pub event_type: AnalyticsEventType,
}
