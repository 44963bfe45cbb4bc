use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// 一家餐厅当日抽奖所需的全部配置 (只读快照)
#[derive(Debug, Clone)]
pub struct RestaurantCatalog {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    /// IANA 时区，决定"今天"的边界
    pub timezone: String,
    /// 餐厅每日中奖上限 (None = 不限)
    pub daily_win_cap: Option<i64>,
    pub logo_url: Option<String>,
    pub google_url: Option<String>,
    /// 启用的奖品，按目录顺序 (created_at 升序)
    pub prizes: Vec<CatalogPrize>,
}

#[derive(Debug, Clone)]
pub struct CatalogPrize {
    pub id: Uuid,
    pub label: String,
    pub description: Option<String>,
    pub emoji: Option<String>,
    pub weight: i64,
    pub daily_cap: Option<i64>,
    pub is_fallback: bool,
}

impl RestaurantCatalog {
    pub fn prize(&self, prize_id: Uuid) -> Option<&CatalogPrize> {
        self.prizes.iter().find(|p| p.id == prize_id)
    }
}

/// 对外展示的奖品 (不含权重与上限)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublicPrize {
    pub id: Uuid,
    pub label: String,
    pub description: Option<String>,
    pub emoji: Option<String>,
    pub is_fallback: bool,
}

impl From<&CatalogPrize> for PublicPrize {
    fn from(p: &CatalogPrize) -> Self {
        PublicPrize {
            id: p.id,
            label: p.label.clone(),
            description: p.description.clone(),
            emoji: p.emoji.clone(),
            is_fallback: p.is_fallback,
        }
    }
}

/// 落地页餐厅信息
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublicRestaurantResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub google_url: Option<String>,
    pub timezone: String,
    pub prizes: Vec<PublicPrize>,
}

impl From<&RestaurantCatalog> for PublicRestaurantResponse {
    fn from(c: &RestaurantCatalog) -> Self {
        PublicRestaurantResponse {
            id: c.id,
            name: c.name.clone(),
            slug: c.slug.clone(),
            logo_url: c.logo_url.clone(),
            google_url: c.google_url.clone(),
            timezone: c.timezone.clone(),
            prizes: c.prizes.iter().map(PublicPrize::from).collect(),
        }
    }
}
