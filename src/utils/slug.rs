use regex::Regex;
use std::sync::OnceLock;

use crate::error::{AppError, AppResult};

fn slug_regex() -> &'static Regex {
    static SLUG: OnceLock<Regex> = OnceLock::new();
    SLUG.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]{0,63}$").expect("valid slug regex"))
}

/// 校验餐厅 slug；格式不合法直接视为不存在，不访问数据库
pub fn validate_slug(slug: &str) -> AppResult<()> {
    if !slug_regex().is_match(slug) {
        return Err(AppError::NotFound("Restaurant not found".to_string()));
    }
    Ok(())
}
