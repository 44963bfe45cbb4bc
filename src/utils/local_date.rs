use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// 计算 `now` 在餐厅时区下的日历日期 (每日计数的 key)
/// 无法识别的时区按 UTC 处理并记录警告
pub fn local_date(now: DateTime<Utc>, timezone: &str) -> NaiveDate {
    match timezone.parse::<Tz>() {
        Ok(tz) => now.with_timezone(&tz).date_naive(),
        Err(_) => {
            log::warn!("Unknown restaurant timezone {timezone:?}, falling back to UTC");
            now.date_naive()
        }
    }
}
