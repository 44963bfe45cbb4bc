use uuid::Uuid;

use crate::models::ClaimCredentials;

/// 生成中奖凭证: UUID v4 (122 位随机) 作为 token，短码取其末尾若干位大写
pub fn generate_claim_credentials(short_code_len: usize) -> ClaimCredentials {
    let token = Uuid::new_v4().to_string();
    let short_code = short_code(&token, short_code_len);
    ClaimCredentials { token, short_code }
}

/// 去掉 '-' 后取末尾 `len` 个字符并转大写
pub fn short_code(token: &str, len: usize) -> String {
    let compact: Vec<char> = token.chars().filter(|c| *c != '-').collect();
    let start = compact.len().saturating_sub(len);
    compact[start..]
        .iter()
        .collect::<String>()
        .to_ascii_uppercase()
}
