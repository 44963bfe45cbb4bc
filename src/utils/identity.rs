use sha2::{Digest, Sha256};

/// 原始值缺失时的占位符
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// 标识类型，决定哈希前缀 (命名空间隔离设备与 IP)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    Device,
    Ip,
}

impl IdentityKind {
    fn prefix(&self) -> &'static str {
        match self {
            IdentityKind::Device => "fp",
            IdentityKind::Ip => "ip",
        }
    }
}

/// 计算不可逆的身份摘要: sha256("{prefix}:{raw}:{salt}")，64 位小写 hex
/// 原始值缺失或为空串时使用 `unknown`，其余值原样参与哈希；本函数不会失败
pub fn hash_identity(kind: IdentityKind, raw: Option<&str>, salt: &str) -> String {
    let raw = raw.filter(|v| !v.is_empty()).unwrap_or(UNKNOWN_IDENTITY);

    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}:{}", kind.prefix(), raw, salt).as_bytes());
    hex::encode(hasher.finalize())
}

/// 一次抽奖请求的设备 / IP 摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinIdentity {
    pub device_digest: String,
    pub ip_digest: String,
}

impl SpinIdentity {
    pub fn derive(fingerprint: Option<&str>, ip: Option<&str>, salt: &str) -> Self {
        Self {
            device_digest: hash_identity(IdentityKind::Device, fingerprint, salt),
            ip_digest: hash_identity(IdentityKind::Ip, ip, salt),
        }
    }
}
