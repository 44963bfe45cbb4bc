use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub spin: SpinConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// 抽奖活动参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpinConfig {
    /// 设备指纹 / IP 哈希盐
    #[serde(default)]
    pub hash_salt: String,
    /// 同一 IP 24 小时内最多抽奖次数
    #[serde(default = "default_ip_daily_limit")]
    pub ip_daily_limit: u64,
    /// "未中奖"扇区权重 = 可用奖品总权重 * miss_ratio
    #[serde(default = "default_miss_ratio")]
    pub miss_ratio: f64,
    /// 序列化冲突时整个事务的最大尝试次数
    #[serde(default = "default_max_txn_attempts")]
    pub max_txn_attempts: u32,
    /// 核销短码长度
    #[serde(default = "default_short_code_len")]
    pub short_code_len: usize,
}

fn default_ip_daily_limit() -> u64 {
    3
}

fn default_miss_ratio() -> f64 {
    crate::services::DEFAULT_MISS_RATIO
}

fn default_max_txn_attempts() -> u32 {
    3
}

fn default_short_code_len() -> usize {
    8
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            hash_salt: String::new(),
            ip_daily_limit: default_ip_daily_limit(),
            miss_ratio: default_miss_ratio(),
            max_txn_attempts: default_max_txn_attempts(),
            short_code_len: default_short_code_len(),
        }
    }
}

impl SpinConfig {
    /// 归一化: miss_ratio 限制在 [0, 10]，至少尝试一次事务，短码 4..=32 位
    pub fn normalized(mut self) -> Self {
        if !self.miss_ratio.is_finite() {
            self.miss_ratio = default_miss_ratio();
        }
        self.miss_ratio = self.miss_ratio.clamp(0.0, 10.0);
        self.max_txn_attempts = self.max_txn_attempts.max(1);
        self.short_code_len = self.short_code_len.clamp(4, 32);
        self
    }
}

impl Config {
    pub fn from_toml() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => Self::parse(&config_str)
                .with_context(|| format!("failed to parse config file {config_path}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 数据库 URL 在无配置文件时必须提供
                let database_url = env::var("DATABASE_URL").map_err(|_| {
                    anyhow!("DATABASE_URL is not set and no config file found at {config_path}")
                })?;

                Config {
                    server: ServerConfig {
                        host: "0.0.0.0".to_string(),
                        port: 8080,
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: 10,
                    },
                    spin: SpinConfig::default(),
                }
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read config file {config_path}"));
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        config.apply_env_overrides(|name| env::var(name).ok());
        config.spin = config.spin.normalized();

        Ok(config)
    }

    pub fn parse(config_str: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(config_str)?;
        Ok(config)
    }

    /// 用 `lookup` 提供的变量覆盖配置 (生产环境为进程环境变量)
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = lookup("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Some(v) = lookup("SPIN_HASH_SALT") {
            self.spin.hash_salt = v;
        }
        if let Some(v) = lookup("SPIN_IP_DAILY_LIMIT")
            && let Ok(n) = v.parse()
        {
            self.spin.ip_daily_limit = n;
        }
        if let Some(v) = lookup("SPIN_MISS_RATIO")
            && let Ok(r) = v.parse()
        {
            self.spin.miss_ratio = r;
        }
        if let Some(v) = lookup("SPIN_MAX_TXN_ATTEMPTS")
            && let Ok(n) = v.parse()
        {
            self.spin.max_txn_attempts = n;
        }
        if let Some(v) = lookup("SPIN_SHORT_CODE_LEN")
            && let Ok(n) = v.parse()
        {
            self.spin.short_code_len = n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
[server]
host = "127.0.0.1"
port = 3000

[database]
url = "postgres://localhost/spin"
max_connections = 5
"#;

    #[test]
    fn test_parse_uses_spin_defaults_when_section_missing() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.spin.ip_daily_limit, 3);
        assert_eq!(config.spin.max_txn_attempts, 3);
        assert_eq!(config.spin.short_code_len, 8);
        assert!((config.spin.miss_ratio - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config::parse(SAMPLE).unwrap();
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SERVER_PORT", "9090"),
            ("SPIN_HASH_SALT", "pepper"),
            ("SPIN_IP_DAILY_LIMIT", "5"),
            ("SPIN_MISS_RATIO", "not-a-number"),
        ]);
        config.apply_env_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.spin.hash_salt, "pepper");
        assert_eq!(config.spin.ip_daily_limit, 5);
        // 无法解析的值保持原样
        assert!((config.spin.miss_ratio - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_normalized_clamps_values() {
        let spin = SpinConfig {
            miss_ratio: -1.0,
            max_txn_attempts: 0,
            short_code_len: 100,
            ..SpinConfig::default()
        }
        .normalized();
        assert_eq!(spin.miss_ratio, 0.0);
        assert_eq!(spin.max_txn_attempts, 1);
        assert_eq!(spin.short_code_len, 32);
    }
}
