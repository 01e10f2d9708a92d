//! # Notifier 設定
//!
//! 環境変数から Notifier サーバーの設定を読み込む。
//!
//! テストから環境変数を汚さずに検証できるよう、読み込みは
//! [`NotifierConfig::from_source`] に値の取得関数を渡す形で行う。

use std::{env, num::NonZeroU32, str::FromStr, time::Duration};

use formmail_domain::access::{AllowedIps, RateLimitPolicy, RateLimitPolicyError};
use formmail_infra::notification::{SmtpSettings, SmtpTls};
use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    /// 値が不正
    #[error("{name} の値が不正です: {value:?} ({reason})")]
    Invalid {
        name:   &'static str,
        value:  String,
        reason: String,
    },
}

/// 送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationBackend {
    /// SMTP リレー経由で送信
    #[default]
    Smtp,
    /// 送信しない（ログ出力のみ）
    Noop,
}

impl FromStr for NotificationBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "smtp" => Ok(Self::Smtp),
            "noop" => Ok(Self::Noop),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

/// Notifier サーバーの設定
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// 送信バックエンド
    pub backend: NotificationBackend,
    /// SMTP 設定（backend=smtp の場合のみ）
    pub smtp: Option<SmtpSettings>,
    /// お問い合わせの宛先（設定順）
    pub recipients: Vec<String>,
    /// IP 許可リスト（空なら全許可）
    pub allowed_ips: AllowedIps,
    /// `X-Forwarded-For` / `X-Real-IP` をクライアント IP として信頼するか
    ///
    /// リバースプロキシの背後で動かす場合のみ true にする。false なら接続元アドレスのみを使う。
    pub trust_proxy_headers: bool,
    /// レート制限
    pub rate_limit: RateLimitPolicy,
    /// リクエストボディの上限（バイト）
    pub body_limit: usize,
    /// メール内リンクのベース URL
    pub base_url: String,
}

impl NotifierConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|name| env::var(name).ok())
    }

    /// 任意の取得関数から設定を読み込む
    ///
    /// 空文字列の値は未設定として扱う。
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source(lookup);

        let backend = source.parse_or("NOTIFICATION_BACKEND", NotificationBackend::Smtp)?;
        let smtp = match backend {
            NotificationBackend::Smtp => Some(smtp_settings(&source)?),
            NotificationBackend::Noop => None,
        };

        let burst: u32 = source.parse_or("RATE_LIMIT_BURST", 30)?;
        let per_second: u32 = source.parse_or("RATE_LIMIT_PER_SECOND", 10)?;
        let expiry_secs: u64 = source.parse_or("RATE_LIMIT_EXPIRY_SECS", 180)?;

        let rate_limit = RateLimitPolicy::new(
            non_zero("RATE_LIMIT_BURST", burst)?,
            non_zero("RATE_LIMIT_PER_SECOND", per_second)?,
            Duration::from_secs(1),
            Duration::from_secs(expiry_secs),
        )
        .map_err(|e| {
            let (name, value) = match e {
                RateLimitPolicyError::ZeroRefillInterval { .. } => {
                    ("RATE_LIMIT_PER_SECOND", per_second.to_string())
                }
                RateLimitPolicyError::IdleExpiryTooShort { .. } => {
                    ("RATE_LIMIT_EXPIRY_SECS", expiry_secs.to_string())
                }
            };
            ConfigError::Invalid {
                name,
                value,
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            host: source
                .get("NOTIFIER_HOST")
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: source.parse_or("PORT", 8080)?,
            backend,
            smtp,
            recipients: parse_list(&source.get("RECIPIENTS").unwrap_or_default()),
            allowed_ips: AllowedIps::parse(&source.get("ALLOWED_IP").unwrap_or_default()),
            trust_proxy_headers: source.parse_or("TRUST_PROXY_HEADERS", true)?,
            rate_limit,
            body_limit: source.parse_or("BODY_LIMIT_BYTES", 2048)?,
            base_url: source
                .get("NOTIFICATION_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "https://rent.ragodevs.com".to_string()),
        })
    }
}

/// SMTP 関連の環境変数を読み込む
fn smtp_settings<F>(source: &Source<F>) -> Result<SmtpSettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let username = source.require("EMAIL_USER")?;
    // 送信元は未指定ならリレーのユーザー名
    let from_address = source.get("EMAIL_FROM").unwrap_or_else(|| username.clone());

    Ok(SmtpSettings {
        host: source.require("EMAIL_HOST")?,
        port: source.parse_or("EMAIL_PORT", 587)?,
        password: source.require("EMAIL_PASS")?,
        username,
        from_address,
        tls: source.parse_or("EMAIL_TLS", SmtpTls::StartTls)?,
        timeout: Duration::from_secs(source.parse_or("EMAIL_TIMEOUT_SECS", 10)?),
    })
}

/// カンマ区切りのリストを分割する（前後の空白除去、空要素は除外）
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_zero(name: &'static str, value: u32) -> Result<NonZeroU32, ConfigError> {
    NonZeroU32::new(value).ok_or_else(|| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: "must be greater than zero".to_string(),
    })
}

struct Source<F>(F);

impl<F> Source<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|v| !v.trim().is_empty())
    }

    fn require(&self, name: &'static str) -> Result<String, ConfigError> {
        self.get(name).ok_or(ConfigError::Missing(name))
    }

    fn parse_or<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
                value,
            }),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<NotifierConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        NotifierConfig::from_source(|name| map.get(name).cloned())
    }

    fn smtp_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("EMAIL_HOST", "smtp.example.com"),
            ("EMAIL_USER", "mailer@example.com"),
            ("EMAIL_PASS", "secret"),
        ]
    }

    #[test]
    fn test_smtp必須項目のみでデフォルト値が設定される() {
        let config = load(&smtp_vars()).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.backend, NotificationBackend::Smtp);
        assert!(config.recipients.is_empty());
        assert!(config.allowed_ips.is_open());
        assert!(config.trust_proxy_headers);
        assert_eq!(config.rate_limit.capacity(), 30);
        assert_eq!(config.rate_limit.refill_interval(), Duration::from_millis(100));
        assert_eq!(config.rate_limit.idle_expiry(), Duration::from_secs(180));
        assert_eq!(config.body_limit, 2048);
        assert_eq!(config.base_url, "https://rent.ragodevs.com");

        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.from_address, "mailer@example.com");
        assert_eq!(smtp.tls, SmtpTls::StartTls);
        assert_eq!(smtp.timeout, Duration::from_secs(10));
    }

    #[rstest]
    #[case("EMAIL_HOST")]
    #[case("EMAIL_USER")]
    #[case("EMAIL_PASS")]
    fn test_smtpの必須項目が欠けるとエラー(#[case] missing: &str) {
        let vars: Vec<_> = smtp_vars()
            .into_iter()
            .filter(|(k, _)| *k != missing)
            .collect();

        let err = load(&vars).unwrap_err();

        assert!(matches!(err, ConfigError::Missing(name) if name == missing));
    }

    #[test]
    fn test_noopバックエンドではsmtp設定不要() {
        let config = load(&[("NOTIFICATION_BACKEND", "noop")]).unwrap();

        assert_eq!(config.backend, NotificationBackend::Noop);
        assert!(config.smtp.is_none());
    }

    #[test]
    fn test_宛先と許可リストはカンマ区切りで空白を除去する() {
        let config = load(&[
            ("NOTIFICATION_BACKEND", "noop"),
            ("RECIPIENTS", " ops@example.com, sales@example.com ,,"),
            ("ALLOWED_IP", "10.0.0.1, 10.0.0.2"),
        ])
        .unwrap();

        assert_eq!(
            config.recipients,
            vec!["ops@example.com".to_string(), "sales@example.com".to_string()]
        );
        assert_eq!(config.allowed_ips.len(), 2);
        assert!(config.allowed_ips.permits("10.0.0.2"));
    }

    #[rstest]
    #[case("PORT", "not-a-port")]
    #[case("EMAIL_PORT", "99999")]
    #[case("EMAIL_TLS", "ssl3")]
    #[case("RATE_LIMIT_BURST", "0")]
    #[case("RATE_LIMIT_EXPIRY_SECS", "0")]
    #[case("TRUST_PROXY_HEADERS", "yes")]
    #[case("NOTIFICATION_BACKEND", "ses")]
    fn test_不正な値はinvalidエラー(#[case] name: &str, #[case] value: &str) {
        let mut vars = smtp_vars();
        vars.push((name, value));

        let err = load(&vars).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { name: n, .. } if n == name));
    }

    #[rstest]
    #[case(&[("RATE_LIMIT_EXPIRY_SECS", "2")], false)]
    #[case(&[("RATE_LIMIT_EXPIRY_SECS", "3")], true)]
    #[case(&[("RATE_LIMIT_BURST", "600"), ("RATE_LIMIT_PER_SECOND", "1")], false)]
    #[case(&[("RATE_LIMIT_BURST", "600"), ("RATE_LIMIT_PER_SECOND", "1"), ("RATE_LIMIT_EXPIRY_SECS", "600")], true)]
    fn test_アイドル期間は満杯までの補充時間以上が必要(
        #[case] overrides: &[(&str, &str)],
        #[case] accepted: bool,
    ) {
        let mut vars = vec![("NOTIFICATION_BACKEND", "noop")];
        vars.extend_from_slice(overrides);

        let result = load(&vars);

        assert_eq!(result.is_ok(), accepted, "{result:?}");
        if let Err(err) = result {
            assert!(matches!(
                err,
                ConfigError::Invalid { name: "RATE_LIMIT_EXPIRY_SECS", .. }
            ));
        }
    }

    #[test]
    fn test_プロキシヘッダーの信頼は無効化できる() {
        let config = load(&[
            ("NOTIFICATION_BACKEND", "noop"),
            ("TRUST_PROXY_HEADERS", "false"),
        ])
        .unwrap();

        assert!(!config.trust_proxy_headers);
    }

    #[test]
    fn test_email_fromを指定すると送信元が上書きされる() {
        let mut vars = smtp_vars();
        vars.push(("EMAIL_FROM", "noreply@example.com"));

        let smtp = load(&vars).unwrap().smtp.unwrap();

        assert_eq!(smtp.from_address, "noreply@example.com");
        assert_eq!(smtp.username, "mailer@example.com");
    }

    #[test]
    fn test_debug出力にパスワードが含まれない() {
        let config = load(&smtp_vars()).unwrap();

        let debug = format!("{config:?}");

        assert!(!debug.contains("secret"));
    }
}
