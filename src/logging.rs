//! 安全的日志记录工具
//!
//! Credentials such as the GCP billing API key must never reach the logs in
//! clear text.

use std::fmt;

/// 脱敏后的 API key 表示
///
/// Shows at most the first 4 characters followed by `***`.
#[derive(Clone, Debug)]
pub struct SensitiveApiKey<'a> {
    inner: &'a str,
}

impl<'a> SensitiveApiKey<'a> {
    /// # 示例
    /// ```
    /// use cloud_cost_gateway::logging::SensitiveApiKey;
    ///
    /// let sanitized = SensitiveApiKey::new("AIzaSyExampleKey123");
    /// assert_eq!(format!("{}", sanitized), "AIza***");
    /// ```
    pub fn new(key: &'a str) -> Self {
        Self { inner: key }
    }
}

impl<'a> fmt::Display for SensitiveApiKey<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible_len = 4;
        match self.inner.get(..visible_len) {
            // Short keys are fully masked
            Some(prefix) if self.inner.len() > visible_len * 2 => write!(f, "{}***", prefix),
            _ => write!(f, "***"),
        }
    }
}

/// Mask `key=` query parameters in a URL before logging it
pub fn redact_url(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let query = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) if name == "key" => format!("{}={}", name, SensitiveApiKey::new(value)),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", base, query)
}
