//! Built-in configuration defaults.

pub(super) fn model_name() -> String {
    "gpt-4o".to_string()
}

pub(super) fn max_tokens() -> u32 {
    4096
}

pub(super) fn temperature() -> f32 {
    0.7
}

pub(super) fn stage_timeout_secs() -> u64 {
    60
}

pub(super) fn base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

pub(super) fn host() -> String {
    "127.0.0.1".to_string()
}

pub(super) fn port() -> u16 {
    8000
}

pub(super) fn max_image_bytes() -> usize {
    5_242_880
}

pub(super) fn enabled() -> bool {
    true
}

pub(super) fn rate_limit_per_minute() -> u32 {
    5
}

pub(super) fn health_rate_limit_per_minute() -> u32 {
    60
}

pub(super) fn cache_ttl_secs() -> u64 {
    3600
}

pub(super) fn cache_max_size() -> usize {
    100
}
