//! 웹훅 메시지 페이로드.
//!
//! multipart 요청의 `payload_json` 필드로 직렬화되는 임베드 메시지.

use aurawatch_core::models::detection::Detection;
use aurawatch_core::models::stats::StatsSnapshot;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// 시스템 메시지(스크린샷/통계) 강조색
pub const NOTICE_COLOR: u32 = 7_289_397;

/// 웹훅 요청 본문
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// 멘션 텍스트
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}

/// 임베드 메시지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub description: String,
    /// 24비트 강조색
    pub color: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedMedia>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedMedia>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedMedia {
    pub url: String,
}

impl EmbedMedia {
    pub fn attachment(file_name: &str) -> Self {
        Self {
            url: format!("attachment://{file_name}"),
        }
    }
}

/// 탐지 알림.
///
/// `mention`이 있으면 본문에 `<@id>` 멘션을 넣는다.
pub fn detection_payload(
    detection: &Detection,
    file_name: &str,
    mention: Option<&str>,
) -> WebhookPayload {
    let profile = &detection.profile;
    WebhookPayload {
        content: mention.map(|id| format!("<@{id}>")),
        embeds: vec![Embed {
            title: Some(format!("# You rolled {}!", profile.name)),
            description: format!("** 1/{} **", profile.rarity),
            color: profile.color.to_u24(),
            image: Some(EmbedMedia {
                url: profile.image.clone().unwrap_or_default(),
            }),
            thumbnail: Some(EmbedMedia::attachment(file_name)),
        }],
    }
}

/// 즉시 스크린샷
pub fn screenshot_payload(file_name: &str, taken_at: DateTime<Local>) -> WebhookPayload {
    WebhookPayload {
        content: None,
        embeds: vec![Embed {
            title: Some("Screenshot Captured".to_string()),
            description: format!("Screenshot taken at {}", taken_at.format("%H:%M:%S")),
            color: NOTICE_COLOR,
            image: Some(EmbedMedia::attachment(file_name)),
            thumbnail: None,
        }],
    }
}

/// 통계 보고
pub fn stats_payload(stats: &StatsSnapshot) -> WebhookPayload {
    let mut lines = vec![
        format!("Running: {}", if stats.running { "yes" } else { "no" }),
        format!("Polls: {} (skipped {})", stats.polls, stats.skipped_polls),
        format!("Detections: {}", stats.detections),
        format!(
            "Notifications: {} sent, {} failed",
            stats.notifications_sent, stats.notification_failures
        ),
    ];
    if let Some(started) = stats.started_at {
        lines.push(format!(
            "Started: {}",
            started.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        ));
    }
    if let Some(name) = &stats.last_detection {
        lines.push(format!("Last aura: {name}"));
    }

    WebhookPayload {
        content: None,
        embeds: vec![Embed {
            title: Some("Macro Stats".to_string()),
            description: lines.join("\n"),
            color: NOTICE_COLOR,
            image: None,
            thumbnail: None,
        }],
    }
}
