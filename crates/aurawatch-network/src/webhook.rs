//! 웹훅 알림 클라이언트.
//!
//! `AuraNotifier` 포트 구현. 이미지 파일을 첨부한 multipart 요청으로
//! 임베드 메시지를 전송한다. 실패는 재시도하지 않는다.

use std::path::Path;

use async_trait::async_trait;
use aurawatch_core::config::WebhookConfig;
use aurawatch_core::error::CoreError;
use aurawatch_core::models::detection::{DeliveryOutcome, Detection};
use aurawatch_core::models::stats::StatsSnapshot;
use aurawatch_core::ports::notifier::AuraNotifier;
use chrono::Local;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info, warn};

use crate::embed::{detection_payload, screenshot_payload, stats_payload, WebhookPayload};

/// 첨부 파일 MIME 타입
const ATTACHMENT_MIME: &str = "image/png";

/// 웹훅 알림 클라이언트: `AuraNotifier` 포트 구현
pub struct WebhookNotifier {
    client: reqwest::Client,
    config: WebhookConfig,
}

impl WebhookNotifier {
    /// 새 웹훅 클라이언트 생성
    pub fn new(config: WebhookConfig) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {}", e)))?;

        Ok(Self { client, config })
    }

    /// 희귀도가 멘션 기준 이상이고 사용자 ID가 있으면 멘션 대상
    fn mention_for(&self, rarity: u64) -> Option<&str> {
        if rarity >= self.config.ping_minimum && !self.config.user_id.is_empty() {
            Some(self.config.user_id.as_str())
        } else {
            None
        }
    }

    /// 페이로드 + 선택적 첨부 파일 전송
    async fn post(
        &self,
        payload: &WebhookPayload,
        attachment: Option<&Path>,
    ) -> Result<DeliveryOutcome, CoreError> {
        if self.config.url.is_empty() {
            warn!("웹훅 URL 미설정, 전송 생략");
            return Ok(DeliveryOutcome::Skipped {
                reason: "webhook url not configured".to_string(),
            });
        }

        let mut form = Form::new().text("payload_json", serde_json::to_string(payload)?);

        if let Some(path) = attachment {
            let bytes = tokio::fs::read(path).await.map_err(|e| {
                CoreError::Internal(format!("첨부 파일 읽기 실패: {}: {e}", path.display()))
            })?;
            let part = Part::bytes(bytes)
                .file_name(attachment_name(path))
                .mime_str(ATTACHMENT_MIME)
                .map_err(|e| CoreError::Internal(format!("첨부 파트 생성 실패: {e}")))?;
            form = form.part("file", part);
        }

        let resp = self
            .client
            .post(&self.config.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("웹훅 전송 실패: {e}")))?;

        check_response(resp).await
    }
}

/// 200/204만 성공으로 처리
async fn check_response(resp: reqwest::Response) -> Result<DeliveryOutcome, CoreError> {
    let status = resp.status().as_u16();
    if status == 200 || status == 204 {
        debug!("웹훅 전송 완료 ({status})");
        return Ok(DeliveryOutcome::Delivered { status });
    }

    let body = resp.text().await.unwrap_or_else(|e| {
        warn!("응답 본문 읽기 실패: {e}");
        String::new()
    });
    Err(CoreError::Delivery { status, body })
}

fn attachment_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment.png".to_string())
}

#[async_trait]
impl AuraNotifier for WebhookNotifier {
    async fn notify_detection(
        &self,
        detection: &Detection,
        attachment: &Path,
    ) -> Result<DeliveryOutcome, CoreError> {
        let profile = &detection.profile;
        if profile.rarity < self.config.send_minimum {
            info!(
                "전송 기준 미달, {} (1/{} < 1/{})",
                profile.name, profile.rarity, self.config.send_minimum
            );
            return Ok(DeliveryOutcome::Skipped {
                reason: format!("rarity below send minimum ({})", self.config.send_minimum),
            });
        }

        let payload = detection_payload(
            detection,
            &attachment_name(attachment),
            self.mention_for(profile.rarity),
        );
        let outcome = self.post(&payload, Some(attachment)).await?;
        info!("탐지 알림 전송: {} ({})", profile.name, detection.shape);
        Ok(outcome)
    }

    async fn send_screenshot(&self, attachment: &Path) -> Result<DeliveryOutcome, CoreError> {
        let payload = screenshot_payload(&attachment_name(attachment), Local::now());
        self.post(&payload, Some(attachment)).await
    }

    async fn send_stats(&self, stats: &StatsSnapshot) -> Result<DeliveryOutcome, CoreError> {
        self.post(&stats_payload(stats), None).await
    }
}
