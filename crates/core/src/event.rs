//! 이벤트 시스템 — 캡처 파이프라인이 하류로 내보내는 이벤트 정의
//!
//! 분류기가 생성하는 두 종류의 이벤트([`HoneypotEvent`], [`NetworkEvent`])와
//! 모든 이벤트에 공통으로 포함되는 [`EventMetadata`]를 정의합니다.
//! 이벤트는 생성 후 불변이며 해당 싱크 채널에 정확히 한 번 푸시됩니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

// --- 모듈명 상수 ---

/// 네트워크 캡처 모듈명
pub const MODULE_NET_CAPTURE: &str = "net-capture";

// --- 이벤트 타입 상수 ---

/// 허니팟 이벤트 타입
pub const EVENT_TYPE_HONEYPOT: &str = "honeypot";
/// 일반 네트워크 이벤트 타입
pub const EVENT_TYPE_NETWORK: &str = "network";

/// 이벤트 메타데이터 — 모든 이벤트에 공통으로 포함되는 추적 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// 이벤트 발생 시각
    pub timestamp: SystemTime,
    /// 이벤트를 생성한 모듈명
    pub source_module: String,
    /// 분산 추적 ID — 같은 흐름의 이벤트를 연결합니다
    pub trace_id: String,
}

impl EventMetadata {
    /// 새로운 UUID v4 trace_id를 생성하여 메타데이터를 만듭니다.
    pub fn with_new_trace(source_module: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// 모든 이벤트가 구현해야 하는 기본 trait
///
/// `Send + Sync + 'static` 바운드로 `tokio::mpsc` 채널을 통한
/// 안전한 전송을 보장합니다.
pub trait Event: Send + Sync + 'static {
    /// 이벤트 고유 ID (UUID v4)
    fn event_id(&self) -> &str;

    /// 이벤트 메타데이터
    fn metadata(&self) -> &EventMetadata;

    /// 이벤트 타입명 (로깅 및 라우팅에 사용)
    fn event_type(&self) -> &str;
}

/// 허니팟으로 향한 트래픽에서 생성된 이벤트
///
/// 목적지 포트가 포트 레지스트리에 등록된 패킷마다 하나씩 생성됩니다.
/// 주소는 패킷에서 관찰된 문자열 그대로 보존합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoneypotEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 목적지 IP
    pub dest_ip: String,
    /// 목적지 포트 (0이면 트랜스포트 계층 없음)
    pub dest_port: u16,
    /// 출발지 IP
    pub src_ip: String,
    /// 출발지 포트 (0이면 트랜스포트 계층 없음)
    pub src_port: u16,
    /// 프로토콜 이름 (TCP, UDP 등)
    pub protocol: String,
    /// 해당 포트를 소유한 허니팟 모듈명
    pub module_name: String,
    /// 관찰 호스트 식별자
    pub observing_host: String,
}

impl HoneypotEvent {
    /// 새 허니팟 이벤트를 생성합니다.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dest_ip: impl Into<String>,
        dest_port: u16,
        src_ip: impl Into<String>,
        src_port: u16,
        protocol: impl Into<String>,
        module_name: impl Into<String>,
        observing_host: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_NET_CAPTURE),
            dest_ip: dest_ip.into(),
            dest_port,
            src_ip: src_ip.into(),
            src_port,
            protocol: protocol.into(),
            module_name: module_name.into(),
            observing_host: observing_host.into(),
        }
    }
}

impl Event for HoneypotEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_HONEYPOT
    }
}

impl fmt::Display for HoneypotEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HoneypotEvent[{}] {}:{} -> {}:{} proto={} module={}",
            &self.id[..8.min(self.id.len())],
            self.src_ip,
            self.src_port,
            self.dest_ip,
            self.dest_port,
            self.protocol,
            self.module_name,
        )
    }
}

/// 허니팟과 무관한 일반 네트워크 트래픽 이벤트
///
/// 유효한 IP 계층을 가지지만 어느 포트도 레지스트리에 등록되지 않은
/// 패킷마다 하나씩 생성됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 목적지 IP
    pub dest_ip: String,
    /// 목적지 포트 (0이면 트랜스포트 계층 없음)
    pub dest_port: u16,
    /// 출발지 IP
    pub src_ip: String,
    /// 출발지 포트 (0이면 트랜스포트 계층 없음)
    pub src_port: u16,
    /// 프로토콜 이름 (TCP, UDP 등)
    pub protocol: String,
    /// 관찰 호스트 식별자
    pub observing_host: String,
}

impl NetworkEvent {
    /// 새 네트워크 이벤트를 생성합니다.
    pub fn new(
        dest_ip: impl Into<String>,
        dest_port: u16,
        src_ip: impl Into<String>,
        src_port: u16,
        protocol: impl Into<String>,
        observing_host: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_NET_CAPTURE),
            dest_ip: dest_ip.into(),
            dest_port,
            src_ip: src_ip.into(),
            src_port,
            protocol: protocol.into(),
            observing_host: observing_host.into(),
        }
    }
}

impl Event for NetworkEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_NETWORK
    }
}

impl fmt::Display for NetworkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NetworkEvent[{}] {}:{} -> {}:{} proto={}",
            &self.id[..8.min(self.id.len())],
            self.src_ip,
            self.src_port,
            self.dest_ip,
            self.dest_port,
            self.protocol,
        )
    }
}
