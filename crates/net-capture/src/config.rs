//! 캡처 런타임 설정 — 전역 설정으로부터 유도되는 모니터 파라미터
//!
//! [`MonitorConfig`]는 `HivetrapConfig`에서 캡처 세션 운용에 필요한
//! 값만 뽑아낸 구조체입니다. 모니터가 전역 설정 타입에 의존하지 않도록
//! 유도 시점에 단위 변환(초 → [`Duration`])과 경로 조합을 끝냅니다.

use std::path::PathBuf;
use std::time::Duration;

use hivetrap_core::config::HivetrapConfig;

/// pcap 파일이 쌓이는 데이터 디렉터리 하위 경로
pub const PCAP_SUBDIR: &str = "pcapfiles";

/// 캡처 폴링 주기 기본값
///
/// 취소 요청은 최대 이 주기 안에 관측됩니다.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// 네트워크 모니터 런타임 설정
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// 이벤트의 `observing_host` 필드에 들어가는 센서 식별자
    pub observing_host: String,
    /// 캡처 인터페이스 이름 (`any`는 전체 인터페이스)
    pub interface: String,
    /// pcap 파일 저장 여부
    pub store_pcap: bool,
    /// 캡처 로테이션 윈도우 길이
    pub rotation_window: Duration,
    /// pcap 파일이 기록되는 디렉터리
    pub pcap_dir: PathBuf,
    /// 백엔드 폴링 주기 (취소 관측 지연의 상한)
    pub poll_timeout: Duration,
    /// 이벤트 싱크 채널 용량
    pub channel_capacity: usize,
}

impl MonitorConfig {
    /// 전역 설정으로부터 모니터 설정을 유도합니다.
    pub fn from_config(config: &HivetrapConfig) -> Self {
        Self {
            observing_host: config.network.real_machine_identifier_name.clone(),
            interface: config.network.interface.clone(),
            store_pcap: config.network.store_network_captured_files,
            rotation_window: Duration::from_secs(config.network.split_pcap_file_timeout),
            pcap_dir: PathBuf::from(&config.general.data_dir).join(PCAP_SUBDIR),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            channel_capacity: config.network.channel_capacity,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::from_config(&HivetrapConfig::default())
    }
}
