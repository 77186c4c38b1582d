//! hivetrap-net-capture — 허니팟 트래픽 캡처 및 분류 파이프라인
//!
//! 실머신에 도달하는 트래픽을 캡처하여 허니팟으로 향한 연결과 일반
//! 네트워크 트래픽으로 분류하고, 각각의 이벤트 싱크로 흘려보냅니다.
//!
//! # 모듈 구성
//!
//! - [`registry`]: 디코이 포트 → 허니팟 모듈 매핑
//! - [`filter`]: 무시 정책으로부터 캡처 필터 식 컴파일
//! - [`resolver`]: 컨테이너 네트워크 게이트웨이 IP 조회
//! - [`packet`]: 타입 지정 패킷 표현 및 디코딩
//! - [`classifier`]: 패킷 단위 허니팟/네트워크/폐기 판정
//! - [`backend`]: 캡처 세션 추상화 및 libpcap 구현
//! - [`monitor`]: 세션 수명주기, 로테이션, 이벤트 파이프라인
//! - [`config`]: 전역 설정에서 유도되는 캡처 런타임 설정
//!
//! # 데이터 흐름
//!
//! ```text
//! interface -> CaptureBackend -> RawPacket -> classify -> HoneypotEvent sink
//!                  |                             |
//!               Savefile                    NetworkEvent sink / drop
//! ```

pub mod backend;
pub mod classifier;
pub mod config;
pub mod filter;
pub mod monitor;
pub mod packet;
pub mod registry;
pub mod resolver;

// --- 주요 타입 re-export ---

// 모니터
pub use monitor::{CaptureCounters, MonitorState, NetworkMonitor, NetworkMonitorBuilder};

// 백엔드
pub use backend::{CaptureBackend, CaptureSession, DeliverOutcome, PcapCaptureBackend};

// 분류
pub use classifier::{Decision, classify};
pub use packet::{IpLayer, RawPacket, TransportLayer};
pub use registry::PortRegistry;

// 필터
pub use filter::{IgnoreSet, compile};

// 조회
pub use resolver::{DockerGatewayResolver, GatewayResolver, NullResolver};

// 설정
pub use config::MonitorConfig;
