//! Hivetrap 공통 크레이트
//!
//! 캡처 파이프라인과 데몬이 공유하는 설정, 이벤트, 에러, 메트릭 상수를
//! 정의합니다. 캡처 로직 자체는 `hivetrap-net-capture`에 있습니다.

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{CaptureError, ConfigError, HivetrapError, PipelineError, ResolverError};

// 설정
pub use config::{HivetrapConfig, ModuleConfig, NetworkConfig};

// 이벤트
pub use event::{Event, EventMetadata, HoneypotEvent, NetworkEvent};

// 프로토콜 테이블
pub use types::protocol_name;
