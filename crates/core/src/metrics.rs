//! 메트릭 상수 정의
//!
//! 모든 메트릭의 이름을 중앙에서 정의합니다. 각 모듈은 이 상수를 사용하여
//! `metrics::counter!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `hivetrap_`
//! - 모듈명: `capture_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(hivetrap_core::metrics::CAPTURE_PACKETS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 프로토콜 레이블 키 (TCP, UDP, ICMP, ...)
pub const LABEL_PROTOCOL: &str = "protocol";

/// 허니팟 모듈 레이블 키
pub const LABEL_MODULE: &str = "module";

// ─── 캡처 파이프라인 메트릭 ─────────────────────────────────────────

/// 캡처: 관찰된 전체 패킷 수 (counter)
pub const CAPTURE_PACKETS_TOTAL: &str = "hivetrap_capture_packets_total";

/// 캡처: 허니팟 이벤트 수 (counter, label: module)
pub const CAPTURE_HONEYPOT_EVENTS_TOTAL: &str = "hivetrap_capture_honeypot_events_total";

/// 캡처: 일반 네트워크 이벤트 수 (counter)
pub const CAPTURE_NETWORK_EVENTS_TOTAL: &str = "hivetrap_capture_network_events_total";

/// 캡처: 분류 단계에서 폐기된 패킷 수 (counter)
///
/// 분류 실패를 조용히 삼키는 정책을 관측 가능하게 만드는 카운터입니다.
/// 이 값이 급증하면 비정상 트래픽 폭주를 의심할 수 있습니다.
pub const CAPTURE_PACKETS_DROPPED_TOTAL: &str = "hivetrap_capture_packets_dropped_total";

/// 캡처: 세션 로테이션 횟수 (counter)
pub const CAPTURE_ROTATIONS_TOTAL: &str = "hivetrap_capture_rotations_total";

/// 캡처: 게이트웨이 주소 조회 실패 수 (counter, label: module)
pub const CAPTURE_RESOLVER_FAILURES_TOTAL: &str = "hivetrap_capture_resolver_failures_total";
