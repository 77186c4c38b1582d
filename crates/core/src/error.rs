//! 에러 타입 — 도메인별 에러 정의

/// Hivetrap 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum HivetrapError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 캡처 백엔드 에러
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 게이트웨이 주소 조회 에러
    #[error("resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 캡처 백엔드 에러
///
/// 세션 타임아웃(로테이션 경계)은 정상 동작이므로 여기에 포함되지 않습니다.
/// 이 타입의 모든 변형은 캡처 루프를 종료시키는 치명적 에러입니다.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// 캡처 세션 열기 실패
    #[error("failed to open capture session: {0}")]
    OpenFailed(String),

    /// 캡처 필터 적용 실패
    #[error("failed to apply capture filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },

    /// pcap 저장 파일 생성 실패
    #[error("failed to create capture output '{path}': {reason}")]
    Output { path: String, reason: String },

    /// 백엔드 패킷 수신 중 에러
    #[error("capture backend error: {0}")]
    Backend(String),

    /// 세션 닫기 실패
    #[error("failed to close capture session: {0}")]
    CloseFailed(String),
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 이벤트 채널 전송 실패 (수신 측이 닫힘)
    #[error("channel send failed: {0}")]
    ChannelSend(String),

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 이미 실행 중
    #[error("pipeline is already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("pipeline is not running")]
    NotRunning,
}

/// 게이트웨이 주소 조회 에러
///
/// 모듈 단위로 격리되는 에러입니다. 필터 컴파일러는 이 에러를
/// 로깅한 뒤 해당 모듈만 건너뜁니다.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    /// Docker 데몬 연결 실패
    #[error("docker connection failed: {0}")]
    Connection(String),

    /// 컨테이너를 찾을 수 없음
    #[error("container not found: {0}")]
    NotFound(String),

    /// 게이트웨이 주소가 없거나 파싱 불가
    #[error("no usable gateway address for container '{container}': {reason}")]
    NoGateway { container: String, reason: String },
}
