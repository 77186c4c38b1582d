//! 네트워크 모니터 — 캡처 세션 수명주기와 이벤트 파이프라인
//!
//! [`NetworkMonitor`]는 캡처 백엔드 위에서 세션 열기 → 수신 → 로테이션 →
//! 닫기 상태 기계를 구동합니다. 수신한 패킷마다 분류기를 호출하고,
//! 판정에 따라 허니팟/네트워크 이벤트 싱크로 푸시합니다.
//!
//! `run()`은 블로킹 호출입니다. async 런타임에서는 `spawn_blocking`으로
//! 실행하고, 취소 토큰으로 종료를 요청합니다. 취소는 에러가 아니며
//! 정리 후 `Ok(())`로 반환됩니다.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use hivetrap_core::error::{CaptureError, HivetrapError, PipelineError};
use hivetrap_core::event::{HoneypotEvent, NetworkEvent};
use hivetrap_core::metrics::{
    CAPTURE_HONEYPOT_EVENTS_TOTAL, CAPTURE_NETWORK_EVENTS_TOTAL, CAPTURE_PACKETS_DROPPED_TOTAL,
    CAPTURE_PACKETS_TOTAL, CAPTURE_ROTATIONS_TOTAL, LABEL_MODULE, LABEL_PROTOCOL,
};

use crate::backend::{CaptureBackend, CaptureSession, DeliverOutcome};
use crate::classifier::{Decision, classify};
use crate::config::MonitorConfig;
use crate::packet::RawPacket;
use crate::registry::PortRegistry;

/// 모니터 상태 기계의 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// 시작 전
    Idle,
    /// 세션 여는 중
    Opening,
    /// 캡처 중
    Capturing,
    /// 로테이션 경계에서 세션 교체 중
    Rotating,
    /// 취소로 인한 종료 절차 중
    Closing,
    /// 정상 종료됨
    Terminated,
    /// 치명적 에러로 종료됨
    Failed,
}

/// 캡처 실행 누적 카운터
///
/// 조용히 폐기되는 패킷을 포함해 모든 판정 결과를 관측 가능하게 만듭니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureCounters {
    /// 분류기에 도달한 패킷 수
    pub packets_seen: u64,
    /// 허니팟 싱크로 푸시된 이벤트 수
    pub honeypot_events: u64,
    /// 네트워크 싱크로 푸시된 이벤트 수
    pub network_events: u64,
    /// 폐기된 패킷 수
    pub dropped: u64,
    /// 완료된 로테이션 수
    pub rotations: u64,
}

/// 네트워크 캡처 모니터
///
/// 백엔드는 제네릭 파라미터로 주입됩니다. 운영 환경에서는
/// `PcapCaptureBackend`, 테스트에서는 스크립트된 mock을 사용합니다.
pub struct NetworkMonitor<B: CaptureBackend> {
    backend: B,
    config: MonitorConfig,
    registry: PortRegistry,
    filter: String,
    honeypot_tx: mpsc::Sender<HoneypotEvent>,
    network_tx: mpsc::Sender<NetworkEvent>,
    cancel: CancellationToken,
    state: MonitorState,
    counters: CaptureCounters,
}

/// [`NetworkMonitor`] 빌더
///
/// `build()`는 모니터와 함께 두 이벤트 싱크의 수신단을 반환합니다.
pub struct NetworkMonitorBuilder<B: CaptureBackend> {
    backend: Option<B>,
    config: MonitorConfig,
    registry: PortRegistry,
    filter: String,
    cancel: Option<CancellationToken>,
}

impl<B: CaptureBackend> Default for NetworkMonitorBuilder<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: CaptureBackend> NetworkMonitorBuilder<B> {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            backend: None,
            config: MonitorConfig::default(),
            registry: PortRegistry::default(),
            filter: String::new(),
            cancel: None,
        }
    }

    /// 캡처 백엔드를 설정합니다 (필수).
    pub fn with_backend(mut self, backend: B) -> Self {
        self.backend = Some(backend);
        self
    }

    /// 모니터 설정을 지정합니다.
    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// 포트 레지스트리를 지정합니다.
    pub fn with_registry(mut self, registry: PortRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// 컴파일된 캡처 필터 식을 지정합니다.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// 취소 토큰을 지정합니다. 생략하면 새 토큰이 만들어집니다.
    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// 모니터와 이벤트 수신단을 생성합니다.
    ///
    /// # Errors
    ///
    /// 백엔드가 설정되지 않았으면 [`PipelineError::InitFailed`]를
    /// 반환합니다.
    #[allow(clippy::type_complexity)]
    pub fn build(
        self,
    ) -> Result<
        (
            NetworkMonitor<B>,
            mpsc::Receiver<HoneypotEvent>,
            mpsc::Receiver<NetworkEvent>,
        ),
        PipelineError,
    > {
        let backend = self
            .backend
            .ok_or_else(|| PipelineError::InitFailed("capture backend is required".to_owned()))?;

        let capacity = self.config.channel_capacity.max(1);
        let (honeypot_tx, honeypot_rx) = mpsc::channel(capacity);
        let (network_tx, network_rx) = mpsc::channel(capacity);

        let monitor = NetworkMonitor {
            backend,
            config: self.config,
            registry: self.registry,
            filter: self.filter,
            honeypot_tx,
            network_tx,
            cancel: self.cancel.unwrap_or_default(),
            state: MonitorState::Idle,
            counters: CaptureCounters::default(),
        };
        Ok((monitor, honeypot_rx, network_rx))
    }
}

impl<B: CaptureBackend> NetworkMonitor<B> {
    /// 현재 상태를 반환합니다.
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// 누적 카운터의 스냅샷을 반환합니다.
    pub fn counters(&self) -> CaptureCounters {
        self.counters
    }

    /// 이 모니터의 취소 토큰을 반환합니다.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 캡처 루프를 실행합니다. 취소될 때까지 블로킹됩니다.
    ///
    /// 로테이션 윈도우가 만료될 때마다 세션을 닫고 새 타임스탬프의
    /// 출력 경로로 즉시 다시 엽니다. 동시에 열린 세션은 항상 하나입니다.
    ///
    /// # Errors
    ///
    /// 백엔드의 치명적 에러와 닫힌 이벤트 싱크는 에러로 전파됩니다.
    /// 취소는 에러가 아니며 `Ok(())`를 반환합니다.
    pub fn run(&mut self) -> Result<(), HivetrapError> {
        if self.state != MonitorState::Idle {
            return Err(PipelineError::AlreadyRunning.into());
        }

        info!(
            interface = self.config.interface.as_str(),
            filter = self.filter.as_str(),
            store_pcap = self.config.store_pcap,
            window_secs = self.config.rotation_window.as_secs(),
            "starting network capture"
        );

        loop {
            // 취소는 모든 로테이션 경계에서 확인됩니다.
            if self.cancel.is_cancelled() {
                self.state = MonitorState::Terminated;
                info!("capture cancelled before session open");
                return Ok(());
            }

            self.state = MonitorState::Opening;
            let output = self.next_output_path()?;
            let session = match self.backend.open(&self.filter, output.as_deref()) {
                Ok(session) => session,
                Err(e) => {
                    error!(error = %e, "failed to open capture session");
                    self.state = MonitorState::Failed;
                    return Err(e.into());
                }
            };
            if let Some(path) = &output {
                debug!(path = %path.display(), "capture session writing pcap");
            }

            self.state = MonitorState::Capturing;
            match self.run_session(session) {
                Ok(DeliverOutcome::WindowExpired) => {
                    self.state = MonitorState::Rotating;
                    self.counters.rotations += 1;
                    metrics::counter!(CAPTURE_ROTATIONS_TOTAL).increment(1);
                    debug!(rotations = self.counters.rotations, "rotating capture session");
                }
                Ok(DeliverOutcome::Cancelled) => {
                    self.state = MonitorState::Terminated;
                    info!(
                        packets = self.counters.packets_seen,
                        honeypot = self.counters.honeypot_events,
                        network = self.counters.network_events,
                        dropped = self.counters.dropped,
                        "capture terminated"
                    );
                    return Ok(());
                }
                Err(e) => {
                    self.state = MonitorState::Failed;
                    return Err(e);
                }
            }
        }
    }

    /// 세션 한 개를 윈도우 끝 또는 취소까지 구동합니다.
    ///
    /// 세션은 어떤 경로로든 반드시 닫힙니다. 로테이션/취소 경로의 닫기
    /// 실패는 로깅만 하고, 치명적 에러 경로에서는 원래 에러를 우선합니다.
    fn run_session(&mut self, mut session: B::Session) -> Result<DeliverOutcome, HivetrapError> {
        // 싱크가 닫히면 콜백이 세션 전용 자식 토큰을 취소하여
        // 수신 루프를 폴링 주기 안에 빠져나옵니다.
        let session_cancel = self.cancel.child_token();
        let mut sink_err: Option<PipelineError> = None;

        let registry = &self.registry;
        let observing_host = self.config.observing_host.as_str();
        let honeypot_tx = &self.honeypot_tx;
        let network_tx = &self.network_tx;
        let counters = &mut self.counters;

        let mut on_packet = |packet: RawPacket| {
            if sink_err.is_some() {
                return;
            }
            counters.packets_seen += 1;
            metrics::counter!(CAPTURE_PACKETS_TOTAL).increment(1);

            match classify(&packet, registry, observing_host) {
                Decision::Honeypot(event) => {
                    metrics::counter!(
                        CAPTURE_HONEYPOT_EVENTS_TOTAL,
                        LABEL_MODULE => event.module_name.clone(),
                        LABEL_PROTOCOL => event.protocol.clone()
                    )
                    .increment(1);
                    if honeypot_tx.blocking_send(event).is_err() {
                        sink_err =
                            Some(PipelineError::ChannelSend("honeypot sink closed".to_owned()));
                        session_cancel.cancel();
                        return;
                    }
                    counters.honeypot_events += 1;
                }
                Decision::Network(event) => {
                    metrics::counter!(
                        CAPTURE_NETWORK_EVENTS_TOTAL,
                        LABEL_PROTOCOL => event.protocol.clone()
                    )
                    .increment(1);
                    if network_tx.blocking_send(event).is_err() {
                        sink_err =
                            Some(PipelineError::ChannelSend("network sink closed".to_owned()));
                        session_cancel.cancel();
                        return;
                    }
                    counters.network_events += 1;
                }
                Decision::Drop => {
                    counters.dropped += 1;
                    metrics::counter!(CAPTURE_PACKETS_DROPPED_TOTAL).increment(1);
                }
            }
        };

        let outcome = session.deliver(
            self.config.rotation_window,
            &session_cancel,
            &mut on_packet,
        );
        drop(on_packet);

        match outcome {
            Ok(outcome) => {
                if outcome == DeliverOutcome::Cancelled {
                    self.state = MonitorState::Closing;
                }
                if let Err(e) = session.close() {
                    warn!(error = %e, "failed to close capture session");
                }
                if let Some(e) = sink_err {
                    error!(error = %e, "event sink closed, aborting capture");
                    return Err(e.into());
                }
                Ok(outcome)
            }
            Err(e) => {
                error!(error = %e, "capture backend error");
                if let Err(close_err) = session.close() {
                    warn!(error = %close_err, "failed to close capture session after error");
                }
                Err(e.into())
            }
        }
    }

    /// 다음 세션의 pcap 출력 경로를 계산합니다.
    ///
    /// 저장이 꺼져 있으면 `None`을 반환하고, 켜져 있으면 디렉터리를
    /// 보장한 뒤 Unix 타임스탬프가 박힌 경로를 만듭니다.
    fn next_output_path(&self) -> Result<Option<PathBuf>, HivetrapError> {
        if !self.config.store_pcap {
            return Ok(None);
        }

        std::fs::create_dir_all(&self.config.pcap_dir).map_err(|e| {
            HivetrapError::Capture(CaptureError::Output {
                path: self.config.pcap_dir.display().to_string(),
                reason: e.to_string(),
            })
        })?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Ok(Some(
            self.config
                .pcap_dir
                .join(format!("captured-traffic-{timestamp}.pcap")),
        ))
    }
}
