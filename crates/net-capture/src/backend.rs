//! 캡처 백엔드 — 캡처 세션의 열기/수신/닫기 추상화
//!
//! [`CaptureBackend`]와 [`CaptureSession`] trait은 모니터가 사용하는
//! 캡처 협력자를 추상화합니다. 운영 환경에서는 libpcap 기반
//! [`PcapCaptureBackend`]를 사용하고, 통합 테스트에서는 스크립트된
//! mock 백엔드를 사용합니다.
//!
//! 로테이션 경계(윈도우 만료)는 에러가 아니라 [`DeliverOutcome`]의 정상
//! 변형입니다. [`CaptureError`]는 전부 치명적이며 재시도되지 않습니다.

use std::path::Path;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::trace;

use hivetrap_core::error::CaptureError;

use crate::packet::RawPacket;

/// 수신 루프가 정상 종료한 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliverOutcome {
    /// 캡처 윈도우 만료 — 로테이션 트리거 (에러 아님)
    WindowExpired,
    /// 취소 요청 관측 — 종료 절차 시작
    Cancelled,
}

/// 캡처 세션 팩토리
pub trait CaptureBackend: Send + 'static {
    /// 이 백엔드가 여는 세션 타입
    type Session: CaptureSession;

    /// 새 캡처 세션을 엽니다.
    ///
    /// `filter`가 빈 문자열이면 필터 없이 캡처합니다. `output`이 주어지면
    /// 수신한 원시 패킷을 해당 경로의 pcap 파일에도 기록합니다.
    ///
    /// # Errors
    ///
    /// 인터페이스 열기, 필터 적용, 출력 파일 생성 실패 시
    /// [`CaptureError`]를 반환합니다. 전부 치명적 에러입니다.
    fn open(&self, filter: &str, output: Option<&Path>) -> Result<Self::Session, CaptureError>;
}

/// 열린 캡처 세션
pub trait CaptureSession: Send {
    /// 윈도우가 만료되거나 취소될 때까지 패킷을 수신하여 콜백에 전달합니다.
    ///
    /// 취소 신호는 백엔드 폴링 주기 안에 관측되어야 합니다.
    ///
    /// # Errors
    ///
    /// 백엔드 수신 에러는 치명적이며 호출자가 세션을 닫고 전파합니다.
    fn deliver(
        &mut self,
        window: Duration,
        cancel: &CancellationToken,
        on_packet: &mut dyn FnMut(RawPacket),
    ) -> Result<DeliverOutcome, CaptureError>;

    /// 세션을 닫고 버퍼된 출력을 플러시합니다.
    ///
    /// # Errors
    ///
    /// 출력 플러시 실패 시 [`CaptureError::CloseFailed`]를 반환합니다.
    fn close(self) -> Result<(), CaptureError>;
}

/// libpcap 기반 운영용 캡처 백엔드
///
/// 짧은 폴링 타임아웃으로 인터페이스를 열어 `deliver`의 블로킹 구간을
/// 폴링 주기 이하로 제한합니다.
pub struct PcapCaptureBackend {
    interface: String,
    poll_timeout: Duration,
}

impl PcapCaptureBackend {
    /// 지정한 인터페이스와 폴링 주기로 백엔드를 만듭니다.
    pub fn new(interface: impl Into<String>, poll_timeout: Duration) -> Self {
        Self {
            interface: interface.into(),
            poll_timeout,
        }
    }
}

impl CaptureBackend for PcapCaptureBackend {
    type Session = PcapSession;

    fn open(&self, filter: &str, output: Option<&Path>) -> Result<Self::Session, CaptureError> {
        let mut capture = pcap::Capture::from_device(self.interface.as_str())
            .map_err(|e| CaptureError::OpenFailed(format!("device '{}': {e}", self.interface)))?
            .promisc(true)
            .timeout(self.poll_timeout.as_millis() as i32)
            .open()
            .map_err(|e| CaptureError::OpenFailed(format!("device '{}': {e}", self.interface)))?;

        if !filter.is_empty() {
            capture
                .filter(filter, true)
                .map_err(|e| CaptureError::Filter {
                    filter: filter.to_owned(),
                    reason: e.to_string(),
                })?;
        }

        let savefile = output
            .map(|path| {
                capture.savefile(path).map_err(|e| CaptureError::Output {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        Ok(PcapSession { capture, savefile })
    }
}

/// libpcap 캡처 세션
pub struct PcapSession {
    capture: pcap::Capture<pcap::Active>,
    savefile: Option<pcap::Savefile>,
}

impl CaptureSession for PcapSession {
    fn deliver(
        &mut self,
        window: Duration,
        cancel: &CancellationToken,
        on_packet: &mut dyn FnMut(RawPacket),
    ) -> Result<DeliverOutcome, CaptureError> {
        let deadline = Instant::now() + window;

        loop {
            if cancel.is_cancelled() {
                return Ok(DeliverOutcome::Cancelled);
            }
            if Instant::now() >= deadline {
                return Ok(DeliverOutcome::WindowExpired);
            }

            match self.capture.next_packet() {
                Ok(packet) => {
                    if let Some(savefile) = &mut self.savefile {
                        savefile.write(&packet);
                    }
                    on_packet(RawPacket::decode(packet.data));
                }
                // 폴링 타임아웃은 재폴링 지점일 뿐입니다. 덕분에 취소와
                // 윈도우 만료가 폴링 주기 안에 관측됩니다.
                Err(pcap::Error::TimeoutExpired) => {
                    trace!("capture poll timeout, re-polling");
                }
                Err(e) => return Err(CaptureError::Backend(e.to_string())),
            }
        }
    }

    fn close(self) -> Result<(), CaptureError> {
        if let Some(mut savefile) = self.savefile {
            savefile
                .flush()
                .map_err(|e| CaptureError::CloseFailed(e.to_string()))?;
        }
        Ok(())
    }
}
