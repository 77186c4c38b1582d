//! hivetrap-daemon -- 캡처 파이프라인 구동 및 이벤트 소비
//!
//! 설정을 로드하고 포트 레지스트리와 캡처 필터를 준비한 뒤,
//! 블로킹 캡처 루프를 전용 스레드에서 실행합니다. 이벤트 싱크는
//! async 소비 태스크가 드레인하며, Ctrl-C 수신 시 취소 토큰으로
//! 우아하게 종료합니다.

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use hivetrap_core::config::HivetrapConfig;
use hivetrap_net_capture::{
    DockerGatewayResolver, MonitorConfig, NetworkMonitorBuilder, NullResolver, PcapCaptureBackend,
    PortRegistry, filter,
};

use cli::DaemonCli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let mut config = HivetrapConfig::load(&cli.config)
        .await
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    // CLI 인자가 설정 파일과 환경변수보다 우선합니다.
    if let Some(level) = &cli.log_level {
        config.general.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.general.log_format = format.clone();
    }
    if let Some(interface) = &cli.interface {
        config.network.interface = interface.clone();
    }
    config.validate().context("invalid configuration")?;

    if cli.validate {
        println!("configuration OK: {}", cli.config.display());
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    info!(
        config = %cli.config.display(),
        modules = config.modules.len(),
        "hivetrap-daemon starting"
    );

    let registry = PortRegistry::build(&config.modules);
    if registry.is_empty() {
        warn!("no honeypot modules configured, all traffic will be classified as network");
    }

    // Docker에 연결되면 컨테이너 게이트웨이 IP도 무시 집합에 들어갑니다.
    // 연결 실패는 치명적이지 않습니다.
    let (filter_expr, ignore) =
        match DockerGatewayResolver::connect_with_socket(&config.network.docker_socket) {
            Ok(resolver) => filter::compile(&config.modules, &config.network, &resolver).await,
            Err(e) => {
                warn!(error = %e, "docker unavailable, compiling filter without gateway addresses");
                filter::compile(&config.modules, &config.network, &NullResolver).await
            }
        };
    info!(
        ignored_addresses = ignore.addresses.len(),
        ignored_ports = ignore.ports.len(),
        "capture filter compiled"
    );

    let monitor_config = MonitorConfig::from_config(&config);
    let backend = PcapCaptureBackend::new(
        monitor_config.interface.clone(),
        monitor_config.poll_timeout,
    );

    let cancel = CancellationToken::new();
    let (mut monitor, mut honeypot_rx, mut network_rx) = NetworkMonitorBuilder::new()
        .with_backend(backend)
        .with_config(monitor_config)
        .with_registry(registry)
        .with_filter(filter_expr)
        .with_cancellation_token(cancel.clone())
        .build()
        .context("failed to build network monitor")?;

    // 이벤트 소비 태스크. 다운스트림 저장소 연동은 이 데몬의 범위 밖이므로
    // 구조화 로그로 내보냅니다.
    let honeypot_consumer = tokio::spawn(async move {
        while let Some(event) = honeypot_rx.recv().await {
            info!(
                module = event.module_name.as_str(),
                src_ip = event.src_ip.as_str(),
                src_port = event.src_port,
                dest_ip = event.dest_ip.as_str(),
                dest_port = event.dest_port,
                protocol = event.protocol.as_str(),
                "honeypot traffic detected"
            );
        }
    });
    let network_consumer = tokio::spawn(async move {
        while let Some(event) = network_rx.recv().await {
            debug!(
                src_ip = event.src_ip.as_str(),
                src_port = event.src_port,
                dest_ip = event.dest_ip.as_str(),
                dest_port = event.dest_port,
                protocol = event.protocol.as_str(),
                "network traffic observed"
            );
        }
    });

    // 캡처 루프는 블로킹이므로 전용 스레드에서 실행합니다.
    let mut capture = tokio::task::spawn_blocking(move || {
        let result = monitor.run();
        (result, monitor.counters())
    });

    let (result, counters) = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            cancel.cancel();
            capture.await.context("capture thread panicked")?
        }
        // 캡처 루프가 치명적 에러로 먼저 끝나는 경우
        joined = &mut capture => joined.context("capture thread panicked")?,
    };
    if let Err(e) = &result {
        error!(error = %e, "capture loop terminated with error");
    }

    // 모니터가 끝나면 송신단이 닫혀 소비 태스크도 끝납니다.
    honeypot_consumer.await.ok();
    network_consumer.await.ok();

    info!(
        packets = counters.packets_seen,
        honeypot_events = counters.honeypot_events,
        network_events = counters.network_events,
        dropped = counters.dropped,
        rotations = counters.rotations,
        "hivetrap-daemon shut down"
    );

    result.map_err(Into::into)
}
