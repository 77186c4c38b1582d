//! 필터 컴파일러 — 설정과 무시 정책으로부터 캡처 필터 식 생성
//!
//! 실행 시작 시 한 번 호출되어 캡처 백엔드에 전달할 BPF 필터 문자열과
//! 검사/테스트용 [`IgnoreSet`]을 만듭니다.
//!
//! 무시할 IP의 기본 집합은 정책 플래그의 우선순위 규칙으로 결정됩니다:
//! 실머신 IP 무시 플래그가 켜져 있으면 명시 목록을, 아니면 가상머신 IP
//! 무시 플래그가 켜져 있을 때 가상머신 IP들을 사용하며, 두 목록을 합치지
//! 않습니다.

use tracing::{debug, warn};

use hivetrap_core::config::{ModuleConfig, NetworkConfig};
use hivetrap_core::metrics::{CAPTURE_RESOLVER_FAILURES_TOTAL, LABEL_MODULE};

use crate::resolver::GatewayResolver;

/// 캡처에서 제외되는 주소와 포트의 최종 집합
///
/// 컴파일 시점에 한 번 계산되며 이후 불변입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    /// 제외할 IP 주소 목록 (중복 제거, 첫 등장 순서 유지)
    pub addresses: Vec<String>,
    /// 제외할 포트 목록
    pub ports: Vec<u16>,
}

impl IgnoreSet {
    fn push_address(&mut self, addr: String) {
        if !addr.is_empty() && !self.addresses.contains(&addr) {
            self.addresses.push(addr);
        }
    }
}

/// 필터 식과 무시 집합을 컴파일합니다.
///
/// 게이트웨이 조회는 모듈당 한 번씩 수행되며, 개별 실패는 경고 로그와
/// 카운터 증가 후 건너뜁니다. 조회 실패가 컴파일 전체를 실패시키지는
/// 않습니다.
pub async fn compile(
    modules: &[ModuleConfig],
    network: &NetworkConfig,
    resolver: &impl GatewayResolver,
) -> (String, IgnoreSet) {
    let mut ignore = IgnoreSet::default();

    // 우선순위 규칙: 두 플래그가 모두 켜져 있어도 합집합이 아닙니다.
    if network.ignore_real_machine_ip_address {
        for addr in &network.ignore_real_machine_ip_addresses {
            ignore.push_address(addr.clone());
        }
    } else if network.ignore_virtual_machine_ip_addresses {
        for module in modules {
            ignore.push_address(module.ip_address.clone());
        }
    }

    for module in modules {
        match resolver.resolve(module).await {
            Ok(gateway) => ignore.push_address(gateway.to_string()),
            Err(e) => {
                warn!(
                    module = module.name.as_str(),
                    error = %e,
                    "failed to resolve gateway address, skipping module"
                );
                metrics::counter!(
                    CAPTURE_RESOLVER_FAILURES_TOTAL,
                    LABEL_MODULE => module.name.clone()
                )
                .increment(1);
            }
        }
    }

    ignore.ports = network.ignore_real_machine_ports.clone();

    let expression = build_expression(&ignore);
    debug!(
        addresses = ignore.addresses.len(),
        ports = ignore.ports.len(),
        filter = expression.as_str(),
        "compiled capture filter"
    );

    (expression, ignore)
}

/// 무시 집합으로부터 BPF 필터 식을 만듭니다.
///
/// 주소마다 출발지/목적지 제외 절 한 쌍, 포트마다 TCP 출발지/목적지
/// 제외 절 한 쌍을 생성하고 전부 `and`로 연결합니다. 빈 집합이면
/// 빈 문자열(필터 없음)을 반환합니다.
fn build_expression(ignore: &IgnoreSet) -> String {
    let mut clauses = Vec::new();

    for addr in &ignore.addresses {
        clauses.push(format!("not src host {addr} and not dst host {addr}"));
    }
    for port in &ignore.ports {
        clauses.push(format!(
            "not tcp src port {port} and not tcp dst port {port}"
        ));
    }

    clauses.join(" and ")
}
