//! 게이트웨이 주소 조회 — 허니팟 컨테이너 네트워크의 게이트웨이 IP 확인
//!
//! [`GatewayResolver`] trait은 필터 컴파일러가 사용하는 외부 주소 조회
//! 협력자를 추상화합니다. 운영 환경에서는 bollard 기반
//! [`DockerGatewayResolver`]를 사용하고, 테스트에서는 `MockGatewayResolver`를
//! 사용합니다.
//!
//! 조회 실패는 모듈 단위로 격리됩니다. 필터 컴파일러는 실패한 모듈만
//! 건너뛰고 나머지 모듈의 게이트웨이는 계속 수집합니다.

use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;

use hivetrap_core::config::ModuleConfig;
use hivetrap_core::error::ResolverError;

/// 모듈 설정으로부터 Docker 컨테이너 이름을 유도합니다.
///
/// 모듈명의 `/`는 컨테이너 이름에 쓸 수 없으므로 `_`로 치환합니다.
pub fn container_name(module: &ModuleConfig) -> String {
    format!(
        "{}_{}",
        module.virtual_machine_name,
        module.name.replace('/', "_")
    )
}

/// 게이트웨이 주소 조회 협력자 trait
///
/// `Send + Sync + 'static` 바운드로 async 컨텍스트 간 안전한 공유를
/// 보장합니다.
pub trait GatewayResolver: Send + Sync + 'static {
    /// 모듈의 컨테이너 네트워크 게이트웨이 주소를 조회합니다.
    ///
    /// # Errors
    ///
    /// 조회 실패는 [`ResolverError`]로 반환되며, 호출자는 이를 치명적
    /// 에러로 취급해서는 안 됩니다.
    fn resolve(
        &self,
        module: &ModuleConfig,
    ) -> impl Future<Output = Result<IpAddr, ResolverError>> + Send;
}

/// bollard 기반 운영용 게이트웨이 조회기
///
/// 컨테이너를 inspect하여 연결된 네트워크들 중 첫 번째로 발견되는
/// 게이트웨이 주소를 반환합니다.
pub struct DockerGatewayResolver {
    docker: Arc<bollard::Docker>,
}

impl DockerGatewayResolver {
    /// 기본 로컬 소켓으로 Docker에 연결합니다.
    pub fn connect_local() -> Result<Self, ResolverError> {
        let docker = bollard::Docker::connect_with_local_defaults()
            .map_err(|e| ResolverError::Connection(format!("failed to connect to docker: {e}")))?;
        Ok(Self {
            docker: Arc::new(docker),
        })
    }

    /// 지정한 소켓 경로로 Docker에 연결합니다.
    pub fn connect_with_socket(socket_path: &str) -> Result<Self, ResolverError> {
        let docker =
            bollard::Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| {
                    ResolverError::Connection(format!(
                        "failed to connect to docker at {socket_path}: {e}"
                    ))
                })?;
        Ok(Self {
            docker: Arc::new(docker),
        })
    }
}

impl GatewayResolver for DockerGatewayResolver {
    async fn resolve(&self, module: &ModuleConfig) -> Result<IpAddr, ResolverError> {
        let name = container_name(module);
        let inspect = self
            .docker
            .inspect_container(&name, None::<bollard::container::InspectContainerOptions>)
            .await
            .map_err(|e| match e {
                bollard::errors::Error::DockerResponseServerError {
                    status_code: 404, ..
                } => ResolverError::NotFound(name.clone()),
                other => ResolverError::Connection(other.to_string()),
            })?;

        let networks = inspect
            .network_settings
            .and_then(|settings| settings.networks)
            .unwrap_or_default();

        for endpoint in networks.values() {
            if let Some(gateway) = endpoint.gateway.as_deref()
                && !gateway.is_empty()
            {
                return gateway.parse::<IpAddr>().map_err(|e| {
                    ResolverError::NoGateway {
                        container: name.clone(),
                        reason: format!("unparseable gateway '{gateway}': {e}"),
                    }
                });
            }
        }

        Err(ResolverError::NoGateway {
            container: name,
            reason: "no network endpoint carries a gateway".to_owned(),
        })
    }
}

/// Docker 없이 동작할 때 사용하는 조회기
///
/// 모든 조회가 모듈 단위 실패로 처리되어 게이트웨이 주소 없이
/// 필터가 컴파일됩니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

impl GatewayResolver for NullResolver {
    async fn resolve(&self, module: &ModuleConfig) -> Result<IpAddr, ResolverError> {
        Err(ResolverError::Connection(format!(
            "gateway resolution disabled (module '{}')",
            module.name
        )))
    }
}

/// 테스트용 게이트웨이 조회기
///
/// 컨테이너 이름 → 주소 테이블로 응답하고, 테이블에 없는 모듈은
/// 조회 실패로 처리합니다.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MockGatewayResolver {
    gateways: std::collections::HashMap<String, IpAddr>,
}

#[cfg(test)]
impl MockGatewayResolver {
    /// 빈 테이블의 조회기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 컨테이너 이름에 대한 게이트웨이 주소를 등록합니다.
    pub fn with_gateway(mut self, container: impl Into<String>, addr: IpAddr) -> Self {
        self.gateways.insert(container.into(), addr);
        self
    }
}

#[cfg(test)]
impl GatewayResolver for MockGatewayResolver {
    async fn resolve(&self, module: &ModuleConfig) -> Result<IpAddr, ResolverError> {
        let name = container_name(module);
        self.gateways
            .get(&name)
            .copied()
            .ok_or(ResolverError::NotFound(name))
    }
}
