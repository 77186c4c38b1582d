//! 설정 관리 — hivetrap.toml 파싱 및 런타임 설정
//!
//! [`HivetrapConfig`]는 데몬과 캡처 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`HIVETRAP_NETWORK_INTERFACE=eth0` 형식)
//! 3. 설정 파일 (`hivetrap.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), hivetrap_core::error::HivetrapError> {
//! use hivetrap_core::config::HivetrapConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = HivetrapConfig::load("hivetrap.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = HivetrapConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, HivetrapError};

/// Hivetrap 통합 설정
///
/// `hivetrap.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HivetrapConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 네트워크 캡처 정책 설정
    #[serde(default)]
    pub network: NetworkConfig,
    /// 감시 대상 허니팟 모듈 목록
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleConfig>,
}

impl HivetrapConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, HivetrapError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, HivetrapError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HivetrapError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                HivetrapError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, HivetrapError> {
        toml::from_str(toml_str).map_err(|e| {
            HivetrapError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `HIVETRAP_{SECTION}_{FIELD}`
    /// 예: `HIVETRAP_NETWORK_INTERFACE=eth0`
    ///
    /// 모듈 목록은 구조가 중첩되어 있어 환경변수 오버라이드 대상이 아닙니다.
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "HIVETRAP_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "HIVETRAP_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.data_dir, "HIVETRAP_GENERAL_DATA_DIR");

        // Network
        override_string(
            &mut self.network.real_machine_identifier_name,
            "HIVETRAP_NETWORK_REAL_MACHINE_IDENTIFIER_NAME",
        );
        override_bool(
            &mut self.network.ignore_real_machine_ip_address,
            "HIVETRAP_NETWORK_IGNORE_REAL_MACHINE_IP_ADDRESS",
        );
        override_bool(
            &mut self.network.ignore_virtual_machine_ip_addresses,
            "HIVETRAP_NETWORK_IGNORE_VIRTUAL_MACHINE_IP_ADDRESSES",
        );
        override_csv(
            &mut self.network.ignore_real_machine_ip_addresses,
            "HIVETRAP_NETWORK_IGNORE_REAL_MACHINE_IP_ADDRESSES",
        );
        override_ports(
            &mut self.network.ignore_real_machine_ports,
            "HIVETRAP_NETWORK_IGNORE_REAL_MACHINE_PORTS",
        );
        override_bool(
            &mut self.network.store_network_captured_files,
            "HIVETRAP_NETWORK_STORE_NETWORK_CAPTURED_FILES",
        );
        override_u64(
            &mut self.network.split_pcap_file_timeout,
            "HIVETRAP_NETWORK_SPLIT_PCAP_FILE_TIMEOUT",
        );
        override_string(&mut self.network.interface, "HIVETRAP_NETWORK_INTERFACE");
        override_usize(
            &mut self.network.channel_capacity,
            "HIVETRAP_NETWORK_CHANNEL_CAPACITY",
        );
        override_string(
            &mut self.network.docker_socket,
            "HIVETRAP_NETWORK_DOCKER_SOCKET",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), HivetrapError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // 로테이션 주기 검증
        if self.network.split_pcap_file_timeout == 0 {
            return Err(ConfigError::InvalidValue {
                field: "network.split_pcap_file_timeout".to_owned(),
                reason: "rotation timeout must be greater than zero".to_owned(),
            }
            .into());
        }

        // 이벤트 채널 용량 검증
        if self.network.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "network.channel_capacity".to_owned(),
                reason: "channel capacity must be greater than zero".to_owned(),
            }
            .into());
        }

        // 모듈 검증
        for module in &self.modules {
            if module.name.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "module.name".to_owned(),
                    reason: "module name must not be empty".to_owned(),
                }
                .into());
            }
            if module.real_machine_port_number == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("module.{}.real_machine_port_number", module.name),
                    reason: "port must be in range 1-65535".to_owned(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 데이터 디렉토리 (pcap 파일 저장 위치의 기반 경로)
    pub data_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            data_dir: "/var/lib/hivetrap".to_owned(),
        }
    }
}

/// 네트워크 캡처 정책 설정
///
/// 프로세스 전역 정책입니다. 로드 이후 캡처 코어에서는 읽기 전용으로만
/// 사용됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// 관찰 호스트의 식별자 (이벤트의 observing_host 필드로 복사됨)
    pub real_machine_identifier_name: String,
    /// 실머신 IP 무시 정책 활성화 여부
    pub ignore_real_machine_ip_address: bool,
    /// 가상머신(허니팟 컨테이너) IP 무시 정책 활성화 여부
    pub ignore_virtual_machine_ip_addresses: bool,
    /// 무시할 실머신 IP 목록 (ignore_real_machine_ip_address가 true일 때만 사용)
    pub ignore_real_machine_ip_addresses: Vec<String>,
    /// 무시할 실머신 포트 목록
    pub ignore_real_machine_ports: Vec<u16>,
    /// 캡처 아티팩트(pcap 파일) 저장 여부
    pub store_network_captured_files: bool,
    /// 캡처 세션 로테이션 주기 (초)
    pub split_pcap_file_timeout: u64,
    /// 캡처 대상 네트워크 인터페이스
    pub interface: String,
    /// 이벤트 싱크 채널 용량
    pub channel_capacity: usize,
    /// Docker 소켓 경로 (게이트웨이 주소 조회용)
    pub docker_socket: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            real_machine_identifier_name: "hivetrap-sensor".to_owned(),
            ignore_real_machine_ip_address: false,
            ignore_virtual_machine_ip_addresses: true,
            ignore_real_machine_ip_addresses: Vec::new(),
            ignore_real_machine_ports: Vec::new(),
            store_network_captured_files: false,
            split_pcap_file_timeout: 3600,
            interface: "any".to_owned(),
            channel_capacity: 1024,
            docker_socket: "/var/run/docker.sock".to_owned(),
        }
    }
}

/// 허니팟 모듈 설정
///
/// 감시 대상 디코이 서비스 하나당 하나씩 정의됩니다. 로드 이후 불변입니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// 모듈 논리 이름 (예: "ssh/weak_password")
    pub name: String,
    /// 모듈을 서비스하는 가상머신 이름
    pub virtual_machine_name: String,
    /// 가상머신의 IP 주소
    pub ip_address: String,
    /// 실머신에서 노출되는 리스닝 포트 (1-65535)
    pub real_machine_port_number: u16,
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val.split(',').map(|s| s.trim().to_owned()).collect();
    }
}

fn override_ports(target: &mut Vec<u16>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        let mut parsed = Vec::new();
        for part in val.split(',') {
            match part.trim().parse::<u16>() {
                Ok(port) => parsed.push(port),
                Err(_) => {
                    warn!(
                        env_key,
                        value = part.trim(),
                        "failed to parse port from env var, ignoring whole list"
                    );
                    return;
                }
            }
        }
        *target = parsed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = HivetrapConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert!(!config.network.ignore_real_machine_ip_address);
        assert!(config.network.ignore_virtual_machine_ip_addresses);
        assert_eq!(config.network.split_pcap_file_timeout, 3600);
        assert_eq!(config.network.interface, "any");
        assert!(config.modules.is_empty());
    }

    #[test]
    fn default_config_passes_validation() {
        let config = HivetrapConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = HivetrapConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.network.channel_capacity, 1024);
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[general]
log_level = "debug"

[network]
interface = "eth0"
split_pcap_file_timeout = 600
"#;
        let config = HivetrapConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        // log_format은 기본값 유지
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.network.interface, "eth0");
        assert_eq!(config.network.split_pcap_file_timeout, 600);
    }

    #[test]
    fn from_str_full_toml_with_modules() {
        let toml = r#"
[general]
log_level = "warn"
log_format = "pretty"
data_dir = "/opt/hivetrap/data"

[network]
real_machine_identifier_name = "sensor-fra-01"
ignore_real_machine_ip_address = true
ignore_virtual_machine_ip_addresses = false
ignore_real_machine_ip_addresses = ["192.168.1.10", "192.168.1.11"]
ignore_real_machine_ports = [8080, 5432]
store_network_captured_files = true
split_pcap_file_timeout = 1800
interface = "ens3"
channel_capacity = 512
docker_socket = "/run/docker.sock"

[[module]]
name = "ssh/weak_password"
virtual_machine_name = "ohp_ssh"
ip_address = "10.0.0.5"
real_machine_port_number = 22

[[module]]
name = "http/basic_auth_weak_password"
virtual_machine_name = "ohp_http"
ip_address = "10.0.0.6"
real_machine_port_number = 8080
"#;
        let config = HivetrapConfig::parse(toml).unwrap();
        assert_eq!(config.network.real_machine_identifier_name, "sensor-fra-01");
        assert_eq!(config.network.ignore_real_machine_ip_addresses.len(), 2);
        assert_eq!(config.network.ignore_real_machine_ports, vec![8080, 5432]);
        assert_eq!(config.modules.len(), 2);
        assert_eq!(config.modules[0].name, "ssh/weak_password");
        assert_eq!(config.modules[1].real_machine_port_number, 8080);
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let result = HivetrapConfig::parse("invalid = [[[toml");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            HivetrapError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = HivetrapConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = HivetrapConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_zero_rotation_timeout() {
        let mut config = HivetrapConfig::default();
        config.network.split_pcap_file_timeout = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("split_pcap_file_timeout"));
    }

    #[test]
    fn validate_rejects_zero_channel_capacity() {
        let mut config = HivetrapConfig::default();
        config.network.channel_capacity = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("channel_capacity"));
    }

    #[test]
    fn validate_rejects_empty_module_name() {
        let mut config = HivetrapConfig::default();
        config.modules.push(ModuleConfig {
            name: String::new(),
            virtual_machine_name: "vm".to_owned(),
            ip_address: "10.0.0.5".to_owned(),
            real_machine_port_number: 22,
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("module.name"));
    }

    #[test]
    fn validate_rejects_zero_module_port() {
        let mut config = HivetrapConfig::default();
        config.modules.push(ModuleConfig {
            name: "ssh/weak_password".to_owned(),
            virtual_machine_name: "vm".to_owned(),
            ip_address: "10.0.0.5".to_owned(),
            real_machine_port_number: 0,
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("real_machine_port_number"));
    }

    #[test]
    #[serial]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_HIVETRAP_STR", "overridden") };
        override_string(&mut val, "TEST_HIVETRAP_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_HIVETRAP_STR") };
    }

    #[test]
    #[serial]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = false;
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_HIVETRAP_BOOL_BAD", "not-a-bool") };
        override_bool(&mut val, "TEST_HIVETRAP_BOOL_BAD");
        assert!(!val); // 원래 값 유지
        unsafe { std::env::remove_var("TEST_HIVETRAP_BOOL_BAD") };
    }

    #[test]
    #[serial]
    fn env_override_ports_valid() {
        let mut val = vec![1u16];
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_HIVETRAP_PORTS", "22, 2222, 8080") };
        override_ports(&mut val, "TEST_HIVETRAP_PORTS");
        assert_eq!(val, vec![22, 2222, 8080]);
        unsafe { std::env::remove_var("TEST_HIVETRAP_PORTS") };
    }

    #[test]
    #[serial]
    fn env_override_ports_invalid_keeps_original() {
        let mut val = vec![22u16];
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_HIVETRAP_PORTS_BAD", "22, seventy") };
        override_ports(&mut val, "TEST_HIVETRAP_PORTS_BAD");
        assert_eq!(val, vec![22]);
        unsafe { std::env::remove_var("TEST_HIVETRAP_PORTS_BAD") };
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_HIVETRAP_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let mut config = HivetrapConfig::default();
        config.modules.push(ModuleConfig {
            name: "ssh/weak_password".to_owned(),
            virtual_machine_name: "ohp_ssh".to_owned(),
            ip_address: "10.0.0.5".to_owned(),
            real_machine_port_number: 22,
        });
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = HivetrapConfig::parse(&toml_str).unwrap();
        assert_eq!(config.general.log_level, parsed.general.log_level);
        assert_eq!(parsed.modules.len(), 1);
        assert_eq!(parsed.modules[0].real_machine_port_number, 22);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let result = HivetrapConfig::from_file("/nonexistent/path/hivetrap.toml").await;
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            HivetrapError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
