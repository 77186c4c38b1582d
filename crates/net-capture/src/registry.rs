//! 포트 레지스트리 — 디코이 포트와 소유 모듈의 매핑
//!
//! [`PortRegistry`]는 실머신 리스닝 포트를 해당 포트를 소유한 허니팟
//! 모듈명으로 매핑합니다. 실행 시작 시 설정으로부터 한 번 빌드되고,
//! 이후 분류기에서 읽기 전용으로만 사용됩니다. 전역 싱글턴이 아니라
//! 호출자가 소유하는 값으로 전달됩니다.

use std::collections::BTreeMap;

use hivetrap_core::config::ModuleConfig;

/// 포트 번호 → 허니팟 모듈명 매핑
#[derive(Debug, Clone, Default)]
pub struct PortRegistry {
    ports: BTreeMap<u16, String>,
}

impl PortRegistry {
    /// 모듈 설정 목록으로부터 레지스트리를 빌드합니다.
    ///
    /// 같은 포트가 여러 모듈에 설정된 경우 나중 항목이 조용히 덮어씁니다.
    pub fn build(modules: &[ModuleConfig]) -> Self {
        let mut ports = BTreeMap::new();
        for module in modules {
            ports.insert(module.real_machine_port_number, module.name.clone());
        }
        Self { ports }
    }

    /// 포트를 소유한 모듈명을 조회합니다.
    pub fn module_for(&self, port: u16) -> Option<&str> {
        self.ports.get(&port).map(String::as_str)
    }

    /// 포트가 등록되어 있는지 확인합니다.
    pub fn contains(&self, port: u16) -> bool {
        self.ports.contains_key(&port)
    }

    /// 등록된 포트 목록을 반환합니다 (오름차순).
    pub fn ports(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports.keys().copied()
    }

    /// 등록된 포트 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// 레지스트리가 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str, port: u16) -> ModuleConfig {
        ModuleConfig {
            name: name.to_owned(),
            virtual_machine_name: format!("ohp_{}", name.replace('/', "_")),
            ip_address: "10.0.0.5".to_owned(),
            real_machine_port_number: port,
        }
    }

    #[test]
    fn build_key_set_equals_configured_ports() {
        let modules = vec![
            module("ssh/weak_password", 22),
            module("ssh/strong_password", 2222),
            module("http/basic_auth", 8080),
        ];
        let registry = PortRegistry::build(&modules);

        let ports: Vec<u16> = registry.ports().collect();
        assert_eq!(ports, vec![22, 2222, 8080]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn lookup_returns_owning_module() {
        let modules = vec![module("ssh/weak_password", 22), module("ftp/weak", 21)];
        let registry = PortRegistry::build(&modules);

        assert_eq!(registry.module_for(22), Some("ssh/weak_password"));
        assert_eq!(registry.module_for(21), Some("ftp/weak"));
        assert_eq!(registry.module_for(23), None);
    }

    #[test]
    fn duplicate_port_later_entry_wins() {
        let modules = vec![module("first", 22), module("second", 22)];
        let registry = PortRegistry::build(&modules);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.module_for(22), Some("second"));
    }

    #[test]
    fn empty_modules_build_empty_registry() {
        let registry = PortRegistry::build(&[]);
        assert!(registry.is_empty());
        assert!(!registry.contains(22));
    }
}
