//! 패킷 분류기 — 패킷 한 개를 허니팟/일반/폐기로 판정
//!
//! 디코딩된 패킷과 포트 레지스트리를 받아 [`Decision`]을 반환하는
//! 순수 함수입니다. 분류는 캡처 루프를 중단시킬 수 없습니다:
//! 판정 불가능한 패킷은 전부 [`Decision::Drop`]으로 수렴하며,
//! 호출자(세션 매니저)가 폐기 카운터로 이를 관측 가능하게 만듭니다.

use hivetrap_core::event::{HoneypotEvent, NetworkEvent};
use hivetrap_core::types::{PROTO_TCP, PROTO_UDP, protocol_name};

use crate::packet::{RawPacket, TransportLayer};
use crate::registry::PortRegistry;

/// 패킷 한 개에 대한 분류 결과
#[derive(Debug)]
pub enum Decision {
    /// 허니팟으로 향한 트래픽 — 허니팟 싱크로 푸시됨
    Honeypot(HoneypotEvent),
    /// 일반 네트워크 트래픽 — 네트워크 싱크로 푸시됨
    Network(NetworkEvent),
    /// 폐기 — 어떤 이벤트도 생성하지 않음
    Drop,
}

/// 패킷을 분류합니다.
///
/// 판정 순서 (앞 조건이 성립하면 즉시 반환):
/// 1. IP 계층 없음 → Drop
/// 2. 프로토콜 번호가 정적 테이블에 없음 → Drop
/// 3. 프로토콜과 트랜스포트 계층이 일치할 때만 포트를 읽음 (불일치 시 포트 0)
/// 4. 목적지 주소가 유효한 IPv4/IPv6 문자열이 아님 → Drop
/// 5. 목적지 포트가 레지스트리에 있으면 Honeypot, 출발지 포트만 있으면 Drop
/// 6. 그 외 → Network
pub fn classify(packet: &RawPacket, registry: &PortRegistry, observing_host: &str) -> Decision {
    let Some(ip) = &packet.ip else {
        return Decision::Drop;
    };

    let Some(protocol) = protocol_name(ip.protocol) else {
        return Decision::Drop;
    };

    // 프로토콜 번호와 실제 트랜스포트 계층이 일치할 때만 포트를 신뢰합니다.
    let (src_port, dst_port) = match (ip.protocol, packet.transport) {
        (PROTO_TCP, Some(TransportLayer::Tcp { src_port, dst_port })) => (src_port, dst_port),
        (PROTO_UDP, Some(TransportLayer::Udp { src_port, dst_port })) => (src_port, dst_port),
        _ => (0, 0),
    };

    if ip.dst.parse::<std::net::IpAddr>().is_err() {
        return Decision::Drop;
    }

    if registry.contains(dst_port) || registry.contains(src_port) {
        if let Some(module_name) = registry.module_for(dst_port) {
            return Decision::Honeypot(HoneypotEvent::new(
                ip.dst.clone(),
                dst_port,
                ip.src.clone(),
                src_port,
                protocol,
                module_name,
                observing_host,
            ));
        }
        // 출발지 포트만 매칭된 경우 이벤트를 생성하지 않습니다.
        return Decision::Drop;
    }

    Decision::Network(NetworkEvent::new(
        ip.dst.clone(),
        dst_port,
        ip.src.clone(),
        src_port,
        protocol,
        observing_host,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::IpLayer;
    use hivetrap_core::config::ModuleConfig;

    const HOST: &str = "sensor-01";

    fn registry() -> PortRegistry {
        PortRegistry::build(&[
            ModuleConfig {
                name: "ssh/weak_password".to_owned(),
                virtual_machine_name: "ohp_ssh".to_owned(),
                ip_address: "10.0.0.5".to_owned(),
                real_machine_port_number: 22,
            },
            ModuleConfig {
                name: "ssh/strong_password".to_owned(),
                virtual_machine_name: "ohp_ssh_strong".to_owned(),
                ip_address: "10.0.0.6".to_owned(),
                real_machine_port_number: 2222,
            },
        ])
    }

    fn tcp_packet(src: &str, dst: &str, src_port: u16, dst_port: u16) -> RawPacket {
        RawPacket {
            ip: Some(IpLayer {
                src: src.to_owned(),
                dst: dst.to_owned(),
                protocol: PROTO_TCP,
            }),
            transport: Some(TransportLayer::Tcp { src_port, dst_port }),
        }
    }

    #[test]
    fn registered_dest_port_yields_honeypot_event() {
        let packet = tcp_packet("203.0.113.7", "10.0.0.5", 51234, 2222);
        match classify(&packet, &registry(), HOST) {
            Decision::Honeypot(event) => {
                assert_eq!(event.module_name, "ssh/strong_password");
                assert_eq!(event.dest_ip, "10.0.0.5");
                assert_eq!(event.dest_port, 2222);
                assert_eq!(event.src_ip, "203.0.113.7");
                assert_eq!(event.src_port, 51234);
                assert_eq!(event.protocol, "TCP");
                assert_eq!(event.observing_host, HOST);
            }
            other => panic!("expected honeypot, got {other:?}"),
        }
    }

    #[test]
    fn unregistered_ports_yield_network_event() {
        let packet = tcp_packet("192.168.1.9", "10.0.0.1", 40000, 443);
        match classify(&packet, &registry(), HOST) {
            Decision::Network(event) => {
                assert_eq!(event.dest_ip, "10.0.0.1");
                assert_eq!(event.dest_port, 443);
                assert_eq!(event.src_ip, "192.168.1.9");
                assert_eq!(event.src_port, 40000);
                assert_eq!(event.protocol, "TCP");
            }
            other => panic!("expected network, got {other:?}"),
        }
    }

    #[test]
    fn source_only_port_match_yields_drop() {
        // 출발지 포트만 레지스트리에 있는 비대칭 케이스: 이벤트 없음
        let packet = tcp_packet("10.0.0.5", "203.0.113.7", 2222, 51234);
        assert!(matches!(
            classify(&packet, &registry(), HOST),
            Decision::Drop
        ));
    }

    #[test]
    fn missing_ip_layer_yields_drop() {
        let packet = RawPacket {
            ip: None,
            transport: Some(TransportLayer::Tcp {
                src_port: 1,
                dst_port: 22,
            }),
        };
        assert!(matches!(
            classify(&packet, &registry(), HOST),
            Decision::Drop
        ));
    }

    #[test]
    fn unresolvable_protocol_yields_drop() {
        let packet = RawPacket {
            ip: Some(IpLayer {
                src: "203.0.113.7".to_owned(),
                dst: "10.0.0.5".to_owned(),
                protocol: 143, // 테이블에 없는 번호
            }),
            transport: None,
        };
        assert!(matches!(
            classify(&packet, &registry(), HOST),
            Decision::Drop
        ));
    }

    #[test]
    fn invalid_dest_address_yields_drop() {
        let packet = RawPacket {
            ip: Some(IpLayer {
                src: "203.0.113.7".to_owned(),
                dst: "not-an-address".to_owned(),
                protocol: PROTO_TCP,
            }),
            transport: Some(TransportLayer::Tcp {
                src_port: 51234,
                dst_port: 2222,
            }),
        };
        assert!(matches!(
            classify(&packet, &registry(), HOST),
            Decision::Drop
        ));
    }

    #[test]
    fn ipv6_dest_address_is_valid() {
        let packet = RawPacket {
            ip: Some(IpLayer {
                src: "2001:db8::1".to_owned(),
                dst: "2001:db8::2".to_owned(),
                protocol: PROTO_TCP,
            }),
            transport: Some(TransportLayer::Tcp {
                src_port: 40000,
                dst_port: 22,
            }),
        };
        assert!(matches!(
            classify(&packet, &registry(), HOST),
            Decision::Honeypot(_)
        ));
    }

    #[test]
    fn protocol_transport_mismatch_leaves_ports_unset() {
        // IP 헤더는 UDP라고 주장하지만 실제 계층은 TCP인 패킷:
        // 포트를 읽지 않고 분류를 계속합니다.
        let packet = RawPacket {
            ip: Some(IpLayer {
                src: "192.168.1.9".to_owned(),
                dst: "10.0.0.1".to_owned(),
                protocol: PROTO_UDP,
            }),
            transport: Some(TransportLayer::Tcp {
                src_port: 40000,
                dst_port: 2222,
            }),
        };
        match classify(&packet, &registry(), HOST) {
            Decision::Network(event) => {
                assert_eq!(event.dest_port, 0);
                assert_eq!(event.src_port, 0);
                assert_eq!(event.protocol, "UDP");
            }
            other => panic!("expected network, got {other:?}"),
        }
    }

    #[test]
    fn icmp_packet_without_transport_yields_network() {
        let packet = RawPacket {
            ip: Some(IpLayer {
                src: "192.168.1.9".to_owned(),
                dst: "10.0.0.1".to_owned(),
                protocol: 1, // ICMP
            }),
            transport: None,
        };
        match classify(&packet, &registry(), HOST) {
            Decision::Network(event) => {
                assert_eq!(event.protocol, "ICMP");
                assert_eq!(event.dest_port, 0);
            }
            other => panic!("expected network, got {other:?}"),
        }
    }
}
