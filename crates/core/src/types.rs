//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! IP 프로토콜 번호 조회 테이블과 분류기가 공유하는 보조 타입을 정의합니다.

/// IP 프로토콜 번호를 프로토콜 이름으로 변환합니다.
///
/// IANA 프로토콜 번호 중 캡처 대상에서 관찰되는 프로토콜만 포함하는
/// 정적 테이블입니다. 테이블에 없는 번호는 `None`을 반환하며,
/// 분류기는 해당 패킷을 폐기합니다.
pub fn protocol_name(number: u8) -> Option<&'static str> {
    match number {
        1 => Some("ICMP"),
        2 => Some("IGMP"),
        6 => Some("TCP"),
        17 => Some("UDP"),
        47 => Some("GRE"),
        50 => Some("ESP"),
        51 => Some("AH"),
        58 => Some("ICMPv6"),
        89 => Some("OSPF"),
        132 => Some("SCTP"),
        _ => None,
    }
}

/// TCP 프로토콜 번호
pub const PROTO_TCP: u8 = 6;
/// UDP 프로토콜 번호
pub const PROTO_UDP: u8 = 17;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_protocols_resolve() {
        assert_eq!(protocol_name(PROTO_TCP), Some("TCP"));
        assert_eq!(protocol_name(PROTO_UDP), Some("UDP"));
        assert_eq!(protocol_name(1), Some("ICMP"));
        assert_eq!(protocol_name(132), Some("SCTP"));
    }

    #[test]
    fn unknown_protocol_is_none() {
        assert_eq!(protocol_name(0), None);
        assert_eq!(protocol_name(255), None);
        assert_eq!(protocol_name(143), None);
    }
}
