//! 디코딩된 패킷 표현 — 계층별 타입 지정 접근자
//!
//! 캡처 백엔드가 분류기에 넘기는 [`RawPacket`]을 정의합니다.
//! 계층 존재 여부를 동적으로 탐색하는 대신, IP/TCP/UDP 계층을
//! `Option`으로 명시하는 타입 표현을 사용합니다.
//!
//! 주소는 패킷에서 관찰된 문자열 형태로 보존합니다. 목적지 주소의
//! 문법 검증은 분류기의 책임입니다.

use std::net::IpAddr;

use etherparse::{NetSlice, SlicedPacket, TransportSlice};

/// 디코딩된 패킷 한 개
///
/// 캡처 백엔드가 소유하며 분류기는 읽기만 합니다.
#[derive(Debug, Clone, Default)]
pub struct RawPacket {
    /// IP 계층 (없으면 분류 단계에서 폐기됨)
    pub ip: Option<IpLayer>,
    /// 트랜스포트 계층 (TCP/UDP 외 프로토콜은 None)
    pub transport: Option<TransportLayer>,
}

/// IP 계층 정보
#[derive(Debug, Clone)]
pub struct IpLayer {
    /// 출발지 주소
    pub src: String,
    /// 목적지 주소
    pub dst: String,
    /// IP 프로토콜 번호 (IPv6는 next header)
    pub protocol: u8,
}

/// 트랜스포트 계층 정보
#[derive(Debug, Clone, Copy)]
pub enum TransportLayer {
    /// TCP 세그먼트
    Tcp {
        /// 출발지 포트
        src_port: u16,
        /// 목적지 포트
        dst_port: u16,
    },
    /// UDP 데이터그램
    Udp {
        /// 출발지 포트
        src_port: u16,
        /// 목적지 포트
        dst_port: u16,
    },
}

impl RawPacket {
    /// 이더넷 프레임을 디코딩합니다.
    ///
    /// 디코딩 불가능한 프레임도 에러가 아니라 IP 계층이 없는 패킷으로
    /// 취급합니다. 한 개의 비정상 패킷이 캡처 루프를 중단시켜서는 안 되기
    /// 때문입니다.
    pub fn decode(frame: &[u8]) -> Self {
        let Ok(sliced) = SlicedPacket::from_ethernet(frame) else {
            return Self::default();
        };
        Self::from_sliced(&sliced)
    }

    fn from_sliced(sliced: &SlicedPacket<'_>) -> Self {
        let ip = match &sliced.net {
            Some(NetSlice::Ipv4(ipv4)) => {
                let header = ipv4.header();
                Some(IpLayer {
                    src: IpAddr::V4(header.source_addr()).to_string(),
                    dst: IpAddr::V4(header.destination_addr()).to_string(),
                    protocol: header.protocol().0,
                })
            }
            Some(NetSlice::Ipv6(ipv6)) => {
                let header = ipv6.header();
                Some(IpLayer {
                    src: IpAddr::V6(header.source_addr()).to_string(),
                    dst: IpAddr::V6(header.destination_addr()).to_string(),
                    protocol: header.next_header().0,
                })
            }
            _ => None,
        };

        let transport = match &sliced.transport {
            Some(TransportSlice::Tcp(tcp)) => Some(TransportLayer::Tcp {
                src_port: tcp.source_port(),
                dst_port: tcp.destination_port(),
            }),
            Some(TransportSlice::Udp(udp)) => Some(TransportLayer::Udp {
                src_port: udp.source_port(),
                dst_port: udp.destination_port(),
            }),
            _ => None,
        };

        Self { ip, transport }
    }

    /// IP 계층 존재 여부
    pub fn has_ip(&self) -> bool {
        self.ip.is_some()
    }
}
