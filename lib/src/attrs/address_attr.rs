use crate::attrs::RawAttr;
use crate::constants::*;
use crate::error::{AttrValidator, ParsePacketErr, StunError, ValidateErr};
use bytes::{BufMut, BytesMut};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::ops::Deref;

// 地址类的attribute
//
// mapped-address  response-address  source-address  changed-address  reflected-from

// ipv4: family: 0x01, 4 bytes
// ipv6: family: 0x02, 16 bytes
// family未知时ip为None, port照常解析, 由调用方检查

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressAttr {
    pub attr_type: u16,
    pub family: u8,
    pub port: u16,
    pub ip: Option<IpAddr>,
}

impl AddressAttr {
    pub fn new(attr_type: u16, address: SocketAddr) -> Self {
        let family = match address {
            SocketAddr::V4(_) => ATTR_FAMILY_IPV4,
            SocketAddr::V6(_) => ATTR_FAMILY_IPV6,
        };

        Self {
            attr_type,
            family,
            port: address.port(),
            ip: Some(address.ip()),
        }
    }

    // 从文本ip构造, family由文本形式决定
    pub fn from_text(attr_type: u16, ip: &str, port: u16) -> Result<Self, StunError> {
        let ip: IpAddr = ip
            .parse()
            .map_err(|e| StunError::AddressCodec(format!("{}: {}", ip, e)))?;

        Ok(Self::new(attr_type, SocketAddr::new(ip, port)))
    }

    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.ip.map(|ip| SocketAddr::new(ip, self.port))
    }

    pub fn is_address_attr(attr_type: u16) -> bool {
        matches!(
            attr_type,
            ATTR_MAPPED_ADDRESS
                | ATTR_RESPONSE_ADDRESS
                | ATTR_SOURCE_ADDRESS
                | ATTR_CHANGED_ADDRESS
                | ATTR_REFLECTED_FROM
        )
    }
}

impl From<AddressAttr> for RawAttr {
    fn from(attr: AddressAttr) -> Self {
        let (family, ip_bytes): (u8, Vec<u8>) = match attr.ip {
            Some(IpAddr::V4(ip)) => (ATTR_FAMILY_IPV4, ip.octets().into()),
            Some(IpAddr::V6(ip)) => (ATTR_FAMILY_IPV6, ip.octets().into()),
            // ip未知时只回写family和port
            None => (attr.family, vec![]),
        };

        let mut bytes_buf = BytesMut::with_capacity(4 + ip_bytes.len());

        bytes_buf.put_u8(0);
        bytes_buf.put_u8(family);
        bytes_buf.put_u16(attr.port);
        bytes_buf.put_slice(&ip_bytes);
        let value = bytes_buf.freeze();

        RawAttr::new(attr.attr_type, value)
    }
}

impl TryFrom<RawAttr> for AddressAttr {
    type Error = ParsePacketErr;

    fn try_from(base_attr: RawAttr) -> Result<Self, Self::Error> {
        let attr_type = base_attr.attr_type;

        // 从 value中解析
        let mut index = 0_usize;
        let value = base_attr.value.deref();

        if value.len() < 4 {
            return Err(ParsePacketErr::BufSize(format!(
                "attr buf len:{}",
                value.len()
            )));
        }

        index += 1;
        let family = value[index];

        index += 1;
        let port = u16::from_be_bytes([value[index], value[index + 1]]);

        index += 2;

        let ip = match family {
            ATTR_FAMILY_IPV4 => {
                // 4 bytes
                if index + 4 > value.len() {
                    return Err(ParsePacketErr::BufSize("ipv4 buf len < 4".to_string()));
                }
                let mut addr = [0_u8; 4];
                addr.copy_from_slice(&value[index..index + 4]);
                Some(IpAddr::V4(Ipv4Addr::from(addr)))
            }
            ATTR_FAMILY_IPV6 => {
                // 16 bytes
                if index + 16 > value.len() {
                    return Err(ParsePacketErr::BufSize("ipv6 buf len < 16".to_string()));
                }
                let mut addr = [0_u8; 16];
                addr.copy_from_slice(&value[index..index + 16]);
                Some(IpAddr::V6(Ipv6Addr::from(addr)))
            }
            _ => None,
        };

        Ok(Self {
            attr_type,
            family,
            port,
            ip,
        })
    }
}

impl AttrValidator for AddressAttr {
    fn validate(&self) -> Option<ValidateErr> {
        if self.ip.is_some() {
            return None;
        }

        let err_msg = format!("ip family: {}", self.family);
        Some(ValidateErr(err_msg))
    }
}
