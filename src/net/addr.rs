//! 逻辑地址与子网分配
//!
//! 每条双向链路从私有地址空间切出一个新鲜子网（默认 /30），两端各取
//! 一个主机地址。分配器单调前进，子网之间永不重叠；空间耗尽是致命的
//! 配置错误，在仿真开始前报告。

use std::net::Ipv4Addr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddrError {
    #[error(
        "address space exhausted: {allocated} subnets of /{subnet_prefix} already carved out of {base}/{space_prefix}"
    )]
    Exhausted {
        base: Ipv4Addr,
        space_prefix: u8,
        subnet_prefix: u8,
        allocated: u64,
    },
    #[error("invalid prefix pair: space /{space_prefix} cannot hold /{subnet_prefix} subnets")]
    InvalidPrefix { space_prefix: u8, subnet_prefix: u8 },
}

/// 一个已分配的子网。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subnet {
    pub network: Ipv4Addr,
    pub prefix: u8,
}

impl Subnet {
    /// 子网内的地址总数（含网络地址与广播地址）。
    pub fn size(&self) -> u64 {
        1u64 << (32 - self.prefix.min(32))
    }

    /// 子网内第 `i` 个地址（0 为网络地址）。
    pub fn host(&self, i: u32) -> Ipv4Addr {
        debug_assert!((i as u64) < self.size());
        Ipv4Addr::from(u32::from(self.network).wrapping_add(i))
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        if self.prefix == 0 {
            return true;
        }
        let mask = !0u32 << (32 - self.prefix);
        (u32::from(addr) & mask) == u32::from(self.network)
    }
}

/// 子网分配器：从 `base/space_prefix` 中按序切出 `/subnet_prefix` 子网。
#[derive(Debug)]
pub struct SubnetAllocator {
    base: u32,
    space_prefix: u8,
    subnet_prefix: u8,
    next: u64,
}

impl SubnetAllocator {
    pub fn new(base: Ipv4Addr, space_prefix: u8, subnet_prefix: u8) -> Result<Self, AddrError> {
        // /31、/32 没有可用的两个主机地址，不作为链路子网
        if space_prefix > subnet_prefix || subnet_prefix > 30 {
            return Err(AddrError::InvalidPrefix {
                space_prefix,
                subnet_prefix,
            });
        }
        let mask = if space_prefix == 0 {
            0
        } else {
            !0u32 << (32 - space_prefix)
        };
        Ok(Self {
            base: u32::from(base) & mask,
            space_prefix,
            subnet_prefix,
            next: 0,
        })
    }

    /// 切出下一个子网。空间耗尽返回错误而不是回绕复用。
    pub fn next_subnet(&mut self) -> Result<Subnet, AddrError> {
        let capacity = 1u64 << (self.subnet_prefix - self.space_prefix);
        if self.next >= capacity {
            return Err(AddrError::Exhausted {
                base: Ipv4Addr::from(self.base),
                space_prefix: self.space_prefix,
                subnet_prefix: self.subnet_prefix,
                allocated: self.next,
            });
        }
        let step = 1u64 << (32 - self.subnet_prefix);
        let network = self.base.wrapping_add((self.next * step) as u32);
        self.next += 1;
        Ok(Subnet {
            network: Ipv4Addr::from(network),
            prefix: self.subnet_prefix,
        })
    }

    /// 已分配的子网数量。
    pub fn allocated(&self) -> u64 {
        self.next
    }
}
