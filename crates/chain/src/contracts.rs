//! Contract bindings and typed wrappers for the SCD ledger contracts.
//!
//! Three contracts matter to the keeper:
//! - `Tub`, the CDP ledger itself: shutdown flag, liquidation penalty,
//!   frozen reference price, cup records, and the per-cup `bite` call;
//! - `Vox`, the target price feed (`par`);
//! - `BiteCdps`, a helper contract that bites a batch of cups in one
//!   transaction, used in indexed mode.
//!
//! Wrappers hold the RPC URL and contract address and build an HTTP provider
//! per call, the same way the rest of the chain layer does.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::ProviderBuilder;
use alloy::sol;
use alloy::sol_types::SolCall;
use anyhow::Result;

sol! {
    /// SCD Tub interface (subset the keeper needs).
    #[sol(rpc)]
    interface ITub {
        /// Global shutdown ("cage") flag.
        function off() external view returns (bool);
        /// Liquidation penalty [Ray]. Fixed at 1 Ray once caged.
        function axe() external view returns (uint256);
        /// Reference (oracle) price [Ray]. Frozen at shutdown.
        function tag() external view returns (uint256);
        /// Number of cups ever opened; cup ids are 1..=cupi.
        function cupi() external view returns (uint256);
        /// Cup record: owner, locked collateral [Wad], debt [Wad], fee basis.
        function cups(bytes32 cup) external view returns (address lad, uint256 ink, uint256 art, uint256 ire);
        /// Current total debt of a cup [Wad].
        function tab(bytes32 cup) external view returns (uint256);
        /// Address of the Vox (target price feed).
        function vox() external view returns (address);
        /// Liquidate a single cup.
        function bite(bytes32 cup) external;
    }

    /// SCD Vox interface.
    #[sol(rpc)]
    interface IVox {
        /// Target price [Ray]. Typically 1 Ray.
        function par() external view returns (uint256);
    }

    /// BiteCdps batch-liquidation helper.
    #[sol(rpc)]
    interface IBiteCdps {
        /// Bite every cup in the list, in order, in one transaction.
        function bite(bytes32[] cups) external;
    }
}

/// Encode a cup id as the left-padded bytes32 the contracts expect.
pub fn cup_id_to_bytes32(id: u64) -> B256 {
    B256::from(U256::from(id))
}

/// Collateral and debt state of a single cup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CupState {
    /// Locked collateral [Wad].
    pub ink: U256,
    /// Outstanding debt as recorded in the cup [Wad].
    pub art: U256,
}

/// Typed wrapper for the Tub contract.
#[derive(Debug, Clone)]
pub struct Tub {
    rpc_url: String,
    address: Address,
}

impl Tub {
    pub fn new(rpc_url: impl Into<String>, address: Address) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            address,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Whether the ledger has been globally shut down.
    pub async fn off(&self) -> Result<bool> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.parse()?);
        let tub = ITub::new(self.address, provider);
        Ok(tub.off().call().await?._0)
    }

    /// Liquidation penalty [Ray].
    pub async fn axe(&self) -> Result<U256> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.parse()?);
        let tub = ITub::new(self.address, provider);
        Ok(tub.axe().call().await?._0)
    }

    /// Frozen reference price [Ray].
    pub async fn tag(&self) -> Result<U256> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.parse()?);
        let tub = ITub::new(self.address, provider);
        Ok(tub.tag().call().await?._0)
    }

    /// Highest cup id ever opened.
    pub async fn cupi(&self) -> Result<u64> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.parse()?);
        let tub = ITub::new(self.address, provider);
        Ok(tub.cupi().call().await?._0.to::<u64>())
    }

    /// Address of the Vox feed.
    pub async fn vox(&self) -> Result<Address> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.parse()?);
        let tub = ITub::new(self.address, provider);
        Ok(tub.vox().call().await?._0)
    }

    /// Collateral/debt state of a cup.
    pub async fn cup(&self, id: u64) -> Result<CupState> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.parse()?);
        let tub = ITub::new(self.address, provider);
        let record = tub.cups(cup_id_to_bytes32(id)).call().await?;
        Ok(CupState {
            ink: record.ink,
            art: record.art,
        })
    }

    /// Current total debt of a cup [Wad].
    pub async fn tab(&self, id: u64) -> Result<U256> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.parse()?);
        let tub = ITub::new(self.address, provider);
        Ok(tub.tab(cup_id_to_bytes32(id)).call().await?._0)
    }

    /// Calldata for `bite(bytes32)` on this cup.
    pub fn bite_calldata(&self, id: u64) -> Bytes {
        ITub::biteCall {
            cup: cup_id_to_bytes32(id),
        }
        .abi_encode()
        .into()
    }
}

/// Typed wrapper for the Vox contract.
#[derive(Debug, Clone)]
pub struct Vox {
    rpc_url: String,
    address: Address,
}

impl Vox {
    pub fn new(rpc_url: impl Into<String>, address: Address) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            address,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Target price [Ray].
    pub async fn par(&self) -> Result<U256> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.parse()?);
        let vox = IVox::new(self.address, provider);
        Ok(vox.par().call().await?._0)
    }
}

/// Typed wrapper for the BiteCdps batch helper.
#[derive(Debug, Clone)]
pub struct BiteCdps {
    address: Address,
}

impl BiteCdps {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Calldata for `bite(bytes32[])` over a chunk of cup ids.
    pub fn bite_calldata(&self, ids: &[u64]) -> Bytes {
        IBiteCdps::biteCall {
            cups: ids.iter().copied().map(cup_id_to_bytes32).collect(),
        }
        .abi_encode()
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cup_id_encoding_is_left_padded() {
        let encoded = cup_id_to_bytes32(1);
        assert_eq!(encoded.0[31], 1);
        assert!(encoded.0[..31].iter().all(|b| *b == 0));

        let encoded = cup_id_to_bytes32(0x0102);
        assert_eq!(encoded.0[31], 0x02);
        assert_eq!(encoded.0[30], 0x01);
    }

    #[test]
    fn test_bite_calldata_shape() {
        let tub = Tub::new("http://localhost:8545", Address::ZERO);
        let calldata = tub.bite_calldata(7);
        // 4-byte selector + one bytes32 argument
        assert_eq!(calldata.len(), 4 + 32);
        assert_eq!(calldata[4 + 31], 7);
    }

    #[test]
    fn test_batch_bite_calldata_carries_every_id() {
        let bitecdps = BiteCdps::new(Address::ZERO);
        let ids: Vec<u64> = (1..=3).collect();
        let calldata = bitecdps.bite_calldata(&ids);
        // selector + array offset + length + 3 elements
        assert_eq!(calldata.len(), 4 + 32 + 32 + 3 * 32);
        // length word
        assert_eq!(calldata[4 + 32 + 31], 3);
        // last byte of each element is the id
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(u64::from(calldata[4 + 64 + i * 32 + 31]), *id);
        }
    }

    #[test]
    fn test_single_and_batch_selectors_differ() {
        let tub = Tub::new("http://localhost:8545", Address::ZERO);
        let bitecdps = BiteCdps::new(Address::ZERO);
        assert_ne!(
            tub.bite_calldata(1)[..4],
            bitecdps.bite_calldata(&[1])[..4]
        );
    }
}
