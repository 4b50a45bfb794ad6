use std::{fmt, ops::RangeInclusive, time::Duration};

use alloy::primitives::{Address, Bytes, U256};
use rand::Rng;

use crate::chain::Network;

/// Gas forwarded to the destination side of either bridge.
pub const MESSAGE_GAS_LIMIT: u32 = 200_000;
/// Gas limit of the outer bridge transaction.
pub const TX_GAS_LIMIT: u64 = 1_000_000;

const WEI_PER_MICRO_ETHER: u64 = 1_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeMode {
    /// Sepolia <-> T1 through the T1 messenger.
    T1,
    /// OP-stack L2 <-> L2 through the standard bridge predeploy.
    L2,
}

impl BridgeMode {
    /// Transfer range in ether.
    pub fn amount_range(self) -> RangeInclusive<f64> {
        match self {
            BridgeMode::T1 | BridgeMode::L2 => 0.0001..=0.001,
        }
    }

    /// How long to wait after a confirmed bridge tx before the next step.
    pub fn settle_range(self) -> RangeInclusive<Duration> {
        match self {
            BridgeMode::T1 => Duration::from_secs(300)..=Duration::from_secs(600),
            BridgeMode::L2 => Duration::from_secs(120)..=Duration::from_secs(300),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BridgeMode::T1 => "T1 bridge",
            BridgeMode::L2 => "L2 bridge",
        }
    }
}

impl fmt::Display for BridgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Delay between two cycles.
pub const INTER_CYCLE_DELAY: RangeInclusive<Duration> =
    Duration::from_secs(30)..=Duration::from_secs(60);

/// An ether amount with six decimals of precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TransferAmount {
    micro_ether: u64,
}

impl TransferAmount {
    pub fn from_micro_ether(micro_ether: u64) -> Self {
        Self { micro_ether }
    }

    /// Draws uniformly from the mode's range and rounds to 6 decimals.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, mode: BridgeMode) -> Self {
        let ether = rng.gen_range(mode.amount_range());
        Self {
            micro_ether: (ether * 1e6).round() as u64,
        }
    }

    pub fn micro_ether(self) -> u64 {
        self.micro_ether
    }

    pub fn wei(self) -> U256 {
        U256::from(self.micro_ether) * U256::from(WEI_PER_MICRO_ETHER)
    }
}

impl fmt::Display for TransferAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.micro_ether / 1_000_000;
        let fraction = format!("{:06}", self.micro_ether % 1_000_000);
        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            write!(f, "{whole}.0")
        } else {
            write!(f, "{whole}.{fraction}")
        }
    }
}

pub fn sample_duration<R: Rng + ?Sized>(rng: &mut R, range: &RangeInclusive<Duration>) -> Duration {
    let millis = rng.gen_range(range.start().as_millis() as u64..=range.end().as_millis() as u64);
    Duration::from_millis(millis)
}

/// One of the two contract calls the bot knows how to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    /// `sendMessage` on the T1 messenger, bridging to ourselves.
    SendMessage {
        contract: Address,
        to: Address,
        value: U256,
        message: Bytes,
        gas_limit: U256,
        dest_chain_id: u64,
        callback: Address,
    },
    /// `bridgeETH` on the L2 standard bridge.
    BridgeEth {
        contract: Address,
        l1_gas: u32,
        data: Bytes,
        value: U256,
    },
}

impl BridgeCall {
    pub fn for_mode(
        mode: BridgeMode,
        wallet: Address,
        source: &Network,
        destination: &Network,
        amount: TransferAmount,
    ) -> Self {
        match mode {
            BridgeMode::T1 => BridgeCall::SendMessage {
                contract: source.bridge_contract,
                to: wallet,
                value: amount.wei(),
                message: Bytes::new(),
                gas_limit: U256::from(MESSAGE_GAS_LIMIT),
                dest_chain_id: destination.chain_id,
                callback: wallet,
            },
            BridgeMode::L2 => BridgeCall::BridgeEth {
                contract: source.bridge_contract,
                l1_gas: MESSAGE_GAS_LIMIT,
                data: Bytes::new(),
                value: amount.wei(),
            },
        }
    }

    /// Ether attached to the transaction.
    pub fn value(&self) -> U256 {
        match self {
            BridgeCall::SendMessage { value, .. } | BridgeCall::BridgeEth { value, .. } => *value,
        }
    }
}

/// `0x1234...abcd` form of a hash or address.
pub fn short_hex(full: &str) -> String {
    if full.len() <= 10 || !full.is_ascii() {
        return full.to_owned();
    }
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::chain::{tests::registry, NetworkId};

    #[test]
    fn sampled_amounts_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for mode in [BridgeMode::T1, BridgeMode::L2] {
            for _ in 0..10_000 {
                let amount = TransferAmount::sample(&mut rng, mode);
                assert!((100..=1_000).contains(&amount.micro_ether()), "{amount}");
                assert_eq!(amount.wei() % U256::from(WEI_PER_MICRO_ETHER), U256::ZERO);
            }
        }
    }

    #[test]
    fn amount_formats_as_ether() {
        let amount = TransferAmount::from_micro_ether(250);
        assert_eq!(amount.wei(), U256::from(250_000_000_000_000u64));
        assert_eq!(amount.to_string(), "0.00025");
        assert_eq!(TransferAmount::from_micro_ether(1_000_000).to_string(), "1.0");
    }

    #[test]
    fn sampled_durations_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1_000 {
            assert!(INTER_CYCLE_DELAY.contains(&sample_duration(&mut rng, &INTER_CYCLE_DELAY)));
            let settle = BridgeMode::T1.settle_range();
            assert!(settle.contains(&sample_duration(&mut rng, &settle)));
        }
    }

    #[test]
    fn t1_call_bridges_to_self_on_destination_chain() {
        let registry = registry();
        let wallet = Address::repeat_byte(0xaa);
        let source = registry.get(NetworkId::Sepolia);
        let destination = registry.get(NetworkId::T1Devnet);
        let amount = TransferAmount::from_micro_ether(500);

        let call = BridgeCall::for_mode(BridgeMode::T1, wallet, source, destination, amount);
        assert_eq!(
            call,
            BridgeCall::SendMessage {
                contract: source.bridge_contract,
                to: wallet,
                value: amount.wei(),
                message: Bytes::new(),
                gas_limit: U256::from(200_000),
                dest_chain_id: 299_792,
                callback: wallet,
            }
        );
    }

    #[test]
    fn l2_call_uses_source_bridge() {
        let registry = registry();
        let source = registry.get(NetworkId::BaseSepolia);
        let destination = registry.get(NetworkId::ArbitrumSepolia);
        let amount = TransferAmount::from_micro_ether(100);

        let call = BridgeCall::for_mode(BridgeMode::L2, Address::ZERO, source, destination, amount);
        assert_eq!(call.value(), amount.wei());
        assert!(matches!(
            call,
            BridgeCall::BridgeEth { l1_gas: 200_000, ref data, .. } if data.is_empty()
        ));
    }

    #[test]
    fn short_hex_keeps_ends() {
        assert_eq!(
            short_hex("0x4200000000000000000000000000000000000010"),
            "0x4200...0010"
        );
        assert_eq!(short_hex("0x12"), "0x12");
    }
}
