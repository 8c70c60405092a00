use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chains the report knows how to group by, in report order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Chain {
    Moonbeam,
    Polygon,
    Avax,
    Bsc,
}

impl Chain {
    pub const ALL: [Chain; 4] = [Chain::Moonbeam, Chain::Polygon, Chain::Avax, Chain::Bsc];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Moonbeam => "moonbeam",
            Self::Polygon => "polygon",
            Self::Avax => "avax",
            Self::Bsc => "bsc",
        }
    }

    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Self::Moonbeam => "https://rpc.api.moonbeam.network",
            Self::Polygon => "https://polygon-rpc.com",
            Self::Avax => "https://api.avax.network/ext/bc/C/rpc",
            Self::Bsc => "https://bsc-dataseed.binance.org",
        }
    }
}

impl Display for Chain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Moonbeam => "Moonbeam",
            Self::Polygon => "Polygon",
            Self::Avax => "Avalanche",
            Self::Bsc => "BSC",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Error)]
#[error("unsupported chain: {0}")]
pub struct ChainParseError(pub String);

impl FromStr for Chain {
    type Err = ChainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "moonbeam" => Ok(Self::Moonbeam),
            "polygon" | "matic" => Ok(Self::Polygon),
            "avax" | "avalanche" => Ok(Self::Avax),
            "bsc" | "bnb" | "binance" => Ok(Self::Bsc),
            _ => Err(ChainParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Chain;

    #[test]
    fn parses_slugs_and_aliases() {
        assert_eq!("moonbeam".parse::<Chain>().expect("moonbeam"), Chain::Moonbeam);
        assert_eq!(" Avalanche ".parse::<Chain>().expect("avax"), Chain::Avax);
        assert_eq!("BNB".parse::<Chain>().expect("bsc"), Chain::Bsc);
        assert!("fantom".parse::<Chain>().is_err());
    }

    #[test]
    fn slug_round_trips_for_every_chain() {
        for chain in Chain::ALL {
            assert_eq!(chain.as_slug().parse::<Chain>().expect("slug"), chain);
        }
    }
}
