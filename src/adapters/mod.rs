// Validator Adapters Module
// One adapter per ecosystem API family, all behind the ValidatorAdapter trait

pub mod chainlink;
pub mod cosmos;
pub mod near;
pub mod neutron;
pub mod skale;
pub mod solana;
pub mod sui;

pub use crate::validator_adapter::ValidatorAdapter;
pub use chainlink::{ChainlinkAdapter, ChainlinkConfig, ChainlinkStats};
pub use cosmos::CosmosAdapter;
pub use near::NearAdapter;
pub use neutron::NeutronAdapter;
pub use skale::SkaleAdapter;
pub use solana::SolanaAdapter;
pub use sui::SuiAdapter;
