//! System-wide constants for the CapVault ledger.

/// Size of an [`Address`](crate::Address) in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Domain separator for deterministic address derivation.
pub const ADDRESS_DERIVATION_DOMAIN: &[u8] = b"capvault:address:v1:";

/// Default number of audit records retained by the event log.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 100_000;

/// Basis-point denominator (100% = 10,000 bps).
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Number of hops in every supported swap route (asset → unit).
pub const DIRECT_ROUTE_LEN: usize = 2;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "CapVault";
