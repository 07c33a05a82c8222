//! Core domain value types: [`Asset`](asset::Asset), [`Currency`](currency::Currency),
//! [`Amount`](amount::Amount), [`Wallet`](wallet::Wallet), [`Size`](size::Size),
//! [`Timeframe`](timeframe::Timeframe) and [`Timeline`](timeline::Timeline). These are immutable
//! value types shared freely across strategy, converter, broker and metrics consumers.

pub mod amount;
pub mod asset;
pub mod currency;
pub mod size;
pub mod timeframe;
pub mod timeline;
pub mod wallet;

pub use amount::Amount;
pub use asset::{Asset, AssetError, AssetType};
pub use currency::Currency;
pub use size::Size;
pub use timeframe::Timeframe;
pub use timeline::Timeline;
pub use wallet::Wallet;
