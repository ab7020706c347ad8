pub mod card;
pub mod spend;

pub use card::{Card, EarnRuleSpec};
pub use spend::SpendProfile;
