/// Rating every item starts from the first time it shows up in an Elo replay.
pub const INITIAL_ELO_RATING: f64 = 1200.0;

/// Elo K-factor: the largest rating change a single vote can cause.
///
/// Kept low on purpose. A photo's cuteness does not drift over time the way a
/// player's skill does, so ratings should settle rather than chase recent votes.
pub const ELO_K_FACTOR: f64 = 10.0;

/// Rating gap at which the stronger item is expected to win 10:1.
pub const ELO_SCALE: f64 = 400.0;

/// Decimal places kept from the Elo expected score before it is applied.
///
/// Ratings have historically been computed with the expectation truncated to
/// three places; changing this shifts every published Elo score slightly.
pub const ELO_EXPECTATION_DECIMALS: u32 = 3;
