const BASE: i64 = 50;
const LEVEL_GAP_FLOOR: i64 = -10;
const LEVEL_GAP_WEIGHT: i64 = 8;
const LEVEL_WEIGHT: i64 = 2;
const BIO_BONUS: i64 = 10;
const HOSTED_WEIGHT: i64 = 2;

/// Ranking score of one candidate for one search.
///
/// Under-qualification is penalised down to a floor of `-10 * 8`; being
/// over-qualified is rewarded without a cap. The result is never negative.
pub fn compute_score(bio_present: bool, offered_level: i64, wanted_level: i64, hosted_sessions: u64) -> u64 {
    let hosted = i64::try_from(hosted_sessions).unwrap_or(i64::MAX);

    let total = BASE
        .saturating_add(offered_level.saturating_sub(wanted_level).max(LEVEL_GAP_FLOOR).saturating_mul(LEVEL_GAP_WEIGHT))
        .saturating_add(offered_level.saturating_mul(LEVEL_WEIGHT))
        .saturating_add(if bio_present { BIO_BONUS } else { 0 })
        .saturating_add(hosted.saturating_mul(HOSTED_WEIGHT));

    total.max(0).unsigned_abs()
}
