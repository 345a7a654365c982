use crate::core::{MatchResult, MismatchReason, PassportRecord};

/// 比對呼叫端宣稱的姓名與護照紀錄
///
/// Exact, case-sensitive equality on first and last name independently.
/// No trimming, no case folding, no partial matches.
pub fn match_identity(
    claimed_first: &str,
    claimed_last: &str,
    record: Option<&PassportRecord>,
) -> MatchResult {
    let Some(record) = record else {
        return MatchResult::NotFound;
    };

    let first_ok = claimed_first == record.first_name;
    let last_ok = claimed_last == record.last_name;

    match (first_ok, last_ok) {
        (true, true) => MatchResult::Match,
        (false, true) => MatchResult::Mismatch(MismatchReason::FirstName),
        (true, false) => MatchResult::Mismatch(MismatchReason::LastName),
        (false, false) => MatchResult::Mismatch(MismatchReason::Both),
    }
}
