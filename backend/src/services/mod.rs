//! Business logic services for the pharmacy ledger

pub mod auth;
pub mod ledger;
pub mod maintenance;
pub mod medicine;
pub mod party;
pub mod reporting;
pub mod user;

pub use auth::AuthService;
pub use ledger::LedgerService;
pub use maintenance::MaintenanceService;
pub use medicine::MedicineService;
pub use party::PartyService;
pub use reporting::ReportingService;
pub use user::UserService;

/// `ILIKE` pattern for a keyword search; blank keywords disable the filter
pub(crate) fn like_pattern(keyword: Option<&str>) -> Option<String> {
    let keyword = keyword.map(str::trim).filter(|k| !k.is_empty())?;
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{escaped}%"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(Some(" 阿莫 ")).as_deref(), Some("%阿莫%"));
        assert_eq!(like_pattern(Some("50%_off")).as_deref(), Some("%50\\%\\_off%"));
        assert_eq!(like_pattern(Some("   ")), None);
        assert_eq!(like_pattern(None), None);
    }
}
