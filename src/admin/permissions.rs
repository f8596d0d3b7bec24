/// Permission resolution
///
/// Pure decision logic. The role-name bypass lives in exactly one predicate
/// so route handlers never compare role strings themselves.

/// Role that bypasses permission checks (but never active/role-existence
/// checks)
pub const SUPER_ADMIN_ROLE: &str = "Super Admin";

/// Roles the directory refuses to modify or delete
pub const PROTECTED_ROLES: [&str; 2] = [SUPER_ADMIN_ROLE, "Admin"];

/// The single bypass branch
pub fn is_privileged(role_name: &str) -> bool {
    role_name == SUPER_ADMIN_ROLE
}

/// Decide whether a principal may proceed.
///
/// Any one match between the granted and required sets suffices; callers are
/// never required to hold a full list simultaneously.
pub fn allow(role_name: &str, granted: &[String], required: &[&str]) -> bool {
    if is_privileged(role_name) {
        return true;
    }

    required.iter().any(|code| granted.iter().any(|g| g == code))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn granted(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_super_admin_bypasses_everything() {
        assert!(allow(SUPER_ADMIN_ROLE, &[], &["users:ban"]));
        assert!(allow(SUPER_ADMIN_ROLE, &[], &["anything:at:all"]));
    }

    #[test]
    fn test_any_single_match_suffices() {
        let held = granted(&["reports:view", "reports:review"]);

        assert!(allow("Moderator", &held, &["reports:review", "reports:dismiss"]));
        assert!(allow("Moderator", &held, &["reports:view"]));
    }

    #[test]
    fn test_empty_intersection_denies() {
        let held = granted(&["analytics:view"]);

        assert!(!allow("Analyst", &held, &["reports:review", "reports:dismiss"]));
        assert!(!allow("Analyst", &held, &["users:ban"]));
    }

    #[test]
    fn test_no_permissions_denies_everything_except_privileged() {
        assert!(!allow("Admin", &[], &["users:ban"]));
        assert!(!allow("User", &[], &["users:ban"]));
        assert!(allow(SUPER_ADMIN_ROLE, &[], &["users:ban"]));
    }

    #[test]
    fn test_is_privileged_is_exact() {
        assert!(is_privileged("Super Admin"));
        assert!(!is_privileged("super admin"));
        assert!(!is_privileged("Admin"));
    }
}
