//! Account statuses and the priority tables built from them.

use serde::Serialize;

use crate::normalize::fold;

/// Statuses the allocator understands.
///
/// `label` is what gets written to the sheet; `key` is its folded form as
/// it appears in the clean record and the status index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountStatus {
    Running,
    Registering,
    Waiting,
    WaitingRegistration,
    Login,
    Register,
    Completed,
    Attention,
}

impl AccountStatus {
    pub fn label(self) -> &'static str {
        match self {
            AccountStatus::Running => "Running",
            AccountStatus::Registering => "Registering",
            AccountStatus::Waiting => "Waiting",
            AccountStatus::WaitingRegistration => "Waiting registration",
            AccountStatus::Login => "Login",
            AccountStatus::Register => "Register",
            AccountStatus::Completed => "Completed",
            AccountStatus::Attention => "Attention",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            AccountStatus::Running => "running",
            AccountStatus::Registering => "registering",
            AccountStatus::Waiting => "waiting",
            AccountStatus::WaitingRegistration => "waiting registration",
            AccountStatus::Login => "login",
            AccountStatus::Register => "register",
            AccountStatus::Completed => "completed",
            AccountStatus::Attention => "attention",
        }
    }

    /// Look up a status by its clean key.
    pub fn from_key(key: &str) -> Option<Self> {
        const ALL: [AccountStatus; 8] = [
            AccountStatus::Running,
            AccountStatus::Registering,
            AccountStatus::Waiting,
            AccountStatus::WaitingRegistration,
            AccountStatus::Login,
            AccountStatus::Register,
            AccountStatus::Completed,
            AccountStatus::Attention,
        ];
        ALL.into_iter().find(|s| s.key() == key)
    }

    /// Response type implied by a row in this status, if any.
    pub fn response_type(self) -> Option<ResponseType> {
        match self {
            AccountStatus::Registering
            | AccountStatus::WaitingRegistration
            | AccountStatus::Register => Some(ResponseType::Register),
            AccountStatus::Running | AccountStatus::Waiting | AccountStatus::Login => {
                Some(ResponseType::Login)
            }
            AccountStatus::Completed | AccountStatus::Attention => None,
        }
    }

    /// Status a row takes while a device is working it.
    pub fn active_for(response: ResponseType) -> Self {
        match response {
            ResponseType::Login => AccountStatus::Running,
            ResponseType::Register => AccountStatus::Registering,
        }
    }

    /// Status a stale live row is downgraded to.
    pub fn downgraded(self) -> Self {
        match self {
            AccountStatus::Registering => AccountStatus::WaitingRegistration,
            _ => AccountStatus::Waiting,
        }
    }
}

/// What the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Login,
    Register,
    Auto,
}

impl RequestType {
    /// Parse a caller-supplied type; spelling, case and accents are ignored.
    pub fn parse(input: &str) -> Option<Self> {
        match fold(input).as_str() {
            "login" | "dang nhap" => Some(RequestType::Login),
            "register" | "reg" | "dang ky" => Some(RequestType::Register),
            "auto" => Some(RequestType::Auto),
            _ => None,
        }
    }

    /// Response type when the row's status does not imply one.
    pub fn default_response(self) -> ResponseType {
        match self {
            RequestType::Register => ResponseType::Register,
            RequestType::Login | RequestType::Auto => ResponseType::Login,
        }
    }
}

/// What the caller should do with the row it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Login,
    Register,
}

/// Resolve the response type for a row's clean status.
pub fn response_for(clean_status: &str, request: RequestType) -> ResponseType {
    AccountStatus::from_key(clean_status)
        .and_then(AccountStatus::response_type)
        .unwrap_or_else(|| request.default_response())
}

/// One rule of the auto search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityGroup {
    pub status: AccountStatus,
    pub request_type: RequestType,
    pub rank: u8,
    /// `true`: only rows already owned by the caller; `false`: only
    /// unowned rows.
    pub ownership_required: bool,
}

const LOGIN_MINE: [AccountStatus; 3] = [
    AccountStatus::Running,
    AccountStatus::Waiting,
    AccountStatus::Login,
];
const LOGIN_FREE: [AccountStatus; 2] = [AccountStatus::Waiting, AccountStatus::Login];
const REGISTER_MINE: [AccountStatus; 3] = [
    AccountStatus::Registering,
    AccountStatus::WaitingRegistration,
    AccountStatus::Register,
];
const REGISTER_FREE: [AccountStatus; 2] =
    [AccountStatus::WaitingRegistration, AccountStatus::Register];
const AUTO_MINE: [AccountStatus; 6] = [
    AccountStatus::Running,
    AccountStatus::Registering,
    AccountStatus::Waiting,
    AccountStatus::WaitingRegistration,
    AccountStatus::Login,
    AccountStatus::Register,
];
const AUTO_FREE: [AccountStatus; 4] = [
    AccountStatus::Waiting,
    AccountStatus::Login,
    AccountStatus::WaitingRegistration,
    AccountStatus::Register,
];

/// Priority groups for a request type, in ascending rank.
pub fn groups_for(request_type: RequestType) -> Vec<PriorityGroup> {
    let (mine, free): (&[AccountStatus], &[AccountStatus]) = match request_type {
        RequestType::Login => (&LOGIN_MINE, &LOGIN_FREE),
        RequestType::Register => (&REGISTER_MINE, &REGISTER_FREE),
        RequestType::Auto => (&AUTO_MINE, &AUTO_FREE),
    };

    mine.iter()
        .map(|s| (*s, true))
        .chain(free.iter().map(|s| (*s, false)))
        .enumerate()
        .map(|(i, (status, ownership_required))| PriorityGroup {
            status,
            request_type,
            rank: i as u8 + 1,
            ownership_required,
        })
        .collect()
}

/// Clean statuses that count as a device still holding a row.
pub fn stale_statuses(is_reset: bool) -> Vec<&'static str> {
    let mut statuses = vec![AccountStatus::Running.key(), AccountStatus::Registering.key()];
    if is_reset {
        statuses.push(AccountStatus::Completed.key());
    }
    statuses
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_folded_labels() {
        for key in [
            "running",
            "registering",
            "waiting",
            "waiting registration",
            "login",
            "register",
            "completed",
            "attention",
        ] {
            let status = AccountStatus::from_key(key).unwrap();
            assert_eq!(fold(status.label()), status.key());
        }
    }

    #[test]
    fn test_login_groups_order() {
        let groups = groups_for(RequestType::Login);
        let summary: Vec<(&str, bool, u8)> = groups
            .iter()
            .map(|g| (g.status.key(), g.ownership_required, g.rank))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("running", true, 1),
                ("waiting", true, 2),
                ("login", true, 3),
                ("waiting", false, 4),
                ("login", false, 5),
            ]
        );
    }

    #[test]
    fn test_auto_groups_put_owned_first() {
        let groups = groups_for(RequestType::Auto);
        assert_eq!(groups.len(), 10);
        let first_free = groups.iter().position(|g| !g.ownership_required).unwrap();
        assert!(groups[..first_free].iter().all(|g| g.ownership_required));
        assert!(groups[first_free..].iter().all(|g| !g.ownership_required));
    }

    #[test]
    fn test_response_for_status() {
        assert_eq!(response_for("registering", RequestType::Login), ResponseType::Register);
        assert_eq!(response_for("waiting registration", RequestType::Auto), ResponseType::Register);
        assert_eq!(response_for("running", RequestType::Register), ResponseType::Login);
        assert_eq!(response_for("completed", RequestType::Register), ResponseType::Register);
        assert_eq!(response_for("", RequestType::Auto), ResponseType::Login);
    }

    #[test]
    fn test_request_type_parse() {
        assert_eq!(RequestType::parse(" LOGIN "), Some(RequestType::Login));
        assert_eq!(RequestType::parse("Đăng ký"), Some(RequestType::Register));
        assert_eq!(RequestType::parse("auto"), Some(RequestType::Auto));
        assert_eq!(RequestType::parse("delete"), None);
    }

    #[test]
    fn test_stale_statuses() {
        assert_eq!(stale_statuses(false), vec!["running", "registering"]);
        assert!(stale_statuses(true).contains(&"completed"));
    }
}
