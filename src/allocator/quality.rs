//! Minimum-field checks for candidate rows.

use std::fmt;

use super::groups::{RequestType, ResponseType};
use crate::record::columns::{EMAIL, PASSWORD, USER_NAME};
use crate::record::Record;

/// Field a candidate row lacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Email,
    /// Neither email nor user name
    Login,
    Password,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingField::Email => write!(f, "email"),
            MissingField::Login => write!(f, "email or user name"),
            MissingField::Password => write!(f, "password"),
        }
    }
}

/// Check that a row has what the caller needs to work it.
///
/// - register: email
/// - everything else: (email or user name) and password
/// - auto requests also accept a row that only has an email
pub fn check_quality(
    record: &Record,
    request: RequestType,
    response: ResponseType,
) -> Result<(), MissingField> {
    let has_email = !record.get(EMAIL).is_empty();

    if response == ResponseType::Register {
        return if has_email { Ok(()) } else { Err(MissingField::Email) };
    }

    let has_login = has_email || !record.get(USER_NAME).is_empty();
    let has_password = !record.get(PASSWORD).is_empty();

    if has_login && has_password {
        Ok(())
    } else if request == RequestType::Auto && has_email {
        Ok(())
    } else if !has_login {
        Err(MissingField::Login)
    } else {
        Err(MissingField::Password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CellValue;

    fn record(email: &str, user_name: &str, password: &str) -> Record {
        let mut record = Record::blank();
        record.set(EMAIL, CellValue::text(email));
        record.set(USER_NAME, CellValue::text(user_name));
        record.set(PASSWORD, CellValue::text(password));
        record
    }

    #[test]
    fn test_register_needs_email_only() {
        let ok = record("a@x.com", "", "");
        let bad = record("", "alice", "pw");
        assert_eq!(check_quality(&ok, RequestType::Register, ResponseType::Register), Ok(()));
        assert_eq!(
            check_quality(&bad, RequestType::Register, ResponseType::Register),
            Err(MissingField::Email)
        );
    }

    #[test]
    fn test_login_needs_identity_and_password() {
        let by_name = record("", "alice", "pw");
        let no_pw = record("a@x.com", "", "");
        let nothing = record("", "", "pw");

        assert_eq!(check_quality(&by_name, RequestType::Login, ResponseType::Login), Ok(()));
        assert_eq!(
            check_quality(&no_pw, RequestType::Login, ResponseType::Login),
            Err(MissingField::Password)
        );
        assert_eq!(
            check_quality(&nothing, RequestType::Login, ResponseType::Login),
            Err(MissingField::Login)
        );
    }

    #[test]
    fn test_auto_accepts_email_only() {
        let email_only = record("a@x.com", "", "");
        let name_only = record("", "alice", "");
        assert_eq!(check_quality(&email_only, RequestType::Auto, ResponseType::Login), Ok(()));
        assert_eq!(
            check_quality(&name_only, RequestType::Auto, ResponseType::Login),
            Err(MissingField::Password)
        );
    }
}
