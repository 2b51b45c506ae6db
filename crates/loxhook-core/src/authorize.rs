// ── Authorization engine ──
//
// Decides whether a presented secret may run a requested command on a
// control. Pure lookups against immutable data; safe to call from any
// number of request workers at once.

use tracing::trace;

use crate::error::AuthError;
use crate::model::{Control, CredentialTable};

/// Authorize `requested` on `control` for the holder of `secret`.
///
/// All three checks must pass:
/// 1. the secret belongs to a known credential,
/// 2. that credential is listed on the control,
/// 3. the command is allowed (or the control allows `<all>`).
pub fn authorize(
    control: &Control,
    credentials: &CredentialTable,
    secret: &str,
    requested: &str,
) -> Result<(), AuthError> {
    let name = credentials
        .name_for_secret(secret)
        .ok_or(AuthError::UnknownCredential)?;

    if !control.accepts_credential(name) {
        return Err(AuthError::CredentialNotValidForControl {
            credential: name.to_owned(),
            control: control.name.clone(),
        });
    }

    if !control.allows_command(requested) {
        return Err(AuthError::CommandNotAllowed {
            command: requested.to_owned(),
            control: control.name.clone(),
        });
    }

    trace!(control = %control.name, credential = name, command = requested, "authorized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{AllowedCommand, DviCommand};
    use crate::model::Category;

    fn credentials() -> CredentialTable {
        [
            ("test1", "f7932d8a-b37f-46dc-84ee-276c545aec48"),
            ("test2", "88f3cc74-b741-404e-b6a3-136d76796de8"),
            ("test3", "d7d47ae7-44d6-4b4b-b65d-06e7f5bf108e"),
        ]
        .into_iter()
        .collect()
    }

    fn control(allowed: &[DviCommand]) -> Control {
        Control {
            name: "garage".into(),
            category: Category::Dvi,
            id: 1,
            allowed: allowed.iter().copied().map(AllowedCommand::Dvi).collect(),
            credentials: vec!["test1".into(), "test2".into()],
        }
    }

    #[test]
    fn allows_listed_credential_and_command() {
        let ctl = control(&[DviCommand::Pulse, DviCommand::Impuls]);
        let result = authorize(
            &ctl,
            &credentials(),
            "88f3cc74-b741-404e-b6a3-136d76796de8",
            "pulse",
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn denies_command_not_allowed() {
        let ctl = control(&[DviCommand::Pulse, DviCommand::Impuls]);
        let result = authorize(
            &ctl,
            &credentials(),
            "88f3cc74-b741-404e-b6a3-136d76796de8",
            "on",
        );
        assert!(matches!(result, Err(AuthError::CommandNotAllowed { .. })));
    }

    #[test]
    fn denies_known_credential_not_on_control() {
        let ctl = control(&[DviCommand::Pulse]);
        let result = authorize(
            &ctl,
            &credentials(),
            "d7d47ae7-44d6-4b4b-b65d-06e7f5bf108e",
            "pulse",
        );
        assert_eq!(
            result,
            Err(AuthError::CredentialNotValidForControl {
                credential: "test3".into(),
                control: "garage".into(),
            })
        );
    }

    #[test]
    fn denies_unknown_secret() {
        let ctl = control(&[DviCommand::Pulse]);
        let result = authorize(
            &ctl,
            &credentials(),
            "8c9564a1-6af7-4ed0-8656-add107e882a6",
            "pulse",
        );
        assert_eq!(result, Err(AuthError::UnknownCredential));
    }

    #[test]
    fn credential_name_is_not_a_secret() {
        let ctl = control(&[DviCommand::All]);
        let result = authorize(&ctl, &credentials(), "test1", "pulse");
        assert_eq!(result, Err(AuthError::UnknownCredential));
    }

    #[test]
    fn wildcard_allows_any_command() {
        let ctl = control(&[DviCommand::All]);
        for cmd in ["on", "off", "pulse", "ein", "impuls"] {
            let result = authorize(
                &ctl,
                &credentials(),
                "f7932d8a-b37f-46dc-84ee-276c545aec48",
                cmd,
            );
            assert_eq!(result, Ok(()), "{cmd}");
        }
    }
}
