/// Outcome of a failed credential check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("missing credentials")]
    Missing,
    #[error("credentials rejected")]
    Rejected,
    #[error("endpoint is disabled because no credential is configured")]
    NotConfigured,
}

/// Checks an `authorization: Bearer <token>` header value.
pub fn verify_bearer(expected: Option<&str>, header: Option<&str>) -> Result<(), CredentialError> {
    let expected = expected.ok_or(CredentialError::NotConfigured)?;
    let header = header.ok_or(CredentialError::Missing)?;
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .ok_or(CredentialError::Missing)?;
    if constant_time_eq(token.trim().as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(CredentialError::Rejected)
    }
}

/// Checks a raw shared-secret header such as `x-webhook-secret`.
pub fn verify_shared_secret(
    expected: Option<&str>,
    header: Option<&str>,
) -> Result<(), CredentialError> {
    let expected = expected.ok_or(CredentialError::NotConfigured)?;
    match header {
        None => Err(CredentialError::Missing),
        Some(value) if constant_time_eq(value.trim().as_bytes(), expected.as_bytes()) => Ok(()),
        Some(_) => Err(CredentialError::Rejected),
    }
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_requires_scheme_and_matching_token() {
        assert_eq!(verify_bearer(Some("s3cret"), Some("Bearer s3cret")), Ok(()));
        assert_eq!(
            verify_bearer(Some("s3cret"), Some("s3cret")),
            Err(CredentialError::Missing)
        );
        assert_eq!(
            verify_bearer(Some("s3cret"), Some("Bearer nope")),
            Err(CredentialError::Rejected)
        );
        assert_eq!(
            verify_bearer(None, Some("Bearer s3cret")),
            Err(CredentialError::NotConfigured)
        );
    }

    #[test]
    fn shared_secret_distinguishes_missing_from_wrong() {
        assert_eq!(
            verify_shared_secret(Some("hook"), None),
            Err(CredentialError::Missing)
        );
        assert_eq!(
            verify_shared_secret(Some("hook"), Some("hooks")),
            Err(CredentialError::Rejected)
        );
        assert_eq!(verify_shared_secret(Some("hook"), Some("hook")), Ok(()));
    }
}
