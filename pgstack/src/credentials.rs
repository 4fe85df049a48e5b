use std::collections::BTreeMap;

use rand::Rng;
use secrecy::SecretString;

/// Secret data key holding the generated database superuser name.
pub const USERNAME_KEY: &str = "POSTGRES_USER";
/// Secret data key holding the generated password.
pub const PASSWORD_KEY: &str = "POSTGRES_PASSWORD";
/// Secret data key holding the initial database name.
pub const DATABASE_KEY: &str = "POSTGRES_DB";

/// Database created on first startup of a provisioned instance.
const DATABASE_NAME: &str = "app_db";

const USERNAME_LENGTH: usize = 12;
const PASSWORD_LENGTH: usize = 24;

/// Generates a fresh credential set for a new application instance.
///
/// The username is lowercase alphabetic so it stays a valid unquoted
/// Postgres identifier. Callers must only invoke this when no credential
/// Secret exists yet; rotation is out of scope.
pub fn generate_credentials() -> BTreeMap<String, SecretString> {
    BTreeMap::from([
        (
            USERNAME_KEY.to_string(),
            SecretString::from(generate_random_alpha_str(USERNAME_LENGTH)),
        ),
        (
            PASSWORD_KEY.to_string(),
            SecretString::from(generate_random_alphanumeric_str(PASSWORD_LENGTH)),
        ),
        (
            DATABASE_KEY.to_string(),
            SecretString::from(DATABASE_NAME.to_string()),
        ),
    ])
}

/// Whether `data` is a full credential set as produced by
/// [`generate_credentials`].
///
/// A live Secret that lost or gained keys out of band is no longer a
/// credential set; plans must not carry it over as desired state.
pub fn is_credential_set(data: &BTreeMap<String, SecretString>) -> bool {
    data.len() == 3
        && [USERNAME_KEY, PASSWORD_KEY, DATABASE_KEY]
            .iter()
            .all(|key| data.contains_key(*key))
}

/// Generates a random lowercase alphabetic string of length `len`
fn generate_random_alpha_str(len: usize) -> String {
    let chars = [
        'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r',
        's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
    ];
    let mut rng = rand::rng();
    (0..len)
        .map(|_| chars[rng.random_range(0..chars.len())])
        .collect()
}

/// Generates a random alphanumeric string of length `len`
fn generate_random_alphanumeric_str(len: usize) -> String {
    let chars: Vec<char> = ('a'..='z').chain('A'..='Z').chain('0'..='9').collect();
    let mut rng = rand::rng();
    (0..len)
        .map(|_| chars[rng.random_range(0..chars.len())])
        .collect()
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn credentials_have_the_expected_shape() {
        let credentials = generate_credentials();

        let username = credentials[USERNAME_KEY].expose_secret();
        assert_eq!(username.len(), USERNAME_LENGTH);
        assert!(username.chars().all(|c| c.is_ascii_lowercase()));

        let password = credentials[PASSWORD_KEY].expose_secret();
        assert_eq!(password.len(), PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));

        assert_eq!(credentials[DATABASE_KEY].expose_secret(), DATABASE_NAME);
    }

    #[test]
    fn incomplete_key_sets_are_not_credential_sets() {
        let mut data = generate_credentials();
        assert!(is_credential_set(&data));

        data.remove(PASSWORD_KEY);
        assert!(!is_credential_set(&data));

        let mut extra = generate_credentials();
        extra.insert(
            "PGDATA".to_string(),
            SecretString::from("/var/lib/postgresql/data".to_string()),
        );
        assert!(!is_credential_set(&extra));
    }

    #[test]
    fn each_call_mints_a_distinct_password() {
        let first = generate_credentials();
        let second = generate_credentials();
        assert_ne!(
            first[PASSWORD_KEY].expose_secret(),
            second[PASSWORD_KEY].expose_secret()
        );
    }
}
