//! Channel name validation and generation.

use rand::Rng;

use crate::error::{ChannelError, Result};

/// Length of generated names.
pub const GENERATED_NAME_LEN: usize = 4;

const LEADING: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const TRAILING: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a name: one uppercase letter followed by three uppercase letters
/// or digits, each drawn uniformly from `rng`.
pub fn generate_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut name = String::with_capacity(GENERATED_NAME_LEN);
    name.push(LEADING[rng.gen_range(0..LEADING.len())] as char);
    for _ in 1..GENERATED_NAME_LEN {
        name.push(TRAILING[rng.gen_range(0..TRAILING.len())] as char);
    }
    name
}

/// Check that `name` is non-empty and alphanumeric.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ChannelError::Configuration(
            "channel name is an empty string".to_string(),
        ));
    }
    if !name.chars().all(char::is_alphanumeric) {
        return Err(ChannelError::Configuration(format!(
            "channel name {name:?} is not alphanumeric"
        )));
    }
    Ok(())
}

/// Validate a supplied name, or generate one from `rng` when absent.
pub fn resolve_name<R: Rng + ?Sized>(name: Option<&str>, rng: &mut R) -> Result<String> {
    let name = match name {
        Some(name) => name.to_string(),
        None => generate_name(rng),
    };
    validate_name(&name)?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn generated_names_are_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let name = generate_name(&mut rng);
            assert_eq!(name.len(), GENERATED_NAME_LEN);
            assert!(name.chars().next().unwrap().is_ascii_uppercase());
            assert!(name
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
            validate_name(&name).unwrap();
        }
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let a = generate_name(&mut StdRng::seed_from_u64(42));
        let b = generate_name(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_empty_and_non_alphanumeric() {
        for bad in ["", "A B", "ABC!", "a-b", "x_y", "tab\t"] {
            assert!(
                matches!(validate_name(bad), Err(ChannelError::Configuration(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_mixed_case_and_digits() {
        for good in ["TEST", "abc", "A1b2", "7"] {
            validate_name(good).unwrap();
        }
    }

    #[test]
    fn accepts_unicode_alphanumerics() {
        assert!(validate_name("Ä1").is_ok());
        assert!(validate_name("日本").is_ok());
        assert!(validate_name("Ä-1").is_err());
    }

    #[test]
    fn resolve_prefers_supplied_name() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(resolve_name(Some("Mine"), &mut rng).unwrap(), "Mine");
        assert_eq!(resolve_name(None, &mut rng).unwrap().len(), 4);
        assert!(resolve_name(Some(""), &mut rng).is_err());
    }
}
