//! CSRF `state` values for the authorization redirect.

use base64::Engine;

/// Number of random bytes behind each state value.
const STATE_BYTES: usize = 16;

/// Generate an unpredictable, URL-safe state value.
///
/// Bytes come from the operating system's CSPRNG.
pub fn generate_state() -> Result<String, getrandom::Error> {
    let mut bytes = [0u8; STATE_BYTES];
    getrandom::fill(&mut bytes)?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn state_is_url_safe_and_fixed_length() {
        let state = generate_state().unwrap();
        assert_eq!(state.len(), 22);
        assert!(
            state
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn states_do_not_repeat() {
        let seen: HashSet<String> = (0..256).map(|_| generate_state().unwrap()).collect();
        assert_eq!(seen.len(), 256);
    }
}
