//! Recovery code formatting.
//!
//! A recovery code is a one-shot, human-copyable credential of the form
//! `RK-XXXXXXXX-XXXXXXXX-XXXXXXXX-XXXXXXXX` where each block is 8 uppercase
//! hex digits (128 bits of CSPRNG entropy in total). It is shown to the
//! caller exactly once at registration (or rotation) and never persisted in
//! cleartext.

/// Entropy bytes behind one recovery code.
pub const RECOVERY_ENTROPY_BYTES: usize = 16;

const GROUP_LEN: usize = 8;
const GROUPS: usize = 4;

/// Formats 16 bytes of entropy as a recovery code.
#[must_use]
pub fn format_recovery_code(entropy: &[u8; RECOVERY_ENTROPY_BYTES]) -> String {
    let hex: String = entropy.iter().map(|b| format!("{b:02X}")).collect();
    let groups: Vec<&str> = (0..GROUPS)
        .map(|i| &hex[i * GROUP_LEN..(i + 1) * GROUP_LEN])
        .collect();
    format!("RK-{}", groups.join("-"))
}

/// Checks that a candidate string has the recovery-code shape
/// (`RK-` then four dash-separated groups of 8 uppercase hex digits).
#[must_use]
pub fn is_well_formed(code: &str) -> bool {
    let Some(rest) = code.strip_prefix("RK-") else {
        return false;
    };
    let groups: Vec<&str> = rest.split('-').collect();
    groups.len() == GROUPS
        && groups.iter().all(|g| {
            g.len() == GROUP_LEN
                && g.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        })
}
