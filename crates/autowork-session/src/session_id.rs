use rand::RngCore;

/// Random bytes per session id; rendered as twice as many hex characters.
pub const SESSION_ID_BYTES: usize = 4;

/// Returns a fresh lowercase-hex session id with 32 bits of entropy.
pub fn generate_session_id() -> String {
    let mut bytes = [0_u8; SESSION_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}
