use stellar_strkey::ed25519::PublicKey;

/// Length of a strkey-encoded ed25519 key.
pub const ADDRESS_LENGTH: usize = 56;

/// Returns true iff `s` is a validly encoded ed25519 public key (`G...`).
///
/// Purely structural: length, version byte and checksum are checked by the
/// strkey decoder, nothing touches the network. Secret seeds (`S...`) share
/// the length but carry a different version byte and are rejected.
pub fn is_valid_address(s: &str) -> bool {
    if s.len() != ADDRESS_LENGTH || !s.starts_with('G') {
        return false;
    }
    PublicKey::from_string(s).is_ok()
}

/// Shortened form used in headers and file names, e.g. `GABC...WXYZ`.
pub fn short_address(address: &str) -> String {
    if address.len() <= 8 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..4], &address[address.len() - 4..])
}
