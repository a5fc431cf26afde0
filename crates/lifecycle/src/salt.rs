const DIGEST_LEN: usize = 16;

/// Derive a deterministic 64-bit salt from seed, kb id, and resource path.
///
/// The inputs are joined with `|` and hashed to a 128-bit digest; the salt
/// is the digest's last 8 bytes read little-endian. The byte selection and
/// endianness are a wire contract: previously issued tokens embed salts
/// produced exactly this way.
pub fn derive_salt(seed: i64, kb_id: &str, resource_path: &str) -> u64 {
    let input = format!("{seed}|{kb_id}|{resource_path}");
    let mut digest = [0u8; DIGEST_LEN];
    blake3::Hasher::new()
        .update(input.as_bytes())
        .finalize_xof()
        .fill(&mut digest);

    let mut tail = [0u8; 8];
    tail.copy_from_slice(&digest[DIGEST_LEN / 2..]);
    u64::from_le_bytes(tail)
}

/// Map a 64-bit salt onto the unit interval.
///
/// The result is nominally in [0,1), but f64 has only 53 bits of mantissa:
/// the topmost ~2^11 salt values round to exactly 1.0, and the strict
/// `u < failure_rate` draw then resolves them to success even at a failure
/// rate of 1.0. Tokens were issued under this float behavior, so it is
/// kept as-is.
pub fn salt_to_unit(salt: u64) -> f64 {
    salt as f64 / 18_446_744_073_709_551_616.0
}
