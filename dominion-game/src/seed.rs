//! Reversible run codes for sharing seeds.
//! Code format: <WORD><NN>-<HEX>, e.g. FALCON42-1F3A, MOAT07-00C2

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash = (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

pub const WORD_LIST: [&str; 64] = [
    "FALCON", "MOAT", "KEEP", "BANNER", "LANCE", "RAMPART", "GRANARY", "FORGE", "TOWER", "CITADEL",
    "HARBOR", "GALLEON", "ARMADA", "PIKE", "SABRE", "HALBERD", "CATAPULT", "TREBUCH", "PALISADE",
    "BASTION", "THRONE", "CROWN", "SCEPTER", "ORB", "RUNE", "GRIMOIRE", "WARDEN", "HERALD",
    "SQUIRE", "KNIGHT", "BARON", "DUKE", "MARSHAL", "LEGION", "COHORT", "VANGUARD", "OUTPOST",
    "FRONTIER", "MARCHES", "VALE", "FJORD", "STEPPE", "DELTA", "MESA", "TUNDRA", "JUNGLE",
    "DESERT", "MINE", "QUARRY", "MARKET", "TITHE", "LEVY", "TREATY", "EDICT", "DECREE", "SIEGE",
    "RAID", "TRUCE", "OMEN", "STORM", "QUAKE", "GATE", "SHIELD", "EMPIRE",
];

const WORD_BITS: u32 = 6;
const NN_BITS: u32 = 7;
const TAG_BITS: u32 = 16;
const PACKED_MASK: u64 = (1 << (WORD_BITS + NN_BITS + TAG_BITS)) - 1;

#[inline]
fn pack(word_index: u16, nn: u8, tag: u16) -> u32 {
    u32::from(word_index & 0x3F)
        | (u32::from(nn & 0x7F) << WORD_BITS)
        | (u32::from(tag) << (WORD_BITS + NN_BITS))
}

#[inline]
fn unpack(packed: u32) -> (u16, u8, u16) {
    let word = (packed & 0x3F) as u16;
    let nn = ((packed >> WORD_BITS) & 0x7F) as u8;
    let tag = ((packed >> (WORD_BITS + NN_BITS)) & 0xFFFF) as u16;
    (word, nn, tag)
}

fn compose_seed(word_index: u16, nn: u8, tag: u16) -> u64 {
    let packed = pack(word_index, nn, tag);
    // Domain-separated FNV input
    let mut buf = [0u8; 10];
    buf[..6].copy_from_slice(b"DOMIN-");
    buf[6..].copy_from_slice(&packed.to_le_bytes());
    let h = fnv1a64(&buf);
    (h & !PACKED_MASK) | u64::from(packed)
}

/// Run code for `seed`. Seeds produced by [`decode_to_seed`] encode back to
/// the code they came from.
#[must_use]
pub fn encode_friendly(seed: u64) -> String {
    let packed = u32::try_from(seed & PACKED_MASK).unwrap_or(0);
    let (wi, mut nn, tag) = unpack(packed);
    let word = WORD_LIST.get(usize::from(wi)).copied().unwrap_or("FALCON");
    if nn > 99 {
        nn %= 100;
    }
    format!("{word}{nn:02}-{tag:04X}")
}

/// Seed named by a run code, or `None` if the code is malformed.
#[must_use]
pub fn decode_to_seed(code: &str) -> Option<u64> {
    let s = code.trim();
    if !s.is_ascii() {
        return None;
    }
    let (head, hex) = s.split_once('-')?;
    if head.len() < 3 || hex.is_empty() || hex.len() > 4 {
        return None;
    }
    let tag = u16::from_str_radix(hex, 16).ok()?;
    let (word_part, nn_part) = head.split_at(head.len() - 2);
    let nn: u8 = nn_part.parse().ok()?;
    let word = sanitize_word(word_part);
    let idx = WORD_LIST.iter().position(|w| sanitize_word(w) == word)?;
    let wi = u16::try_from(idx).ok()?;
    Some(compose_seed(wi, nn, tag))
}

#[must_use]
pub fn generate_code_from_entropy(entropy: u64) -> String {
    let wi = u16::try_from(entropy % WORD_LIST.len() as u64).unwrap_or(0);
    let nn = u8::try_from((entropy >> 17) % 100).unwrap_or(0);
    let tag = u16::try_from((entropy >> 24) & 0xFFFF).unwrap_or(0);
    encode_friendly(compose_seed(wi, nn, tag))
}

/// Numeric seed or run code, whichever `token` is.
#[must_use]
pub fn parse_seed(token: &str) -> Option<u64> {
    let token = token.trim();
    token
        .parse::<u64>()
        .ok()
        .or_else(|| decode_to_seed(token))
}
