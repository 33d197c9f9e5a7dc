//! The MD5 compression function (RFC 1321, section 3.4) and the little-endian
//! word codecs it relies on.

use zeroize::Zeroize;

/// Size of one MD5 block in bytes (512 bits).
pub const BLOCK_SIZE: usize = 64;

/// The initial values for (A, B, C, D) from RFC 1321.
pub(crate) const INIT_STATE: [u32; 4] = [0x67452301, 0xEFCDAB89, 0x98BADCFE, 0x10325476];

/// The sine table constants (K).
/// K[i] = floor(2^32 * abs(sin(i+1))) for i=0..63
pub(crate) const K: [u32; 64] = [
    // Round 1
    0xd76aa478, 0xe8c7b756, 0x242070db, 0xc1bdceee,
    0xf57c0faf, 0x4787c62a, 0xa8304613, 0xfd469501,
    0x698098d8, 0x8b44f7af, 0xffff5bb1, 0x895cd7be,
    0x6b901122, 0xfd987193, 0xa679438e, 0x49b40821,
    // Round 2
    0xf61e2562, 0xc040b340, 0x265e5a51, 0xe9b6c7aa,
    0xd62f105d, 0x02441453, 0xd8a1e681, 0xe7d3fbc8,
    0x21e1cde6, 0xc33707d6, 0xf4d50d87, 0x455a14ed,
    0xa9e3e905, 0xfcefa3f8, 0x676f02d9, 0x8d2a4c8a,
    // Round 3
    0xfffa3942, 0x8771f681, 0x6d9d6122, 0xfde5380c,
    0xa4beea44, 0x4bdecfa9, 0xf6bb4b60, 0xbebfbc70,
    0x289b7ec6, 0xeaa127fa, 0xd4ef3085, 0x04881d05,
    0xd9d4d039, 0xe6db99e5, 0x1fa27cf8, 0xc4ac5665,
    // Round 4
    0xf4292244, 0x432aff97, 0xab9423a7, 0xfc93a039,
    0x655b59c3, 0x8f0ccc92, 0xffeff47d, 0x85845dd1,
    0x6fa87e4f, 0xfe2ce6e0, 0xa3014314, 0x4e0811a1,
    0xf7537e82, 0xbd3af235, 0x2ad7d2bb, 0xeb86d391,
];

/// Left-rotation amounts, four per round repeated over the 16 steps.
const S: [[u32; 4]; 4] = [
    [7, 12, 17, 22],
    [5, 9, 14, 20],
    [4, 11, 16, 23],
    [6, 10, 15, 21],
];

#[inline(always)]
fn f(x: u32, y: u32, z: u32) -> u32 {
    (x & y) | (!x & z)
}

#[inline(always)]
fn g(x: u32, y: u32, z: u32) -> u32 {
    (x & z) | (y & !z)
}

#[inline(always)]
fn h(x: u32, y: u32, z: u32) -> u32 {
    x ^ y ^ z
}

#[inline(always)]
fn i(x: u32, y: u32, z: u32) -> u32 {
    y ^ (x | !z)
}

/// Decodes little-endian bytes into 32-bit words. `input.len()` must be `4 * output.len()`.
pub(crate) fn decode(output: &mut [u32], input: &[u8]) {
    debug_assert_eq!(input.len(), output.len() * 4);
    for (word, bytes) in output.iter_mut().zip(input.chunks_exact(4)) {
        *word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }
}

/// Encodes 32-bit words as little-endian bytes. `output.len()` must be `4 * input.len()`.
pub(crate) fn encode(output: &mut [u8], input: &[u32]) {
    debug_assert_eq!(output.len(), input.len() * 4);
    for (bytes, word) in output.chunks_exact_mut(4).zip(input) {
        bytes.copy_from_slice(&word.to_le_bytes());
    }
}

/// Mixes one 64-byte block into `state`.
///
/// Each step computes `b + rotl(a + fn(b, c, d) + x[g] + K[step], s)` and then shifts the
/// roles so that (a, b, c, d) becomes (d, new, b, c).
pub(crate) fn transform(state: &mut [u32; 4], block: &[u8]) {
    debug_assert_eq!(block.len(), BLOCK_SIZE);

    let mut x = [0u32; 16];
    decode(&mut x, block);

    let [mut a, mut b, mut c, mut d] = *state;

    for step in 0..64 {
        let round = step / 16;
        let (mixed, index) = match round {
            0 => (f(b, c, d), step),
            1 => (g(b, c, d), (5 * step + 1) % 16),
            2 => (h(b, c, d), (3 * step + 5) % 16),
            _ => (i(b, c, d), (7 * step) % 16),
        };

        let rotated = a
            .wrapping_add(mixed)
            .wrapping_add(x[index])
            .wrapping_add(K[step])
            .rotate_left(S[round][step % 4]);
        let next = rotated.wrapping_add(b);

        a = d;
        d = c;
        c = b;
        b = next;
    }

    state[0] = state[0].wrapping_add(a);
    state[1] = state[1].wrapping_add(b);
    state[2] = state[2].wrapping_add(c);
    state[3] = state[3].wrapping_add(d);

    x.zeroize();
}
