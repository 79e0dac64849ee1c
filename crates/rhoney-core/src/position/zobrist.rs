//! Zobrist hash keys

use std::sync::LazyLock;

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::types::{Color, Piece, Square};

/// Fixed seed so keys are identical across runs (bench signatures, `d` output)
const ZOBRIST_SEED: u64 = 1_070_372;

pub struct Zobrist {
    psq: [[u64; Square::NUM]; 12],
    castling: [[u64; 2]; Color::NUM],
    ep_file: [u64; 8],
    side: u64,
}

pub static ZOBRIST: LazyLock<Zobrist> = LazyLock::new(|| {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(ZOBRIST_SEED);
    let mut z = Zobrist {
        psq: [[0; Square::NUM]; 12],
        castling: [[0; 2]; Color::NUM],
        ep_file: [0; 8],
        side: 0,
    };
    for table in z.psq.iter_mut() {
        for key in table.iter_mut() {
            *key = rng.next_u64();
        }
    }
    for sides in z.castling.iter_mut() {
        for key in sides.iter_mut() {
            *key = rng.next_u64();
        }
    }
    for key in z.ep_file.iter_mut() {
        *key = rng.next_u64();
    }
    z.side = rng.next_u64();
    z
});

impl Zobrist {
    #[inline]
    pub fn psq(&self, piece: Piece, sq: Square) -> u64 {
        self.psq[piece.index()][sq.index()]
    }

    /// `side` is 0 for king side, 1 for queen side
    #[inline]
    pub fn castling(&self, color: Color, side: usize) -> u64 {
        self.castling[color.index()][side]
    }

    #[inline]
    pub fn ep_file(&self, file: u8) -> u64 {
        self.ep_file[file as usize]
    }

    #[inline]
    pub fn side(&self) -> u64 {
        self.side
    }
}
