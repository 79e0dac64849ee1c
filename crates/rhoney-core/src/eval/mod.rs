//! Static evaluation
//!
//! Hand-crafted, tapered between middlegame and endgame by non-pawn material:
//! material, piece-square terms and mobility. Scores are returned from the
//! side to move's point of view.

use std::fmt::Write as _;

use crate::position::{DIAGONALS, KNIGHT_STEPS, ORTHOGONALS, Position};
use crate::types::{Color, PieceType, Square, Value};

/// Middlegame / endgame pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub mg: i32,
    pub eg: i32,
}

impl Score {
    pub const fn new(mg: i32, eg: i32) -> Score {
        Score { mg, eg }
    }
}

impl std::ops::Add for Score {
    type Output = Score;
    fn add(self, rhs: Score) -> Score {
        Score::new(self.mg + rhs.mg, self.eg + rhs.eg)
    }
}

impl std::ops::Sub for Score {
    type Output = Score;
    fn sub(self, rhs: Score) -> Score {
        Score::new(self.mg - rhs.mg, self.eg - rhs.eg)
    }
}

impl std::ops::AddAssign for Score {
    fn add_assign(&mut self, rhs: Score) {
        *self = *self + rhs;
    }
}

const PIECE_VALUE: [Score; PieceType::NUM] = [
    Score::new(128, 213),
    Score::new(781, 854),
    Score::new(825, 915),
    Score::new(1276, 1380),
    Score::new(2538, 2682),
    Score::new(0, 0),
];

const MIDGAME_LIMIT: i32 = 15258;
const ENDGAME_LIMIT: i32 = 3915;
const PHASE_MIDGAME: i32 = 128;
const TEMPO: i32 = 28;

const MOBILITY_WEIGHT: [Score; PieceType::NUM] = [
    Score::new(0, 0),
    Score::new(8, 6),
    Score::new(7, 8),
    Score::new(4, 9),
    Score::new(2, 5),
    Score::new(0, 0),
];

/// Terms reported by `trace`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Term {
    Material,
    Placement,
    Mobility,
}

impl Term {
    const ALL: [Term; 3] = [Term::Material, Term::Placement, Term::Mobility];

    fn name(self) -> &'static str {
        match self {
            Term::Material => "Material",
            Term::Placement => "Placement",
            Term::Mobility => "Mobility",
        }
    }
}

/// Per-colour term scores
#[derive(Debug, Default)]
struct Breakdown {
    terms: [[Score; Color::NUM]; 3],
    non_pawn_material: i32,
}

impl Breakdown {
    fn collect(pos: &Position) -> Breakdown {
        let mut b = Breakdown::default();
        for (sq, piece) in pos.pieces() {
            let c = piece.color.index();
            let rel = relative(sq, piece.color);
            b.terms[Term::Material as usize][c] += PIECE_VALUE[piece.kind.index()];
            b.terms[Term::Placement as usize][c] += placement(piece.kind, rel);
            b.terms[Term::Mobility as usize][c] += mobility(pos, sq, piece.kind, piece.color);
            if !matches!(piece.kind, PieceType::Pawn | PieceType::King) {
                b.non_pawn_material += PIECE_VALUE[piece.kind.index()].mg;
            }
        }
        b
    }

    fn term(&self, term: Term, color: Color) -> Score {
        self.terms[term as usize][color.index()]
    }

    /// Sum of all terms, White minus Black
    fn total(&self) -> Score {
        Term::ALL.iter().fold(Score::default(), |acc, &t| {
            acc + self.term(t, Color::White) - self.term(t, Color::Black)
        })
    }

    fn phase(&self) -> i32 {
        let npm = self.non_pawn_material.clamp(ENDGAME_LIMIT, MIDGAME_LIMIT);
        ((npm - ENDGAME_LIMIT) * PHASE_MIDGAME) / (MIDGAME_LIMIT - ENDGAME_LIMIT)
    }

    fn taper(&self, s: Score) -> i32 {
        let phase = self.phase();
        (s.mg * phase + s.eg * (PHASE_MIDGAME - phase)) / PHASE_MIDGAME
    }
}

/// Square seen from `color`'s side of the board
#[inline]
fn relative(sq: Square, color: Color) -> Square {
    match color {
        Color::White => sq,
        Color::Black => sq.flip_rank(),
    }
}

fn placement(kind: PieceType, sq: Square) -> Score {
    let file = i32::from(sq.file());
    let rank = i32::from(sq.rank());
    // 0 on the rim, 3 in the centre
    let centre = (3 - (2 * file - 7).abs() / 2).min(3 - (2 * rank - 7).abs() / 2);
    let file_centre = 3 - (2 * file - 7).abs() / 2;

    match kind {
        PieceType::Pawn => Score::new(
            if (3..=4).contains(&file) { 4 * rank } else { 2 * rank },
            6 * rank,
        ),
        PieceType::Knight => Score::new(12 * centre - 20, 8 * centre - 14),
        PieceType::Bishop => Score::new(6 * centre - 6, 4 * centre - 6),
        PieceType::Rook => Score::new(3 * file_centre + if rank == 6 { 12 } else { 0 }, 0),
        PieceType::Queen => Score::new(2 * centre - 4, 6 * centre - 8),
        PieceType::King => Score::new(-12 * rank + 4 * (3 - file_centre), 14 * centre - 22),
    }
}

fn mobility(pos: &Position, from: Square, kind: PieceType, color: Color) -> Score {
    let count = match kind {
        PieceType::Knight => KNIGHT_STEPS
            .iter()
            .filter_map(|&(df, dr)| from.offset(df, dr))
            .filter(|&sq| pos.piece_on(sq).is_none_or(|p| p.color != color))
            .count(),
        PieceType::Bishop => slider_reach(pos, from, &DIAGONALS, color),
        PieceType::Rook => slider_reach(pos, from, &ORTHOGONALS, color),
        PieceType::Queen => {
            slider_reach(pos, from, &DIAGONALS, color)
                + slider_reach(pos, from, &ORTHOGONALS, color)
        }
        PieceType::Pawn | PieceType::King => return Score::default(),
    } as i32;

    // Centre the count so an average piece scores about zero
    let centred = count - match kind {
        PieceType::Knight => 4,
        PieceType::Bishop => 6,
        PieceType::Rook => 7,
        _ => 13,
    };
    let w = MOBILITY_WEIGHT[kind.index()];
    Score::new(w.mg * centred, w.eg * centred)
}

fn slider_reach(pos: &Position, from: Square, dirs: &[(i8, i8)], color: Color) -> usize {
    let mut n = 0;
    for &(df, dr) in dirs {
        let mut cur = from;
        while let Some(sq) = cur.offset(df, dr) {
            match pos.piece_on(sq) {
                Some(p) => {
                    if p.color != color {
                        n += 1;
                    }
                    break;
                }
                None => n += 1,
            }
            cur = sq;
        }
    }
    n
}

/// White-side evaluation in internal units, tempo excluded
fn white_eval(b: &Breakdown) -> i32 {
    b.taper(b.total())
}

/// Static evaluation from the side to move's point of view
pub fn evaluate(pos: &Position) -> Value {
    let b = Breakdown::collect(pos);
    let white = white_eval(&b);
    let v = match pos.side_to_move() {
        Color::White => white,
        Color::Black => -white,
    } + TEMPO;

    let bound = Value::MATE_IN_MAX_PLY.raw() - 1;
    Value::new(v.clamp(-bound, bound))
}

fn pawns(v: i32) -> f64 {
    Value::new(v).to_pawns()
}

/// Human-readable breakdown of the evaluation, White's point of view
pub fn trace(pos: &Position) -> String {
    let b = Breakdown::collect(pos);
    let mut out = String::new();

    let _ = writeln!(out, "     Term    |    White    |    Black    |    Total   ");
    let _ = writeln!(out, "             |   MG    EG  |   MG    EG  |   MG    EG ");
    let _ = writeln!(out, " ------------+-------------+-------------+------------");
    for term in Term::ALL {
        let w = b.term(term, Color::White);
        let k = b.term(term, Color::Black);
        let t = w - k;
        let _ = writeln!(
            out,
            " {:>11} | {:5.2} {:5.2} | {:5.2} {:5.2} | {:5.2} {:5.2}",
            term.name(),
            pawns(w.mg),
            pawns(w.eg),
            pawns(k.mg),
            pawns(k.eg),
            pawns(t.mg),
            pawns(t.eg),
        );
    }
    let total = b.total();
    let _ = writeln!(out, " ------------+-------------+-------------+------------");
    let _ = writeln!(
        out,
        " {:>11} |             |             | {:5.2} {:5.2}",
        "Total",
        pawns(total.mg),
        pawns(total.eg)
    );
    let _ = writeln!(out);

    if pos.in_check() {
        let _ = write!(out, "Final evaluation: none (in check)");
    } else {
        let white = evaluate(pos).raw() * if pos.side_to_move() == Color::White { 1 } else { -1 };
        let _ = write!(out, "Final evaluation: {:+.2} (white side)", pawns(white));
    }
    out
}
