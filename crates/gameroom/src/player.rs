use tetris_board::Board;
use tetris_board::Piece;
use tetris_board::PieceBag;
use tetris_core::Cursor;
use tetris_core::ID;
use tetris_core::LineCount;
use tetris_core::SCORE_PER_LINE;
use tetris_core::Score;
use tetris_core::WIDTH;

/// A connection's identity within a room. The same value serves as both
/// the connection id and the `PlayerState`'s own id, per the data model:
/// players are identified solely by connection, never by account.
pub type ConnId = ID<PlayerState>;

/// Everything the Room tracks about one seated player: identity, host
/// and liveness flags, score, and the board/piece state that only the
/// Room (never the player directly) is allowed to mutate.
#[derive(Debug, Clone)]
pub struct PlayerState {
    id: ConnId,
    name: String,
    host: bool,
    alive: bool,
    ready: bool,
    score: Score,
    lines_cleared: LineCount,
    board: Board,
    current_piece: Option<Piece>,
    next_piece: Option<Piece>,
    cursor: Cursor,
}

/// What happened when a falling piece was locked into the board.
pub struct LockResult {
    pub lines_cleared: LineCount,
    pub topped_out: bool,
}

impl PlayerState {
    /// A freshly joined player: no board state yet, since boards are
    /// only meaningful once a game has started.
    pub fn join(id: ConnId, name: String, host: bool) -> Self {
        Self {
            id,
            name,
            host,
            alive: true,
            ready: false,
            score: 0,
            lines_cleared: 0,
            board: Board::empty(),
            current_piece: None,
            next_piece: None,
            cursor: 0,
        }
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_host(&self) -> bool {
        self.host
    }

    pub fn set_host(&mut self, host: bool) {
        self.host = host;
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn lines_cleared(&self) -> LineCount {
        self.lines_cleared
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_piece(&self) -> Option<&Piece> {
        self.current_piece.as_ref()
    }

    pub fn next_piece(&self) -> Option<&Piece> {
        self.next_piece.as_ref()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn spectrum(&self) -> [u32; WIDTH] {
        self.board.spectrum()
    }

    /// Resets all per-game state and draws the first two pieces from
    /// `bag`. Called once at room start, and again on restart.
    pub fn start(&mut self, bag: &mut PieceBag) {
        self.board = Board::empty();
        self.score = 0;
        self.lines_cleared = 0;
        self.alive = true;
        self.ready = false;
        self.cursor = 0;
        self.current_piece = Some(Piece::spawn(bag.kind_at(0)));
        self.next_piece = Some(Piece::spawn(bag.kind_at(1)));
    }

    /// Clears per-game state back to a fresh `waiting`-phase player
    /// without drawing any pieces — drawing happens only in `start`,
    /// once the room has a bag to draw from.
    pub fn reset_to_waiting(&mut self) {
        self.board = Board::empty();
        self.score = 0;
        self.lines_cleared = 0;
        self.alive = true;
        self.ready = false;
        self.cursor = 0;
        self.current_piece = None;
        self.next_piece = None;
    }

    /// Attempts to translate the active piece by `(dx, dy)`. No-op if
    /// the result would not be a valid board position.
    pub fn try_move(&mut self, dx: i32, dy: i32) -> bool {
        let Some(piece) = self.current_piece.as_ref() else {
            return false;
        };
        let moved = piece.translated(dx, dy);
        if self.board.is_valid(&moved) {
            self.current_piece = Some(moved);
            true
        } else {
            false
        }
    }

    /// Attempts gravity: one row down. Same rule as `try_move(0, 1)`;
    /// kept distinct for call-site clarity between gravity and soft drop.
    pub fn try_drop(&mut self) -> bool {
        self.try_move(0, 1)
    }

    /// Attempts to rotate the active piece 90 degrees clockwise. No
    /// wall kicks: rejected outright if the rotated shape doesn't fit.
    pub fn try_rotate(&mut self) -> bool {
        let Some(piece) = self.current_piece.as_ref() else {
            return false;
        };
        let rotated = piece.rotated();
        if self.board.is_valid(&rotated) {
            self.current_piece = Some(rotated);
            true
        } else {
            false
        }
    }

    /// Drops the active piece straight to the floor without locking it.
    pub fn drop_to_floor(&mut self) {
        while self.try_drop() {}
    }

    /// Locks the active piece, clears full lines, updates score, and
    /// draws the next piece. Sets `alive = false` if the freshly drawn
    /// piece cannot spawn (topout).
    ///
    /// Panics if there is no active piece — callers only reach this
    /// after a failed `try_drop`, which implies one exists.
    pub fn lock_and_advance(&mut self, bag: &mut PieceBag) -> LockResult {
        let piece = self
            .current_piece
            .take()
            .expect("lock_and_advance requires an active piece");
        self.board = self.board.lock(&piece);
        let (board, cleared) = self.board.clear_lines();
        self.board = board;
        self.score += cleared as Score * SCORE_PER_LINE;
        self.lines_cleared += cleared;

        self.cursor += 1;
        self.current_piece = self.next_piece.take();
        self.next_piece = Some(Piece::spawn(bag.kind_at(self.cursor + 1)));

        let spawned = self
            .current_piece
            .as_ref()
            .expect("advance always draws a replacement piece");
        let topped_out = !self.board.is_valid(spawned);
        if topped_out {
            self.alive = false;
        }
        LockResult {
            lines_cleared: cleared,
            topped_out,
        }
    }

    /// Pushes `rows` penalty rows onto the bottom of the board. Returns
    /// `true` if the active piece no longer fits afterward, in which
    /// case the player has died.
    pub fn receive_penalty(&mut self, rows: LineCount) -> bool {
        if rows == 0 {
            return false;
        }
        self.board = self.board.inject_penalty(rows);
        if let Some(piece) = self.current_piece.as_ref() {
            if !self.board.is_valid(piece) {
                self.alive = false;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_player() -> PlayerState {
        PlayerState::join(ConnId::default(), "alice".into(), true)
    }

    #[test]
    fn join_starts_alive_with_no_board_state() {
        let player = new_player();
        assert!(player.is_alive());
        assert!(player.current_piece().is_none());
        assert_eq!(player.cursor(), 0);
    }

    #[test]
    fn start_draws_current_and_next_from_the_bag() {
        let mut player = new_player();
        let mut bag = PieceBag::new(1);
        player.start(&mut bag);
        assert!(player.current_piece().is_some());
        assert!(player.next_piece().is_some());
        assert_eq!(player.current_piece().unwrap().kind(), bag.kind_at(0));
        assert_eq!(player.next_piece().unwrap().kind(), bag.kind_at(1));
    }

    #[test]
    fn lock_and_advance_draws_a_fresh_pair_and_bumps_the_cursor() {
        let mut player = new_player();
        let mut bag = PieceBag::new(2);
        player.start(&mut bag);
        let before_next = player.next_piece().unwrap().kind();
        let result = player.lock_and_advance(&mut bag);
        assert_eq!(result.lines_cleared, 0);
        assert!(!result.topped_out);
        assert_eq!(player.cursor(), 1);
        assert_eq!(player.current_piece().unwrap().kind(), before_next);
        assert_eq!(player.next_piece().unwrap().kind(), bag.kind_at(2));
    }

    #[test]
    fn a_non_clearing_lock_leaves_score_untouched() {
        // Board's own suite (full_row_clears, penalty_row_never_clears)
        // pins ClearLines behavior in isolation; this just checks
        // PlayerState wires the score/lines_cleared update through
        // correctly when nothing actually clears.
        let mut player = new_player();
        let mut bag = PieceBag::new(11);
        player.start(&mut bag);
        let result = player.lock_and_advance(&mut bag);
        assert_eq!(result.lines_cleared, 0);
        assert_eq!(player.score(), 0);
        assert_eq!(player.lines_cleared(), 0);
    }

    #[test]
    fn receive_penalty_kills_player_when_piece_no_longer_fits() {
        let mut player = new_player();
        let mut bag = PieceBag::new(3);
        player.start(&mut bag);
        // bury the board under a full stack of penalty rows so the
        // spawn cell is occupied.
        let died = player.receive_penalty(WIDTH as LineCount * 2);
        assert!(died);
        assert!(!player.is_alive());
    }

    #[test]
    fn reset_to_waiting_clears_state_without_drawing_pieces() {
        let mut player = new_player();
        let mut bag = PieceBag::new(6);
        player.start(&mut bag);
        player.receive_penalty(3);
        player.reset_to_waiting();
        assert!(player.current_piece().is_none());
        assert!(player.next_piece().is_none());
        assert_eq!(player.cursor(), 0);
        assert_eq!(player.score(), 0);
        assert!(player.is_alive());
        assert_eq!(player.board(), &Board::empty());
    }

    #[test]
    fn rotation_against_the_wall_is_rejected_and_leaves_the_piece_unchanged() {
        let mut player = new_player();
        let mut bag = PieceBag::new(9);
        player.start(&mut bag);
        // Drive the bag until a vertical I piece lands hard against the
        // right wall: rotating it again would swing cells past column 9.
        loop {
            if player.current_piece().unwrap().kind() == tetris_board::Kind::I {
                break;
            }
            player.lock_and_advance(&mut bag);
        }
        assert!(player.try_rotate(), "first rotation to vertical must succeed in an empty board");
        while player.try_move(1, 0) {}
        let before = player.current_piece().unwrap().clone();
        let rotated = player.try_rotate();
        assert!(!rotated, "rotating against the wall must be rejected, no wall kicks");
        assert_eq!(player.current_piece().unwrap(), &before);
    }

    #[test]
    fn receive_zero_penalty_is_a_no_op() {
        let mut player = new_player();
        let mut bag = PieceBag::new(4);
        player.start(&mut bag);
        let board_before = player.board().clone();
        let died = player.receive_penalty(0);
        assert!(!died);
        assert_eq!(player.board(), &board_before);
    }
}
