//! Tic-tac-toe integration tests.
//!
//! Two players alternate, the waiting player plays `noop`. These tests drive
//! the compiled game through complete matches and check the queries at each
//! step.

use std::sync::Arc;

use rust_ggp::{Game, JointMove, RoleId, State};

const WHITE: RoleId = RoleId::new(0);
const BLACK: RoleId = RoleId::new(1);

fn tictactoe() -> Arc<Game> {
    Game::from_file("tests/fixtures/tictactoe.gdl").expect("tic-tac-toe compiles")
}

/// Play `mark` for the player in control and `noop` for the other one.
fn mark(state: &State, player: RoleId, cell: &str) -> State {
    let game = state.game();
    let other = if player == WHITE { BLACK } else { WHITE };
    let pairs = [
        (player, game.parse_move(cell).unwrap()),
        (other, game.parse_move("noop").unwrap()),
    ];
    state.apply_pairs(&pairs).unwrap()
}

// =============================================================================
// Initial State
// =============================================================================

#[test]
fn test_roles_in_declaration_order() {
    let game = tictactoe();

    assert_eq!(game.role_count(), 2);
    assert_eq!(game.role_by_name("white"), Some(WHITE));
    assert_eq!(game.role_by_name("black"), Some(BLACK));
    assert_eq!(game.role_by_name("red"), None);
    assert_eq!(game.display(game.role_name(BLACK)).to_string(), "black");
}

#[test]
fn test_initial_state() {
    let game = tictactoe();
    let state = State::new(&game);

    assert_eq!(state.round(), 0);
    assert_eq!(state.fact_count(), 10);
    assert!(state.contains_fact(&game.parse_move("(control white)").unwrap()));
    assert!(state.contains_fact(&game.parse_move("(cell 2 2 b)").unwrap()));
    assert!(!state.is_terminal());
}

#[test]
fn test_initial_legal_moves() {
    let game = tictactoe();
    let state = State::new(&game);

    let legal = state.legal_moves().unwrap();
    assert_eq!(legal[WHITE].len(), 9);
    assert_eq!(legal[BLACK], vec![game.parse_move("noop").unwrap()]);

    assert_eq!(state.legal_pairs().unwrap().len(), 10);
    assert_eq!(state.joint_moves().unwrap().len(), 9);

    assert!(state.is_legal(WHITE, &game.parse_move("(mark 3 1)").unwrap()));
    assert!(!state.is_legal(WHITE, &game.parse_move("noop").unwrap()));
    assert!(!state.is_legal(BLACK, &game.parse_move("(mark 3 1)").unwrap()));
}

#[test]
fn test_initial_goals_are_a_draw() {
    let game = tictactoe();
    let state = State::new(&game);

    // Goals are defined in every state of this game, not only terminal ones.
    assert_eq!(state.goals().unwrap().as_slice(), &[50, 50]);
}

// =============================================================================
// Complete Matches
// =============================================================================

#[test]
fn test_white_wins_top_row() {
    let game = tictactoe();
    let mut state = State::new(&game);

    state = mark(&state, WHITE, "(mark 1 1)");
    assert!(!state.is_terminal());
    assert_eq!(state.legal_moves_for(BLACK).len(), 8);
    assert_eq!(state.legal_moves_for(WHITE).len(), 1);

    state = mark(&state, BLACK, "(mark 2 1)");
    state = mark(&state, WHITE, "(mark 1 2)");
    state = mark(&state, BLACK, "(mark 2 2)");
    assert!(!state.is_terminal());

    state = mark(&state, WHITE, "(mark 1 3)");
    assert!(state.is_terminal());
    assert_eq!(state.round(), 5);
    assert_eq!(state.goal(WHITE).unwrap(), 100);
    assert_eq!(state.goal(BLACK).unwrap(), 0);
    assert!(state.contains_fact(&game.parse_move("(cell 1 3 x)").unwrap()));
    assert!(state.contains_fact(&game.parse_move("(cell 2 2 o)").unwrap()));
}

#[test]
fn test_full_board_draw() {
    let game = tictactoe();
    let mut state = State::new(&game);

    let moves = [
        (WHITE, "(mark 1 1)"),
        (BLACK, "(mark 1 2)"),
        (WHITE, "(mark 1 3)"),
        (BLACK, "(mark 2 2)"),
        (WHITE, "(mark 2 1)"),
        (BLACK, "(mark 3 1)"),
        (WHITE, "(mark 3 2)"),
        (BLACK, "(mark 2 3)"),
    ];
    for (player, cell) in moves {
        state = mark(&state, player, cell);
        assert!(!state.is_terminal(), "{cell} should not end the game");
    }

    state = mark(&state, WHITE, "(mark 3 3)");
    assert!(state.is_terminal());
    assert_eq!(state.goals().unwrap().as_slice(), &[50, 50]);
}

#[test]
fn test_evaluate_derived_predicate() {
    let game = tictactoe();
    let mut state = State::new(&game);
    for (player, cell) in [
        (WHITE, "(mark 1 1)"),
        (BLACK, "(mark 2 1)"),
        (WHITE, "(mark 1 2)"),
        (BLACK, "(mark 2 2)"),
        (WHITE, "(mark 1 3)"),
    ] {
        state = mark(&state, player, cell);
    }

    let lines = game.evaluate("line", &state, None).unwrap();
    assert_eq!(lines, vec![game.parse_move("(line x)").unwrap()]);

    let rows = game.evaluate("row", &state, None).unwrap();
    assert_eq!(rows, vec![game.parse_move("(row 1 x)").unwrap()]);

    // Static relations come straight from the compiled description.
    assert_eq!(game.evaluate("index", &state, None).unwrap().len(), 3);
    assert!(game.evaluate("no_such_relation", &state, None).unwrap().is_empty());
}

#[test]
fn test_evaluate_next_with_joint_move() {
    let game = tictactoe();
    let state = State::new(&game);
    let joint = JointMove::from_pairs(
        2,
        [
            (WHITE, game.parse_move("(mark 2 2)").unwrap()),
            (BLACK, game.parse_move("noop").unwrap()),
        ],
    )
    .unwrap();

    let next = game.evaluate("next", &state, Some(&joint)).unwrap();
    assert_eq!(next.len(), 10);
    assert!(next.contains(&game.parse_move("(next (cell 2 2 x))").unwrap()));
    assert!(next.contains(&game.parse_move("(next (control black))").unwrap()));
    assert!(!next.contains(&game.parse_move("(next (cell 2 2 b))").unwrap()));
}

#[test]
fn test_strata() {
    let game = tictactoe();

    // Only negation raises the level.
    let line = game.stratum("line").unwrap();
    assert_eq!(game.stratum("row").unwrap(), line);
    assert!(game.stratum("goal").unwrap() > line);
    assert!(game.stratum("terminal").unwrap() > game.stratum("open").unwrap());
    assert_eq!(game.stratum("true"), None);
    assert_eq!(game.stratum("unknown"), None);
}

// =============================================================================
// Case Insensitivity
// =============================================================================

#[test]
fn test_uppercase_description_plays_the_same() {
    let lower = tictactoe();
    let upper = Game::from_file("tests/fixtures/tictactoe_upper.gdl").unwrap();

    assert_eq!(upper.role_by_name("white"), Some(WHITE));
    assert_eq!(upper.role_by_name("Black"), Some(BLACK));
    assert_eq!(upper.display(upper.role_name(WHITE)).to_string(), "WHITE");

    let mut a = State::new(&lower);
    let mut b = State::new(&upper);
    for (player, cell) in [
        (WHITE, "(mark 1 1)"),
        (BLACK, "(mark 2 1)"),
        (WHITE, "(mark 1 2)"),
        (BLACK, "(mark 2 2)"),
        (WHITE, "(mark 1 3)"),
    ] {
        assert_eq!(
            a.legal_moves_for(player).len(),
            b.legal_moves_for(player).len()
        );
        a = mark(&a, player, cell);
        // Lowercase move text is accepted by the uppercase game.
        b = mark(&b, player, cell);
    }

    assert!(b.is_terminal());
    assert_eq!(a.goals().unwrap(), b.goals().unwrap());
}

// =============================================================================
// Illegal Input
// =============================================================================

#[test]
fn test_illegal_move_leaves_state_untouched() {
    let game = tictactoe();
    let state = mark(&State::new(&game), WHITE, "(mark 1 1)");
    let before = state.clone();

    // Occupied cell.
    let occupied = [
        (BLACK, game.parse_move("(mark 1 1)").unwrap()),
        (WHITE, game.parse_move("noop").unwrap()),
    ];
    assert!(matches!(
        state.apply_pairs(&occupied),
        Err(rust_ggp::Error::IllegalMove(_))
    ));

    // Missing role.
    let partial = [(BLACK, game.parse_move("(mark 3 3)").unwrap())];
    assert!(matches!(
        state.apply_pairs(&partial),
        Err(rust_ggp::Error::IllegalMove(_))
    ));

    // Duplicate role.
    let twice = [
        (BLACK, game.parse_move("(mark 3 3)").unwrap()),
        (BLACK, game.parse_move("(mark 3 2)").unwrap()),
    ];
    assert!(state.apply_pairs(&twice).is_err());

    assert_eq!(state, before);
    assert_eq!(state.round(), 1);
}

#[test]
fn test_parse_move_rejects_unknown_symbols() {
    let game = tictactoe();

    assert!(matches!(
        game.parse_move("(castle kingside)"),
        Err(rust_ggp::Error::Parse { .. })
    ));
    assert!(game.parse_move("(mark ?x 1)").is_err());
}

#[test]
fn test_joint_move_from_names() {
    let game = tictactoe();
    let state = State::new(&game);

    let joint = game
        .parse_joint([("BLACK", "noop"), ("white", "(mark 2 2)")])
        .unwrap();
    assert_eq!(joint[WHITE], game.parse_move("(mark 2 2)").unwrap());
    let next = state.apply(&joint).unwrap();
    assert_eq!(next, mark(&state, WHITE, "(mark 2 2)"));

    assert!(matches!(
        game.parse_joint([("white", "(mark 2 2)"), ("red", "noop")]),
        Err(rust_ggp::Error::IllegalMove(msg)) if msg.contains("red")
    ));
    assert!(matches!(
        game.parse_joint([("white", "(mark 2 2)")]),
        Err(rust_ggp::Error::IllegalMove(_))
    ));
    assert!(matches!(
        game.parse_joint([("white", "(castle kingside)"), ("black", "noop")]),
        Err(rust_ggp::Error::Parse { .. })
    ));
}
