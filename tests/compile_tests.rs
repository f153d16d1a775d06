//! Compiler and error-path tests.
//!
//! Every compile error must abort building a `Game`; runtime errors must be
//! reported without touching the queried state.

use rust_ggp::{CompileConfig, Error, Game, RoleId, State};

const COUNTER: &str = include_str!("fixtures/counter.gdl");

// =============================================================================
// Compile Errors
// =============================================================================

#[test]
fn test_unbalanced_parentheses() {
    let err = Game::from_description("(role a) (init (p)").unwrap_err();
    assert!(matches!(err, Error::Parse { .. }), "got {err}");

    let err = Game::from_description("(role a))").unwrap_err();
    match err {
        Error::Parse { offset, .. } => assert_eq!(offset, 8),
        other => panic!("expected parse error, got {other}"),
    }
}

#[test]
fn test_negation_through_recursion() {
    let err = Game::from_description(
        "
        (role a)
        (<= (legal a go) (true on))
        (<= p (not q))
        (<= q p)
        (<= terminal p)
        (<= (goal a 0) (true on))
        ",
    )
    .unwrap_err();

    match err {
        Error::Stratification { predicate, negated } => {
            assert_eq!(predicate, "p");
            assert_eq!(negated, "q");
        }
        other => panic!("expected stratification error, got {other}"),
    }
}

#[test]
fn test_unsafe_rule() {
    let err = Game::from_description(
        "
        (role a)
        (<= (legal a (go ?x)) (not (true (at ?x))))
        ",
    )
    .unwrap_err();

    match err {
        Error::UngroundedVariable { variable, rule } => {
            assert_eq!(variable, "x");
            assert!(rule.contains("legal"), "rule text was {rule}");
        }
        other => panic!("expected ungrounded variable, got {other}"),
    }
}

#[test]
fn test_distinct_variable_must_be_bound() {
    let err = Game::from_description(
        "
        (role a)
        (<= (legal a go) (distinct ?x b))
        ",
    )
    .unwrap_err();
    assert!(matches!(err, Error::UngroundedVariable { .. }), "got {err}");
}

#[test]
fn test_no_roles() {
    let err = Game::from_description("(init p) (<= terminal (true p))").unwrap_err();
    assert!(matches!(err, Error::InvalidDescription(_)), "got {err}");
}

#[test]
fn test_dynamic_init_is_rejected() {
    let err = Game::from_description(
        "
        (role a)
        (<= (init p) (true q))
        ",
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidDescription(_)), "got {err}");
}

#[test]
fn test_non_numeric_goal() {
    let err = Game::from_description(
        "
        (role a)
        (legal a go)
        (goal a high)
        ",
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidDescription(_)), "got {err}");
}

#[test]
fn test_grounding_limit() {
    let config = CompileConfig::default().with_max_ground_rules(5);
    let err = Game::compile(COUNTER, &config).unwrap_err();
    assert!(matches!(err, Error::GroundingLimit { limit: 5 }), "got {err}");

    assert!(Game::compile(COUNTER, &CompileConfig::default()).is_ok());
}

#[test]
fn test_missing_file() {
    let err = Game::from_file("tests/fixtures/does_not_exist.gdl").unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

// =============================================================================
// Description Features
// =============================================================================

#[test]
fn test_or_and_nested_negation() {
    let game = Game::from_description(
        "
        (role a)
        (color red) (color green) (color blue)
        (init (paint red))
        (<= (legal a (paint ?c))
            (color ?c)
            (not (true (paint ?c))))
        (<= (next (paint ?c)) (does a (paint ?c)))
        (<= warm (or (true (paint red)) (true (paint yellow))))
        (<= cold (not (not (true (paint blue)))))
        (<= terminal (not (or warm cold)))
        (<= (goal a 100) cold)
        (<= (goal a 0) (not cold))
        ",
    )
    .unwrap();

    let state = State::new(&game);
    assert!(!state.is_terminal());
    assert_eq!(state.legal_moves_for(RoleId::new(0)).len(), 2);

    let blue = game.parse_move("(paint blue)").unwrap();
    let state = state.apply_pairs(&[(RoleId::new(0), blue)]).unwrap();
    assert!(!state.is_terminal());
    assert_eq!(state.goals().unwrap().as_slice(), &[100]);

    let green = game.parse_move("(paint green)").unwrap();
    let state = state.apply_pairs(&[(RoleId::new(0), green)]).unwrap();
    assert!(state.is_terminal());
    assert_eq!(state.goals().unwrap().as_slice(), &[0]);
}

#[test]
fn test_recursive_static_relation() {
    let game = Game::from_description(
        "
        (role a)
        (edge 1 2) (edge 2 3) (edge 3 4)
        (<= (path ?x ?y) (edge ?x ?y))
        (<= (path ?x ?z) (edge ?x ?y) (path ?y ?z))
        (init (at 1))
        (<= (legal a (go ?y)) (true (at ?x)) (edge ?x ?y))
        (<= (next (at ?y)) (does a (go ?y)))
        (<= (reaches ?y) (true (at ?x)) (path ?x ?y))
        (<= terminal (not (reaches 4)))
        (<= (goal a 100) (true (at 4)))
        (<= (goal a 0) (not (true (at 4))))
        ",
    )
    .unwrap();

    let state = State::new(&game);
    assert_eq!(game.evaluate("path", &state, None).unwrap().len(), 6);
    assert_eq!(game.evaluate("reaches", &state, None).unwrap().len(), 3);

    let mut state = state;
    while !state.is_terminal() {
        let moves = state.legal_moves().unwrap();
        let mv = moves[RoleId::new(0)][0].clone();
        state = state.apply_pairs(&[(RoleId::new(0), mv)]).unwrap();
    }
    assert_eq!(state.round(), 3);
    assert_eq!(state.goals().unwrap().as_slice(), &[100]);
}

#[test]
fn test_comments_and_hints_do_not_change_play() {
    let annotated = format!(
        "{COUNTER}
        ; compiler hints
        (strat succ 0)
        (arg succ 1 num)
        (domain_s num 0 1 2 3)
        (domain_p num 0)
        "
    );
    let plain = Game::from_description(COUNTER).unwrap();
    let hinted = Game::from_description(&annotated).unwrap();
    let ignored = Game::compile(&annotated, &CompileConfig::default().with_hints(false)).unwrap();

    for game in [&plain, &hinted, &ignored] {
        let state = State::new(game);
        assert_eq!(state.legal_moves_for(RoleId::new(0)).len(), 1);
        assert_eq!(game.evaluate("succ", &state, None).unwrap().len(), 3);
    }

    // Read directives leave the description; ignored ones stay plain facts.
    let strat = |game: &std::sync::Arc<Game>| game.evaluate("strat", &State::new(game), None).unwrap().len();
    assert_eq!(strat(&plain), 0);
    assert_eq!(strat(&hinted), 0);
    assert_eq!(strat(&ignored), 1);
}

#[test]
fn test_fact_shaped_like_a_directive_is_kept() {
    let source = "
        (role a)
        (arg a b c)
        (init start)
        (<= (legal a go) (true start) (arg a b c))
        (<= (next done) (does a go))
        (<= terminal (true done))
        (<= terminal (not (arg a b c)))
        (<= (goal a 100) (arg a b c))
    ";
    for config in [CompileConfig::default(), CompileConfig::default().with_hints(false)] {
        let game = Game::compile(source, &config).unwrap();
        let state = State::new(&game);
        assert!(!state.is_terminal());
        assert_eq!(state.legal_moves_for(RoleId::new(0)).len(), 1);
        assert_eq!(game.evaluate("arg", &state, None).unwrap().len(), 1);

        let next = state.apply(&state.joint_moves().unwrap().get(0).unwrap()).unwrap();
        assert!(next.is_terminal());
        assert_eq!(next.goals().unwrap().as_slice(), &[100]);
    }
}

#[test]
fn test_rule_ordering_does_not_change_play() {
    let ordered = Game::from_description(COUNTER).unwrap();
    let unordered =
        Game::compile(COUNTER, &CompileConfig::default().with_rule_ordering(false)).unwrap();

    let mut a = State::new(&ordered);
    let mut b = State::new(&unordered);
    let inc_a = ordered.parse_move("inc").unwrap();
    let inc_b = unordered.parse_move("inc").unwrap();
    while !a.is_terminal() {
        assert!(!b.is_terminal());
        let mut facts_a = a.to_portable().facts;
        let mut facts_b = b.to_portable().facts;
        facts_a.sort();
        facts_b.sort();
        assert_eq!(facts_a, facts_b);
        a = a.apply_pairs(&[(RoleId::new(0), inc_a.clone())]).unwrap();
        b = b.apply_pairs(&[(RoleId::new(0), inc_b.clone())]).unwrap();
    }
    assert!(b.is_terminal());
    assert_eq!(a.goals().unwrap(), b.goals().unwrap());
}

// =============================================================================
// Runtime Errors
// =============================================================================

#[test]
fn test_role_without_moves() {
    let game = Game::from_file("tests/fixtures/stalemate.gdl").unwrap();
    let state = State::new(&game);
    assert_eq!(state.joint_moves().unwrap().len(), 1);

    let joint = state.joint_moves().unwrap().get(0).unwrap();
    let stuck = state.apply(&joint).unwrap();

    assert!(!stuck.is_terminal());
    assert!(stuck.legal_moves_for(RoleId::new(1)).is_empty());
    match stuck.legal_moves() {
        Err(Error::IllegalState { role }) => assert_eq!(role, "second"),
        other => panic!("expected illegal state, got {other:?}"),
    }
    assert!(stuck.joint_moves().is_err());
    assert!(rust_ggp::playout(&stuck, &mut rust_ggp::GameRng::new(1)).is_err());
}

#[test]
fn test_goal_undefined() {
    let game = Game::from_description(
        "
        (role a)
        (role b)
        (init start)
        (<= (legal a go) (true start))
        (<= (legal b go) (true start))
        (<= (goal a 100) (true start))
        (<= (goal a 0) (true start))
        ",
    )
    .unwrap();
    let state = State::new(&game);

    match state.goal(RoleId::new(0)) {
        Err(Error::GoalUndefined { role, scores }) => {
            assert_eq!(role, "a");
            assert_eq!(scores, vec![0, 100]);
        }
        other => panic!("expected undefined goal, got {other:?}"),
    }
    match state.goal(RoleId::new(1)) {
        Err(Error::GoalUndefined { scores, .. }) => assert!(scores.is_empty()),
        other => panic!("expected undefined goal, got {other:?}"),
    }
    assert!(state.goals().is_err());
    assert!(!state.is_terminal());
}

#[test]
fn test_counter_scores() {
    let game = Game::from_description(COUNTER).unwrap();
    let player = RoleId::new(0);
    let inc = game.parse_move("inc").unwrap();
    let stop = game.parse_move("stop").unwrap();

    let state = State::new(&game);
    assert_eq!(state.goal(player).unwrap(), 0);
    assert!(!state.is_legal(player, &stop));

    let two = state
        .apply_pairs(&[(player, inc.clone())])
        .unwrap()
        .apply_pairs(&[(player, inc.clone())])
        .unwrap();
    assert_eq!(two.legal_moves_for(player).len(), 2);

    let stopped = two.apply_pairs(&[(player, stop)]).unwrap();
    assert!(stopped.is_terminal());
    assert_eq!(stopped.goal(player).unwrap(), 50);

    let three = two.apply_pairs(&[(player, inc)]).unwrap();
    assert!(three.is_terminal());
    assert_eq!(three.goal(player).unwrap(), 100);
    assert_eq!(three.legal_moves_for(player), vec![game.parse_move("stop").unwrap()]);
}
