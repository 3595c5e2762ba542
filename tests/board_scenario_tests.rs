//! 盤面シナリオテストモジュール
//! 具体的な盤面配置を組み立て、塗り替え・AIの色選択・状態遷移が
//! 期待通りに振る舞うことを確認する。

use rand::rngs::StdRng;
use rand::SeedableRng;

use square_color::{
    ai::{ColorEvaluator, GreedyAI},
    game::{Board, Cell, Color, GameSettings, GameState, Owner, Status, TurnOutcome, TurnState},
};

fn p(color: Color) -> Cell {
    Cell::new(Owner::Player, color)
}

fn a(color: Color) -> Cell {
    Cell::new(Owner::AI, color)
}

fn n(color: Color) -> Cell {
    Cell::new(Owner::Nobody, color)
}

/// 4x4: 左上にプレイヤー(赤)、右下にAI(青)、(2,0)だけ黄、残りは緑
fn four_by_four() -> Board {
    use Color::*;
    let cells = vec![
        p(Red), p(Red), n(Yellow), n(Green),
        p(Red), p(Red), n(Green), n(Green),
        n(Green), n(Green), a(Blue), a(Blue),
        n(Green), n(Green), a(Blue), a(Blue),
    ];
    Board::from_cells(4, 4, cells).unwrap()
}

#[test]
fn test_four_by_four_claims_one_ring_per_call() {
    let mut board = four_by_four();

    let gained = board.change_color_of(Owner::Player, Color::Green).unwrap();
    assert_eq!(gained, 3);
    for (x, y) in [(2, 1), (0, 2), (1, 2)] {
        assert_eq!(board.at(x, y).unwrap(), p(Color::Green), "cell ({}, {})", x, y);
    }
    assert_eq!(board.at(3, 1).unwrap().owner, Owner::Nobody);
    assert_eq!(board.count_owned(Owner::Player), 7);

    // 同じ色をもう一度選ぶと次の1層を獲得する
    let gained = board.change_color_of(Owner::Player, Color::Green).unwrap();
    assert_eq!(gained, 3);
    for (x, y) in [(3, 1), (0, 3), (1, 3)] {
        assert_eq!(board.at(x, y).unwrap().owner, Owner::Player, "cell ({}, {})", x, y);
    }

    assert_eq!(board.at(2, 0).unwrap(), n(Color::Yellow));
    assert_eq!(board.at(3, 0).unwrap(), n(Color::Green));
    assert_eq!(board.count_owned(Owner::AI), 4);
    assert_eq!(board.status(), Status::Running);
}

#[test]
fn test_four_by_four_ai_prefers_green() {
    let board = four_by_four();
    let mut rng = StdRng::seed_from_u64(0);

    assert!(!board.is_player_and_ai_in_contact());
    assert_eq!(GreedyAI::best_color_for(&board, Owner::AI, &mut rng).unwrap(), Color::Green);
}

#[test]
fn test_contact_excludes_opponent_color() {
    use Color::*;
    let cells = vec![
        p(Red), p(Red), n(Red), n(Red),
        n(Green), p(Red), a(Blue), n(Red),
        n(Green), n(Green), a(Blue), a(Blue),
    ];
    let board = Board::from_cells(4, 3, cells).unwrap();
    assert!(board.is_player_and_ai_in_contact());

    // 接触していなければ赤が最大だった
    let mut visited = vec![false; board.cells().len()];
    assert_eq!(ColorEvaluator::claimable_count(&board, Owner::AI, Red, &mut visited), 2);

    let gains = ColorEvaluator::evaluate_gains(&board, Owner::AI).unwrap();
    assert!(gains[Red.index()].excluded);
    assert_eq!(gains[Green.index()].gain, 1);

    let mut rng = StdRng::seed_from_u64(0);
    assert_eq!(GreedyAI::best_color_for(&board, Owner::AI, &mut rng).unwrap(), Green);
}

#[test]
fn test_zero_gain_fallback_avoids_opponent_color() {
    let cells = vec![p(Color::Red), p(Color::Red), a(Color::Blue), a(Color::Blue)];
    let board = Board::from_cells(4, 1, cells).unwrap();

    let differing = (0..1000u64)
        .filter(|&seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            GreedyAI::best_color_for(&board, Owner::AI, &mut rng).unwrap() != Color::Red
        })
        .count();

    assert!(differing >= 990, "only {} of 1000 picks avoided the opponent color", differing);
}

#[test]
fn test_two_by_two_status_progression() {
    let cells = vec![p(Color::Red), n(Color::Green), n(Color::Yellow), a(Color::Blue)];
    let mut board = Board::from_cells(2, 2, cells).unwrap();
    assert_eq!(board.status(), Status::Running);

    assert_eq!(board.change_color_of(Owner::Player, Color::Green).unwrap(), 1);
    assert_eq!(board.status(), Status::Running);

    assert_eq!(board.change_color_of(Owner::AI, Color::Yellow).unwrap(), 1);
    assert_eq!(board.status(), Status::Draw);
    assert_eq!(board.occupied_by(Owner::Player) + board.occupied_by(Owner::AI), 1.0);
}

#[test]
fn test_player_choosing_ai_color_does_not_take_ai_cells() {
    let cells = vec![p(Color::Red), a(Color::Blue), n(Color::Blue), a(Color::Blue)];
    let mut board = Board::from_cells(2, 2, cells).unwrap();

    board.change_color_of(Owner::Player, Color::Blue).unwrap();
    assert_eq!(board.at(1, 0).unwrap(), a(Color::Blue));
    assert_eq!(board.at(0, 1).unwrap(), p(Color::Blue));
}

/// 両者が貪欲法で色を選び続けると、いずれ盤面は埋まる
#[test]
fn test_full_game_reaches_final_status() {
    let settings = GameSettings {
        width: 10,
        height: 8,
        seed: Some(2024),
        start_paused: false,
        ..GameSettings::default()
    };
    let mut game = GameState::new(&settings).unwrap();
    let mut planner = StdRng::seed_from_u64(99);

    for _ in 0..500 {
        if !game.status().is_running() {
            break;
        }

        let mut color = GreedyAI::best_color_for(game.board(), Owner::Player, &mut planner).unwrap();
        if color == game.player_color() {
            color = Color::ALL
                .iter()
                .copied()
                .find(|&c| c != game.player_color() && c != game.ai_color())
                .unwrap();
        }

        let before_player = game.board().count_owned(Owner::Player);
        let before_ai = game.board().count_owned(Owner::AI);

        match game.set_player_color(color).unwrap() {
            TurnOutcome::Played(turn) => {
                assert_eq!(game.board().count_owned(Owner::Player), before_player + turn.player_gain);
                assert_eq!(game.board().count_owned(Owner::AI), before_ai + turn.ai_gain);
            }
            TurnOutcome::Ignored(reason) => panic!("turn ignored: {:?}", reason),
        }
    }

    assert_ne!(game.status(), Status::Running);
    let total = game.board().count_owned(Owner::Player) + game.board().count_owned(Owner::AI);
    let expected = match game.status() {
        Status::Win => game.board().count_owned(Owner::Player) > game.board().count_owned(Owner::AI),
        Status::Lost => game.board().count_owned(Owner::Player) < game.board().count_owned(Owner::AI),
        Status::Draw => game.board().count_owned(Owner::Player) == game.board().count_owned(Owner::AI),
        Status::Running => false,
    };
    assert!(expected);
    assert!(total <= 80);

    // 終局後は選択を受け付けない
    let outcome = game.set_player_color(Color::White).unwrap();
    assert!(matches!(outcome, TurnOutcome::Ignored(_)));
    assert_eq!(game.turn_state(), TurnState::Active);
}
